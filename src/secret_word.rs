//! Secret word reading

use crate::error::{ErrorCategory, ErrorKind, Result, SealdropError};
use std::io::{self, IsTerminal, Read, Write};
use zeroize::Zeroizing;

/// Source of the secret word for a download or open operation
pub trait SecretWordReader {
    /// Read the secret word.
    ///
    /// The word is wrapped in `Zeroizing` so it is wiped from memory when
    /// dropped.
    fn read_secret_word(&mut self) -> Result<Zeroizing<String>>;
}

/// Returns a fixed secret word, e.g. one taken from a share link
pub struct ConstantSecretWordReader {
    secret_word: Zeroizing<String>,
}

impl ConstantSecretWordReader {
    pub fn new(secret_word: impl Into<String>) -> Self {
        Self {
            secret_word: Zeroizing::new(secret_word.into()),
        }
    }
}

impl SecretWordReader for ConstantSecretWordReader {
    fn read_secret_word(&mut self) -> Result<Zeroizing<String>> {
        Ok(self.secret_word.clone())
    }
}

/// Reads the secret word from any io::Read source, such as stdin.
///
/// One trailing newline (`\n` or `\r\n`) is dropped so that
/// `echo motion | sealdrop ...` works.
pub struct ReaderSecretWordReader {
    reader: Box<dyn Read>,
}

impl ReaderSecretWordReader {
    pub fn new(reader: Box<dyn Read>) -> Self {
        Self { reader }
    }
}

impl SecretWordReader for ReaderSecretWordReader {
    fn read_secret_word(&mut self) -> Result<Zeroizing<String>> {
        let mut data = Zeroizing::new(Vec::new());
        self.reader.read_to_end(&mut data).map_err(|e| {
            SealdropError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                format!("error reading secret word: {}", e),
                e,
            )
        })?;

        let mut end = data.len();
        if data[..end].ends_with(b"\n") {
            end -= 1;
            if data[..end].ends_with(b"\r") {
                end -= 1;
            }
        }

        let word = std::str::from_utf8(&data[..end]).map_err(|e| {
            SealdropError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::InvalidSecretWord,
                "secret word is not valid UTF-8",
                e,
            )
        })?;
        Ok(Zeroizing::new(word.to_string()))
    }
}

/// Reads the secret word from the terminal with no echo
#[derive(Default)]
pub struct TerminalSecretWordReader;

impl TerminalSecretWordReader {
    pub fn new() -> Self {
        Self
    }
}

impl SecretWordReader for TerminalSecretWordReader {
    fn read_secret_word(&mut self) -> Result<Zeroizing<String>> {
        if !io::stdin().is_terminal() {
            return Err(SealdropError::with_kind(
                ErrorCategory::User,
                ErrorKind::SecretWordUnavailable,
                "cannot prompt for secret word - stdin is not a terminal (try --secret-word-stdin)",
            ));
        }

        let mut stderr = io::stderr();
        stderr
            .write_all(b"Secret word: ")
            .and_then(|()| stderr.flush())
            .map_err(|e| {
                SealdropError::with_kind_and_source(
                    ErrorCategory::Internal,
                    ErrorKind::Io,
                    format!("failed to write prompt: {}", e),
                    e,
                )
            })?;

        // rpassword hands back a plain String; wrap it immediately.
        let word = rpassword::read_password().map_err(|e| {
            SealdropError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::SecretWordUnavailable,
                format!("failure reading secret word: {}", e),
                e,
            )
        })?;

        Ok(Zeroizing::new(word))
    }
}
