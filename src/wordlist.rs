//! Secret word generation
//!
//! Secret words are drawn uniformly from a fixed list of short lowercase
//! words. The built-in list is the 2048-word BIP-39 English list; any list
//! in one-word-per-line format can be loaded instead.

use crate::error::{ErrorCategory, ErrorKind, Result, SealdropError};
use bip39::Language;
use rand::rngs::OsRng;
use rand::seq::SliceRandom;
use std::fs;
use std::path::Path;
use zeroize::Zeroizing;

/// A non-empty list of candidate secret words.
#[derive(Debug, Clone)]
pub struct WordList {
    words: Vec<String>,
}

impl WordList {
    pub fn builtin() -> Self {
        Self {
            words: Language::English
                .word_list()
                .iter()
                .map(|w| w.to_string())
                .collect(),
        }
    }

    /// Parses a one-word-per-line list. Blank lines and trailing `\r` are
    /// ignored.
    pub fn from_text(text: &str) -> Result<Self> {
        let words: Vec<String> = text
            .lines()
            .map(|line| line.trim().to_lowercase())
            .filter(|word| !word.is_empty())
            .collect();

        if words.is_empty() {
            return Err(SealdropError::with_kind(
                ErrorCategory::User,
                ErrorKind::Config,
                "word list contains no words",
            ));
        }
        Ok(Self { words })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            SealdropError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::Config,
                format!("failed to read word list {}", path.display()),
                e,
            )
        })?;
        Self::from_text(&text).map_err(|e| e.with_context(format!("bad word list {}", path.display())))
    }

    /// Picks a word uniformly at random using the OS CSPRNG.
    pub fn choose(&self) -> Zeroizing<String> {
        // The constructors guarantee at least one word.
        let word = self
            .words
            .choose(&mut OsRng)
            .map(String::as_str)
            .unwrap_or("abandon");
        Zeroizing::new(word.to_string())
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.iter().any(|w| w == word)
    }
}

/// Rejects secret words that would derive a trivially guessable key.
pub fn validate_secret_word(secret_word: &str) -> Result<()> {
    if secret_word.trim().is_empty() {
        return Err(SealdropError::with_kind(
            ErrorCategory::User,
            ErrorKind::InvalidSecretWord,
            "secret word must not be empty",
        ));
    }
    Ok(())
}
