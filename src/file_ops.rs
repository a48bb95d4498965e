//! File operations
//!
//! Offline sealing and opening of armored envelope files, and the secure
//! write used for everything the client puts on disk.

use crate::armor;
use crate::content::ContentTag;
use crate::envelope::Scheme;
use crate::error::{ErrorCategory, ErrorKind, Result, SealdropError};
use crate::secret_word::SecretWordReader;
use crate::secretcrypt;
use crate::wordlist::validate_secret_word;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// Seal a file with a secret word
///
/// Reads plaintext from `input_path`, encrypts it under `scheme` using a
/// secret word from `reader`, and writes the armored envelope to
/// `output_path`. The content tag is taken from the input's extension.
///
/// The output file is created with mode 0o600 (read/write for owner only) on Unix systems.
pub fn seal_file(
    input_path: &Path,
    output_path: &Path,
    reader: &mut dyn SecretWordReader,
    scheme: Scheme,
) -> Result<()> {
    let plaintext = fs::read(input_path).map_err(|e| read_error(input_path, e))?;
    let secret_word = reader.read_secret_word()?;
    validate_secret_word(&secret_word)?;

    let envelope = secretcrypt::encrypt_with_scheme(&plaintext, &secret_word, scheme)
        .map_err(|e| e.with_context("encryption failed"))?;
    let mut armored = armor::wrap(&envelope, &ContentTag::for_path(input_path));
    armored.push('\n');
    write_file_secure(output_path, armored.as_bytes())
        .map_err(|e| e.with_context(format!("failed to write to {}", output_path.display())))?;

    tracing::info!(
        input = %input_path.display(),
        output = %output_path.display(),
        scheme = %scheme,
        "sealed file"
    );
    Ok(())
}

/// Open a sealed file with a secret word
///
/// Reads the armored envelope from `input_path`, decrypts it with a secret
/// word from `reader`, and writes the plaintext to `output_path`. Returns
/// the tag the envelope was sealed with.
///
/// The output file is created with mode 0o600 (read/write for owner only) on Unix systems.
pub fn open_file(
    input_path: &Path,
    output_path: &Path,
    reader: &mut dyn SecretWordReader,
) -> Result<ContentTag> {
    let armored_bytes = fs::read(input_path).map_err(|e| read_error(input_path, e))?;
    let armored = String::from_utf8(armored_bytes).map_err(|e| {
        SealdropError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::ArmoringInvalid,
            "input file is not valid UTF-8",
            e,
        )
    })?;
    let (envelope, tag) = armor::unwrap(&armored).map_err(|e| e.with_context("failed to unarmor"))?;
    let secret_word = reader.read_secret_word()?;
    let plaintext = secretcrypt::decrypt(&envelope, &secret_word)
        .map_err(|e| e.with_context("failed to decrypt"))?;
    write_file_secure(output_path, &plaintext)
        .map_err(|e| e.with_context(format!("failed to write to {}", output_path.display())))?;

    tracing::info!(
        input = %input_path.display(),
        output = %output_path.display(),
        kind = tag.kind_label(),
        "opened sealed file"
    );
    Ok(tag)
}

/// Write a file with secure permissions (0o600 on Unix)
///
/// Contents go to a tempfile next to the target which is fsynced and then
/// renamed over it, so a reader sees either the old file or the complete
/// new one.
pub fn write_file_secure(path: &Path, contents: &[u8]) -> Result<()> {
    let temp_file = write_tempfile_beside(path, contents)?;
    temp_file.persist(path).map_err(|e| {
        SealdropError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            format!("failed to rename to target file {}", path.display()),
            e,
        )
    })?;
    Ok(())
}

/// Like [`write_file_secure`], but fails instead of replacing a file that
/// already exists at `path`.
pub fn write_new_file_secure(path: &Path, contents: &[u8]) -> Result<()> {
    let temp_file = write_tempfile_beside(path, contents)?;
    temp_file.persist_noclobber(path).map_err(|e| {
        // Dropping the tempfile here removes it.
        let err = e.error;
        if err.kind() == io::ErrorKind::AlreadyExists {
            SealdropError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::Io,
                format!("{} already exists", path.display()),
                err,
            )
        } else {
            SealdropError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                format!("failed to rename to target file {}", path.display()),
                err,
            )
        }
    })?;
    Ok(())
}

/// Complete, synced 0o600 tempfile in the directory of `path`.
fn write_tempfile_beside(path: &Path, contents: &[u8]) -> Result<tempfile::NamedTempFile> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp_file = tempfile::NamedTempFile::new_in(dir).map_err(|e| {
        SealdropError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::Io,
            format!("failed to create tempfile in {}", dir.display()),
            e,
        )
    })?;

    temp_file.write_all(contents).map_err(|e| io_error("failed to write to tempfile", e))?;
    // Flush and fsync() such that the rename, if it succeeds, always points
    // to a complete file.
    temp_file.flush().map_err(|e| io_error("failed to flush tempfile", e))?;
    temp_file
        .as_file()
        .sync_all()
        .map_err(|e| io_error("failed to sync file prior to rename", e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        temp_file
            .as_file()
            .set_permissions(fs::Permissions::from_mode(0o600))
            .map_err(|e| io_error("failed to set tempfile permissions", e))?;
    }
    Ok(temp_file)
}

pub(crate) fn read_error(path: &Path, err: io::Error) -> SealdropError {
    let category = if err.kind() == io::ErrorKind::NotFound {
        ErrorCategory::User
    } else {
        ErrorCategory::Internal
    };
    SealdropError::with_kind_and_source(
        category,
        ErrorKind::Io,
        format!("failed to read from {}", path.display()),
        err,
    )
}

fn io_error(msg: &str, err: io::Error) -> SealdropError {
    SealdropError::with_kind_and_source(ErrorCategory::Internal, ErrorKind::Io, msg, err)
}
