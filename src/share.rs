//! Upload and download flows
//!
//! Wires the pipeline together: secret word and plaintext in, encrypted
//! upload out, share link back; and the reverse for downloads. Everything
//! the storage service receives is produced by `secretcrypt` and
//! `transport` first.

use crate::config::UploadConfig;
use crate::content::{ContentTag, RecoveredContent};
use crate::error::{ErrorCategory, ErrorKind, Result, SealdropError};
use crate::secretcrypt;
use crate::sharelink::ShareLink;
use crate::size::format_file_size;
use crate::storage::Storage;
use crate::transport::{DEFAULT_PREVIEW_LEN, UploadForm, ciphertext_preview};
use crate::wordlist::validate_secret_word;
use std::fs;
use std::path::Path;

/// Outcome of a successful upload.
#[derive(Debug)]
pub struct Shared {
    pub link: ShareLink,
    pub tag: ContentTag,
    pub plaintext_len: usize,
    pub ciphertext_len: usize,
    /// Truncated base64 of the ciphertext that was sent
    pub preview: String,
}

/// Encrypts `plaintext` under `secret_word` and uploads it as `file_name`.
pub fn share_bytes(
    storage: &dyn Storage,
    config: &UploadConfig,
    plaintext: &[u8],
    tag: ContentTag,
    file_name: &str,
    secret_word: &str,
) -> Result<Shared> {
    validate_secret_word(secret_word)?;
    check_size(plaintext.len() as u64, config.max_bytes)?;

    let envelope = secretcrypt::encrypt_with_scheme(plaintext, secret_word, config.scheme)
        .map_err(|e| e.with_context("encryption failed"))?;
    let ciphertext_len = envelope.ciphertext.len();
    let preview = ciphertext_preview(&envelope.ciphertext, DEFAULT_PREVIEW_LEN);

    let mut form = UploadForm::new(envelope, &tag, file_name);
    if config.send_secret_word {
        form = form.with_secret_word(secret_word);
    }
    let access_code = storage
        .upload(form)
        .map_err(|e| e.with_context("upload failed"))?;

    tracing::info!(
        access_code = %access_code,
        kind = tag.kind_label(),
        size = %format_file_size(plaintext.len() as u64),
        scheme = %config.scheme,
        "uploaded encrypted content"
    );

    Ok(Shared {
        link: ShareLink::new(access_code, secret_word),
        tag,
        plaintext_len: plaintext.len(),
        ciphertext_len,
        preview,
    })
}

/// Shares a text message. Text is always sent as UTF-8 under `file.txt`.
pub fn share_text(
    storage: &dyn Storage,
    config: &UploadConfig,
    text: &str,
    secret_word: &str,
) -> Result<Shared> {
    let tag = ContentTag::Text;
    let file_name = tag.file_name();
    share_bytes(storage, config, text.as_bytes(), tag, &file_name, secret_word)
}

/// Shares a file from disk, tagged by its extension.
pub fn share_file(
    storage: &dyn Storage,
    config: &UploadConfig,
    path: &Path,
    secret_word: &str,
) -> Result<Shared> {
    // Refuse oversized files before reading them into memory.
    let metadata = fs::metadata(path).map_err(|e| crate::file_ops::read_error(path, e))?;
    check_size(metadata.len(), config.max_bytes)?;

    let plaintext = fs::read(path).map_err(|e| crate::file_ops::read_error(path, e))?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| ContentTag::for_path(path).file_name());
    share_bytes(
        storage,
        config,
        &plaintext,
        ContentTag::for_path(path),
        &file_name,
        secret_word,
    )
}

/// Downloads and decrypts the content stored under `access_code`.
pub fn fetch(
    storage: &dyn Storage,
    access_code: &str,
    secret_word: &str,
) -> Result<RecoveredContent> {
    let access_code = access_code.trim();
    if access_code.is_empty() {
        return Err(SealdropError::with_kind(
            ErrorCategory::User,
            ErrorKind::InvalidShareLink,
            "access code must not be empty",
        ));
    }
    validate_secret_word(secret_word)?;

    let received = storage
        .retrieve(access_code)
        .map_err(|e| e.with_context("download failed"))?;
    let plaintext = secretcrypt::decrypt(&received.envelope, secret_word)
        .map_err(|e| e.with_context("failed to decrypt"))?;
    let content = RecoveredContent::from_plaintext(plaintext, &received.tag)?;

    tracing::info!(
        access_code = %access_code,
        kind = received.tag.kind_label(),
        size = %format_file_size(content.len() as u64),
        "downloaded and decrypted content"
    );
    Ok(content)
}

/// Downloads and decrypts the content a share link points at.
pub fn fetch_link(storage: &dyn Storage, link: &ShareLink) -> Result<RecoveredContent> {
    fetch(storage, &link.access_code, &link.secret_word)
}

fn check_size(len: u64, max_bytes: u64) -> Result<()> {
    if len > max_bytes {
        return Err(SealdropError::with_kind(
            ErrorCategory::User,
            ErrorKind::PayloadTooLarge,
            format!(
                "content is {}, larger than the {} limit",
                format_file_size(len),
                format_file_size(max_bytes)
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::Scheme;
    use crate::storage::MemoryStorage;
    use crate::transport::{FIELD_SCHEME, FIELD_SECRET_WORD};
    use tempfile::TempDir;

    fn field_names(storage: &MemoryStorage, code: &str) -> Vec<&'static str> {
        storage
            .form_fields(code)
            .unwrap()
            .into_iter()
            .map(|(name, _)| name)
            .collect()
    }

    #[test]
    fn test_text_roundtrip() {
        let storage = MemoryStorage::new();
        let config = UploadConfig::default();

        let shared = share_text(&storage, &config, "hello world", "motion").unwrap();
        assert_eq!(shared.tag, ContentTag::Text);
        assert_eq!(shared.plaintext_len, 11);
        assert_eq!(shared.ciphertext_len, 16);
        assert_eq!(shared.link.secret_word.as_str(), "motion");

        let content = fetch(&storage, &shared.link.access_code, "motion").unwrap();
        assert_eq!(content, RecoveredContent::Text("hello world".to_string()));
    }

    #[test]
    fn test_secret_word_stays_local_by_default() {
        let storage = MemoryStorage::new();
        let shared = share_text(&storage, &UploadConfig::default(), "hi", "motion").unwrap();

        let fields = storage.form_fields(&shared.link.access_code).unwrap();
        assert!(!field_names(&storage, &shared.link.access_code).contains(&FIELD_SECRET_WORD));
        assert!(fields.iter().all(|(_, value)| value != "motion"));
    }

    #[test]
    fn test_secret_word_sent_when_configured() {
        let storage = MemoryStorage::new();
        let config = UploadConfig {
            send_secret_word: true,
            ..UploadConfig::default()
        };
        let shared = share_text(&storage, &config, "hi", "motion").unwrap();
        assert!(field_names(&storage, &shared.link.access_code).contains(&FIELD_SECRET_WORD));
    }

    #[test]
    fn test_file_roundtrip_keeps_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("photo.png");
        let bytes: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        fs::write(&path, &bytes).unwrap();

        let storage = MemoryStorage::new();
        let shared = share_file(&storage, &UploadConfig::default(), &path, "motion").unwrap();
        assert_eq!(shared.tag.extension(), "png");

        let content = fetch_link(&storage, &shared.link).unwrap();
        assert_eq!(
            content,
            RecoveredContent::Binary {
                file_name: "file.png".to_string(),
                bytes,
            }
        );
    }

    #[test]
    fn test_gcm_roundtrip_and_tamper() {
        let storage = MemoryStorage::new();
        let config = UploadConfig {
            scheme: Scheme::AesGcm,
            ..UploadConfig::default()
        };
        let shared = share_text(&storage, &config, "hello world", "motion").unwrap();
        assert_eq!(shared.ciphertext_len, 11 + 16);
        assert!(field_names(&storage, &shared.link.access_code).contains(&FIELD_SCHEME));

        let code = &shared.link.access_code;
        assert_eq!(
            fetch(&storage, code, "motion").unwrap(),
            RecoveredContent::Text("hello world".to_string())
        );

        assert!(storage.corrupt(code, 0));
        let err = fetch(&storage, code, "motion").expect_err("expected tamper detection");
        assert_eq!(err.kind, Some(ErrorKind::DecryptionFailed));
    }

    #[test]
    fn test_wrong_secret_word_rejected() {
        let storage = MemoryStorage::new();
        let config = UploadConfig {
            scheme: Scheme::AesGcm,
            ..UploadConfig::default()
        };
        let shared = share_text(&storage, &config, "hello world", "motion").unwrap();

        let err = fetch(&storage, &shared.link.access_code, "potion").expect_err("expected failure");
        assert_eq!(err.kind, Some(ErrorKind::DecryptionFailed));
        assert_eq!(err.user_message(), "wrong access code/secret word or corrupted data");
    }

    #[test]
    fn test_payload_too_large() {
        let storage = MemoryStorage::new();
        let config = UploadConfig {
            max_bytes: 16,
            ..UploadConfig::default()
        };
        assert!(share_bytes(&storage, &config, &[0u8; 16], ContentTag::Text, "file.txt", "w").is_ok());

        let err = share_bytes(&storage, &config, &[0u8; 17], ContentTag::Text, "file.txt", "w")
            .expect_err("expected size limit");
        assert_eq!(err.kind, Some(ErrorKind::PayloadTooLarge));
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn test_empty_secret_word_rejected() {
        let storage = MemoryStorage::new();
        let err = share_text(&storage, &UploadConfig::default(), "hi", " ")
            .expect_err("expected secret word rejection");
        assert_eq!(err.kind, Some(ErrorKind::InvalidSecretWord));
        assert!(storage.is_empty());
    }

    #[test]
    fn test_empty_access_code_rejected() {
        let storage = MemoryStorage::new();
        let err = fetch(&storage, "  ", "motion").expect_err("expected access code rejection");
        assert_eq!(err.kind, Some(ErrorKind::InvalidShareLink));
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let storage = MemoryStorage::new();
        let err = share_file(
            &storage,
            &UploadConfig::default(),
            &dir.path().join("absent.txt"),
            "motion",
        )
        .expect_err("expected read error");
        assert_eq!(err.kind, Some(ErrorKind::Io));
        assert_eq!(err.category, ErrorCategory::User);
    }
}
