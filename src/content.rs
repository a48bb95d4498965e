//! Content tags and recovered content
//!
//! The tag travels next to the envelope, unencrypted, and tells the
//! downloading side whether the plaintext is text to show inline or a
//! binary file to save.

use crate::error::{ErrorCategory, ErrorKind, Result, SealdropError};
use std::path::Path;

/// Extension marking UTF-8 text content
pub const TEXT_EXTENSION: &str = "txt";

/// Extension used when the sender supplied none
pub const DEFAULT_EXTENSION: &str = "bin";

const MAX_EXTENSION_LEN: usize = 16;

const MIME_TYPES: &[(&str, &str)] = &[
    ("txt", "text/plain"),
    ("csv", "text/csv"),
    ("html", "text/html"),
    ("md", "text/markdown"),
    ("json", "application/json"),
    ("pdf", "application/pdf"),
    ("zip", "application/zip"),
    ("gz", "application/gzip"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("svg", "image/svg+xml"),
    ("mp3", "audio/mpeg"),
    ("wav", "audio/wav"),
    ("mp4", "video/mp4"),
    ("webm", "video/webm"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentTag {
    Text,
    Binary { extension: String },
}

impl ContentTag {
    /// Builds a tag from an extension as received from a peer.
    ///
    /// Extensions end up in file names, so anything that is not ASCII
    /// alphanumeric is dropped.
    pub fn from_extension(extension: &str) -> Self {
        let cleaned: String = extension
            .trim()
            .trim_start_matches('.')
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .take(MAX_EXTENSION_LEN)
            .collect::<String>()
            .to_ascii_lowercase();

        match cleaned.as_str() {
            TEXT_EXTENSION => ContentTag::Text,
            "" => ContentTag::Binary {
                extension: DEFAULT_EXTENSION.to_string(),
            },
            _ => ContentTag::Binary { extension: cleaned },
        }
    }

    /// Tag for a file about to be shared, taken from its extension.
    pub fn for_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or_else(|| Self::from_extension(DEFAULT_EXTENSION))
    }

    /// Tag for a MIME type, as the storage service maps the upload `type`
    /// field to the extension it hands back on download.
    pub fn from_mime_type(mime: &str) -> Self {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        MIME_TYPES
            .iter()
            .find(|(_, m)| m.eq_ignore_ascii_case(essence))
            .map(|(ext, _)| Self::from_extension(ext))
            .unwrap_or_else(|| Self::from_extension(DEFAULT_EXTENSION))
    }

    pub fn extension(&self) -> &str {
        match self {
            ContentTag::Text => TEXT_EXTENSION,
            ContentTag::Binary { extension } => extension,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, ContentTag::Text)
    }

    pub fn mime_type(&self) -> &'static str {
        let ext = self.extension();
        MIME_TYPES
            .iter()
            .find(|(e, _)| *e == ext)
            .map(|(_, m)| *m)
            .unwrap_or("application/octet-stream")
    }

    /// Name under which recovered content is saved.
    pub fn file_name(&self) -> String {
        format!("file.{}", self.extension())
    }

    pub fn kind_label(&self) -> &'static str {
        if self.is_text() {
            "Text Document"
        } else {
            "Binary File"
        }
    }
}

/// Plaintext recovered from a download, ready for presentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveredContent {
    Text(String),
    Binary { file_name: String, bytes: Vec<u8> },
}

impl RecoveredContent {
    /// Interprets decrypted bytes according to the tag.
    ///
    /// Text that is not UTF-8 is rejected; with CBC envelopes this also
    /// catches most of the wrong keys that slip past the padding check.
    pub fn from_plaintext(plaintext: Vec<u8>, tag: &ContentTag) -> Result<Self> {
        if tag.is_text() {
            let text = String::from_utf8(plaintext).map_err(|e| {
                SealdropError::with_kind_and_source(
                    ErrorCategory::User,
                    ErrorKind::InvalidText,
                    "recovered text is not valid UTF-8; wrong secret word or corrupted data",
                    e,
                )
            })?;
            Ok(RecoveredContent::Text(text))
        } else {
            Ok(RecoveredContent::Binary {
                file_name: tag.file_name(),
                bytes: plaintext,
            })
        }
    }

    /// Size of the recovered plaintext in bytes.
    pub fn len(&self) -> usize {
        match self {
            RecoveredContent::Text(text) => text.len(),
            RecoveredContent::Binary { bytes, .. } => bytes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            RecoveredContent::Text(text) => text.as_bytes(),
            RecoveredContent::Binary { bytes, .. } => bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_txt_is_text() {
        assert_eq!(ContentTag::from_extension("txt"), ContentTag::Text);
        assert_eq!(ContentTag::from_extension(".TXT"), ContentTag::Text);
        assert!(ContentTag::Text.is_text());
        assert_eq!(ContentTag::Text.file_name(), "file.txt");
        assert_eq!(ContentTag::Text.kind_label(), "Text Document");
    }

    #[test]
    fn test_missing_extension_defaults_to_bin() {
        let tag = ContentTag::from_extension("");
        assert_eq!(tag.extension(), "bin");
        assert!(!tag.is_text());
        assert_eq!(tag.file_name(), "file.bin");
    }

    #[test]
    fn test_extension_is_sanitized() {
        let tag = ContentTag::from_extension("../../etc/passwd");
        assert_eq!(tag.extension(), "etcpasswd");

        let tag = ContentTag::from_extension("a".repeat(100).as_str());
        assert_eq!(tag.extension().len(), 16);
    }

    #[test]
    fn test_for_path() {
        assert_eq!(ContentTag::for_path(Path::new("notes.txt")), ContentTag::Text);
        assert_eq!(
            ContentTag::for_path(Path::new("photo.JPG")).extension(),
            "jpg"
        );
        assert_eq!(ContentTag::for_path(Path::new("Makefile")).extension(), "bin");
    }

    #[test]
    fn test_mime_mapping() {
        assert_eq!(ContentTag::Text.mime_type(), "text/plain");
        assert_eq!(ContentTag::from_extension("png").mime_type(), "image/png");
        assert_eq!(
            ContentTag::from_extension("xyz").mime_type(),
            "application/octet-stream"
        );
        assert_eq!(
            ContentTag::from_mime_type("text/plain; charset=utf-8"),
            ContentTag::Text
        );
        assert_eq!(ContentTag::from_mime_type("image/jpeg").extension(), "jpg");
        assert_eq!(
            ContentTag::from_mime_type("application/x-unknown").extension(),
            "bin"
        );
    }

    #[test]
    fn test_recovered_text() {
        let content =
            RecoveredContent::from_plaintext(b"hello world".to_vec(), &ContentTag::Text).unwrap();
        assert_eq!(content, RecoveredContent::Text("hello world".to_string()));
        assert_eq!(content.len(), 11);
    }

    #[test]
    fn test_recovered_text_must_be_utf8() {
        let err = RecoveredContent::from_plaintext(vec![0xff, 0xfe, 0x00], &ContentTag::Text)
            .expect_err("expected utf-8 error");
        assert_eq!(err.kind, Some(ErrorKind::InvalidText));
    }

    #[test]
    fn test_recovered_binary_keeps_bytes() {
        let tag = ContentTag::from_extension("pdf");
        let content = RecoveredContent::from_plaintext(vec![0xff, 0x00], &tag).unwrap();
        assert_eq!(
            content,
            RecoveredContent::Binary {
                file_name: "file.pdf".to_string(),
                bytes: vec![0xff, 0x00],
            }
        );
        assert_eq!(content.as_bytes(), &[0xff, 0x00]);
    }
}
