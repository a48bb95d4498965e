//! Transport encoding for the storage service
//!
//! Salt and IV travel as standard base64 in multipart form fields on
//! upload and in response headers on download. The content tag travels
//! the same way, unencrypted. Field and header names below are the
//! contract with the deployed backend.

use crate::content::{ContentTag, DEFAULT_EXTENSION};
use crate::envelope::{CipherEnvelope, Scheme};
use crate::error::{ErrorCategory, ErrorKind, Result, SealdropError};
use base64::{Engine, engine::general_purpose::STANDARD};
use zeroize::Zeroizing;

pub const FIELD_FILE: &str = "file";
pub const FIELD_TYPE: &str = "type";
pub const FIELD_SECRET_WORD: &str = "secretWord";
pub const FIELD_IV: &str = "iv";
pub const FIELD_SALT: &str = "salt";
pub const FIELD_SCHEME: &str = "scheme";

pub const HEADER_IV: &str = "X-IV";
pub const HEADER_SALT: &str = "X-SALT";
pub const HEADER_EXTENSION: &str = "X-EXTENSION";
pub const HEADER_SCHEME: &str = "X-SCHEME";

/// Default length of a ciphertext preview, in base64 characters
pub const DEFAULT_PREVIEW_LEN: usize = 64;

/// Encode bytes as standard, padded base64.
pub fn encode_binary(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode standard base64 text.
pub fn decode_binary(text: &str) -> Result<Vec<u8>> {
    STANDARD.decode(text.trim()).map_err(|e| {
        SealdropError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::EncodingError,
            format!("base64 decoding failed: {}", e),
            e,
        )
    })
}

/// Base64 of the ciphertext, cut to `max_len` characters with a `...`
/// suffix when longer. For showing what actually leaves the machine.
pub fn ciphertext_preview(ciphertext: &[u8], max_len: usize) -> String {
    let mut encoded = encode_binary(ciphertext);
    if encoded.len() > max_len {
        // base64 is ASCII, so any index is a char boundary
        encoded.truncate(max_len);
        encoded.push_str("...");
    }
    encoded
}

/// The multipart upload request, minus the HTTP plumbing.
pub struct UploadForm {
    pub file_name: String,
    pub ciphertext: Vec<u8>,
    pub content_type: String,
    pub secret_word: Option<Zeroizing<String>>,
    pub iv: String,
    pub salt: String,
    pub scheme: Scheme,
}

impl UploadForm {
    pub fn new(envelope: CipherEnvelope, tag: &ContentTag, file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: tag.mime_type().to_string(),
            secret_word: None,
            iv: encode_binary(&envelope.iv),
            salt: encode_binary(&envelope.salt),
            scheme: envelope.scheme,
            ciphertext: envelope.ciphertext,
        }
    }

    /// Also send the secret word to the storage service.
    ///
    /// The service never needs it to store or serve ciphertext; this exists
    /// for backends that insist on the field.
    pub fn with_secret_word(mut self, secret_word: &str) -> Self {
        self.secret_word = Some(Zeroizing::new(secret_word.to_string()));
        self
    }

    /// Text fields in the order the backend expects them. The ciphertext
    /// goes separately as the `file` part.
    pub fn text_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![(FIELD_TYPE, self.content_type.clone())];
        if let Some(word) = &self.secret_word {
            fields.push((FIELD_SECRET_WORD, word.to_string()));
        }
        fields.push((FIELD_IV, self.iv.clone()));
        fields.push((FIELD_SALT, self.salt.clone()));
        // Legacy backends know nothing of schemes, so CBC stays implicit.
        if self.scheme != Scheme::AesCbc {
            fields.push((FIELD_SCHEME, self.scheme.as_str().to_string()));
        }
        fields
    }
}

/// An envelope and tag as received from the storage service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedEnvelope {
    pub envelope: CipherEnvelope,
    pub tag: ContentTag,
}

impl ReceivedEnvelope {
    /// Rebuilds the envelope from a download response body and a header
    /// lookup.
    ///
    /// `X-IV` and `X-SALT` are required. `X-EXTENSION` defaults to `bin`
    /// and `X-SCHEME` to AES-256-CBC.
    pub fn from_response<F>(body: Vec<u8>, header: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let (iv_b64, salt_b64) = match (header(HEADER_IV), header(HEADER_SALT)) {
            (Some(iv), Some(salt)) => (iv, salt),
            _ => {
                return Err(SealdropError::with_kind(
                    ErrorCategory::User,
                    ErrorKind::InvalidEnvelope,
                    "missing encryption parameters",
                ));
            }
        };
        let iv = decode_binary(&iv_b64).map_err(|e| e.with_context("invalid X-IV header"))?;
        let salt = decode_binary(&salt_b64).map_err(|e| e.with_context("invalid X-SALT header"))?;
        let scheme = match header(HEADER_SCHEME) {
            Some(s) => s.parse()?,
            None => Scheme::AesCbc,
        };
        let tag = ContentTag::from_extension(
            header(HEADER_EXTENSION)
                .as_deref()
                .unwrap_or(DEFAULT_EXTENSION),
        );

        let envelope = CipherEnvelope::from_parts(body, &salt, &iv, scheme)?;
        Ok(Self { envelope, tag })
    }

    /// Response headers a storage service sends for this envelope.
    pub fn response_headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = vec![
            (HEADER_IV, encode_binary(&self.envelope.iv)),
            (HEADER_SALT, encode_binary(&self.envelope.salt)),
            (HEADER_EXTENSION, self.tag.extension().to_string()),
        ];
        if self.envelope.scheme != Scheme::AesCbc {
            headers.push((HEADER_SCHEME, self.envelope.scheme.as_str().to_string()));
        }
        headers
    }
}
