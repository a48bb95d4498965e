//! Versioned armoring for envelopes
//!
//! Packs an envelope and its content tag into a single line of text so
//! it can be shared as a file, without the storage service. The armored
//! format is:
//! - Free of whitespace (including newlines)
//! - Safe to embed in URLs
//! - Safe to pass unescaped in a POSIX shell
//!
//! Layout: `sealdrop1:{scheme}:{extension}:{salt}:{iv}:{ciphertext}`, with
//! the binary fields in unpadded base64url.

use crate::content::ContentTag;
use crate::envelope::{CipherEnvelope, Scheme};
use crate::error::{ErrorCategory, ErrorKind, Result, SealdropError};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};

/// Magic prefix for all sealdrop armor versions
const MAGIC_PREFIX: &str = "sealdrop";

/// Version 1 magic marker
const V1_MAGIC: &str = "sealdrop1:";

/// Wrap an envelope and tag in armor, returning the armored string
pub fn wrap(envelope: &CipherEnvelope, tag: &ContentTag) -> String {
    format!(
        "{}{}:{}:{}:{}:{}",
        V1_MAGIC,
        envelope.scheme.as_str(),
        tag.extension(),
        URL_SAFE_NO_PAD.encode(envelope.salt),
        URL_SAFE_NO_PAD.encode(envelope.iv),
        URL_SAFE_NO_PAD.encode(&envelope.ciphertext),
    )
}

/// Unwrap an armored string, returning the envelope and tag
pub fn unwrap(armored: &str) -> Result<(CipherEnvelope, ContentTag)> {
    let armored = armored.trim();

    if armored.len() < V1_MAGIC.len() {
        return Err(SealdropError::with_kind(
            ErrorCategory::User,
            ErrorKind::ArmoringInvalid,
            "input size smaller than magic marker; likely truncated",
        ));
    }

    if let Some(body) = armored.strip_prefix(V1_MAGIC) {
        let fields: Vec<&str> = body.split(':').collect();
        let [scheme, extension, salt, iv, ciphertext] = fields.as_slice() else {
            return Err(SealdropError::with_kind(
                ErrorCategory::User,
                ErrorKind::ArmoringInvalid,
                format!("expected 5 armored fields, found {}", fields.len()),
            ));
        };

        let scheme: Scheme = scheme
            .parse()
            .map_err(|e: SealdropError| e.with_context("failed to unarmor"))?;
        let salt = decode_field("salt", salt)?;
        let iv = decode_field("iv", iv)?;
        let ciphertext = decode_field("ciphertext", ciphertext)?;

        let envelope = CipherEnvelope::from_parts(ciphertext, &salt, &iv, scheme)?;
        Ok((envelope, ContentTag::from_extension(extension)))
    } else if armored.starts_with(MAGIC_PREFIX) {
        Err(SealdropError::with_kind(
            ErrorCategory::User,
            ErrorKind::ArmoringFromFuture,
            "input claims to be sealdrop, but not a version we support",
        ))
    } else {
        Err(SealdropError::with_kind(
            ErrorCategory::User,
            ErrorKind::ArmoringInvalid,
            "input unrecognized as sealdrop data",
        ))
    }
}

fn decode_field(name: &str, encoded: &str) -> Result<Vec<u8>> {
    URL_SAFE_NO_PAD.decode(encoded).map_err(|e| {
        SealdropError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::EncodingError,
            format!("base64 decoding of {} failed: {}", name, e),
            e,
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::{IV_LEN, SALT_LEN};

    fn envelope(ciphertext: Vec<u8>, scheme: Scheme) -> CipherEnvelope {
        CipherEnvelope {
            ciphertext,
            salt: [0xfb; SALT_LEN],
            iv: [0x07; IV_LEN],
            scheme,
        }
    }

    #[test]
    fn test_wrap_exact_output() {
        let armored = wrap(&envelope(vec![0xff; 16], Scheme::AesCbc), &ContentTag::Text);
        assert_eq!(
            armored,
            "sealdrop1:aes-256-cbc:txt:-_v7-_v7-_v7-_v7-_v7-w:BwcHBwcHBwcHBwcHBwcHBw:_____________________w"
        );

        let (unwrapped, tag) = unwrap(&armored).unwrap();
        assert_eq!(unwrapped, envelope(vec![0xff; 16], Scheme::AesCbc));
        assert_eq!(tag, ContentTag::Text);
    }

    #[test]
    fn test_gcm_and_binary_tag() {
        let original = envelope((1..=17).collect(), Scheme::AesGcm);
        let tag = ContentTag::from_extension("pdf");
        let (unwrapped, unwrapped_tag) = unwrap(&wrap(&original, &tag)).unwrap();
        assert_eq!(unwrapped, original);
        assert_eq!(unwrapped_tag, tag);
    }

    #[test]
    fn test_trailing_newline_tolerated() {
        let original = envelope(vec![0u8; 32], Scheme::AesCbc);
        let armored = format!("{}\n", wrap(&original, &ContentTag::Text));
        assert_eq!(unwrap(&armored).unwrap().0, original);
    }

    #[test]
    fn test_no_whitespace_and_url_safe() {
        let armored = wrap(&envelope(vec![0xfb; 300], Scheme::AesCbc), &ContentTag::Text);

        assert!(!armored.contains(' '));
        assert!(!armored.contains('\n'));
        assert!(!armored.contains('+'));
        assert!(!armored.contains('/'));
        assert!(!armored.contains('='));
    }

    #[test]
    fn test_truncated_input() {
        let err = unwrap("").expect_err("expected truncated input error");
        assert_eq!(err.kind, Some(ErrorKind::ArmoringInvalid));
    }

    #[test]
    fn test_wrong_version() {
        let err = unwrap("sealdrop999999:...").expect_err("expected unsupported version error");
        assert_eq!(err.kind, Some(ErrorKind::ArmoringFromFuture));
    }

    #[test]
    fn test_not_sealdrop() {
        let err = unwrap("something not looking like sealdrop data")
            .expect_err("expected non-sealdrop error");
        assert_eq!(err.kind, Some(ErrorKind::ArmoringInvalid));
    }

    #[test]
    fn test_missing_fields() {
        let err = unwrap("sealdrop1:aes-256-cbc:txt:AAAA").expect_err("expected field count error");
        assert_eq!(err.kind, Some(ErrorKind::ArmoringInvalid));
    }

    #[test]
    fn test_bad_base64() {
        let err = unwrap("sealdrop1:aes-256-cbc:txt:bad$$:AAAA:AAAA")
            .expect_err("expected base64 decode error");
        assert_eq!(err.kind, Some(ErrorKind::EncodingError));
    }

    #[test]
    fn test_short_salt() {
        let err = unwrap("sealdrop1:aes-256-cbc:txt:AAAA:BwcHBwcHBwcHBwcHBwcHBw:AAAA")
            .expect_err("expected salt length error");
        assert_eq!(err.kind, Some(ErrorKind::InvalidEnvelope));
    }
}
