//! The cipher envelope: ciphertext plus the public parameters needed to
//! attempt decryption.

use crate::error::{ErrorCategory, ErrorKind, Result, SealdropError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Length of the PBKDF2 salt in bytes
pub const SALT_LEN: usize = 16;

/// Length of the initialization vector in bytes
pub const IV_LEN: usize = 16;

/// AES block size in bytes
pub const BLOCK_LEN: usize = 16;

/// Length of the AES-GCM authentication tag in bytes
pub const TAG_LEN: usize = 16;

/// Cipher used to produce an envelope.
///
/// `AesCbc` is the format the deployed storage backend and web client
/// understand. `AesGcm` keeps the same envelope shape (16-byte salt and IV)
/// but authenticates the ciphertext, so any tampering is always detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scheme {
    #[default]
    AesCbc,
    AesGcm,
}

impl Scheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::AesCbc => "aes-256-cbc",
            Scheme::AesGcm => "aes-256-gcm",
        }
    }

    /// Checks that a ciphertext length is something this scheme can have
    /// produced.
    fn check_ciphertext_len(self, len: usize) -> Result<()> {
        match self {
            Scheme::AesCbc if len == 0 || len % BLOCK_LEN != 0 => Err(SealdropError::with_kind(
                ErrorCategory::User,
                ErrorKind::InvalidEnvelope,
                format!(
                    "ciphertext length {} is not a positive multiple of {}",
                    len, BLOCK_LEN
                ),
            )),
            Scheme::AesGcm if len < TAG_LEN => Err(SealdropError::with_kind(
                ErrorCategory::User,
                ErrorKind::InvalidEnvelope,
                format!(
                    "ciphertext length {} is shorter than the {}-byte tag",
                    len, TAG_LEN
                ),
            )),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scheme {
    type Err = SealdropError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aes-256-cbc" | "aes-cbc" | "cbc" => Ok(Scheme::AesCbc),
            "aes-256-gcm" | "aes-gcm" | "gcm" => Ok(Scheme::AesGcm),
            other => Err(SealdropError::with_kind(
                ErrorCategory::User,
                ErrorKind::InvalidEnvelope,
                format!("unsupported cipher scheme {:?}", other),
            )),
        }
    }
}

/// Ciphertext with its salt, IV and scheme.
///
/// Salt and IV are fixed-size, so an envelope with a wrong-sized salt or IV
/// cannot be constructed. Ciphertext shape is checked by [`Self::validate`]
/// before any key derivation happens.
#[derive(Clone, PartialEq, Eq)]
pub struct CipherEnvelope {
    pub ciphertext: Vec<u8>,
    pub salt: [u8; SALT_LEN],
    pub iv: [u8; IV_LEN],
    pub scheme: Scheme,
}

impl CipherEnvelope {
    /// Builds an envelope from raw transport parts, rejecting wrong-sized
    /// salt or IV.
    pub fn from_parts(ciphertext: Vec<u8>, salt: &[u8], iv: &[u8], scheme: Scheme) -> Result<Self> {
        let salt: [u8; SALT_LEN] = salt.try_into().map_err(|_| {
            SealdropError::with_kind(
                ErrorCategory::User,
                ErrorKind::InvalidEnvelope,
                format!("salt must be {} bytes, got {}", SALT_LEN, salt.len()),
            )
        })?;
        let iv: [u8; IV_LEN] = iv.try_into().map_err(|_| {
            SealdropError::with_kind(
                ErrorCategory::User,
                ErrorKind::InvalidEnvelope,
                format!("iv must be {} bytes, got {}", IV_LEN, iv.len()),
            )
        })?;

        Ok(Self {
            ciphertext,
            salt,
            iv,
            scheme,
        })
    }

    /// Rejects ciphertext that the envelope's scheme could not have produced.
    pub fn validate(&self) -> Result<()> {
        self.scheme.check_ciphertext_len(self.ciphertext.len())
    }
}

// Salt and IV are public, but ciphertext can be large; keep Debug short.
impl fmt::Debug for CipherEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CipherEnvelope")
            .field("ciphertext_len", &self.ciphertext.len())
            .field("salt", &self.salt)
            .field("iv", &self.iv)
            .field("scheme", &self.scheme)
            .finish()
    }
}
