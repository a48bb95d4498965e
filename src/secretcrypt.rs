//! Encryption/decryption using PBKDF2 + AES-256
//!
//! This module implements secret-word based encryption using:
//! - PBKDF2-HMAC-SHA256 (100,000 iterations) for key derivation
//! - AES-256-CBC with PKCS#7 padding, the format the deployed web client
//!   and storage backend understand
//! - AES-256-GCM with a 16-byte nonce as an authenticated alternative that
//!   keeps the same envelope shape
//!
//! Every encryption draws a fresh 16-byte salt and a fresh, independent
//! 16-byte IV from the OS CSPRNG. Nothing here performs I/O.

use crate::envelope::{CipherEnvelope, IV_LEN, SALT_LEN, Scheme};
use crate::error::{ErrorCategory, ErrorKind, Result, SealdropError};
use aes::Aes256;
use aes_gcm::{AesGcm, Nonce};
use aes_gcm::aead::consts::U16;
use aes_gcm::aead::{Aead, KeyInit};
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::Sha256;
use zeroize::Zeroizing;

/// Length of derived key in bytes
pub const KEY_LEN: usize = 32;

/// PBKDF2 iteration count
pub const PBKDF2_ITERATIONS: u32 = 100_000;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;
type Aes256Gcm16 = AesGcm<Aes256, U16>;

/// Derive a 32-byte key from a secret word and salt using PBKDF2-HMAC-SHA256
///
/// The secret word is used as raw UTF-8 key material, without pre-hashing.
pub fn derive_key(secret_word: &str, salt: &[u8; SALT_LEN]) -> Zeroizing<[u8; KEY_LEN]> {
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2_hmac::<Sha256>(secret_word.as_bytes(), salt, PBKDF2_ITERATIONS, &mut key[..]);
    key
}

/// Encrypt plaintext with a secret word using random salt and IV
///
/// Produces an AES-256-CBC envelope.
pub fn encrypt(plaintext: &[u8], secret_word: &str) -> Result<CipherEnvelope> {
    encrypt_with_scheme(plaintext, secret_word, Scheme::AesCbc)
}

/// Encrypt plaintext with a secret word using random salt and IV under the
/// given scheme
pub fn encrypt_with_scheme(
    plaintext: &[u8],
    secret_word: &str,
    scheme: Scheme,
) -> Result<CipherEnvelope> {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);

    let mut iv = [0u8; IV_LEN];
    OsRng.fill_bytes(&mut iv);

    encrypt_deterministic(plaintext, secret_word, &salt, &iv, scheme)
}

/// Encrypt plaintext with a secret word using provided salt and IV
///
/// This function is ONLY for testing purposes to generate deterministic output.
/// NEVER use this in production - always use `encrypt()` which generates random salt/IV.
pub fn encrypt_deterministic(
    plaintext: &[u8],
    secret_word: &str,
    salt: &[u8; SALT_LEN],
    iv: &[u8; IV_LEN],
    scheme: Scheme,
) -> Result<CipherEnvelope> {
    let key = derive_key(secret_word, salt);

    let ciphertext = match scheme {
        Scheme::AesCbc => Aes256CbcEnc::new_from_slices(&key[..], iv)
            .map_err(|_| crypto_unavailable("AES-256-CBC rejected key or IV length"))?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        Scheme::AesGcm => Aes256Gcm16::new_from_slice(&key[..])
            .map_err(|_| crypto_unavailable("AES-256-GCM rejected key length"))?
            .encrypt(Nonce::<U16>::from_slice(iv), plaintext)
            .map_err(|_| crypto_unavailable("AES-256-GCM encryption failed"))?,
    };

    tracing::debug!(
        %scheme,
        plaintext_len = plaintext.len(),
        ciphertext_len = ciphertext.len(),
        "encrypted payload"
    );

    Ok(CipherEnvelope {
        ciphertext,
        salt: *salt,
        iv: *iv,
        scheme,
    })
}

/// Decrypt an envelope with a secret word
///
/// The ciphertext shape is validated before the (expensive) key derivation.
/// A wrong secret word, mismatched salt/IV, or altered ciphertext fails with
/// [`ErrorKind::DecryptionFailed`]. Under AES-256-CBC this relies on the
/// padding check, which lets roughly 1 in 256 wrong keys through; callers
/// rendering text should still validate the result.
pub fn decrypt(envelope: &CipherEnvelope, secret_word: &str) -> Result<Vec<u8>> {
    envelope.validate()?;

    let key = derive_key(secret_word, &envelope.salt);

    let plaintext = match envelope.scheme {
        Scheme::AesCbc => Aes256CbcDec::new_from_slices(&key[..], &envelope.iv)
            .map_err(|_| crypto_unavailable("AES-256-CBC rejected key or IV length"))?
            .decrypt_padded_vec_mut::<Pkcs7>(&envelope.ciphertext)
            .map_err(|_| decryption_failed())?,
        Scheme::AesGcm => Aes256Gcm16::new_from_slice(&key[..])
            .map_err(|_| crypto_unavailable("AES-256-GCM rejected key length"))?
            .decrypt(Nonce::<U16>::from_slice(&envelope.iv), envelope.ciphertext.as_slice())
            .map_err(|_| decryption_failed())?,
    };

    tracing::debug!(
        scheme = %envelope.scheme,
        plaintext_len = plaintext.len(),
        "decrypted payload"
    );

    Ok(plaintext)
}

fn crypto_unavailable(msg: &str) -> SealdropError {
    SealdropError::with_kind(ErrorCategory::Internal, ErrorKind::CryptoUnavailable, msg)
}

fn decryption_failed() -> SealdropError {
    SealdropError::with_kind(
        ErrorCategory::User,
        ErrorKind::DecryptionFailed,
        "corrupt input, tampered-with data, or bad secret word",
    )
}
