//! Sealdrop - zero-knowledge file and text sharing
//!
//! Content is encrypted locally with a key derived from a short secret
//! word (PBKDF2-HMAC-SHA256, AES-256) before it reaches the storage
//! service, which only ever holds ciphertext and public parameters.

#![forbid(unsafe_code)]

pub mod armor;
pub mod config;
pub mod content;
pub mod envelope;
pub mod error;
pub mod file_ops;
pub mod secret_word;
pub mod secretcrypt;
pub mod share;
pub mod sharelink;
pub mod size;
pub mod storage;
pub mod transport;
pub mod wordlist;
