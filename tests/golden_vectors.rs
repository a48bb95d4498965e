//! Golden test vector validation
//!
//! Vectors in testdata/golden-vectors.json were produced by an independent
//! PBKDF2/AES implementation. Each one pins key derivation, encryption,
//! transport encoding and armoring at once.

use base64::{Engine, engine::general_purpose::STANDARD as BASE64_STANDARD};
use sealdrop::armor;
use sealdrop::content::ContentTag;
use sealdrop::envelope::Scheme;
use sealdrop::error::ErrorKind;
use sealdrop::secretcrypt;
use sealdrop::transport;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct GoldenVector {
    plaintext: String,
    secret_word: String,
    salt: String,
    iv: String,
    scheme: String,
    extension: String,
    ciphertext: String,
    armored: String,
    comment: String,
}

fn load_golden_vectors() -> serde_json::Result<Vec<GoldenVector>> {
    let json_data = include_str!("../testdata/golden-vectors.json");
    serde_json::from_str(json_data)
}

fn check_vector(i: usize, vector: &GoldenVector) -> Result<(), String> {
    let expected_plaintext = transport::decode_binary(&vector.plaintext)
        .map_err(|e| format!("bad plaintext: {}", e))?;
    let salt: [u8; 16] = BASE64_STANDARD
        .decode(&vector.salt)
        .map_err(|e| format!("bad salt: {}", e))?
        .try_into()
        .map_err(|v: Vec<u8>| format!("salt must be 16 bytes, got {}", v.len()))?;
    let iv: [u8; 16] = BASE64_STANDARD
        .decode(&vector.iv)
        .map_err(|e| format!("bad iv: {}", e))?
        .try_into()
        .map_err(|v: Vec<u8>| format!("iv must be 16 bytes, got {}", v.len()))?;
    let scheme: Scheme = vector
        .scheme
        .parse()
        .map_err(|e| format!("bad scheme: {}", e))?;

    // Deterministic encryption must produce the exact ciphertext
    let envelope = secretcrypt::encrypt_deterministic(
        &expected_plaintext,
        &vector.secret_word,
        &salt,
        &iv,
        scheme,
    )
    .map_err(|e| format!("failed to encrypt: {}", e))?;

    let encoded = transport::encode_binary(&envelope.ciphertext);
    if encoded != vector.ciphertext {
        return Err(format!(
            "ciphertext mismatch\n  Expected: {}\n  Actual:   {}",
            vector.ciphertext, encoded
        ));
    }

    let tag = ContentTag::from_extension(&vector.extension);
    let wrapped = armor::wrap(&envelope, &tag);
    if wrapped != vector.armored {
        return Err(format!(
            "armor mismatch\n  Expected: {}\n  Actual:   {}",
            vector.armored, wrapped
        ));
    }

    // Decrypt from the published armor, not from our own output
    let (unwrapped, unwrapped_tag) =
        armor::unwrap(&vector.armored).map_err(|e| format!("failed to unwrap: {}", e))?;
    if unwrapped_tag != tag {
        return Err(format!("tag mismatch: {:?} vs {:?}", unwrapped_tag, tag));
    }
    let decrypted = secretcrypt::decrypt(&unwrapped, &vector.secret_word)
        .map_err(|e| format!("failed to decrypt: {}", e))?;
    if decrypted != expected_plaintext {
        return Err(format!(
            "plaintext mismatch (expected {} bytes, got {})",
            expected_plaintext.len(),
            decrypted.len()
        ));
    }

    println!("Vector {}: ok ({})", i, vector.comment);
    Ok(())
}

#[test]
fn test_golden_vectors() {
    let vectors = load_golden_vectors().expect("failed to load golden vectors");
    println!("Testing {} golden vectors", vectors.len());

    let mut failed = 0;
    for (i, vector) in vectors.iter().enumerate() {
        if let Err(msg) = check_vector(i, vector) {
            eprintln!("Vector {}: FAILED - {}", i, msg);
            eprintln!("  Comment: {}", vector.comment);
            failed += 1;
        }
    }

    assert_eq!(failed, 0, "Some golden vectors failed validation");
    assert!(!vectors.is_empty(), "No golden vectors were tested");
}

#[test]
fn test_golden_vectors_cover_both_schemes() {
    let vectors = load_golden_vectors().expect("failed to load golden vectors");
    for scheme in ["aes-256-cbc", "aes-256-gcm"] {
        assert!(
            vectors.iter().any(|v| v.scheme == scheme),
            "no vector for {}",
            scheme
        );
    }
}

/// GCM vectors must reject every single-bit flip of their ciphertext.
#[test]
fn test_gcm_vectors_reject_tampering() {
    let vectors = load_golden_vectors().expect("failed to load golden vectors");
    let vector = vectors
        .iter()
        .find(|v| v.scheme == "aes-256-gcm" && !v.plaintext.is_empty())
        .expect("no non-empty gcm vector");

    let (envelope, _) = armor::unwrap(&vector.armored).unwrap();
    for index in [0, envelope.ciphertext.len() / 2, envelope.ciphertext.len() - 1] {
        let mut tampered = envelope.clone();
        tampered.ciphertext[index] ^= 0x80;
        let err = secretcrypt::decrypt(&tampered, &vector.secret_word)
            .expect_err("expected tamper detection");
        assert_eq!(err.kind, Some(ErrorKind::DecryptionFailed), "index {}", index);
    }
}
