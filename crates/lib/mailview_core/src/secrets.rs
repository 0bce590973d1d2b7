//! AES-256-GCM encryption for stored OAuth tokens.
//!
//! Access and refresh tokens never hit the database in plaintext. Ciphertext
//! is `nonce || ciphertext || tag`, base64-encoded for TEXT columns, with a
//! random 12-byte nonce per encryption.

use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::auth::AuthError;

/// Nonce size for AES-256-GCM (12 bytes).
const NONCE_SIZE: usize = 12;
/// AES-256 key size (32 bytes).
const KEY_SIZE: usize = 32;
/// GCM tag size (16 bytes).
const TAG_SIZE: usize = 16;

/// Derive a 32-byte key from a passphrase using SHA-256.
fn derive_key(passphrase: &str) -> [u8; KEY_SIZE] {
    let mut hasher = Sha256::new();
    hasher.update(passphrase.as_bytes());
    let digest = hasher.finalize();
    let mut key = [0u8; KEY_SIZE];
    key.copy_from_slice(&digest);
    key
}

/// Encrypt a token for storage. Returns base64 `nonce || ciphertext || tag`.
pub fn encrypt(plaintext: &str, encryption_key: &str) -> Result<String, AuthError> {
    use aes_gcm::aead::Aead;
    use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
    use base64::Engine;

    let cipher = Aes256Gcm::new_from_slice(&derive_key(encryption_key))
        .map_err(|e| AuthError::Internal(format!("cipher init: {e}")))?;

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::rng().fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext.as_bytes())
        .map_err(|e| AuthError::Internal(format!("encrypt: {e}")))?;

    let mut combined = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    combined.extend_from_slice(&nonce_bytes);
    combined.extend_from_slice(&ciphertext);

    Ok(base64::engine::general_purpose::STANDARD.encode(&combined))
}

/// Decrypt a stored token.
pub fn decrypt(encrypted_b64: &str, encryption_key: &str) -> Result<String, AuthError> {
    use aes_gcm::aead::Aead;
    use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
    use base64::Engine;

    let combined = base64::engine::general_purpose::STANDARD
        .decode(encrypted_b64)
        .map_err(|e| AuthError::Internal(format!("base64 decode: {e}")))?;

    if combined.len() < NONCE_SIZE + TAG_SIZE {
        return Err(AuthError::Internal("ciphertext too short".into()));
    }

    let cipher = Aes256Gcm::new_from_slice(&derive_key(encryption_key))
        .map_err(|e| AuthError::Internal(format!("cipher init: {e}")))?;

    let plaintext = cipher
        .decrypt(
            Nonce::from_slice(&combined[..NONCE_SIZE]),
            &combined[NONCE_SIZE..],
        )
        .map_err(|e| AuthError::Internal(format!("decrypt: {e}")))?;

    String::from_utf8(plaintext).map_err(|e| AuthError::Internal(format!("utf-8 decode: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encrypt_decrypt_round_trip() {
        let key = "mailview-token-key";
        let token = "ya29.a0AfH6SMBx-access-token";
        let encrypted = encrypt(token, key).unwrap();
        assert_ne!(encrypted, token);
        assert_eq!(decrypt(&encrypted, key).unwrap(), token);
    }

    #[test]
    fn wrong_key_fails() {
        let encrypted = encrypt("secret", "key-a").unwrap();
        assert!(decrypt(&encrypted, "key-b").is_err());
    }

    #[test]
    fn truncated_ciphertext_fails() {
        assert!(decrypt("c2hvcnQ=", "key").is_err());
    }
}
