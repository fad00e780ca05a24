//! Cryptographic operations for the history file
//!
//! Uses ChaCha20-Poly1305 with a key derived via HKDF-SHA256 from the key
//! material stored in the key file.

use chacha20poly1305::{
    ChaCha20Poly1305, KeyInit, Nonce,
    aead::{Aead, OsRng, rand_core::RngCore},
};
use hkdf::Hkdf;
use sha2::Sha256;
use thiserror::Error;

use super::key::KeyMaterial;

/// Salt used for HKDF key derivation
const HKDF_SALT: &[u8] = b"multitool-history-v1";

/// Nonce size for ChaCha20-Poly1305 (96 bits / 12 bytes)
const NONCE_SIZE: usize = 12;

/// Handles encryption and decryption of the history file
pub struct HistoryCrypto {
    cipher: ChaCha20Poly1305,
}

impl HistoryCrypto {
    /// Create a new crypto instance from the key file's material
    pub fn new(material: &KeyMaterial) -> Self {
        let key = Self::derive_key(material);
        let cipher = ChaCha20Poly1305::new(&key.into());
        Self { cipher }
    }

    /// Derive a 256-bit cipher key from the key material using HKDF-SHA256
    fn derive_key(material: &KeyMaterial) -> [u8; 32] {
        let hkdf = Hkdf::<Sha256>::new(Some(HKDF_SALT), material.as_bytes());
        let mut key = [0u8; 32];
        // 32 bytes is always a valid HKDF-SHA256 output length
        hkdf.expand(&[], &mut key)
            .expect("32 bytes is a valid output length for HKDF-SHA256");
        key
    }

    /// Encrypt plaintext data
    ///
    /// Returns the nonce prepended to the ciphertext: `[nonce (12 bytes)][ciphertext]`
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext)
            .map_err(|_| CryptoError::EncryptionFailed)?;

        let mut result = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        result.extend_from_slice(&nonce_bytes);
        result.extend_from_slice(&ciphertext);

        Ok(result)
    }

    /// Decrypt data that was encrypted with `encrypt`
    ///
    /// Expects the nonce to be prepended to the ciphertext: `[nonce (12 bytes)][ciphertext]`
    pub fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if data.len() < NONCE_SIZE {
            return Err(CryptoError::InvalidData);
        }

        let (nonce_bytes, ciphertext) = data.split_at(NONCE_SIZE);
        let nonce = Nonce::from_slice(nonce_bytes);

        self.cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| CryptoError::DecryptionFailed)
    }
}

/// Errors that can occur during cryptographic operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// Encryption failed (should not happen with valid input)
    #[error("encryption failed")]
    EncryptionFailed,
    /// Decryption failed (wrong key, corrupted data, or tampered ciphertext)
    #[error("decryption failed")]
    DecryptionFailed,
    /// Data is too short to contain a valid nonce
    #[error("invalid encrypted data")]
    InvalidData,
}
