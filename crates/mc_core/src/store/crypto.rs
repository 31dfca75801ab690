//! AES-256-GCM payload encryption.
//!
//! Every encrypt call draws a fresh random 96-bit nonce and prepends it
//! to the ciphertext; decrypt reads it back out. One symmetric key is
//! generated per installation and reused for all calls.

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Key, Nonce,
};

use super::error::StoreError;

pub const KEY_LEN: usize = 32;
const NONCE_SIZE: usize = 12;

#[derive(Clone)]
pub struct StoreCipher {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for StoreCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreCipher").field("cipher", &"[REDACTED]").finish()
    }
}

impl StoreCipher {
    pub fn new(key_bytes: &[u8]) -> Result<Self, StoreError> {
        if key_bytes.len() != KEY_LEN {
            return Err(StoreError::InvalidKeyLength(key_bytes.len()));
        }
        let key = Key::<Aes256Gcm>::from_slice(key_bytes);
        Ok(Self { cipher: Aes256Gcm::new(key) })
    }

    /// Fresh key material for a new installation.
    pub fn generate_key() -> [u8; KEY_LEN] {
        let mut key = [0u8; KEY_LEN];
        OsRng.fill_bytes(&mut key);
        key
    }

    /// Encrypt, returning `nonce || ciphertext`.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, StoreError> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext =
            self.cipher.encrypt(nonce, plaintext).map_err(|_| StoreError::Crypto)?;

        let mut blob = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        blob.extend_from_slice(&nonce_bytes);
        blob.extend_from_slice(&ciphertext);
        Ok(blob)
    }

    /// Decrypt a `nonce || ciphertext` blob. Wrong key and corruption
    /// both land on [`StoreError::Crypto`].
    pub fn decrypt(&self, blob: &[u8]) -> Result<Vec<u8>, StoreError> {
        if blob.len() < NONCE_SIZE {
            return Err(StoreError::Crypto);
        }
        let (nonce_bytes, ciphertext) = blob.split_at(NONCE_SIZE);
        let nonce = Nonce::from_slice(nonce_bytes);
        self.cipher.decrypt(nonce, ciphertext).map_err(|_| StoreError::Crypto)
    }
}
