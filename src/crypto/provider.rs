// src/crypto/provider.rs
//! Encryption providers: raw bytes in, raw ciphertext out
//!
//! The migration engine treats a provider as opaque. `AescryptProvider` is the
//! one shipped for production; tests substitute their own.

use std::io::Cursor;

use aescrypt_rs::{aliases::Password, encrypt};

use crate::aliases::ProviderPassphrase;
use crate::error::EncryptionError;

pub trait EncryptionProvider {
    /// Encrypt `plaintext`, returning the provider's raw ciphertext
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, EncryptionError>;

    /// Whether the provider can currently accept work
    fn is_available(&self) -> bool {
        true
    }
}

/// AES Crypt v3 with a passphrase-derived key
pub struct AescryptProvider {
    password: Password,
    kdf_iterations: u32,
}

impl AescryptProvider {
    pub fn new(
        passphrase: &ProviderPassphrase,
        kdf_iterations: u32,
    ) -> Result<Self, EncryptionError> {
        if passphrase.expose_secret().is_empty() {
            return Err(EncryptionError::Unavailable(
                "empty provider passphrase".into(),
            ));
        }
        if kdf_iterations == 0 {
            return Err(EncryptionError::Unavailable(
                "KDF iterations must be at least 1".into(),
            ));
        }
        Ok(Self {
            password: Password::new(passphrase.expose_secret().clone()),
            kdf_iterations,
        })
    }
}

impl EncryptionProvider for AescryptProvider {
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, EncryptionError> {
        let mut out = Vec::new();
        encrypt(
            Cursor::new(plaintext),
            &mut out,
            &self.password,
            self.kdf_iterations,
        )
        .map_err(|e| EncryptionError::Rejected(e.to_string()))?;
        Ok(out)
    }
}
