// src/crypto/gateway.rs
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::trace;

use crate::aliases::SecretValue;
use crate::cancel::CancelToken;
use crate::crypto::provider::EncryptionProvider;
use crate::error::EncryptionError;

/// Turns one plaintext field into the text stored in its column
pub trait FieldEncryptor {
    fn encrypt(&self, cancel: &CancelToken, plaintext: &SecretValue)
        -> Result<String, EncryptionError>;
}

/// Provider ciphertext, standard-base64 encoded. No retries.
pub struct EncryptionGateway<P> {
    provider: P,
}

impl<P: EncryptionProvider> EncryptionGateway<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

impl<P: EncryptionProvider> FieldEncryptor for EncryptionGateway<P> {
    fn encrypt(
        &self,
        cancel: &CancelToken,
        plaintext: &SecretValue,
    ) -> Result<String, EncryptionError> {
        if cancel.is_cancelled() {
            return Err(EncryptionError::Cancelled);
        }
        if !self.provider.is_available() {
            return Err(EncryptionError::Unavailable(
                "provider reports not ready".into(),
            ));
        }

        let input = plaintext.expose_secret().as_bytes();
        let ciphertext = self.provider.encrypt(input)?;
        let encoded = STANDARD.encode(&ciphertext);
        trace!(
            plaintext_bytes = input.len(),
            ciphertext_bytes = ciphertext.len(),
            encoded_bytes = encoded.len(),
            "field encrypted"
        );
        Ok(encoded)
    }
}
