// src/crypto/mod.rs
//! Encryption boundary: the injectable provider and the gateway in front of it
//!
//! Nothing here ever logs or formats a plaintext value.

pub mod gateway;
pub mod provider;

pub use gateway::{EncryptionGateway, FieldEncryptor};
pub use provider::{AescryptProvider, EncryptionProvider};
