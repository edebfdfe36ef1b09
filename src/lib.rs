// src/lib.rs
//! token-encryptor: one-shot encryption of OAuth2 credentials at rest
//!
//! Features:
//! - Per-entity passes over client secrets, access/refresh tokens and authorization codes
//! - One transaction per entity table, fail-fast encryption, no partial writes
//! - Injectable encryption provider (AES Crypt v3 shipped)
//! - Optional state table guarding against double encryption on re-run

pub mod aliases;
pub mod cancel;
pub mod config;
pub mod consts;
pub mod crypto;
pub mod db;
pub mod enums;
pub mod error;
pub mod migrate;
pub mod record;

// Re-export everything users need at the crate root
pub use aliases::{ProviderPassphrase, SecretValue};
pub use cancel::CancelToken;
pub use config::{load as load_config, Config, EntitySpec};
pub use crypto::{AescryptProvider, EncryptionGateway, EncryptionProvider, FieldEncryptor};
pub use db::{open_identity_db, RowRepository, SqliteRepository};
pub use enums::{EntityKind, Outcome};
pub use error::{ConfigError, EncryptionError, MigrationError, StoreError};
pub use migrate::{MigrationOptions, Migrator, PassReport, RunSummary};
pub use record::{FieldValue, Record, RowKey, SensitiveField};
