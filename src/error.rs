// src/error.rs
//! Public error types for the entire crate
//!
//! None of these ever carry a plaintext credential: only row identifiers,
//! column names and the underlying driver/provider message.

use std::path::PathBuf;

use thiserror::Error;

use crate::enums::EntityKind;

/// Failure talking to the identity database
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("row {row} still holds plaintext in column {column}")]
    Unencrypted { row: String, column: String },

    #[error("row {row} has no value for column {column}")]
    MissingColumn { row: String, column: String },

    #[error("update for row {row} affected {affected} rows, expected exactly 1")]
    UnexpectedRowCount { row: String, affected: usize },

    #[error("operation cancelled")]
    Cancelled,
}

/// Failure from the encryption provider
#[derive(Error, Debug)]
pub enum EncryptionError {
    #[error("provider rejected the value: {0}")]
    Rejected(String),

    #[error("provider unavailable: {0}")]
    Unavailable(String),

    #[error("operation cancelled")]
    Cancelled,
}

/// Why a single migration pass did not complete
#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("failed to read {entity}: {source}")]
    StoreRead {
        entity: EntityKind,
        source: StoreError,
    },

    #[error("failed to encrypt {entity} row {row} column {column}: {source}")]
    Encryption {
        entity: EntityKind,
        row: String,
        column: String,
        source: EncryptionError,
    },

    #[error("failed to write {entity}: {source}")]
    StoreWrite {
        entity: EntityKind,
        source: StoreError,
    },
}

impl MigrationError {
    pub fn is_cancelled(&self) -> bool {
        match self {
            MigrationError::StoreRead { source, .. } | MigrationError::StoreWrite { source, .. } => {
                matches!(source, StoreError::Cancelled)
            }
            MigrationError::Encryption { source, .. } => {
                matches!(source, EncryptionError::Cancelled)
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
