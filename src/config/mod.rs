// src/config/mod.rs
//! Configuration system for token-encryptor
//!
//! TOML file + env overrides. Column names are configuration, not constants:
//! each entity kind gets its own table record, validated at startup.

pub use app::{
    load, Config, DatabaseConfig, Entities, EntitySpec, EntityTable, MigrationConfig, ProviderConfig,
};

mod app;
mod defaults;
