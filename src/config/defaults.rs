// src/config/defaults.rs
use crate::config::app::{
    DatabaseConfig, Entities, EntityTable, MigrationConfig, ProviderConfig,
};
use crate::consts::*;

pub fn default_database() -> DatabaseConfig {
    DatabaseConfig {
        path: DEFAULT_DATABASE_PATH.into(),
        busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
    }
}

pub fn default_provider() -> ProviderConfig {
    ProviderConfig {
        kdf_iterations: DEFAULT_KDF_ITERATIONS,
    }
}

pub fn default_migration() -> MigrationConfig {
    MigrationConfig { state_table: None }
}

pub fn default_entities() -> Entities {
    Entities {
        applications: table(APPS_TABLE, APPS_ID_COLUMN, APPS_SECRET_COLUMNS),
        access_tokens: table(TOKENS_TABLE, TOKENS_ID_COLUMN, TOKENS_SECRET_COLUMNS),
        authorization_codes: table(CODES_TABLE, CODES_ID_COLUMN, CODES_SECRET_COLUMNS),
    }
}

fn table(name: &str, id_column: &str, secret_columns: &[&str]) -> EntityTable {
    EntityTable {
        table: name.into(),
        id_column: id_column.into(),
        secret_columns: secret_columns.iter().map(|c| c.to_string()).collect(),
    }
}
