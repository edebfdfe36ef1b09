// src/config/app.rs
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use super::defaults::*;
use crate::consts::{DEFAULT_CONFIG_FILE, ENV_CONFIG, ENV_DATABASE};
use crate::enums::EntityKind;
use crate::error::ConfigError;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "default_database")]
    pub database: DatabaseConfig,
    #[serde(default = "default_provider")]
    pub provider: ProviderConfig,
    #[serde(default = "default_migration")]
    pub migration: MigrationConfig,
    #[serde(default = "default_entities")]
    pub entities: Entities,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    #[serde(default = "database_path_default")]
    pub path: String,
    #[serde(default = "busy_timeout_default")]
    pub busy_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    #[serde(default = "kdf_iterations_default")]
    pub kdf_iterations: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MigrationConfig {
    /// Bookkeeping table recording finished passes. `None` means the operator
    /// guarantees the tool runs exactly once per table.
    #[serde(default)]
    pub state_table: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Entities {
    #[serde(default = "default_applications")]
    pub applications: EntityTable,
    #[serde(default = "default_access_tokens")]
    pub access_tokens: EntityTable,
    #[serde(default = "default_authorization_codes")]
    pub authorization_codes: EntityTable,
}

/// Table layout of one entity kind as written in the config file
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntityTable {
    pub table: String,
    pub id_column: String,
    pub secret_columns: Vec<String>,
}

/// Validated table layout of one entity kind, handed to the repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySpec {
    pub kind: EntityKind,
    pub table: String,
    pub id_column: String,
    pub secret_columns: Vec<String>,
}

impl EntitySpec {
    pub fn new(kind: EntityKind, layout: &EntityTable) -> Self {
        Self {
            kind,
            table: layout.table.clone(),
            id_column: layout.id_column.clone(),
            secret_columns: layout.secret_columns.clone(),
        }
    }

    /// `SELECT id, c1, c2 FROM table`
    pub fn select_sql(&self) -> String {
        format!(
            "SELECT {}, {} FROM {}",
            self.id_column,
            self.secret_columns.join(", "),
            self.table
        )
    }

    /// `UPDATE table SET c1 = ?1, c2 = ?2 WHERE id = ?3`
    pub fn update_sql(&self) -> String {
        let assignments: Vec<String> = self
            .secret_columns
            .iter()
            .enumerate()
            .map(|(i, column)| format!("{column} = ?{}", i + 1))
            .collect();
        format!(
            "UPDATE {} SET {} WHERE {} = ?{}",
            self.table,
            assignments.join(", "),
            self.id_column,
            self.secret_columns.len() + 1
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database: default_database(),
            provider: default_provider(),
            migration: default_migration(),
            entities: default_entities(),
        }
    }
}

impl Config {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let conf: Config = toml::from_str(content)?;
        conf.validate()?;
        Ok(conf)
    }

    pub fn table_for(&self, kind: EntityKind) -> &EntityTable {
        match kind {
            EntityKind::Applications => &self.entities.applications,
            EntityKind::AccessTokens => &self.entities.access_tokens,
            EntityKind::AuthorizationCodes => &self.entities.authorization_codes,
        }
    }

    /// Entity layouts in migration order
    pub fn entity_specs(&self) -> Vec<EntitySpec> {
        EntityKind::ALL
            .iter()
            .map(|&kind| EntitySpec::new(kind, self.table_for(kind)))
            .collect()
    }

    /// Table and column names are spliced into SQL, so they must be plain identifiers
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.path.trim().is_empty() {
            return Err(ConfigError::Invalid("database.path is empty".into()));
        }
        if self.provider.kdf_iterations == 0 {
            return Err(ConfigError::Invalid(
                "provider.kdf_iterations must be at least 1".into(),
            ));
        }
        if let Some(state_table) = &self.migration.state_table {
            check_identifier("migration.state_table", state_table)?;
        }

        let mut tables = HashSet::new();
        for kind in EntityKind::ALL {
            let layout = self.table_for(kind);
            check_identifier(&format!("{kind}.table"), &layout.table)?;
            check_identifier(&format!("{kind}.id_column"), &layout.id_column)?;

            if layout.secret_columns.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "{kind}.secret_columns must name at least one column"
                )));
            }

            let mut seen = HashSet::new();
            for column in &layout.secret_columns {
                check_identifier(&format!("{kind}.secret_columns"), column)?;
                if column.eq_ignore_ascii_case(&layout.id_column) {
                    return Err(ConfigError::Invalid(format!(
                        "{kind}: id column {column} cannot also be a secret column"
                    )));
                }
                if !seen.insert(column.to_ascii_uppercase()) {
                    return Err(ConfigError::Invalid(format!(
                        "{kind}: secret column {column} listed twice"
                    )));
                }
            }

            if !tables.insert(layout.table.to_ascii_uppercase()) {
                return Err(ConfigError::Invalid(format!(
                    "{kind}: table {} is already used by another entity type",
                    layout.table
                )));
            }
        }

        if let Some(state_table) = &self.migration.state_table {
            if tables.contains(&state_table.to_ascii_uppercase()) {
                return Err(ConfigError::Invalid(format!(
                    "migration.state_table {state_table} collides with an entity table"
                )));
            }
        }

        Ok(())
    }
}

fn check_identifier(field: &str, value: &str) -> Result<(), ConfigError> {
    let mut chars = value.chars();
    let valid_start = chars
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false);
    if valid_start && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{field}: '{value}' is not a valid SQL identifier"
        )))
    }
}

/// Load config: explicit path, then `TOKEN_ENCRYPTOR_CONFIG`, then `token-encryptor.toml`.
///
/// An explicitly requested file must exist; the implicit default falls back to
/// built-in values. `TOKEN_ENCRYPTOR_DB` overrides the database path either way.
pub fn load(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    let (config_path, required) = match explicit {
        Some(path) => (path.to_path_buf(), true),
        None => match std::env::var(ENV_CONFIG) {
            Ok(path) => (PathBuf::from(path), true),
            Err(_) => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        },
    };

    let mut conf = if config_path.exists() || required {
        let content = std::fs::read_to_string(&config_path).map_err(|source| ConfigError::Io {
            path: config_path.clone(),
            source,
        })?;
        info!(path = %config_path.display(), "loaded configuration");
        toml::from_str::<Config>(&content)?
    } else {
        warn!(
            path = %config_path.display(),
            "config file not found, using built-in defaults"
        );
        Config::default()
    };

    if let Ok(db_path) = std::env::var(ENV_DATABASE) {
        conf.database.path = db_path;
    }

    conf.validate()?;
    Ok(conf)
}

fn database_path_default() -> String {
    default_database().path
}

fn kdf_iterations_default() -> u32 {
    default_provider().kdf_iterations
}

fn busy_timeout_default() -> u64 {
    default_database().busy_timeout_ms
}

fn default_applications() -> EntityTable {
    default_entities().applications
}

fn default_access_tokens() -> EntityTable {
    default_entities().access_tokens
}

fn default_authorization_codes() -> EntityTable {
    default_entities().authorization_codes
}
