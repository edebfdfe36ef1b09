// src/enums.rs
//! Public enum types used throughout the crate

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The three kinds of credential tables, each migrated as one unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    Applications,
    AccessTokens,
    AuthorizationCodes,
}

impl EntityKind {
    /// Migration order. The kinds are independent; the order only has to be stable.
    pub const ALL: [EntityKind; 3] = [
        EntityKind::Applications,
        EntityKind::AccessTokens,
        EntityKind::AuthorizationCodes,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Applications => "applications",
            EntityKind::AccessTokens => "access-tokens",
            EntityKind::AuthorizationCodes => "authorization-codes",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "applications" | "apps" => Ok(EntityKind::Applications),
            "access-tokens" | "tokens" => Ok(EntityKind::AccessTokens),
            "authorization-codes" | "codes" => Ok(EntityKind::AuthorizationCodes),
            other => Err(format!("unknown entity type '{other}'")),
        }
    }
}

/// Result of one migration pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "rows", rename_all = "kebab-case")]
pub enum Outcome {
    /// Batch committed; rows updated
    Migrated(usize),
    /// Dry run: every row encrypted, nothing written
    WouldMigrate(usize),
    /// State table already records this table as done
    AlreadyMigrated,
    FailedToRead,
    FailedToEncrypt,
    FailedToWrite,
    /// Operator aborted the run before this pass finished
    Cancelled,
}

impl Outcome {
    pub fn is_failure(self) -> bool {
        matches!(
            self,
            Outcome::FailedToRead
                | Outcome::FailedToEncrypt
                | Outcome::FailedToWrite
                | Outcome::Cancelled
        )
    }

    pub fn rows(self) -> Option<usize> {
        match self {
            Outcome::Migrated(n) | Outcome::WouldMigrate(n) => Some(n),
            _ => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Migrated(n) => write!(f, "migrated({n})"),
            Outcome::WouldMigrate(n) => write!(f, "would-migrate({n})"),
            Outcome::AlreadyMigrated => f.write_str("already-migrated"),
            Outcome::FailedToRead => f.write_str("failed-to-read"),
            Outcome::FailedToEncrypt => f.write_str("failed-to-encrypt"),
            Outcome::FailedToWrite => f.write_str("failed-to-write"),
            Outcome::Cancelled => f.write_str("cancelled"),
        }
    }
}
