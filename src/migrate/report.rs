// src/migrate/report.rs
//! Run summary: what the operator sees after a run
//!
//! Carries identifiers, counts and plaintext-free error messages only.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::config::EntitySpec;
use crate::enums::{EntityKind, Outcome};

#[derive(Debug, Clone, Serialize)]
pub struct PassReport {
    pub entity: EntityKind,
    pub table: String,
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PassReport {
    pub fn new(entity: &EntitySpec, outcome: Outcome, error: Option<String>) -> Self {
        Self {
            entity: entity.kind,
            table: entity.table.clone(),
            outcome,
            error,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub dry_run: bool,
    pub passes: Vec<PassReport>,
}

impl RunSummary {
    /// Any pass failed or was cancelled: the process should exit non-zero
    pub fn has_failures(&self) -> bool {
        self.passes.iter().any(|p| p.outcome.is_failure())
    }

    pub fn outcome_for(&self, entity: EntityKind) -> Option<Outcome> {
        self.passes
            .iter()
            .find(|p| p.entity == entity)
            .map(|p| p.outcome)
    }

    /// Total rows written (or that would be written, on a dry run)
    pub fn total_rows(&self) -> usize {
        self.passes.iter().filter_map(|p| p.outcome.rows()).sum()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "=== TOKEN ENCRYPTION {} ===",
            if self.dry_run { "DRY RUN" } else { "RUN" }
        )?;
        writeln!(
            f,
            "started {}  finished {}",
            self.started_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.finished_at.to_rfc3339_opts(SecondsFormat::Secs, true)
        )?;
        for pass in &self.passes {
            write!(f, "{:<20} {:<32} {}", pass.entity, pass.table, pass.outcome)?;
            if let Some(error) = &pass.error {
                write!(f, "  ({error})")?;
            }
            writeln!(f)?;
        }
        write!(
            f,
            "{} row(s) {}",
            self.total_rows(),
            if self.dry_run { "would be encrypted" } else { "encrypted" }
        )
    }
}
