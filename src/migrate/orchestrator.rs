// src/migrate/orchestrator.rs
//! Migration orchestrator: one fetch → encrypt → write pass per entity type
//!
//! Passes run in `EntityKind::ALL` order and are isolated from each other: a
//! failed pass is reported and the run moves on. Within a pass encryption is
//! fail-fast, so a batch is either written completely or not at all.
//!
//! Re-running a committed pass encrypts ciphertext a second time. Without a
//! configured state table the operator must run the tool exactly once per
//! table; with one, committed tables are skipped unless `force` is set.

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::cancel::CancelToken;
use crate::config::EntitySpec;
use crate::crypto::FieldEncryptor;
use crate::db::RowRepository;
use crate::enums::{EntityKind, Outcome};
use crate::error::MigrationError;
use crate::migrate::report::{PassReport, RunSummary};
use crate::record::{FieldValue, Record};

#[derive(Debug, Clone, Default)]
pub struct MigrationOptions {
    /// Fetch and encrypt, but never write
    pub dry_run: bool,
    /// Ignore state-table markers and migrate anyway
    pub force: bool,
    /// Restrict the run to these kinds; empty means all
    pub only: Vec<EntityKind>,
}

pub struct Migrator<'a, R, E> {
    repo: &'a mut R,
    encryptor: &'a E,
    entities: Vec<EntitySpec>,
    options: MigrationOptions,
}

impl<'a, R: RowRepository, E: FieldEncryptor> Migrator<'a, R, E> {
    pub fn new(repo: &'a mut R, encryptor: &'a E, entities: Vec<EntitySpec>) -> Self {
        Self {
            repo,
            encryptor,
            entities,
            options: MigrationOptions::default(),
        }
    }

    pub fn with_options(mut self, options: MigrationOptions) -> Self {
        self.options = options;
        self
    }

    /// Run every selected pass and collect the outcomes. Never aborts early
    /// on a failed pass; a cancelled token marks the remaining passes cancelled.
    pub fn run(&mut self, cancel: &CancelToken) -> RunSummary {
        let started_at = Utc::now();

        let selected: Vec<EntitySpec> = EntityKind::ALL
            .iter()
            .filter(|kind| self.options.only.is_empty() || self.options.only.contains(kind))
            .filter_map(|kind| self.entities.iter().find(|e| e.kind == *kind))
            .cloned()
            .collect();

        let passes = selected
            .iter()
            .map(|entity| self.run_pass(entity, cancel))
            .collect();

        RunSummary {
            started_at,
            finished_at: Utc::now(),
            dry_run: self.options.dry_run,
            passes,
        }
    }

    fn run_pass(&mut self, entity: &EntitySpec, cancel: &CancelToken) -> PassReport {
        if cancel.is_cancelled() {
            warn!(entity = %entity.kind, "run cancelled, pass not started");
            return PassReport::new(entity, Outcome::Cancelled, None);
        }

        info!(entity = %entity.kind, table = %entity.table, "starting pass");
        match self.migrate_entity(entity, cancel) {
            Ok(outcome) => {
                info!(entity = %entity.kind, %outcome, "pass finished");
                PassReport::new(entity, outcome, None)
            }
            Err(err) => {
                let outcome = if err.is_cancelled() {
                    Outcome::Cancelled
                } else {
                    match err {
                        MigrationError::StoreRead { .. } => Outcome::FailedToRead,
                        MigrationError::Encryption { .. } => Outcome::FailedToEncrypt,
                        MigrationError::StoreWrite { .. } => Outcome::FailedToWrite,
                    }
                };
                error!(entity = %entity.kind, %outcome, error = %err, "pass failed");
                PassReport::new(entity, outcome, Some(err.to_string()))
            }
        }
    }

    /// One pass over a single entity table
    pub fn migrate_entity(
        &mut self,
        entity: &EntitySpec,
        cancel: &CancelToken,
    ) -> Result<Outcome, MigrationError> {
        let kind = entity.kind;

        if !self.options.force {
            let done = self
                .repo
                .is_migrated(entity, cancel)
                .map_err(|source| MigrationError::StoreRead { entity: kind, source })?;
            if done {
                warn!(entity = %kind, table = %entity.table, "already migrated, skipping");
                return Ok(Outcome::AlreadyMigrated);
            }
        }

        let mut records = self
            .repo
            .fetch_all(entity, cancel)
            .map_err(|source| MigrationError::StoreRead { entity: kind, source })?;
        info!(entity = %kind, rows = records.len(), "rows loaded");

        encrypt_records(self.encryptor, kind, &mut records, cancel)?;

        if self.options.dry_run {
            return Ok(Outcome::WouldMigrate(records.len()));
        }

        let affected = self
            .repo
            .apply_batch(entity, &records, cancel)
            .map_err(|source| MigrationError::StoreWrite { entity: kind, source })?;
        Ok(Outcome::Migrated(affected))
    }
}

/// Replace every plaintext field with its ciphertext; stops at the first failure
fn encrypt_records<E: FieldEncryptor>(
    encryptor: &E,
    kind: EntityKind,
    records: &mut [Record],
    cancel: &CancelToken,
) -> Result<(), MigrationError> {
    for record in records.iter_mut() {
        let row = record.key().to_string();
        debug!(entity = %kind, %row, "encrypting row");

        for field in record.fields_mut() {
            let FieldValue::Plaintext(plaintext) = &field.value else {
                continue;
            };
            let ciphertext =
                encryptor
                    .encrypt(cancel, plaintext)
                    .map_err(|source| MigrationError::Encryption {
                        entity: kind,
                        row: row.clone(),
                        column: field.column.clone(),
                        source,
                    })?;
            field.replace_with(ciphertext);
        }
    }
    Ok(())
}
