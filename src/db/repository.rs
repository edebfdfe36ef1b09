// src/db/repository.rs
//! Row repository: read-all and batch-update queries for one entity table
//!
//! Owns no business logic. Reads never open a transaction; every
//! `apply_batch` runs inside exactly one explicit transaction that is either
//! committed or rolled back before the call returns.

use chrono::{SecondsFormat, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Transaction};
use tracing::{debug, info, warn};

use crate::cancel::CancelToken;
use crate::config::EntitySpec;
use crate::error::StoreError;
use crate::record::{FieldValue, Record, RowKey, SensitiveField};

/// Storage seam used by the orchestrator
///
/// `&mut self` everywhere: one caller, one connection, no reentrancy.
pub trait RowRepository {
    /// Materialise every row of the entity's table
    fn fetch_all(
        &mut self,
        entity: &EntitySpec,
        cancel: &CancelToken,
    ) -> Result<Vec<Record>, StoreError>;

    /// Write every record back in one transaction; returns rows affected
    fn apply_batch(
        &mut self,
        entity: &EntitySpec,
        records: &[Record],
        cancel: &CancelToken,
    ) -> Result<usize, StoreError>;

    /// Whether a previous run already committed this entity's table
    fn is_migrated(
        &mut self,
        _entity: &EntitySpec,
        cancel: &CancelToken,
    ) -> Result<bool, StoreError> {
        if cancel.is_cancelled() {
            return Err(StoreError::Cancelled);
        }
        Ok(false)
    }
}

pub struct SqliteRepository {
    conn: Connection,
    state_table: Option<String>,
}

impl SqliteRepository {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn,
            state_table: None,
        }
    }

    /// Repository that records finished passes in `state_table`.
    ///
    /// The table is created by the first committed batch, not here.
    pub fn with_state_table(conn: Connection, state_table: &str) -> Self {
        Self {
            conn,
            state_table: Some(state_table.to_owned()),
        }
    }

    fn table_exists(&self, table: &str) -> Result<bool, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1 COLLATE NOCASE",
            [table],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}

impl RowRepository for SqliteRepository {
    fn fetch_all(
        &mut self,
        entity: &EntitySpec,
        cancel: &CancelToken,
    ) -> Result<Vec<Record>, StoreError> {
        if cancel.is_cancelled() {
            return Err(StoreError::Cancelled);
        }

        let mut stmt = self.conn.prepare(&entity.select_sql())?;
        let rows = stmt.query_map([], |row| {
            let key = RowKey::from(Value::from(row.get_ref(0)?));
            let mut fields = Vec::with_capacity(entity.secret_columns.len());
            for (i, column) in entity.secret_columns.iter().enumerate() {
                let value: Option<String> = row.get(i + 1)?;
                fields.push(SensitiveField::from_column(column.as_str(), value));
            }
            Ok(Record::new(entity.kind, key, fields))
        })?;
        let records = rows.collect::<rusqlite::Result<Vec<_>>>()?;

        debug!(entity = %entity.kind, table = %entity.table, rows = records.len(), "fetched rows");
        Ok(records)
    }

    fn apply_batch(
        &mut self,
        entity: &EntitySpec,
        records: &[Record],
        cancel: &CancelToken,
    ) -> Result<usize, StoreError> {
        if cancel.is_cancelled() {
            return Err(StoreError::Cancelled);
        }

        let tx = self.conn.transaction()?;

        let written = write_batch(&tx, entity, records, cancel).and_then(|affected| {
            if let Some(state_table) = &self.state_table {
                record_marker(&tx, state_table, entity, affected)?;
            }
            Ok(affected)
        });

        match written {
            Ok(affected) => {
                tx.commit()?;
                info!(entity = %entity.kind, table = %entity.table, rows = affected, "batch committed");
                Ok(affected)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback() {
                    warn!(entity = %entity.kind, error = %rollback_err, "rollback failed");
                }
                warn!(entity = %entity.kind, table = %entity.table, "batch rolled back");
                Err(err)
            }
        }
    }

    fn is_migrated(
        &mut self,
        entity: &EntitySpec,
        cancel: &CancelToken,
    ) -> Result<bool, StoreError> {
        if cancel.is_cancelled() {
            return Err(StoreError::Cancelled);
        }
        let Some(state_table) = &self.state_table else {
            return Ok(false);
        };
        if !self.table_exists(state_table)? {
            return Ok(false);
        }
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {state_table} WHERE TABLE_NAME = ?1"),
            [&entity.table],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}

/// Bind one update per record on a single prepared statement; each must hit exactly one row
fn write_batch(
    tx: &Transaction<'_>,
    entity: &EntitySpec,
    records: &[Record],
    cancel: &CancelToken,
) -> Result<usize, StoreError> {
    let mut stmt = tx.prepare(&entity.update_sql())?;
    let mut affected = 0;

    for record in records {
        if cancel.is_cancelled() {
            return Err(StoreError::Cancelled);
        }

        let mut values = Vec::with_capacity(entity.secret_columns.len() + 1);
        for column in &entity.secret_columns {
            let field = record
                .fields()
                .iter()
                .find(|f| &f.column == column)
                .ok_or_else(|| StoreError::MissingColumn {
                    row: record.key().to_string(),
                    column: column.clone(),
                })?;
            values.push(match &field.value {
                FieldValue::Null => Value::Null,
                FieldValue::Encrypted(ciphertext) => Value::Text(ciphertext.clone()),
                FieldValue::Plaintext(_) => {
                    return Err(StoreError::Unencrypted {
                        row: record.key().to_string(),
                        column: column.clone(),
                    })
                }
            });
        }
        values.push(record.key().value().clone());

        let updated = stmt.execute(params_from_iter(values.iter()))?;
        if updated != 1 {
            return Err(StoreError::UnexpectedRowCount {
                row: record.key().to_string(),
                affected: updated,
            });
        }
        affected += updated;
    }

    Ok(affected)
}

fn record_marker(
    tx: &Transaction<'_>,
    state_table: &str,
    entity: &EntitySpec,
    rows: usize,
) -> Result<(), StoreError> {
    tx.execute_batch(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {state_table} (
            TABLE_NAME TEXT PRIMARY KEY,
            ENTITY_TYPE TEXT NOT NULL,
            ROW_COUNT INTEGER NOT NULL,
            COMPLETED_AT TEXT NOT NULL
        );
        "#
    ))?;
    tx.execute(
        &format!(
            "INSERT OR REPLACE INTO {state_table} (TABLE_NAME, ENTITY_TYPE, ROW_COUNT, COMPLETED_AT)
             VALUES (?1, ?2, ?3, ?4)"
        ),
        params![
            entity.table,
            entity.kind.as_str(),
            rows as i64,
            Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
        ],
    )?;
    Ok(())
}
