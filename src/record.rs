// src/record.rs
//! In-memory rows of the credential tables
//!
//! A record is built by the repository read path, has its sensitive fields
//! replaced in place by the orchestrator and is consumed by the write path.

use std::fmt;

use rusqlite::types::Value;

use crate::aliases::SecretValue;
use crate::enums::EntityKind;

/// Identity value of a row, bound back unchanged in the `WHERE` clause
#[derive(Debug, Clone, PartialEq)]
pub struct RowKey(Value);

impl RowKey {
    pub fn text(id: impl Into<String>) -> Self {
        RowKey(Value::Text(id.into()))
    }

    pub fn value(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for RowKey {
    fn from(value: Value) -> Self {
        RowKey(value)
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::Null => f.write_str("NULL"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Real(r) => write!(f, "{r}"),
            Value::Text(s) => f.write_str(s),
            Value::Blob(b) => write!(f, "<blob {} bytes>", b.len()),
        }
    }
}

/// State of one sensitive column
#[derive(Debug, Clone)]
pub enum FieldValue {
    /// SQL NULL: left untouched
    Null,
    Plaintext(SecretValue),
    Encrypted(String),
}

#[derive(Debug, Clone)]
pub struct SensitiveField {
    pub column: String,
    pub value: FieldValue,
}

impl SensitiveField {
    pub fn plaintext(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            value: FieldValue::Plaintext(SecretValue::new(value.into())),
        }
    }

    pub fn null(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            value: FieldValue::Null,
        }
    }

    /// Build from a nullable column value
    pub fn from_column(column: impl Into<String>, value: Option<String>) -> Self {
        match value {
            Some(v) => Self::plaintext(column, v),
            None => Self::null(column),
        }
    }

    /// Swap the plaintext for its ciphertext; the secret is zeroized on drop
    pub fn replace_with(&mut self, ciphertext: String) {
        self.value = FieldValue::Encrypted(ciphertext);
    }

    pub fn ciphertext(&self) -> Option<&str> {
        match &self.value {
            FieldValue::Encrypted(c) => Some(c.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Record {
    kind: EntityKind,
    key: RowKey,
    fields: Vec<SensitiveField>,
}

impl Record {
    pub fn new(kind: EntityKind, key: RowKey, fields: Vec<SensitiveField>) -> Self {
        Self { kind, key, fields }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn key(&self) -> &RowKey {
        &self.key
    }

    pub fn fields(&self) -> &[SensitiveField] {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut [SensitiveField] {
        &mut self.fields
    }

    /// True once no field is left in plaintext
    pub fn is_encrypted(&self) -> bool {
        !self
            .fields
            .iter()
            .any(|f| matches!(f.value, FieldValue::Plaintext(_)))
    }
}
