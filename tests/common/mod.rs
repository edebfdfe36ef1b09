// tests/common/mod.rs
//! Shared test utilities: logging, scratch identity databases, test doubles
#![allow(dead_code)] // each test binary uses a different subset

use std::cell::Cell;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use rusqlite::{params, Connection};
use tempfile::TempDir;
use token_encryptor::config::DatabaseConfig;
use token_encryptor::{
    open_identity_db, CancelToken, Config, EncryptionError, EncryptionProvider, EntityKind,
    EntitySpec, FieldEncryptor, Record, RowKey, RowRepository, SecretValue, SensitiveField,
    SqliteRepository, StoreError,
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Test-friendly logging; respects RUST_LOG, safe to call from every test
pub fn setup() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_test_writer())
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();
}

/// Default entity layouts, in migration order
pub fn default_specs() -> Vec<EntitySpec> {
    Config::default().entity_specs()
}

pub fn spec(kind: EntityKind) -> EntitySpec {
    default_specs()
        .into_iter()
        .find(|s| s.kind == kind)
        .expect("default layout")
}

// ──────────────────────────────────────────────────────────────
// Scratch identity database
// ──────────────────────────────────────────────────────────────

pub struct IdentityDb {
    _dir: TempDir,
    pub path: PathBuf,
}

impl IdentityDb {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("identity.db");

        let conn = Connection::open(&path).expect("create identity db");
        conn.execute_batch(
            r#"
            CREATE TABLE IDN_OAUTH_CONSUMER_APPS (
                ID INTEGER PRIMARY KEY AUTOINCREMENT,
                CONSUMER_KEY VARCHAR(255) NOT NULL UNIQUE,
                CONSUMER_SECRET VARCHAR(2048),
                APP_NAME VARCHAR(255)
            );

            CREATE TABLE IDN_OAUTH2_ACCESS_TOKEN (
                TOKEN_ID VARCHAR(255) PRIMARY KEY,
                ACCESS_TOKEN VARCHAR(2048),
                REFRESH_TOKEN VARCHAR(2048),
                TOKEN_STATE VARCHAR(25) DEFAULT 'ACTIVE'
            );

            CREATE TABLE IDN_OAUTH2_AUTHORIZATION_CODE (
                CODE_ID VARCHAR(255) PRIMARY KEY,
                AUTHORIZATION_CODE VARCHAR(2048),
                CONSUMER_KEY_ID INTEGER
            );
            "#,
        )
        .expect("create schema");

        Self { _dir: dir, path }
    }

    pub fn database_config(&self) -> DatabaseConfig {
        DatabaseConfig {
            path: self.path.to_str().expect("utf-8 path").to_owned(),
            busy_timeout_ms: 1_000,
        }
    }

    /// Raw connection for fixtures and assertions
    pub fn conn(&self) -> Connection {
        Connection::open(&self.path).expect("open identity db")
    }

    pub fn repository(&self) -> SqliteRepository {
        SqliteRepository::new(open_identity_db(&self.database_config()).expect("open"))
    }

    pub fn repository_with_state(&self, state_table: &str) -> SqliteRepository {
        let conn = open_identity_db(&self.database_config()).expect("open");
        SqliteRepository::with_state_table(conn, state_table)
    }

    pub fn insert_app(&self, key: &str, secret: &str) {
        self.conn()
            .execute(
                "INSERT INTO IDN_OAUTH_CONSUMER_APPS (CONSUMER_KEY, CONSUMER_SECRET, APP_NAME)
                 VALUES (?1, ?2, ?3)",
                params![key, secret, format!("app-{key}")],
            )
            .expect("insert app");
    }

    pub fn insert_token(&self, id: &str, access: &str, refresh: Option<&str>) {
        self.conn()
            .execute(
                "INSERT INTO IDN_OAUTH2_ACCESS_TOKEN (TOKEN_ID, ACCESS_TOKEN, REFRESH_TOKEN)
                 VALUES (?1, ?2, ?3)",
                params![id, access, refresh],
            )
            .expect("insert token");
    }

    pub fn insert_code(&self, id: &str, code: &str) {
        self.conn()
            .execute(
                "INSERT INTO IDN_OAUTH2_AUTHORIZATION_CODE (CODE_ID, AUTHORIZATION_CODE, CONSUMER_KEY_ID)
                 VALUES (?1, ?2, 1)",
                params![id, code],
            )
            .expect("insert code");
    }

    pub fn secrets(&self) -> Vec<(String, String)> {
        self.query_pairs(
            "SELECT CONSUMER_KEY, CONSUMER_SECRET FROM IDN_OAUTH_CONSUMER_APPS ORDER BY CONSUMER_KEY",
        )
    }

    pub fn codes(&self) -> Vec<(String, String)> {
        self.query_pairs(
            "SELECT CODE_ID, AUTHORIZATION_CODE FROM IDN_OAUTH2_AUTHORIZATION_CODE ORDER BY CODE_ID",
        )
    }

    pub fn tokens(&self) -> Vec<(String, String, Option<String>)> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT TOKEN_ID, ACCESS_TOKEN, REFRESH_TOKEN FROM IDN_OAUTH2_ACCESS_TOKEN ORDER BY TOKEN_ID",
            )
            .expect("prepare");
        let rows = stmt
            .query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)))
            .expect("query")
            .collect::<rusqlite::Result<Vec<_>>>()
            .expect("rows");
        rows
    }

    /// Names of every table in the database, sorted
    pub fn table_names(&self) -> Vec<String> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .expect("prepare");
        let names = stmt
            .query_map([], |r| r.get(0))
            .expect("query")
            .collect::<rusqlite::Result<Vec<String>>>()
            .expect("rows");
        names
    }

    fn query_pairs(&self, sql: &str) -> Vec<(String, String)> {
        let conn = self.conn();
        let mut stmt = conn.prepare(sql).expect("prepare");
        let rows = stmt
            .query_map([], |r| Ok((r.get(0)?, r.get(1)?)))
            .expect("query")
            .collect::<rusqlite::Result<Vec<_>>>()
            .expect("rows");
        rows
    }
}

impl Default for IdentityDb {
    fn default() -> Self {
        Self::new()
    }
}

// ──────────────────────────────────────────────────────────────
// Encryptor doubles
// ──────────────────────────────────────────────────────────────

/// `encrypt(x) = "ENC:" + x`
#[derive(Default)]
pub struct PrefixEncryptor {
    pub calls: Cell<usize>,
}

impl FieldEncryptor for PrefixEncryptor {
    fn encrypt(
        &self,
        cancel: &CancelToken,
        plaintext: &SecretValue,
    ) -> Result<String, EncryptionError> {
        if cancel.is_cancelled() {
            return Err(EncryptionError::Cancelled);
        }
        self.calls.set(self.calls.get() + 1);
        Ok(format!("ENC:{}", plaintext.expose_secret()))
    }
}

/// Prefix encryptor that rejects its `fail_on`-th call (1-based)
pub struct FailingEncryptor {
    pub fail_on: usize,
    pub calls: Cell<usize>,
}

impl FailingEncryptor {
    pub fn on_call(fail_on: usize) -> Self {
        Self {
            fail_on,
            calls: Cell::new(0),
        }
    }
}

impl FieldEncryptor for FailingEncryptor {
    fn encrypt(
        &self,
        _cancel: &CancelToken,
        plaintext: &SecretValue,
    ) -> Result<String, EncryptionError> {
        let call = self.calls.get() + 1;
        self.calls.set(call);
        if call == self.fail_on {
            return Err(EncryptionError::Rejected("test provider refused".into()));
        }
        Ok(format!("ENC:{}", plaintext.expose_secret()))
    }
}

/// Provider returning the reversed plaintext bytes prefixed with a marker byte
pub struct ReversingProvider;

impl EncryptionProvider for ReversingProvider {
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, EncryptionError> {
        let mut out = vec![0xE5];
        out.extend(plaintext.iter().rev());
        Ok(out)
    }
}

pub fn reversing_ciphertext(plaintext: &str) -> Vec<u8> {
    let mut out = vec![0xE5];
    out.extend(plaintext.as_bytes().iter().rev());
    out
}

pub struct OfflineProvider;

impl EncryptionProvider for OfflineProvider {
    fn encrypt(&self, _plaintext: &[u8]) -> Result<Vec<u8>, EncryptionError> {
        Err(EncryptionError::Unavailable("key store offline".into()))
    }

    fn is_available(&self) -> bool {
        false
    }
}

// ──────────────────────────────────────────────────────────────
// Repository double
// ──────────────────────────────────────────────────────────────

/// In-memory repository recording every batch it is asked to write
#[derive(Default)]
pub struct StubRepository {
    pub rows: HashMap<EntityKind, Vec<Record>>,
    pub fail_read: HashSet<EntityKind>,
    pub fail_write: HashSet<EntityKind>,
    pub migrated: HashSet<EntityKind>,
    pub fetches: Vec<EntityKind>,
    pub committed: HashMap<EntityKind, Vec<Record>>,
    pub bound_updates: usize,
}

impl StubRepository {
    pub fn with_apps(apps: &[(&str, &str)]) -> Self {
        let mut repo = Self::default();
        repo.rows.insert(
            EntityKind::Applications,
            apps.iter()
                .map(|(key, secret)| {
                    Record::new(
                        EntityKind::Applications,
                        RowKey::text(*key),
                        vec![SensitiveField::plaintext("CONSUMER_SECRET", *secret)],
                    )
                })
                .collect(),
        );
        repo
    }

    pub fn add_token(&mut self, id: &str, access: &str, refresh: Option<&str>) {
        let record = Record::new(
            EntityKind::AccessTokens,
            RowKey::text(id),
            vec![
                SensitiveField::plaintext("ACCESS_TOKEN", access),
                SensitiveField::from_column("REFRESH_TOKEN", refresh.map(str::to_owned)),
            ],
        );
        self.rows
            .entry(EntityKind::AccessTokens)
            .or_default()
            .push(record);
    }

    pub fn add_code(&mut self, id: &str, code: &str) {
        let record = Record::new(
            EntityKind::AuthorizationCodes,
            RowKey::text(id),
            vec![SensitiveField::plaintext("AUTHORIZATION_CODE", code)],
        );
        self.rows
            .entry(EntityKind::AuthorizationCodes)
            .or_default()
            .push(record);
    }

    /// Ciphertexts committed for `kind`, per row, in write order
    pub fn committed_values(&self, kind: EntityKind) -> Vec<Vec<Option<String>>> {
        self.committed
            .get(&kind)
            .map(|records| {
                records
                    .iter()
                    .map(|r| {
                        r.fields()
                            .iter()
                            .map(|f| f.ciphertext().map(str::to_owned))
                            .collect()
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl RowRepository for StubRepository {
    fn fetch_all(
        &mut self,
        entity: &EntitySpec,
        cancel: &CancelToken,
    ) -> Result<Vec<Record>, StoreError> {
        if cancel.is_cancelled() {
            return Err(StoreError::Cancelled);
        }
        self.fetches.push(entity.kind);
        if self.fail_read.contains(&entity.kind) {
            return Err(StoreError::Unavailable("connection refused".into()));
        }
        Ok(self.rows.get(&entity.kind).cloned().unwrap_or_default())
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
        if self.fail_write.contains(&entity.kind) {
            return Err(StoreError::Unavailable("disk full".into()));
        }
        self.bound_updates += records.len();
        self.committed.insert(entity.kind, records.to_vec());
        Ok(records.len())
    }

    fn is_migrated(
        &mut self,
        entity: &EntitySpec,
        cancel: &CancelToken,
    ) -> Result<bool, StoreError> {
        if cancel.is_cancelled() {
            return Err(StoreError::Cancelled);
        }
        Ok(self.migrated.contains(&entity.kind))
    }
}
