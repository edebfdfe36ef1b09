// src/db/conn.rs
use std::path::Path;
use std::time::Duration;

use rusqlite::{Connection, OpenFlags};
use tracing::info;

use crate::config::DatabaseConfig;

/// Open an existing identity database read-write.
///
/// Never creates the file: a wrong path must fail here, not produce an empty
/// database that "migrates" zero rows.
pub fn open_identity_db(config: &DatabaseConfig) -> rusqlite::Result<Connection> {
    let conn = Connection::open_with_flags(
        Path::new(&config.path),
        OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_URI,
    )?;
    conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;

    info!(path = %config.path, "opened identity database");
    Ok(conn)
}
