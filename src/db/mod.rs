// src/db/mod.rs
//! Identity database access: connection setup and the row repository

pub mod conn;
pub mod repository;

pub use conn::open_identity_db;
pub use repository::{RowRepository, SqliteRepository};
