// src/migrate/mod.rs
//! Migration engine: per-entity fetch → encrypt → write passes and their report

pub mod orchestrator;
pub mod report;

pub use orchestrator::{MigrationOptions, Migrator};
pub use report::{PassReport, RunSummary};
