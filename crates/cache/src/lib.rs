//! SQLite storage adapter for cached translation resources.
//!
//! The database is a cache, not the source of truth: deleting it loses
//! nothing that cannot be fetched again from the remote content service.
//!
//! # Tables
//! - **resource_metadata**: one row per resource instance, keyed by
//!   `server/owner/language/id`.
//! - **resource_content**: one row per content unit, keyed by the canonical
//!   content key, with the typed payload stored as tagged JSON.
//! - **storage_usage**: singleton usage counters, recomputed in the same
//!   transaction as every content mutation.

mod db;
pub mod error;
mod models;
mod storage;

pub use crate::db::Database;
pub use crate::storage::SqliteStorage;
