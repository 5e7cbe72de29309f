//! Storage layer for kmtrack.
//!
//! Provides a small key-value persistence seam ([`KeyValueStore`]) and the
//! [`TripLedger`] built on top of it.
//!
//! # Thread Safety
//!
//! [`SqliteStore`] wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! A ledger can be moved between threads but not shared without external
//! synchronization.
//!
//! # Storage Format
//!
//! The whole ledger is stored as one JSON array under [`STORAGE_KEY`]. Entry
//! dates are `YYYY-MM-DD` strings and activity types are lowercase names.
//! When evolving [`km_core::TripEntry`]:
//! - Adding optional fields: old blobs still load
//! - Removing or renaming fields: old blobs fail to parse and load as an empty ledger

mod ledger;
mod store;

use km_core::TripId;
use thiserror::Error;

pub use ledger::{STORAGE_KEY, TripLedger};
pub use store::{KeyValueStore, MemoryStore, SqliteStore};

/// Key-value backend errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Trip ledger errors.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Entries could not be serialized for persistence.
    #[error("failed to encode trips: {0}")]
    Json(#[from] serde_json::Error),
    #[error("trip not found: {0}")]
    NotFound(TripId),
    /// Month keys are `YYYY-MM`.
    #[error("invalid month: {0} (expected YYYY-MM)")]
    InvalidMonth(String),
    #[error("invalid distance: {0} km")]
    InvalidDistance(f64),
}
