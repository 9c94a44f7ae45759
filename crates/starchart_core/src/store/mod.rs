//! Schedule store: one remote document holding the whole week.
//!
//! # Responsibility
//! - Abstract the hosted document store behind `DocumentBackend`.
//! - Encode/decode the schedule document and classify malformed payloads.
//! - Expose subscribe/write operations through `ScheduleStoreClient`.
//!
//! # Invariants
//! - Writes always replace the whole document.
//! - Optional task fields travel as explicit `null`.
//! - Snapshots reach a subscriber in revision order.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod backend;
pub mod client;
pub mod config;
pub mod payload;
pub mod sqlite_backend;

pub type StoreResult<T> = Result<T, StoreError>;

/// Names one document in the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentPath {
    pub project_id: String,
    pub collection: String,
    pub document_id: String,
}

impl DocumentPath {
    pub fn new(
        project_id: impl Into<String>,
        collection: impl Into<String>,
        document_id: impl Into<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            collection: collection.into(),
            document_id: document_id.into(),
        }
    }
}

impl Display for DocumentPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.project_id, self.collection, self.document_id
        )
    }
}

/// Store-layer error for backend access and document encoding.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    Codec(serde_json::Error),
    /// Internal lock was poisoned by a panicking holder.
    LockPoisoned(&'static str),
    /// Backend cannot serve requests (transport down, not configured).
    Unavailable(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Codec(err) => write!(f, "document encoding failed: {err}"),
            Self::LockPoisoned(name) => write!(f, "store lock `{name}` is poisoned"),
            Self::Unavailable(message) => write!(f, "store unavailable: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Codec(err) => Some(err),
            Self::LockPoisoned(_) | Self::Unavailable(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Codec(value)
    }
}
