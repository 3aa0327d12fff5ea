//! Record store seam and adapters.
//!
//! # Responsibility
//! - Define the single narrow interface through which entity modules reach
//!   the record store: `submit(entity, operation, params) -> Envelope`.
//! - Provide a remote HTTP adapter and a local SQLite adapter.
//!
//! # Invariants
//! - `Err(StoreError)` means the request never produced an envelope
//!   (transport, decoding or local storage failure).
//! - A store-side refusal is `Ok(Envelope { success: false, .. })`, never an
//!   `Err`.

pub mod envelope;
pub mod http;
pub mod params;
pub mod sqlite;

use crate::db::DbError;
use crate::model::record::RecordId;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub use envelope::{Envelope, FieldError, RecordResult};
pub use http::HttpRecordStore;
pub use params::{Operator, RecordParams, SortType};
pub use sqlite::SqliteRecordStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Transport-level store failure.
#[derive(Debug)]
pub enum StoreError {
    Http(reqwest::Error),
    /// Remote answered with a non-success HTTP status.
    Status { status: u16, body: String },
    Json(serde_json::Error),
    Db(DbError),
    /// Request could not be built (bad header value, unusable base URL).
    InvalidRequest(String),
    /// Local store handle is unusable (poisoned lock).
    Unavailable(&'static str),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http(err) => write!(f, "store transport error: {err}"),
            Self::Status { status, body } => write!(f, "store returned HTTP {status}: {body}"),
            Self::Json(err) => write!(f, "store payload error: {err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidRequest(message) => write!(f, "invalid store request: {message}"),
            Self::Unavailable(reason) => write!(f, "store unavailable: {reason}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Http(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Status { .. } | Self::InvalidRequest(_) | Self::Unavailable(_) => None,
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(value: reqwest::Error) -> Self {
        Self::Http(value)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
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

/// Store operation addressed by one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Fetch,
    GetById(RecordId),
    Create,
    Update,
    Delete,
}

impl Operation {
    /// Stable name used in logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::Fetch => "fetch",
            Self::GetById(_) => "get",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// Generic record store client.
///
/// Implementations must be shareable across threads so that independent
/// entity requests can run concurrently against one store handle.
pub trait RecordStore: Send + Sync {
    /// Submits one request for `entity` and returns the store envelope.
    fn submit(
        &self,
        entity: &str,
        operation: Operation,
        params: &RecordParams,
    ) -> StoreResult<Envelope>;
}

impl<T: RecordStore + ?Sized> RecordStore for Arc<T> {
    fn submit(
        &self,
        entity: &str,
        operation: Operation,
        params: &RecordParams,
    ) -> StoreResult<Envelope> {
        (**self).submit(entity, operation, params)
    }
}

impl<T: RecordStore + ?Sized> RecordStore for &T {
    fn submit(
        &self,
        entity: &str,
        operation: Operation,
        params: &RecordParams,
    ) -> StoreResult<Envelope> {
        (**self).submit(entity, operation, params)
    }
}
