//! Entity access services.
//!
//! # Responsibility
//! - Expose per-entity CRUD, search and helper reads over a [`RecordStore`].
//! - Normalize store envelopes into domain objects and typed errors.
//!
//! # Invariants
//! - Reads degrade to empty results on store failure and notify a warning.
//! - Writes return `Err` on top-level store failure; per-record failures are
//!   reported, never dropped.
//!
//! [`RecordStore`]: crate::store::RecordStore

pub mod access;
pub mod activity_service;
pub mod company_service;
pub mod contact_service;
pub mod deal_service;
pub mod export;

use crate::model::deal::InvalidDealStage;
use crate::model::record::{MappingError, RecordId};
use crate::store::StoreError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Entity-layer failure.
#[derive(Debug)]
pub enum ServiceError {
    /// Store refused the whole request.
    Rejected {
        entity: &'static str,
        message: String,
    },
    NotFound {
        entity: &'static str,
        id: RecordId,
        message: String,
    },
    /// Stage label outside the closed deal stage set.
    InvalidStage(InvalidDealStage),
    /// Textual id that is not an integer.
    InvalidId(String),
    /// Store record could not be mapped into a domain object.
    InvalidData(MappingError),
    Store(StoreError),
    Export(std::io::Error),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rejected { entity, message } => write!(f, "{entity} request rejected: {message}"),
            Self::NotFound {
                entity,
                id,
                message,
            } => write!(f, "{entity} {id} not found: {message}"),
            Self::InvalidStage(err) => write!(f, "{err}"),
            Self::InvalidId(raw) => write!(f, "invalid record id `{raw}`"),
            Self::InvalidData(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::Export(err) => write!(f, "export failed: {err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidStage(err) => Some(err),
            Self::InvalidData(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::Export(err) => Some(err),
            Self::Rejected { .. } | Self::NotFound { .. } | Self::InvalidId(_) => None,
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<MappingError> for ServiceError {
    fn from(value: MappingError) -> Self {
        Self::InvalidData(value)
    }
}

impl From<InvalidDealStage> for ServiceError {
    fn from(value: InvalidDealStage) -> Self {
        Self::InvalidStage(value)
    }
}

impl From<std::io::Error> for ServiceError {
    fn from(value: std::io::Error) -> Self {
        Self::Export(value)
    }
}

/// Parses a textual record id such as a route parameter.
///
/// Surrounding whitespace is ignored; anything else that is not a base-10
/// integer is rejected before it can reach the store.
pub fn parse_record_id(raw: &str) -> ServiceResult<RecordId> {
    raw.trim()
        .parse::<RecordId>()
        .map_err(|_| ServiceError::InvalidId(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::{parse_record_id, ServiceError};

    #[test]
    fn parse_record_id_accepts_padded_integers() {
        assert_eq!(parse_record_id(" 42 ").unwrap(), 42);
    }

    #[test]
    fn parse_record_id_rejects_non_numeric_text() {
        for raw in ["", "abc", "4.5", "12a"] {
            assert!(matches!(parse_record_id(raw), Err(ServiceError::InvalidId(_))));
        }
    }
}
