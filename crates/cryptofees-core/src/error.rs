use thiserror::Error;

use crate::adapter::SourceError;
use crate::cache::FeeCacheError;
use crate::query_service::QueryError;
use crate::registry::RegistryError;

/// Validation and contract errors exposed by `cryptofees-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("protocol id cannot be empty")]
    EmptyProtocolId,
    #[error("protocol id length {len} exceeds max {max}")]
    ProtocolIdTooLong { len: usize, max: usize },
    #[error("protocol id must start with an ASCII letter or digit: '{ch}'")]
    ProtocolIdInvalidStart { ch: char },
    #[error("protocol id contains invalid character '{ch}' at index {index}")]
    ProtocolIdInvalidChar { ch: char, index: usize },

    #[error("date must be formatted as YYYY-MM-DD: '{value}'")]
    InvalidDateKey { value: String },
    #[error("unix timestamp {value} is outside the supported date range")]
    TimestampOutOfRange { value: i64 },
    #[error("date arithmetic left the supported calendar range")]
    DateOutOfRange,

    #[error("window start {start} must not be after end {end}")]
    InvertedWindow { start: String, end: String },
    #[error("window must span at least one day")]
    EmptyWindow,

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be non-negative")]
    NegativeValue { field: &'static str },

    #[error("protocol display name cannot be empty")]
    EmptyDisplayName,
    #[error("invalid category '{value}', expected one of l1, dex, lending, xchain, other")]
    InvalidCategory { value: String },
}

/// Top-level error type for core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Cache(#[from] FeeCacheError),
}
