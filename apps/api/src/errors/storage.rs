//! Storage-level error type.
//!
//! This error type is HTTP- and driver-agnostic. The sea-orm adapter in
//! `infra::db_errors` produces it; handlers convert it to `AppError` via
//! the `From<StorageError> for AppError` implementation.

use std::error::Error;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Classified storage failure with a sanitized, PII-free detail message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Unique constraint violated (SQLSTATE 23505)
    UniqueViolation(String),
    /// Referenced row does not exist (SQLSTATE 23503)
    ForeignKeyViolation(String),
    /// Lookup matched no row
    RecordNotFound(String),
    /// Connection or pool failure
    Unavailable(String),
    /// Anything the classifier does not recognize
    Other(String),
}

impl StorageError {
    pub fn detail(&self) -> &str {
        match self {
            StorageError::UniqueViolation(d)
            | StorageError::ForeignKeyViolation(d)
            | StorageError::RecordNotFound(d)
            | StorageError::Unavailable(d)
            | StorageError::Other(d) => d,
        }
    }
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            StorageError::UniqueViolation(d) => write!(f, "unique violation: {d}"),
            StorageError::ForeignKeyViolation(d) => write!(f, "foreign key violation: {d}"),
            StorageError::RecordNotFound(d) => write!(f, "record not found: {d}"),
            StorageError::Unavailable(d) => write!(f, "storage unavailable: {d}"),
            StorageError::Other(d) => write!(f, "storage error: {d}"),
        }
    }
}

impl Error for StorageError {}
