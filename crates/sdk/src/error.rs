//! Error types for the SDK

use thiserror::Error;

/// Result type alias for SDK operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when using the SDK
#[derive(Error, Debug)]
pub enum Error {
    /// Query compilation or execution error (`sparql::CompileError`/
    /// `sparql::ExecutionError`, including `Cancelled`).
    #[error("Query error: {0}")]
    Query(String),

    /// Storage backend error (`storage::StorageError`, including
    /// `BackendError`/`CodecMismatch`/`InvariantViolation`/
    /// `NestedTransactionUnsupported`).
    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<storage::StorageError> for Error {
    fn from(err: storage::StorageError) -> Self {
        Error::Storage(err.to_string())
    }
}

impl From<sparql::ExecutionError> for Error {
    fn from(err: sparql::ExecutionError) -> Self {
        Error::Query(err.to_string())
    }
}

impl From<sparql::CompileError> for Error {
    fn from(err: sparql::CompileError) -> Self {
        Error::Query(err.to_string())
    }
}
