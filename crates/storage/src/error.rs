//! Error taxonomy for the property-graph adapter's storage layer.

/// Result type threaded through the driver port, codec, mapping layer,
/// triple store, and write buffer.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur in the storage layer.
///
/// This is the Rust expression of the adapter's error taxonomy: a backend
/// query failure, a codec round-trip mismatch, an invariant violation in
/// the mapping model, an unsupported write-buffer operation, and
/// cancellation are all distinguishable so a host can decide what to retry,
/// what to fall back on, and what to surface to a user.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The underlying graph database rejected or failed a query.
    #[error("backend error: {0}")]
    Backend(#[from] DriverError),

    /// A term round-tripped through the codec did not come back the shape
    /// it went in as (e.g. a property came back as a list, or a node that
    /// should carry `uri` didn't).
    #[error("codec mismatch: {0}")]
    CodecMismatch(String),

    /// A mapping-model invariant was violated (reserved `uri` property
    /// collision, a predicate IRI containing a backtick, etc).
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// A second transaction was started while one was already open. The
    /// design only supports a single open write transaction at a time; the
    /// host must serialize nested begin/commit calls itself.
    #[error("nested transaction unsupported: a transaction is already open")]
    NestedTransactionUnsupported,

    /// The operation was cancelled via a cooperative cancellation token
    /// before it completed.
    #[error("operation cancelled")]
    Cancelled,
}

/// Errors raised directly by a [`crate::Driver`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// The backend could not be reached (connection refused, timeout, DNS).
    #[error("connection error: {0}")]
    Connection(String),

    /// The backend returned an error for the issued query (syntax error,
    /// type error, constraint violation reported by the graph database).
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// A result row did not have the shape the caller expected (wrong
    /// column count, unexpected value kind at a given column).
    #[error("malformed result: {0}")]
    MalformedResult(String),

    /// Low-level protocol error talking to the backend (e.g. a malformed
    /// RESP reply from a `GRAPH.QUERY` call).
    #[error("protocol error: {0}")]
    Protocol(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_displays_driver_cause() {
        let err = StorageError::Backend(DriverError::Connection("refused".into()));
        assert!(err.to_string().contains("refused"));
    }

    #[test]
    fn test_invariant_violation_message() {
        let err = StorageError::InvariantViolation("predicate equals reserved key 'uri'".into());
        assert!(err.to_string().contains("uri"));
    }
}
