//! Error taxonomy for the algebra-to-Cypher compiler and executor bridge.
//!
//! Mirrors `storage::StorageError`'s shape (a `thiserror` enum with
//! `#[from]` conversions from the layer below) but adds the one variant
//! that is purely a compile-time signal: [`CompileError::Unsupported`].
//! `Unsupported` is caught at the executor bridge (C8) and triggers host
//! fallback; it must never reach a caller of [`sdk`].

use storage::StorageError;

/// Why a sub-operator of the algebra tree could not be compiled to Cypher.
///
/// Returned by the BGP/algebra compiler (C6/C7), never by the executor
/// bridge directly — the bridge catches this and falls back to the host's
/// evaluator.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CompileError {
    /// The sub-operator (or a sub-expression within it) uses syntax or
    /// semantics outside the pushdown-translatable subset.
    #[error("unsupported: {reason}")]
    Unsupported {
        /// Short, stable reason code (e.g. `"property-path"`,
        /// `"multiple-variable-predicates"`), logged by the observability
        /// shim alongside a fingerprint of the sub-operator.
        reason: &'static str,
        /// Optional human-readable detail.
        detail: Option<String>,
    },

    /// A predicate IRI violated the mapping model's invariants (backtick,
    /// `uri` collision) while being compiled into Cypher syntax.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

impl CompileError {
    /// Build an `Unsupported` error with just a reason code.
    pub fn unsupported(reason: &'static str) -> Self {
        CompileError::Unsupported {
            reason,
            detail: None,
        }
    }

    /// Build an `Unsupported` error with a reason code and detail message.
    pub fn unsupported_detail(reason: &'static str, detail: impl Into<String>) -> Self {
        CompileError::Unsupported {
            reason,
            detail: Some(detail.into()),
        }
    }

    /// The stable reason code, for logging/metrics, regardless of variant.
    pub fn reason_code(&self) -> &'static str {
        match self {
            CompileError::Unsupported { reason, .. } => reason,
            CompileError::InvariantViolation(_) => "invariant-violation",
        }
    }
}

/// Errors raised while executing an already-compiled query, or while
/// driving the fallback path.
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    /// The backend/storage layer failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// A result row could not be decoded into a term binding.
    #[error("codec mismatch: {0}")]
    CodecMismatch(String),

    /// The query's cancellation token fired before iteration completed.
    #[error("execution cancelled")]
    Cancelled,

    /// The direct-Cypher escape hatch (C9) failed executing raw Cypher.
    /// No fallback is attempted for this path.
    #[error("direct cypher execution failed: {0}")]
    DirectCypherFailed(String),
}
