//! Observability Shim (C10): a sink the host injects so the adapter can
//! emit spans and metrics without hard-wiring a particular `tracing`
//! subscriber or `metrics` recorder. Mirrors this workspace's existing
//! `track_operation`/`OperationType` pattern, generalized from raw
//! key-value storage operations to triple-store, write-buffer, and
//! compiler operations.

use std::time::{Duration, Instant};
use tracing::{debug, error, instrument};

/// Operation kind for metrics and span naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationType {
    /// Direct-path triple insertion (C4).
    TripleStoreAdd,
    /// Direct-path pattern lookup (C4).
    TripleStoreFind,
    /// Direct-path triple deletion (C4).
    TripleStoreDelete,
    /// Write-buffer transaction commit (C5).
    TransactionCommit,
    /// Write-buffer transaction rollback/abort (C5).
    TransactionRollback,
    /// BGP compilation (C6).
    CompileBgp,
    /// OPTIONAL compilation (C7).
    CompileOptional,
    /// UNION compilation (C7).
    CompileUnion,
    /// FILTER compilation (C7).
    CompileFilter,
    /// GROUP BY / aggregate compilation (C7).
    CompileGroup,
    /// Direct-Cypher escape hatch invocation (C9).
    EscapeHatchCypher,
}

impl OperationType {
    /// Stable metric name for this operation, used as the root for the
    /// counter/histogram/error names below.
    pub fn metric_name(&self) -> &'static str {
        match self {
            OperationType::TripleStoreAdd => "triple_store.add",
            OperationType::TripleStoreFind => "triple_store.find",
            OperationType::TripleStoreDelete => "triple_store.delete",
            OperationType::TransactionCommit => "transaction.commit",
            OperationType::TransactionRollback => "transaction.rollback",
            OperationType::CompileBgp => "compiler.bgp",
            OperationType::CompileOptional => "compiler.optional",
            OperationType::CompileUnion => "compiler.union",
            OperationType::CompileFilter => "compiler.filter",
            OperationType::CompileGroup => "compiler.group",
            OperationType::EscapeHatchCypher => "escape_hatch.cypher",
        }
    }

    /// Counter metric name.
    pub fn counter_name(&self) -> String {
        format!("{}.count", self.metric_name())
    }

    /// Latency histogram metric name.
    pub fn latency_name(&self) -> String {
        format!("{}.latency_ms", self.metric_name())
    }

    /// Error counter metric name.
    pub fn error_name(&self) -> String {
        format!("{}.errors", self.metric_name())
    }
}

/// Maximum length of Cypher text attached to a span, to keep spans bounded
/// when a compiled query is very large.
pub const CYPHER_TRUNCATION_LIMIT: usize = 4096;

/// The attributes attached to one completed operation, handed to the sink
/// after the operation runs.
#[derive(Debug, Clone)]
pub struct OperationEvent {
    /// Which kind of operation this was.
    pub op: OperationType,
    /// Wall-clock time the operation took.
    pub duration: Duration,
    /// `Some(error message)` if the operation failed.
    pub error: Option<String>,
    /// The generated Cypher text, truncated to [`CYPHER_TRUNCATION_LIMIT`]
    /// bytes, if this operation produced one.
    pub cypher: Option<String>,
    /// Number of rows the backend returned, if applicable.
    pub row_count: Option<usize>,
    /// `Some(reason)` if this operation fell back to the host's standard
    /// evaluator instead of completing the pushdown.
    pub fell_back: Option<String>,
}

impl OperationEvent {
    /// Start building an event for `op`, with no cypher/row/fallback info
    /// yet attached.
    pub fn new(op: OperationType, duration: Duration) -> Self {
        OperationEvent {
            op,
            duration,
            error: None,
            cypher: None,
            row_count: None,
            fell_back: None,
        }
    }

    /// Attach (truncated) generated Cypher text.
    pub fn with_cypher(mut self, cypher: &str) -> Self {
        let truncated = if cypher.len() > CYPHER_TRUNCATION_LIMIT {
            format!("{}...", &cypher[..CYPHER_TRUNCATION_LIMIT])
        } else {
            cypher.to_string()
        };
        self.cypher = Some(truncated);
        self
    }

    /// Attach the row count returned by the backend.
    pub fn with_row_count(mut self, count: usize) -> Self {
        self.row_count = Some(count);
        self
    }

    /// Mark this operation as having fallen back to the host evaluator.
    pub fn with_fallback(mut self, reason: impl Into<String>) -> Self {
        self.fell_back = Some(reason.into());
        self
    }
}

/// A sink the host injects to receive operation events. The default is
/// [`NullSink`]; [`TracingSink`] forwards to `tracing` spans and `metrics`
/// counters/histograms the way this workspace's other crates already do.
pub trait ObservabilitySink: Send + Sync {
    /// Receive one completed operation's attributes.
    fn record(&self, event: OperationEvent);
}

/// A sink that discards every event. The default when a host doesn't wire
/// up observability.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ObservabilitySink for NullSink {
    fn record(&self, _event: OperationEvent) {}
}

/// A sink that forwards events to `tracing` spans/logs and `metrics`
/// counters/histograms.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ObservabilitySink for TracingSink {
    fn record(&self, event: OperationEvent) {
        let duration_ms = event.duration.as_secs_f64() * 1000.0;
        let counter_name = event.op.counter_name();
        let latency_name = event.op.latency_name();

        metrics::counter!(counter_name).increment(1);
        metrics::histogram!(latency_name).record(duration_ms);

        match &event.error {
            None => debug!(
                op = event.op.metric_name(),
                latency_ms = duration_ms,
                cypher = event.cypher.as_deref(),
                rows = event.row_count,
                fell_back = event.fell_back.as_deref(),
                "operation completed"
            ),
            Some(message) => {
                metrics::counter!(event.op.error_name()).increment(1);
                error!(
                    op = event.op.metric_name(),
                    latency_ms = duration_ms,
                    error = message,
                    "operation failed"
                );
            }
        }
    }
}

/// Run `f`, timing it and reporting the outcome to `sink`. The common case
/// for triple-store and write-buffer operations, which have no Cypher text
/// or row count of their own to attach.
#[instrument(level = "debug", skip(sink, f))]
pub fn track_operation<F, T, E>(sink: &dyn ObservabilitySink, op: OperationType, f: F) -> Result<T, E>
where
    F: FnOnce() -> Result<T, E>,
    E: std::fmt::Display,
{
    let start = Instant::now();
    let result = f();
    let mut event = OperationEvent::new(op, start.elapsed());
    if let Err(e) = &result {
        event.error = Some(e.to_string());
    }
    sink.record(event);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct CountingSink {
        recorded: AtomicUsize,
        errors: AtomicUsize,
    }

    impl ObservabilitySink for CountingSink {
        fn record(&self, event: OperationEvent) {
            self.recorded.fetch_add(1, Ordering::SeqCst);
            if event.error.is_some() {
                self.errors.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    #[test]
    fn test_operation_type_names() {
        assert_eq!(OperationType::TripleStoreAdd.metric_name(), "triple_store.add");
        assert_eq!(OperationType::CompileBgp.counter_name(), "compiler.bgp.count");
    }

    #[test]
    fn test_track_operation_reports_success() {
        let sink = Arc::new(CountingSink::default());
        let result: Result<i32, String> =
            track_operation(sink.as_ref(), OperationType::TripleStoreAdd, || Ok(1));
        assert_eq!(result.unwrap(), 1);
        assert_eq!(sink.recorded.load(Ordering::SeqCst), 1);
        assert_eq!(sink.errors.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_track_operation_reports_error() {
        let sink = Arc::new(CountingSink::default());
        let result: Result<i32, String> = track_operation(sink.as_ref(), OperationType::TripleStoreFind, || {
            Err("boom".to_string())
        });
        assert!(result.is_err());
        assert_eq!(sink.errors.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cypher_truncation() {
        let long = "x".repeat(CYPHER_TRUNCATION_LIMIT + 100);
        let event = OperationEvent::new(OperationType::CompileBgp, Duration::from_millis(1))
            .with_cypher(&long);
        assert!(event.cypher.unwrap().len() <= CYPHER_TRUNCATION_LIMIT + 3);
    }

    #[test]
    fn test_null_sink_discards() {
        let sink = NullSink;
        sink.record(OperationEvent::new(OperationType::CompileFilter, Duration::from_millis(1)));
    }
}
