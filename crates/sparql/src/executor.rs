//! Executor Bridge (C8): walks the algebra tree, asks the compiler (C6/C7)
//! to push each node down to Cypher, executes the compiled query through a
//! [`storage::Driver`], and decodes rows back into host-facing variable
//! bindings. A node the compiler reports [`CompileError::Unsupported`] for
//! is handed to the host's own evaluator instead — this bridge never
//! invents a fallback evaluation of its own, since the host is the only
//! party that knows the full (uncompilable) operator semantics.
//!
//! Grounded on this workspace's original executor's row-iteration shape and
//! its `ExecutionError::Unsupported`-triggers-fallback contract, retargeted
//! from a direct triple-pattern evaluator onto the Cypher-compiling
//! `algebra_compiler`/`bgp_compiler` pair.

use crate::algebra::Algebra;
use crate::algebra_compiler::compile_algebra;
use crate::bindings::{decode_rows, BindingSet};
use crate::cancellation::CancellationToken;
use crate::compiled::VariableMapping;
use crate::error::{CompileError, ExecutionError};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use storage::{track_operation, BackendValue, Driver, NullSink, ObservabilitySink, OperationEvent, OperationType};

/// Which [`storage::OperationType`] a given [`Algebra`] node reports as, for
/// span/metric naming (§4.10). A `Project` node is transparent for
/// observability purposes — it reports as whatever its input reports as.
fn operation_type_for(node: &Algebra<'_>) -> OperationType {
    match node {
        Algebra::Bgp(_) => OperationType::CompileBgp,
        Algebra::LeftJoin { .. } => OperationType::CompileOptional,
        Algebra::Union { .. } => OperationType::CompileUnion,
        Algebra::Filter { .. } => OperationType::CompileFilter,
        Algebra::Group { .. } => OperationType::CompileGroup,
        Algebra::Project { input, .. } => operation_type_for(input),
    }
}

/// The verdict the bridge reaches for one algebra node: either it was
/// pushed down and executed, or the compiler rejected it and the caller
/// must evaluate `node` itself (the host's "standard evaluator", per
/// §4.7.5's fallback contract).
#[derive(Debug)]
pub enum BridgeOutcome {
    /// The node was compiled and executed; these are its decoded solutions.
    Pushed(BindingSet),
    /// The node could not be pushed down. The host must evaluate `node`
    /// with its own engine; this is not itself an error.
    Fallback {
        /// Stable reason code, also logged via the observability shim.
        reason: &'static str,
        /// Optional additional detail from the compiler.
        detail: Option<String>,
    },
}

/// Walks one algebra node and its compiled Cypher through a [`Driver`],
/// reporting every attempt to an [`ObservabilitySink`].
///
/// Holds no state of its own beyond the driver/sink/cancellation it was
/// built with — a [`crate::compiled::CompilationResult`] lives only for the
/// duration of one call to [`ExecutorBridge::execute`], per the compiler's
/// documented lifecycle.
pub struct ExecutorBridge<D: Driver> {
    driver: Arc<D>,
    sink: Arc<dyn ObservabilitySink>,
    cancellation: CancellationToken,
}

impl<D: Driver> ExecutorBridge<D> {
    /// Build a bridge over `driver` with no observability and a fresh
    /// (never-cancelled) cancellation token.
    pub fn new(driver: Arc<D>) -> Self {
        ExecutorBridge {
            driver,
            sink: Arc::new(NullSink),
            cancellation: CancellationToken::new(),
        }
    }

    /// Build a bridge reporting to `sink` and observing `cancellation`.
    pub fn with_sink(driver: Arc<D>, sink: Arc<dyn ObservabilitySink>, cancellation: CancellationToken) -> Self {
        ExecutorBridge {
            driver,
            sink,
            cancellation,
        }
    }

    /// Attempt to push `node` down to Cypher and execute it.
    ///
    /// On [`CompileError::Unsupported`], returns `Ok(BridgeOutcome::Fallback { .. })`
    /// rather than an error — per §7, `Unsupported` is a compile-time signal
    /// the bridge swallows, never a failure the caller propagates.
    /// [`CompileError::InvariantViolation`] means the *input* (not just this
    /// attempted pushdown) violates a storage invariant, so it is surfaced
    /// as an error instead.
    pub fn execute(&self, node: &Algebra<'_>) -> Result<BridgeOutcome, ExecutionError> {
        if self.cancellation.is_cancelled() {
            return Err(ExecutionError::Cancelled);
        }

        let op = operation_type_for(node);
        match compile_algebra(node) {
            Ok(compiled) => {
                let cypher = compiled.cypher_text.clone();
                let mapping = compiled.variable_mapping;
                let parameters = compiled.parameters;
                let outcome = track_operation(self.sink.as_ref(), op, || {
                    self.run_compiled(&cypher, &parameters, &mapping)
                });
                outcome.map(BridgeOutcome::Pushed)
            }
            Err(CompileError::Unsupported { reason, detail }) => {
                self.sink.record(fallback_event(op, reason));
                Ok(BridgeOutcome::Fallback { reason, detail })
            }
            Err(CompileError::InvariantViolation(message)) => Err(ExecutionError::CodecMismatch(message)),
        }
    }

    /// Checks the cancellation token before and after the driver call. Since
    /// [`storage::Rows`] is eagerly materialized rather than a streaming
    /// cursor, the second check cannot interrupt a query already in
    /// progress — it only catches cancellation requested while `execute` was
    /// running, before this bridge starts decoding the (already fully
    /// fetched) rows. There is no per-row checkpoint to cancel at.
    fn run_compiled(
        &self,
        cypher: &str,
        parameters: &BTreeMap<String, BackendValue>,
        mapping: &VariableMapping<'_>,
    ) -> Result<BindingSet, ExecutionError> {
        if self.cancellation.is_cancelled() {
            return Err(ExecutionError::Cancelled);
        }
        let rows = self.driver.execute(cypher, parameters)?;
        if self.cancellation.is_cancelled() {
            return Err(ExecutionError::Cancelled);
        }
        decode_rows(&rows, mapping)
    }
}

fn fallback_event(op: OperationType, reason: &'static str) -> OperationEvent {
    OperationEvent::new(op, Duration::ZERO).with_fallback(reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdf_model::{Pattern, Term, TermSlot, Vocabulary};
    use storage::{BackendValue, MockDriver, Row};

    fn bgp_node(patterns: Vec<Pattern<'_>>) -> Algebra<'_> {
        Algebra::Bgp(patterns)
    }

    #[test]
    fn test_pushed_down_bgp_returns_decoded_bindings() {
        let driver = Arc::new(MockDriver::new());
        driver.push_response(vec![Row::new(vec![(
            "s".to_string(),
            BackendValue::String("http://ex/alice".to_string()),
        )])]);
        let bridge = ExecutorBridge::new(Arc::clone(&driver));

        let node = bgp_node(vec![Pattern::new(
            TermSlot::var("s"),
            TermSlot::concrete(Term::iri(Vocabulary::RDF_TYPE)),
            TermSlot::concrete(Term::iri("http://ex/Person")),
        )]);

        let outcome = bridge.execute(&node).unwrap();
        match outcome {
            BridgeOutcome::Pushed(bindings) => {
                assert_eq!(bindings.len(), 1);
                assert!(bindings[0].is_bound("s"));
            }
            BridgeOutcome::Fallback { .. } => panic!("expected pushdown"),
        }
        assert_eq!(driver.query_count(), 1);
    }

    #[test]
    fn test_unsupported_node_falls_back_without_error() {
        let driver = Arc::new(MockDriver::new());
        let bridge = ExecutorBridge::new(Arc::clone(&driver));

        // A variable predicate inside a multi-pattern BGP is rejected by
        // the compiler's documented single-variable-predicate limit.
        let node = bgp_node(vec![
            Pattern::new(TermSlot::var("s"), TermSlot::var("p"), TermSlot::var("o")),
            Pattern::new(
                TermSlot::var("s"),
                TermSlot::concrete(Term::iri("http://ex/other")),
                TermSlot::var("x"),
            ),
        ]);

        let outcome = bridge.execute(&node).unwrap();
        assert!(matches!(outcome, BridgeOutcome::Fallback { .. }));
        assert_eq!(driver.query_count(), 0, "no Cypher should be issued for a rejected node");
    }

    #[test]
    fn test_cancelled_token_short_circuits_before_driver_call() {
        let driver = Arc::new(MockDriver::new());
        let token = CancellationToken::new();
        token.cancel();
        let bridge = ExecutorBridge::with_sink(Arc::clone(&driver), Arc::new(NullSink), token);

        let node = bgp_node(vec![Pattern::new(
            TermSlot::var("s"),
            TermSlot::concrete(Term::iri(Vocabulary::RDF_TYPE)),
            TermSlot::concrete(Term::iri("http://ex/Person")),
        )]);

        let result = bridge.execute(&node);
        assert!(matches!(result, Err(ExecutionError::Cancelled)));
        assert_eq!(driver.query_count(), 0);
    }

    #[test]
    fn test_invariant_violation_surfaces_as_error_not_fallback() {
        let driver = Arc::new(MockDriver::new());
        let bridge = ExecutorBridge::new(Arc::clone(&driver));

        let node = bgp_node(vec![Pattern::new(
            TermSlot::var("s"),
            TermSlot::concrete(Term::iri("http://ex/has`tick")),
            TermSlot::var("o"),
        )]);

        let result = bridge.execute(&node);
        assert!(matches!(result, Err(ExecutionError::CodecMismatch(_))));
    }
}
