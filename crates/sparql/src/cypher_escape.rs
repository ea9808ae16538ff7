//! Direct-Cypher Escape Hatch (C9): the `falkor:cypher` predicate-function
//! extension. Runs caller-supplied Cypher verbatim and binds the first `n`
//! result columns, positionally, to `n` caller-chosen SPARQL variables.
//!
//! No fallback is attempted on failure — unlike the compiler's
//! [`crate::error::CompileError::Unsupported`], a failure here is the
//! caller's raw Cypher failing against the backend, which the host has no
//! more-standard evaluator to fall back to. Security is explicitly the
//! caller's responsibility (§4.9): this module does not attempt to sanitize
//! or validate the Cypher text in any way.

use crate::bindings::{Binding, BindingSet, BoundTerm};
use crate::error::ExecutionError;
use std::collections::BTreeMap;
use std::sync::Arc;
use storage::{track_operation, BackendValue, Driver, NullSink, ObservabilitySink, OperationType, Row};

/// One binding of a caller-chosen SPARQL variable to the position (0-based)
/// of the Cypher column it reads from.
#[derive(Debug, Clone)]
pub struct CypherColumnBinding {
    /// The SPARQL variable name, chosen by the caller — need not match any
    /// Cypher column alias.
    pub variable: String,
    /// 0-based position of the Cypher `RETURN` column this variable reads.
    pub column_index: usize,
}

/// Runs raw Cypher through a [`Driver`] and binds its columns positionally.
pub struct CypherEscapeHatch<D: Driver> {
    driver: Arc<D>,
    sink: Arc<dyn ObservabilitySink>,
}

impl<D: Driver> CypherEscapeHatch<D> {
    /// Build an escape hatch over `driver` with no observability sink.
    pub fn new(driver: Arc<D>) -> Self {
        CypherEscapeHatch {
            driver,
            sink: Arc::new(NullSink),
        }
    }

    /// Build an escape hatch reporting every invocation to `sink`.
    pub fn with_sink(driver: Arc<D>, sink: Arc<dyn ObservabilitySink>) -> Self {
        CypherEscapeHatch { driver, sink }
    }

    /// Execute `cypher` verbatim with `parameters`, binding the first
    /// `bindings.len()` columns of each returned row positionally to the
    /// variables `bindings` names, in the order given.
    ///
    /// A row with fewer columns than `bindings` leaves the excess variables
    /// unbound in that row's [`Binding`], rather than erroring — the same
    /// "absent means unbound" rule the compiled path uses for NULL columns.
    pub fn execute(
        &self,
        cypher: &str,
        parameters: &BTreeMap<String, BackendValue>,
        bindings: &[CypherColumnBinding],
    ) -> Result<BindingSet, ExecutionError> {
        track_operation(self.sink.as_ref(), OperationType::EscapeHatchCypher, || {
            let rows = self
                .driver
                .execute(cypher, parameters)
                .map_err(|e| ExecutionError::DirectCypherFailed(e.to_string()))?;
            rows.iter().map(|row| decode_positional(row, bindings)).collect()
        })
    }
}

fn decode_positional(row: &Row, bindings: &[CypherColumnBinding]) -> Result<Binding, ExecutionError> {
    let columns: Vec<&BackendValue> = row.positional().collect();
    let mut binding = Binding::new();
    for column_binding in bindings {
        let Some(value) = columns.get(column_binding.column_index) else {
            continue;
        };
        if let Some(term) = decode_scalar(value)? {
            binding.bind(column_binding.variable.clone(), term);
        }
    }
    Ok(binding)
}

/// Decodes a raw Cypher scalar into a [`BoundTerm`]. Since the escape hatch
/// has no mapping-model context (no `ProjectedKind` — the caller's Cypher
/// could return anything), every value decodes to a plain, datatype-less
/// term: strings become an untyped literal (no `xsd:string` round-trip
/// through the mapping layer here), numbers and booleans likewise. A `uri`
/// or `Resource`-labeled node is not inferred — the caller gets back the
/// scalar a `RETURN` clause actually projects, not a reconstructed RDF term.
fn decode_scalar(value: &BackendValue) -> Result<Option<BoundTerm>, ExecutionError> {
    match value {
        BackendValue::Null => Ok(None),
        BackendValue::String(s) => Ok(Some(BoundTerm::Literal {
            lexical_form: s.clone(),
            language: None,
            datatype: None,
        })),
        BackendValue::Boolean(b) => Ok(Some(BoundTerm::Literal {
            lexical_form: b.to_string(),
            language: None,
            datatype: Some(rdf_model::Vocabulary::XSD_BOOLEAN.to_string()),
        })),
        BackendValue::Integer(i) => Ok(Some(BoundTerm::Literal {
            lexical_form: i.to_string(),
            language: None,
            datatype: Some(rdf_model::Vocabulary::XSD_INTEGER.to_string()),
        })),
        BackendValue::Float(f) => Ok(Some(BoundTerm::Literal {
            lexical_form: f.to_string(),
            language: None,
            datatype: Some(rdf_model::Vocabulary::XSD_DOUBLE.to_string()),
        })),
        other => Err(ExecutionError::CodecMismatch(format!(
            "direct-Cypher column held a non-scalar value this escape hatch cannot bind: {other:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::MockDriver;

    fn binding(variable: &str, column_index: usize) -> CypherColumnBinding {
        CypherColumnBinding {
            variable: variable.to_string(),
            column_index,
        }
    }

    #[test]
    fn test_positional_binding_ignores_cypher_column_aliases() {
        let driver = Arc::new(MockDriver::new());
        driver.push_response(vec![Row::new(vec![
            ("whatever_alias".to_string(), BackendValue::String("alice".to_string())),
            ("other_alias".to_string(), BackendValue::Integer(30)),
        ])]);
        let hatch = CypherEscapeHatch::new(Arc::clone(&driver));

        let results = hatch
            .execute(
                "MATCH (n) RETURN n.name AS whatever_alias, n.age AS other_alias",
                &BTreeMap::new(),
                &[binding("name", 0), binding("age", 1)],
            )
            .unwrap();

        assert_eq!(results.len(), 1);
        match results[0].get("name").unwrap() {
            BoundTerm::Literal { lexical_form, .. } => assert_eq!(lexical_form, "alice"),
            other => panic!("unexpected term: {other:?}"),
        }
        match results[0].get("age").unwrap() {
            BoundTerm::Literal { lexical_form, datatype, .. } => {
                assert_eq!(lexical_form, "30");
                assert_eq!(datatype.as_deref(), Some(rdf_model::Vocabulary::XSD_INTEGER));
            }
            other => panic!("unexpected term: {other:?}"),
        }
    }

    #[test]
    fn test_missing_column_leaves_variable_unbound() {
        let driver = Arc::new(MockDriver::new());
        driver.push_response(vec![Row::new(vec![(
            "a".to_string(),
            BackendValue::String("x".to_string()),
        )])]);
        let hatch = CypherEscapeHatch::new(Arc::clone(&driver));

        let results = hatch
            .execute("MATCH (n) RETURN n.a AS a", &BTreeMap::new(), &[binding("a", 0), binding("b", 1)])
            .unwrap();

        assert_eq!(results.len(), 1);
        assert!(results[0].is_bound("a"));
        assert!(!results[0].is_bound("b"));
    }

    #[test]
    fn test_backend_failure_surfaces_as_direct_cypher_failed() {
        struct FailingDriver;
        impl Driver for FailingDriver {
            fn execute(&self, _cypher: &str, _parameters: &BTreeMap<String, BackendValue>) -> storage::StorageResult<storage::Rows> {
                Err(storage::StorageError::Backend(storage::DriverError::QueryFailed(
                    "syntax error".to_string(),
                )))
            }
            fn ping(&self) -> storage::StorageResult<()> {
                Ok(())
            }
        }

        let hatch = CypherEscapeHatch::new(Arc::new(FailingDriver));
        let result = hatch.execute("INVALID CYPHER", &BTreeMap::new(), &[binding("x", 0)]);
        assert!(matches!(result, Err(ExecutionError::DirectCypherFailed(_))));
    }
}
