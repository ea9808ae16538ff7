//! The ergonomic front door (spec §6): [`GraphAdapter`] wraps the direct
//! triple path (C4), the write transaction (C5), the SPARQL executor
//! bridge (C8), and the direct-Cypher escape hatch (C9) behind one handle
//! built from a [`crate::config::GraphConfig`] or an existing driver.

use std::sync::Arc;

use rdf_model::{Pattern, Triple};
use sparql::{
    Algebra, BindingSet, BridgeOutcome, CypherColumnBinding, CypherEscapeHatch, ExecutorBridge,
};
use storage::{BackendValue, Driver, StoredTriple, TripleStore, WriteTransaction};

use crate::config::GraphConfig;
use crate::error::{Error, Result};

/// A handle onto one graph, combining the direct triple path, the
/// pushed-down SPARQL executor, and the raw-Cypher escape hatch.
///
/// Cheap to clone: everything it wraps is either `Arc`-backed or
/// constructed fresh per call.
pub struct GraphAdapter<D: Driver> {
    driver: Arc<D>,
    store: TripleStore<D>,
    bridge: ExecutorBridge<D>,
    escape_hatch: CypherEscapeHatch<D>,
}

impl<D: Driver> GraphAdapter<D> {
    /// Build an adapter directly over an existing driver, bypassing
    /// [`GraphConfig`] entirely. Used by tests (a [`storage::MockDriver`])
    /// and by hosts that already own a shared driver connection.
    pub fn with_driver(driver: Arc<D>) -> Self {
        GraphAdapter {
            driver: Arc::clone(&driver),
            store: TripleStore::new(Arc::clone(&driver)),
            bridge: ExecutorBridge::new(Arc::clone(&driver)),
            escape_hatch: CypherEscapeHatch::new(driver),
        }
    }

    /// Add a triple via the direct path (C4), not inside a transaction.
    pub fn add(&self, triple: &Triple<'_>) -> Result<()> {
        self.store.add(triple).map_err(Error::from)
    }

    /// Delete a triple via the direct path (C4).
    pub fn delete(&self, triple: &Triple<'_>) -> Result<()> {
        self.store.delete(triple).map_err(Error::from)
    }

    /// Find every stored triple matching `pattern`.
    pub fn find(&self, pattern: &Pattern<'_>) -> Result<Vec<StoredTriple>> {
        self.store.find(pattern).map_err(Error::from)
    }

    /// Remove every triple in the graph.
    pub fn clear(&self) -> Result<()> {
        self.store.clear().map_err(Error::from)
    }

    /// Number of triples currently stored.
    pub fn size(&self) -> Result<u64> {
        self.store.size().map_err(Error::from)
    }

    /// Whether the graph holds no triples.
    pub fn is_empty(&self) -> Result<bool> {
        self.store.is_empty().map_err(Error::from)
    }

    /// Open a new write transaction (C5) over the same driver. The
    /// transaction owns its own write buffer; call `begin` on it before
    /// adding or deleting triples.
    pub fn transaction(&self) -> WriteTransaction<D> {
        WriteTransaction::new(Arc::clone(&self.driver))
    }

    /// Attempt to push one algebra node (C6/C7) down to Cypher and execute
    /// it (C8). A host evaluating a larger query tree calls this once per
    /// pushable subtree and falls back to its own evaluator on
    /// [`BridgeOutcome::Fallback`].
    pub fn query(&self, node: &Algebra<'_>) -> Result<BridgeOutcome> {
        self.bridge.execute(node).map_err(Error::from)
    }

    /// Run caller-supplied Cypher verbatim and bind its result columns
    /// positionally (C9, §4.9). No sanitization is performed — the caller
    /// is responsible for the safety of the Cypher and parameters given.
    pub fn run_cypher(
        &self,
        cypher: &str,
        parameters: &std::collections::BTreeMap<String, BackendValue>,
        bindings: &[CypherColumnBinding],
    ) -> Result<BindingSet> {
        self.escape_hatch
            .execute(cypher, parameters, bindings)
            .map_err(Error::from)
    }
}

#[cfg(feature = "falkordb-backend")]
impl GraphAdapter<storage::FalkorDbDriver> {
    /// Connect to FalkorDB using `config` and build an adapter over it.
    pub fn connect(config: &GraphConfig) -> Result<Self> {
        let driver = config.connect()?;
        Ok(GraphAdapter::with_driver(driver))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdf_model::{Term, TermSlot};
    use storage::MockDriver;

    fn adapter() -> GraphAdapter<MockDriver> {
        GraphAdapter::with_driver(Arc::new(MockDriver::new()))
    }

    #[test]
    fn test_add_then_find_round_trips_through_the_direct_path() {
        let adapter = adapter();
        adapter.driver.push_response(vec![]);
        let triple = Triple::new(
            Term::iri("http://example.org/alice"),
            Term::iri("http://xmlns.com/foaf/0.1/name"),
            Term::literal_str("Alice"),
        );
        adapter.add(&triple).unwrap();

        adapter.driver.push_response(vec![]);
        let pattern = Pattern::new(
            TermSlot::concrete(Term::iri("http://example.org/alice")),
            TermSlot::var("p"),
            TermSlot::var("o"),
        );
        let results = adapter.find(&pattern).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_transaction_starts_inactive_until_begun() {
        let adapter = adapter();
        let mut txn = adapter.transaction();
        assert!(!txn.is_active());
        txn.begin().unwrap();
        assert!(txn.is_active());
    }

    #[test]
    fn test_query_pushes_a_bgp_down_through_the_bridge() {
        let adapter = adapter();
        adapter.driver.push_response(vec![]);
        let pattern = Pattern::new(
            TermSlot::var("s"),
            TermSlot::concrete(Term::iri(rdf_model::Vocabulary::RDF_TYPE)),
            TermSlot::concrete(Term::iri("http://example.org/Person")),
        );
        let node = Algebra::Bgp(vec![pattern]);
        match adapter.query(&node).unwrap() {
            BridgeOutcome::Pushed(bindings) => assert!(bindings.is_empty()),
            BridgeOutcome::Fallback { reason, .. } => panic!("expected pushdown, got fallback: {reason}"),
        }
    }
}
