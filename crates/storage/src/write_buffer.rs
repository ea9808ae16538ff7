//! Write Buffer / Transaction (C5): buffers `add`/`delete` calls made
//! during an open write transaction and flushes them on commit as one
//! UNWIND-parameterized Cypher statement per non-empty batch, chunked at
//! [`MAX_BATCH_ROWS`] rows.
//!
//! Grounded on this workspace's `transaction::InMemoryTransaction` buffering
//! idea, restructured around six typed batch kinds (type/property/edge adds
//! and deletes) instead of raw key/value puts.

use crate::codec::{self};
use crate::driver::{BackendValue, Driver};
use crate::error::{StorageError, StorageResult};
use crate::mapping::{self, RESOURCE_LABEL, URI_PROPERTY};
use crate::observability::{track_operation, NullSink, ObservabilitySink, OperationType};
use rdf_model::{Term, Triple, Vocabulary};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Maximum number of rows carried by a single flushed UNWIND statement.
/// Larger batches are split into chunks of this size.
pub const MAX_BATCH_ROWS: usize = 1000;

/// The lifecycle state of a [`WriteTransaction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TxState {
    Idle,
    Write,
}

#[derive(Default)]
struct Batches {
    add_type: Vec<(String, String)>,
    add_property: BTreeMap<String, Vec<(String, BackendValue, Option<(String, BackendValue)>)>>,
    add_edge: BTreeMap<String, Vec<(String, String)>>,
    del_type: Vec<(String, String)>,
    del_property: BTreeMap<String, Vec<String>>,
    del_edge: BTreeMap<String, Vec<(String, String)>>,
}

impl Batches {
    fn is_empty(&self) -> bool {
        self.add_type.is_empty()
            && self.add_property.is_empty()
            && self.add_edge.is_empty()
            && self.del_type.is_empty()
            && self.del_property.is_empty()
            && self.del_edge.is_empty()
    }
}

/// How individual statements flushed within one commit are guaranteed to
/// relate to each other. its "MUST document which guarantee it
/// provides" requirement, surfaced as a type rather than left to prose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitAtomicity {
    /// Every batch in the commit executes inside one backend transaction;
    /// if any statement fails, none of the commit's effects are visible.
    WholeCommit,
    /// Each flushed batch is atomic on its own, but the set of batches in
    /// one commit is not: a failure partway through a commit can leave
    /// some batches applied and later ones not.
    PerBatch,
}

/// Single-writer write buffer over a [`Driver`]. `begin`/`commit`/`abort`
/// drive the Idle -> Write -> Idle state machine; a second `begin` while
/// already in `Write` fails with [`StorageError::NestedTransactionUnsupported`].
///
/// This implementation provides [`CommitAtomicity::PerBatch`]: the
/// [`Driver`] port exposes a single parameterized `execute`, with no
/// multi-statement transaction primitive, so each flushed UNWIND is its own
/// backend statement. A driver that wraps `execute` in a backend
/// transaction of its own could upgrade this to `WholeCommit`, but the
/// default in-memory/FalkorDB drivers here do not.
///
/// **Read-your-writes (§4.5) while a transaction is open**: this type holds
/// no read path of its own — `add`/`delete` only append to `batches` in
/// memory, and nothing reaches the `Driver` until `commit` flushes it. A
/// [`crate::triple_store::TripleStore`] reading through the same `Driver`
/// while this transaction is open and uncommitted therefore sees only
/// pre-transaction backend state, never the buffered-but-unflushed rows —
/// there is no overlay of buffered state onto reads. This is the
/// "flush-then-read" half of §4.5's two conforming choices, achieved
/// implicitly (reads simply never observe anything the buffer holds until
/// the real flush at `commit`) rather than by an explicit eager-flush call
/// on every read.
pub struct WriteTransaction<D: Driver> {
    driver: Arc<D>,
    sink: Arc<dyn ObservabilitySink>,
    state: TxState,
    batches: Batches,
}

impl<D: Driver> WriteTransaction<D> {
    /// Build a write transaction over `driver`, starting in `Idle` state.
    pub fn new(driver: Arc<D>) -> Self {
        WriteTransaction {
            driver,
            sink: Arc::new(NullSink),
            state: TxState::Idle,
            batches: Batches::default(),
        }
    }

    /// Build a write transaction that reports commit/rollback events to
    /// `sink`.
    pub fn with_sink(driver: Arc<D>, sink: Arc<dyn ObservabilitySink>) -> Self {
        WriteTransaction {
            driver,
            sink,
            state: TxState::Idle,
            batches: Batches::default(),
        }
    }

    /// The atomicity guarantee this transaction's commit provides.
    pub fn atomicity(&self) -> CommitAtomicity {
        CommitAtomicity::PerBatch
    }

    /// True if a write transaction is currently open.
    pub fn is_active(&self) -> bool {
        self.state == TxState::Write
    }

    /// Enter `Write` state. Fails if already in `Write`.
    pub fn begin(&mut self) -> StorageResult<()> {
        if self.state == TxState::Write {
            return Err(StorageError::NestedTransactionUnsupported);
        }
        self.state = TxState::Write;
        self.batches = Batches::default();
        Ok(())
    }

    /// Buffer an `add` within the open transaction.
    pub fn add(&mut self, triple: &Triple<'_>) -> StorageResult<()> {
        self.require_write()?;
        let predicate_iri = triple.predicate_iri().ok_or_else(|| {
            StorageError::InvariantViolation("predicate must be an IRI".to_string())
        })?;

        if predicate_iri == Vocabulary::RDF_TYPE {
            let type_iri = triple.object.as_iri().map(|iri| iri.as_str()).ok_or_else(|| {
                StorageError::InvariantViolation("rdf:type object must be an IRI".to_string())
            })?;
            mapping::validate_type(type_iri)?;
            let subject_key = codec::encode_resource_key(&triple.subject)?;
            self.batches.add_type.push((subject_key, type_iri.to_string()));
            return Ok(());
        }

        mapping::validate_predicate(predicate_iri)?;
        match &triple.object {
            Term::Literal(literal) => {
                let property_key = mapping::property_key_for_predicate(predicate_iri);
                let encoded = codec::encode_literal(&property_key, literal);
                let subject_key = codec::encode_resource_key(&triple.subject)?;
                self.batches
                    .add_property
                    .entry(property_key)
                    .or_default()
                    .push((subject_key, encoded.primary, encoded.side_channel));
            }
            Term::Iri(_) | Term::BlankNode(_) => {
                let rel_type = mapping::property_key_for_predicate(predicate_iri);
                let subject_key = codec::encode_resource_key(&triple.subject)?;
                let object_key = codec::encode_resource_key(&triple.object)?;
                self.batches
                    .add_edge
                    .entry(rel_type)
                    .or_default()
                    .push((subject_key, object_key));
            }
        }
        Ok(())
    }

    /// Buffer a `delete` within the open transaction.
    pub fn delete(&mut self, triple: &Triple<'_>) -> StorageResult<()> {
        self.require_write()?;
        let predicate_iri = triple.predicate_iri().ok_or_else(|| {
            StorageError::InvariantViolation("predicate must be an IRI".to_string())
        })?;

        if predicate_iri == Vocabulary::RDF_TYPE {
            let type_iri = triple.object.as_iri().map(|iri| iri.as_str()).ok_or_else(|| {
                StorageError::InvariantViolation("rdf:type object must be an IRI".to_string())
            })?;
            let subject_key = codec::encode_resource_key(&triple.subject)?;
            self.batches.del_type.push((subject_key, type_iri.to_string()));
            return Ok(());
        }

        match &triple.object {
            Term::Literal(_) => {
                let property_key = mapping::property_key_for_predicate(predicate_iri);
                let subject_key = codec::encode_resource_key(&triple.subject)?;
                self.batches
                    .del_property
                    .entry(property_key)
                    .or_default()
                    .push(subject_key);
            }
            Term::Iri(_) | Term::BlankNode(_) => {
                let rel_type = mapping::property_key_for_predicate(predicate_iri);
                let subject_key = codec::encode_resource_key(&triple.subject)?;
                let object_key = codec::encode_resource_key(&triple.object)?;
                self.batches
                    .del_edge
                    .entry(rel_type)
                    .or_default()
                    .push((subject_key, object_key));
            }
        }
        Ok(())
    }

    /// Flush every non-empty batch as one chunked UNWIND statement per
    /// batch kind, then return to `Idle`. Adds are flushed before deletes,
    /// per its recommendation (preserves intent of "replace" sequences).
    pub fn commit(&mut self) -> StorageResult<()> {
        self.require_write()?;
        track_operation(self.sink.as_ref(), OperationType::TransactionCommit, || {
            self.flush_all()
        })?;
        self.state = TxState::Idle;
        self.batches = Batches::default();
        Ok(())
    }

    /// Discard every buffered row without flushing, then return to `Idle`.
    pub fn abort(&mut self) -> StorageResult<()> {
        self.require_write()?;
        track_operation(self.sink.as_ref(), OperationType::TransactionRollback, || {
            Ok::<(), StorageError>(())
        })?;
        self.state = TxState::Idle;
        self.batches = Batches::default();
        Ok(())
    }

    fn require_write(&self) -> StorageResult<()> {
        if self.state != TxState::Write {
            return Err(StorageError::InvariantViolation(
                "no write transaction is open".to_string(),
            ));
        }
        Ok(())
    }

    fn flush_all(&self) -> StorageResult<()> {
        if !self.batches.add_type.is_empty() {
            self.flush_type_batch(&self.batches.add_type, true)?;
        }
        for (predicate, rows) in &self.batches.add_property {
            self.flush_property_add_batch(predicate, rows)?;
        }
        for (predicate, rows) in &self.batches.add_edge {
            self.flush_edge_batch(predicate, rows, true)?;
        }
        if !self.batches.del_type.is_empty() {
            self.flush_type_batch(&self.batches.del_type, false)?;
        }
        for (predicate, rows) in &self.batches.del_property {
            self.flush_property_delete_batch(predicate, rows)?;
        }
        for (predicate, rows) in &self.batches.del_edge {
            self.flush_edge_batch(predicate, rows, false)?;
        }
        Ok(())
    }

    fn flush_type_batch(&self, rows: &[(String, String)], is_add: bool) -> StorageResult<()> {
        for chunk in rows.chunks(MAX_BATCH_ROWS) {
            // Rows in one type-label UNWIND must share a label, since Cypher
            // can't parameterize a label name; sub-group by type within the
            // chunk.
            let mut by_type: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
            for (subject, type_iri) in chunk {
                by_type.entry(type_iri.as_str()).or_default().push(subject.as_str());
            }
            for (type_iri, subjects) in by_type {
                mapping::validate_type(type_iri)?;
                let label = mapping::label_for_type(type_iri);
                let verb = if is_add { "SET" } else { "REMOVE" };
                let cypher = format!(
                    "UNWIND $rows AS row \
                     MERGE (s:{RESOURCE_LABEL} {{{URI_PROPERTY}: row.s}}) \
                     {verb} s:`{label}`"
                );
                let rows_param: Vec<BackendValue> = subjects
                    .iter()
                    .map(|s| row_map(vec![("s", BackendValue::String(s.to_string()))]))
                    .collect();
                self.execute_with_rows(&cypher, rows_param)?;
            }
        }
        Ok(())
    }

    fn flush_property_add_batch(
        &self,
        predicate: &str,
        rows: &[(String, BackendValue, Option<(String, BackendValue)>)],
    ) -> StorageResult<()> {
        for chunk in rows.chunks(MAX_BATCH_ROWS) {
            let has_side_channel = chunk.iter().any(|(_, _, side)| side.is_some());
            let cypher = if has_side_channel {
                format!(
                    "UNWIND $rows AS row \
                     MERGE (s:{RESOURCE_LABEL} {{{URI_PROPERTY}: row.s}}) \
                     SET s.`{predicate}` = row.v, s += row.side"
                )
            } else {
                format!(
                    "UNWIND $rows AS row \
                     MERGE (s:{RESOURCE_LABEL} {{{URI_PROPERTY}: row.s}}) \
                     SET s.`{predicate}` = row.v"
                )
            };
            let rows_param: Vec<BackendValue> = chunk
                .iter()
                .map(|(subject, value, side)| {
                    let mut fields = vec![
                        ("s", BackendValue::String(subject.clone())),
                        ("v", value.clone()),
                    ];
                    if let Some((side_key, side_value)) = side {
                        let mut side_map = BTreeMap::new();
                        side_map.insert(side_key.clone(), side_value.clone());
                        fields.push(("side", BackendValue::Map(side_map)));
                    } else if has_side_channel {
                        fields.push(("side", BackendValue::Map(BTreeMap::new())));
                    }
                    row_map(fields)
                })
                .collect();
            self.execute_with_rows(&cypher, rows_param)?;
        }
        Ok(())
    }

    fn flush_property_delete_batch(&self, predicate: &str, subjects: &[String]) -> StorageResult<()> {
        for chunk in subjects.chunks(MAX_BATCH_ROWS) {
            let cypher = format!(
                "UNWIND $rows AS row \
                 MATCH (s:{RESOURCE_LABEL} {{{URI_PROPERTY}: row.s}}) \
                 REMOVE s.`{predicate}`, s.`{predicate}{dt}`, s.`{predicate}{lang}`",
                dt = codec::DATATYPE_SUFFIX,
                lang = codec::LANGUAGE_SUFFIX,
            );
            let rows_param: Vec<BackendValue> = chunk
                .iter()
                .map(|s| row_map(vec![("s", BackendValue::String(s.clone()))]))
                .collect();
            self.execute_with_rows(&cypher, rows_param)?;
        }
        Ok(())
    }

    fn flush_edge_batch(&self, predicate: &str, rows: &[(String, String)], is_add: bool) -> StorageResult<()> {
        for chunk in rows.chunks(MAX_BATCH_ROWS) {
            let cypher = if is_add {
                format!(
                    "UNWIND $rows AS row \
                     MERGE (s:{RESOURCE_LABEL} {{{URI_PROPERTY}: row.s}}) \
                     MERGE (o:{RESOURCE_LABEL} {{{URI_PROPERTY}: row.o}}) \
                     MERGE (s)-[:`{predicate}`]->(o)"
                )
            } else {
                format!(
                    "UNWIND $rows AS row \
                     MATCH (s:{RESOURCE_LABEL} {{{URI_PROPERTY}: row.s}})-[r:`{predicate}`]->\
                     (o:{RESOURCE_LABEL} {{{URI_PROPERTY}: row.o}}) DELETE r"
                )
            };
            let rows_param: Vec<BackendValue> = chunk
                .iter()
                .map(|(s, o)| {
                    row_map(vec![
                        ("s", BackendValue::String(s.clone())),
                        ("o", BackendValue::String(o.clone())),
                    ])
                })
                .collect();
            self.execute_with_rows(&cypher, rows_param)?;
        }
        Ok(())
    }

    /// Execute `cypher` with `$rows` bound to a [`BackendValue::List`] of
    /// [`BackendValue::Map`] row records, the shape `UNWIND $rows AS row`
    /// expects.
    fn execute_with_rows(&self, cypher: &str, rows: Vec<BackendValue>) -> StorageResult<()> {
        let mut params = BTreeMap::new();
        params.insert("rows".to_string(), BackendValue::List(rows));
        self.driver.execute(cypher, &params)?;
        Ok(())
    }
}

fn row_map(fields: Vec<(&str, BackendValue)>) -> BackendValue {
    let mut properties = BTreeMap::new();
    for (key, value) in fields {
        properties.insert(key.to_string(), value);
    }
    BackendValue::Map(properties)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_driver::MockDriver;
    use rdf_model::Term;

    fn txn() -> (Arc<MockDriver>, WriteTransaction<MockDriver>) {
        let driver = Arc::new(MockDriver::new());
        let txn = WriteTransaction::new(Arc::clone(&driver));
        (driver, txn)
    }

    #[test]
    fn test_begin_commit_roundtrip() {
        let (driver, mut txn) = txn();
        txn.begin().unwrap();
        assert!(txn.is_active());
        txn.add(&Triple::new(
            Term::iri("http://ex/alice"),
            Term::iri("http://ex/name"),
            Term::literal_str("Alice"),
        ))
        .unwrap();
        txn.commit().unwrap();
        assert!(!txn.is_active());
        assert_eq!(driver.query_count(), 1);
    }

    #[test]
    fn test_nested_begin_fails() {
        let (_driver, mut txn) = txn();
        txn.begin().unwrap();
        let err = txn.begin().unwrap_err();
        assert!(matches!(err, StorageError::NestedTransactionUnsupported));
    }

    #[test]
    fn test_abort_discards_buffer_without_flushing() {
        let (driver, mut txn) = txn();
        txn.begin().unwrap();
        txn.add(&Triple::new(
            Term::iri("http://ex/alice"),
            Term::iri(Vocabulary::RDF_TYPE),
            Term::iri("http://ex/Person"),
        ))
        .unwrap();
        txn.abort().unwrap();
        assert_eq!(driver.query_count(), 0);
        assert!(!txn.is_active());
    }

    #[test]
    fn test_edges_grouped_by_predicate_issue_one_statement_each() {
        let (driver, mut txn) = txn();
        txn.begin().unwrap();
        txn.add(&Triple::new(
            Term::iri("http://ex/a"),
            Term::iri("http://ex/knows"),
            Term::iri("http://ex/b"),
        ))
        .unwrap();
        txn.add(&Triple::new(
            Term::iri("http://ex/a"),
            Term::iri("http://ex/likes"),
            Term::iri("http://ex/c"),
        ))
        .unwrap();
        txn.commit().unwrap();
        assert_eq!(driver.query_count(), 2);
    }

    #[test]
    fn test_large_batch_chunks_at_max_rows() {
        let (driver, mut txn) = txn();
        txn.begin().unwrap();
        for i in 0..2500 {
            let subject = format!("http://ex/p{i}");
            txn.add(&Triple::new(
                Term::iri(&subject),
                Term::iri("http://ex/name"),
                Term::literal_str("x"),
            ))
            .unwrap();
        }
        txn.commit().unwrap();
        // One property predicate -> 2500 rows -> chunks of 1000, 1000, 500.
        assert_eq!(driver.query_count(), 3);
    }

    #[test]
    fn test_operation_outside_transaction_fails() {
        let (_driver, mut txn) = txn();
        let result = txn.add(&Triple::new(
            Term::iri("http://ex/a"),
            Term::iri("http://ex/p"),
            Term::literal_str("v"),
        ));
        assert!(result.is_err());
    }

    #[test]
    fn test_default_atomicity_is_per_batch() {
        let (_driver, txn) = txn();
        assert_eq!(txn.atomicity(), CommitAtomicity::PerBatch);
    }
}
