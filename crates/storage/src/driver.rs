//! Graph Driver Port: the minimal capability the adapter needs from a
//! Cypher-speaking property-graph backend.
//!
//! Kept deliberately narrow so it can be satisfied by a real backend (the
//! `falkordb-backend` feature's [`crate::falkordb_driver::FalkorDbDriver`])
//! or by an in-memory [`crate::mock_driver::MockDriver`] that compiler and
//! write-buffer tests can script without a live database.

use crate::error::{DriverError, StorageResult};
use std::collections::BTreeMap;
use std::fmt;

/// A value bound to a query parameter, or returned in a result row.
///
/// Mirrors the scalar set the mapping model (C2) encodes literals into,
/// plus the two structural shapes a Cypher row can return: a node (with its
/// labels and properties) and an edge (with its relationship type and
/// properties).
#[derive(Debug, Clone, PartialEq)]
pub enum BackendValue {
    /// UTF-8 string scalar.
    String(String),
    /// Boolean scalar.
    Boolean(bool),
    /// 64-bit signed integer scalar.
    Integer(i64),
    /// 64-bit float scalar.
    Float(f64),
    /// Absence of a value (Cypher `null`).
    Null,
    /// A graph node: its labels and its properties.
    Node {
        /// Labels attached to the node (`Resource`, plus one per rdf:type).
        labels: Vec<String>,
        /// Property key/value pairs, including the reserved `uri` key.
        properties: BTreeMap<String, BackendValue>,
    },
    /// A graph relationship: its type and its properties.
    Edge {
        /// The relationship type (the mapped predicate).
        rel_type: String,
        /// Property key/value pairs on the edge, if any.
        properties: BTreeMap<String, BackendValue>,
    },
    /// An ordered list, used for the `$rows` array parameter the write
    /// buffer (C5) passes to an `UNWIND $rows AS row` statement. The
    /// Node/Edge/Scalar set has no array shape of its own; this is the
    /// minimal addition needed to carry a bulk-write row batch as a single
    /// parameter rather than as hundreds of individually-named parameters.
    List(Vec<BackendValue>),
    /// A string-keyed map, used for one `row` record inside a `$rows` list
    /// (e.g. `{s: "...", o: "..."}` for an edge-batch row).
    Map(BTreeMap<String, BackendValue>),
}

impl BackendValue {
    /// Borrow this value as a string, if it is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            BackendValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Borrow the node's properties, if this value is a node.
    pub fn node_properties(&self) -> Option<&BTreeMap<String, BackendValue>> {
        match self {
            BackendValue::Node { properties, .. } => Some(properties),
            _ => None,
        }
    }

    /// Borrow the node's labels, if this value is a node.
    pub fn node_labels(&self) -> Option<&[String]> {
        match self {
            BackendValue::Node { labels, .. } => Some(labels.as_slice()),
            _ => None,
        }
    }
}

/// One row of a query result: an ordered list of columns, each holding the
/// column name it was bound to and the returned value.
#[derive(Debug, Clone, Default)]
pub struct Row {
    columns: Vec<(String, BackendValue)>,
}

impl Row {
    /// Build a row from column name/value pairs, in column order.
    pub fn new(columns: Vec<(String, BackendValue)>) -> Self {
        Row { columns }
    }

    /// Look up a column by the name it was bound to in the `RETURN` clause.
    pub fn get(&self, column: &str) -> Option<&BackendValue> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Column values in positional order, as issued by `RETURN`. Used by the
    /// escape hatch (C9), which binds by position rather than by name.
    pub fn positional(&self) -> impl Iterator<Item = &BackendValue> {
        self.columns.iter().map(|(_, value)| value)
    }

    /// Column names, in `RETURN` order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }
}

/// A fully materialized batch of result rows.
///
/// This is eager, not a streaming cursor: both concrete drivers
/// ([`crate::mock_driver::MockDriver`] and, behind its feature flag,
/// [`crate::falkordb_driver::FalkorDbDriver`]) collect every row before
/// `execute` returns. Cancellation (§5) is therefore only checked around the
/// single `execute` call, not between individual rows — a query that is
/// already running cannot be stopped partway through. SPEC_FULL.md §12
/// documents this as a deliberate simplification rather than a true
/// lazy-iterator `Driver` port.
pub type Rows = Vec<Row>;

/// The capability a property-graph backend must expose. Both the triple
/// store's direct path (C4) and the compiled-query executor (C8) issue
/// Cypher text and a parameter table through this trait; neither knows or
/// cares whether the implementation is a live FalkorDB connection or an
/// in-memory mock.
pub trait Driver: Send + Sync {
    /// Execute a Cypher query with bound parameters and return its result
    /// rows. Parameters are passed by name (`$p0`, `$p1`, ...) rather than
    /// interpolated into the query text.
    fn execute(
        &self,
        cypher: &str,
        parameters: &BTreeMap<String, BackendValue>,
    ) -> StorageResult<Rows>;

    /// Verify the backend is reachable and responsive.
    fn ping(&self) -> StorageResult<()>;

    /// Release any held connection resources. Implementations that own no
    /// persistent connection (e.g. [`crate::mock_driver::MockDriver`]) can
    /// no-op.
    fn close(&self) -> StorageResult<()> {
        Ok(())
    }
}

impl fmt::Debug for dyn Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dyn Driver")
    }
}

pub(crate) fn query_failed(message: impl Into<String>) -> DriverError {
    DriverError::QueryFailed(message.into())
}
