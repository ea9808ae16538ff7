//! Storage layer of the RDF-over-property-graph adapter.
//!
//! Implements the Graph Driver Port (C3), the Mapping Model (C2), the
//! Term Codec (C1, operating on [`driver::BackendValue`]), the direct-path
//! Triple Store (C4), and the Write Buffer / Transaction (C5).
//!
//! # Architecture
//!
//! - [`driver::Driver`] is the minimal capability a Cypher-speaking
//!   property-graph backend must expose.
//! - [`mock_driver::MockDriver`] is an in-memory, query-recording driver
//!   used by compiler and write-buffer tests; no live backend required.
//! - [`falkordb_driver::FalkorDbDriver`] (behind the `falkordb-backend`
//!   feature) talks to a real FalkorDB instance over RESP.
//! - [`triple_store::TripleStore`] is the direct, non-transactional
//!   add/delete/find/clear/size path.
//! - [`write_buffer::WriteTransaction`] buffers adds/deletes inside an open
//!   transaction and flushes them as chunked UNWIND statements on commit.

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod codec;
mod driver;
mod error;
mod mapping;
mod mock_driver;
mod observability;
mod triple_store;
mod write_buffer;

#[cfg(feature = "falkordb-backend")]
mod falkordb_driver;

pub use codec::{
    decode_literal, decode_resource_key, encode_literal, encode_resource_key, DecodedLiteral,
    DecodedResource, EncodedLiteral, DATATYPE_SUFFIX, LANGUAGE_SUFFIX,
};
pub use driver::{BackendValue, Driver, Row, Rows};
pub use error::{DriverError, StorageError, StorageResult};
pub use mapping::{
    label_for_type, property_key_for_predicate, validate_predicate, validate_type,
    RESOURCE_LABEL, URI_PROPERTY,
};
pub use mock_driver::{MockDriver, RecordedQuery};
pub use observability::{
    track_operation, NullSink, ObservabilitySink, OperationEvent, OperationType, TracingSink,
    CYPHER_TRUNCATION_LIMIT,
};
pub use triple_store::{StoredObject, StoredTriple, TripleStore};
pub use write_buffer::{CommitAtomicity, WriteTransaction, MAX_BATCH_ROWS};

#[cfg(feature = "falkordb-backend")]
pub use falkordb_driver::FalkorDbDriver;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_module_compiles() {
        let driver = Arc::new(MockDriver::new());
        let _store = TripleStore::new(Arc::clone(&driver));
        let _txn = WriteTransaction::new(driver);
    }
}
