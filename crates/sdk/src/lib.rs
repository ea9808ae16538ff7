//! Ergonomic front door onto the RDF-over-property-graph adapter:
//! [`GraphConfig`] for connection settings, [`GraphAdapter`] for the
//! direct triple path, write transactions, pushed-down SPARQL, and the
//! direct-Cypher escape hatch.
//!
//! ## Quick start
//!
//! ```ignore
//! use sdk::{GraphAdapter, GraphConfig};
//! use rdf_model::{Term, Triple};
//!
//! # fn run() -> sdk::Result<()> {
//! let config = GraphConfig::new()
//!     .with_backend_host("localhost")
//!     .with_backend_port(6379)
//!     .with_graph_name("example");
//! let adapter = GraphAdapter::connect(&config)?; // requires the falkordb-backend feature
//!
//! let triple = Triple::new(
//!     Term::iri("http://example.org/alice"),
//!     Term::iri("http://xmlns.com/foaf/0.1/name"),
//!     Term::literal_str("Alice"),
//! );
//! adapter.add(&triple)?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod adapter;
mod config;
mod error;

pub use adapter::GraphAdapter;
pub use config::GraphConfig;
pub use error::{Error, Result};

pub use rdf_model::{Pattern, Term, Triple};
pub use sparql::{Algebra, BridgeOutcome};
pub use storage::Driver;

/// Crate version, as set in `Cargo.toml`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Commonly used re-exports.
pub mod prelude {
    pub use crate::{Error, GraphAdapter, GraphConfig, Result};
    pub use rdf_model::{Pattern, Term, TermSlot, Triple};
}
