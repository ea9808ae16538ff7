//! SPARQL algebra to Cypher compiler.
//!
//! Covers the BGP Compiler (C6), the Algebra Compiler (C7: OPTIONAL/UNION/
//! FILTER/GROUP pushdown), the Executor Bridge (C8), the direct-Cypher
//! escape hatch (C9), and cooperative cancellation. The SPARQL parser and
//! query-engine host are out of scope — this crate consumes an already-built
//! [`algebra::Algebra`] tree and returns decoded variable bindings or a
//! fallback signal; it does not parse SPARQL text itself.

#![warn(missing_docs, rust_2018_idioms)]

pub mod algebra;
pub mod algebra_compiler;
pub mod bgp_compiler;
pub mod bindings;
pub mod cancellation;
pub mod compiled;
pub mod cypher_escape;
pub mod error;
pub mod executor;

pub use algebra::{
    AggregateBinding, AggregateFunction, Algebra, Bgp, CompareOp, Expression, TriplePattern,
};
pub use algebra_compiler::compile_algebra;
pub use bgp_compiler::compile_bgp;
pub use bindings::{decode_row, decode_rows, Binding, BindingSet, BoundTerm};
pub use cancellation::CancellationToken;
pub use compiled::{ColumnBinding, CompilationResult, CompileKind, ParamTable, ProjectedKind, VariableMapping};
pub use cypher_escape::{CypherColumnBinding, CypherEscapeHatch};
pub use error::{CompileError, ExecutionError};
pub use executor::{BridgeOutcome, ExecutorBridge};
