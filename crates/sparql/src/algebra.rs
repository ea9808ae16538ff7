//! The closed algebra operator tree the compiler recognizes.
//!
//! Grounded on this workspace's original `Algebra` enum (a 16-variant tree
//! covering the whole of SPARQL 1.1's operator set), narrowed to exactly
//! the subset this crate actually pushes down to Cypher: `Bgp`, `LeftJoin`
//! (OPTIONAL), `Union`, `Filter`, `Group`, and a terminal `Project`. No
//! `Minus`, `Service`, `Graph`, `Extend`, `OrderBy`, `Slice`, `Table`, or
//! `Path` variant is carried over — a host engine that needs those
//! evaluates them itself, since a sub-tree containing one of those operators
//! simply isn't attempted by this crate.
//!
//! Modeled as a tagged variant rather than an inheritance hierarchy: the set
//! of operators is closed, so a plain `enum` with a recursive compiler
//! function is the natural fit.

use rdf_model::Pattern;

/// One triple pattern inside a [`Algebra::Bgp`].
pub type TriplePattern<'a> = Pattern<'a>;

/// A Basic Graph Pattern: a conjunction of triple patterns, joined by
/// shared variables.
pub type Bgp<'a> = Vec<TriplePattern<'a>>;

/// The algebra operator tree. Built bottom-up by the host engine (or, in
/// tests, by hand) and handed to the algebra compiler (C7) one node at a
/// time.
#[derive(Debug, Clone)]
pub enum Algebra<'a> {
    /// A Basic Graph Pattern (C6).
    Bgp(Bgp<'a>),
    /// `left OPTIONAL { right }`. `right` may itself be any algebra node,
    /// but the compiler only pushes down the case where both sides are
    /// BGPs.
    LeftJoin {
        /// The required side.
        left: Box<Algebra<'a>>,
        /// The optional side.
        right: Box<Algebra<'a>>,
    },
    /// `left UNION right`.
    Union {
        /// The left branch.
        left: Box<Algebra<'a>>,
        /// The right branch.
        right: Box<Algebra<'a>>,
    },
    /// `FILTER(expr)` applied to `input`.
    Filter {
        /// The filtered sub-tree.
        input: Box<Algebra<'a>>,
        /// The filter expression.
        expr: Expression<'a>,
    },
    /// `GROUP BY group_vars` with `aggregates` computed per group.
    Group {
        /// The grouped sub-tree. Must be a `Bgp` for pushdown (else the
        /// whole node falls back).
        input: Box<Algebra<'a>>,
        /// Non-aggregated columns of the result.
        group_vars: Vec<&'a str>,
        /// Aggregate expressions computed per group.
        aggregates: Vec<AggregateBinding<'a>>,
    },
    /// The terminal projection stage: restrict the result to exactly these
    /// variables, in this order.
    Project {
        /// The projected sub-tree.
        input: Box<Algebra<'a>>,
        /// Variables kept in the final result, in projection order.
        variables: Vec<&'a str>,
    },
}

impl<'a> Algebra<'a> {
    /// True if this node is a `Bgp` (used by the GROUP pushdown check,
    /// which requires a plain BGP beneath it).
    pub fn is_bgp(&self) -> bool {
        matches!(self, Algebra::Bgp(_))
    }
}

/// A FILTER expression, restricted to a translatable sub-grammar:
/// comparisons on (variable, literal) or (variable, variable), and
/// boolean combinations of those. Anything else (regex, `bound()`,
/// arithmetic, arbitrary SPARQL functions) has no representation here —
/// the host engine's own expression AST carries those, and the algebra
/// compiler's job is only to recognize when a host expression maps onto
/// this type; if it doesn't, the whole `Filter` node falls back, not just
/// the unrecognized sub-expression.
#[derive(Debug, Clone)]
pub enum Expression<'a> {
    /// A bound variable, resolved through the enclosing pattern's
    /// `VariableMapping`.
    Variable(&'a str),
    /// A numeric literal constant.
    Number(f64),
    /// A string literal constant.
    Str(&'a str),
    /// A boolean literal constant.
    Bool(bool),
    /// A binary comparison.
    Compare {
        /// The comparison operator.
        op: CompareOp,
        /// Left-hand operand.
        lhs: Box<Expression<'a>>,
        /// Right-hand operand.
        rhs: Box<Expression<'a>>,
    },
    /// `lhs && rhs`.
    And(Box<Expression<'a>>, Box<Expression<'a>>),
    /// `lhs || rhs`.
    Or(Box<Expression<'a>>, Box<Expression<'a>>),
    /// `!inner`.
    Not(Box<Expression<'a>>),
    /// A GeoSPARQL-style bounding-box test: `lat_var`
    /// and `lon_var` both fall within the given ranges. This is the one
    /// builtin recognized outside the plain comparison grammar; anything
    /// else GeoSPARQL-shaped is `Unsupported`.
    WithinBoundingBox {
        /// Variable holding the latitude value.
        lat_var: &'a str,
        /// Variable holding the longitude value.
        lon_var: &'a str,
        /// Inclusive minimum latitude.
        min_lat: f64,
        /// Inclusive maximum latitude.
        max_lat: f64,
        /// Inclusive minimum longitude.
        min_lon: f64,
        /// Inclusive maximum longitude.
        max_lon: f64,
    },
}

/// Comparison operators the FILTER sub-grammar recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `=`
    Eq,
    /// `!=` / `<>`
    Ne,
}

impl CompareOp {
    /// The Cypher infix operator text for this comparison.
    pub fn cypher_op(&self) -> &'static str {
        match self {
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
        }
    }
}

/// A single aggregate function, pushed down as a Cypher aggregation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunction {
    /// `COUNT(var)`.
    Count,
    /// `COUNT(DISTINCT var)`.
    CountDistinct,
    /// `COUNT(*)`.
    CountStar,
    /// `SUM(var)`.
    Sum,
    /// `AVG(var)`.
    Avg,
    /// `MIN(var)`.
    Min,
    /// `MAX(var)`.
    Max,
}

impl AggregateFunction {
    /// The Cypher aggregation function name, not including its argument.
    pub fn cypher_fn(&self) -> &'static str {
        match self {
            AggregateFunction::Count | AggregateFunction::CountDistinct => "count",
            AggregateFunction::CountStar => "count",
            AggregateFunction::Sum => "sum",
            AggregateFunction::Avg => "avg",
            AggregateFunction::Min => "min",
            AggregateFunction::Max => "max",
        }
    }

    /// True if this aggregate wraps its argument in `DISTINCT`.
    pub fn is_distinct(&self) -> bool {
        matches!(self, AggregateFunction::CountDistinct)
    }
}

/// One `(AGG(?var) AS ?out)` binding inside a GROUP node.
#[derive(Debug, Clone)]
pub struct AggregateBinding<'a> {
    /// Which aggregate function to apply.
    pub function: AggregateFunction,
    /// The variable being aggregated. `None` only for `CountStar`.
    pub variable: Option<&'a str>,
    /// The SPARQL variable the aggregate result binds to.
    pub output_var: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdf_model::{Term, TermSlot};

    #[test]
    fn test_bgp_node_reports_is_bgp() {
        let node = Algebra::Bgp(vec![Pattern::new(
            TermSlot::var("s"),
            TermSlot::concrete(Term::iri("http://x/p")),
            TermSlot::var("o"),
        )]);
        assert!(node.is_bgp());
    }

    #[test]
    fn test_non_bgp_node_reports_not_bgp() {
        let inner = Algebra::Bgp(vec![]);
        let node = Algebra::Filter {
            input: Box::new(inner),
            expr: Expression::Bool(true),
        };
        assert!(!node.is_bgp());
    }

    #[test]
    fn test_compare_op_cypher_text() {
        assert_eq!(CompareOp::Ne.cypher_op(), "<>");
        assert_eq!(CompareOp::Ge.cypher_op(), ">=");
    }

    #[test]
    fn test_aggregate_function_cypher_fn_and_distinct() {
        assert_eq!(AggregateFunction::Sum.cypher_fn(), "sum");
        assert!(AggregateFunction::CountDistinct.is_distinct());
        assert!(!AggregateFunction::Count.is_distinct());
    }
}
