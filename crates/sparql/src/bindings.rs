//! Decodes storage result rows into host-facing SPARQL variable bindings —
//! the executor bridge's (C8) row-to-term step.
//!
//! Grounded on this workspace's original `Binding`/`BindingSet` solution
//! sequence type (its merge/compatible/project operations), rebuilt against
//! terms decoded from a [`storage::Row`] rather than borrowed
//! `rdf_model::Term`s: a result row outlives the query text that produced
//! it, and a dynamic (UNION-discriminated) column's shape is only known
//! once the row is in hand, so every term here is owned rather than
//! borrowed into the algebra tree's lifetime.

use crate::compiled::{ColumnBinding, ProjectedKind, VariableMapping};
use crate::error::ExecutionError;
use std::collections::BTreeMap;
use storage::{decode_literal, decode_resource_key, BackendValue, Row};

/// An RDF term decoded from a result row, owning its own data.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundTerm {
    /// An IRI resource.
    Iri(String),
    /// A blank node, identified by its numeric id.
    BlankNode(u64),
    /// A literal: lexical form plus an optional language tag or datatype
    /// IRI (mutually exclusive, per RDF 1.1).
    Literal {
        /// The literal's lexical form.
        lexical_form: String,
        /// Language tag, if any.
        language: Option<String>,
        /// Datatype IRI, if any.
        datatype: Option<String>,
    },
}

impl BoundTerm {
    /// Build an IRI term.
    pub fn iri(value: impl Into<String>) -> Self {
        BoundTerm::Iri(value.into())
    }

    /// True for `Iri`/`BlankNode`, false for `Literal`.
    pub fn is_resource(&self) -> bool {
        matches!(self, BoundTerm::Iri(_) | BoundTerm::BlankNode(_))
    }
}

impl From<storage::DecodedResource> for BoundTerm {
    fn from(resource: storage::DecodedResource) -> Self {
        match resource {
            storage::DecodedResource::Iri(iri) => BoundTerm::Iri(iri),
            storage::DecodedResource::BlankNode(id) => BoundTerm::BlankNode(id),
        }
    }
}

impl From<storage::DecodedLiteral> for BoundTerm {
    fn from(literal: storage::DecodedLiteral) -> Self {
        BoundTerm::Literal {
            lexical_form: literal.lexical_form,
            language: literal.language,
            datatype: literal.datatype,
        }
    }
}

/// One solution: a partial function from SPARQL variable name to bound
/// term. A variable absent from the map is unbound in this solution — a
/// `NULL` result column (an OPTIONAL's non-matching rows) decodes to
/// "absent", never to a present-but-empty marker.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Binding {
    values: BTreeMap<String, BoundTerm>,
}

impl Binding {
    /// An empty binding (no variables bound).
    pub fn new() -> Self {
        Binding {
            values: BTreeMap::new(),
        }
    }

    /// Bind `variable` to `term`, replacing any prior binding.
    pub fn bind(&mut self, variable: impl Into<String>, term: BoundTerm) {
        self.values.insert(variable.into(), term);
    }

    /// The term bound to `variable`, if any.
    pub fn get(&self, variable: &str) -> Option<&BoundTerm> {
        self.values.get(variable)
    }

    /// True if `variable` is bound in this solution.
    pub fn is_bound(&self, variable: &str) -> bool {
        self.values.contains_key(variable)
    }

    /// Every bound variable name.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Number of bound variables.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if no variable is bound.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Two bindings are compatible when every variable they share resolves
    /// to the same term — the join condition the host fallback needs when
    /// it combines a compiled sub-result with its own evaluation of a
    /// sibling operator.
    pub fn is_compatible_with(&self, other: &Binding) -> bool {
        self.values.iter().all(|(var, term)| match other.values.get(var) {
            Some(other_term) => other_term == term,
            None => true,
        })
    }

    /// Merge `other`'s bindings into a fresh copy of `self`. Callers should
    /// check [`Binding::is_compatible_with`] first; this does not itself
    /// verify compatibility.
    pub fn merged_with(&self, other: &Binding) -> Binding {
        let mut merged = self.clone();
        for (var, term) in &other.values {
            merged.values.insert(var.clone(), term.clone());
        }
        merged
    }

    /// Restrict to exactly `variables`, dropping everything else — the
    /// terminal `Project` node.
    pub fn project(&self, variables: &[&str]) -> Binding {
        let mut projected = Binding::new();
        for var in variables {
            if let Some(term) = self.values.get(*var) {
                projected.values.insert((*var).to_string(), term.clone());
            }
        }
        projected
    }
}

/// An ordered sequence of solutions: the result of executing one algebra
/// node, whether pushed down to Cypher or produced by the host's fallback
/// evaluator.
pub type BindingSet = Vec<Binding>;

/// Decode every variable a [`VariableMapping`] projects out of `row` into a
/// [`Binding`]. A column holding Cypher `null` leaves its variable unbound
/// rather than erroring.
pub fn decode_row(row: &Row, mapping: &VariableMapping<'_>) -> Result<Binding, ExecutionError> {
    let mut binding = Binding::new();
    for (variable, column) in mapping.entries() {
        if let Some(term) = decode_column(row, variable, column)? {
            binding.bind(variable, term);
        }
    }
    Ok(binding)
}

/// Decode every row in `rows` through [`decode_row`], in order.
pub fn decode_rows(rows: &[Row], mapping: &VariableMapping<'_>) -> Result<BindingSet, ExecutionError> {
    rows.iter().map(|row| decode_row(row, mapping)).collect()
}

fn decode_column(
    row: &Row,
    variable: &str,
    column: &ColumnBinding,
) -> Result<Option<BoundTerm>, ExecutionError> {
    match &column.kind {
        ProjectedKind::ResourceUri => decode_resource_column(row, &column.alias),
        ProjectedKind::TypeIri | ProjectedKind::PredicateIri => decode_iri_string_column(row, &column.alias),
        ProjectedKind::Literal { .. } => decode_literal_column(row, &column.alias),
        ProjectedKind::Dynamic { kind_column } => decode_dynamic_column(row, variable, &column.alias, kind_column),
    }
}

fn decode_resource_column(row: &Row, alias: &str) -> Result<Option<BoundTerm>, ExecutionError> {
    match row.get(alias) {
        None | Some(BackendValue::Null) => Ok(None),
        Some(BackendValue::String(uri)) => Ok(Some(
            decode_resource_key(uri)
                .map_err(|e| ExecutionError::CodecMismatch(e.to_string()))?
                .into(),
        )),
        Some(other) => Err(ExecutionError::CodecMismatch(format!(
            "column '{alias}' expected a resource uri string, got {other:?}"
        ))),
    }
}

fn decode_iri_string_column(row: &Row, alias: &str) -> Result<Option<BoundTerm>, ExecutionError> {
    match row.get(alias) {
        None | Some(BackendValue::Null) => Ok(None),
        Some(BackendValue::String(iri)) => Ok(Some(BoundTerm::iri(iri.clone()))),
        Some(other) => Err(ExecutionError::CodecMismatch(format!(
            "column '{alias}' expected an iri string, got {other:?}"
        ))),
    }
}

fn decode_literal_column(row: &Row, alias: &str) -> Result<Option<BoundTerm>, ExecutionError> {
    let Some(primary) = row.get(alias) else {
        return Ok(None);
    };
    if matches!(primary, BackendValue::Null) {
        return Ok(None);
    }

    let mut properties = BTreeMap::new();
    properties.insert(alias.to_string(), primary.clone());
    if let Some(dt) = row.get(&format!("{alias}__dt")) {
        if !matches!(dt, BackendValue::Null) {
            properties.insert(format!("{alias}__dt"), dt.clone());
        }
    }
    if let Some(lang) = row.get(&format!("{alias}__lang")) {
        if !matches!(lang, BackendValue::Null) {
            properties.insert(format!("{alias}__lang"), lang.clone());
        }
    }

    let decoded = decode_literal(alias, &properties).map_err(|e| ExecutionError::CodecMismatch(e.to_string()))?;
    Ok(Some(decoded.into()))
}

/// Decode a column whose shape (resource, literal, or type/predicate IRI)
/// varies per row, per the sibling `kind_column`'s tag — produced by either
/// a two-way or a three-way `UNION ALL`.
///
/// The two union shapes use different tag vocabularies: the ambiguous
/// variable-object union tags `"literal"`/`"resource"`; the
/// variable-predicate union tags `"type"`/`"property"`/`"edge"`.
/// Handled uniformly here since both resolve to one of "read as resource"
/// or "read as literal" (`"type"` is a resource-typed IRI rather than a
/// `uri` column, so it decodes like [`decode_iri_string_column`]).
fn decode_dynamic_column(
    row: &Row,
    variable: &str,
    alias: &str,
    kind_column: &str,
) -> Result<Option<BoundTerm>, ExecutionError> {
    let tag = match row.get(kind_column) {
        None | Some(BackendValue::Null) => return Ok(None),
        Some(BackendValue::String(tag)) => tag.as_str(),
        Some(other) => {
            return Err(ExecutionError::CodecMismatch(format!(
                "kind column '{kind_column}' for variable '{variable}' held {other:?}, expected a string tag"
            )))
        }
    };

    match tag {
        "resource" | "edge" => decode_resource_column(row, alias),
        "type" => decode_iri_string_column(row, alias),
        "literal" | "property" => decode_literal_column(row, alias),
        other => Err(ExecutionError::CodecMismatch(format!(
            "unrecognized dynamic kind tag '{other}' for variable '{variable}'"
        ))),
    }
}
