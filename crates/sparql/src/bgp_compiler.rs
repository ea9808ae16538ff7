//! BGP Compiler (C6): turns a Basic Graph Pattern into one `MATCH ...
//! RETURN ...` Cypher statement (or a small `UNION ALL` of a few such
//! statements, for the shapes data can't disambiguate at compile time).
//!
//! Grounded on `storage::triple_store`'s single-pattern `find_*` family,
//! with its mapping rules applied directly to Cypher text and generalized to
//! many joined patterns. The generalization this module adds over that
//! single-pattern code:
//!
//! - joining multiple triple patterns that share variables into one `MATCH`
//!   clause instead of one query per pattern (closed-chain compilation),
//! - resolving, once per BGP, whether a variable denotes a resource (it
//!   must, if it's ever used as a subject) so sibling patterns referencing
//!   the same node share one binder instead of re-matching it,
//! - at most one variable-object pattern per BGP is allowed to stay
//!   genuinely ambiguous between "literal property" and "resource edge";
//!   that one gets compiled as a two-branch `UNION ALL`. More than
//!   one such pattern is `Unsupported` — disambiguating N independent
//!   ambiguities would mean 2^N branches, which stops being a pushdown and
//!   starts being a query planner.
//!
//! Variable predicates and variable `rdf:type` objects are supported only
//! when they are the BGP's one and only triple pattern, matching
//! `storage::TripleStore::find`'s own scope; inside a multi-pattern join
//! both fall back to `Unsupported` for the same reason as above.

use crate::compiled::{CompilationResult, CompileKind, ParamTable, ProjectedKind, VariableMapping};
use crate::error::CompileError;
use rdf_model::{Literal, Pattern, Term, TermSlot, Vocabulary};
use rustc_hash::{FxHashMap, FxHashSet};
use storage::{
    encode_literal, encode_resource_key, label_for_type, property_key_for_predicate,
    validate_predicate, validate_type, BackendValue, DATATYPE_SUFFIX, LANGUAGE_SUFFIX,
    RESOURCE_LABEL, URI_PROPERTY,
};

/// Compile a Basic Graph Pattern.
pub fn compile_bgp<'a>(bgp: &[Pattern<'a>]) -> Result<CompilationResult<'a>, CompileError> {
    if bgp.is_empty() {
        return Ok(CompilationResult {
            cypher_text: "RETURN 1 AS _empty_bgp".to_string(),
            parameters: Default::default(),
            variable_mapping: VariableMapping::new(),
            kind: CompileKind::Bgp,
        });
    }

    for pattern in bgp {
        if let TermSlot::Concrete(term) = &pattern.predicate {
            if !term.is_iri() {
                return Err(CompileError::unsupported("non-iri-predicate"));
            }
        }
    }

    if bgp.len() == 1 {
        if let Some(result) = try_compile_single_pattern_special_case(&bgp[0])? {
            return Ok(result);
        }
    }

    compile_multi_pattern(bgp)
}

/// The two single-pattern shapes that need a dedicated query form: a
/// variable predicate (3-way union) and a variable `rdf:type` object
/// (`UNWIND labels`). Returns `None` when `pattern` is neither, so the
/// caller falls through to the generic multi-pattern path.
fn try_compile_single_pattern_special_case<'a>(
    pattern: &Pattern<'a>,
) -> Result<Option<CompilationResult<'a>>, CompileError> {
    match &pattern.predicate {
        TermSlot::Variable(pred_var) => {
            let object_var = match &pattern.object {
                TermSlot::Variable(v) => *v,
                TermSlot::Concrete(_) => {
                    return Err(CompileError::unsupported("variable-predicate-concrete-object"))
                }
            };
            Ok(Some(compile_variable_predicate(pattern, pred_var, object_var)?))
        }
        TermSlot::Concrete(Term::Iri(iri)) if iri.as_str() == Vocabulary::RDF_TYPE => {
            match &pattern.object {
                TermSlot::Variable(type_var) => {
                    Ok(Some(compile_variable_type(pattern, type_var)?))
                }
                TermSlot::Concrete(_) => Ok(None),
            }
        }
        TermSlot::Concrete(_) => Ok(None),
    }
}

pub(crate) fn subject_clause<'a>(
    subject: &TermSlot<'a>,
    binder: &str,
    params: &mut ParamTable,
) -> Result<String, CompileError> {
    match subject {
        TermSlot::Concrete(term) => {
            let key = encode_resource_key(term)
                .map_err(|e| CompileError::unsupported_detail("resource-key-encoding", e.to_string()))?;
            let placeholder = params.push(BackendValue::String(key));
            Ok(format!("({binder}:Resource {{uri: {placeholder}}})"))
        }
        TermSlot::Variable(_) => Ok(format!("({binder}:Resource)")),
    }
}

fn compile_variable_predicate<'a>(
    pattern: &Pattern<'a>,
    predicate_var: &'a str,
    object_var: &'a str,
) -> Result<CompilationResult<'a>, CompileError> {
    let subject_var = match &pattern.subject {
        TermSlot::Variable(v) => Some(*v),
        TermSlot::Concrete(_) => None,
    };

    let mut params = ParamTable::new();
    let node = subject_clause(&pattern.subject, "s", &mut params)?;

    let type_branch = format!(
        "MATCH {node} UNWIND labels(s) AS predKey WITH s, predKey WHERE predKey <> '{resource_label}' \
         RETURN s.uri AS s, '{rdf_type}' AS p, predKey AS o, 'type' AS o_kind",
        resource_label = RESOURCE_LABEL,
        rdf_type = Vocabulary::RDF_TYPE,
    );

    let property_branch = format!(
        "MATCH {node} UNWIND keys(s) AS predKey WITH s, predKey \
         WHERE predKey <> '{uri_property}' AND NOT predKey ENDS WITH '{dt_suffix}' AND NOT predKey ENDS WITH '{lang_suffix}' \
         RETURN s.uri AS s, predKey AS p, s[predKey] AS o, 'property' AS o_kind",
        uri_property = URI_PROPERTY,
        dt_suffix = DATATYPE_SUFFIX,
        lang_suffix = LANGUAGE_SUFFIX,
    );

    let edge_branch = format!(
        "MATCH {node}-[_r]->(o_node:Resource) \
         RETURN s.uri AS s, type(_r) AS p, o_node.uri AS o, 'edge' AS o_kind"
    );

    let cypher_text = format!("{type_branch}\nUNION ALL\n{property_branch}\nUNION ALL\n{edge_branch}");

    let mut mapping = VariableMapping::new();
    if let Some(sv) = subject_var {
        mapping = mapping.bind(sv, "s", ProjectedKind::ResourceUri);
    }
    mapping = mapping.bind(predicate_var, "p", ProjectedKind::PredicateIri);
    mapping = mapping.bind(
        object_var,
        "o",
        ProjectedKind::Dynamic {
            kind_column: "o_kind".to_string(),
        },
    );

    Ok(CompilationResult {
        cypher_text,
        parameters: params.into_map(),
        variable_mapping: mapping,
        kind: CompileKind::Bgp,
    })
}

fn compile_variable_type<'a>(
    pattern: &Pattern<'a>,
    type_var: &'a str,
) -> Result<CompilationResult<'a>, CompileError> {
    let subject_var = match &pattern.subject {
        TermSlot::Variable(v) => Some(*v),
        TermSlot::Concrete(_) => None,
    };

    let mut params = ParamTable::new();
    let node = subject_clause(&pattern.subject, "s", &mut params)?;

    let cypher_text = format!(
        "MATCH {node} UNWIND labels(s) AS typeLabel WITH s, typeLabel \
         WHERE typeLabel <> '{resource_label}' \
         RETURN s.uri AS s, typeLabel AS t",
        resource_label = RESOURCE_LABEL,
    );

    let mut mapping = VariableMapping::new();
    if let Some(sv) = subject_var {
        mapping = mapping.bind(sv, "s", ProjectedKind::ResourceUri);
    }
    mapping = mapping.bind(type_var, "t", ProjectedKind::TypeIri);

    Ok(CompilationResult {
        cypher_text,
        parameters: params.into_map(),
        variable_mapping: mapping,
        kind: CompileKind::Bgp,
    })
}

/// A triple pattern whose compiled shape has been fully resolved: no more
/// variable predicates, no more variable `rdf:type` objects, and its
/// variable object (if any) has been settled to either "literal" or
/// "resource" — the form [`render_resolved`] knows how to emit.
///
/// `pub(crate)` so the algebra compiler (C7) can resolve and render a
/// required and an optional BGP under one shared [`Binders`]/[`ParamTable`]
/// pair for OPTIONAL pushdown : a variable shared between the two
/// sides must land on the same Cypher binder in both.
#[derive(Debug, Clone)]
pub(crate) enum Resolved<'a> {
    Type {
        subject: &'a TermSlot<'a>,
        type_iri: &'a str,
    },
    LiteralGround {
        subject: &'a TermSlot<'a>,
        predicate_iri: &'a str,
        literal: Literal<'a>,
    },
    LiteralProject {
        subject: &'a TermSlot<'a>,
        predicate_iri: &'a str,
        object_var: &'a str,
    },
    Edge {
        subject: &'a TermSlot<'a>,
        predicate_iri: &'a str,
        object: &'a TermSlot<'a>,
    },
}

fn compile_multi_pattern<'a>(bgp: &[Pattern<'a>]) -> Result<CompilationResult<'a>, CompileError> {
    for pattern in bgp {
        if matches!(pattern.predicate, TermSlot::Variable(_)) {
            return Err(CompileError::unsupported("variable-predicate-in-multi-pattern-bgp"));
        }
        if let TermSlot::Concrete(Term::Iri(iri)) = &pattern.predicate {
            if iri.as_str() == Vocabulary::RDF_TYPE && matches!(pattern.object, TermSlot::Variable(_)) {
                return Err(CompileError::unsupported("variable-type-object-in-multi-pattern-bgp"));
            }
        }
    }

    let mut resource_vars: FxHashSet<&'a str> = FxHashSet::default();
    for pattern in bgp {
        if let TermSlot::Variable(v) = &pattern.subject {
            resource_vars.insert(v);
        }
    }

    let mut ambiguous_index: Option<usize> = None;
    for (i, pattern) in bgp.iter().enumerate() {
        let is_type = matches!(&pattern.predicate, TermSlot::Concrete(Term::Iri(iri)) if iri.as_str() == Vocabulary::RDF_TYPE);
        if is_type {
            continue;
        }
        if let TermSlot::Variable(object_var) = &pattern.object {
            if !resource_vars.contains(object_var) {
                if ambiguous_index.is_some() {
                    return Err(CompileError::unsupported("multiple-ambiguous-variable-objects"));
                }
                ambiguous_index = Some(i);
            }
        }
    }

    match ambiguous_index {
        None => {
            let resolved = resolve_all(bgp, &resource_vars)?;
            let mut params = ParamTable::new();
            let (cypher_text, mapping) = render_resolved(&resolved, &mut params, "")?;
            Ok(CompilationResult {
                cypher_text,
                parameters: params.into_map(),
                variable_mapping: mapping,
                kind: CompileKind::Bgp,
            })
        }
        Some(idx) => {
            let ambiguous_var = match &bgp[idx].object {
                TermSlot::Variable(v) => *v,
                TermSlot::Concrete(_) => unreachable!("ambiguous_index only set for variable objects"),
            };

            let resolved_literal = resolve_with_override(bgp, idx, &resource_vars, false)?;

            let mut edge_resource_vars = resource_vars.clone();
            edge_resource_vars.insert(ambiguous_var);
            let resolved_edge = resolve_with_override(bgp, idx, &edge_resource_vars, true)?;

            let mut params = ParamTable::new();
            let (literal_cypher, literal_mapping) = render_resolved(&resolved_literal, &mut params, "lit_")?;
            let (edge_cypher, edge_mapping) = render_resolved(&resolved_edge, &mut params, "edge_")?;

            let ambiguous_alias = literal_mapping
                .resolve(ambiguous_var)
                .map(|b| b.alias.clone())
                .unwrap_or_else(|| "o".to_string());

            let literal_cypher = format!(
                "{literal_cypher}, '{kind}' AS {alias}_kind",
                kind = "literal",
                alias = ambiguous_alias
            );
            let edge_alias = edge_mapping
                .resolve(ambiguous_var)
                .map(|b| b.alias.clone())
                .unwrap_or_else(|| "o".to_string());
            let edge_cypher = format!(
                "{edge_cypher}, '{kind}' AS {alias}_kind",
                kind = "resource",
                alias = edge_alias
            );

            let cypher_text = format!("{literal_cypher}\nUNION ALL\n{edge_cypher}");

            let mut mapping = VariableMapping::new();
            for (var, binding) in literal_mapping.entries() {
                if var == ambiguous_var {
                    continue;
                }
                mapping = mapping.bind(var, binding.alias.clone(), binding.kind.clone());
            }
            mapping = mapping.bind(
                ambiguous_var,
                ambiguous_alias.clone(),
                ProjectedKind::Dynamic {
                    kind_column: format!("{ambiguous_alias}_kind"),
                },
            );

            Ok(CompilationResult {
                cypher_text,
                parameters: params.into_map(),
                variable_mapping: mapping,
                kind: CompileKind::Bgp,
            })
        }
    }
}

/// Resolve every pattern in `bgp`, then pin the one at `ambiguous_idx` to
/// either its literal-projection or edge reading regardless of what
/// `resource_vars` would otherwise imply for it — that pattern is the one
/// the caller is building a union branch for, so its shape is a decision,
/// not an inference.
fn resolve_with_override<'a>(
    bgp: &'a [Pattern<'a>],
    ambiguous_idx: usize,
    resource_vars: &FxHashSet<&'a str>,
    as_edge: bool,
) -> Result<Vec<Resolved<'a>>, CompileError> {
    let mut resolved = resolve_all(bgp, resource_vars)?;
    let pattern = &bgp[ambiguous_idx];
    if let (TermSlot::Variable(var), TermSlot::Concrete(Term::Iri(pred))) = (&pattern.object, &pattern.predicate) {
        resolved[ambiguous_idx] = if as_edge {
            Resolved::Edge {
                subject: &pattern.subject,
                predicate_iri: pred.as_str(),
                object: &pattern.object,
            }
        } else {
            Resolved::LiteralProject {
                subject: &pattern.subject,
                predicate_iri: pred.as_str(),
                object_var: var,
            }
        };
    }
    Ok(resolved)
}

pub(crate) fn resolve_all<'a>(
    bgp: &'a [Pattern<'a>],
    resource_vars: &FxHashSet<&'a str>,
) -> Result<Vec<Resolved<'a>>, CompileError> {
    bgp.iter().map(|pattern| resolve_one(pattern, resource_vars)).collect()
}

pub(crate) fn resolve_one<'a>(
    pattern: &'a Pattern<'a>,
    resource_vars: &FxHashSet<&'a str>,
) -> Result<Resolved<'a>, CompileError> {
    let predicate_iri = match &pattern.predicate {
        TermSlot::Concrete(Term::Iri(iri)) => iri.as_str(),
        _ => return Err(CompileError::unsupported("non-iri-predicate")),
    };

    if predicate_iri == Vocabulary::RDF_TYPE {
        let type_iri = match &pattern.object {
            TermSlot::Concrete(Term::Iri(iri)) => iri.as_str(),
            _ => return Err(CompileError::unsupported("rdf-type-object-must-be-iri")),
        };
        validate_type(type_iri)
            .map_err(|e| CompileError::InvariantViolation(e.to_string()))?;
        return Ok(Resolved::Type {
            subject: &pattern.subject,
            type_iri,
        });
    }

    validate_predicate(predicate_iri).map_err(|e| CompileError::InvariantViolation(e.to_string()))?;

    match &pattern.object {
        TermSlot::Concrete(Term::Literal(lit)) => Ok(Resolved::LiteralGround {
            subject: &pattern.subject,
            predicate_iri,
            literal: lit.clone(),
        }),
        TermSlot::Concrete(_) => Ok(Resolved::Edge {
            subject: &pattern.subject,
            predicate_iri,
            object: &pattern.object,
        }),
        TermSlot::Variable(var) => {
            if resource_vars.contains(var) {
                Ok(Resolved::Edge {
                    subject: &pattern.subject,
                    predicate_iri,
                    object: &pattern.object,
                })
            } else {
                Ok(Resolved::LiteralProject {
                    subject: &pattern.subject,
                    predicate_iri,
                    object_var: var,
                })
            }
        }
    }
}

/// Node-binder bookkeeping shared across a sequence of [`Resolved`]
/// triples: which Cypher identifier each SPARQL variable got, and which of
/// those identifiers have already appeared in a full `(binder:Resource
/// ...)` node pattern versus a bare `(binder)` back-reference.
///
/// `pub(crate)` and constructible by the algebra compiler so a required and
/// an optional BGP can be rendered under one shared binder table — OPTIONAL
/// pushdown needs a variable shared by both sides to resolve to the same
/// Cypher identifier.
pub(crate) struct Binders<'a> {
    names: FxHashMap<&'a str, String>,
    introduced: FxHashSet<String>,
    next: usize,
    prefix: String,
}

impl<'a> Binders<'a> {
    pub(crate) fn new(prefix: &str) -> Self {
        Binders {
            names: FxHashMap::default(),
            introduced: FxHashSet::default(),
            next: 0,
            prefix: prefix.to_string(),
        }
    }

    /// Clone the binder-name assignment (so the same SPARQL variable gets
    /// the same Cypher identifier) but with an empty `introduced` set — for
    /// rendering a UNION branch independently of its siblings, which share
    /// variable names but not a Cypher scope: two branches of a
    /// `UNION ALL` are separate top-level queries, each needing its own
    /// full `(binder:Resource ...)` node pattern the first time a variable
    /// appears, even if a sibling branch already "introduced" it.
    pub(crate) fn fork(&self) -> Self {
        Binders {
            names: self.names.clone(),
            introduced: FxHashSet::default(),
            next: self.next,
            prefix: self.prefix.clone(),
        }
    }

    /// Assign (or look up) a Cypher binder name for `var` without rendering
    /// any node text — used to pre-seed a shared name assignment across
    /// branches before forking.
    pub(crate) fn reserve(&mut self, var: &'a str) {
        self.name_for(var);
    }

    fn name_for(&mut self, var: &'a str) -> String {
        if let Some(existing) = self.names.get(var) {
            return existing.clone();
        }
        let name = format!("{}n{}", self.prefix, self.next);
        self.next += 1;
        self.names.insert(var, name.clone());
        name
    }

    /// Render `slot` as a node pattern fragment, introducing its binder
    /// with a full `:Resource` node pattern the first time it's seen and a
    /// bare back-reference afterward. Returns the fragment together with
    /// the binder name assigned to it — concrete terms get a synthetic,
    /// never-reused name so a sibling `WHERE`/property-access clause can
    /// still refer to the node, even though it's matched by a literal
    /// `uri` rather than bound to a SPARQL variable.
    fn node_text(
        &mut self,
        slot: &TermSlot<'a>,
        extra_label: Option<&str>,
        params: &mut ParamTable,
    ) -> Result<(String, String), CompileError> {
        match slot {
            TermSlot::Concrete(term) => {
                let key = encode_resource_key(term)
                    .map_err(|e| CompileError::unsupported_detail("resource-key-encoding", e.to_string()))?;
                let placeholder = params.push(BackendValue::String(key));
                let label_suffix = extra_label.map(|l| format!(":`{l}`")).unwrap_or_default();
                let binder = format!("{}c{}", self.prefix, self.next);
                self.next += 1;
                Ok((
                    format!("({binder}:Resource{label_suffix} {{uri: {placeholder}}})"),
                    binder,
                ))
            }
            TermSlot::Variable(var) => {
                let binder = self.name_for(var);
                if self.introduced.contains(&binder) {
                    Ok((format!("({binder})"), binder))
                } else {
                    self.introduced.insert(binder.clone());
                    let label_suffix = extra_label.map(|l| format!(":`{l}`")).unwrap_or_default();
                    Ok((format!("({binder}:Resource{label_suffix})"), binder))
                }
            }
        }
    }

    fn binder_for_projection(&self, var: &'a str) -> Option<&str> {
        self.names.get(var).map(|s| s.as_str())
    }

    /// True if `var` already has a binder that has appeared in a full node
    /// pattern (so a later reference to it must be a bare back-reference or
    /// a `WHERE` label check, not another node pattern).
    fn var_already_introduced(&self, var: &'a str) -> bool {
        self.names
            .get(var)
            .map(|binder| self.introduced.contains(binder))
            .unwrap_or(false)
    }
}

fn render_resolved<'a>(
    resolved: &[Resolved<'a>],
    params: &mut ParamTable,
    binder_prefix: &str,
) -> Result<(String, VariableMapping<'a>), CompileError> {
    let mut binders = Binders::new(binder_prefix);
    let fragment = render_fragment(resolved, &mut binders, params)?;

    let match_clause = fragment.match_fragments.join(", ");
    let mut cypher = format!("MATCH {match_clause}");
    if !fragment.where_clauses.is_empty() {
        cypher.push_str(" WHERE ");
        cypher.push_str(&fragment.where_clauses.join(" AND "));
    }
    cypher.push_str(" RETURN ");
    let mut return_items = fragment.return_items;
    return_items.extend(fragment.extra_columns);
    if return_items.is_empty() {
        return_items.push("1 AS _ask".to_string());
    }
    cypher.push_str(&return_items.join(", "));

    Ok((cypher, fragment.mapping))
}

/// The output of rendering a resolved BGP fragment: `MATCH` fragments and
/// `WHERE` clauses ready to be joined into (or spliced into a larger)
/// Cypher statement, the resulting variable mapping, each bound variable's
/// already-aliased `RETURN` item, and any extra un-mapped `RETURN` columns
/// (the `__dt`/`__lang` side channels).
pub(crate) struct RenderedFragment<'a> {
    pub(crate) match_fragments: Vec<String>,
    pub(crate) where_clauses: Vec<String>,
    pub(crate) mapping: VariableMapping<'a>,
    pub(crate) return_items: Vec<String>,
    pub(crate) extra_columns: Vec<String>,
    /// Each projected variable's raw Cypher expression (e.g. `` g0.`age` ``
    /// or `g0.uri`), before it was wrapped in `AS <alias>`. A literal
    /// projection's [`ColumnBinding`] alias is just the bare SPARQL
    /// variable name, not a Cypher identifier, so a caller that needs to
    /// reference the value again inside the same statement (a FILTER
    /// predicate, a GROUP key) must use this, not the alias.
    pub(crate) source_exprs: Vec<(&'a str, String)>,
}

impl<'a> RenderedFragment<'a> {
    /// The raw Cypher expression that produced `var`'s projected value, if
    /// `var` was bound by this fragment.
    pub(crate) fn source_expr(&self, var: &str) -> Option<&str> {
        self.source_exprs
            .iter()
            .find(|(v, _)| *v == var)
            .map(|(_, expr)| expr.as_str())
    }
}

/// The shared rendering core: turns a resolved BGP into `MATCH` fragments,
/// `WHERE` clauses, a variable mapping, and `RETURN` items. Threads an
/// external [`Binders`] and [`ParamTable`] so a caller composing two BGPs
/// (OPTIONAL's required and optional sides) can keep shared variables on
/// one Cypher binder.
pub(crate) fn render_fragment<'a>(
    resolved: &[Resolved<'a>],
    binders: &mut Binders<'a>,
    params: &mut ParamTable,
) -> Result<RenderedFragment<'a>, CompileError> {
    let mut match_fragments = Vec::new();
    let mut where_clauses = Vec::new();
    let mut projections: Vec<(&'a str, String, ProjectedKind)> = Vec::new();
    let mut projected_vars: FxHashSet<&'a str> = FxHashSet::default();
    let mut extra_columns: Vec<String> = Vec::new();

    for node in resolved {
        match node {
            Resolved::Type { subject, type_iri } => {
                let label = label_for_type(type_iri);
                let already_introduced = matches!(subject, TermSlot::Variable(v) if binders.var_already_introduced(v));
                if already_introduced {
                    if let TermSlot::Variable(v) = subject {
                        let binder = binders.name_for(v);
                        where_clauses.push(format!("{binder}:`{label}`"));
                    }
                } else {
                    let (frag, _) = binders.node_text(subject, Some(&label), params)?;
                    match_fragments.push(frag);
                }
                if let TermSlot::Variable(v) = subject {
                    if projected_vars.insert(v) {
                        let binder = binders.name_for(v);
                        projections.push((v, format!("{binder}.uri"), ProjectedKind::ResourceUri));
                    }
                }
            }
            Resolved::LiteralGround {
                subject,
                predicate_iri,
                literal,
            } => {
                let (frag, binder) = binders.node_text(subject, None, params)?;
                match_fragments.push(frag);
                let key = property_key_for_predicate(predicate_iri);
                let encoded = encode_literal(&key, literal);
                let placeholder = params.push(encoded.primary);
                where_clauses.push(format!("{binder}.`{key}` = {placeholder}"));
                if let Some((side_key, side_value)) = encoded.side_channel {
                    let side_placeholder = params.push(side_value);
                    where_clauses.push(format!("{binder}.`{side_key}` = {side_placeholder}"));
                }
            }
            Resolved::LiteralProject {
                subject,
                predicate_iri,
                object_var,
            } => {
                let (frag, binder) = binders.node_text(subject, None, params)?;
                match_fragments.push(frag);
                let key = property_key_for_predicate(predicate_iri);
                where_clauses.push(format!("{binder}.`{key}` IS NOT NULL"));
                if projected_vars.insert(object_var) {
                    projections.push((
                        object_var,
                        format!("{binder}.`{key}`"),
                        ProjectedKind::Literal {
                            property_key: key.clone(),
                        },
                    ));
                    extra_columns.push(format!(
                        "{binder}.`{key}{dt}` AS `{object_var}__dt`",
                        dt = DATATYPE_SUFFIX
                    ));
                    extra_columns.push(format!(
                        "{binder}.`{key}{lang}` AS `{object_var}__lang`",
                        lang = LANGUAGE_SUFFIX
                    ));
                }
            }
            Resolved::Edge {
                subject,
                predicate_iri,
                object,
            } => {
                let (subject_text, _) = binders.node_text(subject, None, params)?;

                validate_predicate(predicate_iri)
                    .map_err(|e| CompileError::InvariantViolation(e.to_string()))?;
                let rel_type = property_key_for_predicate(predicate_iri);

                let (object_text, _) = binders.node_text(object, None, params)?;
                match_fragments.push(format!("{subject_text}-[:`{rel_type}`]->{object_text}"));

                if let TermSlot::Variable(v) = subject {
                    if projected_vars.insert(v) {
                        let binder = binders.name_for(v);
                        projections.push((v, format!("{binder}.uri"), ProjectedKind::ResourceUri));
                    }
                }
                if let TermSlot::Variable(v) = object {
                    if projected_vars.insert(v) {
                        let binder = binders.name_for(v);
                        projections.push((v, format!("{binder}.uri"), ProjectedKind::ResourceUri));
                    }
                }
            }
        }
    }

    let mut mapping = VariableMapping::new();
    let mut return_items = Vec::new();
    let mut source_exprs = Vec::new();
    for (var, expr, kind) in projections {
        let alias = binders
            .binder_for_projection(var)
            .map(|b| b.to_string())
            .unwrap_or_else(|| var.to_string());
        return_items.push(format!("{expr} AS {alias}"));
        source_exprs.push((var, expr));
        mapping = mapping.bind(var, alias, kind);
    }

    Ok(RenderedFragment {
        match_fragments,
        where_clauses,
        mapping,
        return_items,
        extra_columns,
        source_exprs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdf_model::{Term, TermSlot};

    fn pat<'a>(s: TermSlot<'a>, p: TermSlot<'a>, o: TermSlot<'a>) -> Pattern<'a> {
        Pattern::new(s, p, o)
    }

    #[test]
    fn test_single_literal_pattern_produces_ambiguous_union() {
        let bgp = vec![pat(
            TermSlot::var("s"),
            TermSlot::concrete(Term::iri("http://xmlns.com/foaf/0.1/name")),
            TermSlot::var("o"),
        )];
        let result = compile_bgp(&bgp).unwrap();
        assert!(result.cypher_text.contains("UNION ALL"));
        let binding = result.variable_mapping.resolve("o").unwrap();
        assert!(matches!(binding.kind, ProjectedKind::Dynamic { .. }));
        let s_binding = result.variable_mapping.resolve("s").unwrap();
        assert_eq!(s_binding.kind, ProjectedKind::ResourceUri);
    }

    #[test]
    fn test_ground_type_and_literal_conjunction_has_no_union() {
        let bgp = vec![
            pat(
                TermSlot::var("s"),
                TermSlot::concrete(Term::iri(rdf_model::Vocabulary::RDF_TYPE)),
                TermSlot::concrete(Term::iri("http://example.org/Person")),
            ),
            pat(
                TermSlot::var("s"),
                TermSlot::concrete(Term::iri("http://xmlns.com/foaf/0.1/name")),
                TermSlot::concrete(Term::literal_str("Alice")),
            ),
        ];
        let result = compile_bgp(&bgp).unwrap();
        assert!(!result.cypher_text.contains("UNION"));
        assert!(result.cypher_text.contains("Resource:`http://example.org/Person`"));
        assert!(result.parameters.values().any(|v| matches!(v, BackendValue::String(s) if s == "Alice")));
    }

    #[test]
    fn test_two_hop_chain_shares_middle_binder() {
        let bgp = vec![
            pat(
                TermSlot::var("a"),
                TermSlot::concrete(Term::iri("http://example.org/knows")),
                TermSlot::var("b"),
            ),
            pat(
                TermSlot::var("b"),
                TermSlot::concrete(Term::iri("http://example.org/knows")),
                TermSlot::var("c"),
            ),
        ];
        let result = compile_bgp(&bgp).unwrap();
        assert!(result.variable_mapping.contains("a"));
        assert!(result.variable_mapping.contains("b"));
        assert!(result.variable_mapping.contains("c"));
        // `b` is forced resource by being a subject, so both edges share one binder for it.
        let occurrences = result.cypher_text.matches("n1").count();
        assert!(occurrences >= 2);
    }

    #[test]
    fn test_variable_predicate_single_pattern_compiles_three_way_union() {
        let bgp = vec![pat(
            TermSlot::var("s"),
            TermSlot::var("p"),
            TermSlot::var("o"),
        )];
        let result = compile_bgp(&bgp).unwrap();
        assert_eq!(result.cypher_text.matches("UNION ALL").count(), 2);
        assert_eq!(
            result.variable_mapping.resolve("p").unwrap().kind,
            ProjectedKind::PredicateIri
        );
    }

    #[test]
    fn test_variable_predicate_in_multi_pattern_bgp_is_unsupported() {
        let bgp = vec![
            pat(TermSlot::var("s"), TermSlot::var("p"), TermSlot::var("o")),
            pat(
                TermSlot::var("o"),
                TermSlot::concrete(Term::iri("http://example.org/knows")),
                TermSlot::var("x"),
            ),
        ];
        let err = compile_bgp(&bgp).unwrap_err();
        assert_eq!(err.reason_code(), "variable-predicate-in-multi-pattern-bgp");
    }

    #[test]
    fn test_multiple_ambiguous_variable_objects_unsupported() {
        let bgp = vec![
            pat(
                TermSlot::var("s1"),
                TermSlot::concrete(Term::iri("http://example.org/p1")),
                TermSlot::var("o1"),
            ),
            pat(
                TermSlot::var("s2"),
                TermSlot::concrete(Term::iri("http://example.org/p2")),
                TermSlot::var("o2"),
            ),
        ];
        let err = compile_bgp(&bgp).unwrap_err();
        assert_eq!(err.reason_code(), "multiple-ambiguous-variable-objects");
    }

    #[test]
    fn test_variable_type_object_single_pattern_uses_unwind_labels() {
        let bgp = vec![pat(
            TermSlot::var("s"),
            TermSlot::concrete(Term::iri(rdf_model::Vocabulary::RDF_TYPE)),
            TermSlot::var("t"),
        )];
        let result = compile_bgp(&bgp).unwrap();
        assert!(result.cypher_text.contains("UNWIND labels(s)"));
        assert_eq!(
            result.variable_mapping.resolve("t").unwrap().kind,
            ProjectedKind::TypeIri
        );
    }

    #[test]
    fn test_empty_bgp_compiles_to_trivial_query() {
        let result = compile_bgp(&[]).unwrap();
        assert!(result.variable_mapping.is_empty());
    }

    #[test]
    fn test_ground_literal_pattern_matches_existing_storage_shape() {
        let bgp = vec![pat(
            TermSlot::var("s"),
            TermSlot::concrete(Term::iri("http://xmlns.com/foaf/0.1/name")),
            TermSlot::concrete(Term::literal_str("Alice")),
        )];
        let result = compile_bgp(&bgp).unwrap();
        assert!(result.cypher_text.contains("WHERE"));
        assert!(!result.cypher_text.contains("UNION"));
    }
}
