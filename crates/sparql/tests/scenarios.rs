//! Concrete end-to-end scenarios: each test builds an [`Algebra`] node by
//! hand (standing in for a host query engine's parsed tree), runs it
//! through [`ExecutorBridge`], and checks both the Cypher shape the
//! compiler produced and the decoded bindings a [`MockDriver`] response
//! yields. S1 (single ground triple lookup) and S5 (large write-buffer
//! flush chunking) are covered by `storage`'s own test suite; these cover
//! the SPARQL-side scenarios a BGP/OPTIONAL/GROUP pushdown needs.

use rdf_model::{Pattern, Term, TermSlot, Vocabulary};
use sparql::{
    compile_bgp, AggregateBinding, AggregateFunction, Algebra, BridgeOutcome, ExecutorBridge,
    ProjectedKind,
};
use std::sync::Arc;
use storage::{BackendValue, MockDriver, Row};

/// S2: a two-hop chain BGP (`?a :knows ?b . ?b :knows ?c`) compiles to one
/// `MATCH` with two chained edge hops, projecting all three resource
/// variables by their `uri` property.
#[test]
fn scenario_two_hop_chain_compiles_to_single_chained_match() {
    let knows = "http://example.org/knows";
    let bgp = vec![
        Pattern::new(TermSlot::var("a"), TermSlot::concrete(Term::iri(knows)), TermSlot::var("b")),
        Pattern::new(TermSlot::var("b"), TermSlot::concrete(Term::iri(knows)), TermSlot::var("c")),
    ];
    let compiled = compile_bgp(&bgp).unwrap();

    assert_eq!(compiled.cypher_text.matches("MATCH").count(), 1, "chain stays one MATCH clause");
    assert_eq!(
        compiled.cypher_text.matches(&format!("-[:`{knows}`]->")).count(),
        2,
        "both hops render as chained edges"
    );
    assert!(!compiled.cypher_text.contains("UNION"), "a closed chain has no ambiguity to disambiguate");

    for var in ["a", "b", "c"] {
        let binding = compiled.variable_mapping.resolve(var).expect("variable projected");
        assert_eq!(binding.kind, ProjectedKind::ResourceUri);
    }

    let driver = Arc::new(MockDriver::new());
    let a_alias = compiled.variable_mapping.resolve("a").unwrap().alias.clone();
    let b_alias = compiled.variable_mapping.resolve("b").unwrap().alias.clone();
    let c_alias = compiled.variable_mapping.resolve("c").unwrap().alias.clone();
    driver.push_response(vec![Row::new(vec![
        (a_alias, BackendValue::String("http://example.org/alice".to_string())),
        (b_alias, BackendValue::String("http://example.org/bob".to_string())),
        (c_alias, BackendValue::String("http://example.org/carol".to_string())),
    ])]);

    let bridge = ExecutorBridge::new(Arc::clone(&driver));
    let node = Algebra::Bgp(bgp);
    match bridge.execute(&node).unwrap() {
        BridgeOutcome::Pushed(bindings) => {
            assert_eq!(bindings.len(), 1);
            assert!(bindings[0].is_bound("a"));
            assert!(bindings[0].is_bound("b"));
            assert!(bindings[0].is_bound("c"));
        }
        BridgeOutcome::Fallback { reason, .. } => panic!("expected pushdown, got fallback: {reason}"),
    }
    assert_eq!(driver.query_count(), 1);
}

/// S3: a variable-predicate pattern (`<ex:alice> ?p ?o`) compiles to the
/// 3-way `UNION ALL` (type / property / edge) and decodes each row
/// according to its `o_kind` tag.
#[test]
fn scenario_variable_predicate_union_decodes_all_three_kinds() {
    let bgp = vec![Pattern::new(
        TermSlot::concrete(Term::iri("http://example.org/alice")),
        TermSlot::var("p"),
        TermSlot::var("o"),
    )];
    let compiled = compile_bgp(&bgp).unwrap();
    assert_eq!(compiled.cypher_text.matches("UNION ALL").count(), 2, "three branches joined by two UNION ALLs");

    let driver = Arc::new(MockDriver::new());
    driver.push_response(vec![
        Row::new(vec![
            ("s".to_string(), BackendValue::String("http://example.org/alice".to_string())),
            ("p".to_string(), BackendValue::String(Vocabulary::RDF_TYPE.to_string())),
            ("o".to_string(), BackendValue::String("http://example.org/Person".to_string())),
            ("o_kind".to_string(), BackendValue::String("type".to_string())),
        ]),
        Row::new(vec![
            ("s".to_string(), BackendValue::String("http://example.org/alice".to_string())),
            ("p".to_string(), BackendValue::String("http://xmlns.com/foaf/0.1/name".to_string())),
            ("o".to_string(), BackendValue::String("Alice".to_string())),
            ("o_kind".to_string(), BackendValue::String("property".to_string())),
        ]),
        Row::new(vec![
            ("s".to_string(), BackendValue::String("http://example.org/alice".to_string())),
            ("p".to_string(), BackendValue::String("http://example.org/knows".to_string())),
            ("o".to_string(), BackendValue::String("http://example.org/bob".to_string())),
            ("o_kind".to_string(), BackendValue::String("edge".to_string())),
        ]),
    ]);

    let bridge = ExecutorBridge::new(Arc::clone(&driver));
    let node = Algebra::Bgp(bgp);
    let bindings = match bridge.execute(&node).unwrap() {
        BridgeOutcome::Pushed(bindings) => bindings,
        BridgeOutcome::Fallback { reason, .. } => panic!("expected pushdown, got fallback: {reason}"),
    };
    assert_eq!(bindings.len(), 3);

    use sparql::BoundTerm;
    match bindings[0].get("o").unwrap() {
        BoundTerm::Iri(iri) => assert_eq!(iri, "http://example.org/Person"),
        other => panic!("type row should decode as an iri, got {other:?}"),
    }
    match bindings[1].get("o").unwrap() {
        BoundTerm::Literal { lexical_form, .. } => assert_eq!(lexical_form, "Alice"),
        other => panic!("property row should decode as a literal, got {other:?}"),
    }
    match bindings[2].get("o").unwrap() {
        BoundTerm::Iri(iri) => assert_eq!(iri, "http://example.org/bob"),
        other => panic!("edge row should decode as a resource, got {other:?}"),
    }
}

/// S4: `?person a :Person OPTIONAL { ?person :email ?e }` over two people,
/// only one of whom has an email, compiles to one `MATCH ... OPTIONAL
/// MATCH ...` and leaves `?e` unbound for the row with no email.
#[test]
fn scenario_optional_leaves_missing_attribute_unbound() {
    let person_type = "http://example.org/Person";
    let email = "http://example.org/email";

    let required = vec![Pattern::new(
        TermSlot::var("person"),
        TermSlot::concrete(Term::iri(Vocabulary::RDF_TYPE)),
        TermSlot::concrete(Term::iri(person_type)),
    )];
    let optional = vec![Pattern::new(
        TermSlot::var("person"),
        TermSlot::concrete(Term::iri(email)),
        TermSlot::var("e"),
    )];
    let node = Algebra::LeftJoin {
        left: Box::new(Algebra::Bgp(required)),
        right: Box::new(Algebra::Bgp(optional)),
    };

    let compiled = sparql::compile_algebra(&node).unwrap();
    assert_eq!(compiled.cypher_text.matches("MATCH").count(), 1, "required MATCH");
    assert_eq!(compiled.cypher_text.matches("OPTIONAL MATCH").count(), 1);

    let person_alias = compiled.variable_mapping.resolve("person").unwrap().alias.clone();
    let e_binding = compiled.variable_mapping.resolve("e").unwrap();
    assert_eq!(e_binding.kind, ProjectedKind::Literal { property_key: "email".to_string() });
    let e_alias = e_binding.alias.clone();

    let driver = Arc::new(MockDriver::new());
    driver.push_response(vec![
        Row::new(vec![
            (person_alias.clone(), BackendValue::String("http://example.org/alice".to_string())),
            (e_alias.clone(), BackendValue::String("alice@example.org".to_string())),
        ]),
        Row::new(vec![
            (person_alias, BackendValue::String("http://example.org/bob".to_string())),
            (e_alias, BackendValue::Null),
        ]),
    ]);

    let bridge = ExecutorBridge::new(Arc::clone(&driver));
    let bindings = match bridge.execute(&node).unwrap() {
        BridgeOutcome::Pushed(bindings) => bindings,
        BridgeOutcome::Fallback { reason, .. } => panic!("expected pushdown, got fallback: {reason}"),
    };

    assert_eq!(bindings.len(), 2);
    assert!(bindings[0].is_bound("person"));
    assert!(bindings[0].is_bound("e"), "alice has an email");
    assert!(bindings[1].is_bound("person"));
    assert!(!bindings[1].is_bound("e"), "bob's missing email stays unbound, not an error");
}

/// S6: `SELECT ?t (COUNT(?x) AS ?n) { ?x a ?t } GROUP BY ?t` pushes down
/// via the dedicated group-by-type shape: one `count(` call, no
/// individual-subject projection.
#[test]
fn scenario_group_by_type_count_has_single_aggregate_no_row_projection() {
    let pattern = Pattern::new(
        TermSlot::var("x"),
        TermSlot::concrete(Term::iri(Vocabulary::RDF_TYPE)),
        TermSlot::var("t"),
    );
    let node = Algebra::Group {
        input: Box::new(Algebra::Bgp(vec![pattern])),
        group_vars: vec!["t"],
        aggregates: vec![AggregateBinding {
            function: AggregateFunction::Count,
            variable: Some("x"),
            output_var: "n",
        }],
    };

    let compiled = sparql::compile_algebra(&node).unwrap();
    assert_eq!(compiled.cypher_text.matches("count(").count(), 1);
    assert!(compiled.cypher_text.contains("UNWIND labels"));
    assert!(compiled.variable_mapping.resolve("t").is_some());
    assert!(compiled.variable_mapping.resolve("n").is_some());
    assert!(
        compiled.variable_mapping.resolve("x").is_none(),
        "the grouped subject is not individually projected, only aggregated over"
    );

    let driver = Arc::new(MockDriver::new());
    let t_alias = compiled.variable_mapping.resolve("t").unwrap().alias.clone();
    let n_alias = compiled.variable_mapping.resolve("n").unwrap().alias.clone();
    driver.push_response(vec![
        Row::new(vec![
            (t_alias.clone(), BackendValue::String("http://example.org/Person".to_string())),
            (n_alias.clone(), BackendValue::Integer(3)),
        ]),
        Row::new(vec![
            (t_alias, BackendValue::String("http://example.org/Org".to_string())),
            (n_alias, BackendValue::Integer(1)),
        ]),
    ]);

    let bridge = ExecutorBridge::new(Arc::clone(&driver));
    let bindings = match bridge.execute(&node).unwrap() {
        BridgeOutcome::Pushed(bindings) => bindings,
        BridgeOutcome::Fallback { reason, .. } => panic!("expected pushdown, got fallback: {reason}"),
    };
    assert_eq!(bindings.len(), 2);
    assert!(bindings[0].is_bound("t"));
    assert!(bindings[0].is_bound("n"));
}
