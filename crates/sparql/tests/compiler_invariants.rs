//! The four compiler invariants: no whole-node return, full
//! parameterization of constants, UNION column parity, and projection
//! completeness. Each test exercises a fixture shaped to make the
//! invariant non-trivial to satisfy by accident.

use rdf_model::{Pattern, Term, TermSlot, Vocabulary};
use sparql::{compile_algebra, compile_bgp, Algebra};

fn return_clause(cypher: &str) -> &str {
    let marker = cypher.rfind("RETURN ").expect("compiled Cypher always has a RETURN clause");
    &cypher[marker + "RETURN ".len()..]
}

/// Every item in a `RETURN` clause is an expression aliased with `AS`
/// (`node.uri AS x`, `node.\`key\` AS y`, a literal tag, or an aggregate
/// call) — never a bare node binder returned whole.
#[test]
fn invariant_no_whole_node_return() {
    let bgp = vec![Pattern::new(
        TermSlot::var("s"),
        TermSlot::concrete(Term::iri(Vocabulary::RDF_TYPE)),
        TermSlot::concrete(Term::iri("http://example.org/Person")),
    )];
    let compiled = compile_bgp(&bgp).unwrap();
    let returned = return_clause(&compiled.cypher_text);

    for item in returned.split(", ") {
        assert!(item.contains(" AS "), "return item '{item}' has no alias");
        let expr = item.split(" AS ").next().unwrap();
        assert!(
            expr.contains('.') || expr.starts_with('\'') || expr.chars().next().unwrap().is_ascii_digit(),
            "return item '{item}' looks like a bare node binder, not a property/uri access or literal"
        );
    }
}

/// Every constant embedded in a triple pattern shows up in the compiled
/// Cypher only as a `$pN` placeholder, never spliced into the query text,
/// and the parameter table actually carries its value.
#[test]
fn invariant_constants_are_parameterized() {
    let subject_iri = "http://example.org/alice";
    let name_literal = "Alice Smith, Esq.";
    let bgp = vec![Pattern::new(
        TermSlot::concrete(Term::iri(subject_iri)),
        TermSlot::concrete(Term::iri("http://xmlns.com/foaf/0.1/name")),
        TermSlot::concrete(Term::literal_str(name_literal)),
    )];
    let compiled = compile_bgp(&bgp).unwrap();

    assert!(!compiled.cypher_text.contains(subject_iri), "subject constant leaked into Cypher text");
    assert!(!compiled.cypher_text.contains(name_literal), "literal constant leaked into Cypher text");
    assert!(compiled.cypher_text.contains("$p0"));
    assert!(compiled.cypher_text.contains("$p1"));
    assert_eq!(compiled.parameters.len(), 2);
}

/// A UNION's two branches return the same columns, in the same order, so a
/// driver response can be decoded identically regardless of which branch a
/// row came from.
#[test]
fn invariant_union_branches_share_column_order() {
    let pred = "http://example.org/worksWith";
    let left = vec![Pattern::new(TermSlot::var("x"), TermSlot::concrete(Term::iri(pred)), TermSlot::var("y"))];
    let right = vec![Pattern::new(TermSlot::var("y"), TermSlot::concrete(Term::iri(pred)), TermSlot::var("x"))];
    let node = Algebra::Union {
        left: Box::new(Algebra::Bgp(left)),
        right: Box::new(Algebra::Bgp(right)),
    };
    let compiled = compile_algebra(&node).unwrap();

    let parts: Vec<&str> = compiled.cypher_text.split("\nUNION ALL\n").collect();
    assert_eq!(parts.len(), 2);
    let left_columns: Vec<&str> = return_clause(parts[0]).split(", ").collect();
    let right_columns: Vec<&str> = return_clause(parts[1]).split(", ").collect();
    assert_eq!(left_columns.len(), right_columns.len());

    let left_aliases: Vec<&str> = left_columns.iter().map(|c| c.rsplit(" AS ").next().unwrap()).collect();
    let right_aliases: Vec<&str> = right_columns.iter().map(|c| c.rsplit(" AS ").next().unwrap()).collect();
    assert_eq!(left_aliases, right_aliases, "both branches must alias their columns identically");
}

/// Every variable the `VariableMapping` reports as projected actually has
/// its alias present in the generated `RETURN` clause — the mapping never
/// promises a column the Cypher text doesn't produce.
#[test]
fn invariant_projection_completeness() {
    let knows = "http://example.org/knows";
    let works_at = "http://example.org/worksAt";
    let bgp = vec![
        Pattern::new(TermSlot::var("a"), TermSlot::concrete(Term::iri(knows)), TermSlot::var("b")),
        Pattern::new(TermSlot::var("b"), TermSlot::concrete(Term::iri(works_at)), TermSlot::var("c")),
    ];
    let compiled = compile_bgp(&bgp).unwrap();
    assert!(!compiled.cypher_text.contains("UNION"), "a fully resource-typed chain needs no disambiguating union");
    let returned = return_clause(&compiled.cypher_text);

    for var in compiled.variable_mapping.variables() {
        let binding = compiled.variable_mapping.resolve(var).unwrap();
        let needle = format!("AS {}", binding.alias);
        let needle_backticked = format!("AS `{}`", binding.alias);
        assert!(
            returned.contains(&needle) || returned.contains(&needle_backticked),
            "variable '{var}' maps to alias '{}' which never appears in the RETURN clause: {returned}",
            binding.alias
        );
    }
}
