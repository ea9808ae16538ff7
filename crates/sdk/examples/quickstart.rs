//! Quick start example: connect to a running FalkorDB instance, add a
//! couple of triples through the direct path, then push a hand-built BGP
//! down to Cypher and print the decoded bindings.
//!
//! Run with `cargo run --example quickstart --features falkordb-backend`
//! against a FalkorDB instance listening on `localhost:6379`.

#[cfg(feature = "falkordb-backend")]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    use rdf_model::{Pattern, Term, TermSlot, Triple, Vocabulary};
    use sdk::{Algebra, BridgeOutcome, GraphAdapter, GraphConfig};

    let config = GraphConfig::new()
        .with_backend_host("localhost")
        .with_backend_port(6379)
        .with_graph_name("quickstart");
    let adapter = GraphAdapter::connect(&config)?;
    println!("✓ Connected to FalkorDB");

    adapter.add(&Triple::new(
        Term::iri("http://example.org/alice"),
        Term::iri("http://xmlns.com/foaf/0.1/name"),
        Term::literal_str("Alice"),
    ))?;
    adapter.add(&Triple::new(
        Term::iri("http://example.org/alice"),
        Term::iri(Vocabulary::RDF_TYPE),
        Term::iri("http://xmlns.com/foaf/0.1/Person"),
    ))?;
    println!("✓ Added 2 triples, graph now holds {}", adapter.size()?);

    let bgp = vec![Pattern::new(
        TermSlot::var("person"),
        TermSlot::concrete(Term::iri("http://xmlns.com/foaf/0.1/name")),
        TermSlot::var("name"),
    )];
    match adapter.query(&Algebra::Bgp(bgp))? {
        BridgeOutcome::Pushed(bindings) => {
            for binding in bindings.iter() {
                println!("  name = {:?}", binding.get("name"));
            }
        }
        BridgeOutcome::Fallback { reason, .. } => {
            println!("query could not be pushed down: {reason}")
        }
    }

    Ok(())
}

#[cfg(not(feature = "falkordb-backend"))]
fn main() {
    eprintln!("this example requires --features falkordb-backend");
}
