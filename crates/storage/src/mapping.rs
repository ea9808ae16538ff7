//! Mapping Model (C2): the rules that turn RDF structure into property-graph
//! structure — which label a type becomes, which predicates become node
//! properties versus edges, and the invariants that keep the mapping
//! reversible.

use crate::error::{StorageError, StorageResult};

/// The property every mapped node carries, holding its IRI (or, for a blank
/// node, its synthesized local identifier). Reserved: no RDF predicate may
/// be mapped onto this key.
pub const URI_PROPERTY: &str = "uri";

/// The label every mapped node carries in addition to any rdf:type-derived
/// label.
pub const RESOURCE_LABEL: &str = "Resource";

/// Turn an rdf:type object IRI into the extra label applied to a node.
///
/// Per the mapping model: the label IS the IRI, identity
/// mapping. `http://example.org/ontology#Person` stays
/// `http://example.org/ontology#Person` — it is backtick-quoted, not
/// shortened, at Cypher emission time.
pub fn label_for_type(type_iri: &str) -> String {
    type_iri.to_string()
}

/// Turn a predicate IRI into the property key or relationship type used to
/// store it. Identity mapping — the full IRI is the key, quoted at Cypher
/// emission time.
pub fn property_key_for_predicate(predicate_iri: &str) -> String {
    predicate_iri.to_string()
}

/// Validate a predicate IRI against the mapping model's invariants before it
/// is used as a property key or relationship type.
///
/// - The mapped key must not collide with the reserved [`URI_PROPERTY`] key.
/// - The mapped key must not contain a backtick, which would allow it to
///   break out of a backtick-quoted Cypher identifier if ever interpolated
///   into query text instead of passed as a parameter.
pub fn validate_predicate(predicate_iri: &str) -> StorageResult<()> {
    let key = property_key_for_predicate(predicate_iri);

    if key == URI_PROPERTY {
        return Err(StorageError::InvariantViolation(format!(
            "predicate '{predicate_iri}' maps to the reserved property key '{URI_PROPERTY}'"
        )));
    }

    if key.contains('`') {
        return Err(StorageError::InvariantViolation(format!(
            "predicate '{predicate_iri}' maps to a key containing a backtick: '{key}'"
        )));
    }

    Ok(())
}

/// Validate a type IRI against the mapping model's invariants before its
/// local name is embedded as a label in Cypher query text.
///
/// Labels can't be bound as query parameters in Cypher, so the label name
/// is interpolated into the query text itself (backtick-quoted); this
/// rejects any local name that would let the label escape its quoting.
pub fn validate_type(type_iri: &str) -> StorageResult<()> {
    let label = label_for_type(type_iri);

    if label.contains('`') {
        return Err(StorageError::InvariantViolation(format!(
            "type '{type_iri}' maps to a label containing a backtick: '{label}'"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_for_type_is_identity() {
        assert_eq!(
            label_for_type("http://example.org/ontology#Person"),
            "http://example.org/ontology#Person"
        );
    }

    #[test]
    fn test_property_key_for_predicate_is_identity() {
        assert_eq!(
            property_key_for_predicate("http://xmlns.com/foaf/0.1/name"),
            "http://xmlns.com/foaf/0.1/name"
        );
    }

    #[test]
    fn test_validate_predicate_rejects_uri_collision() {
        // Only a predicate whose *full* IRI is the bare string "uri" collides
        // with the reserved property key: the mapping is identity on the
        // whole IRI, so a namespaced predicate like `http://ex/ns#uri` maps
        // to a distinct key and is not a collision.
        let err = validate_predicate(URI_PROPERTY).unwrap_err();
        assert!(err.to_string().contains("reserved property key"));
        assert!(validate_predicate("http://example.org/ns#uri").is_ok());
    }

    #[test]
    fn test_validate_predicate_rejects_backtick() {
        let err = validate_predicate("http://example.org/ns#weird`name").unwrap_err();
        assert!(err.to_string().contains("backtick"));
    }

    #[test]
    fn test_validate_predicate_accepts_normal_predicate() {
        assert!(validate_predicate("http://xmlns.com/foaf/0.1/name").is_ok());
    }
}
