//! Term Codec (C1): translates RDF terms to and from property-graph
//! primitivies — the `uri` node key, native scalar properties, and the
//! lexical-form-plus-side-channel fallback for datatypes that have no
//! native Cypher representation.
//!
//! The encoding strategy (Open Question 1 in `DESIGN.md`): `xsd:string`,
//! `xsd:boolean`, and the numeric XSD types store as a native Cypher
//! scalar with no side channel. Every other literal — language-tagged
//! strings and any other datatype — stores its lexical form as the
//! property value plus a sibling property (`<key>__lang` or `<key>__dt`)
//! carrying the language tag or datatype IRI needed to reconstruct the
//! original term.

use crate::driver::BackendValue;
use crate::error::{StorageError, StorageResult};
use rdf_model::{Literal, Term, Vocabulary};
use std::collections::BTreeMap;

/// Suffix appended to a property key to hold a literal's datatype IRI when
/// the literal could not be stored as a native scalar.
pub const DATATYPE_SUFFIX: &str = "__dt";

/// Suffix appended to a property key to hold a literal's language tag.
pub const LANGUAGE_SUFFIX: &str = "__lang";

/// The property-graph encoding of one literal: its primary value, plus an
/// optional side-channel property needed to recover the exact original
/// term on decode.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedLiteral {
    /// The value stored under the mapped property key itself.
    pub primary: BackendValue,
    /// An additional `(key, value)` pair to store alongside `primary`,
    /// when the literal's datatype or language tag can't be inferred from
    /// `primary`'s Cypher type alone.
    pub side_channel: Option<(String, BackendValue)>,
}

/// Encode a literal for storage under the property key it was mapped to.
pub fn encode_literal(property_key: &str, literal: &Literal<'_>) -> EncodedLiteral {
    if let Some(language) = literal.language {
        return EncodedLiteral {
            primary: BackendValue::String(literal.lexical_form.to_string()),
            side_channel: Some((
                format!("{property_key}{LANGUAGE_SUFFIX}"),
                BackendValue::String(language.to_string()),
            )),
        };
    }

    match literal.datatype {
        None | Some(Vocabulary::XSD_STRING) => EncodedLiteral {
            primary: BackendValue::String(literal.lexical_form.to_string()),
            side_channel: None,
        },
        Some(Vocabulary::XSD_BOOLEAN) => match literal.as_bool() {
            Some(b) => EncodedLiteral {
                primary: BackendValue::Boolean(b),
                side_channel: None,
            },
            None => lexical_fallback(property_key, literal),
        },
        Some(Vocabulary::XSD_INTEGER | Vocabulary::XSD_INT | Vocabulary::XSD_LONG) => {
            match literal.as_i64() {
                Some(i) => EncodedLiteral {
                    primary: BackendValue::Integer(i),
                    side_channel: None,
                },
                None => lexical_fallback(property_key, literal),
            }
        }
        Some(Vocabulary::XSD_DOUBLE | Vocabulary::XSD_FLOAT | Vocabulary::XSD_DECIMAL) => {
            match literal.as_f64() {
                Some(f) => EncodedLiteral {
                    primary: BackendValue::Float(f),
                    side_channel: None,
                },
                None => lexical_fallback(property_key, literal),
            }
        }
        Some(_) => lexical_fallback(property_key, literal),
    }
}

fn lexical_fallback(property_key: &str, literal: &Literal<'_>) -> EncodedLiteral {
    match literal.datatype {
        Some(dt) => EncodedLiteral {
            primary: BackendValue::String(literal.lexical_form.to_string()),
            side_channel: Some((
                format!("{property_key}{DATATYPE_SUFFIX}"),
                BackendValue::String(dt.to_string()),
            )),
        },
        None => EncodedLiteral {
            primary: BackendValue::String(literal.lexical_form.to_string()),
            side_channel: None,
        },
    }
}

/// The resource identifier stored under the reserved `uri` property: the
/// IRI string itself, or `_:b<id>` for a blank node.
pub fn encode_resource_key(term: &Term<'_>) -> StorageResult<String> {
    match term {
        Term::Iri(iri) => Ok(iri.as_str().to_string()),
        Term::BlankNode(id) => Ok(format!("_:b{}", id.id())),
        Term::Literal(_) => Err(StorageError::CodecMismatch(
            "a literal cannot be encoded as a resource key".to_string(),
        )),
    }
}

/// Reconstruct a resource term (IRI or blank node) from a `uri` property
/// value previously produced by [`encode_resource_key`].
pub fn decode_resource_key(value: &str) -> StorageResult<DecodedResource> {
    if let Some(rest) = value.strip_prefix("_:b") {
        let id: u64 = rest.parse().map_err(|_| {
            StorageError::CodecMismatch(format!("malformed blank node key: '{value}'"))
        })?;
        Ok(DecodedResource::BlankNode(id))
    } else {
        Ok(DecodedResource::Iri(value.to_string()))
    }
}

/// An owned resource decoded from a `uri` property value. Owned (rather
/// than borrowing into a `Term<'a>`) because the backend value it came from
/// does not carry the lifetime of any interned string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedResource {
    /// An IRI resource.
    Iri(String),
    /// A blank node, identified by its numeric id.
    BlankNode(u64),
}

/// Reconstruct a literal term from its primary backend value and an
/// optional sibling side-channel property, the inverse of
/// [`encode_literal`].
pub fn decode_literal(
    property_key: &str,
    properties: &BTreeMap<String, BackendValue>,
) -> StorageResult<DecodedLiteral> {
    let primary = properties.get(property_key).ok_or_else(|| {
        StorageError::CodecMismatch(format!("missing property '{property_key}'"))
    })?;

    if let Some(BackendValue::String(lang)) =
        properties.get(&format!("{property_key}{LANGUAGE_SUFFIX}"))
    {
        let lexical = primary
            .as_str()
            .ok_or_else(|| StorageError::CodecMismatch("language-tagged value not a string".into()))?
            .to_string();
        return Ok(DecodedLiteral {
            lexical_form: lexical,
            language: Some(lang.clone()),
            datatype: None,
        });
    }

    if let Some(BackendValue::String(dt)) =
        properties.get(&format!("{property_key}{DATATYPE_SUFFIX}"))
    {
        let lexical = primary
            .as_str()
            .ok_or_else(|| StorageError::CodecMismatch("datatyped value not a string".into()))?
            .to_string();
        return Ok(DecodedLiteral {
            lexical_form: lexical,
            language: None,
            datatype: Some(dt.clone()),
        });
    }

    let (lexical_form, datatype) = match primary {
        BackendValue::String(s) => (s.clone(), None),
        BackendValue::Boolean(b) => (b.to_string(), Some(Vocabulary::XSD_BOOLEAN.to_string())),
        BackendValue::Integer(i) => (i.to_string(), Some(Vocabulary::XSD_INTEGER.to_string())),
        BackendValue::Float(f) => (f.to_string(), Some(Vocabulary::XSD_DOUBLE.to_string())),
        BackendValue::Null => {
            return Err(StorageError::CodecMismatch(format!(
                "property '{property_key}' is null"
            )))
        }
        BackendValue::Node { .. } | BackendValue::Edge { .. } | BackendValue::List(_) | BackendValue::Map(_) => {
            return Err(StorageError::CodecMismatch(format!(
                "property '{property_key}' held a structural value, not a scalar"
            )))
        }
    };

    Ok(DecodedLiteral {
        lexical_form,
        language: None,
        datatype,
    })
}

/// An owned literal decoded from backend properties, the inverse shape of
/// [`rdf_model::Literal`] but without a borrowed lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedLiteral {
    /// Lexical form of the literal.
    pub lexical_form: String,
    /// Language tag, if any.
    pub language: Option<String>,
    /// Datatype IRI, if any.
    pub datatype: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rdf_model::Term;

    fn lit<'a>(lexical: &'a str, datatype: Option<&'a str>) -> Literal<'a> {
        Literal {
            lexical_form: lexical,
            language: None,
            datatype,
        }
    }

    #[test]
    fn test_string_literal_round_trips_without_side_channel() {
        let encoded = encode_literal("name", &lit("Alice", Some(Vocabulary::XSD_STRING)));
        assert_eq!(encoded.primary, BackendValue::String("Alice".to_string()));
        assert!(encoded.side_channel.is_none());

        let mut props = BTreeMap::new();
        props.insert("name".to_string(), encoded.primary);
        let decoded = decode_literal("name", &props).unwrap();
        assert_eq!(decoded.lexical_form, "Alice");
        assert_eq!(decoded.datatype, None);
    }

    #[test]
    fn test_integer_literal_encodes_as_native_scalar() {
        let encoded = encode_literal("age", &lit("42", Some(Vocabulary::XSD_INTEGER)));
        assert_eq!(encoded.primary, BackendValue::Integer(42));
        assert!(encoded.side_channel.is_none());

        let mut props = BTreeMap::new();
        props.insert("age".to_string(), encoded.primary);
        let decoded = decode_literal("age", &props).unwrap();
        assert_eq!(decoded.lexical_form, "42");
        assert_eq!(decoded.datatype.as_deref(), Some(Vocabulary::XSD_INTEGER));
    }

    #[test]
    fn test_boolean_literal_encodes_as_native_scalar() {
        let encoded = encode_literal("active", &lit("true", Some(Vocabulary::XSD_BOOLEAN)));
        assert_eq!(encoded.primary, BackendValue::Boolean(true));
    }

    #[test]
    fn test_exotic_datatype_uses_side_channel() {
        let encoded = encode_literal(
            "start",
            &lit("2024-01-01", Some(Vocabulary::XSD_DATE)),
        );
        assert_eq!(encoded.primary, BackendValue::String("2024-01-01".to_string()));
        let (key, value) = encoded.side_channel.expect("side channel expected");
        assert_eq!(key, "start__dt");
        assert_eq!(value, BackendValue::String(Vocabulary::XSD_DATE.to_string()));

        let mut props = BTreeMap::new();
        props.insert("start".to_string(), BackendValue::String("2024-01-01".to_string()));
        props.insert(key, value);
        let decoded = decode_literal("start", &props).unwrap();
        assert_eq!(decoded.datatype.as_deref(), Some(Vocabulary::XSD_DATE));
    }

    #[test]
    fn test_language_tagged_literal_uses_lang_side_channel() {
        let literal = Literal {
            lexical_form: "Bonjour",
            language: Some("fr"),
            datatype: None,
        };
        let encoded = encode_literal("greeting", &literal);
        assert_eq!(encoded.primary, BackendValue::String("Bonjour".to_string()));
        let (key, value) = encoded.side_channel.expect("side channel expected");
        assert_eq!(key, "greeting__lang");
        assert_eq!(value, BackendValue::String("fr".to_string()));
    }

    #[test]
    fn test_resource_key_round_trip_iri() {
        let term = Term::iri("http://example.org/alice");
        let key = encode_resource_key(&term).unwrap();
        assert_eq!(key, "http://example.org/alice");
        assert_eq!(decode_resource_key(&key).unwrap(), DecodedResource::Iri(key));
    }

    #[test]
    fn test_resource_key_round_trip_blank_node() {
        let term = Term::blank(7);
        let key = encode_resource_key(&term).unwrap();
        assert_eq!(key, "_:b7");
        assert_eq!(decode_resource_key(&key).unwrap(), DecodedResource::BlankNode(7));
    }

    #[test]
    fn test_encode_resource_key_rejects_literal() {
        let term = Term::literal_str("not a resource");
        assert!(encode_resource_key(&term).is_err());
    }

    proptest::proptest! {
        #[test]
        fn prop_blank_node_key_round_trips(id: u64) {
            let term = Term::blank(id);
            let key = encode_resource_key(&term).unwrap();
            prop_assert_eq!(decode_resource_key(&key).unwrap(), DecodedResource::BlankNode(id));
        }

        #[test]
        fn prop_iri_key_round_trips(iri in "[a-z]{1,10}://[a-z0-9./#-]{1,40}") {
            let term = Term::iri(&iri);
            let key = encode_resource_key(&term).unwrap();
            prop_assert_eq!(decode_resource_key(&key).unwrap(), DecodedResource::Iri(iri));
        }

        #[test]
        fn prop_integer_literal_round_trips(n: i64) {
            let lexical = n.to_string();
            let encoded = encode_literal("n", &lit(&lexical, Some(Vocabulary::XSD_INTEGER)));
            let mut props = BTreeMap::new();
            props.insert("n".to_string(), encoded.primary);
            let decoded = decode_literal("n", &props).unwrap();
            prop_assert_eq!(decoded.lexical_form, lexical);
            prop_assert_eq!(decoded.datatype.as_deref(), Some(Vocabulary::XSD_INTEGER));
        }
    }
}
