//! Triple Store (C4): the direct, non-transactional path for adding,
//! deleting, and pattern-matching individual triples against a Cypher
//! backend. Bulk loads and multi-statement writes go through
//! [`crate::write_buffer`] instead; this module is for single-triple
//! read/write traffic where buffering would add latency for no benefit.

use crate::codec::{self, DecodedLiteral, DecodedResource};
use crate::driver::{BackendValue, Driver, Row};
use crate::error::{StorageError, StorageResult};
use crate::mapping::{self, RESOURCE_LABEL, URI_PROPERTY};
use crate::observability::{track_operation, NullSink, ObservabilitySink, OperationType};
use rdf_model::{Pattern, Term, TermSlot, Triple, Vocabulary};
use std::collections::BTreeMap;
use std::sync::Arc;

/// An owned triple decoded from backend rows. Owned because the driver
/// returns `String`-backed values with no borrow back into an interned
/// dictionary.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredTriple {
    /// Subject resource.
    pub subject: DecodedResource,
    /// Predicate IRI (not reduced to a local name).
    pub predicate: String,
    /// Object: either a resource or a literal.
    pub object: StoredObject,
}

/// The object position of a [`StoredTriple`].
#[derive(Debug, Clone, PartialEq)]
pub enum StoredObject {
    /// An rdf:type assertion or resource-valued predicate.
    Resource(DecodedResource),
    /// A literal-valued predicate.
    Literal(DecodedLiteral),
}

/// How one triple classifies against the mapping model, which determines
/// the Cypher shape used to store or delete it.
enum TripleShape<'a> {
    /// `?s rdf:type ?type` — an extra label on the subject node.
    Type { subject: &'a Term<'a>, type_iri: &'a str },
    /// `?s ?p "literal"` — a node property.
    Literal {
        subject: &'a Term<'a>,
        predicate_iri: &'a str,
        literal: &'a rdf_model::Literal<'a>,
    },
    /// `?s ?p ?o` with `?o` a resource — a relationship.
    Edge {
        subject: &'a Term<'a>,
        predicate_iri: &'a str,
        object: &'a Term<'a>,
    },
}

fn classify<'a>(triple: &'a Triple<'a>) -> StorageResult<TripleShape<'a>> {
    let predicate_iri = triple.predicate_iri().ok_or_else(|| {
        StorageError::InvariantViolation("predicate must be an IRI".to_string())
    })?;

    if predicate_iri == Vocabulary::RDF_TYPE {
        let type_iri = triple.object.as_iri().map(|iri| iri.as_str()).ok_or_else(|| {
            StorageError::InvariantViolation("rdf:type object must be an IRI".to_string())
        })?;
        return Ok(TripleShape::Type {
            subject: &triple.subject,
            type_iri,
        });
    }

    match &triple.object {
        Term::Literal(literal) => Ok(TripleShape::Literal {
            subject: &triple.subject,
            predicate_iri,
            literal,
        }),
        Term::Iri(_) | Term::BlankNode(_) => Ok(TripleShape::Edge {
            subject: &triple.subject,
            predicate_iri,
            object: &triple.object,
        }),
    }
}

/// The direct-path triple store: a thin, dispatching layer over a
/// [`Driver`] that performs no buffering.
pub struct TripleStore<D: Driver> {
    driver: Arc<D>,
    sink: Arc<dyn ObservabilitySink>,
}

impl<D: Driver> TripleStore<D> {
    /// Build a triple store over `driver`, with no observability sink
    /// (events are discarded).
    pub fn new(driver: Arc<D>) -> Self {
        TripleStore {
            driver,
            sink: Arc::new(NullSink),
        }
    }

    /// Build a triple store that reports operation events to `sink`.
    pub fn with_sink(driver: Arc<D>, sink: Arc<dyn ObservabilitySink>) -> Self {
        TripleStore { driver, sink }
    }

    /// Insert one triple.
    pub fn add(&self, triple: &Triple<'_>) -> StorageResult<()> {
        track_operation(self.sink.as_ref(), OperationType::TripleStoreAdd, || {
            self.add_inner(triple)
        })
    }

    fn add_inner(&self, triple: &Triple<'_>) -> StorageResult<()> {
        match classify(triple)? {
            TripleShape::Type { subject, type_iri } => {
                let label = mapping::label_for_type(type_iri);
                let key = codec::encode_resource_key(subject)?;
                let cypher = format!(
                    "MERGE (s:{RESOURCE_LABEL} {{{URI_PROPERTY}: $subject}}) SET s:`{label}`"
                );
                let mut params = BTreeMap::new();
                params.insert("subject".to_string(), BackendValue::String(key));
                self.driver.execute(&cypher, &params)?;
                Ok(())
            }
            TripleShape::Literal {
                subject,
                predicate_iri,
                literal,
            } => {
                mapping::validate_predicate(predicate_iri)?;
                let property_key = mapping::property_key_for_predicate(predicate_iri);
                let encoded = codec::encode_literal(&property_key, literal);
                let key = codec::encode_resource_key(subject)?;

                let mut set_clauses = vec![format!("s.`{property_key}` = $value")];
                let mut params = BTreeMap::new();
                params.insert("subject".to_string(), BackendValue::String(key));
                params.insert("value".to_string(), encoded.primary);
                if let Some((side_key, side_value)) = encoded.side_channel {
                    set_clauses.push(format!("s.`{side_key}` = $side_value"));
                    params.insert("side_value".to_string(), side_value);
                }

                let cypher = format!(
                    "MERGE (s:{RESOURCE_LABEL} {{{URI_PROPERTY}: $subject}}) SET {}",
                    set_clauses.join(", ")
                );
                self.driver.execute(&cypher, &params)?;
                Ok(())
            }
            TripleShape::Edge {
                subject,
                predicate_iri,
                object,
            } => {
                mapping::validate_predicate(predicate_iri)?;
                let rel_type = mapping::property_key_for_predicate(predicate_iri);
                let subject_key = codec::encode_resource_key(subject)?;
                let object_key = codec::encode_resource_key(object)?;

                let cypher = format!(
                    "MERGE (s:{RESOURCE_LABEL} {{{URI_PROPERTY}: $subject}}) \
                     MERGE (o:{RESOURCE_LABEL} {{{URI_PROPERTY}: $object}}) \
                     MERGE (s)-[:`{rel_type}`]->(o)"
                );
                let mut params = BTreeMap::new();
                params.insert("subject".to_string(), BackendValue::String(subject_key));
                params.insert("object".to_string(), BackendValue::String(object_key));
                self.driver.execute(&cypher, &params)?;
                Ok(())
            }
        }
    }

    /// Remove one triple. Removing the last type label or property does not
    /// delete the underlying node — matching RDF's semantics, where a
    /// resource can exist with zero asserted statements about it.
    pub fn delete(&self, triple: &Triple<'_>) -> StorageResult<()> {
        track_operation(self.sink.as_ref(), OperationType::TripleStoreDelete, || {
            self.delete_inner(triple)
        })
    }

    fn delete_inner(&self, triple: &Triple<'_>) -> StorageResult<()> {
        match classify(triple)? {
            TripleShape::Type { subject, type_iri } => {
                let label = mapping::label_for_type(type_iri);
                let key = codec::encode_resource_key(subject)?;
                let cypher = format!(
                    "MATCH (s:{RESOURCE_LABEL} {{{URI_PROPERTY}: $subject}}) REMOVE s:`{label}`"
                );
                let mut params = BTreeMap::new();
                params.insert("subject".to_string(), BackendValue::String(key));
                self.driver.execute(&cypher, &params)?;
                Ok(())
            }
            TripleShape::Literal {
                subject,
                predicate_iri,
                ..
            } => {
                let property_key = mapping::property_key_for_predicate(predicate_iri);
                let key = codec::encode_resource_key(subject)?;
                let cypher = format!(
                    "MATCH (s:{RESOURCE_LABEL} {{{URI_PROPERTY}: $subject}}) \
                     REMOVE s.`{property_key}`, s.`{property_key}{dt}`, s.`{property_key}{lang}`",
                    dt = codec::DATATYPE_SUFFIX,
                    lang = codec::LANGUAGE_SUFFIX,
                );
                let mut params = BTreeMap::new();
                params.insert("subject".to_string(), BackendValue::String(key));
                self.driver.execute(&cypher, &params)?;
                Ok(())
            }
            TripleShape::Edge {
                subject,
                predicate_iri,
                object,
            } => {
                let rel_type = mapping::property_key_for_predicate(predicate_iri);
                let subject_key = codec::encode_resource_key(subject)?;
                let object_key = codec::encode_resource_key(object)?;
                let cypher = format!(
                    "MATCH (s:{RESOURCE_LABEL} {{{URI_PROPERTY}: $subject}})-[r:`{rel_type}`]->\
                     (o:{RESOURCE_LABEL} {{{URI_PROPERTY}: $object}}) DELETE r"
                );
                let mut params = BTreeMap::new();
                params.insert("subject".to_string(), BackendValue::String(subject_key));
                params.insert("object".to_string(), BackendValue::String(object_key));
                self.driver.execute(&cypher, &params)?;
                Ok(())
            }
        }
    }

    /// Pattern-match triples directly against the backend.
    ///
    /// This could defer entirely to C6 with a one-triple BGP — but the BGP
    /// compiler lives in the `sparql` crate,
    /// one layer above this one, and its executor needs exactly the
    /// [`Driver`] this crate defines. Routing through it here would make
    /// `storage` depend on `sparql`, which already depends on `storage`.
    /// A single triple pattern is simple enough to compile directly using
    /// the same mapping rules C6 uses, so that's what this does; the
    /// compiler in `sparql` is for multi-pattern BGPs and beyond.
    ///
    /// Returns a fully materialized `Vec`, not a lazy iterator: the
    /// underlying [`Driver::execute`] call returns an eagerly-fetched
    /// [`storage::Rows`] batch (see that type's doc comment), and this
    /// method decodes all of it before returning. SPEC_FULL.md §12 notes
    /// this as the same documented simplification as the driver port's
    /// `Rows` type, rather than the §4.4 "lazy iterator of Triple" shape.
    pub fn find(&self, pattern: &Pattern<'_>) -> StorageResult<Vec<StoredTriple>> {
        track_operation(self.sink.as_ref(), OperationType::TripleStoreFind, || {
            self.find_inner(pattern)
        })
    }

    fn find_inner(&self, pattern: &Pattern<'_>) -> StorageResult<Vec<StoredTriple>> {
        match &pattern.predicate {
            TermSlot::Variable(_) => self.find_variable_predicate(pattern),
            TermSlot::Concrete(Term::Iri(iri)) if iri.as_str() == Vocabulary::RDF_TYPE => {
                self.find_type(pattern)
            }
            TermSlot::Concrete(Term::Iri(iri)) => {
                self.find_concrete_predicate(pattern, iri.as_str())
            }
            TermSlot::Concrete(_) => Err(StorageError::InvariantViolation(
                "predicate must be an IRI".to_string(),
            )),
        }
    }

    fn subject_match_clause(&self, pattern: &Pattern<'_>, params: &mut BTreeMap<String, BackendValue>) -> StorageResult<String> {
        match &pattern.subject {
            TermSlot::Concrete(term) => {
                let key = codec::encode_resource_key(term)?;
                params.insert("subject".to_string(), BackendValue::String(key));
                Ok(format!("{{{URI_PROPERTY}: $subject}}"))
            }
            TermSlot::Variable(_) => Ok(String::new()),
        }
    }

    fn find_type(&self, pattern: &Pattern<'_>) -> StorageResult<Vec<StoredTriple>> {
        let mut params = BTreeMap::new();
        let subject_clause = self.subject_match_clause(pattern, &mut params)?;

        match &pattern.object {
            TermSlot::Concrete(Term::Iri(iri)) => {
                mapping::validate_type(iri.as_str())?;
                let label = mapping::label_for_type(iri.as_str());
                let cypher = format!(
                    "MATCH (s:{RESOURCE_LABEL}:`{label}` {subject_clause}) RETURN s.{URI_PROPERTY} AS s"
                );
                let rows = self.driver.execute(&cypher, &params)?;
                rows.into_iter()
                    .map(|row| {
                        Ok(StoredTriple {
                            subject: decode_resource_column(&row, "s")?,
                            predicate: Vocabulary::RDF_TYPE.to_string(),
                            object: StoredObject::Resource(DecodedResource::Iri(
                                iri.as_str().to_string(),
                            )),
                        })
                    })
                    .collect()
            }
            TermSlot::Concrete(_) => Err(StorageError::InvariantViolation(
                "rdf:type object must be an IRI".to_string(),
            )),
            TermSlot::Variable(_) => {
                let cypher = format!(
                    "MATCH (s:{RESOURCE_LABEL} {subject_clause}) UNWIND labels(s) AS typeLabel \
                     WITH s, typeLabel WHERE typeLabel <> '{RESOURCE_LABEL}' \
                     RETURN s.{URI_PROPERTY} AS s, typeLabel AS type"
                );
                let rows = self.driver.execute(&cypher, &params)?;
                rows.into_iter()
                    .map(|row| {
                        let type_iri = row
                            .get("type")
                            .and_then(BackendValue::as_str)
                            .ok_or_else(|| {
                                StorageError::CodecMismatch("missing type column".to_string())
                            })?
                            .to_string();
                        Ok(StoredTriple {
                            subject: decode_resource_column(&row, "s")?,
                            predicate: Vocabulary::RDF_TYPE.to_string(),
                            object: StoredObject::Resource(DecodedResource::Iri(type_iri)),
                        })
                    })
                    .collect()
            }
        }
    }

    fn find_concrete_predicate(
        &self,
        pattern: &Pattern<'_>,
        predicate_iri: &str,
    ) -> StorageResult<Vec<StoredTriple>> {
        mapping::validate_predicate(predicate_iri)?;
        let key = mapping::property_key_for_predicate(predicate_iri);

        let mut params = BTreeMap::new();
        let subject_clause = self.subject_match_clause(pattern, &mut params)?;

        match &pattern.object {
            TermSlot::Concrete(Term::Literal(_)) => {
                let cypher = format!(
                    "MATCH (s:{RESOURCE_LABEL} {subject_clause}) WHERE s.`{key}` IS NOT NULL \
                     RETURN s.{URI_PROPERTY} AS s, s.`{key}` AS o"
                );
                let mut results = Vec::new();
                for row in self.driver.execute(&cypher, &params)? {
                    let subject = decode_resource_column(&row, "s")?;
                    let object = StoredObject::Literal(decode_literal_column(&row, "o", &key)?);
                    if object_matches(&pattern.object, &object) {
                        results.push(StoredTriple {
                            subject,
                            predicate: predicate_iri.to_string(),
                            object,
                        });
                    }
                }
                Ok(results)
            }
            TermSlot::Concrete(Term::Iri(_)) | TermSlot::Concrete(Term::BlankNode(_)) => {
                let object_term = pattern.object.as_term().expect("checked above");
                let object_key = codec::encode_resource_key(object_term)?;
                params.insert("object".to_string(), BackendValue::String(object_key));
                let cypher = format!(
                    "MATCH (s:{RESOURCE_LABEL} {subject_clause})-[:`{key}`]->\
                     (o:{RESOURCE_LABEL} {{{URI_PROPERTY}: $object}}) \
                     RETURN s.{URI_PROPERTY} AS s, o.{URI_PROPERTY} AS o"
                );
                let rows = self.driver.execute(&cypher, &params)?;
                rows.into_iter()
                    .map(|row| {
                        Ok(StoredTriple {
                            subject: decode_resource_column(&row, "s")?,
                            predicate: predicate_iri.to_string(),
                            object: StoredObject::Resource(decode_resource_column(&row, "o")?),
                        })
                    })
                    .collect()
            }
            TermSlot::Variable(_) => {
                let mut results = Vec::new();

                let literal_cypher = format!(
                    "MATCH (s:{RESOURCE_LABEL} {subject_clause}) WHERE s.`{key}` IS NOT NULL \
                     RETURN s.{URI_PROPERTY} AS s, s.`{key}` AS o"
                );
                for row in self.driver.execute(&literal_cypher, &params)? {
                    let subject = decode_resource_column(&row, "s")?;
                    let object = decode_literal_column(&row, "o", &key)?;
                    results.push(StoredTriple {
                        subject,
                        predicate: predicate_iri.to_string(),
                        object: StoredObject::Literal(object),
                    });
                }

                let edge_cypher = format!(
                    "MATCH (s:{RESOURCE_LABEL} {subject_clause})-[:`{key}`]->(o:{RESOURCE_LABEL}) \
                     RETURN s.{URI_PROPERTY} AS s, o.{URI_PROPERTY} AS o"
                );
                for row in self.driver.execute(&edge_cypher, &params)? {
                    results.push(StoredTriple {
                        subject: decode_resource_column(&row, "s")?,
                        predicate: predicate_iri.to_string(),
                        object: StoredObject::Resource(decode_resource_column(&row, "o")?),
                    });
                }

                Ok(results)
            }
        }
    }

    fn find_variable_predicate(&self, pattern: &Pattern<'_>) -> StorageResult<Vec<StoredTriple>> {
        let mut params = BTreeMap::new();
        let subject_clause = self.subject_match_clause(pattern, &mut params)?;
        let mut results = Vec::new();

        let edge_cypher = format!(
            "MATCH (s:{RESOURCE_LABEL} {subject_clause})-[r]->(o:{RESOURCE_LABEL}) \
             RETURN s.{URI_PROPERTY} AS s, type(r) AS p, o.{URI_PROPERTY} AS o"
        );
        for row in self.driver.execute(&edge_cypher, &params)? {
            let subject = decode_resource_column(&row, "s")?;
            let predicate = column_string(&row, "p")?;
            let object = StoredObject::Resource(decode_resource_column(&row, "o")?);
            if object_matches(&pattern.object, &object) {
                results.push(StoredTriple { subject, predicate, object });
            }
        }

        let property_cypher = format!(
            "MATCH (s:{RESOURCE_LABEL} {subject_clause}) UNWIND keys(s) AS propKey \
             WITH s, propKey WHERE propKey <> '{URI_PROPERTY}' \
             AND NOT propKey ENDS WITH '{dt}' AND NOT propKey ENDS WITH '{lang}' \
             RETURN s.{URI_PROPERTY} AS s, propKey AS p, s[propKey] AS o",
            dt = codec::DATATYPE_SUFFIX,
            lang = codec::LANGUAGE_SUFFIX,
        );
        for row in self.driver.execute(&property_cypher, &params)? {
            let subject = decode_resource_column(&row, "s")?;
            let predicate = column_string(&row, "p")?;
            let object = StoredObject::Literal(decode_literal_column(&row, "o", &predicate)?);
            if object_matches(&pattern.object, &object) {
                results.push(StoredTriple { subject, predicate, object });
            }
        }

        let type_cypher = format!(
            "MATCH (s:{RESOURCE_LABEL} {subject_clause}) UNWIND labels(s) AS typeLabel \
             WITH s, typeLabel WHERE typeLabel <> '{RESOURCE_LABEL}' \
             RETURN s.{URI_PROPERTY} AS s, typeLabel AS type"
        );
        for row in self.driver.execute(&type_cypher, &params)? {
            let subject = decode_resource_column(&row, "s")?;
            let type_iri = column_string(&row, "type")?;
            let object = StoredObject::Resource(DecodedResource::Iri(type_iri));
            if object_matches(&pattern.object, &object) {
                results.push(StoredTriple {
                    subject,
                    predicate: Vocabulary::RDF_TYPE.to_string(),
                    object,
                });
            }
        }

        Ok(results)
    }

    /// Remove every node and relationship from the backing graph.
    pub fn clear(&self) -> StorageResult<()> {
        self.driver
            .execute("MATCH (n) DETACH DELETE n", &BTreeMap::new())?;
        Ok(())
    }

    /// Best-effort total triple count: rdf:type assertions (extra labels)
    /// plus literal properties plus relationships. Side-channel properties
    /// (`__dt`/`__lang` suffixed) are not counted separately, since they
    /// encode part of an already-counted literal triple rather than a
    /// triple of their own.
    pub fn size(&self) -> StorageResult<u64> {
        let node_rows = self.driver.execute(
            "MATCH (n) RETURN \
             sum(size(labels(n)) - 1) AS type_triples, \
             sum(size([k IN keys(n) WHERE k <> 'uri' \
               AND NOT k ENDS WITH '__dt' AND NOT k ENDS WITH '__lang'])) AS literal_triples",
            &BTreeMap::new(),
        )?;
        let edge_rows = self
            .driver
            .execute("MATCH ()-[r]->() RETURN count(r) AS edge_triples", &BTreeMap::new())?;

        let type_and_literal = node_rows.first().map_or(0i64, |row| {
            let type_triples = as_i64(row.get("type_triples"));
            let literal_triples = as_i64(row.get("literal_triples"));
            type_triples + literal_triples
        });
        let edges = edge_rows
            .first()
            .map_or(0i64, |row| as_i64(row.get("edge_triples")));

        Ok((type_and_literal + edges).max(0) as u64)
    }

    /// True if the backing graph has no triples.
    pub fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.size()? == 0)
    }
}

fn as_i64(value: Option<&BackendValue>) -> i64 {
    match value {
        Some(BackendValue::Integer(i)) => *i,
        _ => 0,
    }
}

fn column_string(row: &Row, column: &str) -> StorageResult<String> {
    row.get(column)
        .and_then(BackendValue::as_str)
        .map(|s| s.to_string())
        .ok_or_else(|| StorageError::CodecMismatch(format!("missing string column '{column}'")))
}

fn decode_resource_column(row: &Row, column: &str) -> StorageResult<DecodedResource> {
    let value = column_string(row, column)?;
    codec::decode_resource_key(&value)
}

fn decode_literal_column(row: &Row, column: &str, property_key: &str) -> StorageResult<DecodedLiteral> {
    let mut props = BTreeMap::new();
    if let Some(value) = row.get(column) {
        props.insert(property_key.to_string(), value.clone());
    }
    codec::decode_literal(property_key, &props)
}

fn object_matches(slot: &TermSlot<'_>, stored: &StoredObject) -> bool {
    match slot {
        TermSlot::Variable(_) => true,
        TermSlot::Concrete(term) => stored_object_equals(term, stored),
    }
}

fn stored_object_equals(term: &Term<'_>, stored: &StoredObject) -> bool {
    match (term, stored) {
        (Term::Iri(iri), StoredObject::Resource(DecodedResource::Iri(s))) => iri.as_str() == s,
        (Term::BlankNode(id), StoredObject::Resource(DecodedResource::BlankNode(bid))) => {
            id.id() == *bid
        }
        (Term::Literal(lit), StoredObject::Literal(decoded)) => {
            lit.lexical_form == decoded.lexical_form
                && lit.language.map(|l| l.to_string()) == decoded.language
                && lit.datatype.map(|d| d.to_string()) == decoded.datatype
        }
        _ => false,
    }
}
