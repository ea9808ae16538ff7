//! A [`Driver`] backed by a real FalkorDB instance, speaking `GRAPH.QUERY`
//! over RESP via the `redis` crate. Feature-gated behind `falkordb-backend`
//! so the rest of this crate — and every test in it — has no dependency on
//! a live server.
//!
//! Grounded on [`crate::mock_driver::MockDriver`]'s shape (one struct
//! implementing [`Driver`], parameters passed as a name/value table) and on
//! FalkorDB's documented `GRAPH.QUERY <graph> "<cypher>" --compact` command
//! and its compact reply encoding: `[header, rows, statistics]`, where each
//! header entry tags a column as scalar/node/relation and each row value is
//! a `[type, payload]` pair.

use crate::driver::{BackendValue, Driver, Row, Rows};
use crate::error::{DriverError, StorageError, StorageResult};
use redis::{Client, Cmd, Connection, Value};
use std::collections::BTreeMap;
use std::sync::Mutex;

/// FalkorDB's compact-reply value type tags, returned as the first element
/// of each `[type, payload]` pair.
mod value_type {
    pub const NULL: i64 = 1;
    pub const STRING: i64 = 2;
    pub const INTEGER: i64 = 3;
    pub const BOOLEAN: i64 = 4;
    pub const DOUBLE: i64 = 5;
    pub const ARRAY: i64 = 6;
    pub const EDGE: i64 = 7;
    pub const NODE: i64 = 8;
}

/// Column kinds in a `GRAPH.QUERY --compact` header, used only to size the
/// column-name vector; the per-value type tag in each row is authoritative.
mod column_type {
    pub const SCALAR: i64 = 1;
    #[allow(dead_code)]
    pub const NODE: i64 = 2;
    #[allow(dead_code)]
    pub const RELATION: i64 = 3;
}

/// A [`Driver`] talking to a FalkorDB server over a single, mutex-guarded
/// synchronous connection.
///
/// One connection is shared because [`Driver::execute`] takes `&self`, not
/// `&mut self` — the same trait the in-memory mock satisfies. A host that
/// needs concurrent throughput against one graph should run multiple
/// `FalkorDbDriver` instances behind its own pool rather than expect this
/// type to pool internally.
pub struct FalkorDbDriver {
    connection: Mutex<Connection>,
    graph_name: String,
}

impl FalkorDbDriver {
    /// Connect to the server at `redis_url` (e.g. `redis://127.0.0.1:6379`)
    /// and bind to `graph_name`. The named graph is created lazily by
    /// FalkorDB on the first write.
    pub fn connect(redis_url: &str, graph_name: impl Into<String>) -> StorageResult<Self> {
        let client = Client::open(redis_url)
            .map_err(|e| StorageError::Backend(DriverError::Connection(e.to_string())))?;
        let connection = client
            .get_connection()
            .map_err(|e| StorageError::Backend(DriverError::Connection(e.to_string())))?;
        Ok(FalkorDbDriver {
            connection: Mutex::new(connection),
            graph_name: graph_name.into(),
        })
    }

    fn build_command(&self, cypher: &str, parameters: &BTreeMap<String, BackendValue>) -> Cmd {
        let query = if parameters.is_empty() {
            cypher.to_string()
        } else {
            let bindings: Vec<String> = parameters
                .iter()
                .map(|(key, value)| format!("{key}={}", cypher_literal(value)))
                .collect();
            format!("CYPHER {} {cypher}", bindings.join(" "))
        };

        let mut cmd = redis::cmd("GRAPH.QUERY");
        cmd.arg(&self.graph_name).arg(query).arg("--compact");
        cmd
    }
}

impl Driver for FalkorDbDriver {
    fn execute(&self, cypher: &str, parameters: &BTreeMap<String, BackendValue>) -> StorageResult<Rows> {
        let cmd = self.build_command(cypher, parameters);
        let mut connection = self.connection.lock().expect("falkordb connection poisoned");
        let reply: Value = cmd
            .query(&mut *connection)
            .map_err(|e| StorageError::Backend(DriverError::QueryFailed(e.to_string())))?;
        decode_query_reply(&reply)
    }

    fn ping(&self) -> StorageResult<()> {
        let mut connection = self.connection.lock().expect("falkordb connection poisoned");
        redis::cmd("PING")
            .query::<String>(&mut *connection)
            .map(|_| ())
            .map_err(|e| StorageError::Backend(DriverError::Connection(e.to_string())))
    }
}

/// Render one parameter value as a Cypher literal for the `CYPHER key=value`
/// prefix FalkorDB uses in place of bound parameters in the wire protocol.
fn cypher_literal(value: &BackendValue) -> String {
    match value {
        BackendValue::String(s) => format!("{:?}", s),
        BackendValue::Boolean(b) => b.to_string(),
        BackendValue::Integer(i) => i.to_string(),
        BackendValue::Float(f) => f.to_string(),
        BackendValue::Null => "null".to_string(),
        BackendValue::List(items) => {
            let rendered: Vec<String> = items.iter().map(cypher_literal).collect();
            format!("[{}]", rendered.join(","))
        }
        BackendValue::Map(fields) => {
            let rendered: Vec<String> = fields
                .iter()
                .map(|(key, value)| format!("{key}:{}", cypher_literal(value)))
                .collect();
            format!("{{{}}}", rendered.join(","))
        }
        BackendValue::Node { .. } | BackendValue::Edge { .. } => {
            // Nodes/edges are never bound as input parameters in this
            // adapter; every statement that passes one constructs it in
            // Cypher text instead (MERGE/MATCH patterns).
            String::from("null")
        }
    }
}

fn decode_query_reply(reply: &Value) -> StorageResult<Rows> {
    let Value::Array(top) = reply else {
        return Err(StorageError::Backend(DriverError::Protocol(
            "GRAPH.QUERY reply was not an array".to_string(),
        )));
    };

    // No result set at all (a pure write with RETURN-less Cypher) replies
    // with just a one-element statistics array.
    if top.len() < 2 {
        return Ok(Vec::new());
    }

    let column_names = decode_header(&top[0])?;
    let Value::Array(rows) = &top[1] else {
        return Err(StorageError::Backend(DriverError::Protocol(
            "GRAPH.QUERY result set was not an array".to_string(),
        )));
    };

    rows.iter()
        .map(|row| decode_row(row, &column_names))
        .collect()
}

fn decode_header(header: &Value) -> StorageResult<Vec<String>> {
    let Value::Array(columns) = header else {
        return Err(StorageError::Backend(DriverError::Protocol(
            "GRAPH.QUERY header was not an array".to_string(),
        )));
    };

    columns
        .iter()
        .map(|column| {
            let Value::Array(pair) = column else {
                return Err(StorageError::Backend(DriverError::Protocol(
                    "GRAPH.QUERY header entry was not a [type, name] pair".to_string(),
                )));
            };
            let _column_type = pair.first().and_then(as_i64).unwrap_or(column_type::SCALAR);
            pair.get(1)
                .and_then(as_string)
                .ok_or_else(|| {
                    StorageError::Backend(DriverError::Protocol(
                        "GRAPH.QUERY header entry missing column name".to_string(),
                    ))
                })
        })
        .collect()
}

fn decode_row(row: &Value, column_names: &[String]) -> StorageResult<Row> {
    let Value::Array(cells) = row else {
        return Err(StorageError::Backend(DriverError::Protocol(
            "GRAPH.QUERY result row was not an array".to_string(),
        )));
    };

    let mut columns = Vec::with_capacity(cells.len());
    for (index, cell) in cells.iter().enumerate() {
        let name = column_names
            .get(index)
            .cloned()
            .unwrap_or_else(|| index.to_string());
        columns.push((name, decode_value(cell)?));
    }
    Ok(Row::new(columns))
}

fn decode_value(value: &Value) -> StorageResult<BackendValue> {
    let Value::Array(tagged) = value else {
        return Err(StorageError::Backend(DriverError::Protocol(
            "GRAPH.QUERY value was not a [type, payload] pair".to_string(),
        )));
    };
    let type_tag = tagged
        .first()
        .and_then(as_i64)
        .ok_or_else(|| StorageError::Backend(DriverError::Protocol("missing value type tag".to_string())))?;
    let payload = tagged.get(1);

    match type_tag {
        t if t == value_type::NULL => Ok(BackendValue::Null),
        t if t == value_type::STRING => payload
            .and_then(as_string)
            .map(BackendValue::String)
            .ok_or_else(|| malformed("string payload")),
        t if t == value_type::INTEGER => payload
            .and_then(as_i64)
            .map(BackendValue::Integer)
            .ok_or_else(|| malformed("integer payload")),
        t if t == value_type::BOOLEAN => payload
            .and_then(as_string)
            .map(|s| BackendValue::Boolean(s == "true"))
            .ok_or_else(|| malformed("boolean payload")),
        t if t == value_type::DOUBLE => payload
            .and_then(as_string)
            .and_then(|s| s.parse::<f64>().ok())
            .map(BackendValue::Float)
            .ok_or_else(|| malformed("double payload")),
        t if t == value_type::ARRAY => {
            let Some(Value::Array(items)) = payload else {
                return Err(malformed("array payload"));
            };
            let decoded: StorageResult<Vec<BackendValue>> =
                items.iter().map(decode_value).collect();
            Ok(BackendValue::List(decoded?))
        }
        t if t == value_type::NODE => decode_node_or_edge(payload, true),
        t if t == value_type::EDGE => decode_node_or_edge(payload, false),
        other => Err(StorageError::Backend(DriverError::Protocol(format!(
            "unrecognized GRAPH.QUERY value type tag: {other}"
        )))),
    }
}

fn decode_node_or_edge(payload: Option<&Value>, is_node: bool) -> StorageResult<BackendValue> {
    let Some(Value::Array(fields)) = payload else {
        return Err(malformed(if is_node { "node payload" } else { "edge payload" }));
    };

    // FalkorDB's compact node/edge encoding is `[id, labels_or_type,
    // properties]`; properties are `[[name, type, value], ...]` triples.
    let property_list = fields.get(2);
    let mut properties = BTreeMap::new();
    if let Some(Value::Array(props)) = property_list {
        for prop in props {
            if let Value::Array(triple) = prop {
                if let (Some(name), Some(value)) = (triple.first().and_then(as_string), triple.get(2)) {
                    properties.insert(name, decode_value(value)?);
                }
            }
        }
    }

    if is_node {
        let labels = match fields.get(1) {
            Some(Value::Array(label_ids)) => label_ids
                .iter()
                .filter_map(as_string)
                .collect(),
            _ => Vec::new(),
        };
        Ok(BackendValue::Node { labels, properties })
    } else {
        let rel_type = fields.get(1).and_then(as_string).unwrap_or_default();
        Ok(BackendValue::Edge { rel_type, properties })
    }
}

fn malformed(what: &str) -> StorageError {
    StorageError::Backend(DriverError::MalformedResult(format!(
        "GRAPH.QUERY reply had a malformed {what}"
    )))
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Int(i) => Some(*i),
        Value::BulkString(bytes) => std::str::from_utf8(bytes).ok()?.parse().ok(),
        _ => None,
    }
}

fn as_string(value: &Value) -> Option<String> {
    match value {
        Value::BulkString(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
        Value::SimpleString(s) => Some(s.clone()),
        Value::Int(i) => Some(i.to_string()),
        _ => None,
    }
}
