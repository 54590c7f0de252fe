//! Document addressing and payload types
//!
//! A store holds JSON-object documents grouped into named collections.
//! Documents are addressed by [`DocKey`] (collection + document id) and
//! carried around as [`Document`] maps. Typed records convert to and from
//! documents through [`encode`] / [`decode`].

use crate::error::{StoreError, StoreResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;

/// Document body: a JSON object
pub type Document = serde_json::Map<String, Value>;

/// Address of a document: collection name plus document id
///
/// Ordering is by collection, then id, which is also the order of a
/// document-id scan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocKey {
    /// Collection the document lives in
    pub collection: String,
    /// Document id, unique within the collection
    pub id: String,
}

impl DocKey {
    /// Create a key from collection and id
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for DocKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// A document as returned by a read or query
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDoc {
    /// Where the document lives
    pub key: DocKey,
    /// Commit version that produced this document body
    pub version: u64,
    /// Document body
    pub data: Document,
}

impl StoredDoc {
    /// Value of a top-level field, if present
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }
}

/// Final effect of a committed write on one document
///
/// `doc: None` removes the document. This is the unit stored in the WAL and
/// applied to storage; update merges are already resolved into full bodies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedWrite {
    /// Target document
    pub key: DocKey,
    /// New body, or None for a delete
    pub doc: Option<Document>,
}

/// Serialize a record into a document body
///
/// Fails with `InvalidDocument` if the record does not serialize to a JSON
/// object.
pub fn encode<T: Serialize>(record: &T) -> StoreResult<Document> {
    match serde_json::to_value(record)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::InvalidDocument(format!(
            "expected an object, got {}",
            type_name(&other)
        ))),
    }
}

/// Deserialize a document body into a record
pub fn decode<T: DeserializeOwned>(doc: &Document) -> Result<T, serde_json::Error> {
    serde_json::from_value(Value::Object(doc.clone()))
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Total order over JSON values used for field ordering
///
/// Values of different types order by type: null < bool < number < string
/// < array < object. Integers compare exactly; mixed integer/float pairs
/// compare as floats.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
                return x.cmp(&y);
            }
            if let (Some(x), Some(y)) = (x.as_u64(), y.as_u64()) {
                return x.cmp(&y);
            }
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.total_cmp(&y)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => {
            for (l, r) in x.iter().zip(y.iter()) {
                match compare_values(l, r) {
                    Ordering::Equal => continue,
                    other => return other,
                }
            }
            x.len().cmp(&y.len())
        }
        (Value::Object(x), Value::Object(y)) => x.len().cmp(&y.len()),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}
