//! Documents: structured records of named fields.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::id::DocumentId;
use crate::value::Value;

/// Name of the identity field in every collection.
pub const ID_FIELD: &str = "id";

/// One structured record within a named collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    fields: BTreeMap<String, Value>,
}

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a top-level field, returning the document for chaining.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Set a top-level field.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Get a top-level field.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Remove a top-level field.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    /// Iterate over fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of top-level fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the document has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The document's identity, if the `id` field is present and an id.
    pub fn id(&self) -> Option<DocumentId> {
        self.fields.get(ID_FIELD).and_then(Value::as_id)
    }

    /// Resolve a dot-separated path, descending through embedded documents.
    ///
    /// Paths do not descend into lists; matching inside lists is filter
    /// semantics (see `store::Filter`), not path resolution.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        match path.split_once('.') {
            None => self.fields.get(path),
            Some((head, rest)) => match self.fields.get(head)? {
                Value::Document(doc) => doc.get_path(rest),
                _ => None,
            },
        }
    }

    /// Set the value at a dot-separated path.
    ///
    /// Intermediate segments must already exist as embedded documents;
    /// returns false if the path cannot be resolved.
    pub fn set_path(&mut self, path: &str, value: Value) -> bool {
        match path.split_once('.') {
            None => {
                self.fields.insert(path.to_string(), value);
                true
            }
            Some((head, rest)) => match self.fields.get_mut(head) {
                Some(Value::Document(doc)) => doc.set_path(rest, value),
                _ => false,
            },
        }
    }

    /// Build a document from a JSON object.
    ///
    /// Objects become embedded documents, arrays become lists, and numbers
    /// become integers when they fit in i64. JSON has no id type, so
    /// reference fields must be inserted explicitly as [`Value::Id`].
    pub fn from_json(json: &serde_json::Value) -> Option<Self> {
        match json {
            serde_json::Value::Object(map) => {
                let mut doc = Document::new();
                for (name, value) in map {
                    doc.fields.insert(name.clone(), json_to_value(value)?);
                }
                Some(doc)
            }
            _ => None,
        }
    }
}

fn json_to_value(json: &serde_json::Value) -> Option<Value> {
    Some(match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Float(n.as_f64()?),
        },
        serde_json::Value::String(s) => Value::String(s.clone()),
        serde_json::Value::Array(items) => {
            Value::List(items.iter().map(json_to_value).collect::<Option<_>>()?)
        }
        serde_json::Value::Object(_) => Value::Document(Document::from_json(json)?),
    })
}
