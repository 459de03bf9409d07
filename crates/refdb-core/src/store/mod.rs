//! The store driver boundary: filters, mutations, and the async driver
//! trait the cascade engine runs against.

mod memory;
mod sleddb;

pub use memory::MemoryStore;
pub use sleddb::SledStore;

use async_trait::async_trait;

use crate::document::{Document, ID_FIELD};
use crate::error::StoreError;
use crate::id::DocumentId;
use crate::value::Value;

/// A document selection predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Match documents whose value at a dotted path equals the given value.
    ///
    /// The path descends embedded documents and, unlike
    /// [`Document::get_path`], also descends lists: a path into a list
    /// matches when any element matches. Equality is exact.
    Eq {
        /// Dotted field path.
        path: String,
        /// Value to compare against.
        value: Value,
    },
}

impl Filter {
    /// Equality filter on a dotted path.
    pub fn eq(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq {
            path: path.into(),
            value: value.into(),
        }
    }

    /// Filter on the identity field.
    pub fn id(id: DocumentId) -> Self {
        Self::eq(ID_FIELD, id)
    }

    /// Check whether a document satisfies this filter.
    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Filter::Eq { path, value } => matches_path(doc, path, value),
        }
    }
}

/// Match a dotted path against a document, descending lists.
pub fn matches_path(doc: &Document, path: &str, expected: &Value) -> bool {
    let (head, rest) = match path.split_once('.') {
        Some((head, rest)) => (head, Some(rest)),
        None => (path, None),
    };
    match doc.get(head) {
        Some(value) => value_matches(value, rest, expected),
        None => false,
    }
}

fn value_matches(value: &Value, rest: Option<&str>, expected: &Value) -> bool {
    match (value, rest) {
        (Value::List(items), _) => items.iter().any(|item| value_matches(item, rest, expected)),
        (Value::Document(doc), Some(rest)) => matches_path(doc, rest, expected),
        (value, None) => value == expected,
        _ => false,
    }
}

/// A single-field update applied to matching documents.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Replace the value at a dotted path (see [`Document::set_path`]).
    Set {
        /// Dotted field path.
        path: String,
        /// Replacement value.
        value: Value,
    },
}

impl Mutation {
    /// Replace the value at a dotted path.
    pub fn set(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Mutation::Set {
            path: path.into(),
            value: value.into(),
        }
    }

    /// Apply this mutation to a document in place.
    pub fn apply(&self, doc: &mut Document) {
        match self {
            Mutation::Set { path, value } => {
                doc.set_path(path, value.clone());
            }
        }
    }
}

/// Generic driver for a document store.
///
/// The cascade engine consumes this boundary and never assumes
/// cross-collection transactions. All operations are asynchronous and
/// independently idempotent from the engine's point of view.
#[async_trait]
pub trait StoreDriver: Send + Sync {
    /// Find every document in a collection matching the filter.
    async fn find(&self, doc_type: &str, filter: &Filter) -> Result<Vec<Document>, StoreError>;

    /// Apply a mutation to every matching document; returns the count.
    async fn update(
        &self,
        doc_type: &str,
        filter: &Filter,
        mutation: &Mutation,
    ) -> Result<u64, StoreError>;

    /// Delete one matching document; returns whether one existed.
    async fn delete_one(&self, doc_type: &str, filter: &Filter) -> Result<bool, StoreError>;

    /// Delete every matching document; returns the count.
    ///
    /// Drivers may override this with a batched implementation.
    async fn delete_many(&self, doc_type: &str, filter: &Filter) -> Result<u64, StoreError> {
        let mut deleted = 0;
        while self.delete_one(doc_type, filter).await? {
            deleted += 1;
        }
        Ok(deleted)
    }

    /// Insert a document, generating an identity when absent; returns the id.
    async fn insert(&self, doc_type: &str, doc: Document) -> Result<DocumentId, StoreError>;

    /// Number of documents in a collection.
    async fn count(&self, doc_type: &str) -> Result<u64, StoreError>;
}
