//! In-memory store driver.

use std::collections::BTreeMap;

use async_trait::async_trait;
use dashmap::DashMap;

use super::{Filter, Mutation, StoreDriver};
use crate::document::{Document, ID_FIELD};
use crate::error::StoreError;
use crate::id::DocumentId;

/// An in-memory document store keyed by collection name.
///
/// Collections are created on first insert. Intended for tests and as the
/// reference driver implementation.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: DashMap<String, BTreeMap<DocumentId, Document>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StoreDriver for MemoryStore {
    async fn find(&self, doc_type: &str, filter: &Filter) -> Result<Vec<Document>, StoreError> {
        Ok(self
            .collections
            .get(doc_type)
            .map(|collection| {
                collection
                    .values()
                    .filter(|doc| filter.matches(doc))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn update(
        &self,
        doc_type: &str,
        filter: &Filter,
        mutation: &Mutation,
    ) -> Result<u64, StoreError> {
        let mut updated = 0;
        if let Some(mut collection) = self.collections.get_mut(doc_type) {
            for doc in collection.values_mut() {
                if filter.matches(doc) {
                    mutation.apply(doc);
                    updated += 1;
                }
            }
        }
        Ok(updated)
    }

    async fn delete_one(&self, doc_type: &str, filter: &Filter) -> Result<bool, StoreError> {
        if let Some(mut collection) = self.collections.get_mut(doc_type) {
            let matched = collection
                .iter()
                .find(|(_, doc)| filter.matches(doc))
                .map(|(id, _)| *id);
            if let Some(id) = matched {
                collection.remove(&id);
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn delete_many(&self, doc_type: &str, filter: &Filter) -> Result<u64, StoreError> {
        let mut deleted = 0;
        if let Some(mut collection) = self.collections.get_mut(doc_type) {
            let before = collection.len();
            collection.retain(|_, doc| !filter.matches(doc));
            deleted = (before - collection.len()) as u64;
        }
        Ok(deleted)
    }

    async fn insert(&self, doc_type: &str, mut doc: Document) -> Result<DocumentId, StoreError> {
        let id = match doc.id() {
            Some(id) => id,
            None => {
                let id = DocumentId::generate();
                doc.insert(ID_FIELD, id);
                id
            }
        };
        self.collections
            .entry(doc_type.to_string())
            .or_default()
            .insert(id, doc);
        Ok(id)
    }

    async fn count(&self, doc_type: &str) -> Result<u64, StoreError> {
        Ok(self
            .collections
            .get(doc_type)
            .map(|collection| collection.len() as u64)
            .unwrap_or(0))
    }
}
