//! Sled-backed store driver.

use async_trait::async_trait;

use super::{Filter, Mutation, StoreDriver};
use crate::document::{Document, ID_FIELD};
use crate::error::StoreError;
use crate::id::DocumentId;

/// Tree name prefix for document collections.
const DOCS_TREE_PREFIX: &str = "docs:";

/// A persistent document store over a sled database.
///
/// Each collection lives in its own tree (`docs:{type}`); keys are the raw
/// 12 id bytes, values are the JSON encoding of the document.
pub struct SledStore {
    db: sled::Db,
}

impl SledStore {
    /// Wrap an open sled database.
    pub fn new(db: sled::Db) -> Self {
        Self { db }
    }

    /// Open or create a store at the given path.
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, StoreError> {
        let db = sled::Config::new().path(path).open()?;
        Ok(Self::new(db))
    }

    fn tree(&self, doc_type: &str) -> Result<sled::Tree, StoreError> {
        Ok(self.db.open_tree(format!("{DOCS_TREE_PREFIX}{doc_type}"))?)
    }
}

fn decode(bytes: &[u8]) -> Result<Document, StoreError> {
    Ok(serde_json::from_slice(bytes)?)
}

fn encode(doc: &Document) -> Result<Vec<u8>, StoreError> {
    Ok(serde_json::to_vec(doc)?)
}

#[async_trait]
impl StoreDriver for SledStore {
    async fn find(&self, doc_type: &str, filter: &Filter) -> Result<Vec<Document>, StoreError> {
        let tree = self.tree(doc_type)?;
        let mut found = Vec::new();
        for entry in tree.iter() {
            let (_, bytes) = entry?;
            let doc = decode(&bytes)?;
            if filter.matches(&doc) {
                found.push(doc);
            }
        }
        Ok(found)
    }

    async fn update(
        &self,
        doc_type: &str,
        filter: &Filter,
        mutation: &Mutation,
    ) -> Result<u64, StoreError> {
        let tree = self.tree(doc_type)?;
        let mut updated = 0;
        for entry in tree.iter() {
            let (key, bytes) = entry?;
            let mut doc = decode(&bytes)?;
            if filter.matches(&doc) {
                mutation.apply(&mut doc);
                tree.insert(key, encode(&doc)?)?;
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn delete_one(&self, doc_type: &str, filter: &Filter) -> Result<bool, StoreError> {
        let tree = self.tree(doc_type)?;
        for entry in tree.iter() {
            let (key, bytes) = entry?;
            if filter.matches(&decode(&bytes)?) {
                tree.remove(key)?;
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn delete_many(&self, doc_type: &str, filter: &Filter) -> Result<u64, StoreError> {
        let tree = self.tree(doc_type)?;
        let mut deleted = 0;
        for entry in tree.iter() {
            let (key, bytes) = entry?;
            if filter.matches(&decode(&bytes)?) {
                tree.remove(key)?;
                deleted += 1;
            }
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
        let tree = self.tree(doc_type)?;
        tree.insert(id.as_bytes(), encode(&doc)?)?;
        Ok(id)
    }

    async fn count(&self, doc_type: &str) -> Result<u64, StoreError> {
        Ok(self.tree(doc_type)?.len() as u64)
    }
}
