//! Cascade executor: applies one planned repair action to the store.

use refdb_core::store::matches_path;
use refdb_core::{DocumentId, Filter, Mutation, StoreDriver, Value};

use crate::error::Error;
use crate::plan::RepairAction;

/// Executes repair actions against the store driver.
///
/// Every repair is independently idempotent: pull-if-present,
/// remove-if-present, delete-if-present. An owner document that vanished
/// between `find` and `update` (raced by a concurrent delete) is treated as
/// already satisfied because the update is keyed by the owner's own id.
pub struct CascadeExecutor<'a> {
    store: &'a dyn StoreDriver,
}

impl<'a> CascadeExecutor<'a> {
    /// Create an executor over a store driver.
    pub fn new(store: &'a dyn StoreDriver) -> Self {
        Self { store }
    }

    /// Ids of owner documents matched by a delete-owner action.
    ///
    /// The documents themselves are deleted by the orchestrator's recursive
    /// re-entry, so their own dependents are processed too.
    pub async fn matching_owner_ids(
        &self,
        action: &RepairAction,
    ) -> Result<Vec<DocumentId>, Error> {
        let docs = self.store.find(&action.owner, &action.filter).await?;
        Ok(docs.iter().filter_map(|doc| doc.id()).collect())
    }

    /// Remove every occurrence of the id from a scalar list field.
    pub async fn pull_value(
        &self,
        action: &RepairAction,
        field_path: &str,
        id: &DocumentId,
    ) -> Result<(), Error> {
        let removed = Value::Id(*id);
        for doc in self.store.find(&action.owner, &action.filter).await? {
            let Some(owner_id) = doc.id() else { continue };
            let Some(items) = doc.get_path(field_path).and_then(Value::as_list) else {
                continue;
            };

            let survivors: Vec<Value> =
                items.iter().filter(|item| **item != removed).cloned().collect();

            tracing::debug!(
                owner = %action.owner,
                owner_id = %owner_id,
                field = %field_path,
                pulled = items.len() - survivors.len(),
                "pulling list references"
            );
            self.store
                .update(
                    &action.owner,
                    &Filter::id(owner_id),
                    &Mutation::set(field_path, survivors),
                )
                .await?;
        }
        Ok(())
    }

    /// Remove matching embedded-list elements and renumber the survivors'
    /// order key to a dense 0-based sequence preserving relative order.
    pub async fn remove_elements(
        &self,
        action: &RepairAction,
        list_path: &str,
        element_path: &str,
        order_key: &str,
        id: &DocumentId,
    ) -> Result<(), Error> {
        let expected = Value::Id(*id);
        for doc in self.store.find(&action.owner, &action.filter).await? {
            let Some(owner_id) = doc.id() else { continue };
            let Some(items) = doc.get_path(list_path).and_then(Value::as_list) else {
                continue;
            };

            let mut survivors: Vec<Value> = items
                .iter()
                .filter(|item| match item {
                    Value::Document(element) => !matches_path(element, element_path, &expected),
                    _ => true,
                })
                .cloned()
                .collect();

            for (position, item) in survivors.iter_mut().enumerate() {
                if let Value::Document(element) = item {
                    element.set_path(order_key, Value::Int(position as i64));
                }
            }

            tracing::debug!(
                owner = %action.owner,
                owner_id = %owner_id,
                list = %list_path,
                removed = items.len() - survivors.len(),
                "removing embedded-list elements"
            );
            self.store
                .update(
                    &action.owner,
                    &Filter::id(owner_id),
                    &Mutation::set(list_path, survivors),
                )
                .await?;
        }
        Ok(())
    }
}
