//! Delete orchestrator: the engine's public entry point.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::future::BoxFuture;
use refdb_core::{DocumentId, Filter, SchemaRegistry, StoreDriver};

use crate::cascade::CascadeExecutor;
use crate::error::Error;
use crate::plan::{ActionKind, CascadePlanner};

/// Maximum cascade depth to prevent runaway recursion.
const MAX_CASCADE_DEPTH: usize = 100;

/// Result of a successful delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The root document existed and was deleted.
    Deleted,
    /// The root document was already absent; cascades were still processed
    /// so outstanding dangling references converge (idempotence contract).
    NotFound,
}

/// Cooperative cancellation signal for a running delete.
///
/// Checked between plan steps and between recursive cascade invocations.
/// On cancellation, already-applied mutations are retained; re-invoking the
/// same delete resumes remaining work.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token in the not-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Check whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Coordinates planning, execution, self-deletion, and cycle/idempotence
/// guarantees for cascading deletes.
///
/// On success, no document in any registered collection holds a scalar
/// reference to the deleted id (such documents were themselves deleted),
/// and no list-based reference to the id remains anywhere.
pub struct DeleteOrchestrator {
    registry: Arc<SchemaRegistry>,
    store: Arc<dyn StoreDriver>,
    max_depth: usize,
}

impl DeleteOrchestrator {
    /// Create an orchestrator over a registry and a store driver.
    pub fn new(registry: Arc<SchemaRegistry>, store: Arc<dyn StoreDriver>) -> Self {
        Self {
            registry,
            store,
            max_depth: MAX_CASCADE_DEPTH,
        }
    }

    /// Override the cascade depth bound.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Delete a document and transitively repair or remove every document
    /// referring to it.
    pub async fn delete(
        &self,
        doc_type: &str,
        id: &DocumentId,
    ) -> Result<DeleteOutcome, Error> {
        self.delete_with_cancel(doc_type, id, &CancelToken::new())
            .await
    }

    /// [`delete`](Self::delete) with a cooperative cancellation token.
    pub async fn delete_with_cancel(
        &self,
        doc_type: &str,
        id: &DocumentId,
        cancel: &CancelToken,
    ) -> Result<DeleteOutcome, Error> {
        let planner = CascadePlanner::new(self.registry.graph());
        let mut visited = HashSet::new();
        let outcome = self
            .delete_recursive(&planner, doc_type, *id, &mut visited, cancel, 0)
            .await?;

        tracing::debug!(
            doc_type = %doc_type,
            id = %id,
            visited = visited.len(),
            outcome = ?outcome,
            "cascade delete finished"
        );
        Ok(outcome)
    }

    fn delete_recursive<'a>(
        &'a self,
        planner: &'a CascadePlanner,
        doc_type: &'a str,
        id: DocumentId,
        visited: &'a mut HashSet<(String, DocumentId)>,
        cancel: &'a CancelToken,
        depth: usize,
    ) -> BoxFuture<'a, Result<DeleteOutcome, Error>> {
        Box::pin(async move {
            if depth > self.max_depth {
                return Err(Error::MaxDepthExceeded { depth });
            }
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            // Cycle guard: reference graphs may be cyclic, and one id may be
            // reachable through two independent paths.
            if !visited.insert((doc_type.to_string(), id)) {
                tracing::trace!(doc_type = %doc_type, id = %id, "already visited, skipping");
                return Ok(DeleteOutcome::NotFound);
            }

            let executor = CascadeExecutor::new(self.store.as_ref());
            for action in &planner.plan(doc_type, &id) {
                if cancel.is_cancelled() {
                    return Err(Error::Cancelled);
                }
                match &action.kind {
                    ActionKind::DeleteOwner => {
                        for owner_id in executor.matching_owner_ids(action).await? {
                            self.delete_recursive(
                                planner,
                                &action.owner,
                                owner_id,
                                visited,
                                cancel,
                                depth + 1,
                            )
                            .await?;
                        }
                    }
                    ActionKind::PullValue { field_path } => {
                        executor.pull_value(action, field_path, &id).await?;
                    }
                    ActionKind::RemoveElements {
                        list_path,
                        element_path,
                        order_key,
                    } => {
                        executor
                            .remove_elements(action, list_path, element_path, order_key, &id)
                            .await?;
                    }
                }
            }

            // Self-delete; an already-missing document is a no-op.
            let existed = self.store.delete_one(doc_type, &Filter::id(id)).await?;
            if existed {
                tracing::debug!(doc_type = %doc_type, id = %id, depth, "deleted document");
                Ok(DeleteOutcome::Deleted)
            } else {
                Ok(DeleteOutcome::NotFound)
            }
        })
    }
}
