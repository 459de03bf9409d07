//! Cascade planner: maps resolved references to concrete repair actions.

use std::sync::Arc;

use refdb_core::{DocumentId, Filter, ReferenceGraph, ReferenceKind};

/// What a repair action does to matching owner documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionKind {
    /// Delete the owner document. A scalar reference (required or
    /// optional, at any embedded-single depth) ties the owner's lifetime
    /// to the referenced document.
    DeleteOwner,
    /// Remove the id from a scalar list; the owner document is kept.
    PullValue {
        /// Dotted path to the list field.
        field_path: String,
    },
    /// Remove matching elements from an embedded list and renumber the
    /// survivors' order key to a dense 0-based sequence; the owner
    /// document is kept.
    RemoveElements {
        /// Dotted path to the list field.
        list_path: String,
        /// Dotted path from a list element to the id field.
        element_path: String,
        /// Element field holding the dense 0-based position.
        order_key: String,
    },
}

/// One planned repair against one owner type.
#[derive(Debug, Clone, PartialEq)]
pub struct RepairAction {
    /// Owner collection to repair.
    pub owner: String,
    /// Selects owner documents referencing the deleted id.
    pub filter: Filter,
    /// The repair to apply.
    pub kind: ActionKind,
}

/// Plans repair actions for one (target type, id) deletion.
///
/// Planning is pure: it consults a graph snapshot and performs no I/O.
/// Output order is deterministic (registration order, then declaration
/// order); owner types are disjoint, so the order is not observable.
pub struct CascadePlanner {
    graph: Arc<ReferenceGraph>,
}

impl CascadePlanner {
    /// Create a planner over a graph snapshot.
    pub fn new(graph: Arc<ReferenceGraph>) -> Self {
        Self { graph }
    }

    /// Produce the ordered repair actions for deleting `(target, id)`.
    pub fn plan(&self, target: &str, id: &DocumentId) -> Vec<RepairAction> {
        let actions: Vec<RepairAction> = self
            .graph
            .referrers_to(target)
            .iter()
            .map(|reference| {
                let filter = Filter::eq(reference.kind.match_path(), *id);
                let kind = match &reference.kind {
                    ReferenceKind::Scalar { .. } => ActionKind::DeleteOwner,
                    ReferenceKind::ScalarList { field_path } => ActionKind::PullValue {
                        field_path: field_path.clone(),
                    },
                    ReferenceKind::EmbeddedList {
                        list_path,
                        element_path,
                        order_key,
                    } => ActionKind::RemoveElements {
                        list_path: list_path.clone(),
                        element_path: element_path.clone(),
                        order_key: order_key.clone(),
                    },
                };
                RepairAction {
                    owner: reference.owner.clone(),
                    filter,
                    kind,
                }
            })
            .collect();

        tracing::debug!(target = %target, id = %id, actions = actions.len(), "planned cascade");
        actions
    }
}
