//! The derived reference graph: a reverse index from target types to the
//! places that refer to them.

use std::collections::HashMap;

use super::join_path;
use super::registry::SchemaRegistry;
use super::shape::{ContainerShape, ReferenceDeclaration};

/// How a reference to a target type is ultimately reached within an owner
/// document, after collapsing embedded-single hops into dotted paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceKind {
    /// A scalar id field, required or optional, possibly inside embedded
    /// sub-documents. A match ties the owner document's lifetime to the
    /// referenced document.
    Scalar {
        /// Full dotted path from the document root.
        field_path: String,
    },
    /// A list of id values, possibly inside embedded sub-documents.
    ScalarList {
        /// Full dotted path from the document root.
        field_path: String,
    },
    /// A reference inside the elements of an embedded list. The first list
    /// hop on the path owns the repair: matching elements are removed and
    /// the survivors' order key is renumbered.
    EmbeddedList {
        /// Dotted path from the document root to the list field.
        list_path: String,
        /// Dotted path from a list element to the id field.
        element_path: String,
        /// Element field holding the dense 0-based position.
        order_key: String,
    },
}

impl ReferenceKind {
    /// Full dotted path from the document root to the referencing id field.
    pub fn match_path(&self) -> String {
        match self {
            ReferenceKind::Scalar { field_path } | ReferenceKind::ScalarList { field_path } => {
                field_path.clone()
            }
            ReferenceKind::EmbeddedList {
                list_path,
                element_path,
                ..
            } => format!("{list_path}.{element_path}"),
        }
    }
}

/// One (owner type, resolved reference) pair pointing at a target type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedReference {
    /// Document type holding the reference.
    pub owner: String,
    /// Where and how the reference is stored.
    pub kind: ReferenceKind,
}

/// Immutable reverse index `target type -> [(owner, resolved reference)]`.
///
/// A pure function of the registry: no I/O, deterministic, safe to cache.
/// Iteration order is registration order, then declaration order.
#[derive(Debug, Default)]
pub struct ReferenceGraph {
    by_target: HashMap<String, Vec<ResolvedReference>>,
}

impl ReferenceGraph {
    /// Build the graph from a registry.
    pub fn build(registry: &SchemaRegistry) -> Self {
        let mut graph = Self::default();
        for owner in registry.types() {
            for decl in registry.declarations_for(owner) {
                graph.walk(owner, "", decl);
            }
        }
        graph
    }

    /// Every resolved reference that can point at the given target type.
    pub fn referrers_to(&self, target: &str) -> &[ResolvedReference] {
        self.by_target
            .get(target)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Number of distinct target types referenced anywhere.
    pub fn target_count(&self) -> usize {
        self.by_target.len()
    }

    fn walk(&mut self, owner: &str, prefix: &str, decl: &ReferenceDeclaration) {
        let path = join_path(prefix, &decl.field_path);
        match &decl.shape {
            ContainerShape::Scalar | ContainerShape::OptionalScalar => {
                self.record(
                    &decl.target,
                    owner,
                    ReferenceKind::Scalar { field_path: path },
                );
            }
            ContainerShape::ScalarList => {
                self.record(
                    &decl.target,
                    owner,
                    ReferenceKind::ScalarList { field_path: path },
                );
            }
            ContainerShape::EmbeddedSingle { nested } => {
                for inner in nested {
                    self.walk(owner, &path, inner);
                }
            }
            ContainerShape::EmbeddedList { nested, order_key } => {
                for inner in nested {
                    self.walk_element(owner, &path, "", inner, order_key);
                }
            }
        }
    }

    /// Walk declarations below the first embedded-list hop. Everything here
    /// is element-scoped: a match removes the outer list element.
    fn walk_element(
        &mut self,
        owner: &str,
        list_path: &str,
        element_prefix: &str,
        decl: &ReferenceDeclaration,
        order_key: &str,
    ) {
        let element_path = join_path(element_prefix, &decl.field_path);
        match &decl.shape {
            ContainerShape::Scalar
            | ContainerShape::OptionalScalar
            | ContainerShape::ScalarList => {
                self.record(
                    &decl.target,
                    owner,
                    ReferenceKind::EmbeddedList {
                        list_path: list_path.to_string(),
                        element_path,
                        order_key: order_key.to_string(),
                    },
                );
            }
            ContainerShape::EmbeddedSingle { nested } => {
                for inner in nested {
                    self.walk_element(owner, list_path, &element_path, inner, order_key);
                }
            }
            // An inner list stays scoped to the outermost list hop.
            ContainerShape::EmbeddedList { nested, .. } => {
                for inner in nested {
                    self.walk_element(owner, list_path, &element_path, inner, order_key);
                }
            }
        }
    }

    fn record(&mut self, target: &str, owner: &str, kind: ReferenceKind) {
        self.by_target
            .entry(target.to_string())
            .or_default()
            .push(ResolvedReference {
                owner: owner.to_string(),
                kind,
            });
    }
}
