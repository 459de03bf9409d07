//! Schema registry: per-type reference declarations.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;

use super::graph::ReferenceGraph;
use super::join_path;
use super::shape::{ContainerShape, ReferenceDeclaration};
use crate::error::SchemaError;

/// Holds, per document type, the declared reference fields and their
/// container shapes.
///
/// Entries are created at process start (or on schema load) and are
/// read-only thereafter. The derived [`ReferenceGraph`] is cached and
/// invalidated whenever a registration changes the registry. Target types
/// may be registered after the types referring to them; the graph only has
/// to be complete before the first delete runs.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    /// Type names in registration order (graph iteration is deterministic).
    order: Vec<String>,
    declarations: HashMap<String, Vec<ReferenceDeclaration>>,
    version: u64,
    graph: RwLock<Option<(u64, Arc<ReferenceGraph>)>>,
}

impl SchemaRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a document type with its reference declarations.
    ///
    /// Validates the declaration set recursively: field paths must be
    /// non-empty and unambiguous within the type, embedded declarations
    /// must carry a non-empty nested set, and embedded lists must name an
    /// order key. Violations are startup-time fatal.
    pub fn register(
        &mut self,
        doc_type: impl Into<String>,
        declarations: Vec<ReferenceDeclaration>,
    ) -> Result<(), SchemaError> {
        let doc_type = doc_type.into();
        if self.declarations.contains_key(&doc_type) {
            return Err(SchemaError::DuplicateType(doc_type));
        }

        let mut seen_paths = HashSet::new();
        validate_declarations(&doc_type, &declarations, "", &mut seen_paths)?;

        tracing::debug!(
            doc_type = %doc_type,
            declarations = declarations.len(),
            "registered document type"
        );

        self.order.push(doc_type.clone());
        self.declarations.insert(doc_type, declarations);
        self.version += 1;
        Ok(())
    }

    /// Registered type names, in registration order.
    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Declarations for a type (empty for unknown types).
    pub fn declarations_for(&self, doc_type: &str) -> &[ReferenceDeclaration] {
        self.declarations
            .get(doc_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Check whether a type is registered.
    pub fn contains(&self, doc_type: &str) -> bool {
        self.declarations.contains_key(doc_type)
    }

    /// The derived reference graph for the current registry contents.
    ///
    /// Built lazily and cached; rebuilt only after a registration changed
    /// the registry.
    pub fn graph(&self) -> Arc<ReferenceGraph> {
        if let Some((version, graph)) = self.graph.read().as_ref() {
            if *version == self.version {
                return Arc::clone(graph);
            }
        }

        let graph = Arc::new(ReferenceGraph::build(self));
        *self.graph.write() = Some((self.version, Arc::clone(&graph)));
        graph
    }
}

fn validate_declarations(
    doc_type: &str,
    declarations: &[ReferenceDeclaration],
    prefix: &str,
    seen_paths: &mut HashSet<String>,
) -> Result<(), SchemaError> {
    for decl in declarations {
        if decl.field_path.is_empty() {
            return Err(SchemaError::EmptyFieldPath(doc_type.to_string()));
        }

        let path = join_path(prefix, &decl.field_path);
        if !seen_paths.insert(path.clone()) {
            return Err(SchemaError::DuplicateFieldPath {
                doc_type: doc_type.to_string(),
                path,
            });
        }

        match &decl.shape {
            ContainerShape::EmbeddedSingle { nested } => {
                if nested.is_empty() {
                    return Err(SchemaError::EmptyNestedSet {
                        doc_type: doc_type.to_string(),
                        path,
                    });
                }
                validate_declarations(doc_type, nested, &path, seen_paths)?;
            }
            ContainerShape::EmbeddedList { nested, order_key } => {
                if order_key.is_empty() {
                    return Err(SchemaError::MissingOrderKey {
                        doc_type: doc_type.to_string(),
                        path,
                    });
                }
                if nested.is_empty() {
                    return Err(SchemaError::EmptyNestedSet {
                        doc_type: doc_type.to_string(),
                        path,
                    });
                }
                validate_declarations(doc_type, nested, &path, seen_paths)?;
            }
            _ => {}
        }
    }
    Ok(())
}
