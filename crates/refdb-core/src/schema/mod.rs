//! Schema registry and the derived reference graph.

mod graph;
mod registry;
mod shape;

pub use graph::{ReferenceGraph, ReferenceKind, ResolvedReference};
pub use registry::SchemaRegistry;
pub use shape::{ContainerShape, ReferenceDeclaration};

/// Join a dotted path prefix with one more segment.
pub(crate) fn join_path(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{prefix}.{segment}")
    }
}
