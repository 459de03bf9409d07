//! refdb core - document model, schema registry, reference graph, and
//! store drivers.
//!
//! This crate provides everything below the cascade engine: the
//! schema-flexible document model, the explicit reference-declaration
//! registry with its derived reverse graph, and the asynchronous store
//! driver boundary with in-memory and sled-backed implementations.

pub mod document;
pub mod error;
pub mod id;
pub mod schema;
pub mod store;
pub mod value;

pub use document::{Document, ID_FIELD};
pub use error::{SchemaError, StoreError};
pub use id::DocumentId;
pub use schema::{
    ContainerShape, ReferenceDeclaration, ReferenceGraph, ReferenceKind, ResolvedReference,
    SchemaRegistry,
};
pub use store::{Filter, MemoryStore, Mutation, SledStore, StoreDriver};
pub use value::Value;
