//! refdb engine - cascading referential integrity for document stores.
//!
//! Given a declared reference graph between document collections (see
//! `refdb_core::SchemaRegistry`), deleting a document transitively removes
//! or repairs every other document that refers to it. The repair policy
//! depends on where the reference lives: a scalar field (required or
//! optional) ties the owner's lifetime to the referenced document, a value
//! in a scalar list is pulled, and an embedded-list element holding the
//! reference is removed with its siblings' order key renumbered.
//!
//! The engine assumes no cross-collection transactions: every action is
//! independently idempotent and a failed or cancelled delete converges when
//! retried with the same arguments.

pub mod cascade;
pub mod delete;
pub mod error;
pub mod plan;

pub use cascade::CascadeExecutor;
pub use delete::{CancelToken, DeleteOrchestrator, DeleteOutcome};
pub use error::Error;
pub use plan::{ActionKind, CascadePlanner, RepairAction};
