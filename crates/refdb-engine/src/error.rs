//! Engine error types.

use thiserror::Error;

/// Cascade engine errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid schema declaration (startup-time only).
    #[error("schema error: {0}")]
    Schema(#[from] refdb_core::SchemaError),

    /// A store operation failed during planning or execution. The cascade
    /// is left partially applied; retrying the same delete converges.
    #[error("store error during cascade: {0}")]
    Store(#[from] refdb_core::StoreError),

    /// The delete was cancelled between cascade steps. Already-applied
    /// mutations are retained.
    #[error("cascade delete cancelled")]
    Cancelled,

    /// The transitive cascade exceeded the configured depth bound.
    #[error("cascade depth {depth} exceeds the configured maximum")]
    MaxDepthExceeded {
        /// Depth at which the cascade was cut off.
        depth: usize,
    },
}
