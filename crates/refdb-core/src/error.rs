//! Core error types.

use thiserror::Error;

/// Schema registration errors.
///
/// These are raised while the hosting application declares its document
/// types, before any delete is processed. They are fatal at startup and are
/// never produced by cascade execution.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    /// A document type was registered twice.
    #[error("document type '{0}' is already registered")]
    DuplicateType(String),

    /// Two declarations in one type resolve to the same field path.
    #[error("duplicate field path '{path}' in document type '{doc_type}'")]
    DuplicateFieldPath {
        /// Document type being registered.
        doc_type: String,
        /// The colliding field path.
        path: String,
    },

    /// A declaration has an empty field path.
    #[error("empty field path in document type '{0}'")]
    EmptyFieldPath(String),

    /// An embedded declaration carries no nested declarations.
    #[error("embedded declaration '{path}' in document type '{doc_type}' has no nested declarations")]
    EmptyNestedSet {
        /// Document type being registered.
        doc_type: String,
        /// Field path of the embedded declaration.
        path: String,
    },

    /// An embedded-list declaration is missing its order key.
    #[error("embedded-list declaration '{path}' in document type '{doc_type}' is missing an order key")]
    MissingOrderKey {
        /// Document type being registered.
        doc_type: String,
        /// Field path of the embedded-list declaration.
        path: String,
    },
}

/// Store driver errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error from the underlying store.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Backend-specific failure.
    #[error("store backend error: {0}")]
    Backend(String),

    /// A stored document could not be decoded.
    #[error("corrupt document: {0}")]
    Corrupt(String),
}

impl From<sled::Error> for StoreError {
    fn from(e: sled::Error) -> Self {
        StoreError::Backend(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Corrupt(e.to_string())
    }
}
