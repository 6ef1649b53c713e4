//! Projection and lookup error types.

use thiserror::Error;

/// Errors that can occur while looking records up.
///
/// Projecting a record never fails; these errors come from the store or
/// from records that do not have the expected shape.
#[derive(Debug, Error)]
pub enum ProjectionError {
    /// An error occurred in the document store.
    #[error("Document store error: {0}")]
    DocumentStore(#[from] document_store::DocumentStoreError),

    /// A stored record could not be read as the expected type.
    #[error("Deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),

    /// An export window was malformed.
    #[error("Invalid date window: {0}")]
    InvalidWindow(String),

    /// A snapshot date was malformed.
    #[error("Invalid date: {0}")]
    InvalidDate(String),
}

/// Result type for projection operations.
pub type Result<T> = std::result::Result<T, ProjectionError>;
