//! Error types for document structuring.

use thiserror::Error;

/// Result type alias for structuring operations.
pub type Result<T> = std::result::Result<T, StructureError>;

/// Errors that can occur while structuring a document.
///
/// Classification ambiguity is never an error: ambiguous blocks resolve to
/// `Paragraph`. Only misconfiguration is rejected.
#[derive(Error, Debug)]
pub enum StructureError {
    /// A classifier threshold is out of range.
    #[error("invalid classifier configuration: {0}")]
    InvalidConfig(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
