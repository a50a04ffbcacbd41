//! Error types for the course pipeline.

use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that can occur in the course pipeline.
///
/// Backend failures during synthesis never show up here: they degrade the
/// output instead.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Structuring error.
    #[error("structure error: {0}")]
    Structure(#[from] coursegen_structure::StructureError),

    /// Synthesis error (invalid configuration, cancellation).
    #[error("synthesis error: {0}")]
    Synthesis(#[from] coursegen_synthesis::SynthesisError),

    /// A synthesis operation was requested without a generative backend.
    #[error("no generative backend configured")]
    BackendUnavailable,

    /// Configuration file could not be parsed.
    #[error("configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Whether the caller cancelled the run.
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            Self::Synthesis(coursegen_synthesis::SynthesisError::Cancelled)
        )
    }
}
