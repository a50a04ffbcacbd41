//! # Course Pipeline
//!
//! This crate wires document structuring and chunked synthesis into one
//! handle that is constructed at startup and shared by every request.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use coursegen_pipeline::{CoursePipeline, DocumentMetadata, SourceFormat};
//! use coursegen_synthesis::{CancellationToken, OpenAiBackend};
//!
//! let pipeline = CoursePipeline::builder()
//!     .with_backend(Arc::new(OpenAiBackend::new()))
//!     .build()?;
//!
//! let metadata = DocumentMetadata::new("Lecture 4", SourceFormat::Transcript);
//! let structured = pipeline.structure(transcript.as_str(), &metadata);
//! let synthesized = pipeline
//!     .synthesize(&transcript, &metadata, &CancellationToken::new())
//!     .await?;
//! ```

pub mod config;
pub mod document;
pub mod error;
pub mod pipeline;

pub use config::PipelineConfig;
pub use document::{DocumentInput, DocumentMetadata, SourceFormat};
pub use error::{PipelineError, Result};
pub use pipeline::{
    CoursePipeline, CoursePipelineBuilder, EnrichedDocument, StructuredDocument,
    SynthesizedDocument,
};
