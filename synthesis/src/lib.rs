//! # Course Synthesis
//!
//! This crate rewrites long documents into course chapters using an external
//! generative backend.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Chunked Synthesis                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  text ──► Chunker ──► ChunkTask × N                             │
//! │                          │                                      │
//! │                          ▼                                      │
//! │        JoinSet (≤ max_concurrency) ──► GenerativeBackend        │
//! │                          │                                      │
//! │                          ▼                                      │
//! │        ChunkResult × N (sentinels on failure, index order)      │
//! │                          │                                      │
//! │                          ▼                                      │
//! │        merge call (or local fallback) ──► SynthesizedCourse     │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use coursegen_synthesis::{OpenAiBackend, SynthesisConfig, SynthesisEngine};
//! use tokio_util::sync::CancellationToken;
//!
//! let engine = SynthesisEngine::new(Arc::new(OpenAiBackend::new()), SynthesisConfig::default())?;
//! let course = engine.synthesize(&text, "Lecture 4", &CancellationToken::new()).await?;
//! ```

pub mod backend;
pub mod chunker;
pub mod config;
pub mod content;
pub mod engine;
pub mod error;
pub mod model;
pub mod openai;
pub mod schema;

pub use backend::GenerativeBackend;
pub use chunker::{ChunkTask, Chunker};
pub use config::SynthesisConfig;
pub use content::{ContentGenerator, ContentKind, GeneratedContent};
pub use engine::SynthesisEngine;
pub use error::{BackendError, Result, SynthesisError};
pub use model::{ChunkResult, ChunkSection, CourseSummary, SynthesizedCourse, UNTITLED_COURSE};
pub use openai::OpenAiBackend;
pub use schema::JsonSchema;

// Re-export for callers that drive cancellation
pub use tokio_util::sync::CancellationToken;
