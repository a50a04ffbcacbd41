//! # Document Structure
//!
//! This crate turns extracted document content into a navigable course
//! outline. Everything here is synchronous and CPU-only.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Document Structuring                         │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  Vec<Block> ──► StructureClassifier ──► build_tree ─┐           │
//! │                                                     ▼           │
//! │  plain text ──────────► TextParser ──────────► SectionNode      │
//! │                                                     │           │
//! │                                                     ▼           │
//! │              TextbookConverter ──► CourseOutline ──► flatten    │
//! │                                                     │           │
//! │                                                     ▼           │
//! │                                           Vec<ChapterRecord>    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use coursegen_structure::{build_tree, flatten, to_outline, KnowledgeId, StructureClassifier};
//!
//! let classifier = StructureClassifier::new();
//! classifier.classify(&mut blocks);
//! let tree = build_tree(&blocks);
//! let outline = to_outline(&tree, KnowledgeId::generate(), "Calculus");
//! let records = flatten(&outline);
//! ```

pub mod block;
pub mod classifier;
pub mod error;
pub mod flatten;
pub mod kind;
pub mod outline;
pub mod text_parser;
pub mod tree;

pub use block::{Block, BlockRole, Position};
pub use classifier::{ClassifierConfig, FontStatistics, StructureClassifier};
pub use error::{Result, StructureError};
pub use flatten::{flatten, ChapterRecord};
pub use kind::SectionKind;
pub use outline::{
    line_count, to_outline, ChapterDraft, ChapterMetadata, CourseOutline, KnowledgeId,
    OutlineConfig, Subtopic, TextbookConverter,
};
pub use text_parser::{parse_text, HeadingMatch, TextParser};
pub use tree::{build_tree, SectionNode, SectionStack};
