//! Document-level input and metadata.

use std::path::Path;

use coursegen_structure::{Block, KnowledgeId};
use serde::{Deserialize, Serialize};

/// Source format of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    /// PDF document.
    Pdf,
    /// Word document.
    Docx,
    /// PowerPoint deck.
    Pptx,
    /// Video or lecture transcript.
    Transcript,
    /// Markdown text.
    Markdown,
    /// Plain text.
    PlainText,
}

impl SourceFormat {
    /// Guess the format from a file extension.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "pdf" => Self::Pdf,
            "docx" => Self::Docx,
            "pptx" => Self::Pptx,
            "vtt" | "srt" => Self::Transcript,
            "md" | "markdown" => Self::Markdown,
            _ => Self::PlainText,
        }
    }

    /// Whether extraction for this format yields formatted blocks.
    pub fn has_layout(self) -> bool {
        matches!(self, Self::Pdf | Self::Docx | Self::Pptx)
    }
}

/// Metadata handed to storage alongside the chapter records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Document title.
    pub title: String,

    /// Author, if known.
    pub author: Option<String>,

    /// Page or slide count, if known.
    pub page_count: Option<u32>,

    /// Source format.
    pub source_format: SourceFormat,

    /// Knowledge item the document belongs to.
    pub knowledge_id: KnowledgeId,
}

impl DocumentMetadata {
    /// Create metadata with a fresh knowledge id.
    pub fn new(title: impl Into<String>, source_format: SourceFormat) -> Self {
        Self {
            title: title.into(),
            author: None,
            page_count: None,
            source_format,
            knowledge_id: KnowledgeId::generate(),
        }
    }

    /// Derive title and format from a file path.
    pub fn from_path(path: &Path) -> Self {
        let title = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .replace(['_', '-'], " ");
        Self::new(title.trim(), SourceFormat::from_path(path))
    }

    /// Set the author.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Set the page count.
    pub fn with_page_count(mut self, page_count: u32) -> Self {
        self.page_count = Some(page_count);
        self
    }

    /// Set the knowledge id.
    pub fn with_knowledge_id(mut self, knowledge_id: impl Into<KnowledgeId>) -> Self {
        self.knowledge_id = knowledge_id.into();
        self
    }
}

/// Extracted document content.
#[derive(Debug, Clone)]
pub enum DocumentInput {
    /// Blocks with formatting metadata, in reading order.
    Blocks(Vec<Block>),
    /// Raw text without formatting metadata.
    Text(String),
}

impl DocumentInput {
    /// Whether there is nothing to process.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Blocks(blocks) => blocks.iter().all(|b| b.text.trim().is_empty()),
            Self::Text(text) => text.trim().is_empty(),
        }
    }
}

impl From<Vec<Block>> for DocumentInput {
    fn from(blocks: Vec<Block>) -> Self {
        Self::Blocks(blocks)
    }
}

impl From<String> for DocumentInput {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for DocumentInput {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}
