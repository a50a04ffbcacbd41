//! The block model shared by all format extractors.
//!
//! A `Block` is a span of text together with the formatting metadata an
//! extractor could recover for it. Extractors hand over blocks already in
//! reading order; the classifier only ever touches `role` and `level`.

use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box of a block on its page, `(x0, y0, x1, y1)`.
pub type Position = (f64, f64, f64, f64);

/// Semantic role assigned to a block by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockRole {
    /// Not yet classified.
    #[default]
    Normal,
    /// The document title. At most one per document.
    Title,
    /// A section heading; see `Block::level`.
    Heading,
    /// A bulleted or numbered list entry.
    ListItem,
    /// Body text.
    Paragraph,
}

/// A span of text with formatting metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// The text content.
    pub text: String,

    /// Font size in points. Non-positive sizes mean "unknown".
    pub font_size: f64,

    /// Font family name as reported by the extractor.
    #[serde(default)]
    pub font_name: String,

    /// Whether the span is set in a bold face.
    #[serde(default)]
    pub is_bold: bool,

    /// Whether the span is set in an italic face.
    #[serde(default)]
    pub is_italic: bool,

    /// RGB color packed as `0xRRGGBB`.
    #[serde(default)]
    pub color: u32,

    /// Bounding box on the page.
    #[serde(default)]
    pub position: Position,

    /// Zero-based page (or slide) index.
    #[serde(default)]
    pub page_index: u32,

    /// Role assigned by the classifier.
    #[serde(default)]
    pub role: BlockRole,

    /// Heading level (1 = top). Zero for non-headings.
    #[serde(default)]
    pub level: u32,
}

impl Block {
    /// Create an unclassified block with the given text and font size.
    pub fn new(text: impl Into<String>, font_size: f64) -> Self {
        Self {
            text: text.into(),
            font_size,
            font_name: String::new(),
            is_bold: false,
            is_italic: false,
            color: 0,
            position: (0.0, 0.0, 0.0, 0.0),
            page_index: 0,
            role: BlockRole::Normal,
            level: 0,
        }
    }

    /// Mark the block as bold.
    pub fn bold(mut self) -> Self {
        self.is_bold = true;
        self
    }

    /// Set the font name.
    pub fn with_font(mut self, font_name: impl Into<String>) -> Self {
        self.font_name = font_name.into();
        self
    }

    /// Set the page index.
    pub fn on_page(mut self, page_index: u32) -> Self {
        self.page_index = page_index;
        self
    }

    /// Set the bounding box.
    pub fn at(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    /// Whether the classifier marked this block as the document title.
    pub fn is_title(&self) -> bool {
        self.role == BlockRole::Title
    }
}
