//! Section tree assembly from classified blocks.
//!
//! Headings open sections; everything else is buffered as content of the
//! innermost open section. Open sections live on an explicit stack of owned
//! nodes: closing a section pops it and appends it to the new top, so a
//! node's children are attached in reading order without shared mutable
//! references into the tree.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::block::{Block, BlockRole};
use crate::kind::SectionKind;

/// A node in the hierarchical document tree.
///
/// The root represents the whole document: its `title` is the document
/// title, its `level` is 0 and its `content` is any text that precedes the
/// first heading.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SectionNode {
    /// Heading text (document title for the root).
    pub title: String,

    /// Body text directly under this heading, excluding child sections.
    pub content: String,

    /// Heading level. 0 for the root.
    pub level: u32,

    /// Nested sections in reading order.
    #[serde(default)]
    pub children: Vec<SectionNode>,

    /// Purpose of the section.
    #[serde(default)]
    pub kind: SectionKind,
}

impl SectionNode {
    /// Create a document root.
    pub fn root(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Create a section for a heading, classifying its kind from the title.
    pub fn heading(title: impl Into<String>, level: u32) -> Self {
        let title = title.into();
        let kind = SectionKind::from_title(&title);
        Self {
            title,
            content: String::new(),
            level,
            children: Vec::new(),
            kind,
        }
    }

    /// Set the content.
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Append a child section.
    pub fn with_child(mut self, child: SectionNode) -> Self {
        self.children.push(child);
        self
    }

    /// Whether the node has neither content nor children.
    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty() && self.children.is_empty()
    }

    /// All descendants in pre-order (reading order), excluding `self`.
    pub fn descendants(&self) -> Vec<&SectionNode> {
        let mut out = Vec::new();
        let mut worklist: Vec<&SectionNode> = self.children.iter().rev().collect();
        while let Some(node) = worklist.pop() {
            out.push(node);
            worklist.extend(node.children.iter().rev());
        }
        out
    }

    /// Number of sections below this node.
    pub fn section_count(&self) -> usize {
        self.descendants().len()
    }

    /// Render the tree back into markdown.
    pub fn to_markdown(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if !self.title.trim().is_empty() {
            parts.push(format!("# {}", self.title.trim()));
        }
        if !self.content.trim().is_empty() {
            parts.push(self.content.trim().to_string());
        }
        for node in self.descendants() {
            let hashes = "#".repeat((node.level as usize + 1).clamp(2, 6));
            parts.push(format!("{hashes} {}", node.title.trim()));
            if !node.content.trim().is_empty() {
                parts.push(node.content.trim().to_string());
            }
        }
        parts.join("\n\n")
    }
}

/// Stack of open sections, seeded with the document root.
///
/// Shared by the block tree builder and the plain-text parser.
#[derive(Debug)]
pub struct SectionStack {
    open: Vec<SectionNode>,
    buffer: Vec<String>,
}

impl SectionStack {
    /// Start a new document with the given title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            open: vec![SectionNode::root(title)],
            buffer: Vec::new(),
        }
    }

    /// Set the document title unless one is already set.
    pub fn set_title_once(&mut self, title: &str) -> bool {
        let Some(root) = self.open.first_mut() else {
            return false;
        };
        if root.title.trim().is_empty() && !title.trim().is_empty() {
            root.title = title.trim().to_string();
            true
        } else {
            false
        }
    }

    /// Buffer a line of content for the innermost open section.
    pub fn push_text(&mut self, text: &str) {
        self.buffer.push(text.to_string());
    }

    /// Open a new section at `level`, closing every open section at the same
    /// or a deeper level first. The root is never closed.
    pub fn open_heading(&mut self, title: &str, level: u32) {
        self.flush();
        while self.open.len() > 1 && self.top_level() >= level {
            self.close_top();
        }
        self.open.push(SectionNode::heading(title.trim(), level));
    }

    /// Close every open section and return the root.
    pub fn finish(mut self) -> SectionNode {
        self.flush();
        while self.open.len() > 1 {
            self.close_top();
        }
        self.open.pop().unwrap_or_default()
    }

    fn top_level(&self) -> u32 {
        self.open.last().map(|n| n.level).unwrap_or(0)
    }

    fn close_top(&mut self) {
        if let Some(node) = self.open.pop() {
            if let Some(parent) = self.open.last_mut() {
                parent.children.push(node);
            }
        }
    }

    fn flush(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let text = self.buffer.join("\n");
        self.buffer.clear();

        let text = text.trim();
        if text.is_empty() {
            return;
        }
        if let Some(node) = self.open.last_mut() {
            if node.content.is_empty() {
                node.content = text.to_string();
            } else {
                node.content.push_str("\n\n");
                node.content.push_str(text);
            }
        }
    }
}

/// Build a section tree from blocks that were already classified.
pub fn build_tree(blocks: &[Block]) -> SectionNode {
    let mut stack = SectionStack::new("");

    for block in blocks {
        let text = block.text.trim();
        match block.role {
            BlockRole::Title => {
                stack.set_title_once(text);
            }
            BlockRole::Heading => stack.open_heading(text, block.level),
            _ => {
                if !text.is_empty() {
                    stack.push_text(text);
                }
            }
        }
    }

    let root = stack.finish();
    debug!(
        "Built section tree: {} top-level sections, {} total",
        root.children.len(),
        root.section_count()
    );
    root
}
