//! Textbook conversion: section tree to course outline.
//!
//! Every direct child of the document root opens a subtopic. Sections below
//! it become chapters of that subtopic, except chapter-like sections, which
//! open a new subtopic wherever they appear in the tree. Text that precedes
//! the first heading is kept as a leading subtopic so nothing is dropped.
//!
//! The chapter-like promotion is a title heuristic: a stray "Chapter 3"
//! heading produced from mid-paragraph text yields a subtopic with a single
//! short chapter. That is a precision/recall tradeoff of the heuristic.

use std::fmt;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::kind::SectionKind;
use crate::tree::SectionNode;

/// Identifier of the knowledge item a course was built from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KnowledgeId(String);

impl KnowledgeId {
    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Borrow the identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for KnowledgeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for KnowledgeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for KnowledgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-chapter content statistics.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChapterMetadata {
    /// Whitespace-separated word count.
    pub word_count: usize,

    /// Whether the content contains a fenced code block.
    pub has_code: bool,

    /// Whether the content probably contains equations.
    pub has_equations: bool,

    /// Whether the content contains bulleted lines.
    pub has_bullets: bool,

    /// Estimated reading time, at least one minute.
    pub reading_time_minutes: u32,
}

/// A chapter inside a subtopic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterDraft {
    /// Chapter title.
    pub title: String,

    /// Chapter body text.
    pub content: String,

    /// Purpose of the chapter.
    pub kind: SectionKind,

    /// Heading level the chapter came from (0 for root content).
    pub level: u32,

    /// Content statistics.
    pub metadata: ChapterMetadata,
}

/// A top-level grouping of chapters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subtopic {
    /// Subtopic title.
    pub title: String,

    /// First line of this subtopic in the line-addressable course text.
    pub start_line: u32,

    /// Chapters in reading order.
    pub chapters: Vec<ChapterDraft>,
}

impl Subtopic {
    /// Create an empty subtopic.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            start_line: 0,
            chapters: Vec::new(),
        }
    }
}

/// Topic -> subtopics -> chapters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseOutline {
    /// Course topic.
    pub topic: String,

    /// Knowledge item the course was built from.
    pub knowledge_ref: KnowledgeId,

    /// Subtopics in reading order.
    pub subtopics: Vec<Subtopic>,
}

impl CourseOutline {
    /// Total chapters across all subtopics.
    pub fn chapter_count(&self) -> usize {
        self.subtopics.iter().map(|s| s.chapters.len()).sum()
    }

    /// Whether the outline has no chapters.
    pub fn is_empty(&self) -> bool {
        self.chapter_count() == 0
    }

    /// Recompute `start_line` for every subtopic.
    ///
    /// Each chapter occupies its content lines plus a two-line separator.
    pub fn assign_start_lines(&mut self) {
        let mut line = 0u32;
        for subtopic in &mut self.subtopics {
            subtopic.start_line = line;
            for chapter in &subtopic.chapters {
                line += line_count(&chapter.content) + 2;
            }
        }
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Number of lines in chapter content.
pub fn line_count(content: &str) -> u32 {
    content.lines().count() as u32
}

/// Configuration for textbook conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlineConfig {
    /// Reading speed used for the reading-time estimate.
    pub words_per_minute: u32,
}

impl Default for OutlineConfig {
    fn default() -> Self {
        Self {
            words_per_minute: 200,
        }
    }
}

/// Converts section trees into course outlines.
pub struct TextbookConverter {
    config: OutlineConfig,
    equation_pattern: Option<Regex>,
}

impl Default for TextbookConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl TextbookConverter {
    /// Create a converter with default configuration.
    pub fn new() -> Self {
        Self::with_config(OutlineConfig::default())
    }

    /// Create a converter with custom configuration.
    pub fn with_config(config: OutlineConfig) -> Self {
        Self {
            config,
            equation_pattern: Regex::new(
                r"(?:[A-Za-z0-9)]\s*[=<>≤≥±]\s*[A-Za-z0-9(-])|(?:\d\s*[+*/^×÷]\s*\d)|\\(?:frac|sum|int|sqrt)|[∑∫√π]",
            )
            .ok(),
        }
    }

    /// Build the outline for a document tree.
    pub fn to_outline(
        &self,
        tree: &SectionNode,
        knowledge_ref: KnowledgeId,
        topic_name: &str,
    ) -> CourseOutline {
        let mut subtopics = Vec::new();

        let root_content = tree.content.trim();
        if !root_content.is_empty() {
            let title = if tree.title.trim().is_empty() {
                topic_name
            } else {
                tree.title.trim()
            };
            let mut subtopic = Subtopic::new(title);
            let kind = if tree.children.is_empty() {
                SectionKind::Section
            } else {
                SectionKind::Introduction
            };
            subtopic
                .chapters
                .push(self.draft(title, &tree.content, kind, 0));
            subtopics.push(subtopic);
        }

        for top in &tree.children {
            let mut current = Subtopic::new(top.title.as_str());
            if self.becomes_chapter(top) {
                current.chapters.push(self.draft_from(top));
            }

            let mut worklist: Vec<&SectionNode> = top.children.iter().rev().collect();
            while let Some(node) = worklist.pop() {
                if node.kind.is_chapter_boundary() {
                    push_non_empty(&mut subtopics, current);
                    current = Subtopic::new(node.title.as_str());
                }
                if self.becomes_chapter(node) {
                    current.chapters.push(self.draft_from(node));
                }
                worklist.extend(node.children.iter().rev());
            }

            push_non_empty(&mut subtopics, current);
        }

        let mut outline = CourseOutline {
            topic: topic_name.to_string(),
            knowledge_ref,
            subtopics,
        };
        outline.assign_start_lines();

        debug!(
            "Outline for {:?}: {} subtopics, {} chapters",
            outline.topic,
            outline.subtopics.len(),
            outline.chapter_count()
        );
        outline
    }

    /// Compute content statistics for chapter text.
    pub fn metadata(&self, content: &str) -> ChapterMetadata {
        let word_count = content.split_whitespace().count();
        let wpm = self.config.words_per_minute.max(1) as f64;
        let reading_time_minutes = ((word_count as f64 / wpm).round() as u32).max(1);

        ChapterMetadata {
            word_count,
            has_code: content.contains("```"),
            has_equations: self
                .equation_pattern
                .as_ref()
                .is_some_and(|re| re.is_match(content)),
            has_bullets: content.lines().any(|line| {
                let t = line.trim_start();
                t.starts_with("- ") || t.starts_with("* ") || t.starts_with("• ")
            }),
            reading_time_minutes,
        }
    }

    /// Sections with content become chapters; so do bare leaf headings.
    fn becomes_chapter(&self, node: &SectionNode) -> bool {
        !node.content.trim().is_empty() || node.children.is_empty()
    }

    fn draft_from(&self, node: &SectionNode) -> ChapterDraft {
        self.draft(&node.title, &node.content, node.kind, node.level)
    }

    fn draft(&self, title: &str, content: &str, kind: SectionKind, level: u32) -> ChapterDraft {
        ChapterDraft {
            title: title.trim().to_string(),
            content: content.to_string(),
            kind,
            level,
            metadata: self.metadata(content),
        }
    }
}

fn push_non_empty(subtopics: &mut Vec<Subtopic>, subtopic: Subtopic) {
    if !subtopic.chapters.is_empty() {
        subtopics.push(subtopic);
    }
}

/// Build an outline with the default converter.
pub fn to_outline(
    tree: &SectionNode,
    knowledge_ref: KnowledgeId,
    topic_name: &str,
) -> CourseOutline {
    TextbookConverter::new().to_outline(tree, knowledge_ref, topic_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kid() -> KnowledgeId {
        KnowledgeId::from("kn-1")
    }

    #[test]
    fn test_root_content_only_is_preserved() {
        let tree =
            SectionNode::root("Lecture 4").with_content("Everything said in class.\nLine two.");
        let outline = to_outline(&tree, kid(), "Physics");

        assert_eq!(outline.subtopics.len(), 1);
        assert_eq!(outline.subtopics[0].title, "Lecture 4");
        assert_eq!(outline.subtopics[0].chapters.len(), 1);
        assert_eq!(
            outline.subtopics[0].chapters[0].content,
            "Everything said in class.\nLine two."
        );
    }

    #[test]
    fn test_untitled_root_uses_topic_name() {
        let tree = SectionNode::root("").with_content("text");
        let outline = to_outline(&tree, kid(), "Physics");
        assert_eq!(outline.subtopics[0].title, "Physics");
    }

    #[test]
    fn test_empty_tree_gives_empty_outline() {
        let outline = to_outline(&SectionNode::root("Doc"), kid(), "Topic");
        assert!(outline.is_empty());
        assert!(outline.subtopics.is_empty());
    }

    #[test]
    fn test_children_nest_as_chapters() {
        let tree = SectionNode::root("Doc").with_child(
            SectionNode::heading("Basics", 1)
                .with_content("basic text")
                .with_child(SectionNode::heading("1.1 Terms", 2).with_content("terms"))
                .with_child(SectionNode::heading("1.2 Rules", 2).with_content("rules")),
        );
        let outline = to_outline(&tree, kid(), "Topic");

        assert_eq!(outline.subtopics.len(), 1);
        let titles: Vec<&str> = outline.subtopics[0]
            .chapters
            .iter()
            .map(|c| c.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Basics", "1.1 Terms", "1.2 Rules"]);
    }

    #[test]
    fn test_chapter_like_nodes_are_promoted() {
        let tree = SectionNode::root("Doc").with_child(
            SectionNode::heading("Part One", 1)
                .with_child(SectionNode::heading("Chapter 1 Sets", 2).with_content("sets"))
                .with_child(SectionNode::heading("Chapter 2 Maps", 2).with_content("maps"))
                .with_child(SectionNode::heading("Notes", 3).with_content("notes")),
        );
        let outline = to_outline(&tree, kid(), "Topic");

        let titles: Vec<&str> = outline.subtopics.iter().map(|s| s.title.as_str()).collect();
        // "Part One" has no content of its own, so its subtopic stays empty and is dropped.
        assert_eq!(titles, vec!["Chapter 1 Sets", "Chapter 2 Maps"]);
        assert_eq!(outline.subtopics[1].chapters.len(), 2);
        assert_eq!(outline.subtopics[1].chapters[1].title, "Notes");
    }

    #[test]
    fn test_preamble_becomes_leading_subtopic() {
        let tree = SectionNode::root("Doc")
            .with_content("preamble")
            .with_child(SectionNode::heading("A", 1).with_content("alpha"));
        let outline = to_outline(&tree, kid(), "Topic");

        assert_eq!(outline.subtopics.len(), 2);
        assert_eq!(outline.subtopics[0].chapters[0].kind, SectionKind::Introduction);
        assert_eq!(outline.subtopics[1].title, "A");
    }

    #[test]
    fn test_start_lines_accumulate() {
        let tree = SectionNode::root("Doc")
            .with_child(SectionNode::heading("A", 1).with_content("l1\nl2\nl3"))
            .with_child(SectionNode::heading("B", 1).with_content("x"))
            .with_child(SectionNode::heading("C", 1).with_content("y"));
        let outline = to_outline(&tree, kid(), "Topic");

        let starts: Vec<u32> = outline.subtopics.iter().map(|s| s.start_line).collect();
        assert_eq!(starts, vec![0, 5, 8]);
    }

    #[test]
    fn test_metadata() {
        let converter = TextbookConverter::new();
        let content = format!(
            "{}\n- a bullet\n```rust\nlet x = 1;\n```\nwhere x = 2 + 3",
            "word ".repeat(500)
        );
        let meta = converter.metadata(&content);

        assert!(meta.word_count > 500);
        assert!(meta.has_code);
        assert!(meta.has_bullets);
        assert!(meta.has_equations);
        assert_eq!(meta.reading_time_minutes, 3);
    }

    #[test]
    fn test_metadata_minimums() {
        let meta = TextbookConverter::new().metadata("just prose here");
        assert_eq!(meta.word_count, 3);
        assert_eq!(meta.reading_time_minutes, 1);
        assert!(!meta.has_code);
        assert!(!meta.has_equations);
        assert!(!meta.has_bullets);
    }
}
