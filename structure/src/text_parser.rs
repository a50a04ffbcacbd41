//! Fallback parser for text without formatting metadata.
//!
//! Transcripts and plain markdown carry no font information, so headings are
//! recognized line by line from text patterns alone. The first matching
//! pattern wins; markdown markup is checked first because it is an explicit
//! signal. Page-number lines are dropped. Lines inside fenced code blocks are
//! always content.

use regex_lite::Regex;
use tracing::debug;

use crate::kind::is_title_phrase;
use crate::tree::{SectionNode, SectionStack};

/// How a heading pattern derives the level.
#[derive(Debug, Clone, Copy)]
enum LevelRule {
    /// Number of leading `#` characters.
    MarkdownHashes,
    /// Dots in the numeric prefix + 1.
    DottedNumber,
    /// Constant level.
    Fixed(u32),
}

struct LinePattern {
    regex: Regex,
    rule: LevelRule,
    /// The text after the prefix must read like a title.
    title_phrase: bool,
}

/// A recognized heading line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingMatch {
    /// Heading text with markdown markup removed.
    pub title: String,
    /// Heading level.
    pub level: u32,
}

/// Line-oriented heading parser for plain text.
pub struct TextParser {
    patterns: Vec<LinePattern>,
    page_number: Option<Regex>,
    max_heading_chars: usize,
}

impl Default for TextParser {
    fn default() -> Self {
        Self::new()
    }
}

impl TextParser {
    /// Create a parser with the standard pattern families.
    pub fn new() -> Self {
        let families: [(&str, LevelRule, bool); 6] = [
            (r"^(#{1,6})\s+(.+?)(?:\s+#+)?\s*$", LevelRule::MarkdownHashes, false),
            (r"(?i)^chapter\s+(\d+|[ivxlc]+)\b", LevelRule::Fixed(1), false),
            (r"(?i)^section\s+(\d+(?:\.\d+)*)\b", LevelRule::Fixed(2), false),
            (r"^(\d+(?:\.\d+)+)\.?\s+[A-Z]", LevelRule::DottedNumber, false),
            (r"^([IVXLC]+|[A-Z])\.\s+[A-Z]", LevelRule::Fixed(1), true),
            (
                r"(?i)^(introduction|conclusion|conclusions|summary|overview|preface|abstract|references|bibliography|exercises|appendix|glossary|key takeaways)\s*:?$",
                LevelRule::Fixed(1),
                false,
            ),
        ];

        let patterns = families
            .into_iter()
            .filter_map(|(pattern, rule, title_phrase)| {
                Regex::new(pattern).ok().map(|regex| LinePattern {
                    regex,
                    rule,
                    title_phrase,
                })
            })
            .collect();

        Self {
            patterns,
            page_number: Regex::new(r"(?i)^(?:page\s+\d+(?:\s+of\s+\d+)?|\d+)$").ok(),
            max_heading_chars: 100,
        }
    }

    /// Set the maximum length for non-markdown headings.
    pub fn with_max_heading_chars(mut self, max: usize) -> Self {
        self.max_heading_chars = max;
        self
    }

    /// Whether the line is only a page number.
    pub fn is_page_number(&self, line: &str) -> bool {
        self.page_number
            .as_ref()
            .is_some_and(|re| re.is_match(line.trim()))
    }

    /// Match a single line against the heading families.
    pub fn match_heading(&self, line: &str) -> Option<HeadingMatch> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return None;
        }

        for pattern in &self.patterns {
            if pattern.title_phrase && !is_title_phrase(trimmed) {
                continue;
            }
            let Some(caps) = pattern.regex.captures(trimmed) else {
                continue;
            };
            let (title, level) = match pattern.rule {
                LevelRule::MarkdownHashes => {
                    let hashes = caps.get(1).map(|m| m.as_str().len()).unwrap_or(1);
                    let title = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
                    (title.to_string(), hashes as u32)
                }
                LevelRule::DottedNumber | LevelRule::Fixed(_)
                    if trimmed.chars().count() >= self.max_heading_chars =>
                {
                    continue;
                }
                LevelRule::DottedNumber => {
                    let dots = caps
                        .get(1)
                        .map(|m| m.as_str().matches('.').count())
                        .unwrap_or(0);
                    (trimmed.to_string(), dots as u32 + 1)
                }
                LevelRule::Fixed(level) => (trimmed.to_string(), level),
            };
            return Some(HeadingMatch { title, level });
        }
        None
    }

    /// Parse text into a section tree rooted at a document titled `title`.
    pub fn parse(&self, text: &str, title: &str) -> SectionNode {
        let mut stack = SectionStack::new(title);
        let mut in_fence = false;
        let mut dropped_page_numbers = 0usize;

        for line in text.lines() {
            let trimmed = line.trim();

            if trimmed.starts_with("```") {
                in_fence = !in_fence;
                stack.push_text(line);
                continue;
            }
            if in_fence {
                stack.push_text(line);
                continue;
            }

            if self.is_page_number(trimmed) {
                dropped_page_numbers += 1;
                continue;
            }

            match self.match_heading(trimmed) {
                Some(heading) => stack.open_heading(&heading.title, heading.level),
                None => stack.push_text(line.trim_end()),
            }
        }

        let root = stack.finish();
        debug!(
            "Parsed plain text: {} sections, {} page-number lines dropped",
            root.section_count(),
            dropped_page_numbers
        );
        root
    }
}

/// Parse plain text with the default parser.
pub fn parse_text(text: &str, title: &str) -> SectionNode {
    TextParser::new().parse(text, title)
}
