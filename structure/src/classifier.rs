//! Heuristic structure classification over formatting signals.
//!
//! The classifier anchors every decision on the document's own body-text
//! size, so a 12pt textbook and a 28pt slide deck are handled by the same
//! rules:
//!
//! 1. Body size is the mode of all positive font sizes (median if the mode
//!    is not unique).
//! 2. Sizes at least `heading_size_ratio` times the body size become heading
//!    buckets, ranked largest first (largest = level 1).
//! 3. Each block is classified by the first matching rule: heading bucket,
//!    minority bold text, textual heading pattern, list prefix, paragraph.
//! 4. The largest block on the first page becomes the title when it is at
//!    least `title_size_ratio` times the body size.

use std::collections::{BTreeMap, HashMap};

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::block::{Block, BlockRole};
use crate::error::{Result, StructureError};
use crate::kind::is_title_phrase;

/// Configuration for the structure classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Minimum size relative to body text for a heading bucket.
    pub heading_size_ratio: f64,

    /// Bold text only signals a heading while bold blocks are rarer than this fraction.
    pub bold_minority_ratio: f64,

    /// Minimum size relative to body text for the title.
    pub title_size_ratio: f64,

    /// Pattern-based headings must be shorter than this many characters.
    pub max_heading_chars: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            heading_size_ratio: 1.10,
            bold_minority_ratio: 0.30,
            title_size_ratio: 1.3,
            max_heading_chars: 100,
        }
    }
}

impl ClassifierConfig {
    /// Check that every threshold is usable.
    pub fn validate(&self) -> Result<()> {
        if self.heading_size_ratio.is_nan() || self.heading_size_ratio <= 1.0 {
            return Err(StructureError::InvalidConfig(format!(
                "heading_size_ratio must be greater than 1.0, got {}",
                self.heading_size_ratio
            )));
        }
        if self.title_size_ratio.is_nan() || self.title_size_ratio <= 1.0 {
            return Err(StructureError::InvalidConfig(format!(
                "title_size_ratio must be greater than 1.0, got {}",
                self.title_size_ratio
            )));
        }
        if !(0.0..=1.0).contains(&self.bold_minority_ratio) {
            return Err(StructureError::InvalidConfig(format!(
                "bold_minority_ratio must be within 0.0..=1.0, got {}",
                self.bold_minority_ratio
            )));
        }
        if self.max_heading_chars == 0 {
            return Err(StructureError::InvalidConfig(
                "max_heading_chars must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Font statistics computed over a whole document.
#[derive(Debug, Clone, PartialEq)]
pub struct FontStatistics {
    /// Body-text size. `None` when no block reports a positive size.
    pub body_size: Option<f64>,

    /// Distinct heading sizes, largest first. Index + 1 is the heading level.
    pub heading_sizes: Vec<f64>,

    /// Fraction of blocks set in bold.
    pub bold_fraction: f64,
}

impl FontStatistics {
    /// Heading level for a font size, if it falls in a heading bucket.
    pub fn level_for_size(&self, size: f64) -> Option<u32> {
        let key = size_key(size);
        self.heading_sizes
            .iter()
            .position(|s| size_key(*s) == key)
            .map(|pos| pos as u32 + 1)
    }
}

/// A textual heading rule and the level it implies.
struct HeadingPattern {
    regex: Regex,
    level: PatternLevel,
    /// The text after the prefix must read like a title.
    title_phrase: bool,
}

#[derive(Clone, Copy)]
enum PatternLevel {
    Fixed(u32),
    /// Level = number of dots in the first capture + 1.
    DottedNumber,
}

/// Heuristic classifier over extracted blocks.
pub struct StructureClassifier {
    config: ClassifierConfig,
    heading_patterns: Vec<HeadingPattern>,
    list_pattern: Option<Regex>,
}

impl Default for StructureClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl StructureClassifier {
    /// Create a classifier with default thresholds.
    pub fn new() -> Self {
        Self::build(ClassifierConfig::default())
    }

    /// Create a classifier with custom thresholds.
    pub fn with_config(config: ClassifierConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: ClassifierConfig) -> Self {
        let patterns: [(&str, PatternLevel, bool); 5] = [
            // 1.2.3 Title
            (r"^(\d+(?:\.\d+)+)\.?\s+\S", PatternLevel::DottedNumber, false),
            // 3 Title / 3. Title / 3) Title
            (r"^\d+[.)]?\s+[A-Z]", PatternLevel::Fixed(1), true),
            // IV. Title
            (r"^[IVXLC]+[.)]\s+[A-Z]", PatternLevel::Fixed(1), true),
            // B. Title
            (r"^[A-Z][.)]\s+[A-Z]", PatternLevel::Fixed(2), true),
            // Chapter / Part / Appendix / Section / Figure / Table
            (
                r"(?i)^(chapter|part|appendix|section|figure|table)\b",
                PatternLevel::Fixed(1),
                false,
            ),
        ];

        let heading_patterns = patterns
            .into_iter()
            .filter_map(|(pattern, level, title_phrase)| {
                Regex::new(pattern).ok().map(|regex| HeadingPattern {
                    regex,
                    level,
                    title_phrase,
                })
            })
            .collect();

        Self {
            config,
            heading_patterns,
            list_pattern: Regex::new(r"^(?:[-•*]\s+|\d+\.\s+)").ok(),
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Compute body size, heading buckets and bold ratio.
    pub fn font_statistics(&self, blocks: &[Block]) -> FontStatistics {
        let sizes: Vec<f64> = blocks
            .iter()
            .map(|b| b.font_size)
            .filter(|s| *s > 0.0)
            .collect();

        let body_size = body_size(&sizes);

        let mut heading_sizes = Vec::new();
        if let Some(body) = body_size {
            let threshold = body * self.config.heading_size_ratio;
            let mut buckets: BTreeMap<i64, f64> = BTreeMap::new();
            for size in &sizes {
                // Tolerate float noise in `body * ratio`.
                if *size + 1e-9 >= threshold {
                    buckets.entry(size_key(*size)).or_insert(*size);
                }
            }
            // BTreeMap iterates ascending; level 1 is the largest size.
            heading_sizes = buckets.into_values().rev().collect();
        }

        let bold_fraction = if blocks.is_empty() {
            0.0
        } else {
            blocks.iter().filter(|b| b.is_bold).count() as f64 / blocks.len() as f64
        };

        FontStatistics {
            body_size,
            heading_sizes,
            bold_fraction,
        }
    }

    /// Assign a role and level to every block in place.
    pub fn classify(&self, blocks: &mut [Block]) {
        if blocks.is_empty() {
            return;
        }

        let stats = self.font_statistics(blocks);
        debug!(
            "Classifying {} blocks: body size {:?}, {} heading sizes, bold fraction {:.2}",
            blocks.len(),
            stats.body_size,
            stats.heading_sizes.len(),
            stats.bold_fraction
        );

        for block in blocks.iter_mut() {
            let (role, level) = self.classify_block(block, &stats);
            block.role = role;
            block.level = level;
        }

        self.detect_title(blocks, &stats);
    }

    /// Classify a single block against precomputed statistics.
    fn classify_block(&self, block: &Block, stats: &FontStatistics) -> (BlockRole, u32) {
        if let Some(body) = stats.body_size {
            if block.font_size > 0.0 {
                if let Some(level) = stats.level_for_size(block.font_size) {
                    return (BlockRole::Heading, level);
                }

                if block.is_bold
                    && stats.bold_fraction < self.config.bold_minority_ratio
                    && block.font_size >= body
                {
                    return (BlockRole::Heading, stats.heading_sizes.len() as u32 + 1);
                }
            }
        }

        let text = block.text.trim();
        if let Some(level) = self.pattern_heading_level(text) {
            return (BlockRole::Heading, level);
        }

        if self.is_list_item(text) {
            return (BlockRole::ListItem, 0);
        }

        (BlockRole::Paragraph, 0)
    }

    /// Heading level implied by the text alone, ignoring fonts.
    pub fn pattern_heading_level(&self, text: &str) -> Option<u32> {
        if text.is_empty() || text.chars().count() >= self.config.max_heading_chars {
            return None;
        }

        for pattern in &self.heading_patterns {
            if pattern.title_phrase && !is_title_phrase(text) {
                continue;
            }
            if let Some(caps) = pattern.regex.captures(text) {
                let level = match pattern.level {
                    PatternLevel::Fixed(level) => level,
                    PatternLevel::DottedNumber => caps
                        .get(1)
                        .map(|m| m.as_str().matches('.').count() as u32 + 1)
                        .unwrap_or(1),
                };
                return Some(level);
            }
        }
        None
    }

    /// Whether the text starts with a bullet or list number.
    pub fn is_list_item(&self, text: &str) -> bool {
        self.list_pattern
            .as_ref()
            .is_some_and(|re| re.is_match(text))
    }

    /// Promote the largest block on the first page to the title.
    fn detect_title(&self, blocks: &mut [Block], stats: &FontStatistics) {
        let Some(body) = stats.body_size else {
            return;
        };
        let Some(first_page) = blocks.iter().map(|b| b.page_index).min() else {
            return;
        };

        let mut largest: Option<usize> = None;
        for (i, block) in blocks.iter().enumerate() {
            if block.page_index != first_page || block.text.trim().is_empty() {
                continue;
            }
            // Strictly greater keeps the earliest block on ties.
            if largest.is_none_or(|j| block.font_size > blocks[j].font_size) {
                largest = Some(i);
            }
        }

        if let Some(i) = largest {
            if blocks[i].font_size > body * self.config.title_size_ratio {
                debug!("Title detected: {:?}", blocks[i].text.trim());
                blocks[i].role = BlockRole::Title;
            }
        }
    }
}

/// Sizes are compared at 0.1pt resolution.
fn size_key(size: f64) -> i64 {
    (size * 10.0).round() as i64
}

/// Mode of the sizes, or the median when no unique mode exists.
fn body_size(sizes: &[f64]) -> Option<f64> {
    if sizes.is_empty() {
        return None;
    }

    let mut counts: HashMap<i64, (usize, f64)> = HashMap::new();
    for size in sizes {
        let entry = counts.entry(size_key(*size)).or_insert((0, *size));
        entry.0 += 1;
    }

    let max_count = counts.values().map(|(count, _)| *count).max().unwrap_or(0);
    let modes: Vec<f64> = counts
        .values()
        .filter(|(count, _)| *count == max_count)
        .map(|(_, size)| *size)
        .collect();

    if let [mode] = modes.as_slice() {
        return Some(*mode);
    }

    let mut sorted = sizes.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn body(text: &str) -> Block {
        Block::new(text, 10.0)
    }

    #[test]
    fn test_body_size_mode() {
        assert_eq!(body_size(&[10.0, 10.0, 12.0, 18.0]), Some(10.0));
    }

    #[test]
    fn test_body_size_falls_back_to_median() {
        // Two sizes tie for the mode.
        assert_eq!(body_size(&[10.0, 10.0, 12.0, 12.0, 20.0]), Some(12.0));
        assert_eq!(body_size(&[9.0, 11.0, 13.0, 15.0]), Some(12.0));
        assert_eq!(body_size(&[]), None);
    }

    #[test]
    fn test_level_rank_adaptivity() {
        let classifier = StructureClassifier::new();
        let mut blocks: Vec<Block> = (0..8)
            .map(|i| body(&format!("body text sentence number {i} goes here")))
            .collect();
        // Keep the headings off the first page so title detection stays out of the way.
        blocks.push(Block::new("Big heading", 18.0).on_page(1));
        blocks.push(Block::new("Medium heading one", 14.0).on_page(1));
        blocks.push(Block::new("Medium heading two", 14.0).on_page(1));

        classifier.classify(&mut blocks);

        for block in &blocks[..8] {
            assert_eq!(block.role, BlockRole::Paragraph);
        }
        assert_eq!((blocks[8].role, blocks[8].level), (BlockRole::Heading, 1));
        assert_eq!((blocks[9].role, blocks[9].level), (BlockRole::Heading, 2));
        assert_eq!((blocks[10].role, blocks[10].level), (BlockRole::Heading, 2));
    }

    #[test]
    fn test_bold_minority_becomes_heading() {
        let classifier = StructureClassifier::new();
        let mut blocks = vec![
            body("one"),
            body("two"),
            body("three"),
            body("four"),
            Block::new("Bold lead-in", 10.0).bold(),
        ];
        classifier.classify(&mut blocks);

        assert_eq!(blocks[4].role, BlockRole::Heading);
        assert_eq!(blocks[4].level, 1);
    }

    #[test]
    fn test_bold_majority_is_not_heading() {
        let classifier = StructureClassifier::new();
        let mut blocks = vec![
            Block::new("all bold one", 10.0).bold(),
            Block::new("all bold two", 10.0).bold(),
            body("plain"),
        ];
        classifier.classify(&mut blocks);
        assert_eq!(blocks[0].role, BlockRole::Paragraph);
    }

    #[test]
    fn test_bold_level_sits_below_size_buckets() {
        let classifier = StructureClassifier::new();
        let mut blocks: Vec<Block> = (0..6).map(|_| body("text")).collect();
        blocks.push(Block::new("Size heading", 16.0).on_page(1));
        blocks.push(Block::new("Bold heading", 10.0).bold().on_page(1));
        classifier.classify(&mut blocks);

        assert_eq!(blocks[6].level, 1);
        assert_eq!((blocks[7].role, blocks[7].level), (BlockRole::Heading, 2));
    }

    #[test]
    fn test_uniform_size_uses_patterns() {
        let classifier = StructureClassifier::new();
        let mut blocks = vec![
            body("Chapter 1 Foundations"),
            body("2.1.3 Vector Spaces"),
            body("- first bullet"),
            body("1. buy milk"),
            body("Plain words in a sentence."),
        ];
        classifier.classify(&mut blocks);

        assert_eq!((blocks[0].role, blocks[0].level), (BlockRole::Heading, 1));
        assert_eq!((blocks[1].role, blocks[1].level), (BlockRole::Heading, 3));
        assert_eq!(blocks[2].role, BlockRole::ListItem);
        assert_eq!(blocks[3].role, BlockRole::ListItem);
        assert_eq!(blocks[4].role, BlockRole::Paragraph);
    }

    #[test]
    fn test_long_numbered_sentence_is_not_heading() {
        let classifier = StructureClassifier::new();
        let sentence = format!("2019 Annual Report {}", "And The Text Keeps Going ".repeat(6));
        assert!(sentence.chars().count() >= 100);
        assert_eq!(classifier.pattern_heading_level(&sentence), None);
        assert_eq!(classifier.pattern_heading_level("2019 Annual Report"), Some(1));
    }

    #[test]
    fn test_capitalized_numbered_steps_are_list_items() {
        let classifier = StructureClassifier::new();
        let mut blocks = vec![
            body("Follow these steps to bake bread at home."),
            body("1. Preheat the oven to medium heat."),
            body("2. Mix the flour with warm water."),
            body("3. Bake for forty minutes."),
            body("4 Baking Techniques"),
        ];
        classifier.classify(&mut blocks);

        let roles: Vec<(BlockRole, u32)> = blocks.iter().map(|b| (b.role, b.level)).collect();
        assert_eq!(
            roles,
            vec![
                (BlockRole::Paragraph, 0),
                (BlockRole::ListItem, 0),
                (BlockRole::ListItem, 0),
                (BlockRole::ListItem, 0),
                (BlockRole::Heading, 1),
            ]
        );
        assert_eq!(classifier.pattern_heading_level("IV. Mix it well."), None);
        assert_eq!(classifier.pattern_heading_level("B. Stir the mixture slowly"), None);
    }

    #[test]
    fn test_roman_and_letter_patterns() {
        let classifier = StructureClassifier::new();
        assert_eq!(classifier.pattern_heading_level("IV. Results"), Some(1));
        assert_eq!(classifier.pattern_heading_level("B. Methods"), Some(2));
        assert_eq!(classifier.pattern_heading_level("figure 3 shows"), Some(1));
    }

    #[test]
    fn test_title_detection_on_first_page() {
        let classifier = StructureClassifier::new();
        let mut blocks = vec![
            Block::new("Linear Algebra", 24.0),
            body("intro text"),
            body("more text"),
            body("even more"),
            Block::new("Bigger on page two", 30.0).on_page(1),
        ];
        classifier.classify(&mut blocks);

        assert_eq!(blocks[0].role, BlockRole::Title);
        assert_eq!(blocks[4].role, BlockRole::Heading);
        assert_eq!(blocks.iter().filter(|b| b.is_title()).count(), 1);
    }

    #[test]
    fn test_title_needs_margin_over_body() {
        let classifier = StructureClassifier::new();
        let mut blocks = vec![
            Block::new("Slightly larger", 12.0),
            body("a"),
            body("b"),
            body("c"),
        ];
        classifier.classify(&mut blocks);
        // 12 >= 11 is a heading bucket but 12 <= 13 is not a title.
        assert_eq!(blocks[0].role, BlockRole::Heading);
    }

    #[test]
    fn test_empty_input_unchanged() {
        let classifier = StructureClassifier::new();
        let mut blocks: Vec<Block> = Vec::new();
        classifier.classify(&mut blocks);
        assert!(blocks.is_empty());
    }

    #[test]
    fn test_unknown_font_sizes_use_patterns_only() {
        let classifier = StructureClassifier::new();
        let mut blocks = vec![Block::new("Section 4 Proofs", 0.0), Block::new("text", 0.0)];
        classifier.classify(&mut blocks);
        assert_eq!(blocks[0].role, BlockRole::Heading);
        assert_eq!(blocks[1].role, BlockRole::Paragraph);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ClassifierConfig {
            heading_size_ratio: 0.9,
            ..Default::default()
        };
        assert!(StructureClassifier::with_config(config).is_err());
    }
}
