//! Paragraph-bounded chunking by word budget.
//!
//! Paragraphs are blank-line delimited and accumulate into a chunk until the
//! next one would exceed the budget. A paragraph larger than the budget is
//! kept whole in its own chunk. Blank lines inside a fenced code block do not
//! end a paragraph.

use serde::{Deserialize, Serialize};

/// One unit of synthesis work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkTask {
    /// 0-based position in the document.
    pub index: u32,

    /// Total number of chunks in the document.
    pub total: u32,

    /// Chunk text.
    pub text: String,
}

impl ChunkTask {
    /// Number of words in the chunk.
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    /// Positional context shown to the backend, e.g. "Part 2 of 5".
    pub fn position_label(&self) -> String {
        format!("Part {} of {}", self.index + 1, self.total)
    }
}

/// Splits text into word-budgeted chunks.
#[derive(Debug, Clone)]
pub struct Chunker {
    chunk_words: usize,
}

impl Chunker {
    /// Create a chunker with the given word budget (at least one word).
    pub fn new(chunk_words: usize) -> Self {
        Self {
            chunk_words: chunk_words.max(1),
        }
    }

    /// Split text into chunk tasks. Whitespace-only text yields no chunks.
    pub fn split(&self, text: &str) -> Vec<ChunkTask> {
        let mut chunks: Vec<String> = Vec::new();
        let mut current: Vec<String> = Vec::new();
        let mut current_words = 0usize;

        for paragraph in paragraphs(text) {
            let words = paragraph.split_whitespace().count();
            if !current.is_empty() && current_words + words > self.chunk_words {
                chunks.push(current.join("\n\n"));
                current.clear();
                current_words = 0;
            }
            current.push(paragraph);
            current_words += words;
        }
        if !current.is_empty() {
            chunks.push(current.join("\n\n"));
        }

        let total = chunks.len() as u32;
        chunks
            .into_iter()
            .zip(0u32..)
            .map(|(text, index)| ChunkTask { index, total, text })
            .collect()
    }
}

/// Blank-line delimited paragraphs, trimmed, empty ones skipped.
fn paragraphs(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut lines: Vec<&str> = Vec::new();
    let mut in_fence = false;

    for line in text.lines() {
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
        }
        if line.trim().is_empty() && !in_fence {
            push_paragraph(&mut out, &lines);
            lines.clear();
        } else {
            lines.push(line);
        }
    }
    push_paragraph(&mut out, &lines);
    out
}

fn push_paragraph(out: &mut Vec<String>, lines: &[&str]) {
    let paragraph = lines.join("\n");
    let paragraph = paragraph.trim();
    if !paragraph.is_empty() {
        out.push(paragraph.to_string());
    }
}
