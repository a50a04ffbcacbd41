//! Chunk results and the merged course.

use coursegen_structure::{
    ChapterDraft, CourseOutline, KnowledgeId, SectionKind, Subtopic, TextbookConverter,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::BackendError;

/// One generated section of a chunk.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChunkSection {
    /// Section heading.
    pub heading: String,

    /// Rewritten section text.
    pub content: String,

    /// Key points.
    #[serde(default)]
    pub key_points: Vec<String>,

    /// Worked examples.
    #[serde(default)]
    pub examples: Vec<String>,
}

impl ChunkSection {
    /// Render the section as chapter text with bulleted key points and examples.
    pub fn render(&self) -> String {
        let mut out = self.content.trim().to_string();
        for (label, items) in [("Key points:", &self.key_points), ("Examples:", &self.examples)] {
            if items.is_empty() {
                continue;
            }
            if !out.is_empty() {
                out.push_str("\n\n");
            }
            out.push_str(label);
            for item in items {
                out.push_str("\n- ");
                out.push_str(item.trim());
            }
        }
        out
    }
}

/// The outcome of one chunk: generated content or an error sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkResult {
    /// Index of the chunk this result belongs to.
    pub index: u32,

    /// Chapter title.
    pub title: String,

    /// Generated sections.
    pub sections: Vec<ChunkSection>,

    /// 1-based chapter number.
    pub chapter_number: u32,

    /// Learning objectives.
    pub learning_objectives: Vec<String>,

    /// Failure description for sentinel results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Shape of a successful chunk response.
#[derive(Debug, Deserialize)]
struct ChunkPayload {
    title: String,
    #[serde(default)]
    sections: Vec<ChunkSection>,
    #[serde(default)]
    learning_objectives: Vec<String>,
}

impl ChunkResult {
    /// Parse a backend response for chunk `index`.
    pub fn from_value(index: u32, value: Value) -> Result<Self, BackendError> {
        let payload: ChunkPayload = serde_json::from_value(value)
            .map_err(|e| BackendError::SchemaViolation(format!("chunk {index}: {e}")))?;

        let title = match payload.title.trim() {
            "" => format!("Part {}", index + 1),
            title => title.to_string(),
        };

        Ok(Self {
            index,
            title,
            sections: payload.sections,
            chapter_number: index + 1,
            learning_objectives: payload.learning_objectives,
            error: None,
        })
    }

    /// Structurally valid placeholder for a failed chunk.
    pub fn sentinel(index: u32, error: &str) -> Self {
        Self {
            index,
            title: format!("Error in Chunk {}", index + 1),
            sections: vec![ChunkSection {
                heading: "Processing Error".to_string(),
                content: format!(
                    "This part of the document could not be processed: {error}"
                ),
                key_points: Vec::new(),
                examples: Vec::new(),
            }],
            chapter_number: index + 1,
            learning_objectives: Vec::new(),
            error: Some(error.to_string()),
        }
    }

    /// Whether this is an error sentinel.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Course-level fields produced by the final merge call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CourseSummary {
    /// Course title.
    pub title: String,

    /// Short description.
    #[serde(default)]
    pub description: String,

    /// Longer summary.
    #[serde(default)]
    pub summary: String,

    /// Intended audiences.
    #[serde(default)]
    pub target_audience: Vec<String>,

    /// Difficulty label.
    #[serde(default)]
    pub difficulty_level: String,

    /// Prerequisites.
    #[serde(default)]
    pub prerequisites: Vec<String>,
}

impl CourseSummary {
    /// Parse the merge call response.
    pub fn from_value(value: Value) -> Result<Self, BackendError> {
        serde_json::from_value(value)
            .map_err(|e| BackendError::SchemaViolation(format!("course summary: {e}")))
    }
}

/// The merged artifact of one synthesis run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesizedCourse {
    /// Course title. Never empty.
    pub title: String,

    /// Short description.
    pub description: String,

    /// Longer summary.
    pub summary: String,

    /// Intended audiences.
    pub target_audience: Vec<String>,

    /// Difficulty label.
    pub difficulty_level: String,

    /// Prerequisites.
    pub prerequisites: Vec<String>,

    /// One result per chunk, sorted by index.
    pub chapters: Vec<ChunkResult>,

    /// True when the course-level fields came from the local fallback.
    #[serde(default)]
    pub degraded: bool,

    /// Number of sentinel chapters.
    #[serde(default)]
    pub failed_chunks: usize,
}

/// Title used when neither the backend nor the caller supplies one.
pub const UNTITLED_COURSE: &str = "Untitled Course";

impl SynthesizedCourse {
    /// Combine backend-generated course fields with the chunk results.
    pub fn from_summary(
        summary: CourseSummary,
        document_name: &str,
        chapters: Vec<ChunkResult>,
    ) -> Self {
        let title = match summary.title.trim() {
            "" => course_name(document_name),
            title => title.to_string(),
        };
        let failed_chunks = chapters.iter().filter(|c| c.is_error()).count();
        Self {
            title,
            description: summary.description,
            summary: summary.summary,
            target_audience: summary.target_audience,
            difficulty_level: summary.difficulty_level,
            prerequisites: summary.prerequisites,
            chapters,
            degraded: false,
            failed_chunks,
        }
    }

    /// Deterministic, backend-free course fields.
    pub fn fallback(document_name: &str, chapters: Vec<ChunkResult>) -> Self {
        let title = course_name(document_name);
        let covered: Vec<&str> = chapters
            .iter()
            .filter(|c| !c.is_error())
            .map(|c| c.title.as_str())
            .collect();
        let summary = if covered.is_empty() {
            String::new()
        } else {
            format!("Covers: {}.", covered.join("; "))
        };
        let failed_chunks = chapters.iter().filter(|c| c.is_error()).count();

        Self {
            description: format!("Course generated from {title}."),
            title,
            summary,
            target_audience: vec!["General audience".to_string()],
            difficulty_level: "Unspecified".to_string(),
            prerequisites: Vec::new(),
            chapters,
            degraded: true,
            failed_chunks,
        }
    }

    /// Map the course onto an outline: one subtopic per chunk, one chapter per section.
    pub fn to_outline(&self, knowledge_ref: KnowledgeId) -> CourseOutline {
        let converter = TextbookConverter::new();
        let subtopics = self
            .chapters
            .iter()
            .map(|result| {
                let mut subtopic = Subtopic::new(result.title.as_str());
                subtopic.chapters = result
                    .sections
                    .iter()
                    .map(|section| {
                        let content = section.render();
                        ChapterDraft {
                            title: section.heading.trim().to_string(),
                            kind: SectionKind::from_title(&section.heading),
                            level: 1,
                            metadata: converter.metadata(&content),
                            content,
                        }
                    })
                    .collect();
                subtopic
            })
            .collect();

        let mut outline = CourseOutline {
            topic: self.title.clone(),
            knowledge_ref,
            subtopics,
        };
        outline.assign_start_lines();
        outline
    }
}

fn course_name(document_name: &str) -> String {
    match document_name.trim() {
        "" => UNTITLED_COURSE.to_string(),
        name => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn section(heading: &str) -> ChunkSection {
        ChunkSection {
            heading: heading.to_string(),
            content: format!("{heading} text"),
            key_points: vec!["first".to_string(), "second".to_string()],
            examples: Vec::new(),
        }
    }

    #[test]
    fn test_from_value() {
        let value = json!({
            "title": "Limits",
            "sections": [{
                "heading": "Intuition",
                "content": "c",
                "key_points": [],
                "examples": [],
            }],
            "learning_objectives": ["Define a limit"],
        });
        let result = ChunkResult::from_value(2, value).unwrap();

        assert_eq!(result.index, 2);
        assert_eq!(result.chapter_number, 3);
        assert_eq!(result.sections.len(), 1);
        assert!(!result.is_error());
    }

    #[test]
    fn test_from_value_rejects_bad_shape() {
        let err = ChunkResult::from_value(0, json!({ "sections": "nope" })).unwrap_err();
        assert!(matches!(err, BackendError::SchemaViolation(_)));
    }

    #[test]
    fn test_sentinel_shape() {
        let result = ChunkResult::sentinel(4, "backend call timed out after 1s");

        assert_eq!(result.title, "Error in Chunk 5");
        assert_eq!(result.sections.len(), 1);
        assert!(result.sections[0].key_points.is_empty());
        assert!(result.sections[0].examples.is_empty());
        assert!(result.sections[0].content.contains("timed out"));
        assert_eq!(result.error.as_deref(), Some("backend call timed out after 1s"));
    }

    #[test]
    fn test_render_section() {
        assert_eq!(
            section("Intro").render(),
            "Intro text\n\nKey points:\n- first\n- second"
        );
    }

    #[test]
    fn test_fallback_uses_document_name() {
        let chapters = vec![ChunkResult::sentinel(0, "down"), ChunkResult::sentinel(1, "down")];
        let course = SynthesizedCourse::fallback("Thermo Notes", chapters);

        assert_eq!(course.title, "Thermo Notes");
        assert!(course.degraded);
        assert_eq!(course.failed_chunks, 2);
        assert_eq!(course.chapters.len(), 2);

        assert_eq!(SynthesizedCourse::fallback("  ", Vec::new()).title, UNTITLED_COURSE);
    }

    #[test]
    fn test_to_outline() {
        let mut first = ChunkResult::sentinel(0, "x");
        first.title = "Limits".to_string();
        first.error = None;
        first.sections = vec![section("Intro"), section("Exercises")];
        let second = ChunkResult::sentinel(1, "down");

        let course = SynthesizedCourse::fallback("Calc", vec![first, second]);
        let outline = course.to_outline(KnowledgeId::from("k"));

        assert_eq!(outline.topic, "Calc");
        assert_eq!(outline.subtopics.len(), 2);
        assert_eq!(outline.subtopics[0].chapters.len(), 2);
        assert_eq!(outline.subtopics[0].chapters[1].kind, SectionKind::Exercises);
        assert_eq!(outline.subtopics[1].title, "Error in Chunk 2");
        // "Intro text\n\nKey points:\n- first\n- second" is 5 lines, twice, plus separators.
        assert_eq!(outline.subtopics[1].start_line, 14);
    }
}
