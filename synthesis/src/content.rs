//! Study material generators over a fixed set of content kinds.
//!
//! Each [`ContentKind`] owns its instructions, response schema, token budget
//! and parser, so adding a kind is a compile-time change rather than a new
//! entry in a string-keyed table.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::backend::GenerativeBackend;
use crate::error::{BackendError, Result, SynthesisError};
use crate::schema::JsonSchema;

/// Kinds of study material that can be generated for a chapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// Structured study notes.
    Notes,
    /// Short summary with key points.
    Summary,
    /// Multiple-choice quiz.
    Quiz,
    /// Mind map of the chapter's concepts.
    Mindmap,
}

impl ContentKind {
    /// Every kind, in display order.
    pub const ALL: [ContentKind; 4] = [Self::Notes, Self::Summary, Self::Quiz, Self::Mindmap];

    /// Short lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Notes => "notes",
            Self::Summary => "summary",
            Self::Quiz => "quiz",
            Self::Mindmap => "mindmap",
        }
    }

    /// System instructions for this kind.
    pub fn instructions(self) -> &'static str {
        match self {
            Self::Notes => {
                "Write structured study notes for the chapter. Group the material into \
                 sections with a heading and concise bullet points each."
            }
            Self::Summary => {
                "Summarize the chapter in one or two paragraphs and list its key points."
            }
            Self::Quiz => {
                "Write multiple-choice questions that test understanding of the chapter. \
                 Each question has four options, the 0-based index of the correct option \
                 and a short explanation."
            }
            Self::Mindmap => {
                "Build a mind map of the chapter: one central topic, its main branches and \
                 the sub-concepts under each branch."
            }
        }
    }

    /// Output token budget for this kind.
    pub fn max_tokens(self) -> u32 {
        match self {
            Self::Summary => 1024,
            Self::Mindmap => 1536,
            Self::Notes | Self::Quiz => 2048,
        }
    }

    /// Response schema for this kind.
    pub fn schema(self) -> JsonSchema {
        let strings = json!({ "type": "array", "items": { "type": "string" } });
        match self {
            Self::Notes => JsonSchema::object(
                "notes",
                json!({
                    "title": { "type": "string" },
                    "sections": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "heading": { "type": "string" },
                                "points": strings,
                            },
                            "required": ["heading", "points"],
                            "additionalProperties": false,
                        },
                    },
                }),
            ),
            Self::Summary => JsonSchema::object(
                "summary",
                json!({
                    "summary": { "type": "string" },
                    "key_points": strings,
                }),
            ),
            Self::Quiz => JsonSchema::object(
                "quiz",
                json!({
                    "questions": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "question": { "type": "string" },
                                "options": strings,
                                "answer_index": { "type": "integer" },
                                "explanation": { "type": "string" },
                            },
                            "required": ["question", "options", "answer_index", "explanation"],
                            "additionalProperties": false,
                        },
                    },
                }),
            ),
            Self::Mindmap => JsonSchema::object(
                "mindmap",
                json!({
                    "central_topic": { "type": "string" },
                    "branches": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "label": { "type": "string" },
                                "children": strings,
                            },
                            "required": ["label", "children"],
                            "additionalProperties": false,
                        },
                    },
                }),
            ),
        }
    }

    /// Parse a backend response for this kind.
    pub fn parse(self, value: Value) -> std::result::Result<GeneratedContent, BackendError> {
        let violation =
            |e: serde_json::Error| BackendError::SchemaViolation(format!("{self}: {e}"));
        match self {
            Self::Notes => Ok(GeneratedContent::Notes(
                serde_json::from_value(value).map_err(violation)?,
            )),
            Self::Summary => Ok(GeneratedContent::Summary(
                serde_json::from_value(value).map_err(violation)?,
            )),
            Self::Quiz => {
                let quiz: Quiz = serde_json::from_value(value).map_err(violation)?;
                if let Some((i, q)) = quiz
                    .questions
                    .iter()
                    .enumerate()
                    .find(|(_, q)| q.answer_index >= q.options.len())
                {
                    return Err(BackendError::SchemaViolation(format!(
                        "quiz: question {} answer index {} out of {} options",
                        i + 1,
                        q.answer_index,
                        q.options.len()
                    )));
                }
                Ok(GeneratedContent::Quiz(quiz))
            }
            Self::Mindmap => Ok(GeneratedContent::Mindmap(
                serde_json::from_value(value).map_err(violation)?,
            )),
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = SynthesisError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| SynthesisError::UnknownContentKind(s.to_string()))
    }
}

/// A section of study notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteSection {
    /// Section heading.
    pub heading: String,
    /// Bullet points.
    pub points: Vec<String>,
}

/// Structured study notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notes {
    /// Notes title.
    pub title: String,
    /// Sections.
    pub sections: Vec<NoteSection>,
}

/// Chapter summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Summary text.
    pub summary: String,
    /// Key points.
    pub key_points: Vec<String>,
}

/// One multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    /// Question text.
    pub question: String,
    /// Answer options.
    pub options: Vec<String>,
    /// 0-based index of the correct option.
    pub answer_index: usize,
    /// Why the answer is correct.
    pub explanation: String,
}

/// Multiple-choice quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    /// Questions.
    pub questions: Vec<QuizQuestion>,
}

/// A branch of a mind map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MindmapBranch {
    /// Branch label.
    pub label: String,
    /// Sub-concepts.
    pub children: Vec<String>,
}

/// Mind map of a chapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mindmap {
    /// Central topic.
    pub central_topic: String,
    /// Main branches.
    pub branches: Vec<MindmapBranch>,
}

/// Generated study material, tagged by kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "content", rename_all = "snake_case")]
pub enum GeneratedContent {
    Notes(Notes),
    Summary(Summary),
    Quiz(Quiz),
    Mindmap(Mindmap),
}

impl GeneratedContent {
    /// The kind that produced this content.
    pub fn kind(&self) -> ContentKind {
        match self {
            Self::Notes(_) => ContentKind::Notes,
            Self::Summary(_) => ContentKind::Summary,
            Self::Quiz(_) => ContentKind::Quiz,
            Self::Mindmap(_) => ContentKind::Mindmap,
        }
    }
}

/// Generates study material for single chapters.
pub struct ContentGenerator {
    backend: Arc<dyn GenerativeBackend>,
    timeout: Duration,
}

impl ContentGenerator {
    /// Create a generator with a 120 second call timeout.
    pub fn new(backend: Arc<dyn GenerativeBackend>) -> Self {
        Self {
            backend,
            timeout: Duration::from_secs(120),
        }
    }

    /// Set the call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Generate one kind of material for a chapter. Backend failures are returned as-is.
    pub async fn generate(
        &self,
        kind: ContentKind,
        chapter_title: &str,
        chapter_text: &str,
    ) -> Result<GeneratedContent> {
        debug!("Generating {kind} for {chapter_title:?}");
        let input = format!("Chapter: {chapter_title}\n\n{chapter_text}");
        let schema = kind.schema();

        let call = self
            .backend
            .complete(kind.instructions(), &input, &schema, kind.max_tokens());
        let value = tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| BackendError::Timeout {
                secs: self.timeout.as_secs(),
            })??;

        let content = kind.parse(value)?;
        info!("Generated {kind} for {chapter_title:?}");
        Ok(content)
    }
}
