//! Outline flattening into per-chapter records for persistence.

use serde::{Deserialize, Serialize};

use crate::kind::SectionKind;
use crate::outline::{line_count, ChapterMetadata, CourseOutline, KnowledgeId};

/// One chapter with its full context, ready to store as a row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterRecord {
    /// 1-based sequence number across the whole outline.
    pub id: u32,

    /// Course topic.
    pub topic: String,

    /// Title of the enclosing subtopic.
    pub subtopic: String,

    /// Chapter title.
    pub chapter_title: String,

    /// Chapter body text.
    pub content: String,

    /// Number of lines in `content`.
    pub line_count: u32,

    /// Knowledge item the chapter came from.
    pub knowledge_id: KnowledgeId,

    /// Purpose of the chapter.
    pub kind: SectionKind,

    /// Heading level the chapter came from.
    pub level: u32,

    /// Content statistics.
    pub metadata: ChapterMetadata,
}

/// Flatten an outline into records in subtopic-then-chapter order.
pub fn flatten(outline: &CourseOutline) -> Vec<ChapterRecord> {
    outline
        .subtopics
        .iter()
        .flat_map(|subtopic| {
            subtopic
                .chapters
                .iter()
                .map(move |chapter| (subtopic, chapter))
        })
        .zip(1u32..)
        .map(|((subtopic, chapter), id)| ChapterRecord {
            id,
            topic: outline.topic.clone(),
            subtopic: subtopic.title.clone(),
            chapter_title: chapter.title.clone(),
            content: chapter.content.clone(),
            line_count: line_count(&chapter.content),
            knowledge_id: outline.knowledge_ref.clone(),
            kind: chapter.kind,
            level: chapter.level,
            metadata: chapter.metadata.clone(),
        })
        .collect()
}
