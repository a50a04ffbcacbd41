//! The course pipeline handle.
//!
//! A [`CoursePipeline`] is built once per process and passed to every
//! invocation. The generative backend is injected at construction; without
//! one, only the structuring path is available.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use coursegen_structure::{
    build_tree, flatten, ChapterRecord, CourseOutline, SectionNode, StructureClassifier,
    TextParser, TextbookConverter,
};
use coursegen_synthesis::{
    ContentGenerator, ContentKind, GeneratedContent, GenerativeBackend, SynthesisEngine,
    SynthesizedCourse,
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::PipelineConfig;
use crate::document::{DocumentInput, DocumentMetadata};
use crate::error::{PipelineError, Result};

/// Output of the structuring path.
#[derive(Debug, Clone, Serialize)]
pub struct StructuredDocument {
    /// Document-level metadata.
    pub metadata: DocumentMetadata,

    /// Intermediate section tree.
    pub tree: SectionNode,

    /// Course outline built from the tree.
    pub outline: CourseOutline,

    /// Flattened, storage-ready chapters.
    pub records: Vec<ChapterRecord>,

    /// When the document was processed.
    pub processed_at: DateTime<Utc>,
}

/// Output of the synthesis path.
#[derive(Debug, Clone, Serialize)]
pub struct SynthesizedDocument {
    /// Document-level metadata.
    pub metadata: DocumentMetadata,

    /// Merged course.
    pub course: SynthesizedCourse,

    /// Course outline built from the merged course.
    pub outline: CourseOutline,

    /// Flattened, storage-ready chapters.
    pub records: Vec<ChapterRecord>,

    /// When the document was processed.
    pub processed_at: DateTime<Utc>,
}

/// Output of structuring followed by synthesis.
#[derive(Debug, Clone, Serialize)]
pub struct EnrichedDocument {
    /// The structured original.
    pub structured: StructuredDocument,

    /// The synthesized course built from the structured text.
    pub synthesized: SynthesizedDocument,
}

/// Dependency-injected course generation pipeline.
pub struct CoursePipeline {
    config: PipelineConfig,
    classifier: StructureClassifier,
    text_parser: TextParser,
    converter: TextbookConverter,
    engine: Option<SynthesisEngine>,
    generator: Option<ContentGenerator>,
}

impl CoursePipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> CoursePipelineBuilder {
        CoursePipelineBuilder::new()
    }

    /// Create a pipeline from configuration and an optional backend.
    pub fn new(
        config: PipelineConfig,
        backend: Option<Arc<dyn GenerativeBackend>>,
    ) -> Result<Self> {
        let classifier = StructureClassifier::with_config(config.classifier.clone())?;
        let text_parser =
            TextParser::new().with_max_heading_chars(config.classifier.max_heading_chars);
        let converter = TextbookConverter::with_config(config.outline.clone());

        let (engine, generator) = match backend {
            Some(backend) => {
                info!("Course pipeline using {} backend", backend.name());
                let generator = ContentGenerator::new(Arc::clone(&backend))
                    .with_timeout(config.synthesis.call_timeout());
                let engine = SynthesisEngine::new(backend, config.synthesis.clone())?;
                (Some(engine), Some(generator))
            }
            None => {
                info!("Course pipeline without a generative backend");
                (None, None)
            }
        };

        Ok(Self {
            config,
            classifier,
            text_parser,
            converter,
            engine,
            generator,
        })
    }

    /// Get the configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Whether synthesis operations are available.
    pub fn has_backend(&self) -> bool {
        self.engine.is_some()
    }

    /// Infer structure and build chapter records. Never calls the backend.
    pub fn structure(
        &self,
        input: impl Into<DocumentInput>,
        metadata: &DocumentMetadata,
    ) -> StructuredDocument {
        let input = input.into();
        let tree = if input.is_empty() {
            debug!("{:?} has no content, skipping structure inference", metadata.title);
            SectionNode::root(metadata.title.as_str())
        } else {
            match input {
                DocumentInput::Blocks(mut blocks) => {
                    self.classifier.classify(&mut blocks);
                    let mut tree = build_tree(&blocks);
                    if tree.title.trim().is_empty() {
                        tree.title = metadata.title.clone();
                    }
                    tree
                }
                DocumentInput::Text(text) => self.text_parser.parse(&text, &metadata.title),
            }
        };

        let topic = topic_name(metadata, &tree);
        let outline = self
            .converter
            .to_outline(&tree, metadata.knowledge_id.clone(), &topic);
        let records = flatten(&outline);

        info!(
            "Structured {:?}: {} sections, {} chapters",
            metadata.title,
            tree.section_count(),
            records.len()
        );

        StructuredDocument {
            metadata: metadata.clone(),
            tree,
            outline,
            records,
            processed_at: Utc::now(),
        }
    }

    /// Synthesize a course from raw text with the injected backend.
    pub async fn synthesize(
        &self,
        text: &str,
        metadata: &DocumentMetadata,
        cancel: &CancellationToken,
    ) -> Result<SynthesizedDocument> {
        let engine = self.engine.as_ref().ok_or(PipelineError::BackendUnavailable)?;

        let course = engine.synthesize(text, &metadata.title, cancel).await?;
        let outline = course.to_outline(metadata.knowledge_id.clone());
        let records = flatten(&outline);

        Ok(SynthesizedDocument {
            metadata: metadata.clone(),
            course,
            outline,
            records,
            processed_at: Utc::now(),
        })
    }

    /// Structure the input, then synthesize from the rendered structure.
    pub async fn enrich(
        &self,
        input: impl Into<DocumentInput>,
        metadata: &DocumentMetadata,
        cancel: &CancellationToken,
    ) -> Result<EnrichedDocument> {
        if !self.has_backend() {
            return Err(PipelineError::BackendUnavailable);
        }

        let structured = self.structure(input, metadata);
        let text = structured.tree.to_markdown();
        let synthesized = self.synthesize(&text, metadata, cancel).await?;

        Ok(EnrichedDocument {
            structured,
            synthesized,
        })
    }

    /// Generate study material for one chapter.
    pub async fn generate_content(
        &self,
        kind: ContentKind,
        chapter: &ChapterRecord,
    ) -> Result<GeneratedContent> {
        let generator = self
            .generator
            .as_ref()
            .ok_or(PipelineError::BackendUnavailable)?;
        Ok(generator
            .generate(kind, &chapter.chapter_title, &chapter.content)
            .await?)
    }
}

/// Topic for the outline: the document title, else the detected title.
fn topic_name(metadata: &DocumentMetadata, tree: &SectionNode) -> String {
    [metadata.title.trim(), tree.title.trim()]
        .into_iter()
        .find(|t| !t.is_empty())
        .unwrap_or(coursegen_synthesis::UNTITLED_COURSE)
        .to_string()
}

/// Builder for the course pipeline.
pub struct CoursePipelineBuilder {
    config: PipelineConfig,
    backend: Option<Arc<dyn GenerativeBackend>>,
}

impl CoursePipelineBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
            backend: None,
        }
    }

    /// Set the configuration.
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the generative backend.
    pub fn with_backend(mut self, backend: Arc<dyn GenerativeBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Build the pipeline.
    pub fn build(self) -> Result<CoursePipeline> {
        CoursePipeline::new(self.config, self.backend)
    }
}

impl Default for CoursePipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
