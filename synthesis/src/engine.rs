//! Chunk-process-merge synthesis engine.
//!
//! Text is split into chunks, each chunk is rewritten by the backend with at
//! most `max_concurrency` calls in flight, and one final call turns the
//! chunk titles and objectives into course-level fields.
//!
//! Failure handling:
//!
//! - A failed chunk call (error, timeout, panic) becomes an error-sentinel
//!   result. The run always yields exactly one result per chunk.
//! - A failed merge call falls back to locally derived course fields and
//!   marks the course as degraded.
//! - Cancellation is all-or-nothing: in-flight calls are detached and left
//!   to finish, their results are discarded and the run returns
//!   [`SynthesisError::Cancelled`].

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backend::GenerativeBackend;
use crate::chunker::{ChunkTask, Chunker};
use crate::config::SynthesisConfig;
use crate::error::{BackendError, Result, SynthesisError};
use crate::model::{ChunkResult, CourseSummary, SynthesizedCourse};
use crate::schema::{chunk_schema, course_schema, JsonSchema};

const CHUNK_INSTRUCTIONS: &str = "You turn one part of a longer educational document into a \
course chapter. Give the chapter a concise title, split the material into sections with a \
heading, a clear rewritten explanation, key points and concrete examples, and list the \
learning objectives a student should reach. Stay faithful to the source text and do not \
invent facts that are not supported by it.";

const COURSE_INSTRUCTIONS: &str = "You are given the chapter titles and learning objectives of \
a course generated from one document. Produce a course title, a one-sentence description, a \
short summary of what the course covers, the intended audiences, a difficulty level \
(beginner, intermediate or advanced) and any prerequisites.";

/// Runs chunked synthesis against a generative backend.
pub struct SynthesisEngine {
    backend: Arc<dyn GenerativeBackend>,
    config: SynthesisConfig,
    chunker: Chunker,
}

impl SynthesisEngine {
    /// Create an engine. Fails if the configuration cannot make progress.
    pub fn new(backend: Arc<dyn GenerativeBackend>, config: SynthesisConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            chunker: Chunker::new(config.chunk_words),
            backend,
            config,
        })
    }

    /// Get the configuration.
    pub fn config(&self) -> &SynthesisConfig {
        &self.config
    }

    /// Synthesize a course from raw text.
    ///
    /// `document_name` titles the course when the merge call fails. Only
    /// cancellation is an error; backend failures degrade the output instead.
    pub async fn synthesize(
        &self,
        text: &str,
        document_name: &str,
        cancel: &CancellationToken,
    ) -> Result<SynthesizedCourse> {
        let started = Instant::now();
        let tasks = self.chunker.split(text);

        if tasks.is_empty() {
            info!("Nothing to synthesize for {document_name:?}, returning empty course");
            return Ok(SynthesizedCourse::fallback(document_name, Vec::new()));
        }

        info!(
            "Synthesizing {:?} with {}: {} chunks, up to {} in flight",
            document_name,
            self.backend.name(),
            tasks.len(),
            self.config.max_concurrency
        );

        let chapters = self.run_chunks(tasks, cancel).await?;

        let course = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!("Synthesis of {document_name:?} cancelled during merge");
                return Err(SynthesisError::Cancelled);
            }
            course = self.merge(document_name, chapters) => course,
        };

        info!(
            "Synthesized {:?}: {} chunks, {} failed, degraded={}, took {:?}",
            course.title,
            course.chapters.len(),
            course.failed_chunks,
            course.degraded,
            started.elapsed()
        );
        Ok(course)
    }

    /// Process every chunk and return one result per task, in index order.
    pub async fn run_chunks(
        &self,
        tasks: Vec<ChunkTask>,
        cancel: &CancellationToken,
    ) -> Result<Vec<ChunkResult>> {
        let total = tasks.len();
        let mut slots: Vec<Option<ChunkResult>> = vec![None; total];
        let mut pending: VecDeque<ChunkTask> = tasks.into();
        let mut in_flight: JoinSet<ChunkResult> = JoinSet::new();
        let mut completed = 0usize;

        while in_flight.len() < self.config.max_concurrency {
            let Some(task) = pending.pop_front() else {
                break;
            };
            self.spawn_chunk(&mut in_flight, task);
        }

        loop {
            let joined = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    warn!("Synthesis cancelled with {} chunks in flight", in_flight.len());
                    in_flight.detach_all();
                    return Err(SynthesisError::Cancelled);
                }
                joined = in_flight.join_next() => joined,
            };
            let Some(joined) = joined else {
                break;
            };

            match joined {
                Ok(result) => {
                    let index = result.index as usize;
                    match slots.get_mut(index) {
                        Some(slot) => *slot = Some(result),
                        None => warn!("Dropping result for unknown chunk index {index}"),
                    }
                }
                Err(e) => warn!("Chunk task did not complete: {e}"),
            }
            completed += 1;
            debug!("Chunk {completed}/{total} finished");

            if pending.is_empty() {
                continue;
            }
            if completed % self.config.batch_size == 0 && self.config.batch_delay_ms > 0 {
                debug!("Pacing for {:?} after {completed} chunks", self.config.batch_delay());
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        warn!("Synthesis cancelled while pacing");
                        in_flight.detach_all();
                        return Err(SynthesisError::Cancelled);
                    }
                    _ = tokio::time::sleep(self.config.batch_delay()) => {}
                }
            }
            if let Some(task) = pending.pop_front() {
                self.spawn_chunk(&mut in_flight, task);
            }
        }

        // Slots are addressed by chunk index, so this is already index order.
        Ok(slots
            .into_iter()
            .zip(0u32..)
            .map(|(slot, index)| {
                slot.unwrap_or_else(|| ChunkResult::sentinel(index, "chunk task aborted"))
            })
            .collect())
    }

    fn spawn_chunk(&self, set: &mut JoinSet<ChunkResult>, task: ChunkTask) {
        let backend = Arc::clone(&self.backend);
        let config = self.config.clone();
        set.spawn(async move { process_chunk(backend.as_ref(), &config, task).await });
    }

    /// One course-level call over all chunk results, with a local fallback.
    async fn merge(&self, document_name: &str, chapters: Vec<ChunkResult>) -> SynthesizedCourse {
        let input = merge_input(document_name, &chapters);
        let outcome = call_with_retry(
            self.backend.as_ref(),
            &self.config,
            COURSE_INSTRUCTIONS,
            &input,
            &course_schema(),
        )
        .await
        .and_then(CourseSummary::from_value);

        match outcome {
            Ok(summary) => SynthesizedCourse::from_summary(summary, document_name, chapters),
            Err(e) => {
                warn!("Course merge failed, using local fallback: {e}");
                SynthesizedCourse::fallback(document_name, chapters)
            }
        }
    }
}

/// Rewrite one chunk. Every failure becomes a sentinel here and nowhere else.
async fn process_chunk(
    backend: &dyn GenerativeBackend,
    config: &SynthesisConfig,
    task: ChunkTask,
) -> ChunkResult {
    let input = format!("{}.\n\n{}", task.position_label(), task.text);
    let outcome = call_with_retry(backend, config, CHUNK_INSTRUCTIONS, &input, &chunk_schema())
        .await
        .and_then(|value| ChunkResult::from_value(task.index, value));

    match outcome {
        Ok(result) => {
            debug!("{} done: {:?}", task.position_label(), result.title);
            result
        }
        Err(e) => {
            warn!("{} failed: {e}", task.position_label());
            ChunkResult::sentinel(task.index, &e.to_string())
        }
    }
}

/// Call the backend with a per-call timeout, retrying rate limits and timeouts.
async fn call_with_retry(
    backend: &dyn GenerativeBackend,
    config: &SynthesisConfig,
    instructions: &str,
    input: &str,
    schema: &JsonSchema,
) -> std::result::Result<Value, BackendError> {
    let mut attempt = 0u32;
    loop {
        let call = backend.complete(instructions, input, schema, config.max_output_tokens);
        let outcome = match tokio::time::timeout(config.call_timeout(), call).await {
            Ok(outcome) => outcome,
            Err(_) => Err(BackendError::Timeout {
                secs: config.call_timeout_secs,
            }),
        };

        match outcome {
            Err(e) if e.is_retryable() && attempt < config.max_retries => {
                attempt += 1;
                let wait = config
                    .retry_backoff(attempt)
                    .max(e.retry_after().unwrap_or_default());
                warn!(
                    "{} call failed ({e}), retry {attempt}/{} in {wait:?}",
                    schema.name, config.max_retries
                );
                tokio::time::sleep(wait).await;
            }
            outcome => return outcome,
        }
    }
}

fn merge_input(document_name: &str, chapters: &[ChunkResult]) -> String {
    let mut input = format!("Document: {document_name}\n\nChapters:\n");
    for chapter in chapters {
        input.push_str(&format!("{}. {}\n", chapter.chapter_number, chapter.title));
    }

    let objectives: Vec<&str> = chapters
        .iter()
        .flat_map(|c| c.learning_objectives.iter().map(String::as_str))
        .collect();
    if !objectives.is_empty() {
        input.push_str("\nLearning objectives:\n");
        for objective in objectives {
            input.push_str(&format!("- {objective}\n"));
        }
    }
    input
}
