//! Configuration for the synthesis engine.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SynthesisError};

/// Configuration for chunked synthesis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Word budget per chunk.
    pub chunk_words: usize,

    /// Maximum chunk calls in flight at once.
    pub max_concurrency: usize,

    /// A pacing delay follows every `batch_size` completed chunks.
    pub batch_size: usize,

    /// Pacing delay in milliseconds.
    pub batch_delay_ms: u64,

    /// Timeout for a single backend call in seconds.
    pub call_timeout_secs: u64,

    /// Retries for rate-limited or timed-out calls.
    pub max_retries: u32,

    /// Linear backoff step between retries in milliseconds.
    pub retry_backoff_ms: u64,

    /// Output token budget for chunk and merge calls.
    pub max_output_tokens: u32,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            chunk_words: 1500,
            max_concurrency: 4,
            batch_size: 4,
            batch_delay_ms: 1000,
            call_timeout_secs: 120,
            max_retries: 2,
            retry_backoff_ms: 2000,
            max_output_tokens: 4096,
        }
    }
}

impl SynthesisConfig {
    /// Set the chunk word budget.
    pub fn with_chunk_words(mut self, words: usize) -> Self {
        self.chunk_words = words;
        self
    }

    /// Set the concurrency limit.
    pub fn with_max_concurrency(mut self, n: usize) -> Self {
        self.max_concurrency = n;
        self
    }

    /// Set batch pacing.
    pub fn with_batching(mut self, batch_size: usize, delay_ms: u64) -> Self {
        self.batch_size = batch_size;
        self.batch_delay_ms = delay_ms;
        self
    }

    /// Set the per-call timeout.
    pub fn with_call_timeout_secs(mut self, secs: u64) -> Self {
        self.call_timeout_secs = secs;
        self
    }

    /// Set retry behaviour.
    pub fn with_retries(mut self, max_retries: u32, backoff_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.retry_backoff_ms = backoff_ms;
        self
    }

    /// Reject configurations that cannot make progress.
    pub fn validate(&self) -> Result<()> {
        let zero = [
            ("chunk_words", self.chunk_words == 0),
            ("max_concurrency", self.max_concurrency == 0),
            ("batch_size", self.batch_size == 0),
            ("call_timeout_secs", self.call_timeout_secs == 0),
            ("max_output_tokens", self.max_output_tokens == 0),
        ];
        if let Some((name, _)) = zero.iter().find(|(_, is_zero)| *is_zero) {
            return Err(SynthesisError::InvalidConfig(format!("{name} must be positive")));
        }
        Ok(())
    }

    /// Per-call timeout.
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    /// Pacing delay.
    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    /// Wait before retry number `attempt` (1-based).
    pub fn retry_backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.retry_backoff_ms.saturating_mul(u64::from(attempt)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_are_valid() {
        assert!(SynthesisConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_values_rejected() {
        let err = SynthesisConfig::default()
            .with_max_concurrency(0)
            .validate()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid synthesis configuration: max_concurrency must be positive"
        );

        assert!(SynthesisConfig::default().with_chunk_words(0).validate().is_err());
        assert!(SynthesisConfig::default().with_batching(0, 10).validate().is_err());
    }

    #[test]
    fn test_backoff_is_linear() {
        let config = SynthesisConfig::default().with_retries(3, 500);
        assert_eq!(config.retry_backoff(1), Duration::from_millis(500));
        assert_eq!(config.retry_backoff(3), Duration::from_millis(1500));
    }

    #[test]
    fn test_missing_fields_default() {
        let config: SynthesisConfig = serde_json::from_str(r#"{"chunk_words": 300}"#).unwrap();
        assert_eq!(config.chunk_words, 300);
        assert_eq!(config.max_concurrency, 4);
    }
}
