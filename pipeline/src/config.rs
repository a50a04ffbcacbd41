//! Pipeline configuration, loadable from TOML.
//!
//! ```toml
//! [classifier]
//! heading_size_ratio = 1.15
//!
//! [synthesis]
//! chunk_words = 800
//! max_concurrency = 2
//! ```
//!
//! Missing tables and keys take their defaults.

use std::path::Path;

use coursegen_structure::{ClassifierConfig, OutlineConfig};
use coursegen_synthesis::SynthesisConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

/// Configuration for the whole pipeline.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Structure classifier thresholds.
    pub classifier: ClassifierConfig,

    /// Textbook conversion settings.
    pub outline: OutlineConfig,

    /// Chunked synthesis settings.
    pub synthesis: SynthesisConfig,
}

impl PipelineConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        debug!("Loaded pipeline configuration from {}", path.display());
        Ok(config)
    }

    /// Set the classifier configuration.
    pub fn with_classifier(mut self, config: ClassifierConfig) -> Self {
        self.classifier = config;
        self
    }

    /// Set the synthesis configuration.
    pub fn with_synthesis(mut self, config: SynthesisConfig) -> Self {
        self.synthesis = config;
        self
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<()> {
        self.classifier.validate()?;
        self.synthesis.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = PipelineConfig::from_toml_str(
            "[synthesis]\nchunk_words = 800\n\n[outline]\nwords_per_minute = 150\n",
        )
        .unwrap();

        assert_eq!(config.synthesis.chunk_words, 800);
        assert_eq!(config.synthesis.max_concurrency, 4);
        assert_eq!(config.outline.words_per_minute, 150);
        assert_eq!(config.classifier, ClassifierConfig::default());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[classifier]\nheading_size_ratio = 1.2").unwrap();

        let config = PipelineConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(config.classifier.heading_size_ratio, 1.2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            PipelineConfig::from_toml_str("synthesis = 3"),
            Err(PipelineError::Config(_))
        ));
        assert!(matches!(
            PipelineConfig::from_toml_file("/definitely/not/here.toml"),
            Err(PipelineError::Io(_))
        ));

        let config = PipelineConfig::default()
            .with_synthesis(SynthesisConfig::default().with_max_concurrency(0));
        assert!(matches!(config.validate(), Err(PipelineError::Synthesis(_))));
    }
}
