//! Configuration for the program extractor

use crate::model::DEFAULT_MODEL;

/// Configuration for the assisted extraction stage
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Maximum number of characters of page content sent to the model
    pub max_content_chars: usize,

    /// Completion model name
    pub model: String,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            max_content_chars: 12_000,
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

/// Builder for ExtractorConfig
#[derive(Debug, Default)]
pub struct ExtractorConfigBuilder {
    config: ExtractorConfig,
}

impl ExtractorConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the character budget for page content
    pub fn max_content_chars(mut self, max_content_chars: usize) -> Self {
        self.config.max_content_chars = max_content_chars;
        self
    }

    /// Set the completion model name
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn build(self) -> ExtractorConfig {
        self.config
    }
}

impl ExtractorConfig {
    pub fn builder() -> ExtractorConfigBuilder {
        ExtractorConfigBuilder::new()
    }
}
