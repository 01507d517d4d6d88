use crate::error::ConfigError;
use crate::language::Language;
use crate::metadata::MetadataTemplate;
use serde::{Deserialize, Serialize};

/// Configuration for a chunk builder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkerConfig {
    /// Maximum chunk size, measured with `size_metric` (hard limit)
    pub max_chunk_size: usize,

    /// Language identifier resolved through the grammar registry
    pub language: String,

    /// Name of the metadata template attached to every chunk
    pub metadata_template: String,

    /// Unit used for `max_chunk_size`
    pub size_metric: SizeMetric,

    /// What to do when the grammar reports syntax errors
    pub on_parse_error: ParseErrorPolicy,

    /// Prefix each chunk with its location and the headers of enclosing nodes.
    /// Expanded content no longer tiles the source and may exceed the budget.
    pub chunk_expansion: bool,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: 2000,
            language: Language::PlainText.as_str().to_string(),
            metadata_template: MetadataTemplate::Default.as_str().to_string(),
            size_metric: SizeMetric::Chars,
            on_parse_error: ParseErrorPolicy::BestEffort,
            chunk_expansion: false,
        }
    }
}

impl ChunkerConfig {
    /// Create config for a language and budget with default template and metric
    pub fn new(language: impl Into<String>, max_chunk_size: usize) -> Self {
        Self {
            language: language.into(),
            max_chunk_size,
            ..Default::default()
        }
    }

    /// Builder: set metadata template
    #[must_use]
    pub fn metadata_template(mut self, name: impl Into<String>) -> Self {
        self.metadata_template = name.into();
        self
    }

    /// Builder: set size metric
    #[must_use]
    pub const fn size_metric(mut self, metric: SizeMetric) -> Self {
        self.size_metric = metric;
        self
    }

    /// Builder: set parse error policy
    #[must_use]
    pub const fn on_parse_error(mut self, policy: ParseErrorPolicy) -> Self {
        self.on_parse_error = policy;
        self
    }

    /// Builder: enable or disable context headers
    #[must_use]
    pub const fn chunk_expansion(mut self, on: bool) -> Self {
        self.chunk_expansion = on;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_chunk_size == 0 {
            return Err(ConfigError::InvalidChunkSize(self.max_chunk_size));
        }

        self.language.parse::<Language>()?;
        self.metadata_template.parse::<MetadataTemplate>()?;

        Ok(())
    }
}

/// Unit in which chunk sizes are measured
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeMetric {
    /// Unicode scalar values
    #[default]
    Chars,

    /// UTF-8 bytes
    Bytes,

    /// Unicode scalar values that are not whitespace
    NonWhitespaceChars,
}

/// Handling of trees the grammar marked as containing errors
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseErrorPolicy {
    /// Pack whatever nodes the grammar recovered
    #[default]
    BestEffort,

    /// Discard the degraded tree and pack line by line
    SplitLines,
}
