use thiserror::Error;

/// Result type for chunker operations
pub type Result<T> = std::result::Result<T, ChunkerError>;

/// Errors that can occur while building or running a chunker
#[derive(Error, Debug)]
pub enum ChunkerError {
    /// Builder configuration was rejected
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// The grammar recovered from syntax errors while parsing
    #[error("Source did not parse cleanly as {language}")]
    ParseDegraded { language: String },

    /// IO error occurred
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ChunkerError {
    /// Create a parse-degraded error
    pub fn parse_degraded(language: impl Into<String>) -> Self {
        Self::ParseDegraded {
            language: language.into(),
        }
    }

    /// Whether this error was raised while validating configuration
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

/// Configuration problems, reported when a builder is constructed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No grammar is registered for the language identifier
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// Metadata template name is not recognized
    #[error("Unknown metadata template: {0}")]
    UnknownTemplate(String),

    /// Chunk budget must be positive
    #[error("max_chunk_size must be > 0, got {0}")]
    InvalidChunkSize(usize),

    /// The grammar is registered but the parser runtime refused it
    #[error("Grammar for {language} could not be loaded: {reason}")]
    Grammar { language: String, reason: String },
}

impl ConfigError {
    /// Create an unsupported language error
    pub fn unsupported_language(lang: impl Into<String>) -> Self {
        Self::UnsupportedLanguage(lang.into())
    }

    /// Create an unknown template error
    pub fn unknown_template(name: impl Into<String>) -> Self {
        Self::UnknownTemplate(name.into())
    }

    /// Create a grammar loading error
    pub fn grammar(language: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Grammar {
            language: language.into(),
            reason: reason.into(),
        }
    }
}
