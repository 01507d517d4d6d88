use crate::assembler::{assemble, assemble_expanded, ChunkRecord};
use crate::config::{ChunkerConfig, ParseErrorPolicy};
use crate::error::{ChunkerError, ConfigError, Result};
use crate::grammar::Grammar;
use crate::language::Language;
use crate::metadata::{MetadataTemplate, RepoContext};
use crate::packer::pack;
use crate::syntax::SyntaxTree;
use std::path::Path;

/// Validated chunking configuration bound to a grammar.
///
/// Holds no per-call state, so one builder can serve many threads.
#[derive(Debug, Clone)]
pub struct ChunkBuilder {
    config: ChunkerConfig,
    language: Language,
    template: MetadataTemplate,
    grammar: Grammar,
}

impl ChunkBuilder {
    /// Create a builder for `language` with a budget and a metadata template
    pub fn new(max_chunk_size: usize, language: &str, metadata_template: &str) -> Result<Self> {
        Self::from_config(
            ChunkerConfig::new(language, max_chunk_size).metadata_template(metadata_template),
        )
    }

    /// Create a builder from a full configuration
    pub fn from_config(config: ChunkerConfig) -> Result<Self> {
        config.validate()?;

        let language: Language = config.language.parse()?;
        let template: MetadataTemplate = config.metadata_template.parse()?;
        let grammar = language.grammar();
        grammar
            .check()
            .map_err(|reason| ConfigError::grammar(language.as_str(), reason))?;

        Ok(Self {
            config,
            language,
            template,
            grammar,
        })
    }

    /// Split `source` into chunk records
    pub fn chunkify(&self, source: &str) -> Vec<ChunkRecord> {
        self.chunkify_with(source, &RepoContext::default())
    }

    /// Split `source` into chunk records, describing it with `context`
    pub fn chunkify_with(&self, source: &str, context: &RepoContext) -> Vec<ChunkRecord> {
        if source.is_empty() {
            return Vec::new();
        }

        let tree = self.tree_for_packing(source);
        let descriptors = pack(
            &tree,
            source,
            self.config.max_chunk_size,
            self.config.size_metric,
        );
        drop(tree);

        let records = if self.config.chunk_expansion {
            assemble_expanded(&descriptors, source, self.template, context)
        } else {
            assemble(&descriptors, source, self.template, context)
        };
        log::debug!(
            "Chunked {} bytes of {} into {} chunks",
            source.len(),
            self.language,
            records.len()
        );
        records
    }

    /// Like [`chunkify`](Self::chunkify), but reject sources that do not parse cleanly
    pub fn chunkify_checked(&self, source: &str) -> Result<Vec<ChunkRecord>> {
        if self.parse(source).has_error() {
            return Err(ChunkerError::parse_degraded(self.language.as_str()));
        }
        Ok(self.chunkify(source))
    }

    /// Read and chunk a file; its path is recorded in the metadata context
    pub fn chunkify_file(&self, path: impl AsRef<Path>) -> Result<Vec<ChunkRecord>> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let context = RepoContext::new().filepath(path.to_string_lossy());

        Ok(self.chunkify_with(&content, &context))
    }

    /// Parse `source` with this builder's grammar, for callers that inspect
    /// `has_error()` before chunking
    pub fn parse(&self, source: &str) -> SyntaxTree {
        self.grammar.parse(source)
    }

    /// Resolved language
    #[must_use]
    pub const fn language(&self) -> Language {
        self.language
    }

    /// Resolved metadata template
    #[must_use]
    pub const fn template(&self) -> MetadataTemplate {
        self.template
    }

    /// Get configuration
    #[must_use]
    pub const fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Get chunking statistics
    #[must_use]
    pub fn stats(&self, chunks: &[ChunkRecord]) -> ChunkingStats {
        let sizes: Vec<usize> = chunks
            .iter()
            .map(|chunk| self.config.size_metric.measure(&chunk.content))
            .collect();
        let total_size: usize = sizes.iter().sum();

        ChunkingStats {
            total_chunks: chunks.len(),
            total_lines: chunks.iter().map(ChunkRecord::line_count).sum(),
            total_size,
            avg_size_per_chunk: if chunks.is_empty() {
                0
            } else {
                total_size / chunks.len()
            },
            min_size: sizes.iter().copied().min().unwrap_or(0),
            max_size: sizes.iter().copied().max().unwrap_or(0),
        }
    }

    fn tree_for_packing(&self, source: &str) -> SyntaxTree {
        let tree = self.grammar.parse(source);
        if !tree.has_error() {
            return tree;
        }

        match self.config.on_parse_error {
            ParseErrorPolicy::BestEffort => {
                log::debug!("{} source parsed with errors, packing recovered tree", self.language);
                tree
            }
            ParseErrorPolicy::SplitLines => {
                log::warn!(
                    "{} source parsed with errors, falling back to line splitting",
                    self.language
                );
                Grammar::Lines.parse(source)
            }
        }
    }
}

/// Statistics about chunking results, in the builder's size metric
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkingStats {
    pub total_chunks: usize,
    pub total_lines: usize,
    pub total_size: usize,
    pub avg_size_per_chunk: usize,
    pub min_size: usize,
    pub max_size: usize,
}

impl std::fmt::Display for ChunkingStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Chunks: {} | Lines: {} | Size: {} | Avg: {} | Range: {}-{}",
            self.total_chunks,
            self.total_lines,
            self.total_size,
            self.avg_size_per_chunk,
            self.min_size,
            self.max_size
        )
    }
}
