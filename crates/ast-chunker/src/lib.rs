//! # Context AST Chunker
//!
//! Structure-aware chunking of source code, configuration and markup for
//! retrieval and embedding pipelines.
//!
//! ## Philosophy
//!
//! Fixed-width or line-based splitting cuts statements and blocks in half.
//! This crate partitions documents along syntax-tree boundaries instead:
//! - Chunks never exceed the configured budget
//! - Chunks tile the source exactly, in order, with nothing dropped
//! - Malformed input degrades chunk quality, never loses text
//!
//! ## Architecture
//!
//! ```text
//! Source Text + Language + Budget + Template
//!     │
//!     ├──> Grammar Resolution (language registry, built once)
//!     │
//!     ├──> Parsing → SyntaxTree (tree-sitter or line grammar)
//!     │
//!     ├──> Packing
//!     │    ├─> Greedy fill of sibling nodes
//!     │    ├─> Descend into nodes that overflow alone
//!     │    └─> Force-split oversized leaves
//!     │
//!     └──> Assembly
//!          ├─> Slice content by descriptor
//!          ├─> Optional context header (location, enclosing nodes)
//!          └─> Annotate with template metadata
//! ```
//!
//! ## Example
//!
//! ```rust
//! use context_ast_chunker::ChunkBuilder;
//!
//! let builder = ChunkBuilder::new(150, "yaml", "default").unwrap();
//! let chunks = builder.chunkify("timeout: 30\nretries: 3\ndebug: true\n");
//!
//! assert_eq!(chunks.len(), 1);
//! for chunk in &chunks {
//!     println!("Chunk {} at lines {}-{}",
//!              chunk.metadata["chunk_index"],
//!              chunk.metadata["start_line"],
//!              chunk.metadata["end_line"]);
//! }
//! ```

mod assembler;
mod chunker;
mod config;
mod error;
mod grammar;
mod language;
mod metadata;
mod packer;
mod size;
mod syntax;

pub use assembler::{assemble, assemble_expanded, ChunkRecord};
pub use chunker::{ChunkBuilder, ChunkingStats};
pub use config::{ChunkerConfig, ParseErrorPolicy, SizeMetric};
pub use error::{ChunkerError, ConfigError, Result};
pub use grammar::Grammar;
pub use language::Language;
pub use metadata::{annotate, Annotator, MetadataTemplate, RepoContext};
pub use packer::{pack, ChunkDescriptor};
pub use syntax::{LineIndex, Node, NodeId, Point, SyntaxTree, TreeBuilder};
