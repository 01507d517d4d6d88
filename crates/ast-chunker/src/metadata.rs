use crate::error::ConfigError;
use crate::packer::ChunkDescriptor;
use crate::syntax::LineIndex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

/// Maximum number of node types listed in `node_types`
const DOMINANT_NODE_TYPES: usize = 3;

/// Named selection of metadata fields attached to every chunk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum MetadataTemplate {
    /// No metadata at all
    None,
    /// Positions, sizes and node types
    #[default]
    Default,
    /// Repository-level retrieval evaluation layout
    RepoEval,
    /// Issue-resolution retrieval layout
    SweBenchLite,
}

impl MetadataTemplate {
    /// Every template, in a stable order
    pub const ALL: [MetadataTemplate; 4] = [
        MetadataTemplate::None,
        MetadataTemplate::Default,
        MetadataTemplate::RepoEval,
        MetadataTemplate::SweBenchLite,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Default => "default",
            Self::RepoEval => "coderagbench-repoeval",
            Self::SweBenchLite => "coderagbench-swebench-lite",
        }
    }

    /// Keys present in every mapping produced with this template
    #[must_use]
    pub const fn fields(self) -> &'static [&'static str] {
        match self {
            Self::None => &[],
            Self::Default => &[
                "chunk_index",
                "start_line",
                "end_line",
                "char_count",
                "line_count",
                "start_byte",
                "end_byte",
                "chunk_size",
                "node_count",
                "node_types",
                "filepath",
            ],
            Self::RepoEval => &[
                "chunk_index",
                "fpath_tuple",
                "repo",
                "start_line_no",
                "end_line_no",
                "window_size",
                "char_count",
            ],
            Self::SweBenchLite => &["_id", "title", "chunk_index", "char_count"],
        }
    }
}

impl FromStr for MetadataTemplate {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|template| template.as_str() == s.trim())
            .ok_or_else(|| ConfigError::unknown_template(s))
    }
}

impl fmt::Display for MetadataTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a document lives, for templates that describe it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoContext {
    /// Path of the document, `/`-separated
    pub filepath: Option<String>,

    /// Repository the document belongs to
    pub repo: Option<String>,
}

impl RepoContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set file path
    #[must_use]
    pub fn filepath(mut self, path: impl Into<String>) -> Self {
        self.filepath = Some(path.into());
        self
    }

    /// Builder: set repository name
    #[must_use]
    pub fn repo(mut self, repo: impl Into<String>) -> Self {
        self.repo = Some(repo.into());
        self
    }
}

/// Computes metadata for descriptors of one source document
pub struct Annotator<'a> {
    source: &'a str,
    lines: LineIndex,
    template: MetadataTemplate,
    context: &'a RepoContext,
}

impl<'a> Annotator<'a> {
    pub fn new(source: &'a str, template: MetadataTemplate, context: &'a RepoContext) -> Self {
        Self {
            source,
            lines: LineIndex::new(source),
            template,
            context,
        }
    }

    /// One-based first and last line of `range`; the last line is the one
    /// holding its final byte
    pub(crate) fn line_span(&self, range: &Range<usize>) -> (usize, usize) {
        let start_line = self.lines.row(range.start) + 1;
        let end_line = self.lines.row(range.end.saturating_sub(1).max(range.start)) + 1;
        (start_line, end_line)
    }

    /// Metadata for the `chunk_index`-th descriptor
    pub fn annotate(&self, descriptor: &ChunkDescriptor, chunk_index: usize) -> Map<String, Value> {
        let range = &descriptor.byte_range;
        let content = &self.source[range.clone()];
        let (start_line, end_line) = self.line_span(range);
        let char_count = content.chars().count();
        let filepath = self.context.filepath.as_deref();

        let value = match self.template {
            MetadataTemplate::None => json!({}),
            MetadataTemplate::Default => json!({
                "chunk_index": chunk_index,
                "start_line": start_line,
                "end_line": end_line,
                "char_count": char_count,
                "line_count": end_line - start_line + 1,
                "start_byte": range.start,
                "end_byte": range.end,
                "chunk_size": descriptor.size,
                "node_count": descriptor.node_kinds.len(),
                "node_types": dominant_node_types(&descriptor.node_kinds),
                "filepath": filepath,
            }),
            MetadataTemplate::RepoEval => json!({
                "chunk_index": chunk_index,
                "fpath_tuple": filepath.map(|path| path.split('/').collect::<Vec<_>>()),
                "repo": self.context.repo,
                "start_line_no": start_line,
                "end_line_no": end_line,
                "window_size": end_line - start_line + 1,
                "char_count": char_count,
            }),
            MetadataTemplate::SweBenchLite => {
                let id = match filepath {
                    Some(path) => format!("{path}_{start_line}-{end_line}"),
                    None => format!("{chunk_index}_{start_line}-{end_line}"),
                };
                json!({
                    "_id": id,
                    "title": filepath,
                    "chunk_index": chunk_index,
                    "char_count": char_count,
                })
            }
        };

        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }
}

/// Metadata for a single descriptor without repository context
pub fn annotate(
    descriptor: &ChunkDescriptor,
    template: MetadataTemplate,
    chunk_index: usize,
    source: &str,
) -> Map<String, Value> {
    let context = RepoContext::default();
    Annotator::new(source, template, &context).annotate(descriptor, chunk_index)
}

/// Most frequent kinds first; ties keep document order
fn dominant_node_types(kinds: &[&'static str]) -> Vec<&'static str> {
    let mut counts: HashMap<&'static str, (usize, usize)> = HashMap::new();
    for (position, kind) in kinds.iter().enumerate() {
        counts.entry(*kind).or_insert((0, position)).0 += 1;
    }

    let mut ranked: Vec<_> = counts.into_iter().collect();
    ranked.sort_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
        count_b.cmp(count_a).then_with(|| first_a.cmp(first_b))
    });
    ranked
        .into_iter()
        .take(DOMINANT_NODE_TYPES)
        .map(|(kind, _)| kind)
        .collect()
}
