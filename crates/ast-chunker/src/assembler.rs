use crate::metadata::{Annotator, MetadataTemplate, RepoContext};
use crate::packer::ChunkDescriptor;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A chunk as handed to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Exact source slice covered by the chunk
    pub content: String,

    /// Template-defined metadata
    pub metadata: Map<String, Value>,
}

impl ChunkRecord {
    /// Metadata value by key
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    /// Number of lines spanned by the content
    #[must_use]
    pub fn line_count(&self) -> usize {
        let newlines = self.content.matches('\n').count();
        if self.content.ends_with('\n') {
            newlines
        } else {
            newlines + 1
        }
    }
}

/// Materialize descriptors as records, in document order
pub fn assemble(
    descriptors: &[ChunkDescriptor],
    source: &str,
    template: MetadataTemplate,
    context: &RepoContext,
) -> Vec<ChunkRecord> {
    let annotator = Annotator::new(source, template, context);
    descriptors
        .iter()
        .enumerate()
        .map(|(index, descriptor)| ChunkRecord {
            content: source[descriptor.byte_range.clone()].to_string(),
            metadata: annotator.annotate(descriptor, index),
        })
        .collect()
}

/// Like [`assemble`], but every content starts with a context header: the
/// location of the chunk, then one `> ` line per enclosing node header.
///
/// Metadata still describes the bare source slice.
pub fn assemble_expanded(
    descriptors: &[ChunkDescriptor],
    source: &str,
    template: MetadataTemplate,
    context: &RepoContext,
) -> Vec<ChunkRecord> {
    let annotator = Annotator::new(source, template, context);
    descriptors
        .iter()
        .enumerate()
        .map(|(index, descriptor)| {
            let (start_line, end_line) = annotator.line_span(&descriptor.byte_range);
            let mut content = match context.filepath.as_deref() {
                Some(path) => format!("{path}:{start_line}-{end_line}\n"),
                None => format!("lines {start_line}-{end_line}\n"),
            };
            for header in &descriptor.ancestors {
                content.push_str("> ");
                content.push_str(source[header.clone()].trim_end());
                content.push('\n');
            }
            content.push_str(&source[descriptor.byte_range.clone()]);

            ChunkRecord {
                content,
                metadata: annotator.annotate(descriptor, index),
            }
        })
        .collect()
}
