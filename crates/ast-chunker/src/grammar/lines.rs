use super::physical_lines;
use crate::syntax::{SyntaxTree, TreeBuilder};

/// Every line with visible content becomes a `line` leaf; blank lines and
/// line breaks are left as separators between leaves.
pub(crate) fn parse(source: &str) -> SyntaxTree {
    let mut builder = TreeBuilder::new(source, "document");
    for (start, text) in physical_lines(source) {
        if !text.trim().is_empty() {
            builder.leaf("line", start..start + text.len());
        }
    }
    builder.finish()
}
