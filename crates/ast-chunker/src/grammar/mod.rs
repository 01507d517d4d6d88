//! Grammars: one parsing interface over tree-sitter languages and the
//! plain line grammar.

mod lines;

use crate::syntax::SyntaxTree;
use std::fmt;
use tree_sitter::Parser;

/// Kind of the childless root produced when no tree could be built
pub(crate) const UNPARSED_KIND: &str = "ERROR";

/// A parser capable of turning source text into a [`SyntaxTree`]
#[derive(Clone)]
pub enum Grammar {
    /// Generated tree-sitter grammar
    TreeSitter(tree_sitter::Language),
    /// One leaf per non-blank line
    Lines,
}

impl Grammar {
    /// Verify the grammar can be loaded by the parser runtime
    pub fn check(&self) -> Result<(), String> {
        match self {
            Grammar::TreeSitter(language) => Parser::new()
                .set_language(language)
                .map_err(|e| e.to_string()),
            Grammar::Lines => Ok(()),
        }
    }

    /// Parse `source`. Never fails: unparseable input yields a tree whose
    /// root has no children and `has_error()` set.
    pub fn parse(&self, source: &str) -> SyntaxTree {
        match self {
            Grammar::TreeSitter(language) => {
                let mut parser = Parser::new();
                if let Err(e) = parser.set_language(language) {
                    log::warn!("Failed to set tree-sitter language: {e}");
                    return SyntaxTree::opaque(source, UNPARSED_KIND, true);
                }
                match parser.parse(source, None) {
                    Some(tree) => SyntaxTree::from_tree_sitter(&tree),
                    None => SyntaxTree::opaque(source, UNPARSED_KIND, true),
                }
            }
            Grammar::Lines => lines::parse(source),
        }
    }
}

impl fmt::Debug for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Grammar::TreeSitter(_) => f.write_str("TreeSitter"),
            Grammar::Lines => f.write_str("Lines"),
        }
    }
}

/// Physical lines as `(start offset, text)`, text without `\n` or a trailing `\r`
pub(crate) fn physical_lines(source: &str) -> Vec<(usize, &str)> {
    let mut out = Vec::new();
    let mut start = 0;
    for line in source.split_inclusive('\n') {
        let text = line.strip_suffix('\n').unwrap_or(line);
        let text = text.strip_suffix('\r').unwrap_or(text);
        out.push((start, text));
        start += line.len();
    }
    out
}
