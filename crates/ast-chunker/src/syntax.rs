//! Owned concrete syntax trees.
//!
//! Grammars hand back a [`SyntaxTree`]: an arena of typed, positioned nodes
//! that no longer borrows the parser. Nodes are stored in pre-order, so a
//! parent always has a smaller [`NodeId`] than its children.

use std::ops::Range;

/// Index of a node inside its [`SyntaxTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Zero-based row and byte column
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Point {
    pub row: usize,
    pub column: usize,
}

impl Point {
    #[must_use]
    pub const fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

/// A node of the syntax tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    kind: &'static str,
    byte_range: Range<usize>,
    start: Point,
    end: Point,
    children: Vec<NodeId>,
    is_error: bool,
}

impl Node {
    /// Grammar-specific type tag
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        self.kind
    }

    #[must_use]
    pub fn byte_range(&self) -> Range<usize> {
        self.byte_range.clone()
    }

    #[must_use]
    pub const fn start_byte(&self) -> usize {
        self.byte_range.start
    }

    #[must_use]
    pub const fn end_byte(&self) -> usize {
        self.byte_range.end
    }

    #[must_use]
    pub const fn start_position(&self) -> Point {
        self.start
    }

    #[must_use]
    pub const fn end_position(&self) -> Point {
        self.end
    }

    /// Child ids in document order
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Whether the grammar produced this node while recovering from an error
    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.is_error
    }
}

/// A parsed document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxTree {
    nodes: Vec<Node>,
    has_error: bool,
}

impl SyntaxTree {
    /// Tree made of a single childless root spanning `source`
    pub fn opaque(source: &str, kind: &'static str, has_error: bool) -> Self {
        let mut builder = TreeBuilder::new(source, kind);
        if has_error {
            builder.mark_error();
        }
        builder.finish()
    }

    #[must_use]
    pub const fn root(&self) -> NodeId {
        NodeId(0)
    }

    #[must_use]
    pub fn root_node(&self) -> &Node {
        &self.nodes[0]
    }

    /// Look up a node. Ids are only valid for the tree that produced them.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Whether the grammar reported syntax errors anywhere in the tree
    #[must_use]
    pub const fn has_error(&self) -> bool {
        self.has_error
    }

    /// Total number of nodes, root included
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Nodes in pre-order
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(idx, node)| (NodeId(idx), node))
    }

    /// Copy a tree-sitter tree into an owned arena.
    ///
    /// Walks with a cursor instead of recursion so deeply nested documents
    /// cannot exhaust the stack.
    pub fn from_tree_sitter(tree: &tree_sitter::Tree) -> Self {
        let root = tree.root_node();
        let mut nodes = vec![Node::from_ts(root)];
        let mut parents = vec![NodeId(0)];
        let mut cursor = root.walk();

        if cursor.goto_first_child() {
            'walk: loop {
                let id = NodeId(nodes.len());
                nodes.push(Node::from_ts(cursor.node()));
                if let Some(parent) = parents.last() {
                    nodes[parent.0].children.push(id);
                }

                if cursor.goto_first_child() {
                    parents.push(id);
                    continue;
                }

                while !cursor.goto_next_sibling() {
                    if !cursor.goto_parent() {
                        break 'walk;
                    }
                    parents.pop();
                }
            }
        }

        Self {
            nodes,
            has_error: root.has_error(),
        }
    }
}

impl Node {
    fn from_ts(node: tree_sitter::Node<'_>) -> Self {
        let start = node.start_position();
        let end = node.end_position();
        Self {
            kind: node.kind(),
            byte_range: node.start_byte()..node.end_byte(),
            start: Point::new(start.row, start.column),
            end: Point::new(end.row, end.column),
            children: Vec::new(),
            is_error: node.is_error() || node.is_missing(),
        }
    }
}

/// Incremental construction of a [`SyntaxTree`] for grammars that are not tree-sitter based.
///
/// The root spans the whole source. `open`/`close` nest nodes, `leaf` adds a
/// childless node under whatever is currently open.
pub struct TreeBuilder<'s> {
    lines: LineIndex,
    source: &'s str,
    nodes: Vec<Node>,
    open: Vec<NodeId>,
    has_error: bool,
}

impl<'s> TreeBuilder<'s> {
    pub fn new(source: &'s str, root_kind: &'static str) -> Self {
        let lines = LineIndex::new(source);
        let root = Node {
            kind: root_kind,
            byte_range: 0..source.len(),
            start: Point::default(),
            end: lines.point(source.len()),
            children: Vec::new(),
            is_error: false,
        };
        Self {
            lines,
            source,
            nodes: vec![root],
            open: vec![NodeId(0)],
            has_error: false,
        }
    }

    /// Add a childless node under the innermost open node
    pub fn leaf(&mut self, kind: &'static str, range: Range<usize>) -> NodeId {
        self.push(kind, range)
    }

    /// Open a node starting at `start`; children are added until `close`
    pub fn open(&mut self, kind: &'static str, start: usize) -> NodeId {
        let id = self.push(kind, start..start);
        self.open.push(id);
        id
    }

    /// Close the innermost open node at `end`
    pub fn close(&mut self, end: usize) {
        if self.open.len() <= 1 {
            return;
        }
        if let Some(id) = self.open.pop() {
            let end_point = self.lines.point(end);
            let node = &mut self.nodes[id.0];
            node.byte_range.end = end.max(node.byte_range.start);
            node.end = end_point;
        }
    }

    /// Mark the innermost open node (and the tree) as erroneous
    pub fn mark_error(&mut self) {
        self.has_error = true;
        if let Some(id) = self.open.last() {
            self.nodes[id.0].is_error = true;
        }
    }

    pub fn finish(mut self) -> SyntaxTree {
        let len = self.source.len();
        while self.open.len() > 1 {
            self.close(len);
        }
        SyntaxTree {
            nodes: self.nodes,
            has_error: self.has_error,
        }
    }

    fn push(&mut self, kind: &'static str, range: Range<usize>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            start: self.lines.point(range.start),
            end: self.lines.point(range.end),
            byte_range: range,
            children: Vec::new(),
            is_error: false,
        });
        if let Some(parent) = self.open.last() {
            self.nodes[parent.0].children.push(id);
        }
        id
    }
}

/// Byte offsets of line starts, for mapping offsets to rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            source
                .bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(idx, _)| idx + 1),
        );
        Self { line_starts }
    }

    /// Zero-based row containing `offset`
    #[must_use]
    pub fn row(&self, offset: usize) -> usize {
        self.line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1)
    }

    /// Row and byte column of `offset`
    #[must_use]
    pub fn point(&self, offset: usize) -> Point {
        let row = self.row(offset);
        Point::new(row, offset - self.line_starts[row])
    }
}
