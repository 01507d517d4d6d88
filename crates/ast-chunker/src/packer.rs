//! Greedy structure-aware packing.
//!
//! Children of a node are packed into a buffer while they fit the budget.
//! A child that cannot fit even on its own is descended into as a fresh
//! sub-problem; a leaf that cannot fit is force-split. The walk keeps an
//! explicit stack of frames, one per node being descended into.
//!
//! Separators between siblings are never dropped. A gap is divided at its
//! first line break: bytes through that `\n` trail the preceding node, the
//! rest leads the following node. The descriptors therefore tile the source
//! exactly.

use crate::config::SizeMetric;
use crate::size::{force_split, Piece};
use crate::syntax::{Node, NodeId, SyntaxTree};
use std::collections::VecDeque;
use std::ops::Range;

/// A contiguous part of the source selected to become one chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkDescriptor {
    /// Byte range into the source
    pub byte_range: Range<usize>,

    /// Size of the range in the packer's metric
    pub size: usize,

    /// Type tags of the nodes packed into this chunk, in document order
    pub node_kinds: Vec<&'static str>,

    /// First lines of the enclosing nodes that open before this chunk,
    /// outermost first
    pub ancestors: Vec<Range<usize>>,
}

/// Pack `tree` (parsed from `source`) into descriptors of at most
/// `max_chunk_size` units each.
///
/// Empty sources produce no descriptors. Every byte of a non-empty source
/// belongs to exactly one descriptor, in order.
pub fn pack(
    tree: &SyntaxTree,
    source: &str,
    max_chunk_size: usize,
    metric: SizeMetric,
) -> Vec<ChunkDescriptor> {
    if source.is_empty() {
        return Vec::new();
    }
    Packer {
        tree,
        source,
        budget: max_chunk_size.max(1),
        metric,
    }
    .run()
}

#[derive(Debug)]
enum Item {
    /// A child with the separators attached to it
    Segment {
        lead: usize,
        node: NodeId,
        range: Range<usize>,
        trail_end: usize,
    },
    /// A child on its own
    Node { node: NodeId, range: Range<usize> },
    /// Separator or unparsed bytes. Leading runs prefer the following node,
    /// trailing runs prefer the chunk before them.
    Loose { range: Range<usize>, leading: bool },
}

#[derive(Debug, Default)]
struct Buffer {
    range: Range<usize>,
    size: usize,
    kinds: Vec<&'static str>,
}

impl Buffer {
    fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    fn extend(&mut self, range: Range<usize>, size: usize, kind: Option<&'static str>) {
        if self.is_empty() {
            self.range = range;
        } else {
            debug_assert_eq!(self.range.end, range.start, "buffer must stay contiguous");
            self.range.end = range.end;
        }
        self.size += size;
        self.kinds.extend(kind);
    }
}

struct Frame {
    items: VecDeque<Item>,
    buffer: Buffer,
    /// Header lines of the nodes descended into to reach this frame
    headers: Vec<Range<usize>>,
}

struct Packer<'a> {
    tree: &'a SyntaxTree,
    source: &'a str,
    budget: usize,
    metric: SizeMetric,
}

impl Packer<'_> {
    fn run(&self) -> Vec<ChunkDescriptor> {
        let mut out = Vec::new();
        let whole = 0..self.source.len();
        let root = self.tree.root_node();

        let items = if root.is_leaf() {
            VecDeque::from([Item::Node {
                node: self.tree.root(),
                range: whole,
            }])
        } else {
            self.segments(root.children(), whole)
        };

        let mut stack = vec![Frame {
            items,
            buffer: Buffer::default(),
            headers: Vec::new(),
        }];

        while let Some(frame) = stack.last_mut() {
            match frame.items.pop_front() {
                Some(item) => {
                    if let Some(child) = self.step(frame, item, &mut out) {
                        stack.push(child);
                    }
                }
                None => {
                    if let Some(mut done) = stack.pop() {
                        self.flush(&mut done.buffer, &done.headers, &mut out);
                    }
                }
            }
        }

        out
    }

    /// Place one item; returns a frame to descend into when a node must be split
    fn step(&self, frame: &mut Frame, item: Item, out: &mut Vec<ChunkDescriptor>) -> Option<Frame> {
        match item {
            Item::Segment {
                lead,
                node,
                range,
                trail_end,
            } => {
                let kind = self.tree.node(node).kind();
                let size = self.measure(lead..trail_end);
                if frame.buffer.size + size <= self.budget {
                    frame.buffer.extend(lead..trail_end, size, Some(kind));
                    return None;
                }

                self.flush(&mut frame.buffer, &frame.headers, out);
                if size <= self.budget {
                    frame.buffer.extend(lead..trail_end, size, Some(kind));
                    return None;
                }

                // Too big with its separators: place the pieces one by one.
                frame.items.push_front(Item::Loose {
                    range: range.end..trail_end,
                    leading: false,
                });
                frame.items.push_front(Item::Node {
                    node,
                    range: range.clone(),
                });
                frame.items.push_front(Item::Loose {
                    range: lead..range.start,
                    leading: true,
                });
                None
            }
            Item::Node { node, range } => {
                let node_ref = self.tree.node(node);
                let size = self.measure(range.clone());
                if frame.buffer.size + size <= self.budget {
                    frame.buffer.extend(range, size, Some(node_ref.kind()));
                    return None;
                }

                self.flush(&mut frame.buffer, &frame.headers, out);
                if size <= self.budget {
                    frame.buffer.extend(range, size, Some(node_ref.kind()));
                    return None;
                }

                if !node_ref.is_leaf() {
                    log::trace!(
                        "Descending into oversized {} node ({size} > {})",
                        node_ref.kind(),
                        self.budget
                    );
                    let mut headers = frame.headers.clone();
                    headers.extend(self.header(node_ref));
                    return Some(Frame {
                        items: self.segments(node_ref.children(), range),
                        buffer: Buffer::default(),
                        headers,
                    });
                }

                self.emit_split(range, Some(node_ref.kind()), &frame.headers, out);
                None
            }
            Item::Loose { range, leading } => {
                if range.is_empty() {
                    return None;
                }
                let size = self.measure(range.clone());
                if !frame.buffer.is_empty() {
                    if frame.buffer.size + size <= self.budget {
                        frame.buffer.extend(range, size, None);
                        return None;
                    }
                    self.flush(&mut frame.buffer, &frame.headers, out);
                }

                if !leading && self.absorb(out, &range, size) {
                    return None;
                }
                if size <= self.budget {
                    frame.buffer.extend(range, size, None);
                    return None;
                }

                self.emit_split(range, None, &frame.headers, out);
                None
            }
        }
    }

    /// Children of a region as segments, plus any unclaimed tail of the region
    fn segments(&self, children: &[NodeId], region: Range<usize>) -> VecDeque<Item> {
        let mut items = VecDeque::with_capacity(children.len() + 1);
        let mut cursor = region.start;

        for (idx, id) in children.iter().enumerate() {
            let node = self.tree.node(*id);
            let start = node.start_byte().clamp(cursor, region.end);
            let end = node.end_byte().clamp(start, region.end);
            let next_start = children
                .get(idx + 1)
                .map_or(region.end, |next| {
                    self.tree.node(*next).start_byte().clamp(end, region.end)
                });
            let trail_end = self.source[end..next_start]
                .find('\n')
                .map_or(end, |offset| end + offset + 1);

            items.push_back(Item::Segment {
                lead: cursor,
                node: *id,
                range: start..end,
                trail_end,
            });
            cursor = trail_end;
        }

        if cursor < region.end {
            items.push_back(Item::Loose {
                range: cursor..region.end,
                leading: false,
            });
        }

        items
    }

    /// Emit the buffer as a descriptor. Separator-only buffers are merged
    /// into the previous descriptor when it has room.
    fn flush(&self, buffer: &mut Buffer, headers: &[Range<usize>], out: &mut Vec<ChunkDescriptor>) {
        if buffer.is_empty() {
            // Zero-width nodes (recovered MISSING tokens) sit at the end of
            // the previous chunk.
            if let Some(last) = out.last_mut() {
                last.node_kinds.append(&mut buffer.kinds);
            }
            return;
        }
        let Buffer { range, size, kinds } = std::mem::take(buffer);
        buffer.range = range.end..range.end;

        if kinds.is_empty() && self.absorb(out, &range, size) {
            return;
        }
        out.push(ChunkDescriptor {
            ancestors: enclosing(headers, range.start),
            byte_range: range,
            size,
            node_kinds: kinds,
        });
    }

    /// Append `range` to the last descriptor if adjacent and within budget
    fn absorb(&self, out: &mut [ChunkDescriptor], range: &Range<usize>, size: usize) -> bool {
        match out.last_mut() {
            Some(last) if last.byte_range.end == range.start && last.size + size <= self.budget => {
                last.byte_range.end = range.end;
                last.size += size;
                true
            }
            _ => false,
        }
    }

    fn emit_split(
        &self,
        range: Range<usize>,
        kind: Option<&'static str>,
        headers: &[Range<usize>],
        out: &mut Vec<ChunkDescriptor>,
    ) {
        let pieces = force_split(&self.source[range.clone()], range.start, self.budget, self.metric);
        out.extend(pieces.into_iter().map(|Piece { range, size }| ChunkDescriptor {
            ancestors: enclosing(headers, range.start),
            byte_range: range,
            size,
            node_kinds: kind.into_iter().collect(),
        }));
    }

    /// First line of a multi-line node, unless a single child already
    /// spans it (wrappers and bodies that merely start with a child).
    fn header(&self, node: &Node) -> Option<Range<usize>> {
        let start = node.start_byte();
        let text = &self.source[node.byte_range()];
        let line = &text[..text.find('\n')?];
        let end = start + line.trim_end().len();
        if end == start {
            return None;
        }

        let covered = node.children().iter().any(|id| {
            let child = self.tree.node(*id);
            child.start_byte() <= start && child.end_byte() >= end
        });
        (!covered).then_some(start..end)
    }

    fn measure(&self, range: Range<usize>) -> usize {
        self.metric.measure(&self.source[range])
    }
}

/// Headers that end before `start`
fn enclosing(headers: &[Range<usize>], start: usize) -> Vec<Range<usize>> {
    headers
        .iter()
        .filter(|header| header.end <= start)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Grammar;
    use crate::language::Language;
    use crate::syntax::TreeBuilder;
    use pretty_assertions::assert_eq;

    fn texts<'a>(source: &'a str, descriptors: &[ChunkDescriptor]) -> Vec<&'a str> {
        descriptors
            .iter()
            .map(|d| &source[d.byte_range.clone()])
            .collect()
    }

    /// Contiguity, coverage, size bound and recorded sizes
    fn assert_partition(source: &str, descriptors: &[ChunkDescriptor], budget: usize, metric: SizeMetric) {
        let mut expected_start = 0;
        for descriptor in descriptors {
            assert_eq!(descriptor.byte_range.start, expected_start, "gap or overlap");
            assert!(descriptor.byte_range.end > descriptor.byte_range.start, "empty chunk");
            let text = &source[descriptor.byte_range.clone()];
            assert_eq!(descriptor.size, metric.measure(text));
            assert!(descriptor.size <= budget, "{} > {budget}: {text:?}", descriptor.size);
            expected_start = descriptor.byte_range.end;
        }
        assert_eq!(expected_start, source.len());
    }

    fn pack_as(language: Language, source: &str, budget: usize) -> Vec<ChunkDescriptor> {
        let tree = language.grammar().parse(source);
        pack(&tree, source, budget, SizeMetric::Chars)
    }

    #[test]
    fn test_empty_source() {
        let tree = Grammar::Lines.parse("");
        assert!(pack(&tree, "", 10, SizeMetric::Chars).is_empty());
    }

    #[test]
    fn test_everything_fits() {
        let source = "\nfirst\nsecond\n\n";
        let descriptors = pack_as(Language::PlainText, source, 100);
        assert_eq!(texts(source, &descriptors), vec![source]);
        assert_eq!(descriptors[0].node_kinds, vec!["line", "line"]);
    }

    #[test]
    fn test_greedy_line_packing() {
        let source = "aaa\nbbb\nccc\n";
        let descriptors = pack_as(Language::PlainText, source, 8);
        assert_eq!(texts(source, &descriptors), vec!["aaa\nbbb\n", "ccc\n"]);
        assert_partition(source, &descriptors, 8, SizeMetric::Chars);
    }

    #[test]
    fn test_oversized_leaf_is_force_split() {
        let source = "x".repeat(20);
        let descriptors = pack_as(Language::PlainText, &source, 6);
        let ranges: Vec<_> = descriptors.iter().map(|d| d.byte_range.clone()).collect();
        assert_eq!(ranges, vec![0..6, 6..12, 12..18, 18..20]);
        assert!(descriptors.iter().all(|d| d.node_kinds == vec!["line"]));
    }

    #[test]
    fn test_childless_root_is_one_leaf() {
        let source = "opaque content";
        let tree = SyntaxTree::opaque(source, "blob", false);

        let whole = pack(&tree, source, 100, SizeMetric::Chars);
        assert_eq!(texts(source, &whole), vec![source]);
        assert_eq!(whole[0].node_kinds, vec!["blob"]);

        let split = pack(&tree, source, 5, SizeMetric::Chars);
        assert_eq!(texts(source, &split), vec!["opaqu", "e con", "tent"]);
    }

    #[test]
    fn test_oversized_node_recurses_into_children() {
        let source = "head\n  one\n  two\nz\n";
        let mut builder = TreeBuilder::new(source, "root");
        builder.open("block", 0);
        builder.leaf("head", 0..4);
        builder.leaf("item", 7..10);
        builder.leaf("item", 13..16);
        builder.close(16);
        builder.leaf("tail", 17..18);
        let tree = builder.finish();

        let descriptors = pack(&tree, source, 8, SizeMetric::Chars);
        assert_eq!(
            texts(source, &descriptors),
            vec!["head\n", "  one\n", "  two\n", "z\n"]
        );
        assert_eq!(descriptors[1].node_kinds, vec!["item"]);
        assert_eq!(descriptors[3].node_kinds, vec!["tail"]);
        assert_partition(source, &descriptors, 8, SizeMetric::Chars);
    }

    #[test]
    fn test_separator_only_run_joins_previous_chunk() {
        let source = "a\n\n\n\nbbbbbb";
        let descriptors = pack_as(Language::PlainText, source, 6);
        assert_eq!(texts(source, &descriptors), vec!["a\n\n\n\n", "bbbbbb"]);
    }

    #[test]
    fn test_chunks_end_on_line_breaks() {
        let source = "alpha: 1\nbeta: 2\ngamma: 3\ndelta: 4\n";
        let descriptors = pack_as(Language::Yaml, source, 20);
        assert_partition(source, &descriptors, 20, SizeMetric::Chars);
        for text in texts(source, &descriptors) {
            assert!(text.ends_with('\n'), "{text:?}");
        }
    }

    #[test]
    fn test_nested_json_respects_budget() {
        let source = r#"{
  "name": "my-app",
  "scripts": {
    "start": "node index.js",
    "test": "jest",
    "build": "webpack --mode production"
  },
  "dependencies": {
    "express": "^4.18.2",
    "axios": "^1.4.0"
  }
}
"#;
        for budget in [1, 7, 30, 60, 150, 1000] {
            let descriptors = pack_as(Language::Json, source, budget);
            assert_partition(source, &descriptors, budget, SizeMetric::Chars);
        }
        assert_eq!(pack_as(Language::Json, source, 1000).len(), 1);
    }

    #[test]
    fn test_malformed_input_still_covered() {
        let source = "{\"a\": [1, 2,,, }\n\"dangling\": tru";
        let tree = Language::Json.grammar().parse(source);
        assert!(tree.has_error());

        for budget in [3, 10, 100] {
            let descriptors = pack(&tree, source, budget, SizeMetric::Chars);
            assert_partition(source, &descriptors, budget, SizeMetric::Chars);
        }
    }

    #[test]
    fn test_non_whitespace_metric() {
        let source = "k1: aaaa\nk2: bbbb\nk3: cccc\n";
        let tree = Language::Yaml.grammar().parse(source);
        let descriptors = pack(&tree, source, 14, SizeMetric::NonWhitespaceChars);
        assert_partition(source, &descriptors, 14, SizeMetric::NonWhitespaceChars);
        assert_eq!(texts(source, &descriptors), vec!["k1: aaaa\nk2: bbbb\n", "k3: cccc\n"]);
    }

    #[test]
    fn test_zero_width_node_kind_is_kept() {
        let source = "abc";
        let mut builder = TreeBuilder::new(source, "root");
        builder.leaf("a", 0..1);
        builder.leaf("bc", 1..3);
        builder.leaf("marker", 3..3);
        let tree = builder.finish();

        let descriptors = pack(&tree, source, 1, SizeMetric::Chars);
        assert_eq!(texts(source, &descriptors), vec!["a", "b", "c"]);
        assert_eq!(descriptors[2].node_kinds, vec!["bc", "marker"]);
    }

    #[test]
    fn test_missing_tokens_are_reported() {
        let source = "{\"a\": 1";
        let tree = Language::Json.grammar().parse(source);
        let descriptors = pack(&tree, source, 1, SizeMetric::Chars);

        for (_, node) in tree.iter().filter(|(_, n)| n.byte_range().is_empty()) {
            assert!(
                descriptors.iter().any(|d| d.node_kinds.contains(&node.kind())),
                "{} missing from descriptors",
                node.kind()
            );
        }
    }

    #[test]
    fn test_ancestor_headers() {
        let source = "block {\n  one\n  two\n}\n";
        let mut builder = TreeBuilder::new(source, "root");
        builder.open("block", 0);
        builder.leaf("keyword", 0..5);
        builder.leaf("open", 6..7);
        builder.leaf("item", 10..13);
        builder.leaf("item", 16..19);
        builder.leaf("close", 20..21);
        builder.close(21);
        let tree = builder.finish();

        let descriptors = pack(&tree, source, 8, SizeMetric::Chars);
        assert_eq!(
            texts(source, &descriptors),
            vec!["block {\n", "  one\n", "  two\n}\n"]
        );
        let ancestors: Vec<_> = descriptors.iter().map(|d| d.ancestors.clone()).collect();
        assert_eq!(ancestors, vec![vec![], vec![0..7], vec![0..7]]);
    }

    #[test]
    fn test_wrapper_nodes_have_no_header() {
        let source = "one\ntwo\nthree\n";
        let mut builder = TreeBuilder::new(source, "root");
        builder.open("body", 0);
        builder.leaf("line", 0..3);
        builder.leaf("line", 4..7);
        builder.leaf("line", 8..13);
        builder.close(13);
        let tree = builder.finish();

        let descriptors = pack(&tree, source, 6, SizeMetric::Chars);
        assert!(descriptors.iter().all(|d| d.ancestors.is_empty()));
        assert_partition(source, &descriptors, 6, SizeMetric::Chars);
    }

    #[test]
    fn test_deterministic() {
        let source = "a: 1\nb:\n  c: 2\n  d: [1, 2, 3]\n";
        assert_eq!(
            pack_as(Language::Yaml, source, 9),
            pack_as(Language::Yaml, source, 9)
        );
    }
}
