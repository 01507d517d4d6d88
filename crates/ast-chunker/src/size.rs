use crate::config::SizeMetric;
use std::ops::Range;
use unicode_segmentation::UnicodeSegmentation;

impl SizeMetric {
    /// Size of `text` in this unit
    #[must_use]
    pub fn measure(self, text: &str) -> usize {
        match self {
            SizeMetric::Chars => text.chars().count(),
            SizeMetric::Bytes => text.len(),
            SizeMetric::NonWhitespaceChars => text.chars().filter(|c| !c.is_whitespace()).count(),
        }
    }

    fn char_cost(self, ch: char) -> usize {
        match self {
            SizeMetric::Chars => 1,
            SizeMetric::Bytes => ch.len_utf8(),
            SizeMetric::NonWhitespaceChars => usize::from(!ch.is_whitespace()),
        }
    }
}

/// A slice produced by [`force_split`], in source offsets
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Piece {
    pub range: Range<usize>,
    pub size: usize,
}

/// Cut `text` into consecutive pieces of at most `budget` units, ignoring syntax.
///
/// Cuts fall on grapheme cluster boundaries when possible and never inside a
/// UTF-8 sequence. A single char costing more than `budget` (only possible
/// with [`SizeMetric::Bytes`]) becomes a piece of its own.
pub(crate) fn force_split(text: &str, offset: usize, budget: usize, metric: SizeMetric) -> Vec<Piece> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut size = 0;

    let mut cut = |at: usize, start: &mut usize, size: &mut usize| {
        if at > *start {
            pieces.push(Piece {
                range: offset + *start..offset + at,
                size: *size,
            });
        }
        *start = at;
        *size = 0;
    };

    for (idx, grapheme) in text.grapheme_indices(true) {
        let cost = metric.measure(grapheme);
        if size + cost <= budget {
            size += cost;
            continue;
        }

        cut(idx, &mut start, &mut size);
        if cost <= budget {
            size = cost;
            continue;
        }

        for (char_idx, ch) in grapheme.char_indices() {
            let char_cost = metric.char_cost(ch);
            if size + char_cost > budget && size > 0 {
                cut(idx + char_idx, &mut start, &mut size);
            }
            size += char_cost;
        }
    }

    cut(text.len(), &mut start, &mut size);
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts<'a>(source: &'a str, pieces: &[Piece]) -> Vec<&'a str> {
        pieces.iter().map(|p| &source[p.range.clone()]).collect()
    }

    #[test]
    fn test_measure() {
        assert_eq!(SizeMetric::Chars.measure("héllo"), 5);
        assert_eq!(SizeMetric::Bytes.measure("héllo"), 6);
        assert_eq!(SizeMetric::NonWhitespaceChars.measure(" a b\n c "), 3);
    }

    #[test]
    fn test_long_line_split_by_chars() {
        let line = "x".repeat(5000);
        let pieces = force_split(&line, 0, 150, SizeMetric::Chars);

        assert_eq!(pieces.len(), 34);
        assert!(pieces.iter().all(|p| p.size <= 150));
        assert_eq!(texts(&line, &pieces).concat(), line);
        assert_eq!(pieces.last().unwrap().size, 5000 - 33 * 150);
    }

    #[test]
    fn test_offsets_are_shifted() {
        let pieces = force_split("abcdef", 10, 4, SizeMetric::Chars);
        assert_eq!(
            pieces,
            vec![
                Piece { range: 10..14, size: 4 },
                Piece { range: 14..16, size: 2 },
            ]
        );
    }

    #[test]
    fn test_grapheme_clusters_kept_together() {
        let text = "e\u{301}e\u{301}";
        let pieces = force_split(text, 0, 3, SizeMetric::Chars);
        assert_eq!(texts(text, &pieces), vec!["e\u{301}", "e\u{301}"]);
    }

    #[test]
    fn test_oversized_cluster_split_by_chars() {
        let text = "e\u{301}\u{302}\u{303}";
        let pieces = force_split(text, 0, 2, SizeMetric::Chars);
        assert_eq!(texts(text, &pieces), vec!["e\u{301}", "\u{302}\u{303}"]);
        assert!(pieces.iter().all(|p| p.size <= 2));
    }

    #[test]
    fn test_bytes_never_cut_utf8() {
        let text = "ééé";
        let pieces = force_split(text, 0, 3, SizeMetric::Bytes);
        assert_eq!(texts(text, &pieces), vec!["é", "é", "é"]);

        let pieces = force_split(text, 0, 1, SizeMetric::Bytes);
        assert_eq!(pieces.len(), 3);
        assert!(pieces.iter().all(|p| p.size == 2));
    }

    #[test]
    fn test_whitespace_is_free_for_non_whitespace_metric() {
        let text = "a b c d";
        let pieces = force_split(text, 0, 2, SizeMetric::NonWhitespaceChars);
        assert_eq!(texts(text, &pieces), vec!["a b ", "c d"]);
    }

    #[test]
    fn test_empty_text() {
        assert!(force_split("", 0, 5, SizeMetric::Chars).is_empty());
    }
}
