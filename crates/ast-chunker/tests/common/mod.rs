#![allow(dead_code)]

use context_ast_chunker::ChunkRecord;
use serde_json::Value;

/// Chunks must tile `source` in order, stay within `budget` chars and carry
/// sequential default metadata.
pub fn assert_partition(source: &str, records: &[ChunkRecord], budget: usize) {
    let mut offset = 0;
    for (index, record) in records.iter().enumerate() {
        assert!(!record.content.is_empty(), "chunk {index} is empty");
        assert!(
            record.content.chars().count() <= budget,
            "chunk {index} has {} chars, budget {budget}",
            record.content.chars().count()
        );
        assert_eq!(record.get("chunk_index"), Some(&Value::from(index)));
        assert_eq!(
            record.get("char_count"),
            Some(&Value::from(record.content.chars().count()))
        );
        assert_eq!(record.get("start_byte"), Some(&Value::from(offset)));
        offset += record.content.len();
        assert_eq!(record.get("end_byte"), Some(&Value::from(offset)));
    }

    let joined: String = records.iter().map(|r| r.content.as_str()).collect();
    assert_eq!(joined, source, "chunks do not reproduce the source");
}

/// Byte span of a record from its default metadata
pub fn span(record: &ChunkRecord) -> std::ops::Range<usize> {
    let at = |key| {
        record
            .get(key)
            .and_then(Value::as_u64)
            .unwrap_or_else(|| panic!("missing {key}")) as usize
    };
    at("start_byte")..at("end_byte")
}
