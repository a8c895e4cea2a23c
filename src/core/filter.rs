//! Pattern selection of candidate resources.
//!
//! A record matches when its id and attribute values, concatenated in
//! listing order with nothing in between, contain the pattern as an exact,
//! case-sensitive substring. Partial dates such as `2024.01` or `2024-01`
//! match through the id or the creation date attribute.
//!
//! The empty pattern matches every record. Because fields are joined
//! without separators a pattern can also match across a field boundary
//! (end of the id plus the start of the date); both behaviors are kept.

use crate::record::ResourceRecord;

/// Records containing `pattern`, in input order. Duplicates are kept.
pub fn filter(records: &[ResourceRecord], pattern: &str) -> Vec<ResourceRecord> {
    records
        .iter()
        .filter(|record| matches(record, pattern))
        .cloned()
        .collect()
}

pub fn matches(record: &ResourceRecord, pattern: &str) -> bool {
    record.concatenated().contains(pattern)
}
