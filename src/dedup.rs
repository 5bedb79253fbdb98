//! Deduplication and the run's post table.

use std::collections::HashSet;

use sha2::{Digest, Sha256};

use crate::models::PostRecord;

/// Hash of `text|timestamp|author`, the second deduplication key.
pub fn content_hash(text: &str, timestamp_raw: &str, author: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hasher.update(b"|");
    hasher.update(timestamp_raw.as_bytes());
    hasher.update(b"|");
    hasher.update(author.as_bytes());
    hex::encode(hasher.finalize())
}

/// Seen-sets for identities and content hashes.
///
/// A record is admitted only when neither key has been seen before.
#[derive(Debug, Default, Clone)]
pub struct Deduplicator {
    identities: HashSet<String>,
    hashes: HashSet<String>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record both keys of `record`. Returns false if either was already
    /// present, or if the record has no content.
    pub fn admit(&mut self, record: &PostRecord) -> bool {
        if !record.has_content() {
            return false;
        }
        if self.identities.contains(&record.identity) || self.hashes.contains(&record.content_hash)
        {
            return false;
        }
        self.identities.insert(record.identity.clone());
        self.hashes.insert(record.content_hash.clone());
        true
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}

/// Accumulated posts of one run, in admission order.
#[derive(Debug, Default)]
pub struct PostTable {
    records: Vec<PostRecord>,
    dedup: Deduplicator,
}

impl PostTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit a freshly extracted record, stamping its sequence index.
    /// Returns false when it duplicates an earlier record.
    pub fn admit(&mut self, mut record: PostRecord) -> bool {
        if !self.dedup.admit(&record) {
            return false;
        }
        record.sequence_index = self.records.len() as u64;
        self.records.push(record);
        true
    }

    /// Admit every record, returning how many were new.
    pub fn admit_all(&mut self, records: impl IntoIterator<Item = PostRecord>) -> usize {
        records
            .into_iter()
            .map(|r| self.admit(r))
            .filter(|&new| new)
            .count()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[PostRecord] {
        &self.records
    }

    /// Hand the records over for finalization.
    pub fn into_records(self) -> Vec<PostRecord> {
        self.records
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Utc;

    use crate::models::{Metrics, PostFlags};

    pub(crate) fn record(identity: &str, text: &str) -> PostRecord {
        PostRecord {
            identity: identity.to_string(),
            content_hash: content_hash(text, "", "@someone"),
            sequence_index: 0,
            text: text.to_string(),
            author: "@someone".to_string(),
            timestamp_raw: String::new(),
            timestamp_resolved: None,
            url: String::new(),
            metrics: Metrics::default(),
            media: Vec::new(),
            flags: PostFlags::default(),
            language: String::new(),
            capture_scroll_index: 0,
            observed_at: Utc::now(),
            final_order: None,
        }
    }

    #[test]
    fn test_content_hash_separates_fields() {
        assert_ne!(content_hash("ab", "c", ""), content_hash("a", "bc", ""));
        assert_eq!(content_hash("a", "b", "c"), content_hash("a", "b", "c"));
    }

    #[test]
    fn test_rejects_either_key() {
        let mut dedup = Deduplicator::new();
        assert!(dedup.admit(&record("1", "hello")));
        // same identity, different content
        assert!(!dedup.admit(&record("1", "other")));
        // same content under a new synthetic identity
        assert!(!dedup.admit(&record("h_abc", "hello")));
        assert!(dedup.admit(&record("2", "world")));
        assert_eq!(dedup.len(), 2);
    }

    #[test]
    fn test_rejects_empty_records() {
        let mut dedup = Deduplicator::new();
        assert!(!dedup.admit(&record("1", "")));
        assert!(dedup.is_empty());
    }

    #[test]
    fn test_table_sequence_indices() {
        let mut table = PostTable::new();
        let added = table.admit_all(vec![
            record("1", "a"),
            record("1", "a"),
            record("2", "b"),
            record("3", "c"),
        ]);
        assert_eq!(added, 3);

        let seq: Vec<u64> = table.records().iter().map(|r| r.sequence_index).collect();
        assert_eq!(seq, vec![0, 1, 2]);
        assert_eq!(table.len(), 3);
        assert_eq!(table.records()[2].text, "c");

        // a rejected record does not consume an index
        assert!(!table.admit(record("4", "c")));
        assert!(table.admit(record("4", "d")));
        assert_eq!(table.records()[3].sequence_index, 3);
    }
}
