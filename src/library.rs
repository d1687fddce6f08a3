//! The persisted record list and its merge-by-key semantics.

use crate::record::{GptRecord, MergeOutcome};
use serde::{Deserialize, Serialize};

/// What a single upsert did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Upsert {
    Added,
    Updated,
}

/// The whole saved library. Invariant: no two records share a `url`, and no
/// record has an empty `url`. Serialized wholesale to storage on every
/// mutation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Library {
    pub records: Vec<GptRecord>,
}

impl Library {
    pub fn new() -> Self {
        Library { records: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn find(&self, url: &str) -> Option<&GptRecord> {
        self.records.iter().find(|r| r.url == url)
    }

    /// Insert or replace by `url`. Replacement is a field-level overwrite,
    /// not a deep merge. Records with an empty `url` are never admitted.
    pub fn upsert(&mut self, record: GptRecord) -> Option<Upsert> {
        if record.url.trim().is_empty() {
            return None;
        }
        match self.records.iter_mut().find(|r| r.url == record.url) {
            Some(existing) => {
                *existing = record;
                Some(Upsert::Updated)
            }
            None => {
                self.records.push(record);
                Some(Upsert::Added)
            }
        }
    }

    /// Reconcile a batch against the list, record by record. When the batch
    /// itself repeats a `url`, the later occurrence wins.
    pub fn merge(&mut self, incoming: Vec<GptRecord>) -> MergeOutcome {
        let mut outcome = MergeOutcome::default();
        for record in incoming {
            match self.upsert(record) {
                Some(Upsert::Added) => outcome.added += 1,
                Some(Upsert::Updated) => outcome.updated += 1,
                None => {}
            }
        }
        outcome
    }

    /// Remove the record matching `url`, if any. Uniqueness guarantees at
    /// most one match.
    pub fn remove(&mut self, url: &str) -> bool {
        let original_len = self.records.len();
        self.records.retain(|r| r.url != url);
        self.records.len() < original_len
    }

    /// Whole-list clear. Filtered deletes are not supported.
    pub fn clear(&mut self) {
        self.records.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, description: &str, url: &str) -> GptRecord {
        GptRecord::new(name, description, url)
    }

    fn urls(library: &Library) -> Vec<&str> {
        library.records.iter().map(|r| r.url.as_str()).collect()
    }

    #[test]
    fn test_upsert_appends_new_url() {
        let mut library = Library::new();

        let result = library.upsert(record("A", "first", "https://a"));

        assert_eq!(result, Some(Upsert::Added));
        assert_eq!(library.len(), 1);
    }

    #[test]
    fn test_upsert_overwrites_existing_url() {
        let mut library = Library::new();
        library.upsert(record("A", "old", "https://a"));

        let result = library.upsert(record("A2", "new", "https://a"));

        assert_eq!(result, Some(Upsert::Updated));
        assert_eq!(library.len(), 1);
        assert_eq!(library.records[0].name, "A2");
        assert_eq!(library.records[0].description, "new");
    }

    #[test]
    fn test_upsert_rejects_empty_url() {
        let mut library = Library::new();

        assert_eq!(library.upsert(record("A", "x", "")), None);
        assert_eq!(library.upsert(record("A", "x", "   ")), None);
        assert!(library.is_empty());
    }

    #[test]
    fn test_merge_into_empty_library() {
        let mut library = Library::new();

        let outcome = library.merge(vec![
            record("A", "a", "https://a"),
            record("B", "b", "https://b"),
        ]);

        assert_eq!(library.len(), 2);
        assert_eq!(outcome, MergeOutcome { added: 2, updated: 0 });
    }

    #[test]
    fn test_merge_mixed_add_and_update() {
        let mut library = Library::new();
        library.merge(vec![record("A", "a", "https://a"), record("B", "b", "https://b")]);

        let outcome = library.merge(vec![
            record("B", "new description", "https://b"),
            record("C", "c", "https://c"),
        ]);

        assert_eq!(library.len(), 3);
        assert_eq!(outcome, MergeOutcome { added: 1, updated: 1 });
        assert_eq!(urls(&library), vec!["https://a", "https://b", "https://c"]);
        assert_eq!(library.find("https://b").unwrap().description, "new description");
    }

    #[test]
    fn test_merge_size_law() {
        let mut library = Library::new();
        library.merge(vec![record("A", "a", "https://a")]);
        let before = library.len();

        let outcome = library.merge(vec![
            record("A", "a2", "https://a"),
            record("B", "b", "https://b"),
            record("C", "c", "https://c"),
        ]);

        assert_eq!(library.len(), before + outcome.added);
    }

    #[test]
    fn test_merge_idempotence() {
        let batch = vec![record("A", "a", "https://a"), record("B", "b", "https://b")];
        let mut library = Library::new();

        let first = library.merge(batch.clone());
        let second = library.merge(batch.clone());

        assert_eq!(first, MergeOutcome { added: 2, updated: 0 });
        assert_eq!(second, MergeOutcome { added: 0, updated: 2 });
        assert_eq!(library.len(), 2);
    }

    #[test]
    fn test_merge_batch_duplicate_last_write_wins() {
        let mut library = Library::new();

        library.merge(vec![
            record("A", "first pass", "https://a"),
            record("A", "second pass", "https://a"),
        ]);

        assert_eq!(library.len(), 1);
        assert_eq!(library.records[0].description, "second pass");
    }

    #[test]
    fn test_uniqueness_after_operation_sequence() {
        let mut library = Library::new();
        library.upsert(record("A", "a", "https://a"));
        library.merge(vec![
            record("A", "a2", "https://a"),
            record("B", "b", "https://b"),
        ]);
        library.upsert(record("B", "b2", "https://b"));
        library.remove("https://a");
        library.merge(vec![record("A", "a3", "https://a")]);

        let mut seen = std::collections::HashSet::new();
        assert!(library.records.iter().all(|r| seen.insert(r.url.clone())));
    }

    #[test]
    fn test_remove_existing() {
        let mut library = Library::new();
        library.merge(vec![record("A", "a", "https://a"), record("B", "b", "https://b")]);

        let removed = library.remove("https://a");

        assert!(removed);
        assert_eq!(urls(&library), vec!["https://b"]);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut library = Library::new();
        library.upsert(record("A", "a", "https://a"));

        let removed = library.remove("https://missing");

        assert!(!removed);
        assert_eq!(library.len(), 1);
    }

    #[test]
    fn test_clear() {
        let mut library = Library::new();
        library.merge(vec![record("A", "a", "https://a"), record("B", "b", "https://b")]);

        library.clear();

        assert!(library.is_empty());
    }
}
