//! In-memory question store.

use crate::error::HarvestError;
use crate::model::TriviaRecord;
use crate::store::{collapse_batch, QuestionStore};
use async_trait::async_trait;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Ephemeral store keyed by record id.
///
/// The whole check-and-insert runs under one write lock, so overlapping
/// concurrent calls cannot double-count an id.
#[derive(Debug, Clone)]
pub struct MemoryQuestionStore {
    records: Arc<RwLock<HashMap<i64, TriviaRecord>>>,
}

impl MemoryQuestionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// True if the given id has been stored.
    pub async fn contains(&self, id: i64) -> bool {
        self.records.read().await.contains_key(&id)
    }

    /// Fetch a stored record by id, if present.
    pub async fn get(&self, id: i64) -> Option<TriviaRecord> {
        self.records.read().await.get(&id).cloned()
    }
}

impl Default for MemoryQuestionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QuestionStore for MemoryQuestionStore {
    async fn insert_unique(&self, batch: &[TriviaRecord]) -> Result<usize, HarvestError> {
        let candidates = collapse_batch(batch);

        let mut records = self.records.write().await;
        let mut inserted = 0;
        for candidate in candidates {
            if let Entry::Vacant(slot) = records.entry(candidate.id) {
                slot.insert(candidate.clone());
                inserted += 1;
            }
        }

        tracing::debug!(
            "Memory store: {} of {} batch record(s) newly inserted",
            inserted,
            batch.len()
        );
        Ok(inserted)
    }

    async fn len(&self) -> Result<usize, HarvestError> {
        Ok(self.records.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(ids: &[i64]) -> Vec<TriviaRecord> {
        ids.iter()
            .map(|&id| TriviaRecord::new(id, format!("q{id}"), format!("a{id}")))
            .collect()
    }

    #[tokio::test]
    async fn test_insert_counts_new_ids_only() {
        let store = MemoryQuestionStore::new();

        let inserted = store.insert_unique(&batch(&[1, 2, 3])).await.unwrap();
        assert_eq!(inserted, 3);

        let inserted = store.insert_unique(&batch(&[2, 3, 4])).await.unwrap();
        assert_eq!(inserted, 1);
        assert_eq!(store.len().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_insert_same_batch_twice_is_idempotent() {
        let store = MemoryQuestionStore::new();

        assert_eq!(store.insert_unique(&batch(&[5, 6])).await.unwrap(), 2);
        assert_eq!(store.insert_unique(&batch(&[5, 6])).await.unwrap(), 0);
        assert_eq!(store.len().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_existing_record_is_not_overwritten() {
        let store = MemoryQuestionStore::new();

        store
            .insert_unique(&[TriviaRecord::new(9, "original", "a")])
            .await
            .unwrap();
        store
            .insert_unique(&[TriviaRecord::new(9, "imposter", "b")])
            .await
            .unwrap();

        assert_eq!(store.get(9).await.unwrap().question, "original");
    }

    #[tokio::test]
    async fn test_batch_internal_duplicates_collapse() {
        let store = MemoryQuestionStore::new();
        let inserted = store.insert_unique(&batch(&[7, 7, 7, 8])).await.unwrap();
        assert_eq!(inserted, 2);
    }

    #[tokio::test]
    async fn test_concurrent_overlapping_inserts_sum_to_distinct() {
        let store = MemoryQuestionStore::new();
        let overlapping = batch(&[10, 11, 12, 13]);

        let (a, b) = tokio::join!(
            store.insert_unique(&overlapping),
            store.insert_unique(&overlapping)
        );

        assert_eq!(a.unwrap() + b.unwrap(), 4);
        assert_eq!(store.len().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_empty_batch_inserts_nothing() {
        let store = MemoryQuestionStore::new();
        assert_eq!(store.insert_unique(&[]).await.unwrap(), 0);
        assert!(store.is_empty().await.unwrap());
    }
}
