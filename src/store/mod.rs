//! Question store layer.
//!
//! Stores persist records keyed by `id` with insert-if-absent semantics:
//! inserting an already-known id is a silent no-op, and records are never
//! deleted or mutated once accepted. Two backends are provided:
//!
//! - [`SqliteQuestionStore`]: durable, primary-key enforced, the production
//!   backend.
//! - [`MemoryQuestionStore`]: ephemeral, used in tests and as a
//!   config-selectable backend for local runs.

use crate::error::HarvestError;
use crate::model::TriviaRecord;
use async_trait::async_trait;
use std::collections::HashSet;

pub mod memory;
pub mod sqlite;

pub use memory::MemoryQuestionStore;
pub use sqlite::SqliteQuestionStore;

/// Durable keyed store with insert-if-absent-batch semantics.
#[async_trait]
pub trait QuestionStore: Send + Sync {
    /// Persist every record in `batch` whose id is not already stored.
    ///
    /// Batch-internal duplicates collapse to the first-seen representative.
    /// Returns the number of records newly persisted by this call; the call
    /// is all-or-nothing from the caller's point of view.
    ///
    /// Concurrent calls racing on the same id never both count it as newly
    /// inserted.
    ///
    /// # Errors
    ///
    /// Returns `HarvestError::StoreUnavailable` on persistence failure.
    async fn insert_unique(&self, batch: &[TriviaRecord]) -> Result<usize, HarvestError>;

    /// Total number of stored records.
    async fn len(&self) -> Result<usize, HarvestError>;

    /// True when no records are stored.
    async fn is_empty(&self) -> Result<bool, HarvestError> {
        Ok(self.len().await? == 0)
    }
}

/// Collapse batch-internal duplicates, keeping the first-seen record per id.
///
/// Order is preserved so downstream "last record" selection stays
/// deterministic for a given batch.
pub(crate) fn collapse_batch(batch: &[TriviaRecord]) -> Vec<&TriviaRecord> {
    let mut seen: HashSet<i64> = HashSet::with_capacity(batch.len());
    batch
        .iter()
        .filter(|record| seen.insert(record.id))
        .collect()
}
