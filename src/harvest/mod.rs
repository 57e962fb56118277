//! Quota fulfillment - the harvesting core.
//!
//! A collection request for N records runs a bounded-retry loop: fetch a
//! candidate batch sized to the current shortfall, insert the unseen
//! records, shrink the shortfall by the newly-inserted count, and repeat
//! until the quota is exactly met or the attempt budget runs out.
//!
//! # Design
//!
//! - **Shortfall re-request**: each iteration asks the source for exactly
//!   the number of records still missing, never the original quota. A
//!   source with a high duplicate rate therefore cannot provoke unbounded
//!   over-fetching.
//! - **Fixed attempt budget**: bounds worst-case latency and guards against
//!   a source whose underlying population is exhausted.
//! - **Fail-fast on infrastructure**: a source or store failure aborts the
//!   loop immediately. Only "not enough unique records yet" is retried.

use crate::error::HarvestError;
use crate::metrics;
use crate::source::QuestionSource;
use crate::store::QuestionStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use uuid::Uuid;

/// Default fetch/insert cycles allowed per collection.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 100;

/// Tuning knobs for the harvesting loop.
#[derive(Debug, Clone)]
pub struct HarvestPolicy {
    /// Maximum fetch/insert cycles per collection.
    pub max_attempts: u32,

    /// Pause between consecutive attempts. Zero (the default) retries
    /// immediately, matching the bare loop semantics.
    pub retry_delay: Duration,

    /// Jitter factor (0.0 to 1.0) applied to `retry_delay` to prevent
    /// synchronized re-fetch bursts across concurrent collections.
    pub jitter: f64,
}

impl Default for HarvestPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: Duration::ZERO,
            jitter: 0.1,
        }
    }
}

impl HarvestPolicy {
    /// Create a policy with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the attempt budget.
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Set the inter-attempt delay.
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Set the jitter factor, clamped to [0.0, 1.0].
    pub fn jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter.clamp(0.0, 1.0);
        self
    }

    /// Jittered delay before the next attempt.
    fn attempt_delay(&self) -> Duration {
        if self.retry_delay.is_zero() {
            return Duration::ZERO;
        }

        let jitter_range = self.retry_delay.mul_f64(self.jitter);
        let jitter_offset = (rand::random::<f64>() - 0.5) * 2.0 * jitter_range.as_secs_f64();
        self.retry_delay
            .saturating_add(Duration::from_secs_f64(jitter_offset.abs()))
    }
}

/// Collector of newly-unique trivia records.
///
/// Holds the source and store seams behind trait objects so production
/// implementations and test fakes wire in the same way.
pub struct Harvester {
    source: Arc<dyn QuestionSource>,
    store: Arc<dyn QuestionStore>,
    policy: HarvestPolicy,
}

impl Harvester {
    /// Create a harvester with the default policy.
    pub fn new(source: Arc<dyn QuestionSource>, store: Arc<dyn QuestionStore>) -> Self {
        Self::with_policy(source, store, HarvestPolicy::default())
    }

    /// Create a harvester with an explicit policy.
    pub fn with_policy(
        source: Arc<dyn QuestionSource>,
        store: Arc<dyn QuestionStore>,
        policy: HarvestPolicy,
    ) -> Self {
        Self {
            source,
            store,
            policy,
        }
    }

    /// Active policy.
    pub fn policy(&self) -> &HarvestPolicy {
        &self.policy
    }

    /// Collect exactly `requested` newly-stored unique records.
    ///
    /// Returns `Ok(None)` for a zero quota without touching source or
    /// store. Otherwise returns the question text of the positionally last
    /// record of the final batch - which may itself have been a duplicate
    /// the store rejected; the quota is met regardless.
    ///
    /// # Errors
    ///
    /// - `QuotaUnattainable` when the attempt budget runs out first.
    /// - `SourceUnavailable` / `StoreUnavailable` propagated from the first
    ///   failing collaborator call, without further attempts.
    pub async fn collect(&self, requested: usize) -> Result<Option<String>, HarvestError> {
        let result = self.run(requested).await;

        let outcome = match &result {
            Ok(_) => "fulfilled",
            Err(HarvestError::QuotaUnattainable { .. }) => "quota_unattainable",
            Err(HarvestError::SourceUnavailable(_)) => "source_error",
            Err(HarvestError::StoreUnavailable(_)) => "store_error",
            Err(HarvestError::InvalidRequest(_)) => "invalid_request",
        };
        metrics::COLLECTIONS_TOTAL.with_label_values(&[outcome]).inc();

        result
    }

    async fn run(&self, requested: usize) -> Result<Option<String>, HarvestError> {
        if requested == 0 {
            return Ok(None);
        }

        let collection_id = Uuid::new_v4();
        tracing::info!(
            "Collection {} requested {} unique record(s)",
            collection_id,
            requested
        );

        let mut remaining = requested;
        let mut attempts = self.policy.max_attempts;

        while attempts > 0 {
            attempts -= 1;

            let batch = self.source.fetch(remaining).await?;
            metrics::SOURCE_FETCHES_TOTAL.inc();
            metrics::RECORDS_FETCHED_TOTAL.inc_by(batch.len() as u64);

            let inserted = self.store.insert_unique(&batch).await?;
            metrics::RECORDS_INSERTED_TOTAL.inc_by(inserted as u64);
            metrics::DUPLICATES_SKIPPED_TOTAL.inc_by(batch.len().saturating_sub(inserted) as u64);

            remaining = remaining.saturating_sub(inserted);

            if remaining == 0 {
                let used = self.policy.max_attempts - attempts;
                tracing::info!(
                    "Collection {} fulfilled in {} attempt(s)",
                    collection_id,
                    used
                );
                metrics::COLLECTION_ATTEMPTS.observe(used as f64);

                // inserted > 0 here, so the batch cannot be empty
                return Ok(batch.last().map(|record| record.question.clone()));
            }

            tracing::debug!(
                "Collection {}: {} inserted, {} still missing, {} attempt(s) left",
                collection_id,
                inserted,
                remaining,
                attempts
            );

            let delay = self.policy.attempt_delay();
            if !delay.is_zero() {
                sleep(delay).await;
            }
        }

        tracing::warn!(
            "Collection {} exhausted its {} attempt(s) with {} record(s) missing",
            collection_id,
            self.policy.max_attempts,
            remaining
        );
        metrics::COLLECTION_ATTEMPTS.observe(self.policy.max_attempts as f64);

        Err(HarvestError::QuotaUnattainable {
            requested,
            remaining,
            attempts: self.policy.max_attempts,
        })
    }
}
