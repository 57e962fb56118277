//! Error taxonomy for the collector.
//!
//! Infrastructure failures (`SourceUnavailable`, `StoreUnavailable`) are
//! fatal to an in-flight collection and propagate immediately; only an
//! insufficient unique yield is retried, and only up to the attempt budget.

use thiserror::Error;

/// Errors surfaced by the harvesting core and its collaborators.
#[derive(Debug, Error)]
pub enum HarvestError {
    /// The request violated a boundary precondition. Produced only at the
    /// HTTP/CLI boundary, never inside the core loop.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The remote question generator was unreachable or returned a
    /// malformed response.
    #[error("question source unavailable: {0}")]
    SourceUnavailable(String),

    /// The persistence layer failed. No partial insertion is left behind.
    #[error("question store unavailable: {0}")]
    StoreUnavailable(String),

    /// The attempt budget ran out while a shortfall remained. The request
    /// was valid but the system could not satisfy it.
    #[error(
        "quota of {requested} unattainable: {remaining} still missing after {attempts} attempts"
    )]
    QuotaUnattainable {
        /// Records originally requested.
        requested: usize,
        /// Records still missing when the budget ran out.
        remaining: usize,
        /// The exhausted attempt budget.
        attempts: u32,
    },
}

impl HarvestError {
    /// True for failures caused by infrastructure rather than the
    /// algorithm's own retry budget.
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            HarvestError::SourceUnavailable(_) | HarvestError::StoreUnavailable(_)
        )
    }
}
