//! Domain record types.
//!
//! A `TriviaRecord` is the unit of work: created transiently by the question
//! source, durable only once the store has accepted it. The remote generator
//! assigns `id`; the collector never mints its own.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One trivia record as produced by the remote generator.
///
/// The generator's JSON carries additional fields (`value`, `airdate`,
/// `category_id`, ...) which are ignored on deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriviaRecord {
    /// Unique identifier assigned by the generator. At most one stored
    /// record exists per id for the lifetime of the store.
    pub id: i64,

    /// Question text.
    pub question: String,

    /// Answer text.
    pub answer: String,

    /// Creation timestamp reported by the generator.
    pub created_at: DateTime<Utc>,
}

impl TriviaRecord {
    /// Create a record with the given id and payload, stamped now.
    ///
    /// Used by tests and fixtures; production records arrive fully formed
    /// from the generator.
    pub fn new(id: i64, question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            id,
            question: question.into(),
            answer: answer.into(),
            created_at: Utc::now(),
        }
    }
}
