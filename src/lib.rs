//! QuizVault Library
//!
//! Collects exactly-N newly-unique trivia records from a duplicate-prone
//! remote generator into a durable keyed store. The harvesting core is a
//! bounded-retry loop that re-requests only the shortfall each cycle.

pub mod config;
pub mod error;
pub mod harvest;
pub mod metrics;
pub mod model;
pub mod server;
pub mod source;
pub mod store;

pub use error::HarvestError;
pub use harvest::{HarvestPolicy, Harvester, DEFAULT_MAX_ATTEMPTS};
pub use model::TriviaRecord;
pub use source::{HttpQuestionSource, QuestionSource};
pub use store::{MemoryQuestionStore, QuestionStore, SqliteQuestionStore};
