//! Question source layer.
//!
//! The source is responsible only for fetching candidate batches from the
//! remote generator. It performs no deduplication: batches may repeat ids
//! from earlier calls or from storage, and the generator may return fewer
//! or more records than asked for. Retry policy lives in the harvester.

use crate::error::HarvestError;
use crate::model::TriviaRecord;
use async_trait::async_trait;
use std::time::Duration;

/// Supplier of candidate trivia records.
///
/// Implementations must pass batches through unmodified. A fetch for zero
/// records must succeed without touching the network.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Fetch up to `count` candidate records from the generator.
    ///
    /// # Errors
    ///
    /// Returns `HarvestError::SourceUnavailable` if the generator is
    /// unreachable or the response cannot be decoded. Never retried here.
    async fn fetch(&self, count: usize) -> Result<Vec<TriviaRecord>, HarvestError>;
}

/// HTTP question source backed by the remote generator's JSON API.
///
/// Each fetch is a single GET of `{base_url}{count}`, e.g.
/// `https://jservice.io/api/random?count=5`. The response body is a JSON
/// array of records.
pub struct HttpQuestionSource {
    /// Reqwest HTTP client
    client: reqwest::Client,

    /// Generator endpoint, including the count query prefix
    base_url: String,

    /// Per-request timeout
    timeout: Duration,
}

impl HttpQuestionSource {
    /// Default generator endpoint.
    pub const DEFAULT_URL: &'static str = "https://jservice.io/api/random?count=";

    /// Create a source for the given generator URL.
    ///
    /// The request count is appended verbatim to `base_url`.
    pub fn new(base_url: impl Into<String>) -> Result<Self, HarvestError> {
        Self::with_timeout(base_url, Duration::from_secs(30))
    }

    /// Create a source with an explicit per-request timeout.
    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, HarvestError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HarvestError::SourceUnavailable(format!("client build failed: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            timeout,
        })
    }

    /// Generator endpoint this source targets.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl QuestionSource for HttpQuestionSource {
    async fn fetch(&self, count: usize) -> Result<Vec<TriviaRecord>, HarvestError> {
        // Zero-count fetches never touch the network.
        if count == 0 {
            return Ok(Vec::new());
        }

        let url = format!("{}{}", self.base_url, count);
        tracing::debug!("Fetching {} candidate record(s) from {}", count, url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| HarvestError::SourceUnavailable(format!("request to {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HarvestError::SourceUnavailable(format!(
                "generator returned HTTP {status} for {url}"
            )));
        }

        let batch: Vec<TriviaRecord> = response.json().await.map_err(|e| {
            HarvestError::SourceUnavailable(format!("malformed generator response: {e}"))
        })?;

        tracing::debug!("Generator returned {} record(s)", batch.len());
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_construction() {
        let source = HttpQuestionSource::new("http://localhost:9/api?count=").unwrap();
        assert_eq!(source.base_url(), "http://localhost:9/api?count=");
        assert_eq!(source.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_source_custom_timeout() {
        let source = HttpQuestionSource::with_timeout(
            HttpQuestionSource::DEFAULT_URL,
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(source.timeout(), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_zero_count_skips_network() {
        // Port 9 (discard) is not listening; a network attempt would error.
        let source = HttpQuestionSource::new("http://127.0.0.1:9/api?count=").unwrap();
        let batch = source.fetch(0).await.unwrap();
        assert!(batch.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_generator_is_source_unavailable() {
        let source = HttpQuestionSource::with_timeout(
            "http://127.0.0.1:9/api?count=",
            Duration::from_millis(200),
        )
        .unwrap();

        let err = source.fetch(3).await.unwrap_err();
        assert!(matches!(err, HarvestError::SourceUnavailable(_)));
    }
}
