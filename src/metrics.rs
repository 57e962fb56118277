// Prometheus metrics for the collector
//
// Exposed on the /metrics HTTP endpoint:
// - Source fetches and records fetched (counters)
// - Records inserted / duplicates skipped (counters)
// - Collection outcomes by kind (counter vec)
// - Attempts consumed per collection (histogram)

use lazy_static::lazy_static;
use prometheus::{Encoder, Histogram, IntCounter, IntCounterVec, Registry, TextEncoder};
use std::sync::Arc;

lazy_static! {
    pub static ref REGISTRY: Arc<Registry> = Arc::new(Registry::new());

    // Source metrics
    pub static ref SOURCE_FETCHES_TOTAL: IntCounter = IntCounter::new(
        "source_fetches_total",
        "Total fetch calls issued to the question generator"
    ).expect("Failed to create source fetches metric");

    pub static ref RECORDS_FETCHED_TOTAL: IntCounter = IntCounter::new(
        "records_fetched_total",
        "Total candidate records returned by the generator"
    ).expect("Failed to create records fetched metric");

    // Store metrics
    pub static ref RECORDS_INSERTED_TOTAL: IntCounter = IntCounter::new(
        "records_inserted_total",
        "Total records newly persisted"
    ).expect("Failed to create records inserted metric");

    pub static ref DUPLICATES_SKIPPED_TOTAL: IntCounter = IntCounter::new(
        "duplicates_skipped_total",
        "Total candidate records rejected as already stored"
    ).expect("Failed to create duplicates skipped metric");

    // Collection metrics
    pub static ref COLLECTIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        prometheus::Opts::new("collections_total", "Collection requests by outcome"),
        &["outcome"]
    ).expect("Failed to create collections metric");

    pub static ref COLLECTION_ATTEMPTS: Histogram = Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "collection_attempts",
            "Fetch/insert cycles consumed per collection"
        ).buckets(vec![1.0, 2.0, 3.0, 5.0, 10.0, 25.0, 50.0, 100.0]),
    ).expect("Failed to create collection attempts metric");
}

/// Initialize metrics registry - must be called once at startup
pub fn init() -> prometheus::Result<()> {
    REGISTRY.register(Box::new(SOURCE_FETCHES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECORDS_FETCHED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECORDS_INSERTED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(DUPLICATES_SKIPPED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(COLLECTIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(COLLECTION_ATTEMPTS.clone()))?;
    Ok(())
}

/// Render all registered metrics in the Prometheus text format
pub fn gather_metrics() -> prometheus::Result<String> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
