mod server;

use prometheus::{IntCounter, IntCounterVec, IntGauge, Opts, Registry};

pub use server::start_metrics_server;

// ============================================================================
// Metrics Module - Prometheus metrics for observability
// ============================================================================
//
// Covers the three paths the service cares about:
// - ingestion outcomes (stored / cached-only / dropped and why)
// - read resolution (cache hit / store fallback / uniform miss)
// - consumer liveness (the ingestion loop is up or terminally stopped)
//
// All metrics are registered with one Registry and scraped via /metrics.
// ============================================================================

pub struct Metrics {
    registry: Registry,

    pub ingest_outcomes: IntCounterVec,
    pub persist_failures: IntCounter,
    pub reads: IntCounterVec,
    pub consumer_up: IntGauge,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let ingest_outcomes = IntCounterVec::new(
            Opts::new("ingest_messages_total", "Ingested Kafka messages by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(ingest_outcomes.clone()))?;

        let persist_failures = IntCounter::new(
            "ingest_persist_failures_total",
            "Orders that failed to persist durably during ingestion",
        )?;
        registry.register(Box::new(persist_failures.clone()))?;

        let reads = IntCounterVec::new(
            Opts::new("order_reads_total", "Order lookups by resolution source"),
            &["source"],
        )?;
        registry.register(Box::new(reads.clone()))?;

        let consumer_up = IntGauge::new(
            "consumer_up",
            "Ingestion consumer state (1=running, 0=stopped)",
        )?;
        registry.register(Box::new(consumer_up.clone()))?;

        Ok(Self {
            registry,
            ingest_outcomes,
            persist_failures,
            reads,
            consumer_up,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_ingest(&self, outcome: &str) {
        self.ingest_outcomes.with_label_values(&[outcome]).inc();
    }

    pub fn record_persist_failure(&self) {
        self.persist_failures.inc();
    }

    /// Record where a read was resolved: "cache", "store", or "miss".
    pub fn record_read(&self, source: &str) {
        self.reads.with_label_values(&[source]).inc();
    }

    pub fn set_consumer_up(&self, up: bool) {
        self.consumer_up.set(if up { 1 } else { 0 });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        assert!(!metrics.registry.gather().is_empty());
    }

    #[test]
    fn test_record_ingest_outcomes() {
        let metrics = Metrics::new().unwrap();
        metrics.record_ingest("stored");
        metrics.record_ingest("stored");
        metrics.record_ingest("dropped_decode");

        let gathered = metrics.registry.gather();
        let family = gathered
            .iter()
            .find(|m| m.name() == "ingest_messages_total")
            .unwrap();
        assert_eq!(family.metric.len(), 2);
    }

    #[test]
    fn test_record_read_sources() {
        let metrics = Metrics::new().unwrap();
        metrics.record_read("cache");
        metrics.record_read("miss");

        let gathered = metrics.registry.gather();
        let family = gathered
            .iter()
            .find(|m| m.name() == "order_reads_total")
            .unwrap();
        assert_eq!(family.metric.len(), 2);
    }

    #[test]
    fn test_consumer_up_gauge() {
        let metrics = Metrics::new().unwrap();
        metrics.set_consumer_up(true);

        let gathered = metrics.registry.gather();
        let gauge = gathered.iter().find(|m| m.name() == "consumer_up").unwrap();
        assert_eq!(gauge.metric[0].gauge.value, Some(1.0));

        metrics.set_consumer_up(false);
        let gathered = metrics.registry.gather();
        let gauge = gathered.iter().find(|m| m.name() == "consumer_up").unwrap();
        assert_eq!(gauge.metric[0].gauge.value, Some(0.0));
    }
}
