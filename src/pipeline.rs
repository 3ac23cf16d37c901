use std::sync::Arc;

use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::message::Message;
use tokio::sync::watch;

use crate::cache::OrderCache;
use crate::metrics::Metrics;
use crate::models::Order;
use crate::storage::OrderStore;
use crate::validator::Validator;

// ============================================================================
// Ingestion Pipeline - single sequential consumer loop
// ============================================================================
//
// Per message: decode -> default timestamp -> validate -> persist -> cache.
// Undecodable and invalid payloads are dropped and their offset committed;
// from this pipeline's perspective they are permanently consumed. A
// persistence failure is logged, never retried, and does not stop the
// loop.
//
// The loop runs until the receive itself fails or a shutdown signal
// arrives; it then publishes a terminal Stopped status on a watch channel
// and exits. There is no backoff or restart: once stopped, ingestion
// stays down until the process is relaunched, while reads keep serving.
//
// ============================================================================

/// Whether an order that failed to persist durably still enters the cache.
///
/// `Always` is the availability-biased default: the cache may then hold an
/// order the durable store never accepted. `PersistedOnly` keeps the cache
/// consistent with the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheWritePolicy {
    #[default]
    Always,
    PersistedOnly,
}

impl CacheWritePolicy {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "always" => Some(Self::Always),
            "persisted-only" => Some(Self::PersistedOnly),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineStatus {
    Running,
    Stopped { reason: String },
}

/// What happened to one received message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Persisted durably and cached.
    Stored,
    /// Persistence failed; cached anyway under `CacheWritePolicy::Always`.
    CachedOnly,
    /// Persistence failed and the policy kept the order out of the cache.
    PersistFailed,
    /// Payload was not a decodable order document.
    DroppedDecode,
    /// Order failed validation.
    DroppedValidation,
}

impl IngestOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            IngestOutcome::Stored => "stored",
            IngestOutcome::CachedOnly => "cached_only",
            IngestOutcome::PersistFailed => "persist_failed",
            IngestOutcome::DroppedDecode => "dropped_decode",
            IngestOutcome::DroppedValidation => "dropped_validation",
        }
    }
}

pub struct IngestPipeline {
    validator: Validator,
    store: Arc<dyn OrderStore>,
    cache: Arc<OrderCache>,
    policy: CacheWritePolicy,
    metrics: Arc<Metrics>,
}

impl IngestPipeline {
    pub fn new(
        validator: Validator,
        store: Arc<dyn OrderStore>,
        cache: Arc<OrderCache>,
        policy: CacheWritePolicy,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            validator,
            store,
            cache,
            policy,
            metrics,
        }
    }

    /// Process one message payload through the full ingestion sequence.
    pub async fn process(&self, payload: &[u8]) -> IngestOutcome {
        let mut order: Order = match serde_json::from_slice(payload) {
            Ok(order) => order,
            Err(e) => {
                tracing::debug!(error = %e, "dropping undecodable message");
                self.metrics.record_ingest(IngestOutcome::DroppedDecode.label());
                return IngestOutcome::DroppedDecode;
            }
        };

        order.ensure_date_created();

        if let Err(e) = self.validator.validate(&order) {
            tracing::warn!(order_uid = %order.order_uid, error = %e, "dropping invalid order");
            self.metrics
                .record_ingest(IngestOutcome::DroppedValidation.label());
            return IngestOutcome::DroppedValidation;
        }

        let persisted = match self.store.upsert(&order).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(order_uid = %order.order_uid, error = %e, "order persistence failed");
                self.metrics.record_persist_failure();
                false
            }
        };

        let outcome = if persisted {
            IngestOutcome::Stored
        } else if self.policy == CacheWritePolicy::Always {
            IngestOutcome::CachedOnly
        } else {
            IngestOutcome::PersistFailed
        };

        if persisted || self.policy == CacheWritePolicy::Always {
            self.cache.set(order).await;
        }

        self.metrics.record_ingest(outcome.label());
        outcome
    }

    /// Drive the consumer until the receive fails or shutdown is signalled.
    /// Offsets are committed after processing regardless of outcome: the
    /// at-least-once cursor advances past dropped messages too.
    pub async fn run(
        self,
        consumer: StreamConsumer,
        status: watch::Sender<PipelineStatus>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let _ = status.send(PipelineStatus::Running);
        self.metrics.set_consumer_up(true);

        let reason = loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    tracing::info!("ingestion pipeline received shutdown signal");
                    break "shutdown signal received".to_string();
                }
                received = consumer.recv() => match received {
                    Ok(message) => {
                        let payload = message.payload().unwrap_or_default();
                        let outcome = self.process(payload).await;
                        tracing::debug!(
                            topic = %message.topic(),
                            partition = message.partition(),
                            offset = message.offset(),
                            outcome = outcome.label(),
                            "message processed"
                        );
                        if let Err(e) = consumer.commit_message(&message, CommitMode::Async) {
                            tracing::warn!(error = %e, "offset commit failed");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "consumer receive failed, stopping ingestion");
                        break format!("receive failed: {e}");
                    }
                }
            }
        };

        self.metrics.set_consumer_up(false);
        let _ = status.send(PipelineStatus::Stopped { reason });
    }
}

/// Supervisor-side observer for the pipeline's terminal state. Logs the
/// stop reason once; the read path is unaffected and keeps serving.
pub async fn supervise(mut status: watch::Receiver<PipelineStatus>) {
    while status.changed().await.is_ok() {
        if let PipelineStatus::Stopped { reason } = &*status.borrow() {
            tracing::error!(reason = %reason, "ingestion pipeline stopped; reads continue from cache and store");
            return;
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
