use std::sync::Arc;

use crate::cache::OrderCache;
use crate::metrics::Metrics;
use crate::models::Order;
use crate::storage::OrderStore;

// ============================================================================
// Read Path - cache-aside order lookup
// ============================================================================
//
// Check the cache, fall back to the durable store on a miss, and put the
// result back into the cache. Every store failure - true absence, timeout,
// or backend error - collapses into one uniform "not found" outcome for
// the caller. Concurrent misses on the same id each query the store and
// each repopulate the cache; redundant but not incorrect, since the
// content is identical.
//
// ============================================================================

pub struct OrderReader {
    cache: Arc<OrderCache>,
    store: Arc<dyn OrderStore>,
    metrics: Arc<Metrics>,
}

impl OrderReader {
    pub fn new(cache: Arc<OrderCache>, store: Arc<dyn OrderStore>, metrics: Arc<Metrics>) -> Self {
        Self {
            cache,
            store,
            metrics,
        }
    }

    pub async fn get(&self, id: &str) -> Option<Order> {
        if let Some(order) = self.cache.get(id).await {
            self.metrics.record_read("cache");
            return Some(order);
        }

        match self.store.get(id).await {
            Ok(order) => {
                self.cache.set(order.clone()).await;
                self.metrics.record_read("store");
                Some(order)
            }
            Err(e) => {
                if !e.is_not_found() {
                    tracing::warn!(order_uid = %id, error = %e, "order lookup failed, reporting not found");
                }
                self.metrics.record_read("miss");
                None
            }
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
