use std::collections::{HashMap, VecDeque};

use tokio::sync::RwLock;

use crate::models::Order;

// ============================================================================
// Order Cache - bounded in-memory store with FIFO eviction
// ============================================================================
//
// Eviction is by FIRST insertion order, not by recency of use: updating an
// existing entry keeps its original position in the eviction queue. One
// RwLock guards the whole structure; reads run concurrently with each
// other, any mutation excludes everything else.
//
// A capacity of 0 disables eviction entirely.
//
// ============================================================================

pub struct OrderCache {
    inner: RwLock<CacheInner>,
    capacity: usize,
}

struct CacheInner {
    entries: HashMap<String, Order>,
    insertion_order: VecDeque<String>,
}

impl OrderCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(CacheInner {
                entries: HashMap::new(),
                insertion_order: VecDeque::new(),
            }),
            capacity,
        }
    }

    /// Look up an order snapshot by id. Non-mutating: a hit does not
    /// change the entry's eviction priority.
    pub async fn get(&self, id: &str) -> Option<Order> {
        let inner = self.inner.read().await;
        inner.entries.get(id).cloned()
    }

    /// Insert or overwrite an order snapshot.
    ///
    /// When at capacity the earliest-inserted id is evicted first, even if
    /// it is not the id being written. An overwrite of an existing id does
    /// not re-append it to the insertion queue.
    pub async fn set(&self, order: Order) {
        let mut inner = self.inner.write().await;

        if self.capacity > 0
            && inner.entries.len() >= self.capacity
            && !inner.insertion_order.is_empty()
        {
            if let Some(oldest) = inner.insertion_order.pop_front() {
                inner.entries.remove(&oldest);
            }
        }

        if !inner.entries.contains_key(&order.order_uid) {
            inner.insertion_order.push_back(order.order_uid.clone());
        }
        inner.entries.insert(order.order_uid.clone(), order);
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
