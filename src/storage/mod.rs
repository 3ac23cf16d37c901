use async_trait::async_trait;

use crate::models::Order;

mod postgres;

pub use postgres::{ensure_schema, PgOrderStore};

// ============================================================================
// Durable Order Storage
// ============================================================================
//
// One gateway call per logical operation. Upsert is a full-document
// replace: the same OrderID written twice overwrites every sub-entity,
// items wholesale. The trait seam exists so the pipeline and read path
// can be exercised against in-memory doubles.
//
// ============================================================================

/// Fixed bound on every backing-store call.
pub const STORE_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("order not found")]
    NotFound,

    #[error("backing store call timed out")]
    Timeout,

    #[error("order document encoding failed: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("backing store error: {0}")]
    Backend(#[from] sqlx::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound)
    }
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert or fully replace an order and its sub-entities.
    async fn upsert(&self, order: &Order) -> Result<(), StoreError>;

    /// Load an order by id. The denormalized document blob, when present,
    /// is authoritative for nested structure.
    async fn get(&self, uid: &str) -> Result<Order, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_is_distinct() {
        assert!(StoreError::NotFound.is_not_found());
        assert!(!StoreError::Timeout.is_not_found());
    }

    #[test]
    fn test_backend_error_from_sqlx() {
        let err: StoreError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, StoreError::Backend(_)));
        assert!(!err.is_not_found());
    }
}
