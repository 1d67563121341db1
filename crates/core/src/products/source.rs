use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use super::ProductRecord;

/// Errors raised by a product data source.
#[derive(Debug, Error)]
pub enum ProductSourceError {
    #[error("Product source unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed product data: {0}")]
    Malformed(String),

    #[error("Product index {index} out of range (list has {len} products)")]
    IndexOutOfRange { index: usize, len: usize },
}

/// An ordered, externally owned list of products.
#[async_trait]
pub trait ProductSource: Send + Sync {
    /// List every product in source order.
    async fn list(&self) -> Result<Vec<ProductRecord>, ProductSourceError>;

    /// Identifier of the data source this list represents.
    ///
    /// Runs naming a different `data_source_id` are refused. `None` means the
    /// source is anonymous and any identifier is accepted.
    fn source_id(&self) -> Option<&str> {
        None
    }

    /// Record that the product at `index` was processed at `at`.
    ///
    /// Bookkeeping only: the run state tracker, not this stamp, decides what
    /// gets processed next.
    async fn mark_processed(&self, index: usize, at: DateTime<Utc>)
        -> Result<(), ProductSourceError>;
}
