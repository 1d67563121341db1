//! Mock product source for testing.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::products::{ProductRecord, ProductSource, ProductSourceError};

/// Mock implementation of the ProductSource trait.
///
/// Provides controllable behavior for testing:
/// - Replace the product list between runs
/// - Simulate an unavailable source
/// - Track `mark_processed` calls
#[derive(Debug, Default)]
pub struct MockProductSource {
    products: Arc<RwLock<Vec<ProductRecord>>>,
    marked: Arc<RwLock<Vec<(usize, DateTime<Utc>)>>>,
    unavailable: Arc<RwLock<bool>>,
    source_id: Option<String>,
}

impl MockProductSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_products(products: Vec<ProductRecord>) -> Self {
        Self {
            products: Arc::new(RwLock::new(products)),
            ..Default::default()
        }
    }

    /// Report `id` from `source_id`.
    pub fn with_source_id(mut self, id: impl Into<String>) -> Self {
        self.source_id = Some(id.into());
        self
    }

    /// Replace the product list.
    pub async fn set_products(&self, products: Vec<ProductRecord>) {
        *self.products.write().await = products;
    }

    /// Make `list` fail.
    pub async fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.write().await = unavailable;
    }

    /// Indices passed to `mark_processed`, in call order.
    pub async fn marked_indices(&self) -> Vec<usize> {
        self.marked.read().await.iter().map(|(i, _)| *i).collect()
    }
}

#[async_trait]
impl ProductSource for MockProductSource {
    async fn list(&self) -> Result<Vec<ProductRecord>, ProductSourceError> {
        if *self.unavailable.read().await {
            return Err(ProductSourceError::Unavailable(
                "mock source offline".to_string(),
            ));
        }
        Ok(self.products.read().await.clone())
    }

    fn source_id(&self) -> Option<&str> {
        self.source_id.as_deref()
    }

    async fn mark_processed(
        &self,
        index: usize,
        at: DateTime<Utc>,
    ) -> Result<(), ProductSourceError> {
        let mut products = self.products.write().await;
        let len = products.len();
        let product = products
            .get_mut(index)
            .ok_or(ProductSourceError::IndexOutOfRange { index, len })?;
        product.last_processed = Some(at);
        self.marked.write().await.push((index, at));
        Ok(())
    }
}
