//! Product source backed by a JSON array on disk.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;

use crate::state::write_atomically;

use super::{ProductRecord, ProductSource, ProductSourceError};

const LAST_PROCESSED: &str = "last_processed";

/// Reads the ordered product list from a JSON file.
///
/// The file is re-read on every `list` call so edits made between runs are
/// picked up without a restart.
pub struct JsonFileProductSource {
    path: PathBuf,
    source_id: Option<String>,
    write_lock: Mutex<()>,
}

impl JsonFileProductSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            source_id: None,
            write_lock: Mutex::new(()),
        }
    }

    /// Name the data source this file stands for.
    pub fn with_source_id(mut self, id: impl Into<String>) -> Self {
        self.source_id = Some(id.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_text(&self) -> Result<String, ProductSourceError> {
        tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            ProductSourceError::Unavailable(format!("{}: {}", self.path.display(), e))
        })
    }

    fn malformed(&self, e: impl std::fmt::Display) -> ProductSourceError {
        ProductSourceError::Malformed(format!("{}: {}", self.path.display(), e))
    }
}

#[async_trait]
impl ProductSource for JsonFileProductSource {
    async fn list(&self) -> Result<Vec<ProductRecord>, ProductSourceError> {
        let content = self.read_text().await?;
        let products: Vec<ProductRecord> =
            serde_json::from_str(&content).map_err(|e| self.malformed(e))?;
        debug!(
            "Read {} products from {}",
            products.len(),
            self.path.display()
        );
        Ok(products)
    }

    fn source_id(&self) -> Option<&str> {
        self.source_id.as_deref()
    }

    /// Stamps `last_processed` on one row.
    ///
    /// Rows are edited as raw JSON objects, so columns `ProductRecord` does
    /// not model, header spelling and value types are written back untouched.
    async fn mark_processed(
        &self,
        index: usize,
        at: DateTime<Utc>,
    ) -> Result<(), ProductSourceError> {
        let _guard = self.write_lock.lock().await;

        let content = self.read_text().await?;
        let mut rows: Vec<Value> =
            serde_json::from_str(&content).map_err(|e| self.malformed(e))?;
        let len = rows.len();
        let row = rows
            .get_mut(index)
            .ok_or(ProductSourceError::IndexOutOfRange { index, len })?
            .as_object_mut()
            .ok_or_else(|| self.malformed(format!("product {} is not an object", index)))?;
        let stamp = serde_json::to_value(at).map_err(|e| self.malformed(e))?;
        row.insert(LAST_PROCESSED.to_string(), stamp);

        let bytes = serde_json::to_vec_pretty(&rows).map_err(|e| self.malformed(e))?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomically(&path, &bytes))
            .await
            .map_err(|e| ProductSourceError::Unavailable(e.to_string()))?
            .map_err(|e| {
                ProductSourceError::Unavailable(format!("{}: {}", self.path.display(), e))
            })
    }
}
