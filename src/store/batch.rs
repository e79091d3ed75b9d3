//! ModelBatch - Inserts of several model types written in one store call.
//!
//! ## Example
//!
//! ```ignore
//! let mut batch = ModelBatch::new();
//! batch.insert(&payload)?.insert(&delivery)?;
//! store.commit_batch(batch)?; // every row, or none
//! ```

use super::{Model, ModelError};

/// A queued insert (type-erased).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedInsert {
    pub collection: &'static str,
    pub id: String,
    /// JSON-serialized model.
    pub bytes: Vec<u8>,
}

/// Inserts to apply atomically via `ModelStore::commit_batch`.
#[derive(Debug, Default)]
pub struct ModelBatch {
    inserts: Vec<QueuedInsert>,
}

impl ModelBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a new model. Serialization happens here, so a model that cannot
    /// be encoded fails before anything is written.
    pub fn insert<M: Model>(&mut self, model: &M) -> Result<&mut Self, ModelError> {
        let bytes = serde_json::to_vec(model).map_err(|e| ModelError::Serde(e.to_string()))?;
        self.inserts.push(QueuedInsert {
            collection: M::COLLECTION,
            id: model.id().to_string(),
            bytes,
        });
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.inserts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inserts.is_empty()
    }

    /// Queued inserts in the order they were added.
    pub fn iter(&self) -> impl Iterator<Item = &QueuedInsert> {
        self.inserts.iter()
    }

    pub fn into_inserts(self) -> Vec<QueuedInsert> {
        self.inserts
    }
}
