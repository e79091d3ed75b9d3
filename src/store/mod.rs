//! Store - Typed CRUD storage for webhook records.
//!
//! The resolver never talks to a database directly. It reads subscribers,
//! subscriptions and apps through a `ModelStore`, so a SQL or KV backend can
//! be swapped in without touching resolution logic.
//!
//! ## Example
//!
//! ```ignore
//! use webhook_fanout::{InMemoryModelStore, ModelsExt, Webhook};
//!
//! let store = InMemoryModelStore::new();
//! store.models::<Webhook>().save(&webhook)?;
//! let loaded = store.models::<Webhook>().require("webhook-1")?;
//! ```

mod batch;
mod in_memory;
mod repository;

use serde::{de::DeserializeOwned, Serialize};
use std::fmt;

/// Trait for types that can be stored as models.
pub trait Model: Serialize + DeserializeOwned + Clone + Send + Sync {
    /// The collection name for this model type (e.g., "webhooks", "apps").
    /// Maps to a table in SQL, a collection in MongoDB, a key prefix in KV stores, etc.
    const COLLECTION: &'static str;

    /// Returns the unique identifier for this model instance.
    fn id(&self) -> &str;
}

/// A stored model with its write count (1 on first write, +1 per save).
#[derive(Debug, Clone)]
pub struct Versioned<T> {
    pub data: T,
    pub version: u64,
}

/// Error type for model store operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// An insert hit an existing row.
    AlreadyExists { collection: String, id: String },
    /// Serialization/deserialization error.
    Serde(String),
    /// Storage-level error.
    Storage(String),
    /// Model not found.
    NotFound { collection: String, id: String },
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::AlreadyExists { collection, id } => {
                write!(f, "model already exists: {}:{}", collection, id)
            }
            ModelError::Serde(msg) => write!(f, "model serialization error: {}", msg),
            ModelError::Storage(msg) => write!(f, "model storage error: {}", msg),
            ModelError::NotFound { collection, id } => {
                write!(f, "model not found: {}:{}", collection, id)
            }
        }
    }
}

impl std::error::Error for ModelError {}

/// Abstract CRUD storage for models.
pub trait ModelStore: Send + Sync {
    /// Get a model by ID. Returns None if not found.
    fn get_model<M: Model>(&self, id: &str) -> Result<Option<Versioned<M>>, ModelError>;

    /// Upsert a model.
    fn save_model<M: Model>(&self, model: &M) -> Result<Versioned<M>, ModelError>;

    /// Insert every queued model, or none of them. Fails with `AlreadyExists`
    /// if any id is already stored or queued twice.
    fn commit_batch(&self, batch: ModelBatch) -> Result<(), ModelError>;

    /// Delete a model by ID. Returns true if it existed.
    fn delete_model<M: Model>(&self, id: &str) -> Result<bool, ModelError>;

    /// Find models matching a predicate.
    fn find_models<M: Model>(
        &self,
        predicate: &dyn Fn(&M) -> bool,
    ) -> Result<Vec<Versioned<M>>, ModelError>;
}

pub use batch::{ModelBatch, QueuedInsert};
pub use in_memory::InMemoryModelStore;
pub use repository::{ModelRepository, ModelsExt};
