//! ModelRepository - Typed accessor for model CRUD operations.

use std::marker::PhantomData;

use super::{Model, ModelError, ModelStore, Versioned};

/// Typed repository wrapper for accessing models of a specific type.
pub struct ModelRepository<'a, S, M> {
    store: &'a S,
    _marker: PhantomData<M>,
}

impl<'a, S: ModelStore, M: Model> ModelRepository<'a, S, M> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            _marker: PhantomData,
        }
    }

    /// Get a model by ID, failing with `NotFound` when it is missing.
    pub fn require(&self, id: &str) -> Result<Versioned<M>, ModelError> {
        self.store
            .get_model(id)?
            .ok_or_else(|| ModelError::NotFound {
                collection: M::COLLECTION.to_string(),
                id: id.to_string(),
            })
    }

    /// Upsert a model.
    pub fn save(&self, model: &M) -> Result<Versioned<M>, ModelError> {
        self.store.save_model(model)
    }

    /// Delete a model by ID. Returns true if it existed.
    pub fn delete(&self, id: &str) -> Result<bool, ModelError> {
        self.store.delete_model::<M>(id)
    }

    /// Find models matching a predicate.
    pub fn find(&self, predicate: &dyn Fn(&M) -> bool) -> Result<Vec<M>, ModelError> {
        Ok(self
            .store
            .find_models(predicate)?
            .into_iter()
            .map(|versioned| versioned.data)
            .collect())
    }

    /// Every stored model of this type.
    pub fn all(&self) -> Result<Vec<M>, ModelError> {
        self.find(&|_| true)
    }
}

/// Extension trait for typed model access on any ModelStore.
pub trait ModelsExt: ModelStore + Sized {
    /// Get a typed model repository.
    fn models<M: Model>(&self) -> ModelRepository<'_, Self, M> {
        ModelRepository::new(self)
    }
}

impl<S: ModelStore> ModelsExt for S {}
