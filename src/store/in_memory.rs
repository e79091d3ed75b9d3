//! InMemoryModelStore - HashMap-backed model store for tests and local wiring.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::warn;

use super::{Model, ModelBatch, ModelError, ModelStore, QueuedInsert, Versioned};

struct StoredModel {
    bytes: Vec<u8>,
    version: u64,
}

type Collections = HashMap<&'static str, BTreeMap<String, StoredModel>>;

/// In-memory model store.
///
/// Rows are grouped per collection and kept ordered by id, so `find_models`
/// returns matches in id order. Clone-friendly via Arc; clones share rows.
#[derive(Clone)]
pub struct InMemoryModelStore {
    collections: Arc<RwLock<Collections>>,
}

impl Default for InMemoryModelStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryModelStore {
    /// Create a new empty model store.
    pub fn new() -> Self {
        Self {
            collections: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Collections>, ModelError> {
        self.collections
            .read()
            .map_err(|_| ModelError::Storage("lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Collections>, ModelError> {
        self.collections
            .write()
            .map_err(|_| ModelError::Storage("lock poisoned".into()))
    }

    fn encode<M: Model>(model: &M) -> Result<Vec<u8>, ModelError> {
        serde_json::to_vec(model).map_err(|e| ModelError::Serde(e.to_string()))
    }

    fn decode<M: Model>(bytes: &[u8]) -> Result<M, ModelError> {
        serde_json::from_slice(bytes).map_err(|e| ModelError::Serde(e.to_string()))
    }
}

/// First insert whose id is already stored or appears earlier in the batch.
fn first_conflict<'a>(
    collections: &Collections,
    inserts: &'a [QueuedInsert],
) -> Option<&'a QueuedInsert> {
    let mut queued = HashSet::new();
    inserts.iter().find(|insert| {
        let exists = collections
            .get(insert.collection)
            .map(|rows| rows.contains_key(&insert.id))
            .unwrap_or(false);
        exists || !queued.insert((insert.collection, insert.id.as_str()))
    })
}

impl ModelStore for InMemoryModelStore {
    fn get_model<M: Model>(&self, id: &str) -> Result<Option<Versioned<M>>, ModelError> {
        let collections = self.read()?;

        match collections.get(M::COLLECTION).and_then(|rows| rows.get(id)) {
            Some(stored) => Ok(Some(Versioned {
                data: Self::decode(&stored.bytes)?,
                version: stored.version,
            })),
            None => Ok(None),
        }
    }

    fn save_model<M: Model>(&self, model: &M) -> Result<Versioned<M>, ModelError> {
        let bytes = Self::encode(model)?;
        let mut collections = self.write()?;
        let rows = collections.entry(M::COLLECTION).or_default();

        let version = rows.get(model.id()).map(|s| s.version + 1).unwrap_or(1);
        rows.insert(model.id().to_string(), StoredModel { bytes, version });

        Ok(Versioned {
            data: model.clone(),
            version,
        })
    }

    fn commit_batch(&self, batch: ModelBatch) -> Result<(), ModelError> {
        let inserts = batch.into_inserts();
        let mut collections = self.write()?;

        // Check every row under the same lock before writing any of them.
        if let Some(dup) = first_conflict(&collections, &inserts) {
            return Err(ModelError::AlreadyExists {
                collection: dup.collection.to_string(),
                id: dup.id.clone(),
            });
        }

        for insert in inserts {
            collections.entry(insert.collection).or_default().insert(
                insert.id,
                StoredModel {
                    bytes: insert.bytes,
                    version: 1,
                },
            );
        }
        Ok(())
    }

    fn delete_model<M: Model>(&self, id: &str) -> Result<bool, ModelError> {
        let mut collections = self.write()?;
        Ok(collections
            .get_mut(M::COLLECTION)
            .map(|rows| rows.remove(id).is_some())
            .unwrap_or(false))
    }

    fn find_models<M: Model>(
        &self,
        predicate: &dyn Fn(&M) -> bool,
    ) -> Result<Vec<Versioned<M>>, ModelError> {
        let collections = self.read()?;
        let Some(rows) = collections.get(M::COLLECTION) else {
            return Ok(Vec::new());
        };

        let mut results = Vec::new();
        for (id, stored) in rows {
            match Self::decode::<M>(&stored.bytes) {
                Ok(data) if predicate(&data) => results.push(Versioned {
                    data,
                    version: stored.version,
                }),
                Ok(_) => {}
                Err(err) => {
                    warn!(collection = M::COLLECTION, %id, error = %err, "skipping undecodable row");
                }
            }
        }

        Ok(results)
    }
}
