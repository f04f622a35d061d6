use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use crate::error::AppError;

/// Emitted after every committed write. Listeners recompute their own
/// snapshot from the collection, so the event only says what moved.
#[derive(Debug, Clone)]
pub struct Change {
    pub collection: &'static str,
    pub id: Uuid,
}

struct Versioned {
    version: u64,
    value: Value,
}

/// In-memory document database: named collections of JSON documents with
/// per-document optimistic transactions and store-wide change notifications.
/// Each collection is independently locked, so the `users` and `posts`
/// families never contend with each other.
#[derive(Clone)]
pub struct DocStore {
    collections: Arc<RwLock<HashMap<&'static str, Arc<RwLock<HashMap<Uuid, Versioned>>>>>>,
    changes: broadcast::Sender<Change>,
    txn_max_retries: u32,
}

impl DocStore {
    pub fn new(change_buffer: usize, txn_max_retries: u32) -> Self {
        let (changes, _) = broadcast::channel(change_buffer);
        Self {
            collections: Arc::new(RwLock::new(HashMap::new())),
            changes,
            txn_max_retries,
        }
    }

    pub async fn collection(&self, name: &'static str) -> Collection {
        let mut collections = self.collections.write().await;
        let docs = collections
            .entry(name)
            .or_insert_with(|| Arc::new(RwLock::new(HashMap::new())))
            .clone();
        Collection {
            name,
            docs,
            changes: self.changes.clone(),
            txn_max_retries: self.txn_max_retries,
        }
    }
}

#[derive(Clone)]
pub struct Collection {
    name: &'static str,
    docs: Arc<RwLock<HashMap<Uuid, Versioned>>>,
    changes: broadcast::Sender<Change>,
    txn_max_retries: u32,
}

impl Collection {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Receiver for change events across the whole store. Dropping the
    /// receiver unsubscribes; nothing is delivered after that.
    pub fn subscribe(&self) -> broadcast::Receiver<Change> {
        self.changes.subscribe()
    }

    pub async fn get(&self, id: Uuid) -> Option<Value> {
        let docs = self.docs.read().await;
        docs.get(&id).map(|entry| entry.value.clone())
    }

    pub async fn insert(&self, id: Uuid, value: Value) {
        let mut docs = self.docs.write().await;
        docs.insert(id, Versioned { version: 1, value });
        drop(docs);
        self.notify(id);
    }

    /// Full replace of an existing document. Returns false if it is missing.
    pub async fn set(&self, id: Uuid, value: Value) -> bool {
        let mut docs = self.docs.write().await;
        let Some(entry) = docs.get_mut(&id) else {
            return false;
        };
        entry.version += 1;
        entry.value = value;
        drop(docs);
        self.notify(id);
        true
    }

    /// Field-level merge into an existing object document. Returns false if
    /// the document is missing.
    pub async fn update_fields(&self, id: Uuid, fields: &[(&str, Value)]) -> bool {
        let mut docs = self.docs.write().await;
        let Some(entry) = docs.get_mut(&id) else {
            return false;
        };
        if let Value::Object(map) = &mut entry.value {
            for (key, value) in fields {
                map.insert((*key).to_string(), value.clone());
            }
        }
        entry.version += 1;
        drop(docs);
        self.notify(id);
        true
    }

    pub async fn remove(&self, id: Uuid) -> bool {
        let mut docs = self.docs.write().await;
        let removed = docs.remove(&id).is_some();
        drop(docs);
        if removed {
            self.notify(id);
        }
        removed
    }

    pub async fn all(&self) -> Vec<(Uuid, Value)> {
        let docs = self.docs.read().await;
        docs.iter()
            .map(|(id, entry)| (*id, entry.value.clone()))
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.docs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.docs.read().await.is_empty()
    }

    /// Optimistic read-compute-write on a single document.
    ///
    /// The closure sees a snapshot and returns the replacement value. The
    /// commit only lands if no other writer touched the document in between;
    /// otherwise the whole cycle retries, up to the configured limit, then
    /// fails with `Conflict`. Errors from the closure abort without retrying.
    pub async fn transact<F>(&self, id: Uuid, mut f: F) -> Result<Value, AppError>
    where
        F: FnMut(&Value) -> Result<Value, AppError>,
    {
        for _ in 0..=self.txn_max_retries {
            let (version, snapshot) = {
                let docs = self.docs.read().await;
                match docs.get(&id) {
                    Some(entry) => (entry.version, entry.value.clone()),
                    None => return Err(AppError::NotFound(self.name)),
                }
            };

            let next = f(&snapshot)?;

            let mut docs = self.docs.write().await;
            match docs.get_mut(&id) {
                Some(entry) if entry.version == version => {
                    entry.version += 1;
                    entry.value = next.clone();
                    drop(docs);
                    self.notify(id);
                    return Ok(next);
                }
                Some(_) => continue,
                None => return Err(AppError::NotFound(self.name)),
            }
        }

        Err(AppError::Conflict(self.name))
    }

    fn notify(&self, id: Uuid) {
        // send only fails when nobody is subscribed
        let _ = self.changes.send(Change {
            collection: self.name,
            id,
        });
    }
}
