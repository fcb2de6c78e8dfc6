//! In-memory document store for development and tests

use crate::core::{Connector, ConnectionState, DataService, Document, StorageError};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

struct Slot<T> {
    seq: u64,
    document: T,
}

/// In-memory data service
///
/// Useful for testing and development. Uses RwLock for thread-safe access.
/// Listing returns documents in insertion order, like a collection scan.
#[derive(Clone)]
pub struct InMemoryDataService<T> {
    documents: Arc<RwLock<HashMap<String, Slot<T>>>>,
    next_seq: Arc<AtomicU64>,
}

impl<T> InMemoryDataService<T> {
    pub fn new() -> Self {
        Self {
            documents: Arc::new(RwLock::new(HashMap::new())),
            next_seq: Arc::new(AtomicU64::new(0)),
        }
    }
}

impl<T> Default for InMemoryDataService<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn merge_fields<T: Document>(document: &T, fields: Map<String, Value>) -> Result<T> {
    let mut value = serde_json::to_value(document).map_err(|e| StorageError::Serialization {
        collection: T::collection_name().to_string(),
        message: e.to_string(),
    })?;
    let object = value
        .as_object_mut()
        .ok_or_else(|| anyhow!("{} did not serialize to an object", T::type_name()))?;
    for (key, field) in fields {
        if key != "id" {
            object.insert(key, field);
        }
    }
    let merged = serde_json::from_value(value).map_err(|e| StorageError::Serialization {
        collection: T::collection_name().to_string(),
        message: e.to_string(),
    })?;
    Ok(merged)
}

#[async_trait]
impl<T: Document> DataService<T> for InMemoryDataService<T> {
    async fn list(&self) -> Result<Vec<T>> {
        let documents = self
            .documents
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        let mut slots: Vec<_> = documents.values().collect();
        slots.sort_by_key(|slot| slot.seq);
        Ok(slots.into_iter().map(|slot| slot.document.clone()).collect())
    }

    async fn get(&self, id: &str) -> Result<Option<T>> {
        let documents = self
            .documents
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(documents.get(id).map(|slot| slot.document.clone()))
    }

    async fn create(&self, document: T) -> Result<T> {
        let mut documents = self
            .documents
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        if documents.contains_key(document.id()) {
            return Err(StorageError::DuplicateKey {
                collection: T::collection_name().to_string(),
                id: document.id().to_string(),
            }
            .into());
        }

        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        documents.insert(
            document.id().to_string(),
            Slot {
                seq,
                document: document.clone(),
            },
        );

        Ok(document)
    }

    async fn update(&self, id: &str, mut document: T) -> Result<Option<T>> {
        let mut documents = self
            .documents
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        let Some(slot) = documents.get_mut(id) else {
            return Ok(None);
        };
        document.set_id(id.to_string());
        slot.document = document.clone();

        Ok(Some(document))
    }

    async fn patch(&self, id: &str, fields: Map<String, Value>) -> Result<Option<T>> {
        let mut documents = self
            .documents
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        let Some(slot) = documents.get_mut(id) else {
            return Ok(None);
        };
        let merged = merge_fields(&slot.document, fields)?;
        slot.document = merged.clone();

        Ok(Some(merged))
    }

    async fn delete(&self, id: &str) -> Result<Option<T>> {
        let mut documents = self
            .documents
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        Ok(documents.remove(id).map(|slot| slot.document))
    }
}

/// Connector for the in-memory backend: always reachable
#[derive(Debug, Default, Clone)]
pub struct InMemoryConnector;

#[async_trait]
impl Connector for InMemoryConnector {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn connect(&self, _state: Arc<ConnectionState>) -> Result<()> {
        Ok(())
    }
}
