//! Service trait for document operations

use crate::core::Document;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Service trait for managing one collection of documents
///
/// Implementations provide the single-step operations the HTTP handlers map
/// onto. The handlers are agnostic to the underlying storage mechanism.
///
/// `create` must fail with [`StorageError::DuplicateKey`](crate::core::error::StorageError)
/// (wrapped in `anyhow::Error`) when the id is already taken, so callers can
/// retry with a fresh id.
#[async_trait]
pub trait DataService<T: Document>: Send + Sync {
    /// List every document in the collection, in insertion order
    async fn list(&self) -> Result<Vec<T>>;

    /// Get a document by id
    async fn get(&self, id: &str) -> Result<Option<T>>;

    /// Insert a new document
    async fn create(&self, document: T) -> Result<T>;

    /// Replace the stored document with the given one
    ///
    /// Returns `Ok(None)` when no document matched `id`.
    async fn update(&self, id: &str, document: T) -> Result<Option<T>>;

    /// Overwrite the given top-level fields and return the updated document
    ///
    /// Returns `Ok(None)` when no document matched `id`.
    async fn patch(&self, id: &str, fields: Map<String, Value>) -> Result<Option<T>>;

    /// Delete a document, returning what was removed
    ///
    /// Returns `Ok(None)` when no document matched `id`.
    async fn delete(&self, id: &str) -> Result<Option<T>>;
}
