//! MongoDB storage backend using the official MongoDB async driver.
//!
//! Provides the [`MongoConnector`] that owns the client and a generic
//! `MongoDataService<T>` per document type.
//!
//! # Storage model
//!
//! One collection per document type, named by `T::collection_name()`
//! (`menuitems`, `orders`).
//!
//! # Serialization strategy
//!
//! Documents are serialized via `serde_json::Value` as an intermediate format,
//! then converted to BSON documents. Documents keep their string `id` field
//! and the server assigns an ObjectId `_id`, the layout existing records
//! already use. Lookups match `id`, falling back to `_id` for records that
//! were stored without an `id` field. A unique index on `id` is created on
//! the first insert into each collection.
//!
//! # Connection liveness
//!
//! The connector installs an SDAM event handler on the client. Every server
//! heartbeat updates the shared [`ConnectionState`], so `/health` follows the
//! driver's own view of reachability after the first connect.

use crate::core::{Connector, ConnectionState, DataService, Document, StorageError};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{Bson, Document as BsonDocument, doc};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::event::EventHandler;
use mongodb::event::sdam::SdamEvent;
use mongodb::options::{ClientOptions, IndexOptions, ReturnDocument};
use mongodb::{Client, Collection, Database, IndexModel};
use serde_json::{Map, Value};
use std::marker::PhantomData;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::OnceCell;

const BACKEND: &str = "mongodb";

/// Database used when the connection string names none
pub const DEFAULT_DATABASE: &str = "spiceCentral";

/// MongoDB server error code for a unique index violation
const DUPLICATE_KEY_CODE: i32 = 11000;

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------

/// Convert a serde_json::Value (expected to be an Object) into a BSON Document.
///
/// `_id` is never written; the server owns it.
fn json_to_document(json: Value) -> Result<BsonDocument> {
    let bson_val = mongodb::bson::to_bson(&json)
        .map_err(|e| anyhow!("Failed to convert JSON to BSON: {}", e))?;

    let mut doc = match bson_val {
        Bson::Document(d) => d,
        _ => return Err(anyhow!("Expected BSON document, got non-object")),
    };
    doc.remove("_id");

    Ok(doc)
}

/// Convert a BSON Document back into a serde_json::Value.
///
/// The stored `id` wins over `_id`. Records without an `id` field take the
/// `_id` instead, with ObjectIds rendered as hex strings. Driver bookkeeping
/// fields are dropped.
fn document_to_json(mut doc: BsonDocument) -> Value {
    doc.remove("__v");
    let object_id = doc.remove("_id");
    if !doc.contains_key("id") {
        match object_id {
            Some(Bson::ObjectId(oid)) => {
                doc.insert("id", oid.to_hex());
            }
            Some(other) => {
                doc.insert("id", other);
            }
            None => {}
        }
    }

    Bson::Document(doc).into_relaxed_extjson()
}

/// Match a document by its `id` field, or by `_id` for records without one
fn id_filter(id: &str) -> BsonDocument {
    doc! { "$or": [ { "id": id }, { "_id": id } ] }
}

/// Unique index on `id`, skipping records that predate the field
fn unique_id_index() -> IndexModel {
    IndexModel::builder()
        .keys(doc! { "id": 1 })
        .options(
            IndexOptions::builder()
                .unique(true)
                .partial_filter_expression(doc! { "id": { "$exists": true } })
                .build(),
        )
        .build()
}

fn query_error(err: mongodb::error::Error) -> anyhow::Error {
    StorageError::Query {
        backend: BACKEND.to_string(),
        message: err.to_string(),
    }
    .into()
}

fn is_duplicate_key_error(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write)) if write.code == DUPLICATE_KEY_CODE
    )
}

// ---------------------------------------------------------------------------
// MongoConnector
// ---------------------------------------------------------------------------

/// Owns the MongoDB client for the process
///
/// The database handle is kept even when the first ping fails: the driver
/// keeps monitoring the deployment and queries start working once a
/// heartbeat succeeds.
pub struct MongoConnector {
    uri: String,
    database: RwLock<Option<Database>>,
}

impl MongoConnector {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            database: RwLock::new(None),
        }
    }

    /// Database handle, or `NotConnected` before the first connect
    pub fn database(&self) -> Result<Database> {
        self.database
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?
            .clone()
            .ok_or_else(|| {
                StorageError::NotConnected {
                    backend: BACKEND.to_string(),
                }
                .into()
            })
    }

    fn store_database(&self, database: Database) -> Result<()> {
        let mut slot = self
            .database
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;
        *slot = Some(database);
        Ok(())
    }

    fn heartbeat_handler(state: Arc<ConnectionState>) -> EventHandler<SdamEvent> {
        EventHandler::callback(move |event: SdamEvent| match event {
            SdamEvent::ServerHeartbeatSucceeded(_) => {
                if !state.is_connected() {
                    tracing::info!("database reachable again");
                }
                state.mark_connected();
            }
            SdamEvent::ServerHeartbeatFailed(failed) => {
                if state.is_connected() {
                    tracing::warn!(error = %failed.failure, "database heartbeat failed");
                }
                state.mark_disconnected(failed.failure.to_string());
            }
            _ => {}
        })
    }
}

#[async_trait]
impl Connector for MongoConnector {
    fn backend(&self) -> &'static str {
        BACKEND
    }

    async fn connect(&self, state: Arc<ConnectionState>) -> Result<()> {
        let mut options = ClientOptions::parse(&self.uri).await?;
        options.server_selection_timeout = Some(Duration::from_secs(5));
        options.sdam_event_handler = Some(Self::heartbeat_handler(state));

        let client = Client::with_options(options)?;
        let database = client
            .default_database()
            .unwrap_or_else(|| client.database(DEFAULT_DATABASE));
        tracing::debug!(database = %database.name(), "using database");
        self.store_database(database.clone())?;

        database.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MongoDataService<T>
// ---------------------------------------------------------------------------

/// Generic document storage service backed by MongoDB
///
/// # Example
///
/// ```rust,ignore
/// let connector = Arc::new(MongoConnector::new("mongodb://localhost:27017/spiceCentral"));
/// let manager = ConnectionManager::new(connector.clone());
/// manager.connect().await;
/// let menu = MongoDataService::<MenuItem>::new(connector);
/// ```
pub struct MongoDataService<T> {
    connector: Arc<MongoConnector>,
    id_index: Arc<OnceCell<()>>,
    _marker: PhantomData<T>,
}

impl<T> Clone for MongoDataService<T> {
    fn clone(&self) -> Self {
        Self {
            connector: self.connector.clone(),
            id_index: self.id_index.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> MongoDataService<T> {
    pub fn new(connector: Arc<MongoConnector>) -> Self {
        Self {
            connector,
            id_index: Arc::new(OnceCell::new()),
            _marker: PhantomData,
        }
    }
}

impl<T: Document> MongoDataService<T> {
    fn collection(&self) -> Result<Collection<BsonDocument>> {
        Ok(self.connector.database()?.collection(T::collection_name()))
    }

    /// Create the unique `id` index once per service
    ///
    /// A failure is logged and retried on the next insert; existing duplicate
    /// ids are the usual cause.
    async fn ensure_id_index(&self, collection: &Collection<BsonDocument>) {
        let created = self
            .id_index
            .get_or_try_init(|| async {
                collection.create_index(unique_id_index()).await?;
                Ok::<(), mongodb::error::Error>(())
            })
            .await;

        if let Err(e) = created {
            tracing::warn!(
                collection = T::collection_name(),
                error = %e,
                "could not create unique id index"
            );
        }
    }

    fn to_document(document: &T) -> Result<BsonDocument> {
        let json = serde_json::to_value(document).map_err(|e| StorageError::Serialization {
            collection: T::collection_name().to_string(),
            message: e.to_string(),
        })?;
        json_to_document(json)
    }

    fn from_document(doc: BsonDocument) -> Result<T> {
        let json = document_to_json(doc);
        serde_json::from_value(json).map_err(|e| {
            StorageError::Serialization {
                collection: T::collection_name().to_string(),
                message: e.to_string(),
            }
            .into()
        })
    }
}

#[async_trait]
impl<T: Document> DataService<T> for MongoDataService<T> {
    /// All documents in natural order
    async fn list(&self) -> Result<Vec<T>> {
        let cursor = self
            .collection()?
            .find(doc! {})
            .await
            .map_err(query_error)?;

        let docs: Vec<BsonDocument> = cursor.try_collect().await.map_err(query_error)?;

        docs.into_iter().map(Self::from_document).collect()
    }

    async fn get(&self, id: &str) -> Result<Option<T>> {
        let doc = self
            .collection()?
            .find_one(id_filter(id))
            .await
            .map_err(query_error)?;

        doc.map(Self::from_document).transpose()
    }

    /// Insert a new document
    ///
    /// A collision on `id` comes back as [`StorageError::DuplicateKey`].
    async fn create(&self, document: T) -> Result<T> {
        let doc = Self::to_document(&document)?;
        let collection = self.collection()?;
        self.ensure_id_index(&collection).await;

        collection.insert_one(doc).await.map_err(|e| {
            if is_duplicate_key_error(&e) {
                StorageError::DuplicateKey {
                    collection: T::collection_name().to_string(),
                    id: document.id().to_string(),
                }
                .into()
            } else {
                query_error(e)
            }
        })?;

        Ok(document)
    }

    async fn update(&self, id: &str, mut document: T) -> Result<Option<T>> {
        document.set_id(id.to_string());
        let doc = Self::to_document(&document)?;

        let replaced = self
            .collection()?
            .find_one_and_replace(id_filter(id), doc)
            .return_document(ReturnDocument::After)
            .await
            .map_err(query_error)?;

        replaced.map(Self::from_document).transpose()
    }

    async fn patch(&self, id: &str, mut fields: Map<String, Value>) -> Result<Option<T>> {
        fields.remove("id");
        fields.remove("_id");
        let set = json_to_document(Value::Object(fields))?;

        let updated = self
            .collection()?
            .find_one_and_update(id_filter(id), doc! { "$set": set })
            .return_document(ReturnDocument::After)
            .await
            .map_err(query_error)?;

        updated.map(Self::from_document).transpose()
    }

    async fn delete(&self, id: &str) -> Result<Option<T>> {
        let removed = self
            .collection()?
            .find_one_and_delete(id_filter(id))
            .await
            .map_err(query_error)?;

        removed.map(Self::from_document).transpose()
    }
}
