//! Shared fixtures for the HTTP integration tests
//!
//! Every test app runs over the in-memory backend with a recording media
//! store, so tests can assert exactly which uploads and deletes happened.

#![allow(dead_code)]

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use axum_test::TestServer;
use serde_json::{Map, Value};
use spice::prelude::*;
use std::collections::VecDeque;
use std::sync::Mutex;
use tempfile::TempDir;

// =============================================================================
// Recording media store
// =============================================================================

#[derive(Default)]
pub struct RecordingMediaStore {
    uploads: Mutex<Vec<String>>,
    deletes: Mutex<Vec<String>>,
    fail_uploads: bool,
    fail_deletes: bool,
}

impl RecordingMediaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_uploads() -> Self {
        Self {
            fail_uploads: true,
            ..Self::default()
        }
    }

    pub fn failing_deletes() -> Self {
        Self {
            fail_deletes: true,
            ..Self::default()
        }
    }

    /// File names received by `upload`
    pub fn uploads(&self) -> Vec<String> {
        self.uploads.lock().unwrap().clone()
    }

    /// Public ids received by `delete`
    pub fn deletes(&self) -> Vec<String> {
        self.deletes.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaStore for RecordingMediaStore {
    async fn upload(&self, image: &ImageUpload) -> Result<StoredMedia> {
        if self.fail_uploads {
            return Err(MediaError::Upload {
                message: "media host unavailable".to_string(),
            }
            .into());
        }
        let name = image.file_name.clone().unwrap_or_default();
        let mut uploads = self.uploads.lock().unwrap();
        uploads.push(name);
        let public_id = format!("spice-central/upload-{}", uploads.len());
        Ok(StoredMedia {
            secure_url: format!("https://res.cloudinary.com/demo/image/upload/{public_id}.png"),
            public_id,
        })
    }

    async fn delete(&self, public_id: &str) -> Result<()> {
        self.deletes.lock().unwrap().push(public_id.to_string());
        if self.fail_deletes {
            return Err(MediaError::Delete {
                public_id: public_id.to_string(),
                message: "media host unavailable".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

// =============================================================================
// Scripted connector
// =============================================================================

/// Connector that replays a fixed sequence of outcomes, then keeps the last one
pub struct ScriptedConnector {
    outcomes: Mutex<VecDeque<Result<(), String>>>,
}

impl ScriptedConnector {
    pub fn new(outcomes: Vec<Result<(), String>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self::new(vec![Err(reason.to_string())])
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    fn backend(&self) -> &'static str {
        "scripted"
    }

    async fn connect(&self, _state: Arc<ConnectionState>) -> Result<()> {
        let mut outcomes = self.outcomes.lock().unwrap();
        let outcome = if outcomes.len() > 1 {
            outcomes.pop_front()
        } else {
            outcomes.front().cloned()
        };
        match outcome {
            Some(Ok(())) | None => Ok(()),
            Some(Err(reason)) => Err(anyhow!(reason)),
        }
    }
}

// =============================================================================
// Failing data service
// =============================================================================

/// Document service whose every call fails with a query error
pub struct FailingDataService;

fn query_failure() -> anyhow::Error {
    StorageError::Query {
        backend: "memory".to_string(),
        message: "disk full".to_string(),
    }
    .into()
}

#[async_trait]
impl<T: Document> DataService<T> for FailingDataService {
    async fn list(&self) -> Result<Vec<T>> {
        Err(query_failure())
    }

    async fn get(&self, _id: &str) -> Result<Option<T>> {
        Err(query_failure())
    }

    async fn create(&self, _document: T) -> Result<T> {
        Err(query_failure())
    }

    async fn update(&self, _id: &str, _document: T) -> Result<Option<T>> {
        Err(query_failure())
    }

    async fn patch(&self, _id: &str, _fields: Map<String, Value>) -> Result<Option<T>> {
        Err(query_failure())
    }

    async fn delete(&self, _id: &str) -> Result<Option<T>> {
        Err(query_failure())
    }
}

// =============================================================================
// Test application
// =============================================================================

pub struct TestApp {
    pub server: TestServer,
    pub menu: InMemoryDataService<MenuItem>,
    pub orders: InMemoryDataService<Order>,
    pub media: Arc<RecordingMediaStore>,
    pub connection: ConnectionManager,
    pub uploads: LocalUploads,
    _uploads_dir: TempDir,
}

pub struct TestAppBuilder {
    media: Option<Arc<RecordingMediaStore>>,
    connector: Arc<dyn Connector>,
    failing_storage: bool,
}

impl TestAppBuilder {
    /// No media store: image uploads must be rejected
    pub fn without_media(mut self) -> Self {
        self.media = None;
        self
    }

    pub fn with_media(mut self, media: RecordingMediaStore) -> Self {
        self.media = Some(Arc::new(media));
        self
    }

    /// The first connect fails with `reason`
    pub fn disconnected(mut self, reason: &str) -> Self {
        self.connector = Arc::new(ScriptedConnector::failing(reason));
        self
    }

    pub fn with_connector(mut self, connector: ScriptedConnector) -> Self {
        self.connector = Arc::new(connector);
        self
    }

    /// Every storage call fails
    pub fn failing_storage(mut self) -> Self {
        self.failing_storage = true;
        self
    }

    pub async fn build(self) -> TestApp {
        let uploads_dir = tempfile::tempdir().expect("Failed to create uploads dir");
        let uploads = LocalUploads::new(uploads_dir.path().join("uploads"));
        uploads
            .ensure_dir()
            .await
            .expect("Failed to create uploads dir");

        let menu = InMemoryDataService::<MenuItem>::new();
        let orders = InMemoryDataService::<Order>::new();
        let connection = ConnectionManager::new(self.connector);
        connection.connect().await;

        let mut builder = ServerBuilder::new()
            .with_connection(connection.clone())
            .with_uploads(uploads.clone());

        builder = if self.failing_storage {
            builder
                .with_menu_service(FailingDataService)
                .with_order_service(FailingDataService)
        } else {
            builder
                .with_menu_service(menu.clone())
                .with_order_service(orders.clone())
        };

        let media = self.media.clone().unwrap_or_default();
        if let Some(store) = self.media {
            builder = builder.with_shared_media_store(store);
        }

        let app = builder.build().expect("Failed to build app");
        let server = TestServer::try_new(app).expect("Failed to create test server");

        TestApp {
            server,
            menu,
            orders,
            media,
            connection,
            uploads,
            _uploads_dir: uploads_dir,
        }
    }
}

impl TestApp {
    pub fn builder() -> TestAppBuilder {
        TestAppBuilder {
            media: Some(Arc::new(RecordingMediaStore::new())),
            connector: Arc::new(InMemoryConnector),
            failing_storage: false,
        }
    }

    /// Connected app with a recording media store
    pub async fn spawn() -> TestApp {
        Self::builder().build().await
    }
}

// =============================================================================
// Payloads
// =============================================================================

pub fn valid_order() -> Value {
    serde_json::json!({
        "menuItem": {
            "id": "1",
            "name": "Butter Chicken",
            "price": 14.99,
            "category": "main course",
            "isVegetarian": false,
            "spiceLevel": 2
        },
        "customerName": "Asha Rao",
        "phone": "9876543210",
        "roomNumber": "204",
        "quantity": 2,
        "specialInstructions": "less oil",
        "total": 29.98
    })
}
