//! # Spice Central
//!
//! Ordering backend for a restaurant: a menu of dishes with images, customer
//! orders with contact details and a status, served as a JSON REST API.
//!
//! ## Features
//!
//! - **Document services**: one [`DataService`](core::DataService) per document type, backed by MongoDB or memory
//! - **Connection tracking**: live database status from driver heartbeats, reported on `/health`
//! - **Image uploads**: multipart uploads forwarded to Cloudinary, undone when the insert fails
//! - **Strict orders**: regional phone-number format and a required room number
//! - **Maintenance**: menu seeding and an audit of missing legacy upload files
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use spice::prelude::*;
//!
//! let connector = Arc::new(MongoConnector::new("mongodb://localhost:27017/spiceCentral"));
//! let connection = ConnectionManager::new(connector.clone());
//! connection.connect().await;
//!
//! ServerBuilder::new()
//!     .with_menu_service(MongoDataService::<MenuItem>::new(connector.clone()))
//!     .with_order_service(MongoDataService::<Order>::new(connector))
//!     .with_connection(connection)
//!     .serve("0.0.0.0:8080")
//!     .await?;
//! ```

pub mod config;
pub mod core;
pub mod entities;
pub mod maintenance;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        ApiError, ApiResult, CompensationPlan, ConnectionManager, ConnectionState,
        ConnectionStatus, Connector, DataService, Document, ImageUpload, MediaError, MediaStore,
        StorageError, StoredMedia, ValidationError,
    };

    // === Entities ===
    pub use crate::entities::{MenuItem, MenuItemSnapshot, Order, OrderStatus};

    // === Storage ===
    pub use crate::storage::{
        CloudinaryMediaStore, InMemoryConnector, InMemoryDataService, LocalUploads,
        MongoConnector, MongoDataService,
    };

    // === Config ===
    pub use crate::config::{AppConfig, Environment, MediaConfig, StorageBackend};

    // === Server ===
    pub use crate::server::{ServerBuilder, ServerHost};

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use std::sync::Arc;
}
