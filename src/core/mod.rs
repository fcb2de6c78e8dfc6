//! Core building blocks shared by storage and HTTP layers

pub mod compensation;
pub mod connection;
pub mod entity;
pub mod error;
pub mod extractors;
pub mod field;
pub mod ids;
pub mod media;
pub mod service;

pub use compensation::CompensationPlan;
pub use connection::{ConnectionManager, ConnectionState, ConnectionStatus, Connector};
pub use entity::Document;
pub use error::{ApiError, ApiResult, MediaError, StorageError, ValidationError};
pub use extractors::{JsonBody, Submission};
pub use media::{ImageUpload, MediaStore, StoredMedia};
pub use service::DataService;
