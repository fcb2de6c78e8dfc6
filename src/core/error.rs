//! Typed error handling for the ordering backend
//!
//! Every handler converts its failures into an [`ApiError`], which renders as a
//! JSON body of the form `{ "error": "...", "code": "..." }` with the matching
//! HTTP status. Nothing in the request path is allowed to panic.
//!
//! # Error Categories
//!
//! - [`ValidationError`]: rejected input (phone, status, missing fields, bad bodies)
//! - [`StorageError`]: document store failures, including the duplicate-key signal
//! - [`MediaError`]: external media host failures
//!
//! # Example
//!
//! ```rust,ignore
//! async fn find(service: &dyn DataService<Order>, id: &str) -> ApiResult<Order> {
//!     service
//!         .get(id)
//!         .await?
//!         .ok_or_else(|| ApiError::not_found("order", id))
//! }
//! ```

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// The main error type returned by HTTP handlers
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server is missing a piece of configuration the request needs
    #[error("{message}")]
    Config { message: String },

    /// The database is not reachable right now
    #[error("Database not connected")]
    Unavailable,

    /// Input was rejected
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// No document matched the requested id
    #[error("Not found")]
    NotFound { entity_type: String, id: String },

    /// A persistence call failed and the handler reports it as a client error
    #[error("{message}")]
    BadRequest { message: String },

    /// Document store failure
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// External media host failure
    #[error(transparent)]
    Media(MediaError),

    /// A handler-level failure with a fixed public message
    #[error("{0}")]
    Internal(String),
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub error: String,
    /// Error code for programmatic handling
    pub code: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn not_found(entity_type: &str, id: &str) -> Self {
        ApiError::NotFound {
            entity_type: entity_type.to_string(),
            id: id.to_string(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        ApiError::Config {
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Config { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Storage(e) => e.status_code(),
            ApiError::Media(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Config { .. } => "CONFIG_ERROR",
            ApiError::Unavailable => "DATABASE_UNAVAILABLE",
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::NotFound { .. } => "NOT_FOUND",
            ApiError::BadRequest { .. } => "BAD_REQUEST",
            ApiError::Storage(e) => e.error_code(),
            ApiError::Media(_) => "MEDIA_ERROR",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.to_string(),
            code: self.error_code().to_string(),
            details: self.details(),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            ApiError::NotFound { entity_type, id } => Some(serde_json::json!({
                "entity_type": entity_type,
                "id": id
            })),
            ApiError::Validation(ValidationError::FieldErrors(errors)) => {
                Some(serde_json::json!({ "fields": errors }))
            }
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "request failed");
        } else {
            tracing::debug!(code = self.error_code(), error = %self, "request rejected");
        }
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

impl From<MediaError> for ApiError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::NotConfigured => ApiError::config(err.to_string()),
            other => ApiError::Media(other),
        }
    }
}

/// Convert from anyhow::Error, keeping typed causes where the status depends on them
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<StorageError>() {
            Ok(storage) => ApiError::Storage(storage),
            Err(err) => match err.downcast::<MediaError>() {
                Ok(media) => media.into(),
                Err(err) => ApiError::Internal(err.to_string()),
            },
        }
    }
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Errors related to input validation
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is absent or blank
    #[error("{field} is required")]
    MissingField { field: String },

    /// Single field validation error
    #[error("Validation error for field '{field}': {message}")]
    FieldError { field: String, message: String },

    /// Multiple field validation errors
    #[error("Validation errors: {}", join_field_errors(.0))]
    FieldErrors(Vec<FieldValidationError>),

    /// Phone number does not match the regional mobile format
    #[error("Invalid Indian phone number")]
    InvalidPhone { value: String },

    /// Order status outside the allowed set
    #[error("Invalid status")]
    InvalidStatus { value: String },

    /// The request body could not be read or decoded
    #[error("Invalid request body: {message}")]
    InvalidBody { message: String },
}

/// A single field validation error
#[derive(Debug, Clone, Serialize)]
pub struct FieldValidationError {
    pub field: String,
    pub message: String,
}

fn join_field_errors(errors: &[FieldValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join(", ")
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Errors raised by document store backends
#[derive(Debug, Error)]
pub enum StorageError {
    /// Insert collided with an existing id
    #[error("{collection} with id '{id}' already exists")]
    DuplicateKey { collection: String, id: String },

    /// The backend has no usable connection
    #[error("Storage backend '{backend}' is not connected")]
    NotConnected { backend: String },

    /// Query execution error
    #[error("{backend} query error: {message}")]
    Query { backend: String, message: String },

    /// Document could not be converted to or from the domain type
    #[error("Failed to serialize/deserialize {collection}: {message}")]
    Serialization { collection: String, message: String },
}

impl StorageError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            StorageError::DuplicateKey { .. } => StatusCode::BAD_REQUEST,
            StorageError::NotConnected { .. } => StatusCode::SERVICE_UNAVAILABLE,
            StorageError::Query { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            StorageError::Serialization { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            StorageError::DuplicateKey { .. } => "DUPLICATE_KEY",
            StorageError::NotConnected { .. } => "DATABASE_UNAVAILABLE",
            StorageError::Query { .. } => "STORAGE_ERROR",
            StorageError::Serialization { .. } => "STORAGE_ERROR",
        }
    }
}

/// True when the error chain carries a [`StorageError::DuplicateKey`]
pub fn is_duplicate_key(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<StorageError>(),
        Some(StorageError::DuplicateKey { .. })
    )
}

// =============================================================================
// Media Errors
// =============================================================================

/// Errors raised by the external media host
#[derive(Debug, Error)]
pub enum MediaError {
    /// No media host credentials were configured
    #[error("Image upload is not configured on this server")]
    NotConfigured,

    /// The upload request failed
    #[error("Image upload failed: {message}")]
    Upload { message: String },

    /// The delete request failed
    #[error("Failed to delete media '{public_id}': {message}")]
    Delete { public_id: String, message: String },
}

/// A specialized Result type for handlers
pub type ApiResult<T> = Result<T, ApiError>;
