//! HTTP handlers for the menu, order and health endpoints

pub mod health;
pub mod menu;
pub mod orders;

use crate::core::{ApiError, StorageError};

/// Map a failed write to its response
///
/// Write failures are reported as client errors, except an unreachable
/// database, which stays a 503. Duplicate keys keep their own code.
pub(crate) fn write_failed(err: anyhow::Error) -> ApiError {
    match ApiError::from(err) {
        ApiError::Storage(StorageError::NotConnected { .. }) => ApiError::Unavailable,
        duplicate @ ApiError::Storage(StorageError::DuplicateKey { .. }) => duplicate,
        other => ApiError::bad_request(other.to_string()),
    }
}

/// Map a failed read to a 500 with a fixed public message
pub(crate) fn read_failed(err: anyhow::Error, message: &str) -> ApiError {
    match ApiError::from(err) {
        ApiError::Storage(StorageError::NotConnected { .. }) => ApiError::Unavailable,
        other => {
            tracing::error!(error = %other, "{}", message);
            ApiError::Internal(message.to_string())
        }
    }
}
