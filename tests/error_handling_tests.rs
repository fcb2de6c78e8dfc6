//! Tests for the typed error handling system
//!
//! These tests verify that:
//! - Errors return correct HTTP status codes
//! - Error responses carry `error`, `code` and optional `details`
//! - Typed causes survive the trip through `anyhow`

use axum::http::StatusCode;
use axum::response::IntoResponse;
use spice::core::error::{ErrorResponse, FieldValidationError, is_duplicate_key};
use spice::prelude::*;

async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

// =============================================================================
// HTTP Status Code Tests
// =============================================================================

mod status_code_tests {
    use super::*;

    #[test]
    fn test_not_found_returns_404() {
        assert_eq!(
            ApiError::not_found("order", "1").status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_validation_errors_return_400() {
        for err in [
            ValidationError::MissingField {
                field: "roomNumber".to_string(),
            },
            ValidationError::InvalidPhone {
                value: "98765".to_string(),
            },
            ValidationError::InvalidStatus {
                value: "shipped".to_string(),
            },
            ValidationError::InvalidBody {
                message: "EOF while parsing".to_string(),
            },
        ] {
            assert_eq!(ApiError::from(err).status_code(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn test_unavailable_returns_503() {
        assert_eq!(
            ApiError::Unavailable.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        let offline: ApiError = StorageError::NotConnected {
            backend: "mongodb".to_string(),
        }
        .into();
        assert_eq!(offline.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_media_and_config_errors_return_500() {
        let upload: ApiError = MediaError::Upload {
            message: "timeout".to_string(),
        }
        .into();
        assert_eq!(upload.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            ApiError::config("missing credentials").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_duplicate_key_returns_400() {
        let err: ApiError = StorageError::DuplicateKey {
            collection: "orders".to_string(),
            id: "1".to_string(),
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}

// =============================================================================
// Error Code Tests
// =============================================================================

mod error_code_tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(ApiError::Unavailable.error_code(), "DATABASE_UNAVAILABLE");
        assert_eq!(ApiError::not_found("order", "1").error_code(), "NOT_FOUND");
        assert_eq!(ApiError::bad_request("nope").error_code(), "BAD_REQUEST");
        assert_eq!(ApiError::config("nope").error_code(), "CONFIG_ERROR");
        assert_eq!(
            ApiError::Internal("Failed to fetch orders".to_string()).error_code(),
            "INTERNAL_ERROR"
        );

        let media: ApiError = MediaError::Delete {
            public_id: "spice-central/x".to_string(),
            message: "gone".to_string(),
        }
        .into();
        assert_eq!(media.error_code(), "MEDIA_ERROR");

        let query: ApiError = StorageError::Query {
            backend: "mongodb".to_string(),
            message: "bad".to_string(),
        }
        .into();
        assert_eq!(query.error_code(), "STORAGE_ERROR");
    }
}

// =============================================================================
// Error Response Tests
// =============================================================================

mod error_response_tests {
    use super::*;

    #[tokio::test]
    async fn test_body_has_error_and_code_only() {
        let (status, body) = body_json(ApiError::Unavailable).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            body,
            serde_json::json!({"error": "Database not connected", "code": "DATABASE_UNAVAILABLE"})
        );
    }

    #[tokio::test]
    async fn test_not_found_includes_details() {
        let (status, body) = body_json(ApiError::not_found("menu item", "42")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Not found");
        assert_eq!(body["details"]["entity_type"], "menu item");
        assert_eq!(body["details"]["id"], "42");
    }

    #[tokio::test]
    async fn test_field_errors_include_fields() {
        let err: ApiError = ValidationError::FieldErrors(vec![FieldValidationError {
            field: "price".to_string(),
            message: "price must be a number".to_string(),
        }])
        .into();

        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["details"]["fields"][0]["field"], "price");
    }

    #[test]
    fn test_error_response_serializes_without_details() {
        let response = ErrorResponse {
            error: "Invalid status".to_string(),
            code: "VALIDATION_ERROR".to_string(),
            details: None,
        };
        let json = serde_json::to_value(response).unwrap();
        assert!(json.get("details").is_none());
    }
}

// =============================================================================
// Conversion Tests
// =============================================================================

mod error_conversion_tests {
    use super::*;

    #[test]
    fn test_storage_error_survives_anyhow() {
        let err = anyhow::Error::new(StorageError::DuplicateKey {
            collection: "menuitems".to_string(),
            id: "7".to_string(),
        });
        assert!(is_duplicate_key(&err));
        assert!(matches!(
            ApiError::from(err),
            ApiError::Storage(StorageError::DuplicateKey { .. })
        ));
    }

    #[test]
    fn test_media_not_configured_becomes_config_error() {
        let err = anyhow::Error::new(MediaError::NotConfigured);
        let api = ApiError::from(err);
        assert_eq!(api.error_code(), "CONFIG_ERROR");
        assert_eq!(api.to_string(), "Image upload is not configured on this server");
    }

    #[test]
    fn test_context_does_not_hide_duplicate_key() {
        use anyhow::Context;

        let result: anyhow::Result<()> = Err(StorageError::DuplicateKey {
            collection: "orders".to_string(),
            id: "1".to_string(),
        }
        .into());
        let err = result.context("saving order").unwrap_err();
        assert!(is_duplicate_key(&err));
    }

    #[test]
    fn test_unknown_error_is_internal() {
        let api = ApiError::from(anyhow::anyhow!("socket closed"));
        assert_eq!(api.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.error_code(), "INTERNAL_ERROR");
    }
}
