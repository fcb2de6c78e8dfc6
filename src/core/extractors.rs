//! Axum extractors for request bodies
//!
//! Both extractors reject with an [`ApiError`] so malformed bodies come back
//! as 400 with the usual JSON error shape instead of axum's plain-text
//! rejections.

use axum::Json;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::core::error::{ApiError, ValidationError};
use crate::core::media::ImageUpload;

/// Multipart field that carries the menu image
pub const IMAGE_FIELD: &str = "image";

/// JSON body extractor with 400 rejections
///
/// # Usage
///
/// ```rust,ignore
/// pub async fn update_status(
///     JsonBody(body): JsonBody<StatusUpdate>,
/// ) -> ApiResult<Json<Order>> { ... }
/// ```
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(ValidationError::InvalidBody {
                message: rejection.body_text(),
            }
            .into()),
        }
    }
}

/// A flat form submission: text fields plus an optional image
///
/// Accepts `multipart/form-data` (text parts become string values, the
/// `image` file part is buffered in memory) or a JSON object body.
#[derive(Debug, Default)]
pub struct Submission {
    pub fields: Map<String, Value>,
    pub image: Option<ImageUpload>,
}

impl<S> FromRequest<S> for Submission
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("multipart/form-data"));

        if is_multipart {
            let multipart = Multipart::from_request(req, state).await.map_err(|e| {
                ValidationError::InvalidBody {
                    message: e.body_text(),
                }
            })?;
            return read_multipart(multipart).await;
        }

        let JsonBody(body) = JsonBody::<Value>::from_request(req, state).await?;
        match body {
            Value::Object(fields) => Ok(Submission {
                fields,
                image: None,
            }),
            _ => Err(ValidationError::InvalidBody {
                message: "expected a JSON object".to_string(),
            }
            .into()),
        }
    }
}

async fn read_multipart(mut multipart: Multipart) -> Result<Submission, ApiError> {
    let mut submission = Submission::default();

    while let Some(field) = multipart.next_field().await.map_err(invalid_multipart)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if field.file_name().is_some() {
            if name != IMAGE_FIELD || submission.image.is_some() {
                tracing::debug!(field = %name, "ignoring unexpected file field");
                continue;
            }
            let file_name = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);
            let data = field.bytes().await.map_err(invalid_multipart)?;
            if data.is_empty() {
                continue;
            }
            submission.image = Some(ImageUpload {
                field_name: name,
                file_name,
                content_type,
                data,
            });
        } else {
            let text = field.text().await.map_err(invalid_multipart)?;
            submission.fields.insert(name, Value::String(text));
        }
    }

    Ok(submission)
}

fn invalid_multipart(err: axum::extract::multipart::MultipartError) -> ApiError {
    ValidationError::InvalidBody {
        message: err.body_text(),
    }
    .into()
}
