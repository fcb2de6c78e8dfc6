//! Cloudinary client for menu images
//!
//! Uploads and deletes go through the signed REST API. Parameters are signed
//! with SHA-256 over the alphabetically sorted `key=value` pairs joined by
//! `&`, with the API secret appended.

use crate::config::MediaConfig;
use crate::core::{ImageUpload, MediaError, MediaStore, StoredMedia};
use crate::storage::local_uploads::generated_file_name;
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha2::{Digest, Sha256};

const DEFAULT_API_BASE: &str = "https://api.cloudinary.com";

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorMessage,
}

#[derive(Debug, Deserialize)]
struct ErrorMessage {
    message: String,
}

/// Media store backed by a Cloudinary account
#[derive(Debug, Clone)]
pub struct CloudinaryMediaStore {
    client: reqwest::Client,
    config: MediaConfig,
    api_base: String,
}

impl CloudinaryMediaStore {
    pub fn new(config: MediaConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Point the client at another API host
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self, action: &str) -> String {
        format!(
            "{}/v1_1/{}/image/{}",
            self.api_base, self.config.cloud_name, action
        )
    }

    /// Signature for a set of request parameters
    pub fn sign(&self, params: &[(&str, &str)]) -> String {
        let mut sorted: Vec<_> = params.iter().filter(|(_, v)| !v.is_empty()).collect();
        sorted.sort_by(|a, b| a.0.cmp(b.0));

        let to_sign = sorted
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");

        let mut hasher = Sha256::new();
        hasher.update(to_sign.as_bytes());
        hasher.update(self.config.api_secret.as_bytes());
        hex::encode(hasher.finalize())
    }

    fn signed_form(&self, params: &[(&str, &str)]) -> Form {
        let signature = self.sign(params);
        let mut form = Form::new()
            .text("api_key", self.config.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");
        for (key, value) in params {
            form = form.text(key.to_string(), value.to_string());
        }
        form
    }
}

async fn error_message(response: reqwest::Response) -> String {
    let status = response.status();
    match response.json::<ErrorEnvelope>().await {
        Ok(envelope) => envelope.error.message,
        Err(_) => format!("media host answered {status}"),
    }
}

#[async_trait]
impl MediaStore for CloudinaryMediaStore {
    #[tracing::instrument(skip(self, image), fields(size = image.data.len()), err)]
    async fn upload(&self, image: &ImageUpload) -> Result<StoredMedia> {
        let timestamp = Utc::now().timestamp().to_string();
        let file_name = image
            .file_name
            .clone()
            .unwrap_or_else(|| generated_file_name(&image.field_name, image.extension()));

        let mut part = Part::bytes(image.data.to_vec()).file_name(file_name);
        if let Some(content_type) = &image.content_type {
            part = part.mime_str(content_type).map_err(|e| MediaError::Upload {
                message: e.to_string(),
            })?;
        }

        let form = self
            .signed_form(&[
                ("folder", self.config.folder.as_str()),
                ("timestamp", timestamp.as_str()),
            ])
            .part("file", part);

        let response = self
            .client
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| MediaError::Upload {
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(MediaError::Upload {
                message: error_message(response).await,
            }
            .into());
        }

        let uploaded: UploadResponse = response.json().await.map_err(|e| MediaError::Upload {
            message: e.to_string(),
        })?;
        tracing::info!(public_id = %uploaded.public_id, "image uploaded");

        Ok(StoredMedia {
            secure_url: uploaded.secure_url,
            public_id: uploaded.public_id,
        })
    }

    #[tracing::instrument(skip(self), err)]
    async fn delete(&self, public_id: &str) -> Result<()> {
        let timestamp = Utc::now().timestamp().to_string();
        let form = self.signed_form(&[("public_id", public_id), ("timestamp", timestamp.as_str())]);

        let delete_error = |message: String| MediaError::Delete {
            public_id: public_id.to_string(),
            message,
        };

        let response = self
            .client
            .post(self.endpoint("destroy"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| delete_error(e.to_string()))?;

        if !response.status().is_success() {
            return Err(delete_error(error_message(response).await).into());
        }

        let destroyed: DestroyResponse = response
            .json()
            .await
            .map_err(|e| delete_error(e.to_string()))?;
        // "not found" means there is nothing left to clean up
        tracing::debug!(public_id, result = %destroyed.result, "image deleted");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Multipart, Path};
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{Value, json};
    use std::sync::{Arc, Mutex};

    /// Requests seen by the fake media host: (action, multipart fields)
    #[derive(Default)]
    struct Received {
        requests: Mutex<Vec<(String, Vec<(String, String)>)>>,
    }

    impl Received {
        fn only_request(&self) -> (String, Vec<(String, String)>) {
            let requests = self.requests.lock().unwrap();
            assert_eq!(requests.len(), 1);
            requests[0].clone()
        }
    }

    fn field<'a>(fields: &'a [(String, String)], name: &str) -> Option<&'a str> {
        fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Local stand-in for the media API answering every call with `status` and `body`
    ///
    /// File parts are recorded by file name, text parts by value.
    async fn fake_host(status: StatusCode, body: Value) -> (CloudinaryMediaStore, Arc<Received>) {
        let received = Arc::new(Received::default());
        let seen = received.clone();

        let app = Router::new().route(
            "/v1_1/demo/image/{action}",
            post(move |Path(action): Path<String>, mut multipart: Multipart| {
                let seen = seen.clone();
                let body = body.clone();
                async move {
                    let mut fields = Vec::new();
                    while let Ok(Some(part)) = multipart.next_field().await {
                        let name = part.name().unwrap_or_default().to_string();
                        let file_name = part.file_name().map(str::to_string);
                        let value = match file_name {
                            Some(file_name) => file_name,
                            None => part.text().await.unwrap_or_default(),
                        };
                        fields.push((name, value));
                    }
                    seen.requests.lock().unwrap().push((action, fields));
                    (status, Json(body))
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (store().with_api_base(format!("http://{}", addr)), received)
    }

    fn image(file_name: Option<&str>) -> ImageUpload {
        ImageUpload {
            field_name: "image".to_string(),
            file_name: file_name.map(str::to_string),
            content_type: Some("image/png".to_string()),
            data: axum::body::Bytes::from_static(b"png"),
        }
    }

    fn store() -> CloudinaryMediaStore {
        CloudinaryMediaStore::new(MediaConfig {
            cloud_name: "demo".to_string(),
            api_key: "key".to_string(),
            api_secret: "abcd".to_string(),
            folder: "spice-central".to_string(),
        })
    }

    #[test]
    fn test_sign_sorts_parameters() {
        let store = store();
        let expected = "609315aded9d41a46bc499268aab09ff92b2cb7c2fb1a60855ad6cd90393bf7a";
        assert_eq!(
            store.sign(&[("timestamp", "1700000000"), ("folder", "spice-central")]),
            expected
        );
        assert_eq!(
            store.sign(&[("folder", "spice-central"), ("timestamp", "1700000000")]),
            expected
        );
    }

    #[test]
    fn test_sign_destroy() {
        assert_eq!(
            store().sign(&[
                ("public_id", "spice-central/dish"),
                ("timestamp", "1700000000")
            ]),
            "ae3e32b750964973f6e5eb35b4de58e9d6764b640b5b322e7b032ae29fc868e1"
        );
    }

    #[test]
    fn test_empty_parameters_are_not_signed() {
        let store = store();
        assert_eq!(
            store.sign(&[("folder", ""), ("timestamp", "1700000000")]),
            store.sign(&[("timestamp", "1700000000")])
        );
    }

    #[test]
    fn test_endpoint() {
        let store = store().with_api_base("http://127.0.0.1:9000/");
        assert_eq!(
            store.endpoint("destroy"),
            "http://127.0.0.1:9000/v1_1/demo/image/destroy"
        );
    }

    #[tokio::test]
    async fn test_upload_sends_signed_form() {
        let (store, received) = fake_host(
            StatusCode::OK,
            json!({
                "secure_url": "https://res.cloudinary.com/demo/image/upload/v1/spice-central/dish.png",
                "public_id": "spice-central/dish",
                "format": "png"
            }),
        )
        .await;

        let stored = store.upload(&image(Some("dish.png"))).await.unwrap();
        assert_eq!(stored.public_id, "spice-central/dish");
        assert!(stored.secure_url.ends_with("/spice-central/dish.png"));

        let (action, fields) = received.only_request();
        assert_eq!(action, "upload");
        assert_eq!(field(&fields, "file"), Some("dish.png"));
        assert_eq!(field(&fields, "folder"), Some("spice-central"));
        assert_eq!(field(&fields, "api_key"), Some("key"));
        assert_eq!(field(&fields, "signature_algorithm"), Some("sha256"));

        let timestamp = field(&fields, "timestamp").unwrap();
        let expected = store.sign(&[("folder", "spice-central"), ("timestamp", timestamp)]);
        assert_eq!(field(&fields, "signature"), Some(expected.as_str()));
    }

    #[tokio::test]
    async fn test_upload_without_file_name_gets_generated_one() {
        let (store, received) = fake_host(
            StatusCode::OK,
            json!({"secure_url": "https://res.cloudinary.com/x.png", "public_id": "x"}),
        )
        .await;

        store.upload(&image(None)).await.unwrap();

        let (_, fields) = received.only_request();
        assert!(field(&fields, "file").unwrap().starts_with("image-"));
    }

    #[tokio::test]
    async fn test_upload_error_envelope() {
        let (store, _) = fake_host(
            StatusCode::BAD_REQUEST,
            json!({"error": {"message": "Invalid image file"}}),
        )
        .await;

        let err = store.upload(&image(Some("dish.png"))).await.unwrap_err();
        match err.downcast_ref::<MediaError>() {
            Some(MediaError::Upload { message }) => assert_eq!(message, "Invalid image file"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_destroy_not_found_is_ok() {
        let (store, received) = fake_host(StatusCode::OK, json!({"result": "not found"})).await;

        store.delete("spice-central/gone").await.unwrap();

        let (action, fields) = received.only_request();
        assert_eq!(action, "destroy");
        assert_eq!(field(&fields, "public_id"), Some("spice-central/gone"));
        assert!(field(&fields, "signature").is_some());
    }

    #[tokio::test]
    async fn test_destroy_error_is_typed() {
        let (store, _) = fake_host(
            StatusCode::UNAUTHORIZED,
            json!({"error": {"message": "Invalid Signature"}}),
        )
        .await;

        let err = store.delete("spice-central/dish").await.unwrap_err();
        match err.downcast_ref::<MediaError>() {
            Some(MediaError::Delete { public_id, message }) => {
                assert_eq!(public_id, "spice-central/dish");
                assert_eq!(message, "Invalid Signature");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
