//! External media storage abstraction

use anyhow::Result;
use async_trait::async_trait;
use axum::body::Bytes;

/// An image captured in memory from a multipart request
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// Multipart field name the file arrived under
    pub field_name: String,
    /// Client-supplied file name, if any
    pub file_name: Option<String>,
    /// MIME type reported by the client, if any
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl ImageUpload {
    /// Extension of the original file name including the dot, or ""
    pub fn extension(&self) -> &str {
        self.file_name
            .as_deref()
            .and_then(|name| name.rfind('.').map(|idx| &name[idx..]))
            .filter(|ext| ext.len() > 1)
            .unwrap_or("")
    }
}

/// Reference returned by the media host after a successful upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMedia {
    /// HTTPS URL clients use to display the image
    pub secure_url: String,
    /// Opaque id used to delete the asset later
    pub public_id: String,
}

/// A third-party host that stores uploaded images
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Upload the image and return its public reference
    async fn upload(&self, image: &ImageUpload) -> Result<StoredMedia>;

    /// Delete a previously uploaded asset
    async fn delete(&self, public_id: &str) -> Result<()>;
}
