//! Legacy image files kept on local disk
//!
//! New uploads always go to the media host. Older menu items may still point
//! at `/<dir>/<file>` paths served from this directory, so the server keeps
//! serving them, removes them when their item is deleted and can audit which
//! ones have gone missing.

use anyhow::{Context, Result};
use chrono::Utc;
use rand::Rng;
use std::path::{Component, Path, PathBuf};

/// File name in the `<field>-<millis>-<rand>.<ext>` scheme
pub fn generated_file_name(field: &str, extension: &str) -> String {
    let suffix: u32 = rand::rng().random_range(0..1_000_000_000);
    let extension = extension.trim_start_matches('.');
    let stem = format!("{}-{}-{}", field, Utc::now().timestamp_millis(), suffix);
    if extension.is_empty() {
        stem
    } else {
        format!("{stem}.{extension}")
    }
}

/// The uploads directory and its public mount path
#[derive(Debug, Clone)]
pub struct LocalUploads {
    root: PathBuf,
    mount: String,
}

impl LocalUploads {
    /// `dir` is both the directory on disk and the URL segment it is served under
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let root = dir.as_ref().to_path_buf();
        let mount = root
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "uploads".to_string());
        Self { root, mount }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// URL segment without slashes (`uploads`)
    pub fn mount(&self) -> &str {
        &self.mount
    }

    /// Route prefix for static serving (`/uploads`)
    pub fn route(&self) -> String {
        format!("/{}", self.mount)
    }

    /// Public path of a file in the directory (`/uploads/<file>`)
    pub fn public_path(&self, file_name: &str) -> String {
        format!("/{}/{}", self.mount, file_name)
    }

    /// Placeholder image assigned by the upload audit
    pub fn default_image(&self) -> String {
        self.public_path("default.jpg")
    }

    /// Create the directory when it is missing
    pub async fn ensure_dir(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("creating uploads directory {}", self.root.display()))
    }

    /// Disk path for an image reference, when it points into this directory
    ///
    /// Both `/uploads/<file>` and `uploads/<file>` are recognised. Only plain
    /// file names are accepted, so `..` cannot escape the root.
    pub fn resolve(&self, image: &str) -> Option<PathBuf> {
        let relative = image.strip_prefix('/').unwrap_or(image);
        let file = relative
            .strip_prefix(self.mount.as_str())
            .and_then(|rest| rest.strip_prefix('/'))?;
        let mut components = Path::new(file).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) => Some(self.root.join(name)),
            _ => None,
        }
    }

    /// Whether the referenced file exists on disk
    pub async fn exists(&self, image: &str) -> bool {
        match self.resolve(image) {
            Some(path) => tokio::fs::try_exists(path).await.unwrap_or(false),
            None => false,
        }
    }

    /// Remove the referenced file. Returns `false` when there was nothing to remove.
    pub async fn remove(&self, image: &str) -> Result<bool> {
        let Some(path) = self.resolve(image) else {
            return Ok(false);
        };
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "local upload removed");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("removing {}", path.display())),
        }
    }
}
