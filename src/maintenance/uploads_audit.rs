//! Find menu items whose local image file no longer exists

use crate::core::DataService;
use crate::entities::MenuItem;
use crate::storage::LocalUploads;
use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::path::PathBuf;

/// A menu item pointing at a missing upload
#[derive(Debug, Clone, PartialEq)]
pub struct MissingUpload {
    pub id: String,
    pub name: String,
    pub image: String,
    pub expected_path: PathBuf,
}

/// Items whose `image` points into the uploads directory but whose file is gone
///
/// Remote URLs and empty images are skipped.
pub async fn find_missing(
    menu: &dyn DataService<MenuItem>,
    uploads: &LocalUploads,
) -> Result<Vec<MissingUpload>> {
    let items = menu.list().await.context("scanning menu items")?;

    let mut missing = Vec::new();
    for item in items {
        let Some(expected_path) = uploads.resolve(&item.image) else {
            continue;
        };
        if uploads.exists(&item.image).await {
            continue;
        }
        missing.push(MissingUpload {
            id: item.id,
            name: item.name,
            image: item.image,
            expected_path,
        });
    }

    Ok(missing)
}

/// Point every missing image at the placeholder and drop its media id
///
/// Failures are logged per item and do not stop the run. Returns how many
/// items were updated.
pub async fn fix_missing(
    menu: &dyn DataService<MenuItem>,
    uploads: &LocalUploads,
    missing: &[MissingUpload],
) -> usize {
    let placeholder = uploads.default_image();
    let mut fixed = 0;

    for entry in missing {
        let mut fields = Map::new();
        fields.insert("image".to_string(), Value::String(placeholder.clone()));
        fields.insert("imagePublicId".to_string(), Value::String(String::new()));

        match menu.patch(&entry.id, fields).await {
            Ok(Some(_)) => {
                fixed += 1;
                tracing::info!(id = %entry.id, "image reset to placeholder");
            }
            Ok(None) => tracing::warn!(id = %entry.id, "menu item vanished before fix"),
            Err(e) => tracing::error!(id = %entry.id, error = %e, "failed to update menu item"),
        }
    }

    fixed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryDataService;
    use serde_json::json;

    fn item(id: &str, image: &str) -> MenuItem {
        serde_json::from_value(json!({
            "id": id, "name": format!("Dish {id}"), "price": 5, "image": image,
            "imagePublicId": "stale"
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_find_and_fix_missing() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = LocalUploads::new(dir.path().join("uploads"));
        uploads.ensure_dir().await.unwrap();
        tokio::fs::write(uploads.root().join("present.png"), b"png")
            .await
            .unwrap();

        let menu = InMemoryDataService::<MenuItem>::new();
        for dish in [
            item("1", "/uploads/present.png"),
            item("2", "/uploads/gone.png"),
            item("3", "uploads/also-gone.jpg"),
            item("4", "https://res.cloudinary.com/demo/x.png"),
            item("5", ""),
        ] {
            menu.create(dish).await.unwrap();
        }

        let missing = find_missing(&menu, &uploads).await.unwrap();
        let ids: Vec<_> = missing.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "3"]);
        assert_eq!(missing[0].expected_path, uploads.root().join("gone.png"));

        assert_eq!(fix_missing(&menu, &uploads, &missing).await, 2);

        let fixed = menu.get("2").await.unwrap().unwrap();
        assert_eq!(fixed.image, "/uploads/default.jpg");
        assert_eq!(fixed.image_public_id, "");
        assert_eq!(menu.get("1").await.unwrap().unwrap().image_public_id, "stale");
    }
}
