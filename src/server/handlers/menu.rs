//! Menu item endpoints
//!
//! Creating an item may upload its image to the media host first. If the
//! insert then fails, the upload is undone through a [`CompensationPlan`] so
//! no orphaned asset is left behind.

use super::{read_failed, write_failed};
use crate::core::error::is_duplicate_key;
use crate::core::{
    ApiError, ApiResult, CompensationPlan, Document, JsonBody, MediaError, Submission, ids,
};
use crate::entities::MenuItem;
use crate::server::host::ServerHost;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde_json::{Map, Value, json};
use std::sync::Arc;

/// GET /api/menu
pub async fn list_menu_items(
    State(host): State<Arc<ServerHost>>,
) -> ApiResult<Json<Vec<MenuItem>>> {
    let items = host
        .menu
        .list()
        .await
        .map_err(|e| read_failed(e, "Failed to fetch menu items"))?;
    Ok(Json(items))
}

/// POST /api/menu
///
/// Accepts multipart form data with an optional `image` file, or JSON.
pub async fn create_menu_item(
    State(host): State<Arc<ServerHost>>,
    Submission { mut fields, image }: Submission,
) -> ApiResult<(StatusCode, Json<MenuItem>)> {
    let media = match &image {
        Some(_) => Some(host.media.clone().ok_or(MediaError::NotConfigured)?),
        None => None,
    };

    // Reject bad fields before anything is uploaded
    MenuItem::from_fields(&fields)?;

    if !host.connection.is_connected() {
        return Err(ApiError::Unavailable);
    }

    let mut plan = CompensationPlan::new();

    if let (Some(image), Some(media)) = (image, media) {
        let stored = media.upload(&image).await?;
        fields.insert("image".to_string(), Value::String(stored.secure_url));
        fields.insert(
            "imagePublicId".to_string(),
            Value::String(stored.public_id.clone()),
        );

        let public_id = stored.public_id;
        plan.push(format!("delete uploaded image {}", public_id), async move {
            media.delete(&public_id).await
        });
    }

    match insert_with_retry(&host, &fields).await {
        Ok(item) => {
            plan.commit();
            tracing::info!(id = %item.id, name = %item.name, "menu item created");
            Ok((StatusCode::CREATED, Json(item)))
        }
        Err(e) => {
            if !plan.is_empty() {
                tracing::warn!(error = %e, "menu item not saved, removing uploaded image");
                plan.run().await;
            }
            Err(e)
        }
    }
}

/// Insert, regenerating the id once if it collides
async fn insert_with_retry(host: &ServerHost, fields: &Map<String, Value>) -> ApiResult<MenuItem> {
    let mut item = MenuItem::from_fields(fields)?;

    match host.menu.create(item.clone()).await {
        Ok(saved) => Ok(saved),
        Err(e) if is_duplicate_key(&e) => {
            let retry_id = ids::retry_id();
            tracing::info!(id = %item.id, retry_id = %retry_id, "menu item id taken, retrying");
            item.set_id(retry_id);
            host.menu.create(item).await.map_err(write_failed)
        }
        Err(e) => Err(write_failed(e)),
    }
}

/// PUT /api/menu/{id}
pub async fn update_menu_item(
    State(host): State<Arc<ServerHost>>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<Map<String, Value>>,
) -> ApiResult<Json<MenuItem>> {
    let existing = host
        .menu
        .get(&id)
        .await
        .map_err(write_failed)?
        .ok_or_else(|| ApiError::not_found(MenuItem::type_name(), &id))?;

    let mut updated = existing.merged_with(&body)?;

    if updated.image != existing.image && !existing.image_public_id.is_empty() {
        delete_remote_image(&host, &existing.image_public_id).await;

        let new_public_id = body
            .get("imagePublicId")
            .is_some_and(|_| updated.image_public_id != existing.image_public_id);
        if !new_public_id {
            updated.image_public_id.clear();
        }
    }

    let saved = host
        .menu
        .update(&id, updated)
        .await
        .map_err(write_failed)?
        .ok_or_else(|| ApiError::not_found(MenuItem::type_name(), &id))?;

    Ok(Json(saved))
}

/// DELETE /api/menu/{id}
pub async fn delete_menu_item(
    State(host): State<Arc<ServerHost>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let removed = host
        .menu
        .delete(&id)
        .await
        .map_err(write_failed)?
        .ok_or_else(|| ApiError::not_found(MenuItem::type_name(), &id))?;

    if !removed.image_public_id.is_empty() {
        delete_remote_image(&host, &removed.image_public_id).await;
    }

    if host.uploads.resolve(&removed.image).is_some() {
        match host.uploads.remove(&removed.image).await {
            Ok(true) => {}
            Ok(false) => tracing::debug!(image = %removed.image, "local image already gone"),
            Err(e) => tracing::warn!(image = %removed.image, error = %e, "failed to remove local image"),
        }
    }

    tracing::info!(id = %id, "menu item deleted");
    Ok(Json(json!({ "success": true })))
}

/// Best-effort removal of an asset on the media host
async fn delete_remote_image(host: &ServerHost, public_id: &str) {
    let Some(media) = &host.media else {
        tracing::warn!(public_id, "no media store configured, image left on media host");
        return;
    };
    if let Err(e) = media.delete(public_id).await {
        tracing::warn!(public_id, error = %e, "failed to delete image from media host");
    }
}
