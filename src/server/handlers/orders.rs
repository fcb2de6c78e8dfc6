//! Order endpoints

use super::{read_failed, write_failed};
use crate::core::{ApiError, ApiResult, Document, JsonBody, ValidationError};
use crate::entities::{Order, OrderStatus};
use crate::server::host::ServerHost;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde_json::{Map, Value, json};
use std::sync::Arc;

/// GET /api/orders
pub async fn list_orders(State(host): State<Arc<ServerHost>>) -> ApiResult<Json<Vec<Order>>> {
    if !host.connection.is_connected() {
        return Err(ApiError::Unavailable);
    }

    let orders = host
        .orders
        .list()
        .await
        .map_err(|e| read_failed(e, "Failed to fetch orders"))?;
    Ok(Json(orders))
}

/// POST /api/orders
pub async fn create_order(
    State(host): State<Arc<ServerHost>>,
    JsonBody(body): JsonBody<Map<String, Value>>,
) -> ApiResult<(StatusCode, Json<Order>)> {
    if !host.connection.is_connected() {
        return Err(ApiError::Unavailable);
    }

    let order = Order::from_submission(&body)?;
    let saved = host.orders.create(order).await.map_err(write_failed)?;

    tracing::info!(id = %saved.id, room = %saved.room_number, "order placed");
    Ok((StatusCode::CREATED, Json(saved)))
}

/// PATCH /api/orders/{id}/status
///
/// The status is checked before any write, so a rejected value leaves the
/// stored order untouched.
pub async fn update_order_status(
    State(host): State<Arc<ServerHost>>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<Map<String, Value>>,
) -> ApiResult<Json<Order>> {
    let status = match body.get("status") {
        Some(Value::String(s)) => s.parse::<OrderStatus>()?,
        other => {
            return Err(ValidationError::InvalidStatus {
                value: other.map(Value::to_string).unwrap_or_default(),
            }
            .into());
        }
    };

    let mut fields = Map::new();
    fields.insert("status".to_string(), json!(status));

    let updated = host
        .orders
        .patch(&id, fields)
        .await
        .map_err(write_failed)?
        .ok_or_else(|| ApiError::not_found(Order::type_name(), &id))?;

    tracing::info!(id = %id, status = %status, "order status updated");
    Ok(Json(updated))
}

/// DELETE /api/orders/{id}
pub async fn delete_order(
    State(host): State<Arc<ServerHost>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    host.orders
        .delete(&id)
        .await
        .map_err(write_failed)?
        .ok_or_else(|| ApiError::not_found(Order::type_name(), &id))?;

    tracing::info!(id = %id, "order deleted");
    Ok(Json(json!({ "success": true })))
}
