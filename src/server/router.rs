//! Route table and middleware stack

use super::handlers::{health, menu, orders};
use super::host::ServerHost;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, patch, put};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Largest accepted request body, sized for phone-camera images
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Build the application router
///
/// - GET /health - liveness and database status
/// - GET, POST /api/menu - list and create menu items
/// - PUT, DELETE /api/menu/{id} - replace and delete a menu item
/// - GET, POST /api/orders - list and create orders
/// - DELETE /api/orders/{id} - delete an order
/// - PATCH /api/orders/{id}/status - set an order's status
/// - GET /<uploads>/* - legacy image files
pub fn build_router(host: Arc<ServerHost>) -> Router {
    let uploads = ServeDir::new(host.uploads.root());
    let uploads_route = host.uploads.route();

    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/menu", get(menu::list_menu_items).post(menu::create_menu_item))
        .route(
            "/api/menu/{id}",
            put(menu::update_menu_item).delete(menu::delete_menu_item),
        )
        .route("/api/orders", get(orders::list_orders).post(orders::create_order))
        .route(
            "/api/orders/{id}",
            axum::routing::delete(orders::delete_order),
        )
        .route("/api/orders/{id}/status", patch(orders::update_order_status))
        .nest_service(&uploads_route, uploads)
        .with_state(host)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
