//! Liveness endpoint

use crate::core::ConnectionStatus;
use crate::server::host::ServerHost;
use axum::Json;
use axum::extract::State;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    #[serde(flatten)]
    pub database: ConnectionStatus,
}

/// Always 200 while the process is up; the body carries database status
pub async fn health_check(State(host): State<Arc<ServerHost>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        database: host.connection.status(),
    })
}
