//! ServerBuilder for fluent API to build HTTP servers

use super::host::ServerHost;
use super::router::build_router;
use crate::core::{ConnectionManager, DataService, MediaStore};
use crate::entities::{MenuItem, Order};
use crate::storage::{InMemoryConnector, InMemoryDataService, LocalUploads};
use anyhow::Result;
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Builder for the HTTP application
///
/// # Example
///
/// ```ignore
/// let app = ServerBuilder::new()
///     .with_menu_service(MongoDataService::<MenuItem>::new(connector.clone()))
///     .with_order_service(MongoDataService::<Order>::new(connector.clone()))
///     .with_connection(manager)
///     .with_media_store(CloudinaryMediaStore::new(media_config))
///     .build()?;
/// ```
pub struct ServerBuilder {
    menu: Option<Arc<dyn DataService<MenuItem>>>,
    orders: Option<Arc<dyn DataService<Order>>>,
    connection: Option<ConnectionManager>,
    media: Option<Arc<dyn MediaStore>>,
    uploads: LocalUploads,
}

impl ServerBuilder {
    /// Create a new ServerBuilder
    pub fn new() -> Self {
        Self {
            menu: None,
            orders: None,
            connection: None,
            media: None,
            uploads: LocalUploads::new("uploads"),
        }
    }

    /// Use in-memory services with an always-reachable connector
    ///
    /// The connection manager still starts disconnected until `connect()` is
    /// awaited on it.
    pub fn with_in_memory_storage(self) -> Self {
        self.with_menu_service(InMemoryDataService::<MenuItem>::new())
            .with_order_service(InMemoryDataService::<Order>::new())
            .with_connection(ConnectionManager::new(Arc::new(InMemoryConnector)))
    }

    /// Set the menu item service (required)
    pub fn with_menu_service(mut self, service: impl DataService<MenuItem> + 'static) -> Self {
        self.menu = Some(Arc::new(service));
        self
    }

    /// Set the order service (required)
    pub fn with_order_service(mut self, service: impl DataService<Order> + 'static) -> Self {
        self.orders = Some(Arc::new(service));
        self
    }

    /// Set both document services from already shared handles
    pub fn with_shared_services(
        mut self,
        menu: Arc<dyn DataService<MenuItem>>,
        orders: Arc<dyn DataService<Order>>,
    ) -> Self {
        self.menu = Some(menu);
        self.orders = Some(orders);
        self
    }

    /// Set the connection manager (required)
    pub fn with_connection(mut self, connection: ConnectionManager) -> Self {
        self.connection = Some(connection);
        self
    }

    /// Enable image uploads through a media store
    pub fn with_media_store(mut self, store: impl MediaStore + 'static) -> Self {
        self.media = Some(Arc::new(store));
        self
    }

    /// Same as [`with_media_store`](Self::with_media_store) for an already shared store
    pub fn with_shared_media_store(mut self, store: Arc<dyn MediaStore>) -> Self {
        self.media = Some(store);
        self
    }

    /// Directory for legacy uploaded images (default `uploads`)
    pub fn with_uploads(mut self, uploads: LocalUploads) -> Self {
        self.uploads = uploads;
        self
    }

    /// Build the shared application state
    pub fn build_host(self) -> Result<ServerHost> {
        let menu = self
            .menu
            .ok_or_else(|| anyhow::anyhow!("Menu service is required. Call .with_menu_service()"))?;
        let orders = self.orders.ok_or_else(|| {
            anyhow::anyhow!("Order service is required. Call .with_order_service()")
        })?;
        let connection = self.connection.ok_or_else(|| {
            anyhow::anyhow!("Connection manager is required. Call .with_connection()")
        })?;

        if self.media.is_none() {
            tracing::warn!("no media store configured, image uploads will be rejected");
        }

        Ok(ServerHost::new(
            menu,
            orders,
            connection,
            self.media,
            self.uploads,
        ))
    }

    /// Build the final router
    pub fn build(self) -> Result<Router> {
        let host = Arc::new(self.build_host()?);
        Ok(build_router(host))
    }

    /// Serve the application with graceful shutdown
    ///
    /// This will:
    /// - Bind to the provided address
    /// - Start serving requests
    /// - Handle SIGTERM and SIGINT (Ctrl+C) for graceful shutdown
    pub async fn serve(self, addr: &str) -> Result<()> {
        let app = self.build()?;
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait for Ctrl+C or SIGTERM
///
/// If a handler cannot be installed the corresponding branch never fires.
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_host_requires_services() {
        let err = ServerBuilder::new().build_host().err().unwrap();
        assert!(err.to_string().contains("Menu service is required"));

        let err = ServerBuilder::new()
            .with_menu_service(InMemoryDataService::<MenuItem>::new())
            .build_host()
            .err()
            .unwrap();
        assert!(err.to_string().contains("Order service is required"));
    }

    #[test]
    fn test_in_memory_preset() {
        let host = ServerBuilder::new().with_in_memory_storage().build_host().unwrap();
        assert!(!host.has_media_store());
        assert!(!host.connection.is_connected());
        assert_eq!(host.uploads.mount(), "uploads");
    }

    #[tokio::test]
    async fn test_build_router_serves_api() {
        use axum::body::Body;
        use axum::http::{Request, StatusCode};
        use tower::ServiceExt;

        let router = ServerBuilder::new().with_in_memory_storage().build().unwrap();

        let response = router
            .clone()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // Unknown routes fall through to the default 404
        let response = router
            .oneshot(Request::builder().uri("/version").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
