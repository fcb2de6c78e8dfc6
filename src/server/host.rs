//! Shared state handed to every request handler
//!
//! The host owns the document services, the connection manager, the optional
//! media store and the local uploads directory. Handlers receive it as
//! `State<Arc<ServerHost>>`; nothing here is global.

use crate::core::{ConnectionManager, DataService, MediaStore};
use crate::entities::{MenuItem, Order};
use crate::storage::LocalUploads;
use std::sync::Arc;

/// Host context containing all application state
///
/// # Example
///
/// ```rust,ignore
/// let host = ServerBuilder::new()
///     .with_menu_service(InMemoryDataService::<MenuItem>::new())
///     .with_order_service(InMemoryDataService::<Order>::new())
///     .with_connection(ConnectionManager::new(Arc::new(InMemoryConnector)))
///     .build_host()?;
/// ```
pub struct ServerHost {
    pub menu: Arc<dyn DataService<MenuItem>>,

    pub orders: Arc<dyn DataService<Order>>,

    /// Database connectivity, consulted before writes and by `/health`
    pub connection: ConnectionManager,

    /// External media host; `None` when no credentials are configured
    pub media: Option<Arc<dyn MediaStore>>,

    /// Legacy on-disk images
    pub uploads: LocalUploads,
}

impl ServerHost {
    pub fn new(
        menu: Arc<dyn DataService<MenuItem>>,
        orders: Arc<dyn DataService<Order>>,
        connection: ConnectionManager,
        media: Option<Arc<dyn MediaStore>>,
        uploads: LocalUploads,
    ) -> Self {
        Self {
            menu,
            orders,
            connection,
            media,
            uploads,
        }
    }

    pub fn has_media_store(&self) -> bool {
        self.media.is_some()
    }
}
