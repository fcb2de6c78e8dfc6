//! HTTP server: shared host state, routes, handlers and the keep-alive task

pub mod builder;
pub mod handlers;
pub mod host;
pub mod keep_alive;
pub mod router;

pub use builder::ServerBuilder;
pub use host::ServerHost;
