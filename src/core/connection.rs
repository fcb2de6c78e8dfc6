//! Database connection state and the manager that owns it
//!
//! The flags kept here are advisory. A handler that checks `is_connected()`
//! can race with a concurrent connect or a driver heartbeat, which is fine:
//! the check only exists to fail fast with a 503 instead of waiting on a
//! server-selection timeout.

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

/// Connectivity flags shared between the manager and driver monitoring
#[derive(Debug, Default)]
pub struct ConnectionState {
    connected: AtomicBool,
    last_error: RwLock<Option<String>>,
}

impl ConnectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the database reachable and clear the recorded failure
    pub fn mark_connected(&self) {
        self.connected.store(true, Ordering::SeqCst);
        if let Ok(mut last_error) = self.last_error.write() {
            *last_error = None;
        }
    }

    /// Mark the database unreachable and record why
    pub fn mark_disconnected(&self, reason: impl Into<String>) {
        self.connected.store(false, Ordering::SeqCst);
        if let Ok(mut last_error) = self.last_error.write() {
            *last_error = Some(reason.into());
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().ok().and_then(|e| e.clone())
    }
}

/// Snapshot returned by [`ConnectionManager::status`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStatus {
    pub db_connected: bool,
    pub last_error: Option<String>,
}

/// A database backend the manager can connect
///
/// Implementations may keep `state` and update it later from driver events
/// (heartbeats, topology changes) so that `is_connected()` reflects live
/// reachability rather than only the outcome of the last attempt.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Backend label used in logs
    fn backend(&self) -> &'static str;

    /// Attempt to reach the database once
    async fn connect(&self, state: Arc<ConnectionState>) -> Result<()>;
}

/// Owns the connection state for one database
///
/// Cloned handles share the same state.
#[derive(Clone)]
pub struct ConnectionManager {
    connector: Arc<dyn Connector>,
    state: Arc<ConnectionState>,
}

impl ConnectionManager {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            state: Arc::new(ConnectionState::new()),
        }
    }

    /// Try to connect; failures are recorded, never returned
    pub async fn connect(&self) -> bool {
        match self.connector.connect(self.state.clone()).await {
            Ok(()) => {
                self.state.mark_connected();
                tracing::info!(backend = self.connector.backend(), "database connected");
                true
            }
            Err(e) => {
                let reason = format!("{:#}", e);
                tracing::error!(
                    backend = self.connector.backend(),
                    error = %reason,
                    "database connection failed"
                );
                self.state.mark_disconnected(reason);
                false
            }
        }
    }

    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    pub fn last_error(&self) -> Option<String> {
        self.state.last_error()
    }

    pub fn status(&self) -> ConnectionStatus {
        ConnectionStatus {
            db_connected: self.is_connected(),
            last_error: self.last_error(),
        }
    }

    /// Shared state handle, for backends that report liveness out of band
    pub fn state(&self) -> Arc<ConnectionState> {
        self.state.clone()
    }
}
