//! Realtime connection seam and shared handler bookkeeping.
//!
//! The trait pair mirrors a Socket.IO client: a transport opens a handle for an
//! endpoint, and the handle can be connected, disconnected and subscribed to.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;

use crate::error::TransportError;

/// Callback invoked with the first argument of an inbound event.
pub type EventHandler = Arc<dyn Fn(&Value) + Send + Sync>;

/// Query parameters sent with the connection handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectQuery {
    pub user_id: String,
}

/// A single realtime connection handle.
pub trait Connection: Send + Sync {
    /// True once the server has accepted the connection, until it closes.
    fn connected(&self) -> bool;
    /// Start connecting in the background; returns immediately.
    fn connect(&self);
    /// Close the connection. Safe to call in any state.
    fn disconnect(&self);
    /// Register a handler for a server event or a lifecycle event
    /// (`connect`, `disconnect`, `connect_error`).
    fn on(&self, event: &str, handler: EventHandler);
}

/// Factory for connection handles.
pub trait Transport: Send + Sync {
    fn open(
        &self,
        endpoint: &str,
        query: &ConnectQuery,
    ) -> Result<Arc<dyn Connection>, TransportError>;
}

/// Event name → handlers, safe to fire from any task.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: Mutex<HashMap<String, Vec<EventHandler>>>,
}

impl HandlerRegistry {
    pub fn add(&self, event: &str, handler: EventHandler) {
        lock(&self.handlers)
            .entry(event.to_string())
            .or_default()
            .push(handler);
    }

    /// Invoke every handler for `event`; returns how many ran.
    pub fn emit(&self, event: &str, payload: &Value) -> usize {
        // Handlers run outside the lock so they may register further handlers.
        let handlers = lock(&self.handlers).get(event).cloned().unwrap_or_default();
        for handler in &handlers {
            handler(payload);
        }
        handlers.len()
    }

    pub fn count(&self, event: &str) -> usize {
        lock(&self.handlers).get(event).map_or(0, Vec::len)
    }
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// Socket.IO over tokio-tungstenite
mod connection_native;
pub use connection_native::{socketio_url, SocketIoConnection, SocketIoTransport};
