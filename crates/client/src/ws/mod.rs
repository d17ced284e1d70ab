//! Realtime presence connection.
//!
//! This module provides:
//! - The [`Transport`] / [`Connection`] seam the presence manager talks through
//! - A Socket.IO client over WebSocket ([`SocketIoTransport`])
//! - [`PresenceManager`], which keeps at most one connection alive for the
//!   current session and mirrors the server's online-user list into the store
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────┐  connect/disconnect   ┌───────────────────┐
//! │ SessionController │ ────────────────────▶ │  PresenceManager  │
//! └───────────────────┘                       └───────────────────┘
//!          │ auth_user                          │ reads SessionReader
//!          ▼                                    │ owns one handle
//! ┌───────────────────┐   online_users        ┌───────────────────┐
//! │       Store       │ ◀──────────────────── │    Connection     │
//! └───────────────────┘   ("getOnlineUsers")  └───────────────────┘
//! ```

mod connection;
mod manager;

pub use connection::{
    socketio_url, ConnectQuery, Connection, EventHandler, HandlerRegistry, SocketIoConnection,
    SocketIoTransport, Transport,
};
pub use manager::PresenceManager;
