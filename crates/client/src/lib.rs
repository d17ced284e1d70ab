//! Parley client session core
//!
//! Headless client state for the parley chat backend: who is logged in,
//! which auth requests are in flight, and which users are online. The
//! session controller talks to the REST API; the presence manager keeps a
//! single Socket.IO connection open for as long as there is a session.

pub mod api_client;
pub mod auth_session;
pub mod config;
pub mod context;
pub mod error;
pub mod notify;
pub mod stores;
pub mod ws;

#[cfg(test)]
mod testing;

pub use api_client::{ApiClient, AuthBackend};
pub use auth_session::{ConnectionSwitch, SessionController};
pub use config::{ClientConfig, Mode};
pub use context::ChatContext;
pub use error::{ClientError, ConfigError, TransportError};
pub use notify::{Notifier, TracingNotifier};
pub use stores::{AppState, ConnectionStatus, RequestFlag, RequestFlags, SessionReader, Store};
pub use ws::{PresenceManager, SocketIoTransport};
