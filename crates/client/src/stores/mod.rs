//! The reactive state container shared by the session controller and the
//! presence manager.
//!
//! One [`Store`] holds an [`AppState`] snapshot behind a `watch` channel. Each
//! mutation replaces a single field inside one `send_if_modified` call, so a
//! reader never sees a half-applied write. Readers either take a snapshot or
//! subscribe for change notifications.

mod flags;

use std::sync::Arc;

use parley_shared::AuthUser;
use tokio::sync::watch;

pub use flags::{FlagGuard, RequestFlag, RequestFlags};

/// Whether the realtime connection is up, as last reported by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connected,
}

impl ConnectionStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionStatus::Connected)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    /// The logged-in user; `None` means no session.
    pub auth_user: Option<AuthUser>,
    pub flags: RequestFlags,
    /// User ids currently online, exactly as last pushed by the server.
    pub online_users: Vec<String>,
    pub connection: ConnectionStatus,
}

#[derive(Clone)]
pub struct Store {
    state: Arc<watch::Sender<AppState>>,
}

impl Store {
    pub fn new() -> Self {
        let (state, _) = watch::channel(AppState::default());
        Self {
            state: Arc::new(state),
        }
    }

    /// Copy of the latest committed state.
    pub fn snapshot(&self) -> AppState {
        self.state.borrow().clone()
    }

    /// Receiver that is notified on every committed change.
    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.state.subscribe()
    }

    /// Read-only view of the session, for components that must not mutate it.
    pub fn session_reader(&self) -> SessionReader {
        SessionReader {
            state: self.state.subscribe(),
        }
    }

    pub fn auth_user(&self) -> Option<AuthUser> {
        self.state.borrow().auth_user.clone()
    }

    pub fn flags(&self) -> RequestFlags {
        self.state.borrow().flags
    }

    pub fn online_users(&self) -> Vec<String> {
        self.state.borrow().online_users.clone()
    }

    pub fn connection(&self) -> ConnectionStatus {
        self.state.borrow().connection
    }

    pub(crate) fn set_auth_user(&self, auth_user: Option<AuthUser>) {
        self.state.send_if_modified(|state| {
            if state.auth_user == auth_user {
                return false;
            }
            state.auth_user = auth_user;
            true
        });
    }

    pub(crate) fn set_flag(&self, flag: RequestFlag, value: bool) {
        self.state.send_if_modified(|state| {
            if state.flags.get(flag) == value {
                return false;
            }
            state.flags.set(flag, value);
            true
        });
    }

    pub(crate) fn set_online_users(&self, online_users: Vec<String>) {
        self.state.send_modify(|state| state.online_users = online_users);
    }

    pub(crate) fn set_connection(&self, connection: ConnectionStatus) {
        self.state.send_if_modified(|state| {
            if state.connection == connection {
                return false;
            }
            state.connection = connection;
            true
        });
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only accessor to the current session.
#[derive(Clone)]
pub struct SessionReader {
    state: watch::Receiver<AppState>,
}

impl SessionReader {
    pub fn auth_user(&self) -> Option<AuthUser> {
        self.state.borrow().auth_user.clone()
    }

    pub fn user_id(&self) -> Option<String> {
        self.state.borrow().auth_user.as_ref().map(|u| u.id.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().auth_user.is_some()
    }
}
