//! Presence connection manager: one realtime connection per session.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use parley_shared::{EVENT_CONNECT, EVENT_DISCONNECT, GET_ONLINE_USERS};
use serde_json::Value;

use super::connection::{lock, ConnectQuery, Connection, Transport};
use crate::auth_session::ConnectionSwitch;
use crate::stores::{ConnectionStatus, SessionReader, Store};

/// Owns at most one realtime connection and keeps the store's online-user
/// list in sync with what the server pushes.
///
/// Whether a connection should exist is derived from the session on every
/// call; the manager never caches the user.
pub struct PresenceManager {
    transport: Arc<dyn Transport>,
    session: SessionReader,
    store: Store,
    endpoint: String,
    slot: Mutex<Slot>,
    /// Bumped per opened handle so late lifecycle events from a replaced
    /// handle cannot overwrite the current status.
    generation: Arc<AtomicU64>,
}

#[derive(Default)]
struct Slot {
    handle: Option<Arc<dyn Connection>>,
    /// Set while the handle may still connect or is connected; cleared once
    /// the manager has shut it down.
    live: bool,
}

impl PresenceManager {
    pub fn new(
        transport: Arc<dyn Transport>,
        session: SessionReader,
        store: Store,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            session,
            store,
            endpoint: endpoint.into(),
            slot: Mutex::new(Slot::default()),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Open the realtime connection for the current session.
    ///
    /// No-op without a session or while the current handle is connected.
    pub fn connect(&self) {
        let Some(user) = self.session.auth_user() else {
            tracing::debug!("no session, not connecting");
            return;
        };

        let mut slot = lock(&self.slot);
        if slot.live && slot.handle.as_ref().is_some_and(|h| h.connected()) {
            return;
        }
        if let Some(stale) = slot.handle.take() {
            if slot.live {
                stale.disconnect();
            }
        }
        slot.live = false;

        let query = ConnectQuery {
            user_id: user.id.clone(),
        };
        let connection = match self.transport.open(&self.endpoint, &query) {
            Ok(connection) => connection,
            Err(e) => {
                tracing::warn!(error = %e, "cannot open realtime connection");
                return;
            }
        };

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let store = self.store.clone();
        connection.on(
            GET_ONLINE_USERS,
            Arc::new(move |payload: &Value| match online_users_from(payload) {
                Some(users) => store.set_online_users(users),
                None => tracing::warn!(%payload, "ignoring malformed online-user list"),
            }),
        );

        for (event, status) in [
            (EVENT_CONNECT, ConnectionStatus::Connected),
            (EVENT_DISCONNECT, ConnectionStatus::Disconnected),
        ] {
            let store = self.store.clone();
            let current = Arc::clone(&self.generation);
            connection.on(
                event,
                Arc::new(move |_: &Value| {
                    if current.load(Ordering::SeqCst) == generation {
                        store.set_connection(status);
                    }
                }),
            );
        }

        connection.connect();
        slot.handle = Some(connection);
        slot.live = true;
        tracing::info!(user_id = %user.id, endpoint = %self.endpoint, "realtime connection requested");
    }

    /// Close the current connection, including one still handshaking. The
    /// handle stays in place and the last online-user snapshot is kept.
    pub fn disconnect(&self) {
        let mut slot = lock(&self.slot);
        if !slot.live {
            return;
        }
        let Some(handle) = slot.handle.as_ref() else {
            return;
        };
        handle.disconnect();
        slot.live = false;
        self.store.set_connection(ConnectionStatus::Disconnected);
        tracing::info!("realtime connection closed");
    }

    /// The current connection handle, connected or not.
    pub fn handle(&self) -> Option<Arc<dyn Connection>> {
        lock(&self.slot).handle.clone()
    }

    pub fn is_connected(&self) -> bool {
        lock(&self.slot)
            .handle
            .as_ref()
            .is_some_and(|h| h.connected())
    }

    pub fn online_users(&self) -> Vec<String> {
        self.store.online_users()
    }
}

impl ConnectionSwitch for PresenceManager {
    fn connect(&self) {
        PresenceManager::connect(self);
    }

    fn disconnect(&self) {
        PresenceManager::disconnect(self);
    }
}

/// The list is taken verbatim: order and duplicates are the server's.
fn online_users_from(payload: &Value) -> Option<Vec<String>> {
    serde_json::from_value(payload.clone()).ok()
}
