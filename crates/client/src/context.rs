//! Wiring of the store, session controller and presence manager.

use std::sync::Arc;

use crate::api_client::{ApiClient, AuthBackend};
use crate::auth_session::SessionController;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::notify::{Notifier, TracingNotifier};
use crate::stores::Store;
use crate::ws::{PresenceManager, SocketIoTransport, Transport};

/// Everything a front end needs: observe `store`, call into `session`.
///
/// The presence manager is reachable for inspection; the session controller
/// drives it on login and logout.
#[derive(Clone)]
pub struct ChatContext {
    pub store: Store,
    pub session: Arc<SessionController>,
    pub presence: Arc<PresenceManager>,
}

impl ChatContext {
    pub fn new(
        backend: Arc<dyn AuthBackend>,
        transport: Arc<dyn Transport>,
        notifier: Arc<dyn Notifier>,
        realtime_endpoint: impl Into<String>,
    ) -> Self {
        let store = Store::new();
        let presence = Arc::new(PresenceManager::new(
            transport,
            store.session_reader(),
            store.clone(),
            realtime_endpoint,
        ));
        let session = Arc::new(SessionController::new(
            backend,
            notifier,
            store.clone(),
            presence.clone(),
        ));
        Self {
            store,
            session,
            presence,
        }
    }

    /// Production wiring: HTTP backend with a cookie jar, Socket.IO transport,
    /// notifications as tracing events.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        let backend = ApiClient::new(config.api_base_url())?;
        let realtime = config.realtime_url()?;
        tracing::debug!(
            api = %backend.base_url(),
            realtime = %realtime,
            mode = ?config.mode,
            "client configured"
        );
        Ok(Self::new(
            Arc::new(backend),
            Arc::new(SocketIoTransport),
            Arc::new(TracingNotifier),
            realtime.as_str(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Mode;

    #[tokio::test]
    async fn from_config_builds_a_logged_out_context() {
        let config = ClientConfig::new(Mode::Production, "https://chat.example.com").unwrap();

        let context = ChatContext::from_config(&config).unwrap();

        assert!(context.store.auth_user().is_none());
        assert!(context.store.flags().is_checking_auth);
        assert!(context.presence.handle().is_none());
    }

    #[tokio::test]
    async fn connect_without_session_is_a_no_op() {
        let config = ClientConfig::new(Mode::Development, "http://localhost:5001").unwrap();
        let context = ChatContext::from_config(&config).unwrap();

        context.presence.connect();

        assert!(context.presence.handle().is_none());
        assert!(!context.presence.is_connected());
    }
}
