//! Session controller: auth operations over the store.
//!
//! Every operation follows the same shape: raise its in-flight flag, await
//! the backend, commit the outcome to the store, tell the user, and toggle the
//! realtime connection. The flag is lowered by [`FlagGuard`] however the
//! operation exits.

use std::sync::Arc;

use parley_shared::{
    ApiError, AuthUser, FailureKind, LoginRequest, PrivateKeyRequest, SignupRequest,
    UpdateProfileRequest,
};

use crate::api_client::AuthBackend;
use crate::notify::Notifier;
use crate::stores::{FlagGuard, RequestFlag, Store};

/// Something that can bring the realtime connection up or down.
///
/// Both calls are synchronous and idempotent; connecting reads the current
/// session on its own.
pub trait ConnectionSwitch: Send + Sync {
    fn connect(&self);
    fn disconnect(&self);
}

pub struct SessionController {
    backend: Arc<dyn AuthBackend>,
    notifier: Arc<dyn Notifier>,
    store: Store,
    connection: Arc<dyn ConnectionSwitch>,
}

impl SessionController {
    pub fn new(
        backend: Arc<dyn AuthBackend>,
        notifier: Arc<dyn Notifier>,
        store: Store,
        connection: Arc<dyn ConnectionSwitch>,
    ) -> Self {
        Self {
            backend,
            notifier,
            store,
            connection,
        }
    }

    /// Restore a session from the backend's cookie, if any.
    ///
    /// Failure of any kind means "not logged in" and is not shown to the user.
    pub async fn check_auth(&self) {
        let _guard = FlagGuard::raise(&self.store, RequestFlag::CheckingAuth);
        match self.backend.check().await {
            Ok(user) => {
                tracing::debug!(user_id = %user.id, "session restored");
                self.store.set_auth_user(Some(user));
                self.connection.connect();
            }
            Err(e) => {
                tracing::debug!(error = %e, "no active session");
                self.store.set_auth_user(None);
            }
        }
    }

    pub async fn signup(&self, request: &SignupRequest) {
        let _guard = FlagGuard::raise(&self.store, RequestFlag::SigningUp);
        match self.backend.signup(request).await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, "account created");
                self.store.set_auth_user(Some(user));
                self.notifier.success("Account created successfully");
                self.connection.connect();
            }
            Err(e) => {
                tracing::warn!(error = %e, "signup failed");
                self.notifier.error(&e.message_or(&e.to_string()));
            }
        }
    }

    pub async fn login(&self, request: &LoginRequest) {
        let _guard = FlagGuard::raise(&self.store, RequestFlag::LoggingIn);
        match self.backend.login(request).await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, "logged in");
                self.store.set_auth_user(Some(user));
                self.notifier.success("Logged in successfully");
                self.connection.connect();
            }
            Err(e) => {
                tracing::warn!(error = %e, "login failed");
                self.notifier.error(&e.message_or(&e.to_string()));
            }
        }
    }

    /// End the session. The realtime connection is dropped whether or not
    /// the backend accepted the logout.
    pub async fn logout(&self) {
        match self.backend.logout().await {
            Ok(()) => {
                tracing::info!("logged out");
                self.store.set_auth_user(None);
                self.notifier.success("Logged out successfully");
            }
            Err(e) => {
                tracing::warn!(error = %e, "logout failed");
                self.notifier.error(&e.message_or(&e.to_string()));
            }
        }
        self.connection.disconnect();
    }

    /// Partial profile update. Errors are logged and handed back to the
    /// caller without notifying the user.
    pub async fn update_profile(
        &self,
        request: &UpdateProfileRequest,
    ) -> Result<AuthUser, ApiError> {
        let _guard = FlagGuard::raise(&self.store, RequestFlag::UpdatingProfile);
        match self.backend.update_profile(request).await {
            Ok(user) => {
                self.store.set_auth_user(Some(user.clone()));
                Ok(user)
            }
            Err(e) => {
                log_profile_failure(&e);
                Err(e)
            }
        }
    }

    pub async fn update_private_key(
        &self,
        private_key: impl Into<String>,
    ) -> Result<AuthUser, ApiError> {
        let request = PrivateKeyRequest {
            private_key: private_key.into(),
        };
        match self.backend.update_private_key(&request).await {
            Ok(user) => {
                self.store.set_auth_user(Some(user.clone()));
                self.notifier.success("Private key updated successfully");
                Ok(user)
            }
            Err(e) => {
                tracing::warn!(error = %e, "private key update failed");
                self.notifier.error(&e.message_or("Error updating private key"));
                Err(e)
            }
        }
    }

    pub async fn generate_new_private_key(&self) -> Result<AuthUser, ApiError> {
        match self.backend.generate_private_key().await {
            Ok(user) => {
                self.store.set_auth_user(Some(user.clone()));
                self.notifier.success("New private key generated successfully");
                Ok(user)
            }
            Err(e) => {
                tracing::warn!(error = %e, "private key generation failed");
                self.notifier.error(&e.message_or("Error generating new private key"));
                Err(e)
            }
        }
    }
}

fn log_profile_failure(e: &ApiError) {
    match e.kind() {
        FailureKind::ServerResponse => tracing::error!(
            status = ?e.status(),
            body = e.response_body().unwrap_or_default(),
            error = %e,
            "profile update rejected by server"
        ),
        FailureKind::NoResponse => {
            tracing::error!(error = %e, "no response to profile update")
        }
        FailureKind::RequestSetup => {
            tracing::error!(error = %e, "could not build profile update request")
        }
    }
}
