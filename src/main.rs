//! Parley - headless chat session client
//!
//! Restores or opens a session against the configured backend, keeps the
//! presence connection up, and logs who is online until Ctrl-C.

use anyhow::Context;
use parley_client::{ChatContext, ClientConfig};
use parley_shared::LoginRequest;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "parley=debug,parley_client=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ClientConfig::from_env().context("reading client configuration")?;
    let context = ChatContext::from_config(&config).context("building client")?;

    context.session.check_auth().await;

    if context.store.auth_user().is_none() {
        match (std::env::var("PARLEY_EMAIL"), std::env::var("PARLEY_PASSWORD")) {
            (Ok(email), Ok(password)) => {
                context
                    .session
                    .login(&LoginRequest { email, password })
                    .await;
            }
            _ => tracing::info!("no session and no PARLEY_EMAIL/PARLEY_PASSWORD, nothing to do"),
        }
    }

    let Some(user) = context.store.auth_user() else {
        return Ok(());
    };
    tracing::info!(user_id = %user.id, "session active, press Ctrl-C to log out");

    let mut changes = context.store.subscribe();
    let mut last_seen = Vec::new();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = changes.borrow_and_update().clone();
                if state.online_users != last_seen {
                    tracing::info!(online = ?state.online_users, "online users");
                    last_seen = state.online_users;
                }
            }
        }
    }

    context.session.logout().await;
    Ok(())
}
