//! Socket.IO client over tokio-tungstenite.
//!
//! Speaks the WebSocket-only Engine.IO v4 transport: the server opens with a
//! handshake, the client joins the default namespace, pings are answered with
//! pongs, and event packets are dispatched to the registered handlers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use futures_channel::oneshot;
use futures_util::{SinkExt, StreamExt};
use parley_shared::{
    EnginePacket, SocketPacket, DEFAULT_NAMESPACE, ENGINE_IO_VERSION, EVENT_CONNECT,
    EVENT_CONNECT_ERROR, EVENT_DISCONNECT,
};
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use url::Url;

use super::{lock, ConnectQuery, Connection, EventHandler, HandlerRegistry, Transport};
use crate::error::TransportError;

/// Opens [`SocketIoConnection`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct SocketIoTransport;

impl Transport for SocketIoTransport {
    fn open(
        &self,
        endpoint: &str,
        query: &ConnectQuery,
    ) -> Result<Arc<dyn Connection>, TransportError> {
        let url = socketio_url(endpoint, query)?;
        let connection: Arc<dyn Connection> = Arc::new(SocketIoConnection::new(url));
        Ok(connection)
    }
}

/// Build the WebSocket handshake URL for a realtime endpoint base, e.g.
/// `http://localhost:5001` → `ws://localhost:5001/socket.io/?EIO=4&transport=websocket&userId=..`
pub fn socketio_url(endpoint: &str, query: &ConnectQuery) -> Result<Url, TransportError> {
    let invalid = |reason: String| TransportError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason,
    };

    let mut url = Url::parse(endpoint).map_err(|e| invalid(e.to_string()))?;
    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => return Err(invalid(format!("unsupported scheme {other}"))),
    };
    url.set_scheme(scheme)
        .map_err(|()| invalid(format!("cannot switch scheme to {scheme}")))?;

    let path = format!("{}/socket.io/", url.path().trim_end_matches('/'));
    url.set_path(&path);
    url.query_pairs_mut()
        .clear()
        .append_pair("EIO", ENGINE_IO_VERSION)
        .append_pair("transport", "websocket")
        .append_pair("userId", &query.user_id);
    Ok(url)
}

struct Shared {
    connected: AtomicBool,
    handlers: HandlerRegistry,
}

/// A Socket.IO connection to the default namespace of one endpoint.
///
/// The socket lives in a background task; dropping the handle closes it.
pub struct SocketIoConnection {
    url: Url,
    shared: Arc<Shared>,
    task: Mutex<Option<JoinHandle<()>>>,
    close: Mutex<Option<oneshot::Sender<()>>>,
}

impl SocketIoConnection {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            shared: Arc::new(Shared {
                connected: AtomicBool::new(false),
                handlers: HandlerRegistry::default(),
            }),
            task: Mutex::new(None),
            close: Mutex::new(None),
        }
    }
}

impl Connection for SocketIoConnection {
    fn connected(&self) -> bool {
        self.shared.connected.load(Ordering::SeqCst)
    }

    fn connect(&self) {
        let mut task = lock(&self.task);
        if task.as_ref().is_some_and(|t| !t.is_finished()) {
            return;
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::error!(url = %self.url, "no tokio runtime, cannot open realtime connection");
            return;
        };

        let (tx, rx) = oneshot::channel();
        *lock(&self.close) = Some(tx);
        *task = Some(runtime.spawn(run(self.url.clone(), Arc::clone(&self.shared), rx)));
    }

    fn disconnect(&self) {
        let was_connected = self.shared.connected.swap(false, Ordering::SeqCst);

        if let Some(tx) = lock(&self.close).take() {
            let _ = tx.send(());
        }

        if was_connected {
            self.shared
                .handlers
                .emit(EVENT_DISCONNECT, &Value::String("io client disconnect".into()));
        } else if let Some(task) = lock(&self.task).take() {
            // Still handshaking: nothing to close gracefully.
            task.abort();
        }
    }

    fn on(&self, event: &str, handler: EventHandler) {
        self.shared.handlers.add(event, handler);
    }
}

enum Step {
    Continue,
    Reply(String),
    Stop,
}

async fn run(url: Url, shared: Arc<Shared>, mut close: oneshot::Receiver<()>) {
    let ws_stream = match connect_async(url.as_str()).await {
        Ok((ws_stream, _response)) => ws_stream,
        Err(e) => {
            tracing::warn!(url = %url, error = %e, "realtime connection failed");
            shared
                .handlers
                .emit(EVENT_CONNECT_ERROR, &Value::String(e.to_string()));
            return;
        }
    };
    tracing::debug!(url = %url, "realtime socket open");

    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            incoming = read.next() => {
                let text = match incoming {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::debug!(url = %url, "realtime socket closed by peer");
                        break;
                    }
                    // Pong is handled automatically by tungstenite
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        tracing::warn!(url = %url, error = %e, "realtime read error");
                        break;
                    }
                };

                match handle_frame(text.as_str(), &shared) {
                    Step::Continue => {}
                    Step::Reply(frame) => {
                        if let Err(e) = write.send(Message::Text(frame.into())).await {
                            tracing::warn!(url = %url, error = %e, "realtime send failed");
                            break;
                        }
                    }
                    Step::Stop => break,
                }
            }
            // Explicit close, or the handle was dropped
            _ = &mut close => {
                let _ = write
                    .send(Message::Text(SocketPacket::disconnect().to_frame().into()))
                    .await;
                let _ = write.close().await;
                break;
            }
        }
    }

    if shared.connected.swap(false, Ordering::SeqCst) {
        shared
            .handlers
            .emit(EVENT_DISCONNECT, &Value::String("transport close".into()));
    }
}

fn handle_frame(frame: &str, shared: &Shared) -> Step {
    let packet = match EnginePacket::decode(frame) {
        Ok(packet) => packet,
        Err(e) => {
            tracing::warn!(error = %e, "dropping undecodable frame");
            return Step::Continue;
        }
    };

    match packet {
        EnginePacket::Open(open) => {
            tracing::debug!(sid = %open.sid, ping_interval = open.ping_interval, "engine handshake");
            Step::Reply(SocketPacket::connect().to_frame())
        }
        EnginePacket::Ping(data) => Step::Reply(EnginePacket::Pong(data).encode()),
        EnginePacket::Close => Step::Stop,
        EnginePacket::Message(payload) => handle_packet(&payload, shared),
        EnginePacket::Pong(_) | EnginePacket::Upgrade | EnginePacket::Noop => Step::Continue,
    }
}

fn handle_packet(payload: &str, shared: &Shared) -> Step {
    let packet = match SocketPacket::decode(payload) {
        Ok(packet) => packet,
        Err(e) => {
            tracing::warn!(error = %e, "dropping undecodable packet");
            return Step::Continue;
        }
    };

    match packet {
        SocketPacket::Connect { namespace, data } if namespace == DEFAULT_NAMESPACE => {
            shared.connected.store(true, Ordering::SeqCst);
            shared
                .handlers
                .emit(EVENT_CONNECT, &data.unwrap_or(Value::Null));
            Step::Continue
        }
        SocketPacket::Event {
            namespace,
            name,
            args,
            ..
        } if namespace == DEFAULT_NAMESPACE => {
            let payload = args.into_iter().next().unwrap_or(Value::Null);
            tracing::debug!(event = %name, "realtime event");
            shared.handlers.emit(&name, &payload);
            Step::Continue
        }
        SocketPacket::Disconnect { namespace } if namespace == DEFAULT_NAMESPACE => {
            tracing::debug!("server closed the namespace");
            Step::Stop
        }
        SocketPacket::ConnectError { data, .. } => {
            let data = data.unwrap_or(Value::Null);
            tracing::warn!(%data, "realtime connection refused");
            shared.handlers.emit(EVENT_CONNECT_ERROR, &data);
            Step::Stop
        }
        other => {
            tracing::debug!(?other, "ignoring packet");
            Step::Continue
        }
    }
}
