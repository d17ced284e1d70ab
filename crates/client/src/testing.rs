//! In-memory doubles for the backend, the realtime transport and the notifier.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use parley_shared::{
    ApiError, AuthUser, LoginRequest, PrivateKeyRequest, SignupRequest, UpdateProfileRequest,
    EVENT_CONNECT, EVENT_DISCONNECT,
};
use serde_json::Value;
use tokio::sync::oneshot;

use crate::api_client::AuthBackend;
use crate::context::ChatContext;
use crate::error::TransportError;
use crate::notify::Notifier;
use crate::ws::{ConnectQuery, Connection, HandlerRegistry, Transport};

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap()
}

// --- Backend ---

/// Replies to calls in order from a script. Logout treats any `Ok` as success.
#[derive(Default)]
pub(crate) struct FakeBackend {
    replies: Mutex<VecDeque<Result<AuthUser, ApiError>>>,
    calls: Mutex<Vec<String>>,
    gate: Mutex<Option<oneshot::Receiver<()>>>,
}

impl FakeBackend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reply(self, reply: Result<AuthUser, ApiError>) -> Self {
        lock(&self.replies).push_back(reply);
        self
    }

    /// Hold the next call until `gate` fires (or its sender is dropped).
    pub(crate) fn gated(self, gate: oneshot::Receiver<()>) -> Self {
        *lock(&self.gate) = Some(gate);
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    async fn next(&self, call: String) -> Result<AuthUser, ApiError> {
        lock(&self.calls).push(call);
        let gate = lock(&self.gate).take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        let reply = lock(&self.replies).pop_front();
        reply.unwrap_or_else(|| Err(ApiError::NoResponse("no scripted reply".into())))
    }
}

#[async_trait]
impl AuthBackend for FakeBackend {
    async fn check(&self) -> Result<AuthUser, ApiError> {
        self.next("check".into()).await
    }

    async fn signup(&self, request: &SignupRequest) -> Result<AuthUser, ApiError> {
        self.next(format!("signup:{}", request.email)).await
    }

    async fn login(&self, request: &LoginRequest) -> Result<AuthUser, ApiError> {
        self.next(format!("login:{}", request.email)).await
    }

    async fn logout(&self) -> Result<(), ApiError> {
        self.next("logout".into()).await.map(|_| ())
    }

    async fn update_profile(&self, _request: &UpdateProfileRequest) -> Result<AuthUser, ApiError> {
        self.next("update_profile".into()).await
    }

    async fn update_private_key(&self, request: &PrivateKeyRequest) -> Result<AuthUser, ApiError> {
        self.next(format!("update_private_key:{}", request.private_key))
            .await
    }

    async fn generate_private_key(&self) -> Result<AuthUser, ApiError> {
        self.next("generate_private_key".into()).await
    }
}

// --- Transport ---

/// Hands out [`FakeConnection`]s and keeps every one it opened.
pub(crate) struct FakeTransport {
    auto_connect: bool,
    opened: Mutex<Vec<Arc<FakeConnection>>>,
}

impl FakeTransport {
    /// Connections report `connected` as soon as `connect()` is called.
    pub(crate) fn new() -> Self {
        Self {
            auto_connect: true,
            opened: Mutex::new(Vec::new()),
        }
    }

    /// Connections stay pending until [`FakeConnection::finish_connect`].
    pub(crate) fn pending() -> Self {
        Self {
            auto_connect: false,
            ..Self::new()
        }
    }

    pub(crate) fn opened(&self) -> Vec<Arc<FakeConnection>> {
        lock(&self.opened).clone()
    }

    pub(crate) fn last(&self) -> Option<Arc<FakeConnection>> {
        lock(&self.opened).last().cloned()
    }
}

impl Transport for FakeTransport {
    fn open(
        &self,
        endpoint: &str,
        query: &ConnectQuery,
    ) -> Result<Arc<dyn Connection>, TransportError> {
        let connection = Arc::new(FakeConnection {
            endpoint: endpoint.to_string(),
            query: query.clone(),
            auto_connect: self.auto_connect,
            connected: AtomicBool::new(false),
            shut_down: AtomicBool::new(false),
            connect_calls: AtomicUsize::new(0),
            disconnect_calls: AtomicUsize::new(0),
            handlers: HandlerRegistry::default(),
        });
        lock(&self.opened).push(Arc::clone(&connection));
        let connection: Arc<dyn Connection> = connection;
        Ok(connection)
    }
}

pub(crate) struct FakeConnection {
    pub(crate) endpoint: String,
    pub(crate) query: ConnectQuery,
    auto_connect: bool,
    connected: AtomicBool,
    shut_down: AtomicBool,
    connect_calls: AtomicUsize,
    disconnect_calls: AtomicUsize,
    handlers: HandlerRegistry,
}

impl FakeConnection {
    /// Deliver a server event to the registered handlers.
    pub(crate) fn emit(&self, event: &str, payload: &Value) -> usize {
        self.handlers.emit(event, payload)
    }

    pub(crate) fn subscriptions(&self, event: &str) -> usize {
        self.handlers.count(event)
    }

    pub(crate) fn connect_calls(&self) -> usize {
        self.connect_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn disconnect_calls(&self) -> usize {
        self.disconnect_calls.load(Ordering::SeqCst)
    }

    /// Complete the handshake of a pending connection. A connection that was
    /// disconnected first stays down, like an aborted handshake task.
    pub(crate) fn finish_connect(&self) {
        if self.shut_down.load(Ordering::SeqCst) {
            return;
        }
        if !self.connected.swap(true, Ordering::SeqCst) {
            self.handlers.emit(EVENT_CONNECT, &Value::Null);
        }
    }

    /// Simulate the server closing the connection.
    pub(crate) fn drop_connection(&self) {
        if self.connected.swap(false, Ordering::SeqCst) {
            self.handlers
                .emit(EVENT_DISCONNECT, &Value::String("transport close".into()));
        }
    }
}

impl Connection for FakeConnection {
    fn connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn connect(&self) {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        if self.auto_connect {
            self.finish_connect();
        }
    }

    fn disconnect(&self) {
        self.disconnect_calls.fetch_add(1, Ordering::SeqCst);
        self.shut_down.store(true, Ordering::SeqCst);
        if self.connected.swap(false, Ordering::SeqCst) {
            self.handlers
                .emit(EVENT_DISCONNECT, &Value::String("io client disconnect".into()));
        }
    }

    fn on(&self, event: &str, handler: crate::ws::EventHandler) {
        self.handlers.add(event, handler);
    }
}

// --- Notifier ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Notice {
    Success(String),
    Error(String),
}

#[derive(Default)]
pub(crate) struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub(crate) fn notices(&self) -> Vec<Notice> {
        lock(&self.notices).clone()
    }
}

impl Notifier for RecordingNotifier {
    fn success(&self, message: &str) {
        lock(&self.notices).push(Notice::Success(message.to_string()));
    }

    fn error(&self, message: &str) {
        lock(&self.notices).push(Notice::Error(message.to_string()));
    }
}

// --- Wiring ---

pub(crate) struct Harness {
    pub(crate) backend: Arc<FakeBackend>,
    pub(crate) transport: Arc<FakeTransport>,
    pub(crate) notifier: Arc<RecordingNotifier>,
    pub(crate) context: ChatContext,
}

/// A full context over fakes, with the realtime endpoint at the dev origin.
pub(crate) fn harness(backend: FakeBackend) -> Harness {
    harness_with(backend, FakeTransport::new())
}

pub(crate) fn harness_with(backend: FakeBackend, transport: FakeTransport) -> Harness {
    let backend = Arc::new(backend);
    let transport = Arc::new(transport);
    let notifier = Arc::new(RecordingNotifier::default());
    let context = ChatContext::new(
        backend.clone(),
        transport.clone(),
        notifier.clone(),
        "http://localhost:5001",
    );
    Harness {
        backend,
        transport,
        notifier,
        context,
    }
}
