//! HTTP client for the chat backend's auth and user endpoints.

use async_trait::async_trait;
use parley_shared::{
    ApiError, AuthUser, LoginRequest, PrivateKeyRequest, SignupRequest, UpdateProfileRequest,
};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// The auth-related calls the session controller depends on.
///
/// Every call is a single round trip: it yields the user record on success or an
/// [`ApiError`] describing how it failed.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// `GET /auth/check`
    async fn check(&self) -> Result<AuthUser, ApiError>;
    /// `POST /auth/signup`
    async fn signup(&self, request: &SignupRequest) -> Result<AuthUser, ApiError>;
    /// `POST /auth/login`
    async fn login(&self, request: &LoginRequest) -> Result<AuthUser, ApiError>;
    /// `POST /auth/logout`
    async fn logout(&self) -> Result<(), ApiError>;
    /// `PUT /auth/update-profile`
    async fn update_profile(&self, request: &UpdateProfileRequest) -> Result<AuthUser, ApiError>;
    /// `PUT /users/private-key`
    async fn update_private_key(&self, request: &PrivateKeyRequest) -> Result<AuthUser, ApiError>;
    /// `POST /users/generate-private-key`
    async fn generate_private_key(&self) -> Result<AuthUser, ApiError>;
}

/// HTTP client for the auth API. Keeps an in-memory cookie jar so the
/// session cookie set by login authenticates every later call.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|e| ApiError::Request(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }

    /// Make a GET request
    pub async fn get_json<TRes: DeserializeOwned>(&self, path: &str) -> Result<TRes, ApiError> {
        let rb = self.client.get(self.url(path));
        let text = send(rb).await?;
        decode(&text)
    }

    /// Make a POST request with a JSON body
    pub async fn post_json<TReq: Serialize, TRes: DeserializeOwned>(
        &self,
        path: &str,
        body: &TReq,
    ) -> Result<TRes, ApiError> {
        let rb = with_json(self.client.post(self.url(path)), body)?;
        let text = send(rb).await?;
        decode(&text)
    }

    /// Make a POST request without a body
    pub async fn post_empty<TRes: DeserializeOwned>(&self, path: &str) -> Result<TRes, ApiError> {
        let rb = self.client.post(self.url(path));
        let text = send(rb).await?;
        decode(&text)
    }

    /// Make a PUT request with a JSON body
    pub async fn put_json<TReq: Serialize, TRes: DeserializeOwned>(
        &self,
        path: &str,
        body: &TReq,
    ) -> Result<TRes, ApiError> {
        let rb = with_json(self.client.put(self.url(path)), body)?;
        let text = send(rb).await?;
        decode(&text)
    }
}

fn with_json<TReq: Serialize>(rb: RequestBuilder, body: &TReq) -> Result<RequestBuilder, ApiError> {
    let body_bytes = serde_json::to_vec(body).map_err(|e| ApiError::Request(e.to_string()))?;
    Ok(rb
        .body(body_bytes)
        .header("Content-Type", "application/json"))
}

/// Send the request and return the body of a 2xx response.
async fn send(rb: RequestBuilder) -> Result<String, ApiError> {
    let resp = rb.send().await.map_err(classify)?;

    let status = resp.status().as_u16();
    let is_success = resp.status().is_success();

    let text = resp
        .text()
        .await
        .map_err(|e| ApiError::NoResponse(format!("failed to read body: {e}")))?;

    if !is_success {
        tracing::debug!(status, "request rejected");
        return Err(ApiError::Response { status, body: text });
    }

    Ok(text)
}

fn decode<TRes: DeserializeOwned>(text: &str) -> Result<TRes, ApiError> {
    if text.is_empty() {
        serde_json::from_str("null").map_err(|e| ApiError::Decode(e.to_string()))
    } else {
        serde_json::from_str(text).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

/// Requests that never made it onto the wire are setup errors; anything else
/// that fails before a status line arrives counts as no response.
fn classify(err: reqwest::Error) -> ApiError {
    if err.is_builder() {
        ApiError::Request(err.to_string())
    } else {
        ApiError::NoResponse(err.to_string())
    }
}

#[async_trait]
impl AuthBackend for ApiClient {
    async fn check(&self) -> Result<AuthUser, ApiError> {
        self.get_json("/auth/check").await
    }

    async fn signup(&self, request: &SignupRequest) -> Result<AuthUser, ApiError> {
        self.post_json("/auth/signup", request).await
    }

    async fn login(&self, request: &LoginRequest) -> Result<AuthUser, ApiError> {
        self.post_json("/auth/login", request).await
    }

    async fn logout(&self) -> Result<(), ApiError> {
        // Any 2xx ends the session; the body is not part of the contract.
        send(self.client.post(self.url("/auth/logout"))).await?;
        Ok(())
    }

    async fn update_profile(&self, request: &UpdateProfileRequest) -> Result<AuthUser, ApiError> {
        self.put_json("/auth/update-profile", request).await
    }

    async fn update_private_key(&self, request: &PrivateKeyRequest) -> Result<AuthUser, ApiError> {
        self.put_json("/users/private-key", request).await
    }

    async fn generate_private_key(&self) -> Result<AuthUser, ApiError> {
        self.post_empty("/users/generate-private-key").await
    }
}
