//! API error taxonomy and server error-body parsing.

use serde::Deserialize;

/// Error body the auth backend sends with non-2xx responses: `{"message": "..."}`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ServerMessage {
    pub message: String,
}

/// Extract the user-facing `message` from an error body, if it carries one.
pub fn try_server_message(body: &str) -> Option<String> {
    let parsed = serde_json::from_str::<ServerMessage>(body).ok()?;
    if parsed.message.trim().is_empty() {
        return None;
    }
    Some(parsed.message)
}

/// Coarse classification of a failed request, used for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The server answered, but not with a usable success.
    ServerResponse,
    /// The request went out and nothing came back.
    NoResponse,
    /// The request could not be built in the first place.
    RequestSetup,
}

/// API error type for client-side use
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP {status}: {body}")]
    Response { status: u16, body: String },
    #[error("No response: {0}")]
    NoResponse(String),
    #[error("Request error: {0}")]
    Request(String),
    #[error("Deserialization error: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ApiError::Response { .. } | ApiError::Decode(_) => FailureKind::ServerResponse,
            ApiError::NoResponse(_) => FailureKind::NoResponse,
            ApiError::Request(_) => FailureKind::RequestSetup,
        }
    }

    /// HTTP status, when the server responded with an error status.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Response { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Raw error body, when the server responded with an error status.
    pub fn response_body(&self) -> Option<&str> {
        match self {
            ApiError::Response { body, .. } => Some(body),
            _ => None,
        }
    }

    /// The message the server attached to an error response, if any.
    pub fn server_message(&self) -> Option<String> {
        self.response_body().and_then(try_server_message)
    }

    /// Server message, or `fallback` when the server gave none.
    pub fn message_or(&self, fallback: &str) -> String {
        self.server_message()
            .unwrap_or_else(|| fallback.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_message_reads_message_field() {
        let err = ApiError::Response {
            status: 400,
            body: r#"{"message":"Invalid credentials"}"#.into(),
        };
        assert_eq!(err.server_message().as_deref(), Some("Invalid credentials"));
        assert_eq!(err.kind(), FailureKind::ServerResponse);
        assert_eq!(err.status(), Some(400));
    }

    #[test]
    fn only_the_message_field_is_shown() {
        let body = r#"{"type":"about:blank","title":"Unauthorized","status":401,"detail":"token expired"}"#;
        assert_eq!(try_server_message(body), None);
        assert_eq!(try_server_message(r#"{"message":"  "}"#), None);

        let err = ApiError::Response {
            status: 401,
            body: body.into(),
        };
        assert_eq!(err.message_or("Error updating private key"), "Error updating private key");
    }

    #[test]
    fn non_json_body_has_no_server_message() {
        let err = ApiError::Response {
            status: 502,
            body: "<html>bad gateway</html>".into(),
        };
        assert_eq!(err.server_message(), None);
        assert_eq!(err.message_or("Something went wrong"), "Something went wrong");
    }

    #[test]
    fn transport_failures_have_no_server_message() {
        let err = ApiError::NoResponse("connection refused".into());
        assert_eq!(err.kind(), FailureKind::NoResponse);
        assert_eq!(err.status(), None);
        assert_eq!(err.message_or("fallback"), "fallback");

        let err = ApiError::Request("relative URL without a base".into());
        assert_eq!(err.kind(), FailureKind::RequestSetup);
    }
}
