//! Client configuration from environment variables.

use url::Url;

use crate::error::ConfigError;

/// Fixed backend address used while developing locally.
pub const DEVELOPMENT_ORIGIN: &str = "http://localhost:5001";

/// Realtime base outside development: the root of the serving origin.
pub const SAME_ORIGIN_ROOT: &str = "/";

const DEFAULT_API_PATH: &str = "/api";

/// Build/runtime mode, selecting where the backend lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Development,
    Production,
}

impl Mode {
    /// Anything other than `development` (case-insensitive) is production.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("development") {
            Mode::Development
        } else {
            Mode::Production
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub mode: Mode,
    /// Origin the client is served from; used whenever the mode doesn't pin one.
    pub origin: String,
    /// Path prefix of the REST API under the origin.
    pub api_path: String,
}

impl ClientConfig {
    pub fn new(mode: Mode, origin: impl Into<String>) -> Result<Self, ConfigError> {
        let origin = origin.into();
        Url::parse(&origin).map_err(|e| ConfigError::InvalidOrigin {
            origin: origin.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            mode,
            origin,
            api_path: DEFAULT_API_PATH.to_string(),
        })
    }

    pub fn with_api_path(mut self, api_path: impl Into<String>) -> Self {
        self.api_path = api_path.into();
        self
    }

    /// Parse client configuration from environment variables.
    ///
    /// Environment variables:
    /// - `PARLEY_MODE`: "development" | anything else (default: "production")
    /// - `PARLEY_ORIGIN`: Origin used outside development (default: "http://localhost:5001")
    /// - `PARLEY_API_PATH`: REST prefix under the origin (default: "/api")
    pub fn from_env() -> Result<Self, ConfigError> {
        let mode = std::env::var("PARLEY_MODE")
            .map(|m| Mode::parse(&m))
            .unwrap_or(Mode::Production);
        let origin =
            std::env::var("PARLEY_ORIGIN").unwrap_or_else(|_| DEVELOPMENT_ORIGIN.to_string());
        let config = Self::new(mode, origin)?;

        Ok(match std::env::var("PARLEY_API_PATH") {
            Ok(path) => config.with_api_path(path),
            Err(_) => config,
        })
    }

    fn effective_origin(&self) -> &str {
        match self.mode {
            Mode::Development => DEVELOPMENT_ORIGIN,
            Mode::Production => &self.origin,
        }
    }

    /// Base URL for REST calls.
    pub fn api_base_url(&self) -> String {
        let base = self.effective_origin().trim_end_matches('/');
        let path = self.api_path.trim_matches('/');
        if path.is_empty() {
            base.to_string()
        } else {
            format!("{base}/{path}")
        }
    }

    /// Realtime endpoint base as selected by mode, before resolution.
    pub fn realtime_base(&self) -> &'static str {
        match self.mode {
            Mode::Development => DEVELOPMENT_ORIGIN,
            Mode::Production => SAME_ORIGIN_ROOT,
        }
    }

    /// Realtime endpoint resolved to an absolute URL.
    pub fn realtime_url(&self) -> Result<Url, ConfigError> {
        let origin = self.effective_origin();
        Url::parse(origin)
            .and_then(|base| base.join(self.realtime_base()))
            .map_err(|e| ConfigError::InvalidOrigin {
                origin: origin.to_string(),
                reason: e.to_string(),
            })
    }
}
