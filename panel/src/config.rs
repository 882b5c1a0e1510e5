use std::env;
use std::time::Duration;

use crate::error::{PanelError, PanelResult};

/// Default CWP API port. The docs list no alternative, but it can be
/// overridden for non-standard installs.
pub const DEFAULT_API_PORT: u16 = 2304;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Endpoint configuration for a CWP server.
///
/// Validated at construction: the API only accepts TLS connections, so a
/// config with `secure == false` is rejected outright rather than producing
/// a client that fails on every call.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    host: String,
    port: u16,
    access_hash: String,
    secure: bool,
    timeout: Duration,
}

impl ServerConfig {
    /// Build a config with default port, timeout, and TLS enabled.
    pub fn new(host: impl Into<String>, access_hash: impl Into<String>) -> PanelResult<Self> {
        Self::with_options(host, access_hash, DEFAULT_API_PORT, true, DEFAULT_TIMEOUT)
    }

    /// Build a config with every knob explicit.
    pub fn with_options(
        host: impl Into<String>,
        access_hash: impl Into<String>,
        port: u16,
        secure: bool,
        timeout: Duration,
    ) -> PanelResult<Self> {
        let host = host.into();
        // API keys are pasted from the panel UI and tend to pick up stray
        // line breaks on the way.
        let access_hash: String = access_hash
            .into()
            .chars()
            .filter(|c| *c != '\r' && *c != '\n')
            .collect();

        if host.is_empty() {
            return Err(PanelError::Config("hostname is not set".into()));
        }
        if access_hash.is_empty() {
            return Err(PanelError::Config("API key / access hash is not set".into()));
        }
        if !secure {
            return Err(PanelError::Config(
                "the CWP API only accepts secure connections".into(),
            ));
        }

        Ok(Self {
            host,
            port,
            access_hash,
            secure,
            timeout,
        })
    }

    /// Load configuration from `CWP_*` environment variables.
    pub fn from_env() -> PanelResult<Self> {
        let host = env::var("CWP_HOST").unwrap_or_default();
        let access_hash = env::var("CWP_ACCESS_HASH").unwrap_or_default();
        let port = env::var("CWP_PORT")
            .unwrap_or_else(|_| DEFAULT_API_PORT.to_string())
            .parse()
            .unwrap_or(DEFAULT_API_PORT);
        let secure = env::var("CWP_SECURE")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .unwrap_or(true);
        let timeout = env::var("CWP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT);

        Self::with_options(host, access_hash, port, secure, timeout)
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn access_hash(&self) -> &str {
        &self.access_hash
    }

    pub fn secure(&self) -> bool {
        self.secure
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Base URL of the versioned API.
    pub fn api_base_url(&self) -> String {
        format!("https://{}:{}/v1", self.host, self.port)
    }

    /// End-user panel login URL.
    pub fn login_url(&self) -> String {
        format!("https://{}:2083", self.host)
    }

    /// Reseller panel login URL.
    pub fn reseller_login_url(&self) -> String {
        format!("https://{}:2031", self.host)
    }
}
