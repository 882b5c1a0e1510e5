//! Transport seam between the client and the wire.
//!
//! Operations go through the [`PanelTransport`] trait so tests can swap the
//! HTTP layer for a mock. The production implementation posts form-encoded
//! bodies over verified TLS; certificate checking is not optional.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::config::ServerConfig;
use crate::error::{PanelError, PanelResult};
use crate::response::ApiResponse;

/// One form-encoded request field.
pub type Field = (String, String);

#[cfg_attr(test, automock)]
#[async_trait]
pub trait PanelTransport: Send + Sync {
    /// POST the fields to `{base}/{endpoint}` and decode the JSON envelope.
    async fn send(&self, endpoint: &str, fields: &[Field]) -> PanelResult<ApiResponse>;
}

/// reqwest-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(config: &ServerConfig) -> PanelResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("hostctl/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout())
            .build()
            .map_err(|e| PanelError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.api_base_url(),
        })
    }

    /// Point the transport at an explicit base URL (tests against a local
    /// mock endpoint).
    pub fn with_base_url(base_url: impl Into<String>) -> PanelResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("hostctl/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PanelError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl PanelTransport for HttpTransport {
    async fn send(&self, endpoint: &str, fields: &[Field]) -> PanelResult<ApiResponse> {
        let url = format!("{}/{}", self.base_url, endpoint);
        tracing::debug!(%url, "POST");

        let response = self.client.post(&url).form(fields).send().await?;
        let body = response.text().await?;
        let decoded: ApiResponse = serde_json::from_str(&body)?;
        Ok(decoded)
    }
}
