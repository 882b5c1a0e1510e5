//! Error types for the CWP panel client.
//!
//! Remote-reported failures, transport failures, and undecodable responses
//! are kept distinct so callers can tell "the panel said no" apart from
//! "the panel was never reached".

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PanelError {
    /// The endpoint configuration is unusable. Raised at construction time,
    /// before any network call.
    #[error("Panel configuration error: {0}")]
    Config(String),

    /// The requested mutation is not offered by the CWP API. Raised without
    /// any network attempt.
    #[error("CWP does not support {0}")]
    Unsupported(&'static str),

    /// The panel answered and reported an error status.
    #[error("Panel reported an error: {message}")]
    Remote { message: String },

    /// The panel could not be reached, or the connection failed mid-request.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The panel answered with a body that is not the expected JSON shape.
    #[error("Failed to decode panel response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl PanelError {
    /// Shorthand for a remote-reported error.
    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote {
            message: message.into(),
        }
    }

    /// True when the panel itself reported the failure (as opposed to a
    /// transport or decoding problem on our side).
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }
}

pub type PanelResult<T> = Result<T, PanelError>;
