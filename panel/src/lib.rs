//! Provisioning client for Control Web Panel (CWP) servers.
//!
//! Maps account lifecycle operations onto the panel's REST API: each
//! operation is a single form-encoded POST over verified TLS, answered by a
//! JSON `{status, result}` envelope.

pub mod account;
pub mod client;
pub mod config;
pub mod error;
pub mod response;
pub mod transport;

pub use account::{Account, AccountDetail};
pub use client::PanelClient;
pub use config::ServerConfig;
pub use error::{PanelError, PanelResult};
pub use response::{ApiResponse, OpOutcome};
pub use transport::{HttpTransport, PanelTransport};
