//! Response envelope and interpretation rules for the CWP API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{PanelError, PanelResult};

/// The JSON envelope every CWP endpoint answers with.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: Option<String>,
    pub result: Option<Value>,
}

/// Outcome of an operation that nominally returns a success flag.
///
/// CWP occasionally answers with a status other than `OK`/`Error`; in that
/// case the raw result payload is passed through unchanged rather than
/// guessed at.
#[derive(Debug, Clone, PartialEq)]
pub enum OpOutcome {
    Ok,
    Raw(Value),
}

impl ApiResponse {
    /// Interpret the envelope for a boolean-style operation.
    ///
    /// `status == "OK"` is success. `status == "Error"` and a missing status
    /// both surface as [`PanelError::Remote`] — a missing status means the
    /// panel answered out of protocol, which callers must not mistake for
    /// success.
    pub fn into_outcome(self) -> PanelResult<OpOutcome> {
        match self.status.as_deref() {
            Some("OK") => Ok(OpOutcome::Ok),
            Some("Error") => Err(PanelError::remote(remote_message(self.result))),
            Some(_) => Ok(OpOutcome::Raw(self.result.unwrap_or(Value::Null))),
            None => Err(PanelError::remote("response carried no status field")),
        }
    }

    /// Interpret the envelope for the detail-fetch operation: any non-error
    /// status yields the nested result payload verbatim.
    pub fn into_result_payload(self) -> PanelResult<Value> {
        match self.status.as_deref() {
            Some("Error") => Err(PanelError::remote(remote_message(self.result))),
            None => Err(PanelError::remote("response carried no status field")),
            Some(_) => self
                .result
                .ok_or_else(|| PanelError::remote("response carried no result payload")),
        }
    }
}

/// Pull a human-readable message out of an error response's result payload.
/// The panel is inconsistent here: sometimes a bare string, sometimes an
/// object with a msg field, sometimes nothing at all.
fn remote_message(result: Option<Value>) -> String {
    match result {
        Some(Value::String(msg)) => msg,
        Some(Value::Object(map)) => map
            .get("msg")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| Value::Object(map).to_string()),
        Some(other) => other.to_string(),
        None => "no details reported".to_string(),
    }
}
