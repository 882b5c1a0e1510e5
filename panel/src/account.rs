use serde::{Deserialize, Serialize};

use crate::error::PanelResult;

/// A hosting account as the billing side sees it.
///
/// Constructed by the caller and passed into each operation; only
/// `synchronize_account` hands back an updated copy reflecting remote state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Account {
    pub username: String,
    pub password: String,
    pub domain: String,
    pub email: String,
    /// Hosting package (plan) name as configured on the panel.
    pub package: String,
    /// Shared IP the account's sites are served from.
    pub server_ip: String,
    /// Reseller accounts get sub-provisioning privileges on the panel.
    pub reseller: bool,
    pub suspended: bool,
}

impl Account {
    /// An account carrying only a username, for operations that key on the
    /// user alone (suspend, unsuspend, sync).
    pub fn named(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            ..Self::default()
        }
    }
}

/// Remote account state as reported by the `accountdetail` endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountDetail {
    pub suspended: bool,
    /// Primary domain, when the panel reports at least one.
    pub domain: Option<String>,
}

// Wire shape of the accountdetail result payload. The panel nests the
// suspension state under account_info and lists domains with the primary
// first.
#[derive(Debug, Deserialize)]
struct RawAccountDetail {
    account_info: Option<RawAccountInfo>,
    #[serde(default)]
    domains: Vec<RawDomainEntry>,
}

#[derive(Debug, Deserialize)]
struct RawAccountInfo {
    state: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawDomainEntry {
    domain: String,
}

impl AccountDetail {
    /// Decode the raw `result` payload of an accountdetail response.
    pub fn from_result(payload: serde_json::Value) -> PanelResult<Self> {
        let raw: RawAccountDetail = serde_json::from_value(payload)?;

        let suspended = raw
            .account_info
            .and_then(|info| info.state)
            .is_some_and(|state| state == "suspended");
        let domain = raw.domains.into_iter().next().map(|entry| entry.domain);

        Ok(Self { suspended, domain })
    }
}
