//! Account lifecycle operations against the CWP API.
//!
//! Every operation is one stateless POST: the shared access hash, an
//! `action` discriminator, and the operation's own fields, answered by a
//! JSON `{status, result}` envelope. See
//! <https://docs.control-webpanel.com/docs/developer-tools/api-manager>.

use tracing::{debug, info};

use crate::account::{Account, AccountDetail};
use crate::config::ServerConfig;
use crate::error::{PanelError, PanelResult};
use crate::response::OpOutcome;
use crate::transport::{Field, HttpTransport, PanelTransport};

/// Client for one CWP server.
///
/// Generic over the transport so the wire can be mocked out; production use
/// goes through [`PanelClient::new`], which wires up [`HttpTransport`] from
/// the validated config.
pub struct PanelClient<T: PanelTransport = HttpTransport> {
    config: ServerConfig,
    transport: T,
}

impl PanelClient<HttpTransport> {
    pub fn new(config: ServerConfig) -> PanelResult<Self> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self { config, transport })
    }
}

impl<T: PanelTransport> PanelClient<T> {
    /// Build a client over a caller-supplied transport.
    pub fn with_transport(config: ServerConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Provision a new account.
    ///
    /// The `reseller` field is only present on the wire when the account is
    /// flagged as a reseller; `encodepass` is pinned to false because the
    /// password is sent as-is.
    pub async fn create_account(&self, account: &Account) -> PanelResult<OpOutcome> {
        info!(user = %account.username, "Creating account");

        let mut fields = self.base_fields("add");
        push(&mut fields, "domain", &account.domain);
        push(&mut fields, "user", &account.username);
        push(&mut fields, "pass", &account.password);
        push(&mut fields, "email", &account.email);
        push(&mut fields, "package", &account.package);
        push(&mut fields, "server_ips", &account.server_ip);
        push(&mut fields, "encodepass", "false");
        if account.reseller {
            push(&mut fields, "reseller", "1");
        }

        self.run("account", fields).await
    }

    /// Suspend an account on the panel.
    pub async fn suspend_account(&self, account: &Account) -> PanelResult<OpOutcome> {
        info!(user = %account.username, "Suspending account");

        let mut fields = self.base_fields("susp");
        push(&mut fields, "user", &account.username);

        self.run("account", fields).await
    }

    /// Lift a suspension.
    pub async fn unsuspend_account(&self, account: &Account) -> PanelResult<OpOutcome> {
        info!(user = %account.username, "Un-suspending account");

        let mut fields = self.base_fields("unsp");
        push(&mut fields, "user", &account.username);

        self.run("account", fields).await
    }

    /// Remove the account from the panel.
    pub async fn cancel_account(&self, account: &Account) -> PanelResult<OpOutcome> {
        info!(user = %account.username, "Canceling account");

        let mut fields = self.base_fields("del");
        push(&mut fields, "user", &account.username);
        push(&mut fields, "email", &account.email);

        self.run("account", fields).await
    }

    /// Set a new password for the account.
    pub async fn change_account_password(
        &self,
        account: &Account,
        new_password: &str,
    ) -> PanelResult<OpOutcome> {
        info!(user = %account.username, "Changing password on account");

        let mut fields = self.base_fields("udp");
        push(&mut fields, "user", &account.username);
        push(&mut fields, "pass", new_password);

        self.run("changepass", fields).await
    }

    /// Move the account to the package named in `account.package`.
    ///
    /// Known broken upstream: the panel accepts this request and reports OK
    /// without applying the change. Kept because the request shape matches
    /// the documented API; verify against a live panel before relying on it.
    pub async fn change_account_package(&self, account: &Account) -> PanelResult<OpOutcome> {
        info!(user = %account.username, "Changing package on account");

        let mut fields = self.base_fields("upd");
        push(&mut fields, "user", &account.username);
        push(&mut fields, "package", &account.package);

        self.run("changepack", fields).await
    }

    /// Fetch remote state and return an updated copy of the account with
    /// the suspension flag and primary domain the panel reports.
    pub async fn synchronize_account(&self, account: &Account) -> PanelResult<Account> {
        info!(user = %account.username, "Synchronizing account with server");

        let mut fields = self.base_fields("list");
        push(&mut fields, "user", &account.username);

        let payload = self.run_detail("accountdetail", fields).await?;
        let detail = AccountDetail::from_result(payload)?;

        let mut updated = account.clone();
        updated.suspended = detail.suspended;
        if let Some(domain) = detail.domain {
            updated.domain = domain;
        }
        Ok(updated)
    }

    /// Fetch the raw accountdetail payload for a username, verbatim.
    pub async fn account_detail(&self, username: &str) -> PanelResult<serde_json::Value> {
        let mut fields = self.base_fields("list");
        push(&mut fields, "user", username);

        self.run_detail("accountdetail", fields).await
    }

    /// Probe the server. CWP has no dedicated ping, so listing the server
    /// type stands in for one.
    pub async fn test_connection(&self) -> PanelResult<OpOutcome> {
        info!(host = %self.config.host(), "Testing panel connection");

        let fields = self.base_fields("list");
        self.run("typeserver", fields).await
    }

    // Things CWP doesn't support. These fail up front, before any request
    // is put on the wire.

    pub fn change_account_username(&self, _account: &Account, _new: &str) -> PanelResult<()> {
        Err(PanelError::Unsupported("username changes through the API"))
    }

    pub fn change_account_domain(&self, _account: &Account, _new: &str) -> PanelResult<()> {
        Err(PanelError::Unsupported("changing the primary domain name"))
    }

    pub fn change_account_ip(&self, _account: &Account, _new: &str) -> PanelResult<()> {
        Err(PanelError::Unsupported("changing the IP"))
    }

    fn base_fields(&self, action: &str) -> Vec<Field> {
        vec![
            ("key".to_string(), self.config.access_hash().to_string()),
            ("action".to_string(), action.to_string()),
        ]
    }

    async fn run(&self, endpoint: &str, fields: Vec<Field>) -> PanelResult<OpOutcome> {
        let response = self.transport.send(endpoint, &fields).await?;
        let outcome = response.into_outcome();
        match &outcome {
            Ok(OpOutcome::Ok) => debug!(endpoint, "OK"),
            Ok(OpOutcome::Raw(_)) => debug!(endpoint, "Results"),
            Err(_) => debug!(endpoint, "Error"),
        }
        outcome
    }

    async fn run_detail(&self, endpoint: &str, fields: Vec<Field>) -> PanelResult<serde_json::Value> {
        let response = self.transport.send(endpoint, &fields).await?;
        let payload = response.into_result_payload();
        match &payload {
            Ok(_) => debug!(endpoint, "Results"),
            Err(_) => debug!(endpoint, "Error"),
        }
        payload
    }
}

fn push(fields: &mut Vec<Field>, name: &str, value: &str) {
    fields.push((name.to_string(), value.to_string()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::ApiResponse;
    use crate::transport::MockPanelTransport;

    fn test_config() -> ServerConfig {
        ServerConfig::new("panel.example.com", "hash123").unwrap()
    }

    fn sample_account() -> Account {
        Account {
            username: "alice".into(),
            password: "hunter2".into(),
            domain: "alice.example".into(),
            email: "alice@example.com".into(),
            package: "basic".into(),
            server_ip: "203.0.113.7".into(),
            reseller: false,
            suspended: false,
        }
    }

    fn ok_response() -> ApiResponse {
        ApiResponse {
            status: Some("OK".into()),
            result: None,
        }
    }

    fn field<'a>(fields: &'a [Field], name: &str) -> Option<&'a str> {
        fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    #[tokio::test]
    async fn test_create_sends_exactly_the_documented_fields() {
        let mut transport = MockPanelTransport::new();
        transport
            .expect_send()
            .withf(|endpoint, fields| {
                endpoint == "account"
                    && field(fields, "key") == Some("hash123")
                    && field(fields, "action") == Some("add")
                    && field(fields, "domain") == Some("alice.example")
                    && field(fields, "user") == Some("alice")
                    && field(fields, "pass") == Some("hunter2")
                    && field(fields, "email") == Some("alice@example.com")
                    && field(fields, "package") == Some("basic")
                    && field(fields, "server_ips") == Some("203.0.113.7")
                    && field(fields, "encodepass") == Some("false")
                    && field(fields, "reseller").is_none()
                    && fields.len() == 9
            })
            .times(1)
            .returning(|_, _| Ok(ok_response()));

        let client = PanelClient::with_transport(test_config(), transport);
        let outcome = client.create_account(&sample_account()).await.unwrap();
        assert_eq!(outcome, OpOutcome::Ok);
    }

    #[tokio::test]
    async fn test_create_reseller_flag_present_only_when_set() {
        let mut transport = MockPanelTransport::new();
        transport
            .expect_send()
            .withf(|_, fields| field(fields, "reseller") == Some("1"))
            .times(1)
            .returning(|_, _| Ok(ok_response()));

        let client = PanelClient::with_transport(test_config(), transport);
        let mut account = sample_account();
        account.reseller = true;
        client.create_account(&account).await.unwrap();
    }

    #[tokio::test]
    async fn test_suspend_sends_user_only() {
        let mut transport = MockPanelTransport::new();
        transport
            .expect_send()
            .withf(|endpoint, fields| {
                endpoint == "account"
                    && field(fields, "action") == Some("susp")
                    && field(fields, "user") == Some("alice")
                    && fields.len() == 3
            })
            .times(1)
            .returning(|_, _| Ok(ok_response()));

        let client = PanelClient::with_transport(test_config(), transport);
        client.suspend_account(&sample_account()).await.unwrap();
    }

    #[tokio::test]
    async fn test_cancel_includes_email() {
        let mut transport = MockPanelTransport::new();
        transport
            .expect_send()
            .withf(|endpoint, fields| {
                endpoint == "account"
                    && field(fields, "action") == Some("del")
                    && field(fields, "user") == Some("alice")
                    && field(fields, "email") == Some("alice@example.com")
            })
            .times(1)
            .returning(|_, _| Ok(ok_response()));

        let client = PanelClient::with_transport(test_config(), transport);
        client.cancel_account(&sample_account()).await.unwrap();
    }

    #[tokio::test]
    async fn test_password_change_targets_changepass_endpoint() {
        let mut transport = MockPanelTransport::new();
        transport
            .expect_send()
            .withf(|endpoint, fields| {
                endpoint == "changepass"
                    && field(fields, "action") == Some("udp")
                    && field(fields, "user") == Some("alice")
                    && field(fields, "pass") == Some("correct-horse")
            })
            .times(1)
            .returning(|_, _| Ok(ok_response()));

        let client = PanelClient::with_transport(test_config(), transport);
        client
            .change_account_password(&sample_account(), "correct-horse")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_unsupported_operations_never_touch_the_wire() {
        let mut transport = MockPanelTransport::new();
        transport.expect_send().times(0);

        let client = PanelClient::with_transport(test_config(), transport);
        let account = sample_account();

        assert!(matches!(
            client.change_account_username(&account, "new-name"),
            Err(PanelError::Unsupported(_))
        ));
        assert!(matches!(
            client.change_account_domain(&account, "new.example"),
            Err(PanelError::Unsupported(_))
        ));
        assert!(matches!(
            client.change_account_ip(&account, "198.51.100.9"),
            Err(PanelError::Unsupported(_))
        ));
    }

    #[tokio::test]
    async fn test_remote_error_surfaces_as_remote() {
        let mut transport = MockPanelTransport::new();
        transport.expect_send().times(1).returning(|_, _| {
            Ok(ApiResponse {
                status: Some("Error".into()),
                result: Some(serde_json::json!("package does not exist")),
            })
        });

        let client = PanelClient::with_transport(test_config(), transport);
        let err = client
            .create_account(&sample_account())
            .await
            .unwrap_err();
        assert!(err.is_remote());
        assert!(err.to_string().contains("package does not exist"));
    }
}
