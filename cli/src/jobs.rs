//! Cron jobs shipped with the binary.

use async_trait::async_trait;
use hostctl_panel::{HttpTransport, PanelClient};

use crate::cron::Job;

/// Probes the configured panel once per run, so connectivity rot shows up
/// in the cron history instead of during the next provisioning call.
pub struct ConnectivityProbeJob {
    client: PanelClient<HttpTransport>,
}

impl ConnectivityProbeJob {
    pub fn new(client: PanelClient<HttpTransport>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Job for ConnectivityProbeJob {
    fn name(&self) -> &str {
        "panel connectivity probe"
    }

    async fn run(&self) -> anyhow::Result<()> {
        self.client.test_connection().await?;
        Ok(())
    }
}
