//! CLI surface: argument definitions and command dispatch.

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use hostctl_panel::{Account, OpOutcome, PanelClient, ServerConfig};

use crate::cron;
use crate::jobs::ConnectivityProbeJob;

/// Default data directory for cron state.
const DEFAULT_DATA_DIR: &str = "/var/lib/hostctl";

#[derive(Parser)]
#[command(
    name = "hostctl",
    version,
    about = "CWP account provisioning and scheduled job runner"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Scheduled job management
    Cron {
        #[command(subcommand)]
        command: CronCommand,
    },
    /// Account lifecycle operations against the configured panel
    Account {
        #[command(subcommand)]
        command: AccountCommand,
    },
}

#[derive(Subcommand)]
pub enum CronCommand {
    /// Executes the cron jobs
    Run {
        /// Interval in minutes; the run is skipped when the last one is
        /// more recent than this
        interval: Option<u32>,

        /// Data directory for cron state
        #[arg(long, env = "HOSTCTL_DATA_DIR", default_value = DEFAULT_DATA_DIR)]
        data_dir: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum AccountCommand {
    /// Provision a new account
    Create(CreateArgs),
    /// Suspend an account
    Suspend { username: String },
    /// Lift a suspension
    Unsuspend { username: String },
    /// Remove an account from the panel
    Cancel { username: String, email: String },
    /// Set a new password for an account
    Passwd { username: String, new_password: String },
    /// Move an account to another package (known broken on the CWP side)
    ChangePackage { username: String, package: String },
    /// Pull remote state for an account
    Sync { username: String },
    /// Probe the panel connection
    Test,
}

#[derive(Args)]
pub struct CreateArgs {
    pub username: String,
    pub domain: String,
    pub email: String,
    pub package: String,

    #[arg(long, env = "CWP_ACCOUNT_PASSWORD")]
    pub password: String,

    /// IP to serve the account's sites from
    #[arg(long, env = "CWP_SERVER_IP")]
    pub server_ip: String,

    /// Grant sub-provisioning privileges on the panel
    #[arg(long)]
    pub reseller: bool,
}

pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Cron {
            command: CronCommand::Run { interval, data_dir },
        } => run_cron(interval, data_dir).await,
        Command::Account { command } => run_account(command).await,
    }
}

async fn run_cron(interval: Option<u32>, data_dir: PathBuf) -> Result<()> {
    let mut service = cron::Service::open(&data_dir)?;

    // Jobs that need a panel are only registered when one is configured;
    // the runner itself works without any.
    match ServerConfig::from_env() {
        Ok(config) => {
            let client = PanelClient::new(config)?;
            service.register(Box::new(ConnectivityProbeJob::new(client)));
        }
        Err(e) => tracing::info!(reason = %e, "No panel configured, running without panel jobs"),
    }

    cron::run_trigger(&mut service, interval, &mut io::stdout()).await
}

async fn run_account(command: AccountCommand) -> Result<()> {
    let config = ServerConfig::from_env().context("panel configuration")?;
    let client = PanelClient::new(config)?;

    match command {
        AccountCommand::Create(args) => {
            let account = Account {
                username: args.username.clone(),
                password: args.password,
                domain: args.domain,
                email: args.email,
                package: args.package,
                server_ip: args.server_ip,
                reseller: args.reseller,
                suspended: false,
            };
            let outcome = client.create_account(&account).await?;
            report(outcome, &format!("Account {} created.", args.username))
        }
        AccountCommand::Suspend { username } => {
            let outcome = client.suspend_account(&Account::named(&username)).await?;
            report(outcome, &format!("Account {username} suspended."))
        }
        AccountCommand::Unsuspend { username } => {
            let outcome = client.unsuspend_account(&Account::named(&username)).await?;
            report(outcome, &format!("Account {username} unsuspended."))
        }
        AccountCommand::Cancel { username, email } => {
            let mut account = Account::named(&username);
            account.email = email;
            let outcome = client.cancel_account(&account).await?;
            report(outcome, &format!("Account {username} canceled."))
        }
        AccountCommand::Passwd {
            username,
            new_password,
        } => {
            let outcome = client
                .change_account_password(&Account::named(&username), &new_password)
                .await?;
            report(outcome, &format!("Password changed for {username}."))
        }
        AccountCommand::ChangePackage { username, package } => {
            let mut account = Account::named(&username);
            account.package = package.clone();
            let outcome = client.change_account_package(&account).await?;
            report(
                outcome,
                &format!("Package change to {package} requested for {username}."),
            )
        }
        AccountCommand::Sync { username } => {
            let updated = client.synchronize_account(&Account::named(&username)).await?;
            println!(
                "{}: domain={} suspended={}",
                updated.username, updated.domain, updated.suspended
            );
            Ok(())
        }
        AccountCommand::Test => {
            client.test_connection().await?;
            println!("Panel connection OK.");
            Ok(())
        }
    }
}

fn report(outcome: OpOutcome, success_line: &str) -> Result<()> {
    match outcome {
        OpOutcome::Ok => println!("{success_line}"),
        OpOutcome::Raw(value) => println!("{}", serde_json::to_string_pretty(&value)?),
    }
    Ok(())
}
