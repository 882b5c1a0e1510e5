//! Scheduled-job service and the console trigger that drives it.
//!
//! The trigger is generic over [`CronService`] and an output sink, so tests
//! drive it with a fake service and a byte buffer. The shipped [`Service`]
//! keeps a registry of jobs and persists its last-run timestamp plus a
//! bounded execution history to a JSON state file.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Persisted execution-history cap.
const MAX_HISTORY: usize = 100;

const STATE_FILE: &str = "cron-state.json";

#[derive(Error, Debug)]
pub enum CronError {
    #[error("Cron state error: {0}")]
    State(String),
    #[error("{} cron job(s) failed: {}", failed, errors.join("; "))]
    JobsFailed { failed: usize, errors: Vec<String> },
}

/// One schedulable unit of work.
#[async_trait]
pub trait Job: Send + Sync {
    fn name(&self) -> &str;
    async fn run(&self) -> anyhow::Result<()>;
}

/// The job-processing collaborator the console trigger drives.
#[async_trait]
pub trait CronService: Send {
    fn last_execution_time(&self) -> Option<DateTime<Utc>>;
    async fn run_crons(&mut self, interval: Option<u32>) -> Result<CronReport, CronError>;
}

#[derive(Debug, Clone, Default)]
pub struct CronReport {
    /// Jobs that completed without error.
    pub executed: usize,
    /// True when the interval argument made the run a no-op.
    pub skipped: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum JobStatus {
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobExecutionLog {
    pub id: Uuid,
    pub job_name: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub status: JobStatus,
    pub error: Option<String>,
    pub duration_ms: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CronState {
    last_run: Option<DateTime<Utc>>,
    #[serde(default)]
    history: Vec<JobExecutionLog>,
}

/// File-backed cron service with a job registry.
pub struct Service {
    state_path: PathBuf,
    state: CronState,
    jobs: Vec<Box<dyn Job>>,
}

impl Service {
    /// Open (or initialize) the service state under `data_dir`.
    pub fn open(data_dir: &Path) -> Result<Self, CronError> {
        fs::create_dir_all(data_dir).map_err(|e| {
            CronError::State(format!(
                "failed to create data directory {}: {e}",
                data_dir.display()
            ))
        })?;

        let state_path = data_dir.join(STATE_FILE);
        let state = if state_path.exists() {
            let content = fs::read_to_string(&state_path).map_err(|e| {
                CronError::State(format!("failed to read {}: {e}", state_path.display()))
            })?;
            serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!(error = %e, "Failed to parse cron state, starting fresh");
                CronState::default()
            })
        } else {
            CronState::default()
        };

        Ok(Self {
            state_path,
            state,
            jobs: Vec::new(),
        })
    }

    pub fn register(&mut self, job: Box<dyn Job>) {
        info!(job = job.name(), "Registered cron job");
        self.jobs.push(job);
    }

    pub fn history(&self) -> &[JobExecutionLog] {
        &self.state.history
    }

    fn save(&self) -> Result<(), CronError> {
        let content = serde_json::to_string_pretty(&self.state)
            .map_err(|e| CronError::State(format!("failed to serialize cron state: {e}")))?;
        fs::write(&self.state_path, content).map_err(|e| {
            CronError::State(format!("failed to write {}: {e}", self.state_path.display()))
        })
    }
}

#[async_trait]
impl CronService for Service {
    fn last_execution_time(&self) -> Option<DateTime<Utc>> {
        self.state.last_run
    }

    async fn run_crons(&mut self, interval: Option<u32>) -> Result<CronReport, CronError> {
        if let (Some(minutes), Some(last_run)) = (interval, self.state.last_run) {
            if Utc::now() - last_run < Duration::minutes(i64::from(minutes)) {
                info!(interval_minutes = minutes, "Cron jobs not due yet");
                return Ok(CronReport {
                    executed: 0,
                    skipped: true,
                });
            }
        }

        let mut executed = 0;
        let mut errors = Vec::new();

        for job in &self.jobs {
            let started_at = Utc::now();
            info!(job = job.name(), "Running cron job");

            let outcome = job.run().await;
            let completed_at = Utc::now();

            self.state.history.push(JobExecutionLog {
                id: Uuid::new_v4(),
                job_name: job.name().to_string(),
                started_at,
                completed_at: Some(completed_at),
                status: if outcome.is_ok() {
                    JobStatus::Completed
                } else {
                    JobStatus::Failed
                },
                error: outcome.as_ref().err().map(|e| format!("{e:#}")),
                duration_ms: Some((completed_at - started_at).num_milliseconds()),
            });
            if self.state.history.len() > MAX_HISTORY {
                let excess = self.state.history.len() - MAX_HISTORY;
                self.state.history.drain(..excess);
            }

            match outcome {
                Ok(()) => executed += 1,
                Err(e) => {
                    error!(job = job.name(), error = %e, "Cron job failed");
                    errors.push(format!("{}: {e:#}", job.name()));
                }
            }
        }

        self.state.last_run = Some(Utc::now());
        self.save()?;

        if errors.is_empty() {
            Ok(CronReport {
                executed,
                skipped: false,
            })
        } else {
            Err(CronError::JobsFailed {
                failed: errors.len(),
                errors,
            })
        }
    }
}

/// The `cron run` console trigger.
///
/// Prints a banner and the last execution time, runs due jobs, and reports
/// the outcome. A failed run prints the fault and returns an error so the
/// process exits non-zero; success is never reported for a failed run.
pub async fn run_trigger<S, W>(
    service: &mut S,
    interval: Option<u32>,
    out: &mut W,
) -> anyhow::Result<()>
where
    S: CronService,
    W: Write,
{
    writeln!(out, "hostctl cron runner")?;
    writeln!(out, "============")?;
    match service.last_execution_time() {
        Some(ts) => writeln!(out, "Last executed: {}", ts.to_rfc3339())?,
        None => writeln!(out, "Last executed: never")?,
    }
    writeln!(out)?;

    match service.run_crons(interval).await {
        Ok(report) if report.skipped => {
            writeln!(out, "Skipped: the last run is within the given interval.")?;
            Ok(())
        }
        Ok(report) => {
            writeln!(
                out,
                "Successfully ran the cron jobs ({} executed).",
                report.executed
            )?;
            Ok(())
        }
        Err(e) => {
            writeln!(out, "An error occurred: {e}")?;
            Err(anyhow!("cron run failed"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct OkJob;

    #[async_trait]
    impl Job for OkJob {
        fn name(&self) -> &str {
            "ok job"
        }

        async fn run(&self) -> anyhow::Result<()> {
            Ok(())
        }
    }

    struct FailingJob;

    #[async_trait]
    impl Job for FailingJob {
        fn name(&self) -> &str {
            "failing job"
        }

        async fn run(&self) -> anyhow::Result<()> {
            Err(anyhow!("db unavailable"))
        }
    }

    /// Trigger-level fake with a canned outcome.
    struct FakeService {
        last_run: Option<DateTime<Utc>>,
        outcome: Option<Result<CronReport, CronError>>,
    }

    #[async_trait]
    impl CronService for FakeService {
        fn last_execution_time(&self) -> Option<DateTime<Utc>> {
            self.last_run
        }

        async fn run_crons(&mut self, _interval: Option<u32>) -> Result<CronReport, CronError> {
            self.outcome.take().expect("run_crons called twice")
        }
    }

    #[tokio::test]
    async fn test_run_records_last_execution_time() {
        let dir = tempfile::tempdir().unwrap();
        let mut service = Service::open(dir.path()).unwrap();
        service.register(Box::new(OkJob));

        assert_eq!(service.last_execution_time(), None);
        let report = service.run_crons(None).await.unwrap();
        assert_eq!(report.executed, 1);
        assert!(!report.skipped);
        assert!(service.last_execution_time().is_some());

        // State survives a reopen.
        let reopened = Service::open(dir.path()).unwrap();
        assert_eq!(
            reopened.last_execution_time(),
            service.last_execution_time()
        );
        assert_eq!(reopened.history().len(), 1);
        assert_eq!(reopened.history()[0].status, JobStatus::Completed);
    }

    #[tokio::test]
    async fn test_failed_job_fails_the_run_and_is_logged() {
        let dir = tempfile::tempdir().unwrap();
        let mut service = Service::open(dir.path()).unwrap();
        service.register(Box::new(OkJob));
        service.register(Box::new(FailingJob));

        let err = service.run_crons(None).await.unwrap_err();
        assert!(err.to_string().contains("db unavailable"));
        assert!(err.to_string().contains("1 cron job(s) failed"));

        // The failure is recorded, and the run still counts as executed.
        assert!(service.last_execution_time().is_some());
        let failed: Vec<_> = service
            .history()
            .iter()
            .filter(|entry| entry.status == JobStatus::Failed)
            .collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].error.as_deref(), Some("db unavailable"));
    }

    #[tokio::test]
    async fn test_interval_skips_a_recent_run() {
        let dir = tempfile::tempdir().unwrap();
        let mut service = Service::open(dir.path()).unwrap();
        service.register(Box::new(OkJob));

        service.run_crons(None).await.unwrap();
        let report = service.run_crons(Some(60)).await.unwrap();
        assert!(report.skipped);
        assert_eq!(report.executed, 0);
        assert_eq!(service.history().len(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_state_file_starts_fresh() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(STATE_FILE), "not json").unwrap();

        let service = Service::open(dir.path()).unwrap();
        assert_eq!(service.last_execution_time(), None);
        assert!(service.history().is_empty());
    }

    #[tokio::test]
    async fn test_trigger_reports_failure_and_exits_nonzero() {
        let mut service = FakeService {
            last_run: None,
            outcome: Some(Err(CronError::JobsFailed {
                failed: 1,
                errors: vec!["nightly sweep: db unavailable".into()],
            })),
        };

        let mut out = Vec::new();
        let result = run_trigger(&mut service, None, &mut out).await;

        assert!(result.is_err());
        let output = String::from_utf8(out).unwrap();
        assert!(output.contains("An error occurred"));
        assert!(output.contains("db unavailable"));
        assert!(!output.contains("Successfully"));
    }

    #[tokio::test]
    async fn test_trigger_reports_success_and_last_run() {
        let last_run = Utc::now();
        let mut service = FakeService {
            last_run: Some(last_run),
            outcome: Some(Ok(CronReport {
                executed: 2,
                skipped: false,
            })),
        };

        let mut out = Vec::new();
        run_trigger(&mut service, Some(5), &mut out).await.unwrap();

        let output = String::from_utf8(out).unwrap();
        assert!(output.contains("hostctl cron runner"));
        assert!(output.contains(&last_run.to_rfc3339()));
        assert!(output.contains("Successfully ran the cron jobs (2 executed)."));
    }

    #[tokio::test]
    async fn test_trigger_banner_shows_never_on_first_run() {
        let mut service = FakeService {
            last_run: None,
            outcome: Some(Ok(CronReport::default())),
        };

        let mut out = Vec::new();
        run_trigger(&mut service, None, &mut out).await.unwrap();

        let output = String::from_utf8(out).unwrap();
        assert!(output.contains("Last executed: never"));
    }
}
