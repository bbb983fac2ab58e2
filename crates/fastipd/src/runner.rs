//! Runs the sync job on behalf of a trigger and keeps the last report
//!
//! Scheduled and manual triggers share one `Runner`. Runs are not serialized:
//! an overlapping manual run is harmless because reconciliation is idempotent.

use chrono::{DateTime, Utc};
use fastip_core::{Outcome, Stage, SyncJob};
use std::fmt;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{error, info};

/// What started a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// The interval scheduler
    Scheduled,
    /// `GET /trigger`
    Manual,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Scheduled => write!(f, "scheduled"),
            Trigger::Manual => write!(f, "manual"),
        }
    }
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    Succeeded(Outcome),
    Failed {
        /// Error taxonomy bucket
        category: &'static str,
        /// Reconciliation stage, when the failure came from the pipeline
        stage: Option<Stage>,
        message: String,
    },
}

/// Summary of one finished run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub trigger: Trigger,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub status: RunStatus,
}

impl RunReport {
    /// True unless the run failed; a no-op or an aborted run counts as success
    pub fn is_success(&self) -> bool {
        matches!(self.status, RunStatus::Succeeded(_))
    }

    /// One-line description of the result
    pub fn summary(&self) -> String {
        match &self.status {
            RunStatus::Succeeded(outcome) => outcome.to_string(),
            RunStatus::Failed {
                category, message, ..
            } => {
                format!("failed ({}): {}", category, message)
            }
        }
    }
}

/// Shared entry point for every trigger
pub struct Runner {
    job: SyncJob,
    deadline: Duration,
    last: RwLock<Option<RunReport>>,
}

impl Runner {
    /// Create a runner that bounds each run by `deadline`
    pub fn new(job: SyncJob, deadline: Duration) -> Self {
        Self {
            job,
            deadline,
            last: RwLock::new(None),
        }
    }

    /// The wrapped job
    pub fn job(&self) -> &SyncJob {
        &self.job
    }

    /// Run the job once and record the report
    ///
    /// Never fails: errors are logged here, once, and returned inside the
    /// report so the caller can keep scheduling.
    pub async fn run(&self, trigger: Trigger) -> RunReport {
        let started_at = Utc::now();
        info!("Starting {} run", trigger);

        let status = match self.job.run_with_deadline(self.deadline).await {
            Ok(outcome) => {
                info!("{} run finished: {}", trigger, outcome);
                RunStatus::Succeeded(outcome)
            }
            Err(e) => {
                let stage = e.stage();
                error!(
                    category = e.category(),
                    stage = ?stage,
                    "{} run failed: {}",
                    trigger,
                    e
                );
                RunStatus::Failed {
                    category: e.category(),
                    stage,
                    message: e.to_string(),
                }
            }
        };

        let report = RunReport {
            trigger,
            started_at,
            finished_at: Utc::now(),
            status,
        };
        *self.last.write().await = Some(report.clone());
        report
    }

    /// The most recent report, if any run has finished
    pub async fn last_report(&self) -> Option<RunReport> {
        self.last.read().await.clone()
    }
}
