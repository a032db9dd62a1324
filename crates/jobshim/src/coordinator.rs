//! Job coordination.
//!
//! Drives one job run through its lifecycle:
//! allocate work, mount its commits, run the transform, unmount, report.
//! The mount is always torn down before the verdict is reported, and the
//! verdict is reported at most once.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures_util::FutureExt;
use tokio::io::AsyncWrite;
use tracing::{error, info, warn};

use jobshim_core::{CompletionReport, CoordinatorError, JobId, JobState};

use crate::client::ControlPlane;
use crate::mount::MountCoordinator;
use crate::runner::TransformRunner;

/// Destination for the transform's output streams.
pub type Sink = Box<dyn AsyncWrite + Send + Unpin>;

/// Summary of a run whose verdict reached the control plane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutcome {
    pub job_id: JobId,
    pub shard: u64,
    /// Verdict of the transform, as reported.
    pub success: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Coordinates a single job run.
pub struct JobCoordinator {
    control_plane: Arc<dyn ControlPlane>,
    mounts: MountCoordinator,
    runner: TransformRunner,
    stdout: Sink,
    stderr: Sink,
    state: JobState,
}

impl JobCoordinator {
    /// Create a coordinator that forwards transform output to this process's
    /// stdout and stderr.
    pub fn new(
        control_plane: Arc<dyn ControlPlane>,
        mounts: MountCoordinator,
        runner: TransformRunner,
    ) -> Self {
        Self {
            control_plane,
            mounts,
            runner,
            stdout: Box::new(tokio::io::stdout()),
            stderr: Box::new(tokio::io::stderr()),
            state: JobState::Idle,
        }
    }

    /// Redirect transform output.
    pub fn with_output(mut self, stdout: Sink, stderr: Sink) -> Self {
        self.stdout = stdout;
        self.stderr = stderr;
        self
    }

    /// Current lifecycle state.
    pub fn state(&self) -> JobState {
        self.state
    }

    /// Run `job_id` to completion.
    ///
    /// A failing transform is not an error: it is reported with
    /// `success = false` and this returns `Ok`. Errors are fatal to the run.
    pub async fn run(&mut self, job_id: &JobId) -> Result<JobOutcome, CoordinatorError> {
        let result = self.drive(job_id).await;
        if result.is_err() {
            self.transition(JobState::Fatal);
        }
        result
    }

    async fn drive(&mut self, job_id: &JobId) -> Result<JobOutcome, CoordinatorError> {
        let started_at = Utc::now();

        let allocation = self.control_plane.allocate_work(job_id).await?;
        self.transition(JobState::Allocated);
        info!(
            job_id = %job_id,
            shard = allocation.shard,
            inputs = allocation.inputs.len(),
            output = %allocation.output,
            "Work allocated"
        );

        self.transition(JobState::Mounting);
        let mut session = self
            .mounts
            .establish(allocation.shard, allocation.commit_mounts())
            .await?;
        self.transition(JobState::Ready);

        self.transition(JobState::Running);
        let transform = AssertUnwindSafe(self.runner.run(
            &allocation.transform,
            &mut self.stdout,
            &mut self.stderr,
        ))
        .catch_unwind();
        let ran = session.run(transform).await;

        self.transition(JobState::Unmounting);
        if let Err(e) = session.teardown().await {
            warn!(job_id = %job_id, error = %e, "Unmount failed, reporting anyway");
        }

        // A mount failure while the transform ran leaves no trustworthy verdict.
        let success = match ran? {
            Ok(success) => success,
            Err(_) => {
                error!(job_id = %job_id, "Transform runner panicked");
                false
            }
        };

        self.transition(JobState::Reported);
        let report = CompletionReport {
            job_id: job_id.clone(),
            shard: allocation.shard,
            success,
        };
        self.control_plane.report_completion(&report).await?;
        self.transition(JobState::Done);

        let finished_at = Utc::now();
        info!(
            job_id = %job_id,
            shard = report.shard,
            success = success,
            duration_ms = (finished_at - started_at).num_milliseconds(),
            "Job reported"
        );

        Ok(JobOutcome {
            job_id: report.job_id,
            shard: report.shard,
            success,
            started_at,
            finished_at,
        })
    }

    fn transition(&mut self, next: JobState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {} -> {}",
            self.state,
            next
        );
        info!(from = %self.state, to = %next, "Job state changed");
        self.state = next;
    }
}
