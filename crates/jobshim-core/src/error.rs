//! Error taxonomy of a job run.
//!
//! Fatal kinds are gathered under [`CoordinatorError`]; [`TransformError`]
//! and [`UnmountError`] are recoverable and never terminate a run.

use thiserror::Error;

/// The control plane could not allocate work for the job.
#[derive(Debug, Error)]
pub enum AllocationError {
    /// Control plane unreachable.
    #[error("job control service unavailable: {0}")]
    Unavailable(String),

    /// Control plane refused the job id (unknown or already claimed).
    #[error("job {job_id} rejected: {reason}")]
    Rejected { job_id: String, reason: String },

    /// Response lacked a required field.
    #[error("malformed allocation: missing {0}")]
    Malformed(&'static str),
}

/// Establishing or serving the filesystem view failed.
#[derive(Debug, Error)]
pub enum MountError {
    /// The versioned filesystem service address is unusable.
    #[error("versioned filesystem service unavailable: {0}")]
    Connect(String),

    /// The mount could not be set up.
    #[error("mount at {root} failed: {reason}")]
    Establish { root: String, reason: String },

    /// Setup ended without ever signaling readiness.
    #[error("mount at {0} ended before becoming ready")]
    NeverReady(String),

    /// The serving task failed after readiness.
    #[error("mount at {root} stopped serving: {reason}")]
    Serving { root: String, reason: String },

    /// The serving task ended cleanly while the job still needed it.
    #[error("mount at {0} stopped serving before teardown")]
    Stopped(String),

    /// The serving task panicked or was cancelled.
    #[error("mount task at {root} aborted: {reason}")]
    Aborted { root: String, reason: String },
}

/// Tearing the filesystem view down failed.
#[derive(Debug, Error)]
pub enum UnmountError {
    /// Something still holds files open below the root.
    #[error("mount at {0} is busy")]
    Busy(String),

    /// The root is not a mount point.
    #[error("{0} is not a mount point")]
    NotMounted(String),

    /// Any other failure reported by the filesystem service.
    #[error("unmount of {root} failed: {reason}")]
    Failed { root: String, reason: String },
}

/// The user transform did not complete successfully.
#[derive(Debug, Error)]
pub enum TransformError {
    /// Transform carried no executable.
    #[error("transform has an empty command")]
    EmptyCommand,

    /// The process could not be launched.
    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Streaming stdio or waiting on the child failed.
    #[error("I/O error while running transform: {0}")]
    Io(#[from] std::io::Error),

    /// The process exited with a non-zero status.
    #[error("transform exited with status {0}")]
    ExitStatus(i32),

    /// The process was killed by a signal.
    #[error("transform terminated by signal")]
    Signaled,
}

/// The completion report could not be delivered.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Control plane unreachable.
    #[error("job control service unavailable: {0}")]
    Unavailable(String),

    /// Control plane refused the report.
    #[error("completion of job {job_id} rejected: {reason}")]
    Rejected { job_id: String, reason: String },
}

/// Unrecoverable failure of a job run. The process exits nonzero.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error(transparent)]
    Allocation(#[from] AllocationError),

    #[error(transparent)]
    Mount(#[from] MountError),

    #[error(transparent)]
    Report(#[from] ReportError),
}
