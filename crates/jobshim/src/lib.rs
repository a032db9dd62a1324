//! Job Shim
//!
//! Runs one shard of a pipeline job: claims the work from the job control
//! service, mounts the input and output commits, runs the user transform
//! against the mount, and reports whether it succeeded.

pub mod client;
pub mod config;
pub mod coordinator;
pub mod locator;
pub mod logging;
pub mod mount;
pub mod runner;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use jobshim_core::{CoordinatorError, JobId};

pub use client::{ControlPlane, GrpcControlPlane};
pub use config::{Config, LogFormat, ServiceEnv};
pub use coordinator::{JobCoordinator, JobOutcome};
pub use locator::{Service, ServiceLocator};
pub use mount::{GrpcMounter, MountCoordinator, MountSession, Mounter};
pub use runner::TransformRunner;

/// Wire up the gRPC collaborators from `config` and run its job.
pub async fn run(config: Config) -> Result<JobOutcome, CoordinatorError> {
    let locator = ServiceLocator::new(config.services.clone());
    let mounter = GrpcMounter::connect(&locator.resolve(Service::Pfs))?;
    let control_plane = GrpcControlPlane::connect(&locator.resolve(Service::Pps))?;

    let mounts = MountCoordinator::new(Arc::new(mounter), config.mount_root.clone())
        .with_unmount_grace(config.unmount_grace());
    let mut coordinator =
        JobCoordinator::new(Arc::new(control_plane), mounts, TransformRunner::new());

    coordinator.run(&JobId::new(config.job_id)).await
}
