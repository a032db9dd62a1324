//! In-memory collaborators for exercising the coordinator.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{oneshot, Notify};

use jobshim_core::{
    AllocationError, CommitMount, CompletionReport, JobId, MountError, ReportError,
    UnmountError, WorkAllocation,
};

use crate::client::ControlPlane;
use crate::mount::Mounter;

/// Ordered record of calls made across fakes.
pub type EventLog = Arc<Mutex<Vec<&'static str>>>;

pub fn event_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// How a [`FakeMounter`] behaves once asked to mount.
#[derive(Debug, Clone, Copy)]
pub enum MountBehavior {
    /// Signal ready and serve until unmounted.
    Serve,
    /// Fail without signaling ready.
    FailBeforeReady,
    /// Return cleanly without signaling ready.
    EndWithoutReady,
    /// Signal ready, then fail after the delay.
    FailAfterReady(Duration),
    /// Signal ready, then stop cleanly after the delay.
    StopAfterReady(Duration),
    /// Signal ready and never stop, even when unmounted.
    IgnoreUnmount,
}

pub struct FakeMounter {
    behavior: MountBehavior,
    unmount_fails: bool,
    mounts: Mutex<Vec<(u64, Vec<CommitMount>)>>,
    unmounts: AtomicUsize,
    released: Notify,
    events: EventLog,
}

impl FakeMounter {
    pub fn new(behavior: MountBehavior) -> Self {
        Self {
            behavior,
            unmount_fails: false,
            mounts: Mutex::new(Vec::new()),
            unmounts: AtomicUsize::new(0),
            released: Notify::new(),
            events: event_log(),
        }
    }

    pub fn failing_unmount(mut self) -> Self {
        self.unmount_fails = true;
        self
    }

    pub fn with_events(mut self, events: EventLog) -> Self {
        self.events = events;
        self
    }

    pub fn unmount_count(&self) -> usize {
        self.unmounts.load(Ordering::SeqCst)
    }

    pub fn mount_count(&self) -> usize {
        self.mounts.lock().unwrap().len()
    }

    pub fn shards(&self) -> Vec<u64> {
        self.mounts.lock().unwrap().iter().map(|(s, _)| *s).collect()
    }

    pub fn mounted_names(&self) -> Vec<Vec<String>> {
        self.mounts
            .lock()
            .unwrap()
            .iter()
            .map(|(_, m)| m.iter().map(|c| c.mount_name().to_string()).collect())
            .collect()
    }
}

#[async_trait]
impl Mounter for FakeMounter {
    async fn mount(
        &self,
        root: &Path,
        shard: u64,
        mounts: &[CommitMount],
        ready: oneshot::Sender<()>,
    ) -> Result<(), MountError> {
        self.mounts.lock().unwrap().push((shard, mounts.to_vec()));
        self.events.lock().unwrap().push("mount");
        let root = root.display().to_string();

        match self.behavior {
            MountBehavior::Serve => {
                let _ = ready.send(());
                self.released.notified().await;
                Ok(())
            }
            MountBehavior::FailBeforeReady => Err(MountError::Establish {
                root,
                reason: "commit not found".to_string(),
            }),
            MountBehavior::EndWithoutReady => Ok(()),
            MountBehavior::FailAfterReady(delay) => {
                let _ = ready.send(());
                tokio::time::sleep(delay).await;
                Err(MountError::Serving {
                    root,
                    reason: "versioned filesystem service went away".to_string(),
                })
            }
            MountBehavior::StopAfterReady(delay) => {
                let _ = ready.send(());
                tokio::time::sleep(delay).await;
                Ok(())
            }
            MountBehavior::IgnoreUnmount => {
                let _ = ready.send(());
                std::future::pending::<()>().await;
                Ok(())
            }
        }
    }

    async fn unmount(&self, root: &Path) -> Result<(), UnmountError> {
        self.unmounts.fetch_add(1, Ordering::SeqCst);
        self.events.lock().unwrap().push("unmount");
        self.released.notify_one();
        if self.unmount_fails {
            return Err(UnmountError::Busy(root.display().to_string()));
        }
        Ok(())
    }
}

pub struct FakeControlPlane {
    allocation: Mutex<Option<Result<WorkAllocation, AllocationError>>>,
    report_fails: bool,
    allocate_calls: AtomicUsize,
    reports: Mutex<Vec<CompletionReport>>,
    events: EventLog,
}

impl FakeControlPlane {
    pub fn new(allocation: WorkAllocation) -> Self {
        Self::with_result(Ok(allocation))
    }

    pub fn unreachable() -> Self {
        Self::with_result(Err(AllocationError::Unavailable(
            "connection refused".to_string(),
        )))
    }

    fn with_result(result: Result<WorkAllocation, AllocationError>) -> Self {
        Self {
            allocation: Mutex::new(Some(result)),
            report_fails: false,
            allocate_calls: AtomicUsize::new(0),
            reports: Mutex::new(Vec::new()),
            events: event_log(),
        }
    }

    pub fn failing_report(mut self) -> Self {
        self.report_fails = true;
        self
    }

    pub fn with_events(mut self, events: EventLog) -> Self {
        self.events = events;
        self
    }

    pub fn allocate_calls(&self) -> usize {
        self.allocate_calls.load(Ordering::SeqCst)
    }

    pub fn reports(&self) -> Vec<CompletionReport> {
        self.reports.lock().unwrap().clone()
    }
}

#[async_trait]
impl ControlPlane for FakeControlPlane {
    async fn allocate_work(&self, job_id: &JobId) -> Result<WorkAllocation, AllocationError> {
        self.allocate_calls.fetch_add(1, Ordering::SeqCst);
        self.events.lock().unwrap().push("allocate");
        // Allocations are consumed by the first successful call.
        self.allocation
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| {
                Err(AllocationError::Rejected {
                    job_id: job_id.to_string(),
                    reason: "already claimed".to_string(),
                })
            })
    }

    async fn report_completion(&self, report: &CompletionReport) -> Result<(), ReportError> {
        self.events.lock().unwrap().push("report");
        if self.report_fails {
            return Err(ReportError::Unavailable("connection reset".to_string()));
        }
        self.reports.lock().unwrap().push(report.clone());
        Ok(())
    }
}
