//! Mount coordination.
//!
//! A job sees its commits as one filesystem below a fixed root: every input
//! read-only under its repository name and the output writable under `out`.
//! Mounting is a long-running operation; it signals readiness once and then
//! keeps serving until the root is unmounted. [`MountCoordinator`] runs it as
//! a background task and hands out a [`MountSession`] that owns the root
//! until [`MountSession::teardown`].

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::oneshot;
use tokio::task::{JoinError, JoinHandle};
use tokio_stream::{Stream, StreamExt};
use tonic::{Code, Status};
use tracing::{debug, info, warn};

use jobshim_core::{CommitMount, MountError, UnmountError};
use jobshim_proto::pb::{self, MountEvent, MountRequest, MountState, UnmountRequest};
use jobshim_proto::MountApiClient;

use crate::client::lazy_channel;

/// Default time the serving task gets to wind down after unmount.
pub const DEFAULT_UNMOUNT_GRACE: Duration = Duration::from_secs(5);

/// Driver that exposes commits as a filesystem.
#[async_trait]
pub trait Mounter: Send + Sync + 'static {
    /// Mount `mounts` below `root` and serve them until unmounted.
    ///
    /// Implementations send on `ready` once the root is usable and return
    /// only when serving stops. Dropping `ready` unsent means the mount never
    /// became usable.
    async fn mount(
        &self,
        root: &Path,
        shard: u64,
        mounts: &[CommitMount],
        ready: oneshot::Sender<()>,
    ) -> Result<(), MountError>;

    /// Remove the filesystem at `root`.
    async fn unmount(&self, root: &Path) -> Result<(), UnmountError>;
}

/// [`Mounter`] backed by the versioned filesystem service's mount API.
#[derive(Debug, Clone)]
pub struct GrpcMounter {
    inner: MountApiClient,
}

impl GrpcMounter {
    /// Create a mounter for the versioned filesystem service at `addr`.
    pub fn connect(addr: &str) -> Result<Self, MountError> {
        info!(addr = %addr, "Using versioned filesystem service");
        let channel = lazy_channel(addr).map_err(MountError::Connect)?;
        Ok(Self {
            inner: MountApiClient::new(channel),
        })
    }
}

#[async_trait]
impl Mounter for GrpcMounter {
    async fn mount(
        &self,
        root: &Path,
        shard: u64,
        mounts: &[CommitMount],
        ready: oneshot::Sender<()>,
    ) -> Result<(), MountError> {
        let root_str = root.display().to_string();
        let request = MountRequest {
            root: root_str.clone(),
            shard,
            mounts: mounts.iter().map(pb::CommitMount::from).collect(),
        };

        let mut client = self.inner.clone();
        let mut events = client
            .mount(request)
            .await
            .map_err(|status| MountError::Establish {
                root: root_str.clone(),
                reason: status.message().to_string(),
            })?
            .into_inner();

        serve_events(&root_str, events, ready).await
    }

    async fn unmount(&self, root: &Path) -> Result<(), UnmountError> {
        let root_str = root.display().to_string();
        let mut client = self.inner.clone();
        client
            .unmount(UnmountRequest {
                root: root_str.clone(),
            })
            .await
            .map_err(|status| unmount_error(&root_str, &status))?;
        Ok(())
    }
}

/// Follow a mount's event stream until it ends.
///
/// Fires `ready` on the first `READY` event. A stream error before that is
/// an establish failure, after it a serving failure.
async fn serve_events<S>(
    root: &str,
    mut events: S,
    ready: oneshot::Sender<()>,
) -> Result<(), MountError>
where
    S: Stream<Item = Result<MountEvent, Status>> + Unpin,
{
    let mut ready = Some(ready);
    while let Some(event) = events.next().await {
        match event {
            Ok(event) => {
                if event.state() == MountState::Ready {
                    if let Some(tx) = ready.take() {
                        debug!(root = %root, "Mount reported ready");
                        let _ = tx.send(());
                    }
                }
            }
            Err(status) => {
                let root = root.to_string();
                let reason = status.message().to_string();
                return Err(if ready.is_some() {
                    MountError::Establish { root, reason }
                } else {
                    MountError::Serving { root, reason }
                });
            }
        }
    }

    debug!(root = %root, "Mount stream closed");
    Ok(())
}

fn unmount_error(root: &str, status: &Status) -> UnmountError {
    match status.code() {
        Code::FailedPrecondition | Code::ResourceExhausted => UnmountError::Busy(root.to_string()),
        Code::NotFound | Code::InvalidArgument => UnmountError::NotMounted(root.to_string()),
        _ => UnmountError::Failed {
            root: root.to_string(),
            reason: status.message().to_string(),
        },
    }
}

/// Establishes mounts at a fixed root.
#[derive(Clone)]
pub struct MountCoordinator {
    mounter: Arc<dyn Mounter>,
    root: PathBuf,
    unmount_grace: Duration,
}

impl MountCoordinator {
    pub fn new(mounter: Arc<dyn Mounter>, root: impl Into<PathBuf>) -> Self {
        Self {
            mounter,
            root: root.into(),
            unmount_grace: DEFAULT_UNMOUNT_GRACE,
        }
    }

    /// Set how long the serving task may take to stop after unmount.
    pub fn with_unmount_grace(mut self, grace: Duration) -> Self {
        self.unmount_grace = grace;
        self
    }

    /// Start mounting in the background and wait until the root is usable.
    ///
    /// The serving task keeps running after this returns. If it ends before
    /// signaling readiness, the root is unmounted best-effort and the failure
    /// returned.
    pub async fn establish(
        &self,
        shard: u64,
        mounts: Vec<CommitMount>,
    ) -> Result<MountSession, MountError> {
        info!(
            root = %self.root.display(),
            shard = shard,
            mounts = mounts.len(),
            "Establishing mount"
        );

        let (ready_tx, ready_rx) = oneshot::channel();
        let mounter = self.mounter.clone();
        let root = self.root.clone();
        let mut serving =
            tokio::spawn(async move { mounter.mount(&root, shard, &mounts, ready_tx).await });

        if ready_rx.await.is_ok() {
            info!(root = %self.root.display(), "Mount ready");
            return Ok(MountSession {
                mounter: self.mounter.clone(),
                root: self.root.clone(),
                serving: Some(serving),
                unmount_grace: self.unmount_grace,
                torn_down: false,
            });
        }

        let err = match tokio::time::timeout(self.unmount_grace, &mut serving).await {
            Ok(joined) => serving_failure(&self.root, joined, false),
            Err(_) => {
                serving.abort();
                MountError::NeverReady(self.root.display().to_string())
            }
        };
        if let Err(e) = self.mounter.unmount(&self.root).await {
            debug!(error = %e, "Unmount after failed mount");
        }
        Err(err)
    }
}

/// Turn the end of a serving task into the error it represents.
fn serving_failure(
    root: &Path,
    joined: Result<Result<(), MountError>, JoinError>,
    was_ready: bool,
) -> MountError {
    let root = root.display().to_string();
    match joined {
        Ok(Err(e)) => e,
        Ok(Ok(())) if was_ready => MountError::Stopped(root),
        Ok(Ok(())) => MountError::NeverReady(root),
        Err(e) => MountError::Aborted {
            root,
            reason: e.to_string(),
        },
    }
}

/// A mounted root, held until [`teardown`](Self::teardown).
///
/// A session dropped without teardown (unwinding, cancellation) logs a
/// warning and unmounts in the background.
pub struct MountSession {
    mounter: Arc<dyn Mounter>,
    root: PathBuf,
    serving: Option<JoinHandle<Result<(), MountError>>>,
    unmount_grace: Duration,
    torn_down: bool,
}

impl MountSession {
    /// Drive `work` to completion while the mount keeps serving.
    ///
    /// If the serving task ends first, `work` is dropped and the mount
    /// failure returned.
    pub async fn run<F: Future>(&mut self, work: F) -> Result<F::Output, MountError> {
        let Some(serving) = self.serving.as_mut() else {
            return Err(MountError::Stopped(self.root.display().to_string()));
        };

        let finished = tokio::select! {
            biased;
            joined = serving => Err(joined),
            output = work => Ok(output),
        };

        match finished {
            Ok(output) => Ok(output),
            Err(joined) => {
                self.serving = None;
                let err = serving_failure(&self.root, joined, true);
                debug!(root = %self.root.display(), error = %err, "Mount failed while in use");
                Err(err)
            }
        }
    }

    /// Unmount the root and let the serving task wind down.
    pub async fn teardown(mut self) -> Result<(), UnmountError> {
        self.torn_down = true;
        info!(root = %self.root.display(), "Unmounting");
        let result = self.mounter.unmount(&self.root).await;

        if let Some(mut serving) = self.serving.take() {
            match tokio::time::timeout(self.unmount_grace, &mut serving).await {
                Ok(Ok(Ok(()))) => debug!("Mount task finished"),
                Ok(Ok(Err(e))) => debug!(error = %e, "Mount task ended with error after unmount"),
                Ok(Err(e)) => warn!(error = %e, "Mount task aborted"),
                Err(_) => {
                    warn!(
                        grace_secs = self.unmount_grace.as_secs(),
                        "Mount task still running after unmount, aborting"
                    );
                    serving.abort();
                }
            }
        }

        result
    }
}

impl Drop for MountSession {
    fn drop(&mut self) {
        if self.torn_down {
            return;
        }
        warn!(root = %self.root.display(), "Mount session dropped without teardown");

        let mounter = self.mounter.clone();
        let root = self.root.clone();
        let serving = self.serving.take();
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                if let Err(e) = mounter.unmount(&root).await {
                    warn!(error = %e, "Background unmount failed");
                }
                if let Some(serving) = serving {
                    serving.abort();
                }
            });
        }
    }
}
