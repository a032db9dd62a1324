//! Control plane client.

use async_trait::async_trait;
use tonic::transport::Channel;
use tonic::{Code, Status};
use tracing::{debug, info};

use jobshim_core::{AllocationError, CompletionReport, JobId, ReportError, WorkAllocation};
use jobshim_proto::pb::{FinishJobRequest, StartJobRequest};
use jobshim_proto::JobApiClient;

/// The job control service as seen by the coordinator.
///
/// Both calls are attempted exactly once; retrying is the control plane's
/// business.
#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// Claim the work allocated to `job_id`. Not idempotent: a successful call
    /// consumes the allocation.
    async fn allocate_work(&self, job_id: &JobId) -> Result<WorkAllocation, AllocationError>;

    /// Deliver the verdict of the run.
    async fn report_completion(&self, report: &CompletionReport) -> Result<(), ReportError>;
}

/// Build a lazily connecting channel to `addr`.
///
/// Connection failures surface on the first call made over the channel.
pub fn lazy_channel(addr: &str) -> Result<Channel, String> {
    let endpoint = Channel::from_shared(endpoint_uri(addr))
        .map_err(|e| format!("invalid address '{}': {}", addr, e))?;
    Ok(endpoint.connect_lazy())
}

/// Prefix a bare `host:port` with `http://`.
pub fn endpoint_uri(addr: &str) -> String {
    if addr.contains("://") {
        addr.to_string()
    } else {
        format!("http://{}", addr)
    }
}

fn is_unreachable(status: &Status) -> bool {
    matches!(status.code(), Code::Unavailable | Code::DeadlineExceeded)
}

/// [`ControlPlane`] over gRPC.
#[derive(Debug, Clone)]
pub struct GrpcControlPlane {
    inner: JobApiClient,
}

impl GrpcControlPlane {
    /// Create a client for the job control service at `addr`.
    pub fn connect(addr: &str) -> Result<Self, AllocationError> {
        info!(addr = %addr, "Using job control service");
        let channel = lazy_channel(addr).map_err(AllocationError::Unavailable)?;
        Ok(Self {
            inner: JobApiClient::new(channel),
        })
    }
}

#[async_trait]
impl ControlPlane for GrpcControlPlane {
    async fn allocate_work(&self, job_id: &JobId) -> Result<WorkAllocation, AllocationError> {
        let mut client = self.inner.clone();
        let request = StartJobRequest::from(job_id);

        let response = client.start_job(request).await.map_err(|status| {
            if is_unreachable(&status) {
                AllocationError::Unavailable(status.message().to_string())
            } else {
                AllocationError::Rejected {
                    job_id: job_id.to_string(),
                    reason: status.message().to_string(),
                }
            }
        })?;

        debug!(job_id = %job_id, "StartJob succeeded");
        WorkAllocation::try_from(response.into_inner())
    }

    async fn report_completion(&self, report: &CompletionReport) -> Result<(), ReportError> {
        let mut client = self.inner.clone();
        let request = FinishJobRequest::from(report);

        client.finish_job(request).await.map_err(|status| {
            if is_unreachable(&status) {
                ReportError::Unavailable(status.message().to_string())
            } else {
                ReportError::Rejected {
                    job_id: report.job_id.to_string(),
                    reason: status.message().to_string(),
                }
            }
        })?;

        debug!(job_id = %report.job_id, "FinishJob succeeded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_uri() {
        assert_eq!(endpoint_uri("0.0.0.0:651"), "http://0.0.0.0:651");
        assert_eq!(endpoint_uri("https://pps:651"), "https://pps:651");
    }

    #[test]
    fn test_unreachable_codes() {
        assert!(is_unreachable(&Status::unavailable("down")));
        assert!(is_unreachable(&Status::deadline_exceeded("slow")));
        assert!(!is_unreachable(&Status::not_found("no such job")));
    }

    #[tokio::test]
    async fn test_connect_rejects_invalid_address() {
        let err = GrpcControlPlane::connect("not a uri").unwrap_err();
        assert!(matches!(err, AllocationError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_unreachable_control_plane_is_allocation_error() {
        // Nothing listens on port 1.
        let client = GrpcControlPlane::connect("127.0.0.1:1").unwrap();
        let result = client.allocate_work(&JobId::new("job-42")).await;
        assert!(result.is_err());
    }
}
