//! Converters between proto types and domain types.

use crate::pb;
use jobshim_core::{
    AllocationError, Commit, CommitMount, CompletionReport, JobId, Transform, WorkAllocation,
};

// ============================================================================
// Commit conversions
// ============================================================================

impl From<&Commit> for pb::Commit {
    fn from(commit: &Commit) -> Self {
        pb::Commit {
            repo: Some(pb::Repo {
                name: commit.repo.clone(),
            }),
            id: commit.id.clone(),
        }
    }
}

impl From<pb::Commit> for Commit {
    fn from(proto: pb::Commit) -> Self {
        Commit {
            repo: proto.repo.map(|r| r.name).unwrap_or_default(),
            id: proto.id,
        }
    }
}

// ============================================================================
// CommitMount conversions
// ============================================================================

impl From<&CommitMount> for pb::CommitMount {
    fn from(mount: &CommitMount) -> Self {
        pb::CommitMount {
            commit: Some((&mount.commit).into()),
            alias: mount.alias.clone().unwrap_or_default(),
        }
    }
}

// ============================================================================
// Transform conversions
// ============================================================================

impl From<pb::Transform> for Transform {
    fn from(proto: pb::Transform) -> Self {
        Transform {
            cmd: proto.cmd,
            stdin: proto.stdin,
        }
    }
}

// ============================================================================
// Job request/response conversions
// ============================================================================

impl From<&JobId> for pb::Job {
    fn from(id: &JobId) -> Self {
        pb::Job {
            id: id.as_str().to_string(),
        }
    }
}

impl From<&JobId> for pb::StartJobRequest {
    fn from(id: &JobId) -> Self {
        pb::StartJobRequest {
            job: Some(id.into()),
        }
    }
}

impl TryFrom<pb::StartJobResponse> for WorkAllocation {
    type Error = AllocationError;

    fn try_from(proto: pb::StartJobResponse) -> Result<Self, Self::Error> {
        let output = proto
            .output_commit
            .ok_or(AllocationError::Malformed("output_commit"))?;
        let transform = proto
            .transform
            .ok_or(AllocationError::Malformed("transform"))?;

        Ok(WorkAllocation {
            inputs: proto.input_commits.into_iter().map(Into::into).collect(),
            output: output.into(),
            shard: proto.shard,
            transform: transform.into(),
        })
    }
}

impl From<&CompletionReport> for pb::FinishJobRequest {
    fn from(report: &CompletionReport) -> Self {
        pb::FinishJobRequest {
            job: Some((&report.job_id).into()),
            shard: report.shard,
            success: report.success,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pb_commit(repo: &str, id: &str) -> pb::Commit {
        pb::Commit {
            repo: Some(pb::Repo {
                name: repo.to_string(),
            }),
            id: id.to_string(),
        }
    }

    #[test]
    fn test_start_job_response_to_allocation() {
        let response = pb::StartJobResponse {
            input_commits: vec![pb_commit("images", "v1")],
            output_commit: Some(pb_commit("results", "v2")),
            shard: 4,
            transform: Some(pb::Transform {
                cmd: vec!["/bin/echo".to_string(), "hi".to_string()],
                stdin: "payload".to_string(),
            }),
        };

        let alloc = WorkAllocation::try_from(response).unwrap();
        assert_eq!(alloc.inputs, vec![Commit::new("images", "v1")]);
        assert_eq!(alloc.output, Commit::new("results", "v2"));
        assert_eq!(alloc.shard, 4);
        assert_eq!(alloc.transform.program(), Some("/bin/echo"));
        assert_eq!(alloc.transform.stdin, "payload");
    }

    #[test]
    fn test_missing_output_is_malformed() {
        let response = pb::StartJobResponse {
            transform: Some(pb::Transform::default()),
            ..Default::default()
        };
        let err = WorkAllocation::try_from(response).unwrap_err();
        assert!(matches!(err, AllocationError::Malformed("output_commit")));
    }

    #[test]
    fn test_missing_transform_is_malformed() {
        let response = pb::StartJobResponse {
            output_commit: Some(pb_commit("results", "v2")),
            ..Default::default()
        };
        let err = WorkAllocation::try_from(response).unwrap_err();
        assert!(matches!(err, AllocationError::Malformed("transform")));
    }

    #[test]
    fn test_commit_mount_alias() {
        let out = CommitMount::new(Commit::new("results", "v2")).with_alias("out");
        let proto: pb::CommitMount = (&out).into();
        assert_eq!(proto.alias, "out");

        let input = CommitMount::new(Commit::new("images", "v1"));
        let proto: pb::CommitMount = (&input).into();
        assert!(proto.alias.is_empty());
        assert_eq!(proto.commit.unwrap().repo.unwrap().name, "images");
    }

    #[test]
    fn test_completion_report_to_request() {
        let report = CompletionReport {
            job_id: JobId::new("job-42"),
            shard: 1,
            success: false,
        };
        let request: pb::FinishJobRequest = (&report).into();
        assert_eq!(request.job.unwrap().id, "job-42");
        assert_eq!(request.shard, 1);
        assert!(!request.success);
    }
}
