//! Work allocation types handed out by the control plane.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::JobId;

/// Alias under which the output commit is always mounted.
pub const OUTPUT_ALIAS: &str = "out";

/// An immutable, addressable data version in a repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Commit {
    /// Repository the commit belongs to.
    pub repo: String,

    /// Commit identifier within the repository.
    pub id: String,
}

impl Commit {
    /// Create a new Commit.
    pub fn new(repo: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for Commit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.repo, self.id)
    }
}

/// A commit exposed under the mount root, optionally renamed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitMount {
    pub commit: Commit,
    pub alias: Option<String>,
}

impl CommitMount {
    /// Mount a commit under its natural identity.
    pub fn new(commit: Commit) -> Self {
        Self {
            commit,
            alias: None,
        }
    }

    /// Mount a commit under the given alias.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Directory name of this mount below the mount root.
    ///
    /// Unaliased commits appear under their repository name.
    pub fn mount_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.commit.repo)
    }
}

/// The user-defined work of a job.
///
/// `cmd[0]` is the executable and the remainder its arguments. Content is
/// untrusted: it comes verbatim from the control plane.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transform {
    pub cmd: Vec<String>,
    pub stdin: String,
}

impl Transform {
    /// Create a new Transform from a command vector.
    pub fn new<I, S>(cmd: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cmd: cmd.into_iter().map(Into::into).collect(),
            stdin: String::new(),
        }
    }

    /// Builder method to set the standard input payload.
    pub fn with_stdin(mut self, stdin: impl Into<String>) -> Self {
        self.stdin = stdin.into();
        self
    }

    /// Executable to launch, if the command is non-empty.
    pub fn program(&self) -> Option<&str> {
        self.cmd.first().map(String::as_str)
    }

    /// Arguments following the executable.
    pub fn args(&self) -> &[String] {
        self.cmd.get(1..).unwrap_or_default()
    }
}

/// A unit of work allocated to this coordinator for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkAllocation {
    /// Input data versions, mounted read-only.
    pub inputs: Vec<Commit>,

    /// Output data version, mounted writable under [`OUTPUT_ALIAS`].
    pub output: Commit,

    /// Shard of the input this run is responsible for.
    pub shard: u64,

    /// What to execute against the mounted view.
    pub transform: Transform,
}

impl WorkAllocation {
    /// Derive the commit mounts for this allocation: every input under its
    /// natural identity followed by the output under `out`.
    pub fn commit_mounts(&self) -> Vec<CommitMount> {
        self.inputs
            .iter()
            .cloned()
            .map(CommitMount::new)
            .chain(std::iter::once(
                CommitMount::new(self.output.clone()).with_alias(OUTPUT_ALIAS),
            ))
            .collect()
    }
}

/// Terminal verdict of a run, sent to the control plane exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionReport {
    pub job_id: JobId,
    pub shard: u64,
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allocation() -> WorkAllocation {
        WorkAllocation {
            inputs: vec![Commit::new("images", "v1"), Commit::new("labels", "v7")],
            output: Commit::new("results", "v2"),
            shard: 3,
            transform: Transform::new(["/bin/echo", "hi"]),
        }
    }

    #[test]
    fn test_commit_mounts_inputs_then_output() {
        let mounts = allocation().commit_mounts();
        let names: Vec<&str> = mounts.iter().map(CommitMount::mount_name).collect();
        assert_eq!(names, vec!["images", "labels", "out"]);
        assert!(mounts[0].alias.is_none());
        assert_eq!(mounts[2].commit, Commit::new("results", "v2"));
    }

    #[test]
    fn test_commit_mounts_without_inputs() {
        let mut alloc = allocation();
        alloc.inputs.clear();
        let mounts = alloc.commit_mounts();
        assert_eq!(mounts.len(), 1);
        assert_eq!(mounts[0].alias.as_deref(), Some(OUTPUT_ALIAS));
    }

    #[test]
    fn test_transform_program_and_args() {
        let transform = Transform::new(["/bin/echo", "hi", "there"]).with_stdin("x");
        assert_eq!(transform.program(), Some("/bin/echo"));
        assert_eq!(transform.args(), ["hi".to_string(), "there".to_string()]);
        assert_eq!(transform.stdin, "x");

        let empty = Transform::default();
        assert_eq!(empty.program(), None);
        assert!(empty.args().is_empty());
    }

    #[test]
    fn test_commit_display() {
        assert_eq!(Commit::new("repo", "abc").to_string(), "repo/abc");
    }
}
