//! Lifecycle states of a single job run.

use serde::{Deserialize, Serialize};
use std::fmt;

/// State of the job coordinator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    /// Nothing requested yet.
    #[default]
    Idle,
    /// Work allocated by the control plane.
    Allocated,
    /// Mount setup started, readiness not yet signaled.
    Mounting,
    /// Mount usable.
    Ready,
    /// Transform process running.
    Running,
    /// Mount being torn down.
    Unmounting,
    /// Completion report being delivered.
    Reported,
    /// Report accepted.
    Done,
    /// Unrecoverable failure.
    Fatal,
}

impl JobState {
    /// Returns true if `next` is a legal successor of this state.
    pub fn can_transition_to(&self, next: JobState) -> bool {
        use JobState::*;
        match (self, next) {
            (Idle, Allocated)
            | (Allocated, Mounting)
            | (Mounting, Ready)
            | (Ready, Running)
            | (Running, Unmounting)
            | (Unmounting, Reported)
            | (Reported, Done) => true,
            // A late mount failure aborts the run from Running or Unmounting.
            (Idle | Allocated | Mounting | Running | Unmounting | Reported, Fatal) => true,
            _ => false,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Allocated => "allocated",
            Self::Mounting => "mounting",
            Self::Ready => "ready",
            Self::Running => "running",
            Self::Unmounting => "unmounting",
            Self::Reported => "reported",
            Self::Done => "done",
            Self::Fatal => "fatal",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
