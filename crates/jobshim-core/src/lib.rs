//! Job Shim Core Domain Types
//!
//! This crate contains pure domain types with no dependencies on:
//! - Network/gRPC
//! - Filesystem mounting
//! - Runtime specifics
//!
//! Everything the coordinator hands between its components lives here.

pub mod allocation;
pub mod error;
pub mod ids;
pub mod state;

// Re-export commonly used types
pub use allocation::{
    Commit, CommitMount, CompletionReport, Transform, WorkAllocation, OUTPUT_ALIAS,
};
pub use error::{
    AllocationError, CoordinatorError, MountError, ReportError, TransformError, UnmountError,
};
pub use ids::JobId;
pub use state::JobState;
