//! gRPC code and converters for the job shim.
//!
//! This crate contains:
//! - Protobuf message types for the job control (`pps.v1`) and versioned
//!   filesystem mount (`pfs.v1`) services
//! - gRPC client stubs for both services
//! - Converters between proto types and domain types
//!
//! Messages are declared with `prost` derives rather than generated at build
//! time, so no `protoc` is required.

pub mod convert;
mod pfs;
mod pps;

/// Protobuf types and service clients.
pub mod pb {
    pub use crate::pfs::*;
    pub use crate::pps::*;
}

// Re-export commonly used types
pub use pb::mount_api_client::MountApiClient;
pub use pb::job_api_client::JobApiClient;
