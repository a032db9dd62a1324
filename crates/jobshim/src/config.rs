//! Coordinator configuration.
//!
//! Parsed once at startup from arguments and the environment; nothing below
//! this module reads the process environment.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, ValueEnum};

/// Job shim - coordinates with the job control service to mount a job's
/// commits and run its transform.
#[derive(Debug, Clone, Parser)]
#[command(name = "job-shim")]
#[command(about = "Runs one job shard: mount its commits, run its transform, report the result", long_about = None)]
pub struct Config {
    /// Job ID to run
    pub job_id: String,

    #[command(flatten)]
    pub services: ServiceEnv,

    /// Directory the commits are mounted under
    #[arg(long, env = "JOB_SHIM_MOUNT_ROOT", default_value = "/pfs")]
    pub mount_root: PathBuf,

    /// Seconds to wait for the mount to stop serving after unmount
    #[arg(long, default_value_t = 5)]
    pub unmount_grace_secs: u64,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl Config {
    pub fn unmount_grace(&self) -> Duration {
        Duration::from_secs(self.unmount_grace_secs)
    }
}

/// Address inputs for the two backing services, in the form the container
/// environment provides them.
#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct ServiceEnv {
    /// Injected host of the versioned filesystem service
    #[arg(long, env = "PFSD_PORT_650_TCP_ADDR", hide = true)]
    pub pfsd_host: Option<String>,

    /// Injected connection string of the versioned filesystem service
    #[arg(long, env = "PACHYDERM_PFSD_1_PORT", hide = true)]
    pub pfsd_connection: Option<String>,

    /// Versioned filesystem service address
    #[arg(long, env = "PFS_ADDRESS", default_value = DEFAULT_PFS_ADDRESS)]
    pub pfs_address: String,

    /// Injected host of the job control service
    #[arg(long, env = "PPSD_PORT_651_TCP_ADDR", hide = true)]
    pub ppsd_host: Option<String>,

    /// Injected connection string of the job control service
    #[arg(long, env = "PACHYDERM_PPSD_1_PORT", hide = true)]
    pub ppsd_connection: Option<String>,

    /// Job control service address
    #[arg(long, env = "PPS_ADDRESS", default_value = DEFAULT_PPS_ADDRESS)]
    pub pps_address: String,
}

pub const DEFAULT_PFS_ADDRESS: &str = "0.0.0.0:650";
pub const DEFAULT_PPS_ADDRESS: &str = "0.0.0.0:651";

impl Default for ServiceEnv {
    fn default() -> Self {
        Self {
            pfsd_host: None,
            pfsd_connection: None,
            pfs_address: DEFAULT_PFS_ADDRESS.to_string(),
            ppsd_host: None,
            ppsd_connection: None,
            pps_address: DEFAULT_PPS_ADDRESS.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}
