//! Resolution of backing service addresses.

use std::fmt;

use crate::config::ServiceEnv;

/// A backing service the coordinator talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    /// Versioned filesystem service.
    Pfs,
    /// Job control service.
    Pps,
}

impl Service {
    /// Port the service listens on when its host is injected.
    pub fn port(&self) -> u16 {
        match self {
            Self::Pfs => 650,
            Self::Pps => 651,
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pfs => f.write_str("pfs"),
            Self::Pps => f.write_str("pps"),
        }
    }
}

/// Resolves service addresses from an explicit snapshot of the environment.
///
/// Precedence per service: injected host, then injected connection string
/// (with its `tcp://` schema removed), then the configured address. Empty
/// values count as unset. Resolution never fails; an unusable address shows
/// up as a connection error in the client layer.
#[derive(Debug, Clone)]
pub struct ServiceLocator {
    env: ServiceEnv,
}

impl ServiceLocator {
    pub fn new(env: ServiceEnv) -> Self {
        Self { env }
    }

    /// Address of `service` as `host:port`.
    pub fn resolve(&self, service: Service) -> String {
        let (host, connection, fallback) = match service {
            Service::Pfs => (
                &self.env.pfsd_host,
                &self.env.pfsd_connection,
                &self.env.pfs_address,
            ),
            Service::Pps => (
                &self.env.ppsd_host,
                &self.env.ppsd_connection,
                &self.env.pps_address,
            ),
        };

        if let Some(host) = non_empty(host) {
            return format!("{}:{}", host, service.port());
        }
        if let Some(connection) = non_empty(connection) {
            return connection.replace("tcp://", "");
        }
        fallback.clone()
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
