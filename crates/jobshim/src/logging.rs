//! Tracing subscriber setup.

use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::config::LogFormat;

/// Install the global subscriber.
///
/// Logs always go to stderr; stdout belongs to the transform. The filter
/// comes from `RUST_LOG` and defaults to `info`.
pub fn init(format: LogFormat) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => tracing::subscriber::set_global_default(builder.finish())?,
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish())?,
    }
    Ok(())
}
