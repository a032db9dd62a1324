//! Job Shim binary

use std::process::ExitCode;

use clap::Parser;

use jobshim::{logging, Config};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    if let Err(e) = logging::init(config.log_format) {
        eprintln!("failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    // The transform's own verdict travels to the control plane; the exit code
    // only reflects whether coordination itself succeeded.
    match jobshim::run(config).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
