//! Transform execution.
//!
//! Runs the user's command as a child process with its stdin fed from the
//! transform and its stdout/stderr streamed into caller-supplied sinks as the
//! bytes arrive. A failing transform is an ordinary outcome: it yields
//! `false` and a line on the error sink, never an error.

use std::io;
use std::process::Stdio;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::process::Command;
use tracing::{debug, info, warn};

use jobshim_core::{Transform, TransformError};

/// Executes transforms.
#[derive(Debug, Clone, Default)]
pub struct TransformRunner;

impl TransformRunner {
    pub fn new() -> Self {
        Self
    }

    /// Run `transform` to completion. Returns true iff it exited with status 0.
    pub async fn run<O, E>(&self, transform: &Transform, stdout: &mut O, stderr: &mut E) -> bool
    where
        O: AsyncWrite + Unpin,
        E: AsyncWrite + Unpin,
    {
        match self.execute(transform, stdout, stderr).await {
            Ok(()) => {
                info!("Transform succeeded");
                true
            }
            Err(e) => {
                warn!(error = %e, "Transform failed");
                let line = format!("{}\n", e);
                if let Err(write_err) = stderr.write_all(line.as_bytes()).await {
                    debug!(error = %write_err, "Could not write transform failure to error sink");
                }
                if let Err(flush_err) = stderr.flush().await {
                    debug!(error = %flush_err, "Could not flush error sink");
                }
                false
            }
        }
    }

    async fn execute<O, E>(
        &self,
        transform: &Transform,
        stdout: &mut O,
        stderr: &mut E,
    ) -> Result<(), TransformError>
    where
        O: AsyncWrite + Unpin,
        E: AsyncWrite + Unpin,
    {
        let program = transform.program().ok_or(TransformError::EmptyCommand)?;

        let mut cmd = Command::new(program);
        cmd.args(transform.args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        info!(
            program = %program,
            args = transform.args().len(),
            stdin_len = transform.stdin.len(),
            "Launching transform"
        );

        let mut child = cmd.spawn().map_err(|source| TransformError::Spawn {
            program: program.to_string(),
            source,
        })?;

        let stdin = child.stdin.take();
        let mut child_stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::other("child stdout not captured"))?;
        let mut child_stderr = child
            .stderr
            .take()
            .ok_or_else(|| io::Error::other("child stderr not captured"))?;

        // Feed stdin while draining output so neither side blocks the other.
        let feed = async move {
            let Some(mut stdin) = stdin else {
                return Ok(());
            };
            match stdin.write_all(transform.stdin.as_bytes()).await {
                // The child is free to exit without reading its input.
                Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
                other => other,
            }
        };

        // Each reader is dropped as soon as its copy ends, so a failing sink
        // closes the pipe and the child sees EPIPE instead of blocking on it.
        let drain_out = async move { tokio::io::copy(&mut child_stdout, stdout).await };
        let drain_err = async move { tokio::io::copy(&mut child_stderr, stderr).await };

        let (fed, out, err) = tokio::join!(feed, drain_out, drain_err);
        let status = child.wait().await?;
        fed?;
        let out_bytes = out?;
        let err_bytes = err?;

        debug!(
            stdout_bytes = out_bytes,
            stderr_bytes = err_bytes,
            "Transform output drained"
        );

        let exit_code = status.code();
        info!(exit_code = ?exit_code, success = status.success(), "Transform exited");

        if status.success() {
            Ok(())
        } else {
            match exit_code {
                Some(code) => Err(TransformError::ExitStatus(code)),
                None => Err(TransformError::Signaled),
            }
        }
    }
}
