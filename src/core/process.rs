//! Process execution utilities with timeout support
//!
//! Helpers for running external processes (ffmpeg, ffprobe) with a deadline so
//! a hung encoder cannot hold a transcode slot forever.

use std::process::Output;
use std::time::Duration;
use tokio::process::Command;

/// Default timeout for ffprobe metadata queries (30 seconds)
pub const FFPROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// Failure modes of [`run_with_timeout`]
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("failed to run process: {0}")]
    Io(#[from] std::io::Error),

    #[error("process timed out after {0}s")]
    TimedOut(u64),
}

/// Run an async Command with a timeout.
///
/// The child is spawned with `kill_on_drop`, so on timeout the process is
/// killed when the pending future is dropped.
pub async fn run_with_timeout(cmd: &mut Command, timeout: Duration) -> Result<Output, ProcessError> {
    cmd.kill_on_drop(true);
    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) => Err(ProcessError::Io(e)),
        Err(_) => Err(ProcessError::TimedOut(timeout.as_secs())),
    }
}

/// Check whether a binary can be executed (`<bin> -version` exits successfully)
pub async fn binary_available(bin: &str) -> bool {
    let mut cmd = Command::new(bin);
    cmd.arg("-version");
    matches!(run_with_timeout(&mut cmd, FFPROBE_TIMEOUT).await, Ok(out) if out.status.success())
}
