//! External fallback text reader (`wl-paste`).
//!
//! Some compositors never tell a regular client that the selection changed,
//! and some don't hand it the contents either. Polling through `wl-paste`
//! sidesteps both. Every invocation is bounded by a timeout; a timeout, a
//! spawn failure or a non-zero exit all mean "no data".

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use crate::models::ClipboardSlot;

#[derive(Debug, thiserror::Error)]
pub enum FallbackError {
    #[error("reader did not finish within {0:?}")]
    Timeout(Duration),

    #[error("failed to start reader: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("reader exited with {0}")]
    Exit(std::process::ExitStatus),
}

/// Reads text through some external program.
#[async_trait]
pub trait FallbackReader: Send + Sync {
    async fn read(&self, args: &[&str], timeout: Duration) -> Result<String, FallbackError>;
}

/// Arguments asking the reader for `slot`.
pub fn reader_args(slot: ClipboardSlot) -> &'static [&'static str] {
    match slot {
        ClipboardSlot::Clipboard => &["--no-newline"],
        ClipboardSlot::Selection => &["--primary", "--no-newline"],
    }
}

/// Runs `wl-paste`.
#[derive(Debug, Clone)]
pub struct WlPasteReader {
    program: String,
}

impl Default for WlPasteReader {
    fn default() -> Self {
        Self {
            program: "wl-paste".to_string(),
        }
    }
}

impl WlPasteReader {
    /// Use a different program with the same calling convention.
    #[cfg(test)]
    pub fn with_program(program: &str) -> Self {
        Self {
            program: program.to_string(),
        }
    }
}

#[async_trait]
impl FallbackReader for WlPasteReader {
    async fn read(&self, args: &[&str], timeout: Duration) -> Result<String, FallbackError> {
        let child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        // Dropping the future on timeout drops the child, which kills it.
        let output = tokio::time::timeout(timeout, child.wait_with_output())
            .await
            .map_err(|_| FallbackError::Timeout(timeout))??;

        if !output.status.success() {
            return Err(FallbackError::Exit(output.status));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
