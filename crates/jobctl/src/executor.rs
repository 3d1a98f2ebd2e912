//! Command execution
//!
//! Every cluster query goes through [`CommandExecutor`], so the job operations
//! can be exercised without a live cluster.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Exit code and captured stdout of a finished command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub code: i32,
    pub stdout: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run a command and capture its stdout.
    async fn run_for_value(&self, command: &str, purpose: &str) -> crate::Result<CommandOutput>;

    /// Run a command with its output streamed to the operator and return the
    /// exit code.
    async fn run_with_updates(&self, command: &str, purpose: &str) -> crate::Result<i32>;
}

/// Runs command lines through `sh -c`.
#[derive(Debug, Clone)]
pub struct ShellExecutor {
    progress_interval: Duration,
}

impl ShellExecutor {
    pub fn new() -> Self {
        Self {
            progress_interval: Duration::from_secs(1),
        }
    }

    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }

    fn shell(command: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command).stdin(Stdio::null());
        cmd
    }
}

impl Default for ShellExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandExecutor for ShellExecutor {
    async fn run_for_value(&self, command: &str, purpose: &str) -> crate::Result<CommandOutput> {
        debug!("Task: `{}` is implemented by `{}`", purpose, command);

        let output = Self::shell(command)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        let code = exit_code(output.status);
        if code != 0 {
            warn!(
                "Task: `{}` terminated with code `{}`: {}",
                purpose,
                code,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(CommandOutput {
            code,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }

    async fn run_with_updates(&self, command: &str, purpose: &str) -> crate::Result<i32> {
        debug!("Task: `{}` is implemented by `{}`", purpose, command);

        let mut child = Self::shell(command)
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()?;

        let started = Instant::now();
        let mut ticker = tokio::time::interval(self.progress_interval);
        // The first tick fires immediately.
        ticker.tick().await;

        let status = loop {
            tokio::select! {
                status = child.wait() => break status?,
                _ = ticker.tick() => {
                    debug!(
                        "Waiting for `{}`, for {} seconds",
                        purpose,
                        started.elapsed().as_secs()
                    );
                }
            }
        };

        let code = exit_code(status);
        if code == 0 {
            info!("Task: `{}` succeeded", purpose);
        } else {
            warn!("Task: `{}` terminated with code `{}`", purpose, code);
        }
        Ok(code)
    }
}

fn exit_code(status: ExitStatus) -> i32 {
    // No code means the process was killed by a signal.
    status.code().unwrap_or(1)
}
