//! Shell command execution for the screenshot pipeline.

use std::future::Future;
use std::process::Stdio;
use std::time::Duration;

use log::{debug, warn};
use tokio::process::Command;

/// Exit status and captured streams of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when the command was killed or never ran
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

/// Runs a shell command line.
///
/// Failures are reported through the returned output, never as an error:
/// callers pass stdout and stderr on to the agent.
pub trait CommandRunner: Send + Sync {
    fn run(&self, command: &str) -> impl Future<Output = CommandOutput> + Send;
}

/// `sh -c` runner with a timeout
#[derive(Debug, Clone)]
pub struct ShellRunner {
    timeout: Duration,
}

impl ShellRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new(Duration::from_secs(120))
    }
}

impl CommandRunner for ShellRunner {
    async fn run(&self, command: &str) -> CommandOutput {
        debug!("Running: {}", command);
        let child = Command::new("sh")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, child).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                warn!("Failed to execute {:?}: {}", command, e);
                return CommandOutput {
                    status: None,
                    stdout: String::new(),
                    stderr: format!("failed to execute command: {}", e),
                };
            }
            Err(_) => {
                warn!("Command {:?} timed out after {:?}", command, self.timeout);
                return CommandOutput {
                    status: None,
                    stdout: String::new(),
                    stderr: format!("command timed out after {} seconds", self.timeout.as_secs()),
                };
            }
        };

        let result = CommandOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        if !result.success() {
            warn!("Command {:?} exited with {:?}: {}", command, result.status, result.stderr.trim());
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_stdout_and_stderr() {
        let out = ShellRunner::default().run("echo hello; echo oops >&2").await;
        assert!(out.success());
        assert_eq!(out.stdout, "hello\n");
        assert_eq!(out.stderr, "oops\n");
    }

    #[tokio::test]
    async fn nonzero_exit_is_not_an_error() {
        let out = ShellRunner::default().run("echo bad >&2; exit 3").await;
        assert_eq!(out.status, Some(3));
        assert!(!out.success());
        assert_eq!(out.stderr, "bad\n");
    }

    #[tokio::test]
    async fn timeout_reports_in_stderr() {
        let out = ShellRunner::new(Duration::from_millis(50)).run("sleep 5").await;
        assert_eq!(out.status, None);
        assert!(out.stderr.contains("timed out"));
    }
}
