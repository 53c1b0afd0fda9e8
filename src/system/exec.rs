//! Subprocess execution.
//!
//! # Responsibilities
//! - Run a program with arguments and capture its output
//! - Enforce a deadline on every call
//! - Turn non-zero exits into errors that carry stderr for diagnosis

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;

/// Captured output of a successful command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Errors produced while running a subprocess.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} did not finish within {}s", timeout.as_secs())]
    TimedOut { program: String, timeout: Duration },

    #[error("{program} exited with {}: {}", describe_status(status), stderr.trim())]
    NonZeroExit {
        program: String,
        status: Option<i32>,
        stderr: String,
    },
}

fn describe_status(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("status {code}"),
        None => "a signal".to_string(),
    }
}

/// Process-execution primitive.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, ExecError>;
}

/// Runs commands with `tokio::process`, killing them at the deadline.
#[derive(Debug, Clone)]
pub struct TokioCommandRunner {
    timeout: Duration,
}

impl TokioCommandRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, ExecError> {
        tracing::debug!(program, ?args, "Running command");

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ExecError::Spawn {
                program: program.to_string(),
                source,
            })?;

        // Dropping the future on timeout drops the child, which kills it.
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|source| ExecError::Spawn {
                program: program.to_string(),
                source,
            })?,
            Err(_) => {
                tracing::error!(program, timeout_secs = self.timeout.as_secs(), "Command timed out");
                return Err(ExecError::TimedOut {
                    program: program.to_string(),
                    timeout: self.timeout,
                });
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            return Err(ExecError::NonZeroExit {
                program: program.to_string(),
                status: output.status.code(),
                stderr,
            });
        }

        Ok(CommandOutput { stdout, stderr })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> Vec<String> {
        vec!["-c".to_string(), script.to_string()]
    }

    #[tokio::test]
    async fn test_captures_stdout() {
        let runner = TokioCommandRunner::new(Duration::from_secs(5));
        let out = runner.run("/bin/sh", &sh("echo ok")).await.unwrap();
        assert_eq!(out.stdout.trim(), "ok");
    }

    #[tokio::test]
    async fn test_non_zero_exit_carries_stderr() {
        let runner = TokioCommandRunner::new(Duration::from_secs(5));
        let err = runner
            .run("/bin/sh", &sh("echo broken >&2; exit 3"))
            .await
            .unwrap_err();
        match err {
            ExecError::NonZeroExit { status, stderr, .. } => {
                assert_eq!(status, Some(3));
                assert_eq!(stderr.trim(), "broken");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_hung_command_times_out() {
        let runner = TokioCommandRunner::new(Duration::from_millis(200));
        let err = runner.run("/bin/sh", &sh("sleep 30")).await.unwrap_err();
        assert!(matches!(err, ExecError::TimedOut { .. }));
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let runner = TokioCommandRunner::new(Duration::from_secs(1));
        let err = runner.run("/nonexistent/nginx", &[]).await.unwrap_err();
        assert!(matches!(err, ExecError::Spawn { .. }));
    }
}
