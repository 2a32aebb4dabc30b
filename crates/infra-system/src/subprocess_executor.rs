// Subprocess executor
// reason: tokio::process for async spawn, kill_on_drop for timeout cleanup
use async_trait::async_trait;
use std::io::ErrorKind;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use nettune_core::port::{
    CommandExecutor, CommandOutput, CommandSpec, ExecutionError, TimeProvider,
};

/// Environment variables passed through to child processes
pub const DEFAULT_ENV_ALLOWLIST: &[&str] = &[
    "PATH", "SystemRoot", "SYSTEMROOT", "windir", "ComSpec", "PATHEXT", "TEMP", "TMP", "LANG",
    "LC_ALL", "HOME", "USER",
];

/// Runs one program per call as an argument vector, never through a shell
///
/// The child starts from an empty environment plus the allowlisted variables
/// of the current process. A child outliving its timeout is killed.
pub struct SubprocessExecutor {
    time_provider: Arc<dyn TimeProvider>,
    env_allowlist: Vec<String>,
}

impl SubprocessExecutor {
    /// # Example
    /// ```ignore
    /// let executor = SubprocessExecutor::new(
    ///     Arc::new(SystemTimeProvider),
    ///     vec!["PATH".to_string(), "HOME".to_string()],
    /// );
    /// ```
    pub fn new(time_provider: Arc<dyn TimeProvider>, env_allowlist: Vec<String>) -> Self {
        Self {
            time_provider,
            env_allowlist,
        }
    }

    pub fn with_default_env(time_provider: Arc<dyn TimeProvider>) -> Self {
        Self::new(
            time_provider,
            DEFAULT_ENV_ALLOWLIST.iter().map(|s| s.to_string()).collect(),
        )
    }

    /// Allowlisted variables present in the current environment
    fn filtered_env(&self) -> Vec<(String, String)> {
        std::env::vars()
            .filter(|(k, _)| self.env_allowlist.contains(k))
            .collect()
    }

    fn spawn_error(command: &CommandSpec, error: std::io::Error) -> ExecutionError {
        match error.kind() {
            ErrorKind::NotFound => ExecutionError::NotFound(command.program.clone()),
            ErrorKind::PermissionDenied => ExecutionError::PermissionDenied(command.to_string()),
            _ => ExecutionError::Io(format!("{}: {}", command.program, error)),
        }
    }
}

#[async_trait]
impl CommandExecutor for SubprocessExecutor {
    async fn execute(
        &self,
        command: &CommandSpec,
        limit: Duration,
    ) -> Result<CommandOutput, ExecutionError> {
        let start_time = self.time_provider.now_millis();
        debug!(command = %command, timeout_ms = limit.as_millis() as u64, "Spawning command");

        let child = Command::new(&command.program)
            .args(&command.args)
            .env_clear()
            .envs(self.filtered_env())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Self::spawn_error(command, e))?;

        match timeout(limit, child.wait_with_output()).await {
            Ok(Ok(output)) => {
                let duration_ms = self.time_provider.now_millis() - start_time;
                let result = CommandOutput {
                    exit_code: output.status.code().unwrap_or(-1),
                    stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                    stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                    duration_ms,
                    timed_out: false,
                };
                debug!(
                    command = %command,
                    exit_code = result.exit_code,
                    duration_ms,
                    "Command finished"
                );
                Ok(result)
            }
            Ok(Err(e)) => Err(ExecutionError::Io(e.to_string())),
            // Dropping the wait future drops the child, which kills it
            Err(_) => {
                let timeout_ms = limit.as_millis() as u64;
                warn!(command = %command, timeout_ms, "Command timed out, killed");
                Err(ExecutionError::TimedOut {
                    command: command.to_string(),
                    timeout_ms,
                    output: CommandOutput {
                        exit_code: -1,
                        stdout: String::new(),
                        stderr: String::new(),
                        duration_ms: self.time_provider.now_millis() - start_time,
                        timed_out: true,
                    },
                })
            }
        }
    }
}
