// Command Executor Port
// Abstraction for running one OS command with a timeout

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// A program and its argument vector
///
/// Commands are passed to the OS as an argument vector, never through a shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            if arg.contains(' ') {
                write!(f, " \"{}\"", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Captured result of a finished (or killed) command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Process exit code; -1 when killed or terminated by a signal
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: i64,
    pub timed_out: bool,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == 0
    }
}

/// Execution errors
///
/// A non-zero exit code is NOT an error; it is reported through
/// [`CommandOutput::exit_code`].
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Executable not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Process timeout after {timeout_ms}ms: {command}")]
    TimedOut {
        command: String,
        timeout_ms: u64,
        output: CommandOutput,
    },

    #[error("IO error: {0}")]
    Io(String),
}

/// Command Executor trait
///
/// Implementations:
/// - SubprocessExecutor: spawns the program as a child process
/// - SerializedExecutor: wraps another executor, one command in flight at a time
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run a command and capture its output
    ///
    /// # Errors
    /// - ExecutionError::NotFound if the program does not exist
    /// - ExecutionError::PermissionDenied if the program cannot be started
    /// - ExecutionError::TimedOut if execution exceeds `timeout` (the process is killed)
    async fn execute(
        &self,
        command: &CommandSpec,
        timeout: Duration,
    ) -> Result<CommandOutput, ExecutionError>;
}
