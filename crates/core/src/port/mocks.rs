// In-memory fake host for testing (executor + probe + command table)
//
// Commands are encoded as `fakehost get|set|clear <key> ...` so the full
// apply/verify/rollback path runs without touching the real OS.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use super::command_executor::{CommandExecutor, CommandOutput, CommandSpec, ExecutionError};
use super::platform_commands::PlatformCommands;
use super::verification_probe::VerificationProbe;
use crate::domain::{ChangeTarget, ConfigValue, Observed, ValueKind};

/// Program name understood by [`FakeHost`]
pub const FAKE_PROGRAM: &str = "fakehost";

#[derive(Default)]
struct FakeState {
    values: HashMap<String, ConfigValue>,
    unavailable: HashSet<String>,
    /// One-shot: the next write to the key stores this value instead
    drift: HashMap<String, ConfigValue>,
    /// Writes exit with status 1 and change nothing
    failing: HashSet<String>,
    mutations: Vec<CommandSpec>,
    reads: usize,
}

impl FakeState {
    fn observe(&self, key: &str) -> Observed {
        if self.unavailable.contains(key) {
            return Observed::Unavailable;
        }
        match self.values.get(key) {
            Some(v) => Observed::Value(v.clone()),
            None => Observed::Unset,
        }
    }
}

/// Fake host configuration store with fault injection
#[derive(Default)]
pub struct FakeHost {
    state: Mutex<FakeState>,
    delay: Duration,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every executed command takes `delay`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn set(&self, target: &ChangeTarget, value: ConfigValue) {
        self.state.lock().unwrap().values.insert(target.key(), value);
    }

    /// Remove any stored value so the target reads as unset
    pub fn unset(&self, target: &ChangeTarget) {
        self.state.lock().unwrap().values.remove(&target.key());
    }

    /// Current value, without counting as a probe read
    pub fn value(&self, target: &ChangeTarget) -> Observed {
        self.state.lock().unwrap().observe(&target.key())
    }

    pub fn mark_unavailable(&self, target: &ChangeTarget) {
        self.state.lock().unwrap().unavailable.insert(target.key());
    }

    /// The next write to `target` stores `stored` instead of the requested value
    pub fn drift_next_write(&self, target: &ChangeTarget, stored: ConfigValue) {
        self.state.lock().unwrap().drift.insert(target.key(), stored);
    }

    pub fn fail_writes(&self, target: &ChangeTarget) {
        self.state.lock().unwrap().failing.insert(target.key());
    }

    pub fn mutations(&self) -> Vec<CommandSpec> {
        self.state.lock().unwrap().mutations.clone()
    }

    pub fn mutation_count(&self) -> usize {
        self.state.lock().unwrap().mutations.len()
    }

    pub fn read_count(&self) -> usize {
        self.state.lock().unwrap().reads
    }

    fn output(exit_code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> CommandOutput {
        CommandOutput {
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
            duration_ms: 0,
            timed_out: false,
        }
    }

    fn run(&self, args: &[String]) -> CommandOutput {
        let mut state = self.state.lock().unwrap();
        let args: Vec<&str> = args.iter().map(String::as_str).collect();

        match args.as_slice() {
            ["get", key] => {
                state.reads += 1;
                match state.observe(key) {
                    Observed::Unavailable => Self::output(1, "", "no such target"),
                    observed => Self::output(0, observed.to_string(), ""),
                }
            }
            ["set", key, kind, raw] => {
                state
                    .mutations
                    .push(CommandSpec::new(FAKE_PROGRAM).args(["set", *key, *kind, *raw]));
                if state.unavailable.contains(*key) {
                    return Self::output(1, "", "no such target");
                }
                if state.failing.contains(*key) {
                    return Self::output(1, "", "access denied");
                }
                let parsed = ValueKind::parse(kind)
                    .and_then(|kind| ConfigValue::parse_as(kind, raw).ok());
                match parsed {
                    Some(value) => {
                        let stored = state.drift.remove(*key).unwrap_or(value);
                        state.values.insert(key.to_string(), stored);
                        Self::output(0, "ok", "")
                    }
                    None => Self::output(2, "", "invalid value"),
                }
            }
            ["clear", key] => {
                state
                    .mutations
                    .push(CommandSpec::new(FAKE_PROGRAM).args(["clear", *key]));
                state.values.remove(*key);
                Self::output(0, "ok", "")
            }
            _ => Self::output(2, "", "usage: fakehost get|set|clear <key>"),
        }
    }
}

#[async_trait]
impl CommandExecutor for FakeHost {
    async fn execute(
        &self,
        command: &CommandSpec,
        timeout: Duration,
    ) -> Result<CommandOutput, ExecutionError> {
        if command.program != FAKE_PROGRAM {
            return Err(ExecutionError::NotFound(command.program.clone()));
        }

        if self.delay > timeout {
            tokio::time::sleep(timeout).await;
            return Err(ExecutionError::TimedOut {
                command: command.to_string(),
                timeout_ms: timeout.as_millis() as u64,
                output: CommandOutput {
                    exit_code: -1,
                    stdout: String::new(),
                    stderr: String::new(),
                    duration_ms: timeout.as_millis() as i64,
                    timed_out: true,
                },
            });
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        Ok(self.run(&command.args))
    }
}

#[async_trait]
impl VerificationProbe for FakeHost {
    async fn read(&self, target: &ChangeTarget) -> Observed {
        let mut state = self.state.lock().unwrap();
        state.reads += 1;
        state.observe(&target.key())
    }
}

impl PlatformCommands for FakeHost {
    fn platform(&self) -> &'static str {
        "fake"
    }

    fn read_command(&self, target: &ChangeTarget) -> Option<CommandSpec> {
        Some(CommandSpec::new(FAKE_PROGRAM).args(["get".to_string(), target.key()]))
    }

    fn parse_observation(&self, target: &ChangeTarget, output: &CommandOutput) -> Observed {
        if !output.success() {
            return Observed::Unavailable;
        }
        let text = output.stdout.trim();
        if text == "<unset>" {
            return Observed::Unset;
        }
        ConfigValue::parse_as(target.value_kind(), text)
            .map(Observed::Value)
            .unwrap_or(Observed::Unavailable)
    }

    fn apply_command(&self, target: &ChangeTarget, value: &ConfigValue) -> Option<CommandSpec> {
        Some(CommandSpec::new(FAKE_PROGRAM).args([
            "set".to_string(),
            target.key(),
            value.kind().to_string(),
            value.to_string(),
        ]))
    }

    fn clear_command(&self, target: &ChangeTarget, _written: &ConfigValue) -> Option<CommandSpec> {
        Some(CommandSpec::new(FAKE_PROGRAM).args(["clear".to_string(), target.key()]))
    }
}
