// Command-backed verification probe
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use nettune_core::domain::{ChangeTarget, Observed};
use nettune_core::port::{CommandExecutor, PlatformCommands, VerificationProbe};

/// Reads a target by running the platform's read-only query command
pub struct CommandProbe {
    executor: Arc<dyn CommandExecutor>,
    commands: Arc<dyn PlatformCommands>,
    timeout: Duration,
}

impl CommandProbe {
    pub fn new(
        executor: Arc<dyn CommandExecutor>,
        commands: Arc<dyn PlatformCommands>,
        timeout: Duration,
    ) -> Self {
        Self {
            executor,
            commands,
            timeout,
        }
    }
}

#[async_trait]
impl VerificationProbe for CommandProbe {
    async fn read(&self, target: &ChangeTarget) -> Observed {
        let Some(command) = self.commands.read_command(target) else {
            debug!(target = %target, platform = self.commands.platform(), "No read command");
            return Observed::Unavailable;
        };

        match self.executor.execute(&command, self.timeout).await {
            Ok(output) => {
                let observed = self.commands.parse_observation(target, &output);
                debug!(target = %target, observed = %observed, "Probe read");
                observed
            }
            Err(e) => {
                debug!(target = %target, error = %e, "Probe command failed");
                Observed::Unavailable
            }
        }
    }
}
