// Serialized executor - at most one mutating command in flight
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use nettune_core::port::{CommandExecutor, CommandOutput, CommandSpec, ExecutionError};

/// Wraps an executor so commands run strictly one after another
///
/// Callers queue on the lock in arrival order (tokio's mutex is fair).
pub struct SerializedExecutor {
    inner: Arc<dyn CommandExecutor>,
    queue: Mutex<()>,
}

impl SerializedExecutor {
    pub fn new(inner: Arc<dyn CommandExecutor>) -> Self {
        Self {
            inner,
            queue: Mutex::new(()),
        }
    }
}

#[async_trait]
impl CommandExecutor for SerializedExecutor {
    async fn execute(
        &self,
        command: &CommandSpec,
        timeout: Duration,
    ) -> Result<CommandOutput, ExecutionError> {
        let _slot = self.queue.lock().await;
        self.inner.execute(command, timeout).await
    }
}
