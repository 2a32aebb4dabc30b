// Verification probe port
use async_trait::async_trait;

use crate::domain::{ChangeTarget, Observed};

/// Read-only view of the current OS network configuration
///
/// Implementations must only run query commands or read configuration
/// files; they never mutate the host.
#[async_trait]
pub trait VerificationProbe: Send + Sync {
    /// Read the value a target currently holds
    ///
    /// Returns `Observed::Unavailable` (not an error) when the target does
    /// not exist on this host.
    async fn read(&self, target: &ChangeTarget) -> Observed;
}
