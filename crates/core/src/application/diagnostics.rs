// Diagnostics Runner - read-only ping, throughput and inventory probes
//
// Shares nothing with the orchestrator: diagnostics may run while a profile
// run holds the orchestration lock.

use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::application::constants::{MAX_PING_COUNT, MAX_SPEEDTEST_DURATION};
use crate::domain::{validate_host, NetworkSnapshot, PingStats, SpeedTestResult};
use crate::error::{AppError, Result};
use crate::port::{DiagnosticsError, NetworkInventory, Pinger, SpeedTester, TimeProvider};

pub struct DiagnosticsRunner {
    pinger: Arc<dyn Pinger>,
    speed_tester: Arc<dyn SpeedTester>,
    inventory: Arc<dyn NetworkInventory>,
    time_provider: Arc<dyn TimeProvider>,
    ping_timeout: Duration,
}

impl DiagnosticsRunner {
    pub fn new(
        pinger: Arc<dyn Pinger>,
        speed_tester: Arc<dyn SpeedTester>,
        inventory: Arc<dyn NetworkInventory>,
        time_provider: Arc<dyn TimeProvider>,
        ping_timeout: Duration,
    ) -> Self {
        Self {
            pinger,
            speed_tester,
            inventory,
            time_provider,
            ping_timeout,
        }
    }

    /// Ping `host` with `count` echo requests (clamped to 1..=100)
    ///
    /// # Errors
    /// - AppError::Domain for a host that is neither an IP nor a DNS name
    /// - AppError::DiagnosticsUnavailable when the probe could not run
    pub async fn run_ping(&self, host: &str, count: u32) -> Result<PingStats> {
        let host = validate_host(host)?;
        let count = count.clamp(1, MAX_PING_COUNT);

        let mut stats = self
            .pinger
            .ping(host, count, self.ping_timeout)
            .await
            .map_err(|e| unavailable("ping", e))?;

        stats.packet_loss_pct = stats.packet_loss_pct.clamp(0.0, 100.0);
        info!(
            host = %stats.host,
            alive = stats.alive,
            loss_pct = stats.packet_loss_pct,
            avg_ms = ?stats.avg_ms,
            "Ping completed"
        );
        Ok(stats)
    }

    /// Measure throughput within `max_duration_ms` (capped at 60s)
    pub async fn run_speed_test(&self, max_duration_ms: u64) -> Result<SpeedTestResult> {
        if max_duration_ms == 0 {
            return Err(AppError::Validation(
                "speed test duration must be positive".to_string(),
            ));
        }
        let budget = Duration::from_millis(max_duration_ms).min(MAX_SPEEDTEST_DURATION);

        let result = self
            .speed_tester
            .run(budget)
            .await
            .map_err(|e| unavailable("speed test", e))?;

        info!(
            provider = %result.provider,
            download_mbps = result.download_mbps,
            upload_mbps = result.upload_mbps,
            ping_ms = result.ping_ms,
            "Speed test completed"
        );
        Ok(result)
    }

    pub async fn network_snapshot(&self) -> NetworkSnapshot {
        let mut snapshot = self.inventory.snapshot().await;
        snapshot.captured_at = self.time_provider.now_millis();
        snapshot
    }
}

fn unavailable(probe: &str, error: DiagnosticsError) -> AppError {
    warn!(probe, error = %error, "Diagnostics probe failed");
    AppError::DiagnosticsUnavailable(error.to_string())
}
