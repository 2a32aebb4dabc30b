// Diagnostics ports - ping and throughput probes
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::domain::{PingStats, SpeedTestResult};

/// Diagnostics probe errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticsError {
    #[error("host unreachable: {0}")]
    Unreachable(String),

    #[error("probe timed out after {0}ms")]
    Timeout(u64),

    #[error("probe tool unavailable: {0}")]
    ToolUnavailable(String),

    #[error("unexpected probe output: {0}")]
    Parse(String),

    #[error("transport error: {0}")]
    Transport(String),
}

/// ICMP echo probe
#[async_trait]
pub trait Pinger: Send + Sync {
    /// Send `count` echo requests to `host`, waiting up to `reply_timeout`
    /// for each reply
    ///
    /// The run as a whole may take about `count` seconds plus one reply
    /// wait. A host that answers none of the requests is a successful probe
    /// with `alive == false`; errors are reserved for probes that could not run.
    async fn ping(
        &self,
        host: &str,
        count: u32,
        reply_timeout: Duration,
    ) -> Result<PingStats, DiagnosticsError>;
}

/// Throughput probe
#[async_trait]
pub trait SpeedTester: Send + Sync {
    /// Measure latency, download and upload within `max_duration`
    async fn run(&self, max_duration: Duration) -> Result<SpeedTestResult, DiagnosticsError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Mock Pinger returning a fixed outcome
    pub struct MockPinger {
        outcome: Result<PingStats, DiagnosticsError>,
        delay: Duration,
        call_count: Arc<Mutex<usize>>,
    }
    impl MockPinger {
        pub fn new(outcome: Result<PingStats, DiagnosticsError>) -> Self {
            Self {
                outcome,
                delay: Duration::ZERO,
                call_count: Arc::new(Mutex::new(0)),
            }
        }
        pub fn reachable(avg_ms: f64) -> Self {
            Self::new(Ok(PingStats {
                host: String::new(),
                alive: true,
                transmitted: 4,
                received: 4,
                min_ms: Some(avg_ms),
                max_ms: Some(avg_ms),
                avg_ms: Some(avg_ms),
                packet_loss_pct: 0.0,
            }))
        }
        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
        pub fn call_count(&self) -> usize {
            *self.call_count.lock().unwrap()
        }
    }
    #[async_trait]
    impl Pinger for MockPinger {
        async fn ping(
            &self,
            host: &str,
            count: u32,
            _reply_timeout: Duration,
        ) -> Result<PingStats, DiagnosticsError> {
            *self.call_count.lock().unwrap() += 1;
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.outcome.clone().map(|mut stats| {
                stats.host = host.to_string();
                stats.transmitted = count;
                if stats.alive {
                    stats.received = count;
                }
                stats
            })
        }
    }

    /// Mock SpeedTester returning a fixed outcome
    pub struct MockSpeedTester {
        outcome: Result<SpeedTestResult, DiagnosticsError>,
    }
    impl MockSpeedTester {
        pub fn new(outcome: Result<SpeedTestResult, DiagnosticsError>) -> Self {
            Self { outcome }
        }
        pub fn fixed(download_mbps: f64, upload_mbps: f64) -> Self {
            Self::new(Ok(SpeedTestResult {
                download_mbps,
                upload_mbps,
                ping_ms: 12.0,
                provider: "mock".to_string(),
                duration_ms: 100,
            }))
        }
    }
    #[async_trait]
    impl SpeedTester for MockSpeedTester {
        async fn run(&self, _max_duration: Duration) -> Result<SpeedTestResult, DiagnosticsError> {
            self.outcome.clone()
        }
    }
}
