// HTTP throughput probe
// reason: reqwest with rustls, plain HTTP downloads/uploads against a configurable endpoint
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::{timeout, Instant};
use tracing::{debug, warn};

use nettune_core::domain::SpeedTestResult;
use nettune_core::port::{DiagnosticsError, SpeedTester};

const LATENCY_SAMPLES: usize = 3;
const DOWNLOAD_BYTES: u64 = 25_000_000;
const UPLOAD_CHUNK_BYTES: usize = 1_000_000;

/// Measures latency, download and upload against a `__down`/`__up` endpoint
pub struct HttpSpeedTester {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpSpeedTester {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, DiagnosticsError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("nettune/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DiagnosticsError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        })
    }

    fn provider(&self) -> String {
        reqwest::Url::parse(&self.endpoint)
            .ok()
            .and_then(|url| url.host_str().map(str::to_string))
            .unwrap_or_else(|| self.endpoint.clone())
    }

    /// Smallest round trip of a zero-byte download
    async fn latency(&self, deadline: Instant) -> Result<f64, DiagnosticsError> {
        let url = format!("{}/__down?bytes=0", self.endpoint);
        let mut best: Option<f64> = None;
        let mut last_error = None;

        for _ in 0..LATENCY_SAMPLES {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            let started = Instant::now();
            match timeout(remaining, self.client.get(&url).send()).await {
                Ok(Ok(response)) if response.status().is_success() => {
                    let ms = started.elapsed().as_secs_f64() * 1000.0;
                    best = Some(best.map_or(ms, |b| b.min(ms)));
                }
                Ok(Ok(response)) => {
                    last_error = Some(DiagnosticsError::Transport(format!(
                        "HTTP {}",
                        response.status()
                    )));
                }
                Ok(Err(e)) => last_error = Some(transport(e)),
                Err(_) => last_error = Some(DiagnosticsError::Timeout(remaining.as_millis() as u64)),
            }
        }

        best.ok_or_else(|| {
            last_error.unwrap_or_else(|| DiagnosticsError::Unreachable(self.endpoint.clone()))
        })
    }

    /// Bytes downloaded before `deadline`, and the time spent
    async fn download(&self, deadline: Instant) -> Result<(u64, Duration), DiagnosticsError> {
        let url = format!("{}/__down?bytes={}", self.endpoint, DOWNLOAD_BYTES);
        let started = Instant::now();
        let mut received = 0u64;

        let remaining = deadline.saturating_duration_since(started);
        let mut response = match timeout(remaining, self.client.get(&url).send()).await {
            Ok(Ok(response)) => response.error_for_status().map_err(transport)?,
            Ok(Err(e)) => return Err(transport(e)),
            Err(_) => return Err(DiagnosticsError::Timeout(remaining.as_millis() as u64)),
        };

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match timeout(remaining, response.chunk()).await {
                Ok(Ok(Some(chunk))) => received += chunk.len() as u64,
                Ok(Ok(None)) => break,
                Ok(Err(e)) => {
                    warn!(error = %e, received, "Download interrupted");
                    break;
                }
                // Budget exhausted mid-stream: measure what arrived
                Err(_) => break,
            }
        }

        Ok((received, started.elapsed()))
    }

    /// Bytes uploaded in complete requests before `deadline`
    async fn upload(&self, deadline: Instant) -> (u64, Duration) {
        let url = format!("{}/__up", self.endpoint);
        let payload = vec![0u8; UPLOAD_CHUNK_BYTES];
        let started = Instant::now();
        let mut sent = 0u64;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            let request = self.client.post(&url).body(payload.clone()).send();
            match timeout(remaining, request).await {
                Ok(Ok(response)) if response.status().is_success() => {
                    sent += UPLOAD_CHUNK_BYTES as u64
                }
                Ok(Ok(response)) => {
                    warn!(status = %response.status(), "Upload rejected");
                    break;
                }
                Ok(Err(e)) => {
                    warn!(error = %e, "Upload failed");
                    break;
                }
                Err(_) => break,
            }
        }

        (sent, started.elapsed())
    }
}

fn transport(e: reqwest::Error) -> DiagnosticsError {
    if e.is_timeout() {
        DiagnosticsError::Timeout(0)
    } else if e.is_connect() {
        DiagnosticsError::Unreachable(e.to_string())
    } else {
        DiagnosticsError::Transport(e.to_string())
    }
}

/// Megabits per second
pub fn mbps(bytes: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        return 0.0;
    }
    (bytes as f64 * 8.0) / secs / 1_000_000.0
}

#[async_trait]
impl SpeedTester for HttpSpeedTester {
    async fn run(&self, max_duration: Duration) -> Result<SpeedTestResult, DiagnosticsError> {
        let started = Instant::now();
        let end = started + max_duration;

        let ping_ms = self.latency(end).await?;

        // Remaining budget split evenly between download and upload
        let remaining = end.saturating_duration_since(Instant::now());
        let download_end = Instant::now() + remaining / 2;
        let (downloaded, download_time) = self.download(download_end).await?;
        if downloaded == 0 {
            return Err(DiagnosticsError::Transport(
                "no data received from speed test endpoint".to_string(),
            ));
        }
        let (uploaded, upload_time) = self.upload(end).await;

        let result = SpeedTestResult {
            download_mbps: mbps(downloaded, download_time),
            upload_mbps: mbps(uploaded, upload_time),
            ping_ms,
            provider: self.provider(),
            duration_ms: started.elapsed().as_millis() as i64,
        };
        debug!(
            downloaded,
            uploaded,
            duration_ms = result.duration_ms,
            "Speed test measured"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mbps() {
        assert_eq!(mbps(1_000_000, Duration::from_secs(1)), 8.0);
        assert_eq!(mbps(12_500_000, Duration::from_secs(2)), 50.0);
        assert_eq!(mbps(100, Duration::ZERO), 0.0);
    }

    #[test]
    fn test_provider_is_endpoint_host() {
        let tester = HttpSpeedTester::new("https://speed.cloudflare.com/").unwrap();
        assert_eq!(tester.provider(), "speed.cloudflare.com");
        assert_eq!(tester.endpoint, "https://speed.cloudflare.com");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_fails() {
        // Port 9 on localhost: connection refused
        let tester = HttpSpeedTester::new("http://127.0.0.1:9").unwrap();
        let result = tester.run(Duration::from_millis(500)).await;
        assert!(result.is_err());
    }
}
