// Diagnostics Domain Model - read-only measurements

use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use super::error::{DomainError, Result};

const MAX_HOST_LEN: usize = 253;

/// Validate a ping target: an IP literal or a DNS name
///
/// Returns the trimmed host. Anything that could be read as a command-line
/// option (leading `-`) or contains characters outside a hostname is rejected.
pub fn validate_host(host: &str) -> Result<&str> {
    let host = host.trim();
    if host.parse::<IpAddr>().is_ok() {
        return Ok(host);
    }

    let valid = !host.is_empty()
        && host.len() <= MAX_HOST_LEN
        && !host.starts_with('-')
        && !host.starts_with('.')
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.');
    if valid {
        Ok(host)
    } else {
        Err(DomainError::InvalidHost(host.to_string()))
    }
}

/// Ping statistics for one host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PingStats {
    pub host: String,
    pub alive: bool,
    pub transmitted: u32,
    pub received: u32,
    pub min_ms: Option<f64>,
    pub max_ms: Option<f64>,
    pub avg_ms: Option<f64>,
    pub packet_loss_pct: f64,
}

impl PingStats {
    /// Stats for a host that answered no echo request
    pub fn unanswered(host: impl Into<String>, transmitted: u32) -> Self {
        Self {
            host: host.into(),
            alive: false,
            transmitted,
            received: 0,
            min_ms: None,
            max_ms: None,
            avg_ms: None,
            packet_loss_pct: 100.0,
        }
    }
}

/// Throughput measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedTestResult {
    pub download_mbps: f64,
    pub upload_mbps: f64,
    pub ping_ms: f64,
    pub provider: String,
    pub duration_ms: i64,
}

/// Counters for one network interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceStats {
    pub name: String,
    pub mac: String,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
    pub rx_packets: u64,
    pub tx_packets: u64,
    pub rx_errors: u64,
    pub tx_errors: u64,
}

impl InterfaceStats {
    /// Loopback and tunnel-style pseudo interfaces
    pub fn is_virtual(&self) -> bool {
        let name = self.name.to_ascii_lowercase();
        name == "lo"
            || name.starts_with("loopback")
            || name.starts_with("docker")
            || name.starts_with("veth")
            || name.starts_with("br-")
            || self.mac == "00:00:00:00:00:00"
    }
}

/// Read-only view of the host network inventory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    pub hostname: Option<String>,
    pub os_version: Option<String>,
    pub interfaces: Vec<InterfaceStats>,
    pub captured_at: i64, // epoch ms
}
