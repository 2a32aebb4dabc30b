// Runtime settings shared by the orchestrator and diagnostics

use std::net::IpAddr;
use std::time::Duration;

use crate::application::constants::*;
use crate::domain::InterfaceName;
use crate::error::{AppError, Result};

/// Settings resolved once at startup
///
/// The CLI fills these from flags and `NETTUNE_*` environment variables.
#[derive(Debug, Clone)]
pub struct Settings {
    pub command_timeout: Duration,
    pub dns_primary: IpAddr,
    pub dns_secondary: IpAddr,
    /// Interfaces receiving DNS changes; empty means none are configured
    pub dns_interfaces: Vec<String>,
    pub wifi_interface: String,
    pub ping_count: u32,
    /// Wait for each echo reply; a run may last `ping_count` seconds longer
    pub ping_timeout: Duration,
    pub speedtest_max_duration: Duration,
    pub speedtest_endpoint: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            dns_primary: DEFAULT_DNS_PRIMARY,
            dns_secondary: DEFAULT_DNS_SECONDARY,
            dns_interfaces: Vec::new(),
            wifi_interface: DEFAULT_WIFI_INTERFACE.to_string(),
            ping_count: DEFAULT_PING_COUNT,
            ping_timeout: DEFAULT_PING_TIMEOUT,
            speedtest_max_duration: DEFAULT_SPEEDTEST_MAX_DURATION,
            speedtest_endpoint: DEFAULT_SPEEDTEST_ENDPOINT.to_string(),
        }
    }
}

impl Settings {
    /// Check bounds and names before anything is built from these settings
    pub fn validate(&self) -> Result<()> {
        if self.command_timeout.is_zero() {
            return Err(AppError::Config("command timeout must be positive".to_string()));
        }
        if self.ping_timeout.is_zero() {
            return Err(AppError::Config("ping timeout must be positive".to_string()));
        }
        if self.ping_count == 0 || self.ping_count > MAX_PING_COUNT {
            return Err(AppError::Config(format!(
                "ping count must be between 1 and {}",
                MAX_PING_COUNT
            )));
        }
        if self.speedtest_max_duration.is_zero()
            || self.speedtest_max_duration > MAX_SPEEDTEST_DURATION
        {
            return Err(AppError::Config(format!(
                "speed test duration must be between 1ms and {}ms",
                MAX_SPEEDTEST_DURATION.as_millis()
            )));
        }
        if !(self.speedtest_endpoint.starts_with("http://")
            || self.speedtest_endpoint.starts_with("https://"))
        {
            return Err(AppError::Config(format!(
                "speed test endpoint must be an http(s) URL: {}",
                self.speedtest_endpoint
            )));
        }
        if self.dns_primary.is_ipv4() != self.dns_secondary.is_ipv4() {
            return Err(AppError::Config(
                "primary and secondary DNS servers must share an address family".to_string(),
            ));
        }

        self.dns_interface_names()?;
        InterfaceName::new(self.wifi_interface.clone())?;
        Ok(())
    }

    /// DNS interfaces as validated names
    pub fn dns_interface_names(&self) -> Result<Vec<InterfaceName>> {
        self.dns_interfaces
            .iter()
            .map(|name| InterfaceName::new(name.trim()).map_err(AppError::from))
            .collect()
    }
}
