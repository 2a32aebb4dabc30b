// Orchestration and diagnostics constants (no magic values)
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

/// Default bound on a single OS command (10s)
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

/// Smallest timeout handed to a command when a run deadline is close (1s)
pub const MIN_COMMAND_TIMEOUT: Duration = Duration::from_secs(1);

/// Default primary DNS server (Google)
pub const DEFAULT_DNS_PRIMARY: IpAddr = IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8));

/// Default secondary DNS server (Cloudflare)
pub const DEFAULT_DNS_SECONDARY: IpAddr = IpAddr::V4(Ipv4Addr::new(1, 1, 1, 1));

/// Default WLAN interface name
pub const DEFAULT_WIFI_INTERFACE: &str = "Wi-Fi";

/// Default echo requests per ping
pub const DEFAULT_PING_COUNT: u32 = 4;

/// Upper bound on echo requests per ping
pub const MAX_PING_COUNT: u32 = 100;

/// Default wait for each echo reply (10s)
pub const DEFAULT_PING_TIMEOUT: Duration = Duration::from_secs(10);

/// Default speed test budget (5s)
pub const DEFAULT_SPEEDTEST_MAX_DURATION: Duration = Duration::from_millis(5000);

/// Upper bound on a speed test budget (60s)
pub const MAX_SPEEDTEST_DURATION: Duration = Duration::from_secs(60);

/// Default speed test endpoint
pub const DEFAULT_SPEEDTEST_ENDPOINT: &str = "https://speed.cloudflare.com";
