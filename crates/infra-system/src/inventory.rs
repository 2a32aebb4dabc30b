// Network inventory via sysinfo
// reason: sysinfo for cross-platform interface counters and host identity
use async_trait::async_trait;
use sysinfo::{Networks, System};
use tracing::debug;

use nettune_core::domain::{InterfaceStats, NetworkSnapshot};
use nettune_core::port::NetworkInventory;

/// Snapshot provider backed by sysinfo
///
/// Every call refreshes the interface list, so counters are cumulative
/// totals since boot rather than deltas.
#[derive(Default)]
pub struct SysinfoInventory;

impl SysinfoInventory {
    pub fn new() -> Self {
        Self
    }

    fn collect() -> NetworkSnapshot {
        let networks = Networks::new_with_refreshed_list();
        let mut interfaces: Vec<InterfaceStats> = networks
            .list()
            .iter()
            .map(|(name, data)| InterfaceStats {
                name: name.clone(),
                mac: data.mac_address().to_string(),
                rx_bytes: data.total_received(),
                tx_bytes: data.total_transmitted(),
                rx_packets: data.total_packets_received(),
                tx_packets: data.total_packets_transmitted(),
                rx_errors: data.total_errors_on_received(),
                tx_errors: data.total_errors_on_transmitted(),
            })
            .collect();
        interfaces.sort_by(|a, b| a.name.cmp(&b.name));

        NetworkSnapshot {
            hostname: System::host_name(),
            os_version: System::long_os_version(),
            interfaces,
            captured_at: 0,
        }
    }
}

#[async_trait]
impl NetworkInventory for SysinfoInventory {
    async fn snapshot(&self) -> NetworkSnapshot {
        // sysinfo reads are blocking
        let snapshot = tokio::task::spawn_blocking(Self::collect)
            .await
            .unwrap_or_else(|_| NetworkSnapshot {
                hostname: None,
                os_version: None,
                interfaces: Vec::new(),
                captured_at: 0,
            });

        debug!(
            interfaces = snapshot.interfaces.len(),
            hostname = ?snapshot.hostname,
            "Network inventory collected"
        );
        snapshot
    }
}
