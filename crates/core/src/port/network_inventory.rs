// Network inventory port
// reason: async-trait so adapters may refresh counters asynchronously
use async_trait::async_trait;

use crate::domain::NetworkSnapshot;

/// Read-only system inventory provider
#[async_trait]
pub trait NetworkInventory: Send + Sync {
    /// Capture hostname, OS version and per-interface counters
    ///
    /// # Example
    /// ```text
    /// let snapshot = inventory.snapshot().await;
    /// for iface in snapshot.interfaces.iter().filter(|i| !i.is_virtual()) {
    ///     println!("{} rx={} tx={}", iface.name, iface.rx_bytes, iface.tx_bytes);
    /// }
    /// ```
    async fn snapshot(&self) -> NetworkSnapshot;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::domain::InterfaceStats;
    use std::sync::{Arc, Mutex};
    /// Mock NetworkInventory serving a fixed snapshot
    pub struct StaticInventory {
        snapshot: Arc<Mutex<NetworkSnapshot>>,
    }
    impl StaticInventory {
        pub fn new(interface_names: &[&str]) -> Self {
            let interfaces = interface_names
                .iter()
                .map(|name| InterfaceStats {
                    name: name.to_string(),
                    mac: "52:54:00:12:34:56".to_string(),
                    rx_bytes: 1024,
                    tx_bytes: 512,
                    rx_packets: 10,
                    tx_packets: 5,
                    rx_errors: 0,
                    tx_errors: 0,
                })
                .collect();
            Self {
                snapshot: Arc::new(Mutex::new(NetworkSnapshot {
                    hostname: Some("test-host".to_string()),
                    os_version: Some("TestOS 1.0".to_string()),
                    interfaces,
                    captured_at: 0,
                })),
            }
        }
    }
    #[async_trait]
    impl NetworkInventory for StaticInventory {
        async fn snapshot(&self) -> NetworkSnapshot {
            self.snapshot.lock().unwrap().clone()
        }
    }
}
