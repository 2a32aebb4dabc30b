// Change targets - the closed set of things a profile may modify

use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::{DomainError, Result};
use super::value::ValueKind;

/// Registry key holding global TCP/IP parameters
pub const TCPIP_PARAMETERS_KEY: &str =
    r"HKLM\SYSTEM\CurrentControlSet\Services\Tcpip\Parameters";

/// Registry key holding per-interface TCP/IP parameters
pub const TCPIP_INTERFACES_KEY: &str =
    r"HKLM\SYSTEM\CurrentControlSet\Services\Tcpip\Parameters\Interfaces";

const MAX_INTERFACE_NAME_LEN: usize = 64;

/// Configuration category (one built-in profile per category)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Dns,
    Tcp,
    Registry,
    Wifi,
    Cache,
}

impl Category {
    /// Categories in the order the `All` profile applies them
    pub const ALL: [Category; 5] = [
        Category::Dns,
        Category::Tcp,
        Category::Registry,
        Category::Wifi,
        Category::Cache,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Dns => "dns",
            Category::Tcp => "tcp",
            Category::Registry => "registry",
            Category::Wifi => "wifi",
            Category::Cache => "cache",
        }
    }

    pub fn profile_name(&self) -> &'static str {
        match self {
            Category::Dns => "DNS",
            Category::Tcp => "TCP",
            Category::Registry => "Registry",
            Category::Wifi => "WiFi",
            Category::Cache => "Cache",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated network interface name ("Wi-Fi", "Ethernet 2", "eth0")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InterfaceName(String);

impl InterfaceName {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let valid = !name.trim().is_empty()
            && name.len() <= MAX_INTERFACE_NAME_LEN
            && name.chars().all(|c| {
                c.is_ascii_alphanumeric() || matches!(c, ' ' | '-' | '_' | '.' | '#' | '(' | ')')
            });
        if valid {
            Ok(Self(name))
        } else {
            Err(DomainError::InvalidInterfaceName(name))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for InterfaceName {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<InterfaceName> for String {
    fn from(value: InterfaceName) -> Self {
        value.0
    }
}

impl fmt::Display for InterfaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// DNS server slot on an interface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DnsSlot {
    Primary,
    Secondary,
}

impl DnsSlot {
    /// 1-based position in the interface's server list
    pub fn index(&self) -> usize {
        match self {
            DnsSlot::Primary => 1,
            DnsSlot::Secondary => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DnsSlot::Primary => "primary",
            DnsSlot::Secondary => "secondary",
        }
    }
}

/// Global TCP stack settings (`netsh int tcp set global`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TcpSetting {
    AutoTuningLevel,
    Chimney,
    Dca,
    NetDma,
    EcnCapability,
    Timestamps,
    Rss,
    MaxSynRetransmissions,
    InitialRto,
    Rsc,
}

impl TcpSetting {
    /// Parameter name as accepted by `netsh int tcp set global`
    pub fn netsh_name(&self) -> &'static str {
        match self {
            TcpSetting::AutoTuningLevel => "autotuninglevel",
            TcpSetting::Chimney => "chimney",
            TcpSetting::Dca => "dca",
            TcpSetting::NetDma => "netdma",
            TcpSetting::EcnCapability => "ecncapability",
            TcpSetting::Timestamps => "timestamps",
            TcpSetting::Rss => "rss",
            TcpSetting::MaxSynRetransmissions => "maxsynretransmissions",
            TcpSetting::InitialRto => "initialRto",
            TcpSetting::Rsc => "rsc",
        }
    }

    pub fn value_kind(&self) -> ValueKind {
        match self {
            TcpSetting::AutoTuningLevel => ValueKind::Level,
            TcpSetting::MaxSynRetransmissions | TcpSetting::InitialRto => ValueKind::Number,
            _ => ValueKind::Toggle,
        }
    }
}

/// DWORD values under the TCP/IP service registry keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrySetting {
    Tcp1323Opts,
    TcpMaxDupAcks,
    SackOpts,
    DefaultTtl,
    TcpTimedWaitDelay,
    MaxUserPort,
    MaxFreeTcbs,
    MaxHashTableSize,
    EnableWsd,
    EnableIcmpRedirect,
    TcpAckFrequency,
    TcpNoDelay,
}

impl RegistrySetting {
    pub fn key(&self) -> &'static str {
        match self {
            RegistrySetting::TcpAckFrequency | RegistrySetting::TcpNoDelay => TCPIP_INTERFACES_KEY,
            _ => TCPIP_PARAMETERS_KEY,
        }
    }

    pub fn value_name(&self) -> &'static str {
        match self {
            RegistrySetting::Tcp1323Opts => "Tcp1323Opts",
            RegistrySetting::TcpMaxDupAcks => "TcpMaxDupAcks",
            RegistrySetting::SackOpts => "SackOpts",
            RegistrySetting::DefaultTtl => "DefaultTTL",
            RegistrySetting::TcpTimedWaitDelay => "TcpTimedWaitDelay",
            RegistrySetting::MaxUserPort => "MaxUserPort",
            RegistrySetting::MaxFreeTcbs => "MaxFreeTcbs",
            RegistrySetting::MaxHashTableSize => "MaxHashTableSize",
            RegistrySetting::EnableWsd => "EnableWsd",
            RegistrySetting::EnableIcmpRedirect => "EnableICMPRedirect",
            RegistrySetting::TcpAckFrequency => "TcpAckFrequency",
            RegistrySetting::TcpNoDelay => "TCPNoDelay",
        }
    }
}

/// Wireless LAN service settings (`netsh wlan set ...`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "setting", rename_all = "snake_case")]
pub enum WlanSetting {
    AutoConfig { interface: InterfaceName },
    ShowBlockedNetworks,
}

/// Caches that can be flushed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheKind {
    /// Client-side DNS resolver cache; value is the number of cached entries
    DnsResolver,
}

/// One configurable item of the host network stack
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChangeTarget {
    DnsServer {
        interface: InterfaceName,
        slot: DnsSlot,
    },
    TcpGlobal {
        setting: TcpSetting,
    },
    Registry {
        setting: RegistrySetting,
    },
    Wlan {
        setting: WlanSetting,
    },
    Cache {
        cache: CacheKind,
    },
}

impl ChangeTarget {
    pub fn dns(interface: InterfaceName, slot: DnsSlot) -> Self {
        ChangeTarget::DnsServer { interface, slot }
    }

    pub fn tcp(setting: TcpSetting) -> Self {
        ChangeTarget::TcpGlobal { setting }
    }

    pub fn registry(setting: RegistrySetting) -> Self {
        ChangeTarget::Registry { setting }
    }

    pub fn wlan(setting: WlanSetting) -> Self {
        ChangeTarget::Wlan { setting }
    }

    pub fn cache(cache: CacheKind) -> Self {
        ChangeTarget::Cache { cache }
    }

    pub fn category(&self) -> Category {
        match self {
            ChangeTarget::DnsServer { .. } => Category::Dns,
            ChangeTarget::TcpGlobal { .. } => Category::Tcp,
            ChangeTarget::Registry { .. } => Category::Registry,
            ChangeTarget::Wlan { .. } => Category::Wifi,
            ChangeTarget::Cache { .. } => Category::Cache,
        }
    }

    pub fn value_kind(&self) -> ValueKind {
        match self {
            ChangeTarget::DnsServer { .. } => ValueKind::Ip,
            ChangeTarget::TcpGlobal { setting } => setting.value_kind(),
            ChangeTarget::Registry { .. } => ValueKind::Number,
            ChangeTarget::Wlan { .. } => ValueKind::Toggle,
            ChangeTarget::Cache { .. } => ValueKind::Number,
        }
    }

    /// Whether a previous value can be re-applied after a change
    ///
    /// A flushed cache cannot be repopulated.
    pub fn is_reversible(&self) -> bool {
        !matches!(self, ChangeTarget::Cache { .. })
    }

    /// Stable identifier, unique within a profile
    pub fn key(&self) -> String {
        match self {
            ChangeTarget::DnsServer { interface, slot } => {
                format!("dns/{}/{}", interface, slot.as_str())
            }
            ChangeTarget::TcpGlobal { setting } => {
                format!("tcp/{}", setting.netsh_name().to_ascii_lowercase())
            }
            ChangeTarget::Registry { setting } => format!("registry/{}", setting.value_name()),
            ChangeTarget::Wlan { setting } => match setting {
                WlanSetting::AutoConfig { interface } => format!("wifi/autoconfig/{}", interface),
                WlanSetting::ShowBlockedNetworks => "wifi/show_blocked_networks".to_string(),
            },
            ChangeTarget::Cache { cache } => match cache {
                CacheKind::DnsResolver => "cache/dns_resolver".to_string(),
            },
        }
    }
}

impl fmt::Display for ChangeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}
