// Linux command table: sysctl, resolvectl
//
// Only the TCP settings with a kernel equivalent and the systemd-resolved
// cache are reachable; DNS, registry and WLAN targets are unavailable.

use nettune_core::domain::{CacheKind, ChangeTarget, ConfigValue, Observed, TcpSetting};
use nettune_core::port::{CommandOutput, CommandSpec, PlatformCommands};

use super::parse_reading;

pub struct LinuxCommands;

fn sysctl_key(setting: TcpSetting) -> Option<&'static str> {
    match setting {
        TcpSetting::EcnCapability => Some("net.ipv4.tcp_ecn"),
        TcpSetting::Timestamps => Some("net.ipv4.tcp_timestamps"),
        TcpSetting::MaxSynRetransmissions => Some("net.ipv4.tcp_syn_retries"),
        TcpSetting::AutoTuningLevel => Some("net.ipv4.tcp_moderate_rcvbuf"),
        _ => None,
    }
}

/// Kernel token for a value; receive buffer moderation maps levels to 0/1
fn sysctl_value(setting: TcpSetting, value: &ConfigValue) -> Option<String> {
    match (setting, value) {
        (TcpSetting::AutoTuningLevel, ConfigValue::Level(level)) => match level.as_str() {
            "disabled" => Some("0".to_string()),
            "normal" => Some("1".to_string()),
            _ => None,
        },
        (_, ConfigValue::Toggle(on)) => Some(if *on { "1" } else { "0" }.to_string()),
        (_, ConfigValue::Number(n)) => Some(n.to_string()),
        // Raw kernel token captured before a change, e.g. tcp_ecn=2
        (_, ConfigValue::Level(token)) if token.chars().all(|c| c.is_ascii_digit()) => {
            Some(token.clone())
        }
        _ => None,
    }
}

fn parse_sysctl(setting: TcpSetting, stdout: &str) -> Observed {
    let raw = stdout.trim();
    if setting == TcpSetting::AutoTuningLevel {
        return match raw {
            "0" => Observed::Value(ConfigValue::Level("disabled".to_string())),
            "1" => Observed::Value(ConfigValue::Level("normal".to_string())),
            _ => Observed::Unavailable,
        };
    }
    parse_reading(setting.value_kind(), raw)
}

/// `Current Cache Size: N` from `resolvectl statistics`
fn parse_cache_size(stdout: &str) -> Observed {
    stdout
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(label, _)| label.trim().eq_ignore_ascii_case("Current Cache Size"))
        .and_then(|(_, value)| value.trim().parse::<u64>().ok())
        .map(|n| Observed::Value(ConfigValue::Number(n)))
        .unwrap_or(Observed::Unavailable)
}

impl PlatformCommands for LinuxCommands {
    fn platform(&self) -> &'static str {
        "linux"
    }

    fn read_command(&self, target: &ChangeTarget) -> Option<CommandSpec> {
        match target {
            ChangeTarget::TcpGlobal { setting } => {
                sysctl_key(*setting).map(|key| CommandSpec::new("sysctl").args(["-n", key]))
            }
            ChangeTarget::Cache {
                cache: CacheKind::DnsResolver,
            } => Some(CommandSpec::new("resolvectl").arg("statistics")),
            _ => None,
        }
    }

    fn parse_observation(&self, target: &ChangeTarget, output: &CommandOutput) -> Observed {
        if !output.success() {
            return Observed::Unavailable;
        }
        match target {
            ChangeTarget::TcpGlobal { setting } => parse_sysctl(*setting, &output.stdout),
            ChangeTarget::Cache { .. } => parse_cache_size(&output.stdout),
            _ => Observed::Unavailable,
        }
    }

    fn apply_command(&self, target: &ChangeTarget, value: &ConfigValue) -> Option<CommandSpec> {
        match (target, value) {
            (ChangeTarget::TcpGlobal { setting }, value) => {
                let key = sysctl_key(*setting)?;
                let token = sysctl_value(*setting, value)?;
                Some(
                    CommandSpec::new("sysctl")
                        .arg("-w")
                        .arg(format!("{}={}", key, token)),
                )
            }
            (
                ChangeTarget::Cache {
                    cache: CacheKind::DnsResolver,
                },
                ConfigValue::Number(0),
            ) => Some(CommandSpec::new("resolvectl").arg("flush-caches")),
            _ => None,
        }
    }

    /// Kernel parameters always carry a value
    fn clear_command(&self, _target: &ChangeTarget, _written: &ConfigValue) -> Option<CommandSpec> {
        None
    }
}
