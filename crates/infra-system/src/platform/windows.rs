// Windows command table: netsh, reg, ipconfig

use std::net::IpAddr;

use nettune_core::domain::{
    CacheKind, ChangeTarget, ConfigValue, DnsSlot, InterfaceName, Observed, RegistrySetting,
    TcpSetting, ValueKind, WlanSetting,
};
use nettune_core::port::{CommandOutput, CommandSpec, PlatformCommands};

use super::parse_reading;

pub struct WindowsCommands;

/// Label printed by `netsh int tcp show global`
fn tcp_label(setting: TcpSetting) -> &'static str {
    match setting {
        TcpSetting::AutoTuningLevel => "Receive Window Auto-Tuning Level",
        TcpSetting::Chimney => "Chimney Offload State",
        TcpSetting::Dca => "Direct Cache Access (DCA)",
        TcpSetting::NetDma => "NetDMA State",
        TcpSetting::EcnCapability => "ECN Capability",
        TcpSetting::Timestamps => "RFC 1323 Timestamps",
        TcpSetting::Rss => "Receive-Side Scaling State",
        TcpSetting::MaxSynRetransmissions => "Max SYN Retransmissions",
        TcpSetting::InitialRto => "Initial RTO",
        TcpSetting::Rsc => "Receive Segment Coalescing State",
    }
}

fn netsh() -> CommandSpec {
    CommandSpec::new("netsh")
}

fn name_arg(interface: &InterfaceName) -> String {
    format!("name={}", interface)
}

fn yes_no(enabled: bool) -> &'static str {
    if enabled {
        "yes"
    } else {
        "no"
    }
}

fn parse_tcp_global(setting: TcpSetting, stdout: &str) -> Observed {
    let label = tcp_label(setting);
    stdout
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case(label))
        .map(|(_, value)| parse_reading(setting.value_kind(), value))
        .unwrap_or(Observed::Unavailable)
}

fn parse_reg_dword(setting: RegistrySetting, output: &CommandOutput) -> Observed {
    // `reg query` exits 1 when the value does not exist
    if !output.success() {
        return Observed::Unset;
    }
    output
        .stdout
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>())
        .find(|fields| {
            fields.len() >= 3 && fields[0].eq_ignore_ascii_case(setting.value_name())
        })
        .map(|fields| {
            if fields[1] == "REG_DWORD" {
                parse_reading(ValueKind::Number, fields[2])
            } else {
                Observed::Unavailable
            }
        })
        .unwrap_or(Observed::Unset)
}

/// Where the interface's DNS servers come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DnsSource {
    Static,
    Dhcp,
}

/// Configured DNS servers, in order
///
/// ```text
/// Configuration for interface "Wi-Fi"
///     Statically Configured DNS Servers:    8.8.8.8
///                                           1.1.1.1
///     Register with which suffix:           Primary only
/// ```
fn parse_dns_servers(stdout: &str) -> Option<(DnsSource, Vec<IpAddr>)> {
    let mut lines = stdout.lines();
    let first = lines.find(|line| line.to_ascii_lowercase().contains("dns servers"))?;
    let source = if first.to_ascii_lowercase().contains("dhcp") {
        DnsSource::Dhcp
    } else {
        DnsSource::Static
    };
    let mut servers = Vec::new();

    let head = first.split_once(':').map(|(_, v)| v.trim()).unwrap_or("");
    match head.parse::<IpAddr>() {
        Ok(ip) => servers.push(ip),
        // "None" or empty: no servers
        Err(_) => return Some((source, servers)),
    }
    for line in lines {
        match line.trim().parse::<IpAddr>() {
            Ok(ip) => servers.push(ip),
            Err(_) => break,
        }
    }
    Some((source, servers))
}

/// A slot holds a value only when it is statically configured
///
/// DHCP-assigned servers read as `Unset`, so restoring them goes through
/// the `source=dhcp` clear command instead of pinning them as static.
fn parse_dns_slot(slot: DnsSlot, output: &CommandOutput) -> Observed {
    if !output.success() {
        return Observed::Unavailable;
    }
    match parse_dns_servers(&output.stdout) {
        Some((DnsSource::Dhcp, _)) => Observed::Unset,
        Some((DnsSource::Static, servers)) => servers
            .get(slot.index())
            .map(|ip| Observed::Value(ConfigValue::Ip(*ip)))
            .unwrap_or(Observed::Unset),
        None => Observed::Unavailable,
    }
}

fn parse_wlan(setting: &WlanSetting, stdout: &str) -> Observed {
    match setting {
        WlanSetting::AutoConfig { interface } => {
            let quoted = format!("interface \"{}\"", interface).to_ascii_lowercase();
            stdout
                .lines()
                .map(|line| line.trim().to_ascii_lowercase())
                .find(|line| line.starts_with("auto configuration logic") && line.ends_with(&quoted))
                .map(|line| {
                    Observed::Value(ConfigValue::Toggle(line.contains(" is enabled ")))
                })
                .unwrap_or(Observed::Unavailable)
        }
        WlanSetting::ShowBlockedNetworks => stdout
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(label, _)| {
                label
                    .trim()
                    .eq_ignore_ascii_case("Show blocked networks in visible network list")
            })
            .map(|(_, value)| parse_reading(ValueKind::Toggle, value))
            .unwrap_or(Observed::Unavailable),
    }
}

/// Entries in the resolver cache (`Record Name` lines)
fn parse_dns_cache(stdout: &str) -> Observed {
    let entries = stdout
        .lines()
        .filter(|line| line.trim_start().starts_with("Record Name"))
        .count();
    Observed::Value(ConfigValue::Number(entries as u64))
}

impl PlatformCommands for WindowsCommands {
    fn platform(&self) -> &'static str {
        "windows"
    }

    fn read_command(&self, target: &ChangeTarget) -> Option<CommandSpec> {
        let command = match target {
            ChangeTarget::DnsServer { interface, .. } => netsh()
                .args(["interface", "ip", "show", "dns"])
                .arg(name_arg(interface)),
            ChangeTarget::TcpGlobal { .. } => netsh().args(["int", "tcp", "show", "global"]),
            ChangeTarget::Registry { setting } => CommandSpec::new("reg")
                .args(["query", setting.key(), "/v", setting.value_name()]),
            ChangeTarget::Wlan { .. } => netsh().args(["wlan", "show", "settings"]),
            ChangeTarget::Cache {
                cache: CacheKind::DnsResolver,
            } => CommandSpec::new("ipconfig").arg("/displaydns"),
        };
        Some(command)
    }

    fn parse_observation(&self, target: &ChangeTarget, output: &CommandOutput) -> Observed {
        match target {
            ChangeTarget::DnsServer { slot, .. } => parse_dns_slot(*slot, output),
            ChangeTarget::Registry { setting } => parse_reg_dword(*setting, output),
            _ if !output.success() => Observed::Unavailable,
            ChangeTarget::TcpGlobal { setting } => parse_tcp_global(*setting, &output.stdout),
            ChangeTarget::Wlan { setting } => parse_wlan(setting, &output.stdout),
            ChangeTarget::Cache { .. } => parse_dns_cache(&output.stdout),
        }
    }

    fn apply_command(&self, target: &ChangeTarget, value: &ConfigValue) -> Option<CommandSpec> {
        match (target, value) {
            // `netsh interface ip` manages IPv4 servers only
            (ChangeTarget::DnsServer { interface, slot }, ConfigValue::Ip(ip @ IpAddr::V4(_))) => {
                let base = netsh().args(["interface", "ip"]);
                Some(match slot {
                    DnsSlot::Primary => base
                        .args(["set", "dns"])
                        .arg(name_arg(interface))
                        .args(["static".to_string(), ip.to_string()]),
                    DnsSlot::Secondary => base
                        .args(["add", "dns"])
                        .arg(name_arg(interface))
                        .args([ip.to_string(), "index=2".to_string()]),
                })
            }
            (ChangeTarget::TcpGlobal { setting }, value) => Some(
                netsh()
                    .args(["int", "tcp", "set", "global"])
                    .arg(format!("{}={}", setting.netsh_name(), value)),
            ),
            (ChangeTarget::Registry { setting }, ConfigValue::Number(n)) => Some(
                CommandSpec::new("reg")
                    .args(["add", setting.key(), "/v", setting.value_name()])
                    .args(["/t", "REG_DWORD", "/d"])
                    .arg(n.to_string())
                    .arg("/f"),
            ),
            (
                ChangeTarget::Wlan {
                    setting: WlanSetting::AutoConfig { interface },
                },
                ConfigValue::Toggle(enabled),
            ) => Some(
                netsh()
                    .args(["wlan", "set", "autoconfig"])
                    .arg(format!("enabled={}", yes_no(*enabled)))
                    .arg(format!("interface={}", interface)),
            ),
            (
                ChangeTarget::Wlan {
                    setting: WlanSetting::ShowBlockedNetworks,
                },
                ConfigValue::Toggle(show),
            ) => Some(
                netsh()
                    .args(["wlan", "set", "blockednetworks"])
                    .arg(if *show { "display=show" } else { "display=hide" }),
            ),
            // Flushing is the only write a cache supports
            (
                ChangeTarget::Cache {
                    cache: CacheKind::DnsResolver,
                },
                ConfigValue::Number(0),
            ) => Some(CommandSpec::new("ipconfig").arg("/flushdns")),
            _ => None,
        }
    }

    fn clear_command(&self, target: &ChangeTarget, written: &ConfigValue) -> Option<CommandSpec> {
        match (target, written) {
            (ChangeTarget::Registry { setting }, _) => Some(
                CommandSpec::new("reg")
                    .args(["delete", setting.key(), "/v", setting.value_name(), "/f"]),
            ),
            (
                ChangeTarget::DnsServer {
                    interface,
                    slot: DnsSlot::Primary,
                },
                ConfigValue::Ip(IpAddr::V4(_)),
            ) => Some(
                netsh()
                    .args(["interface", "ip", "set", "dns"])
                    .arg(name_arg(interface))
                    .arg("source=dhcp"),
            ),
            (
                ChangeTarget::DnsServer {
                    interface,
                    slot: DnsSlot::Secondary,
                },
                ConfigValue::Ip(ip @ IpAddr::V4(_)),
            ) => Some(
                netsh()
                    .args(["interface", "ip", "delete", "dns"])
                    .arg(name_arg(interface))
                    .arg(ip.to_string()),
            ),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(stdout: &str) -> CommandOutput {
        CommandOutput {
            exit_code: 0,
            stdout: stdout.to_string(),
            stderr: String::new(),
            duration_ms: 5,
            timed_out: false,
        }
    }

    fn failed(stderr: &str) -> CommandOutput {
        CommandOutput {
            exit_code: 1,
            stdout: String::new(),
            stderr: stderr.to_string(),
            duration_ms: 5,
            timed_out: false,
        }
    }

    const TCP_GLOBAL: &str = "Querying active state...

TCP Global Parameters
----------------------------------------------
Receive-Side Scaling State          : enabled
Receive Window Auto-Tuning Level    : normal
Add-On Congestion Control Provider  : default
ECN Capability                      : disabled
RFC 1323 Timestamps                 : disabled
Initial RTO                         : 1000
Receive Segment Coalescing State    : enabled
Non Sack Rtt Resiliency             : disabled
Max SYN Retransmissions             : 4
Fast Open                           : enabled
";

    fn wifi() -> InterfaceName {
        InterfaceName::new("Wi-Fi").unwrap()
    }

    #[test]
    fn test_parse_tcp_global() {
        let output = ok(TCP_GLOBAL);
        let commands = WindowsCommands;

        assert_eq!(
            commands.parse_observation(&ChangeTarget::tcp(TcpSetting::EcnCapability), &output),
            Observed::Value(ConfigValue::Toggle(false))
        );
        assert_eq!(
            commands.parse_observation(&ChangeTarget::tcp(TcpSetting::AutoTuningLevel), &output),
            Observed::Value(ConfigValue::Level("normal".to_string()))
        );
        assert_eq!(
            commands.parse_observation(&ChangeTarget::tcp(TcpSetting::InitialRto), &output),
            Observed::Value(ConfigValue::Number(1000))
        );
        assert_eq!(
            commands.parse_observation(
                &ChangeTarget::tcp(TcpSetting::MaxSynRetransmissions),
                &output
            ),
            Observed::Value(ConfigValue::Number(4))
        );
        // Removed from recent Windows builds
        assert_eq!(
            commands.parse_observation(&ChangeTarget::tcp(TcpSetting::Chimney), &output),
            Observed::Unavailable
        );
    }

    #[test]
    fn test_parse_reg_query() {
        let output = ok("
HKEY_LOCAL_MACHINE\\SYSTEM\\CurrentControlSet\\Services\\Tcpip\\Parameters
    DefaultTTL    REG_DWORD    0x40

");
        assert_eq!(
            WindowsCommands
                .parse_observation(&ChangeTarget::registry(RegistrySetting::DefaultTtl), &output),
            Observed::Value(ConfigValue::Number(64))
        );

        let missing = failed("ERROR: The system was unable to find the specified registry key or value.");
        assert_eq!(
            WindowsCommands
                .parse_observation(&ChangeTarget::registry(RegistrySetting::SackOpts), &missing),
            Observed::Unset
        );
    }

    #[test]
    fn test_parse_dns_servers() {
        let output = ok("
Configuration for interface \"Wi-Fi\"
    Statically Configured DNS Servers:    8.8.8.8
                                          1.1.1.1
    Register with which suffix:           Primary only

");
        assert_eq!(
            WindowsCommands.parse_observation(&ChangeTarget::dns(wifi(), DnsSlot::Secondary), &output),
            Observed::Value(ConfigValue::Ip("1.1.1.1".parse().unwrap()))
        );

        let dhcp_none = ok("
Configuration for interface \"Wi-Fi\"
    DNS servers configured through DHCP:  None
    Register with which suffix:           Primary only
");
        assert_eq!(
            WindowsCommands.parse_observation(&ChangeTarget::dns(wifi(), DnsSlot::Primary), &dhcp_none),
            Observed::Unset
        );

        let dhcp = ok("
Configuration for interface \"Wi-Fi\"
    DNS servers configured through DHCP:  192.168.1.1
                                          192.168.1.2
    Register with which suffix:           Primary only
");
        assert_eq!(
            parse_dns_servers(&dhcp.stdout),
            Some((
                DnsSource::Dhcp,
                vec!["192.168.1.1".parse().unwrap(), "192.168.1.2".parse().unwrap()]
            ))
        );
        for slot in [DnsSlot::Primary, DnsSlot::Secondary] {
            assert_eq!(
                WindowsCommands.parse_observation(&ChangeTarget::dns(wifi(), slot), &dhcp),
                Observed::Unset
            );
        }

        let no_interface = failed("The filename, directory name, or volume label syntax is incorrect.");
        assert_eq!(
            WindowsCommands
                .parse_observation(&ChangeTarget::dns(wifi(), DnsSlot::Primary), &no_interface),
            Observed::Unavailable
        );
    }

    #[test]
    fn test_parse_wlan_settings() {
        let output = ok("
Wireless LAN settings
---------------------
    Show blocked networks in visible network list: No

    Only use GP profiles on GP-configured networks: No

    Auto configuration logic is enabled on interface \"Wi-Fi\"
");
        let autoconfig = ChangeTarget::wlan(WlanSetting::AutoConfig { interface: wifi() });
        assert_eq!(
            WindowsCommands.parse_observation(&autoconfig, &output),
            Observed::Value(ConfigValue::Toggle(true))
        );
        assert_eq!(
            WindowsCommands
                .parse_observation(&ChangeTarget::wlan(WlanSetting::ShowBlockedNetworks), &output),
            Observed::Value(ConfigValue::Toggle(false))
        );

        let other = ChangeTarget::wlan(WlanSetting::AutoConfig {
            interface: InterfaceName::new("Wi-Fi 2").unwrap(),
        });
        assert_eq!(
            WindowsCommands.parse_observation(&other, &output),
            Observed::Unavailable
        );
    }

    #[test]
    fn test_parse_displaydns_counts_records() {
        let output = ok("
Windows IP Configuration

    example.com
    ----------------------------------------
    Record Name . . . . . : example.com
    Record Type . . . . . : 1

    Record Name . . . . . : example.com
    Record Type . . . . . : 28
");
        assert_eq!(
            WindowsCommands.parse_observation(&ChangeTarget::cache(CacheKind::DnsResolver), &output),
            Observed::Value(ConfigValue::Number(2))
        );
    }

    #[test]
    fn test_apply_commands_are_argument_vectors() {
        let primary = WindowsCommands
            .apply_command(
                &ChangeTarget::dns(InterfaceName::new("Local Area Connection").unwrap(), DnsSlot::Primary),
                &ConfigValue::Ip("8.8.8.8".parse().unwrap()),
            )
            .unwrap();
        assert_eq!(primary.program, "netsh");
        assert_eq!(
            primary.args,
            vec!["interface", "ip", "set", "dns", "name=Local Area Connection", "static", "8.8.8.8"]
        );

        let tcp = WindowsCommands
            .apply_command(&ChangeTarget::tcp(TcpSetting::InitialRto), &ConfigValue::Number(2000))
            .unwrap();
        assert_eq!(tcp.to_string(), "netsh int tcp set global initialRto=2000");

        let reg = WindowsCommands
            .apply_command(
                &ChangeTarget::registry(RegistrySetting::TcpNoDelay),
                &ConfigValue::Number(1),
            )
            .unwrap();
        assert_eq!(reg.args[0], "add");
        assert_eq!(reg.args[3], "TCPNoDelay");
        assert_eq!(reg.args.last().unwrap(), "/f");

        let autoconfig = WindowsCommands
            .apply_command(
                &ChangeTarget::wlan(WlanSetting::AutoConfig { interface: wifi() }),
                &ConfigValue::Toggle(false),
            )
            .unwrap();
        assert_eq!(
            autoconfig.to_string(),
            "netsh wlan set autoconfig enabled=no interface=Wi-Fi"
        );
    }

    #[test]
    fn test_cache_only_supports_flush() {
        let cache = ChangeTarget::cache(CacheKind::DnsResolver);
        assert!(WindowsCommands
            .apply_command(&cache, &ConfigValue::Number(0))
            .is_some());
        assert!(WindowsCommands
            .apply_command(&cache, &ConfigValue::Number(12))
            .is_none());
    }

    #[test]
    fn test_clear_commands() {
        let reg = WindowsCommands
            .clear_command(
                &ChangeTarget::registry(RegistrySetting::MaxUserPort),
                &ConfigValue::Number(65534),
            )
            .unwrap();
        assert_eq!(reg.args[0], "delete");

        let secondary = WindowsCommands
            .clear_command(
                &ChangeTarget::dns(wifi(), DnsSlot::Secondary),
                &ConfigValue::Ip("1.1.1.1".parse().unwrap()),
            )
            .unwrap();
        assert_eq!(
            secondary.to_string(),
            "netsh interface ip delete dns name=Wi-Fi 1.1.1.1"
        );
        assert!(WindowsCommands
            .clear_command(&ChangeTarget::tcp(TcpSetting::Rss), &ConfigValue::Toggle(true))
            .is_none());
    }

    #[test]
    fn test_dhcp_primary_is_restored_through_dhcp() {
        let primary = ChangeTarget::dns(wifi(), DnsSlot::Primary);
        let dhcp = ok("
Configuration for interface \"Wi-Fi\"
    DNS servers configured through DHCP:  192.168.1.1
");
        // A DHCP-assigned server is not a value to pin back as static
        assert_eq!(WindowsCommands.parse_observation(&primary, &dhcp), Observed::Unset);

        let restore = WindowsCommands
            .clear_command(&primary, &ConfigValue::Ip("8.8.8.8".parse().unwrap()))
            .unwrap();
        assert_eq!(
            restore.to_string(),
            "netsh interface ip set dns name=Wi-Fi source=dhcp"
        );
        assert!(!restore.args.iter().any(|a| a == "static"));
    }
}
