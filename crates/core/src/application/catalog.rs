// Built-in profile table
//
// The only place profile contents are defined. Every entry is a typed target
// with a typed value; categories are applied in `Category::ALL` order.

use crate::config::Settings;
use crate::domain::{
    CacheKind, Category, ChangeSpec, ChangeTarget, ConfigValue, DnsSlot, InterfaceName, Profile,
    ProfileCatalog, RegistrySetting, TcpSetting, WlanSetting, ALL_PROFILE,
};
use crate::error::Result;

type Entry = (ChangeTarget, ConfigValue);

fn dns_entries(settings: &Settings) -> Result<Vec<Entry>> {
    let mut entries = Vec::new();
    for interface in settings.dns_interface_names()? {
        entries.push((
            ChangeTarget::dns(interface.clone(), DnsSlot::Primary),
            ConfigValue::Ip(settings.dns_primary),
        ));
        entries.push((
            ChangeTarget::dns(interface, DnsSlot::Secondary),
            ConfigValue::Ip(settings.dns_secondary),
        ));
    }
    Ok(entries)
}

fn tcp_entries() -> Result<Vec<Entry>> {
    use TcpSetting::*;
    Ok(vec![
        (ChangeTarget::tcp(AutoTuningLevel), ConfigValue::level("normal")?),
        (ChangeTarget::tcp(Chimney), ConfigValue::Toggle(true)),
        (ChangeTarget::tcp(Dca), ConfigValue::Toggle(true)),
        (ChangeTarget::tcp(NetDma), ConfigValue::Toggle(true)),
        (ChangeTarget::tcp(EcnCapability), ConfigValue::Toggle(true)),
        (ChangeTarget::tcp(Timestamps), ConfigValue::Toggle(false)),
        (ChangeTarget::tcp(Rss), ConfigValue::Toggle(true)),
        (ChangeTarget::tcp(MaxSynRetransmissions), ConfigValue::Number(2)),
        (ChangeTarget::tcp(InitialRto), ConfigValue::Number(2000)),
        (ChangeTarget::tcp(Rsc), ConfigValue::Toggle(true)),
    ])
}

fn registry_entries() -> Vec<Entry> {
    use RegistrySetting::*;
    [
        (Tcp1323Opts, 1),
        (TcpMaxDupAcks, 2),
        (SackOpts, 1),
        (DefaultTtl, 64),
        (TcpTimedWaitDelay, 30),
        (MaxUserPort, 65534),
        (MaxFreeTcbs, 65536),
        (MaxHashTableSize, 65536),
        (EnableWsd, 0),
        (EnableIcmpRedirect, 0),
        (TcpAckFrequency, 1),
        (TcpNoDelay, 1),
    ]
    .into_iter()
    .map(|(setting, value)| (ChangeTarget::registry(setting), ConfigValue::Number(value)))
    .collect()
}

fn wifi_entries(settings: &Settings) -> Result<Vec<Entry>> {
    let interface = InterfaceName::new(settings.wifi_interface.clone())?;
    Ok(vec![
        (
            ChangeTarget::wlan(WlanSetting::AutoConfig { interface }),
            ConfigValue::Toggle(false),
        ),
        (
            ChangeTarget::wlan(WlanSetting::ShowBlockedNetworks),
            ConfigValue::Toggle(true),
        ),
    ])
}

fn cache_entries() -> Vec<Entry> {
    vec![(
        ChangeTarget::cache(CacheKind::DnsResolver),
        ConfigValue::Number(0),
    )]
}

fn build_profile(name: &str, entries: Vec<Entry>) -> Result<Profile> {
    let specs = entries
        .into_iter()
        .enumerate()
        .map(|(i, (target, desired))| ChangeSpec::new(target, desired, i as u32 + 1))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(Profile::new(name, specs)?)
}

/// Build the process-wide profile catalog
///
/// Yields one profile per category plus `All`, the concatenation of every
/// category in `Category::ALL` order.
pub fn builtin_catalog(settings: &Settings) -> Result<ProfileCatalog> {
    let mut profiles = Vec::with_capacity(Category::ALL.len() + 1);
    for category in Category::ALL {
        let entries = match category {
            Category::Dns => dns_entries(settings)?,
            Category::Tcp => tcp_entries()?,
            Category::Registry => registry_entries(),
            Category::Wifi => wifi_entries(settings)?,
            Category::Cache => cache_entries(),
        };
        profiles.push(build_profile(category.profile_name(), entries)?);
    }

    let all = Profile::concat(ALL_PROFILE, profiles.iter())?;
    profiles.push(all);

    Ok(ProfileCatalog::new(profiles)?)
}
