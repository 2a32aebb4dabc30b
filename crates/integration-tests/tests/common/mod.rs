//! Shared wiring: the real orchestrator, catalog, probe and serialized
//! executor over an in-memory fake host.

#![allow(dead_code)]

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use nettune_core::application::{
    builtin_catalog, DiagnosticsRunner, NetTuneService, TuningOrchestrator,
};
use nettune_core::domain::{ChangeSpec, ConfigValue, Profile};
use nettune_core::port::diagnostics::mocks::{MockPinger, MockSpeedTester};
use nettune_core::port::id_provider::SequentialIdProvider;
use nettune_core::port::mocks::FakeHost;
use nettune_core::port::network_inventory::mocks::StaticInventory;
use nettune_core::port::time_provider::SystemTimeProvider;
use nettune_core::port::CommandExecutor;
use nettune_core::Settings;
use nettune_infra_system::{CommandProbe, SerializedExecutor};

pub const TIMEOUT: Duration = Duration::from_secs(2);

pub struct Harness {
    pub host: Arc<FakeHost>,
    pub service: NetTuneService,
}

pub fn settings() -> Settings {
    Settings {
        dns_interfaces: vec!["Wi-Fi".to_string()],
        ..Default::default()
    }
}

pub fn harness() -> Harness {
    harness_with(FakeHost::new(), settings())
}

pub fn harness_with(host: FakeHost, settings: Settings) -> Harness {
    let host = Arc::new(host);
    let executor: Arc<dyn CommandExecutor> = Arc::new(SerializedExecutor::new(host.clone()));
    let probe = Arc::new(CommandProbe::new(executor.clone(), host.clone(), TIMEOUT));
    let catalog = builtin_catalog(&settings).unwrap();

    let orchestrator = TuningOrchestrator::new(
        Arc::new(catalog),
        executor,
        probe,
        host.clone(),
        Arc::new(SystemTimeProvider),
        Arc::new(SequentialIdProvider::default()),
        TIMEOUT,
    );
    let diagnostics = DiagnosticsRunner::new(
        Arc::new(MockPinger::reachable(10.0)),
        Arc::new(MockSpeedTester::fixed(100.0, 20.0)),
        Arc::new(StaticInventory::new(&["eth0"])),
        Arc::new(SystemTimeProvider),
        TIMEOUT,
    );

    Harness {
        host,
        service: NetTuneService::new(Arc::new(orchestrator), Arc::new(diagnostics)),
    }
}

/// A value of the same kind that differs from `desired`
pub fn other_value(desired: &ConfigValue) -> ConfigValue {
    match desired {
        ConfigValue::Toggle(b) => ConfigValue::Toggle(!b),
        ConfigValue::Number(n) => ConfigValue::Number(n + 1),
        ConfigValue::Ip(ip) => {
            let other: IpAddr = "192.168.1.1".parse().unwrap();
            ConfigValue::Ip(if *ip == other { "192.168.1.2".parse().unwrap() } else { other })
        }
        ConfigValue::Level(level) if level == "disabled" => ConfigValue::Level("normal".to_string()),
        ConfigValue::Level(_) => ConfigValue::Level("disabled".to_string()),
    }
}

pub fn profile<'a>(harness: &'a Harness, name: &str) -> &'a Profile {
    harness
        .service
        .profiles()
        .iter()
        .find(|p| p.name().eq_ignore_ascii_case(name))
        .unwrap()
}

/// Seed every target of `profile` with a value that needs changing
pub fn seed_untuned(harness: &Harness, profile_name: &str) -> Vec<ChangeSpec> {
    let specs = profile(harness, profile_name).specs().to_vec();
    for spec in &specs {
        harness.host.set(&spec.target, other_value(&spec.desired));
    }
    specs
}

/// Seed every target of `profile` with its desired value
pub fn seed_tuned(harness: &Harness, profile_name: &str) -> Vec<ChangeSpec> {
    let specs = profile(harness, profile_name).specs().to_vec();
    for spec in &specs {
        harness.host.set(&spec.target, spec.desired.clone());
    }
    specs
}
