//! Edge cases: unavailable targets, command failures, cancellation,
//! irreversible targets and unset previous values

mod common;

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use common::{harness, seed_tuned, seed_untuned, TIMEOUT};
use nettune_core::application::{
    builtin_catalog, cancel_channel, CancelSender, RunOptions, TuningOrchestrator,
};
use nettune_core::domain::{
    CacheKind, ChangeError, ChangeTarget, ConfigValue, Observed, RegistrySetting,
    ReportOutcome, RollbackOutcome, TcpSetting,
};
use nettune_core::port::id_provider::SequentialIdProvider;
use nettune_core::port::mocks::FakeHost;
use nettune_core::port::time_provider::SystemTimeProvider;
use nettune_core::port::{CommandExecutor, CommandOutput, CommandSpec, ExecutionError};
use nettune_infra_system::{CommandProbe, SerializedExecutor, WindowsCommands};

/// Targets missing on the host are reported without commands or rollback
#[tokio::test]
async fn test_unavailable_targets_issue_no_commands() {
    let h = harness();
    let specs = seed_untuned(&h, "WiFi");
    for spec in &specs {
        h.host.mark_unavailable(&spec.target);
    }

    let report = h.service.apply_profile("WiFi").await.unwrap();

    assert_eq!(report.outcome, ReportOutcome::Failed);
    for result in &report.results {
        assert_eq!(result.error, Some(ChangeError::TargetUnavailable));
        assert!(result.rollback.is_none());
        assert!(!result.applied && !result.verified);
    }
    assert_eq!(h.host.mutation_count(), 0);
}

/// A rejected write is recorded and the run moves on
#[tokio::test]
async fn test_command_failure_is_recorded_per_descriptor() {
    let h = harness();
    seed_untuned(&h, "Registry");
    let ttl = ChangeTarget::registry(RegistrySetting::DefaultTtl);
    h.host.fail_writes(&ttl);

    let report = h.service.apply_profile("Registry").await.unwrap();

    let failed: Vec<_> = report.failures().collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].descriptor_id, ttl.key());
    match &failed[0].error {
        Some(ChangeError::CommandFailed { exit_code, stderr }) => {
            assert_eq!(*exit_code, 1);
            assert!(stderr.contains("access denied"));
        }
        other => panic!("expected command failure, got {:?}", other),
    }
    // The value never changed, so there is nothing to roll back
    assert!(failed[0].rollback.is_none());
    assert_eq!(report.applied_count(), report.results.len() - 1);
}

/// A registry value that did not exist is deleted again on rollback
#[tokio::test]
async fn test_unset_registry_value_is_cleared_on_rollback() {
    let h = harness();
    seed_tuned(&h, "Registry");
    let target = ChangeTarget::registry(RegistrySetting::MaxUserPort);
    h.host.unset(&target);
    h.host.drift_next_write(&target, ConfigValue::Number(5000));

    let report = h.service.apply_profile("Registry").await.unwrap();

    let result = report
        .results
        .iter()
        .find(|r| r.descriptor_id == target.key())
        .unwrap();
    assert_eq!(result.previous, Observed::Unset);
    assert!(result.rollback.as_ref().unwrap().is_restored());
    assert_eq!(h.host.value(&target), Observed::Unset);
}

/// Pinned entries surviving a flush still count as flushed
#[tokio::test]
async fn test_cache_flush_with_remaining_entries_is_verified() {
    let h = harness();
    let cache = ChangeTarget::cache(CacheKind::DnsResolver);
    h.host.set(&cache, ConfigValue::Number(40));
    // Hosts-file entries stay in the cache
    h.host.drift_next_write(&cache, ConfigValue::Number(3));

    let report = h.service.apply_profile("Cache").await.unwrap();

    let result = &report.results[0];
    assert!(result.applied && result.verified);
    assert!(result.error.is_none());
    assert_eq!(result.observed, Observed::Value(ConfigValue::Number(3)));
    assert!(report.overall_success);
}

/// A flushed cache cannot be refilled
#[tokio::test]
async fn test_cache_verification_failure_is_not_rolled_back() {
    let h = harness();
    let cache = ChangeTarget::cache(CacheKind::DnsResolver);
    h.host.set(&cache, ConfigValue::Number(40));
    // The flush did nothing and lookups kept filling the cache
    h.host.drift_next_write(&cache, ConfigValue::Number(55));

    let report = h.service.apply_profile("Cache").await.unwrap();

    let result = &report.results[0];
    assert!(!result.verified);
    assert!(matches!(
        result.rollback,
        Some(RollbackOutcome::NotPossible { .. })
    ));
    assert_eq!(h.host.mutation_count(), 1);
}

/// An already expired deadline cancels every descriptor
#[tokio::test]
async fn test_expired_deadline_cancels_all() {
    let h = harness();
    seed_untuned(&h, "TCP");

    let report = h
        .service
        .apply_profile_with(
            "TCP",
            RunOptions {
                deadline: Some(Duration::ZERO),
                cancel: None,
            },
        )
        .await
        .unwrap();

    assert!(report
        .results
        .iter()
        .all(|r| r.error == Some(ChangeError::Cancelled) && !r.applied && !r.verified));
    assert_eq!(report.outcome, ReportOutcome::Failed);
    assert_eq!(h.host.mutation_count(), 0);
}

/// Cancels the run after a fixed number of mutations
struct CancelAfter {
    inner: Arc<dyn CommandExecutor>,
    sender: CancelSender,
    writes: AtomicUsize,
    limit: usize,
}

#[async_trait]
impl CommandExecutor for CancelAfter {
    async fn execute(
        &self,
        command: &CommandSpec,
        timeout: Duration,
    ) -> Result<CommandOutput, ExecutionError> {
        let output = self.inner.execute(command, timeout).await;
        if command.args.first().map(String::as_str) == Some("set")
            && self.writes.fetch_add(1, Ordering::SeqCst) + 1 >= self.limit
        {
            self.sender.cancel();
        }
        output
    }
}

/// Cancelling mid-run leaves finished changes applied
#[tokio::test]
async fn test_cancel_mid_run_reports_remaining_as_cancelled() {
    let host = Arc::new(FakeHost::new());
    let settings = common::settings();
    let catalog = builtin_catalog(&settings).unwrap();
    let tcp = catalog.resolve("TCP").unwrap().clone();
    for spec in tcp.specs() {
        host.set(&spec.target, common::other_value(&spec.desired));
    }

    let (sender, token) = cancel_channel();
    let serialized: Arc<dyn CommandExecutor> = Arc::new(SerializedExecutor::new(host.clone()));
    let executor = Arc::new(CancelAfter {
        inner: serialized.clone(),
        sender,
        writes: AtomicUsize::new(0),
        limit: 3,
    });
    let orchestrator = TuningOrchestrator::new(
        Arc::new(catalog),
        executor,
        Arc::new(CommandProbe::new(serialized, host.clone(), TIMEOUT)),
        host.clone(),
        Arc::new(SystemTimeProvider),
        Arc::new(SequentialIdProvider::default()),
        TIMEOUT,
    );

    let report = orchestrator
        .apply_profile_with(
            "TCP",
            RunOptions {
                deadline: None,
                cancel: Some(token),
            },
        )
        .await
        .unwrap();

    assert_eq!(report.results.len(), tcp.len());
    assert!(report.results[..3].iter().all(|r| r.applied && r.verified));
    assert!(report.results[3..]
        .iter()
        .all(|r| r.error == Some(ChangeError::Cancelled)));
    assert_eq!(report.outcome, ReportOutcome::Partial);

    // Applied changes are left in place
    let first = &tcp.specs()[0];
    assert_eq!(host.value(&first.target), Observed::Value(first.desired.clone()));
}

/// A command that outlives its timeout is reported as a command error
#[tokio::test]
async fn test_timed_out_write_is_a_command_error() {
    // Fast reads, slow writes
    struct SlowWrites(Arc<FakeHost>);

    #[async_trait]
    impl CommandExecutor for SlowWrites {
        async fn execute(
            &self,
            command: &CommandSpec,
            timeout: Duration,
        ) -> Result<CommandOutput, ExecutionError> {
            if command.args.first().map(String::as_str) == Some("set") {
                tokio::time::sleep(timeout).await;
                return Err(ExecutionError::TimedOut {
                    command: command.to_string(),
                    timeout_ms: timeout.as_millis() as u64,
                    output: CommandOutput {
                        exit_code: -1,
                        stdout: String::new(),
                        stderr: String::new(),
                        duration_ms: timeout.as_millis() as i64,
                        timed_out: true,
                    },
                });
            }
            self.0.execute(command, timeout).await
        }
    }

    let host = Arc::new(FakeHost::new());
    let catalog = builtin_catalog(&common::settings()).unwrap();
    for spec in catalog.resolve("TCP").unwrap().specs() {
        host.set(&spec.target, spec.desired.clone());
    }
    let target = ChangeTarget::tcp(TcpSetting::Rss);
    host.set(&target, ConfigValue::Toggle(false));
    let orchestrator = TuningOrchestrator::new(
        Arc::new(catalog),
        Arc::new(SlowWrites(host.clone())),
        host.clone(),
        host.clone(),
        Arc::new(SystemTimeProvider),
        Arc::new(SequentialIdProvider::default()),
        Duration::from_millis(50),
    );

    let report = orchestrator.apply_profile("TCP").await.unwrap();

    let result = report
        .results
        .iter()
        .find(|r| r.descriptor_id == target.key())
        .unwrap();
    assert!(matches!(result.error, Some(ChangeError::CommandError { .. })));
    assert!(result.rollback.is_none());
    assert_eq!(report.failures().count(), 1);
}

/// Dry run reads every target and changes nothing
#[tokio::test]
async fn test_plan_reads_without_mutating() {
    let h = harness();
    let specs = seed_untuned(&h, "registry");

    let descriptors = h.service.plan("REGISTRY").await.unwrap();

    assert_eq!(descriptors.len(), specs.len());
    assert!(descriptors.iter().all(|d| !d.is_already_applied()));
    assert_eq!(h.host.read_count(), specs.len());
    assert_eq!(h.host.mutation_count(), 0);
}

/// `netsh interface ip` DNS state of one interface
struct NetshDns {
    state: std::sync::Mutex<NetshDnsState>,
}

struct NetshDnsState {
    dhcp: bool,
    servers: Vec<String>,
    /// A static write stores this server instead of the requested one
    pin_instead: Option<String>,
}

const DHCP_SERVER: &str = "192.168.1.1";

impl NetshDns {
    fn dhcp(pin_instead: &str) -> Self {
        Self {
            state: std::sync::Mutex::new(NetshDnsState {
                dhcp: true,
                servers: vec![DHCP_SERVER.to_string()],
                pin_instead: Some(pin_instead.to_string()),
            }),
        }
    }

    fn show(state: &NetshDnsState) -> String {
        let label = if state.dhcp {
            "DNS servers configured through DHCP:"
        } else {
            "Statically Configured DNS Servers:"
        };
        let mut out = format!("Configuration for interface \"Wi-Fi\"\n    {}  ", label);
        match state.servers.split_first() {
            None => out.push_str("None\n"),
            Some((first, rest)) => {
                out.push_str(first);
                out.push('\n');
                for server in rest {
                    out.push_str(&format!("                                          {}\n", server));
                }
            }
        }
        out
    }
}

#[async_trait]
impl CommandExecutor for NetshDns {
    async fn execute(
        &self,
        command: &CommandSpec,
        _timeout: Duration,
    ) -> Result<CommandOutput, ExecutionError> {
        let mut state = self.state.lock().unwrap();
        let args: Vec<&str> = command.args.iter().map(String::as_str).collect();
        let (exit_code, stdout) = match args.as_slice() {
            ["interface", "ip", "show", "dns", _] => (0, Self::show(&state)),
            ["interface", "ip", "set", "dns", _, "source=dhcp"] => {
                state.dhcp = true;
                state.servers = vec![DHCP_SERVER.to_string()];
                (0, "Ok.".to_string())
            }
            ["interface", "ip", "set", "dns", _, "static", ip] => {
                let stored = state.pin_instead.take().unwrap_or_else(|| ip.to_string());
                state.dhcp = false;
                state.servers = vec![stored];
                (0, "Ok.".to_string())
            }
            ["interface", "ip", "add", "dns", _, ip, "index=2"] if !state.dhcp => {
                state.servers.push(ip.to_string());
                (0, "Ok.".to_string())
            }
            _ => (1, "The parameter is incorrect.".to_string()),
        };
        Ok(CommandOutput {
            exit_code,
            stdout,
            stderr: String::new(),
            duration_ms: 0,
            timed_out: false,
        })
    }
}

/// Rolling back a DHCP interface hands it back to DHCP instead of pinning
/// the old server as static
#[tokio::test]
async fn test_dhcp_dns_is_restored_to_dhcp_on_rollback() {
    let host = Arc::new(NetshDns::dhcp("9.9.9.9"));
    let commands = Arc::new(WindowsCommands);
    let orchestrator = TuningOrchestrator::new(
        Arc::new(builtin_catalog(&common::settings()).unwrap()),
        host.clone(),
        Arc::new(CommandProbe::new(host.clone(), commands.clone(), TIMEOUT)),
        commands,
        Arc::new(SystemTimeProvider),
        Arc::new(SequentialIdProvider::default()),
        TIMEOUT,
    );

    let report = orchestrator.apply_profile("DNS").await.unwrap();

    let primary = &report.results[0];
    assert_eq!(primary.previous, Observed::Unset);
    assert!(matches!(
        primary.error,
        Some(ChangeError::VerificationFailed { .. })
    ));
    assert!(primary.rollback.as_ref().unwrap().is_restored());

    let state = host.state.lock().unwrap();
    assert!(state.dhcp);
    assert_eq!(state.servers, vec![DHCP_SERVER.to_string()]);
}
