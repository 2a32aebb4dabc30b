//! NetTune CLI - network diagnostics and tuning orchestrator

mod logging;
mod render;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::net::IpAddr;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use nettune_core::application::{
    builtin_catalog, cancel_channel, DiagnosticsRunner, NetTuneService, RunOptions,
    TuningOrchestrator,
};
use nettune_core::domain::InterfaceName;
use nettune_core::port::id_provider::UuidProvider;
use nettune_core::port::time_provider::SystemTimeProvider;
use nettune_core::port::{CommandExecutor, NetworkInventory, TimeProvider};
use nettune_core::Settings;
use nettune_infra_system::{
    host_commands, is_elevated, CommandProbe, HttpSpeedTester, SerializedExecutor,
    SubprocessExecutor, SysinfoInventory, SystemPinger,
};

use render::OutputFormat;

#[derive(Parser)]
#[command(name = "nettune")]
#[command(about = "Network diagnostics and tuning orchestrator", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "table")]
    format: OutputFormat,

    #[command(flatten)]
    settings: SettingsArgs,
}

/// Overrides for the built-in settings
#[derive(Args)]
struct SettingsArgs {
    /// Timeout for a single OS command, in milliseconds
    #[arg(long, global = true, env = "NETTUNE_COMMAND_TIMEOUT_MS")]
    command_timeout_ms: Option<u64>,

    /// Primary DNS server applied by the DNS profile
    #[arg(long, global = true, env = "NETTUNE_DNS_PRIMARY")]
    dns_primary: Option<IpAddr>,

    /// Secondary DNS server applied by the DNS profile
    #[arg(long, global = true, env = "NETTUNE_DNS_SECONDARY")]
    dns_secondary: Option<IpAddr>,

    /// Interfaces receiving DNS changes (default: physical interfaces)
    #[arg(long, global = true, env = "NETTUNE_DNS_INTERFACES", value_delimiter = ',')]
    dns_interfaces: Vec<String>,

    /// WLAN interface for the WiFi profile
    #[arg(long, global = true, env = "NETTUNE_WIFI_INTERFACE")]
    wifi_interface: Option<String>,

    /// Wait for each echo reply, in milliseconds
    #[arg(long, global = true, env = "NETTUNE_PING_TIMEOUT_MS")]
    ping_timeout_ms: Option<u64>,

    /// Base URL of the speed test endpoint
    #[arg(long, global = true, env = "NETTUNE_SPEEDTEST_ENDPOINT")]
    speedtest_endpoint: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List profiles and their changes
    Profiles,

    /// Show what a profile would change, without changing anything
    Plan {
        /// Profile name (DNS, TCP, Registry, WiFi, Cache, All)
        profile: String,
    },

    /// Apply a profile, verifying every change
    Apply {
        /// Profile name (DNS, TCP, Registry, WiFi, Cache, All)
        profile: String,

        /// Stop starting new changes after this many milliseconds
        #[arg(long)]
        deadline_ms: Option<u64>,
    },

    /// Read-only network diagnostics
    Diag {
        #[command(subcommand)]
        command: DiagCommands,
    },

    /// Show host network inventory
    Snapshot,
}

#[derive(Subcommand)]
enum DiagCommands {
    /// Ping a host
    Ping {
        /// IP address or host name
        host: String,

        /// Echo requests to send (1-100)
        #[arg(short = 'c', long)]
        count: Option<u32>,
    },

    /// Measure latency, download and upload throughput
    Speedtest {
        /// Time budget in milliseconds
        #[arg(long)]
        max_duration_ms: Option<u64>,
    },
}

/// Physical interfaces, used when no DNS interfaces are configured
async fn default_dns_interfaces(inventory: &dyn NetworkInventory) -> Vec<String> {
    inventory
        .snapshot()
        .await
        .interfaces
        .into_iter()
        .filter(|iface| !iface.is_virtual())
        .map(|iface| iface.name)
        .filter(|name| InterfaceName::new(name.as_str()).is_ok())
        .collect()
}

async fn resolve_settings(args: SettingsArgs, inventory: &dyn NetworkInventory) -> Result<Settings> {
    let mut settings = Settings::default();

    if let Some(ms) = args.command_timeout_ms {
        settings.command_timeout = Duration::from_millis(ms);
    }
    if let Some(ip) = args.dns_primary {
        settings.dns_primary = ip;
    }
    if let Some(ip) = args.dns_secondary {
        settings.dns_secondary = ip;
    }
    if let Some(name) = args.wifi_interface {
        settings.wifi_interface = name;
    }
    if let Some(ms) = args.ping_timeout_ms {
        settings.ping_timeout = Duration::from_millis(ms);
    }
    if let Some(endpoint) = args.speedtest_endpoint {
        settings.speedtest_endpoint = endpoint;
    }
    settings.dns_interfaces = if args.dns_interfaces.is_empty() {
        default_dns_interfaces(inventory).await
    } else {
        args.dns_interfaces
    };

    settings.validate().context("Invalid settings")?;
    Ok(settings)
}

/// Wire adapters into the service (DI)
fn build_service(settings: &Settings, inventory: Arc<dyn NetworkInventory>) -> Result<NetTuneService> {
    let time_provider: Arc<dyn TimeProvider> = Arc::new(SystemTimeProvider);
    let subprocess: Arc<dyn CommandExecutor> =
        Arc::new(SubprocessExecutor::with_default_env(time_provider.clone()));
    let serialized: Arc<dyn CommandExecutor> =
        Arc::new(SerializedExecutor::new(subprocess.clone()));
    let commands = host_commands();

    let probe = Arc::new(CommandProbe::new(
        serialized.clone(),
        commands.clone(),
        settings.command_timeout,
    ));
    let catalog = builtin_catalog(settings).context("Failed to build profile catalog")?;

    let orchestrator = TuningOrchestrator::new(
        Arc::new(catalog),
        serialized,
        probe,
        commands,
        time_provider.clone(),
        Arc::new(UuidProvider),
        settings.command_timeout,
    );

    let speed_tester = HttpSpeedTester::new(settings.speedtest_endpoint.clone())
        .context("Failed to create HTTP client")?;
    let diagnostics = DiagnosticsRunner::new(
        Arc::new(SystemPinger::new(subprocess)),
        Arc::new(speed_tester),
        inventory,
        time_provider,
        settings.ping_timeout,
    );

    Ok(NetTuneService::new(
        Arc::new(orchestrator),
        Arc::new(diagnostics),
    ))
}

async fn apply(
    service: &NetTuneService,
    profile: &str,
    deadline_ms: Option<u64>,
    format: OutputFormat,
) -> Result<ExitCode> {
    if !is_elevated() {
        warn!("Not running with administrator/root privileges; changes will likely fail");
        eprintln!(
            "{}",
            "warning: not elevated, most changes need administrator/root privileges".yellow()
        );
    }

    // Ctrl-C stops the run between changes; finished changes stay applied
    let (cancel, token) = cancel_channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling remaining changes");
            cancel.cancel();
        }
    });

    let options = RunOptions {
        deadline: deadline_ms.map(Duration::from_millis),
        cancel: Some(token),
    };
    let report = service.apply_profile_with(profile, options).await?;
    render::report(&report, format)?;

    Ok(if report.overall_success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let _log_guard = logging::init()?;
    let cli = Cli::parse();

    info!("NetTune v{} starting", nettune_core::VERSION);

    let inventory: Arc<dyn NetworkInventory> = Arc::new(SysinfoInventory::new());
    let settings = resolve_settings(cli.settings, inventory.as_ref()).await?;
    let service = build_service(&settings, inventory)?;
    let format = cli.format;

    match cli.command {
        Commands::Profiles => render::profiles(service.profiles(), format)?,

        Commands::Plan { profile } => {
            let descriptors = service.plan(&profile).await?;
            render::plan(&profile, &descriptors, format)?;
        }

        Commands::Apply {
            profile,
            deadline_ms,
        } => return apply(&service, &profile, deadline_ms, format).await,

        Commands::Diag { command } => match command {
            DiagCommands::Ping { host, count } => {
                let stats = service
                    .run_ping(&host, count.unwrap_or(settings.ping_count))
                    .await?;
                render::ping(&stats, format)?;
                if !stats.alive {
                    return Ok(ExitCode::FAILURE);
                }
            }
            DiagCommands::Speedtest { max_duration_ms } => {
                let budget = max_duration_ms
                    .unwrap_or(settings.speedtest_max_duration.as_millis() as u64);
                let result = service.run_speed_test(budget).await?;
                render::speed_test(&result, format)?;
            }
        },

        Commands::Snapshot => {
            let snapshot = service.get_network_snapshot().await;
            render::snapshot(&snapshot, format)?;
        }
    }

    Ok(ExitCode::SUCCESS)
}
