// Output rendering: table (human), json and kv (scripting)

use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use tabled::{Table, Tabled};

use nettune_core::domain::{
    ApplyResult, ChangeDescriptor, NetworkSnapshot, Observed, PingStats, Profile, Report,
    ReportOutcome, RollbackOutcome, SpeedTestResult,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Kv,
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn opt_ms(value: Option<f64>) -> String {
    value.map(|v| format!("{:.1}", v)).unwrap_or_else(|| "-".to_string())
}

// ============================================================================
// Profiles
// ============================================================================

#[derive(Tabled)]
struct SpecRow {
    profile: String,
    order: u32,
    descriptor: String,
    desired: String,
}

#[derive(Serialize)]
struct ProfileView<'a> {
    name: &'a str,
    descriptors: &'a [nettune_core::domain::ChangeSpec],
}

pub fn profiles(profiles: &[Profile], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let views: Vec<ProfileView> = profiles
                .iter()
                .map(|p| ProfileView {
                    name: p.name(),
                    descriptors: p.specs(),
                })
                .collect();
            print_json(&views)
        }
        OutputFormat::Kv => {
            for profile in profiles {
                for spec in profile.specs() {
                    println!("{}.{}={}", profile.name(), spec.id, spec.desired);
                }
            }
            Ok(())
        }
        OutputFormat::Table => {
            let rows: Vec<SpecRow> = profiles
                .iter()
                .filter(|p| p.name() != nettune_core::domain::ALL_PROFILE)
                .flat_map(|p| {
                    p.specs().iter().map(move |spec| SpecRow {
                        profile: p.name().to_string(),
                        order: spec.order,
                        descriptor: spec.id.clone(),
                        desired: spec.desired.to_string(),
                    })
                })
                .collect();
            println!("{}", "Profiles".cyan().bold());
            println!(
                "  {}",
                profiles
                    .iter()
                    .map(|p| format!("{} ({})", p.name(), p.len()))
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            println!();
            println!("{}", Table::new(rows));
            Ok(())
        }
    }
}

// ============================================================================
// Plan
// ============================================================================

#[derive(Tabled)]
struct PlanRow {
    order: u32,
    descriptor: String,
    current: String,
    desired: String,
    action: &'static str,
}

fn planned_action(descriptor: &ChangeDescriptor) -> &'static str {
    match &descriptor.previous {
        Observed::Unavailable => "skip (unavailable)",
        _ if descriptor.is_already_applied() => "none",
        _ => "change",
    }
}

pub fn plan(profile: &str, descriptors: &[ChangeDescriptor], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(descriptors),
        OutputFormat::Kv => {
            for d in descriptors {
                println!(
                    "{} current={} desired={} action={}",
                    d.id,
                    d.previous,
                    d.desired,
                    planned_action(d)
                );
            }
            Ok(())
        }
        OutputFormat::Table => {
            let changes = descriptors
                .iter()
                .filter(|d| planned_action(d) == "change")
                .count();
            println!(
                "{} {} ({} of {} would change)",
                "Plan for".cyan().bold(),
                profile.bold(),
                changes,
                descriptors.len()
            );
            println!();
            let rows: Vec<PlanRow> = descriptors
                .iter()
                .map(|d| PlanRow {
                    order: d.order,
                    descriptor: d.id.clone(),
                    current: d.previous.to_string(),
                    desired: d.desired.to_string(),
                    action: planned_action(d),
                })
                .collect();
            println!("{}", Table::new(rows));
            Ok(())
        }
    }
}

// ============================================================================
// Report
// ============================================================================

#[derive(Tabled)]
struct ResultRow {
    order: u32,
    descriptor: String,
    previous: String,
    observed: String,
    status: &'static str,
    rollback: String,
    error: String,
}

fn result_status(result: &ApplyResult) -> &'static str {
    match (result.is_success(), result.applied) {
        (true, true) => "applied",
        (true, false) => "unchanged",
        (false, _) => "failed",
    }
}

fn rollback_text(rollback: &Option<RollbackOutcome>) -> String {
    match rollback {
        None => "-".to_string(),
        Some(RollbackOutcome::Restored { .. }) => "restored".to_string(),
        Some(RollbackOutcome::Failed { reason, .. }) => format!("failed: {}", reason),
        Some(RollbackOutcome::NotPossible { reason }) => format!("not possible: {}", reason),
    }
}

pub fn report(report: &Report, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(report),
        OutputFormat::Kv => {
            println!("run_id={}", report.run_id);
            println!("profile={}", report.profile);
            println!("platform={}", report.platform);
            println!("outcome={}", report.outcome);
            println!("overall_success={}", report.overall_success);
            println!("duration_ms={}", report.duration_ms());
            for r in &report.results {
                println!(
                    "{} status={} applied={} verified={} previous={} observed={}",
                    r.descriptor_id,
                    result_status(r),
                    r.applied,
                    r.verified,
                    r.previous,
                    r.observed
                );
            }
            Ok(())
        }
        OutputFormat::Table => {
            let rows: Vec<ResultRow> = report
                .results
                .iter()
                .map(|r| ResultRow {
                    order: r.order,
                    descriptor: r.descriptor_id.clone(),
                    previous: r.previous.to_string(),
                    observed: r.observed.to_string(),
                    status: result_status(r),
                    rollback: rollback_text(&r.rollback),
                    error: r
                        .error
                        .as_ref()
                        .map(|e| e.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                })
                .collect();
            println!("{}", Table::new(rows));
            println!();

            let headline = format!(
                "{} {}: {} applied, {} failed of {} ({} ms)",
                report.profile,
                report.outcome,
                report.applied_count(),
                report.failures().count(),
                report.results.len(),
                report.duration_ms()
            );
            let headline = match report.outcome {
                ReportOutcome::Success => headline.green().bold(),
                ReportOutcome::Partial => headline.yellow().bold(),
                ReportOutcome::Failed => headline.red().bold(),
            };
            println!("{}", headline);
            println!("  {} {}", "Run ID:".bold(), report.run_id);
            println!("  {} {}", "Platform:".bold(), report.platform);
            Ok(())
        }
    }
}

// ============================================================================
// Diagnostics
// ============================================================================

pub fn ping(stats: &PingStats, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(stats),
        OutputFormat::Kv => {
            println!("host={}", stats.host);
            println!("alive={}", stats.alive);
            println!("transmitted={}", stats.transmitted);
            println!("received={}", stats.received);
            println!("min_ms={}", opt_ms(stats.min_ms));
            println!("avg_ms={}", opt_ms(stats.avg_ms));
            println!("max_ms={}", opt_ms(stats.max_ms));
            println!("packet_loss_pct={:.1}", stats.packet_loss_pct);
            Ok(())
        }
        OutputFormat::Table => {
            let status = if stats.alive {
                "ONLINE".green()
            } else {
                "OFFLINE".red()
            };
            println!("{} {}", "Ping".cyan().bold(), stats.host);
            println!("  {} {}", "Status:".bold(), status);
            println!(
                "  {} {}/{} received",
                "Packets:".bold(),
                stats.received,
                stats.transmitted
            );
            println!("  {} {:.1}%", "Loss:".bold(), stats.packet_loss_pct);
            println!(
                "  {} min {} / avg {} / max {} ms",
                "RTT:".bold(),
                opt_ms(stats.min_ms),
                opt_ms(stats.avg_ms),
                opt_ms(stats.max_ms)
            );
            Ok(())
        }
    }
}

pub fn speed_test(result: &SpeedTestResult, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(result),
        OutputFormat::Kv => {
            println!("download_mbps={:.2}", result.download_mbps);
            println!("upload_mbps={:.2}", result.upload_mbps);
            println!("ping_ms={:.1}", result.ping_ms);
            println!("provider={}", result.provider);
            println!("duration_ms={}", result.duration_ms);
            Ok(())
        }
        OutputFormat::Table => {
            println!("{} {}", "Speed test".cyan().bold(), result.provider);
            println!("  {} {:.2} Mbps", "Download:".bold(), result.download_mbps);
            println!("  {} {:.2} Mbps", "Upload:".bold(), result.upload_mbps);
            println!("  {} {:.0} ms", "Ping:".bold(), result.ping_ms);
            Ok(())
        }
    }
}

#[derive(Tabled)]
struct InterfaceRow {
    name: String,
    mac: String,
    rx_bytes: u64,
    tx_bytes: u64,
    rx_errors: u64,
    tx_errors: u64,
}

pub fn snapshot(snapshot: &NetworkSnapshot, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(snapshot),
        OutputFormat::Kv => {
            println!("hostname={}", snapshot.hostname.as_deref().unwrap_or("-"));
            println!("os_version={}", snapshot.os_version.as_deref().unwrap_or("-"));
            for iface in &snapshot.interfaces {
                println!(
                    "{} mac={} rx_bytes={} tx_bytes={} rx_packets={} tx_packets={} rx_errors={} tx_errors={}",
                    iface.name,
                    iface.mac,
                    iface.rx_bytes,
                    iface.tx_bytes,
                    iface.rx_packets,
                    iface.tx_packets,
                    iface.rx_errors,
                    iface.tx_errors
                );
            }
            Ok(())
        }
        OutputFormat::Table => {
            println!("{}", "Network snapshot".cyan().bold());
            println!(
                "  {} {}",
                "Host:".bold(),
                snapshot.hostname.as_deref().unwrap_or("-")
            );
            println!(
                "  {} {}",
                "OS:".bold(),
                snapshot.os_version.as_deref().unwrap_or("-")
            );
            println!();
            let rows: Vec<InterfaceRow> = snapshot
                .interfaces
                .iter()
                .map(|i| InterfaceRow {
                    name: i.name.clone(),
                    mac: i.mac.clone(),
                    rx_bytes: i.rx_bytes,
                    tx_bytes: i.tx_bytes,
                    rx_errors: i.rx_errors,
                    tx_errors: i.tx_errors,
                })
                .collect();
            println!("{}", Table::new(rows));
            Ok(())
        }
    }
}
