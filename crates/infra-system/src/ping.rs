// System ping adapter
// reason: the OS ping binary avoids raw-socket privileges
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use nettune_core::domain::PingStats;
use nettune_core::port::{CommandExecutor, CommandSpec, DiagnosticsError, ExecutionError, Pinger};

/// Gap between echo requests sent by the OS tool
const SEND_INTERVAL: Duration = Duration::from_secs(1);

/// Slack for process start-up and name resolution
const STARTUP_GRACE: Duration = Duration::from_secs(3);

/// Pings through the platform `ping` binary
///
/// The tool is told when to give up (per-reply wait plus an overall
/// deadline), so an unanswered host still produces a statistics block. The
/// executor timeout only guards against a hung process.
///
/// Uses its own unserialized executor so diagnostics never wait behind a
/// profile run.
pub struct SystemPinger {
    executor: Arc<dyn CommandExecutor>,
}

/// Whole seconds, rounded up, at least one
fn whole_secs(duration: Duration) -> u64 {
    let ms = duration.as_millis() as u64;
    ms.div_ceil(1000).max(1)
}

impl SystemPinger {
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self { executor }
    }

    /// Longest time the tool itself may run
    ///
    /// Windows waits the full reply timeout for every lost request; Unix
    /// tools send on a fixed interval and wait once for late replies.
    fn run_deadline(count: u32, reply_timeout: Duration) -> Duration {
        let count = count.max(1);
        if cfg!(windows) {
            reply_timeout.max(SEND_INTERVAL) * count
        } else {
            SEND_INTERVAL * (count - 1) + Duration::from_secs(whole_secs(reply_timeout))
        }
    }

    /// Executor bound for a run of `count` requests
    fn executor_timeout(count: u32, reply_timeout: Duration) -> Duration {
        Self::run_deadline(count, reply_timeout) + STARTUP_GRACE
    }

    fn command(host: &str, count: u32, reply_timeout: Duration) -> CommandSpec {
        let count = count.max(1);
        let deadline_s = whole_secs(Self::run_deadline(count, reply_timeout));
        let base = CommandSpec::new("ping");

        if cfg!(windows) {
            base.args(["-n".to_string(), count.to_string()])
                .args(["-w".to_string(), reply_timeout.as_millis().max(1).to_string()])
                .arg(host)
        } else if cfg!(target_os = "macos") {
            // macOS: -W is per reply in ms, -t is the overall deadline
            base.args(["-c".to_string(), count.to_string()])
                .args(["-W".to_string(), reply_timeout.as_millis().max(1).to_string()])
                .args(["-t".to_string(), deadline_s.to_string()])
                .arg(host)
        } else {
            // iputils: -W is per reply, -w the overall deadline, both in seconds
            base.args(["-c".to_string(), count.to_string()])
                .args(["-W".to_string(), whole_secs(reply_timeout).to_string()])
                .args(["-w".to_string(), deadline_s.to_string()])
                .arg(host)
        }
    }
}

#[async_trait]
impl Pinger for SystemPinger {
    async fn ping(
        &self,
        host: &str,
        count: u32,
        reply_timeout: Duration,
    ) -> Result<PingStats, DiagnosticsError> {
        let command = Self::command(host, count, reply_timeout);
        let output = self
            .executor
            .execute(&command, Self::executor_timeout(count, reply_timeout))
            .await
            .map_err(|e| match e {
                ExecutionError::TimedOut { timeout_ms, .. } => DiagnosticsError::Timeout(timeout_ms),
                other => DiagnosticsError::ToolUnavailable(other.to_string()),
            })?;

        debug!(host, exit_code = output.exit_code, "Ping finished");

        match parse_ping_output(host, &output.stdout) {
            Some(stats) => Ok(stats),
            // No summary block: the host never resolved
            None if !output.success() => {
                let reason = [output.stderr.trim(), output.stdout.trim()]
                    .into_iter()
                    .find(|s| !s.is_empty())
                    .unwrap_or("ping failed")
                    .to_string();
                Err(DiagnosticsError::Unreachable(reason))
            }
            None => Err(DiagnosticsError::Parse(output.stdout)),
        }
    }
}

/// Leading unsigned integer of a fragment such as `4 packets transmitted`
fn leading_number(fragment: &str) -> Option<u32> {
    fragment
        .split_whitespace()
        .next()
        .and_then(|token| token.parse().ok())
}

/// Number after `label =` in `Sent = 4, Received = 4`
fn labelled_number(line: &str, label: &str) -> Option<f64> {
    line.split(',')
        .filter_map(|part| part.split_once('='))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case(label))
        .and_then(|(_, value)| {
            let digits: String = value
                .trim()
                .chars()
                .take_while(|c| c.is_ascii_digit() || *c == '.')
                .collect();
            digits.parse().ok()
        })
}

/// Parse Linux, macOS or Windows ping output
///
/// Returns `None` when no statistics block is present.
pub fn parse_ping_output(host: &str, stdout: &str) -> Option<PingStats> {
    let mut counts = None;
    let mut rtt = None;

    for line in stdout.lines() {
        let line = line.trim();
        let lower = line.to_ascii_lowercase();

        if lower.contains("packets transmitted") {
            let mut parts = line.split(',');
            let transmitted = parts.next().and_then(leading_number);
            let received = parts.next().and_then(leading_number);
            if let (Some(t), Some(r)) = (transmitted, received) {
                counts = Some((t, r));
            }
        } else if lower.starts_with("packets:") {
            let body = &line["packets:".len()..];
            let sent = labelled_number(body, "Sent");
            let received = labelled_number(body, "Received");
            if let (Some(t), Some(r)) = (sent, received) {
                counts = Some((t as u32, r as u32));
            }
        } else if lower.contains("min/avg/max") {
            let values: Vec<f64> = line
                .split_once('=')
                .map(|(_, v)| v.trim().trim_end_matches("ms").trim())
                .unwrap_or("")
                .split('/')
                .filter_map(|v| v.trim().parse().ok())
                .collect();
            if values.len() >= 3 {
                rtt = Some((values[0], values[1], values[2]));
            }
        } else if lower.starts_with("minimum") {
            let min = labelled_number(line, "Minimum");
            let max = labelled_number(line, "Maximum");
            let avg = labelled_number(line, "Average");
            if let (Some(min), Some(avg), Some(max)) = (min, avg, max) {
                rtt = Some((min, avg, max));
            }
        }
    }

    let (transmitted, received) = counts?;
    let received = received.min(transmitted);
    let packet_loss_pct = if transmitted == 0 {
        100.0
    } else {
        f64::from(transmitted - received) * 100.0 / f64::from(transmitted)
    };
    let alive = received > 0;
    let (min_ms, avg_ms, max_ms) = match (alive, rtt) {
        (true, Some((min, avg, max))) => (Some(min), Some(avg), Some(max)),
        _ => (None, None, None),
    };

    Some(PingStats {
        host: host.to_string(),
        alive,
        transmitted,
        received,
        min_ms,
        max_ms,
        avg_ms,
        packet_loss_pct,
    })
}
