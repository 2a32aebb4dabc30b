// Report Domain Model - per-descriptor outcomes and run summary

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::change::{ChangeSpec, DescriptorId};
use super::target::Category;
use super::value::{ConfigValue, Observed};

/// Per-descriptor failure, recorded in the report and never raised
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChangeError {
    #[error("command exited with status {exit_code}: {stderr}")]
    CommandFailed { exit_code: i32, stderr: String },

    #[error("command could not run: {message}")]
    CommandError { message: String },

    #[error("verification failed: expected {expected}, observed {observed}")]
    VerificationFailed {
        expected: ConfigValue,
        observed: Observed,
    },

    #[error("target unavailable on this host")]
    TargetUnavailable,

    #[error("cancelled before execution")]
    Cancelled,
}

/// What happened when a failed change was rolled back
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RollbackOutcome {
    /// Previous value re-applied and confirmed by the probe
    Restored { observed: Observed },
    /// Rollback ran but the probe does not show the previous value
    Failed { observed: Observed, reason: String },
    /// Target cannot be rolled back on this host
    NotPossible { reason: String },
}

impl RollbackOutcome {
    pub fn is_restored(&self) -> bool {
        matches!(self, RollbackOutcome::Restored { .. })
    }
}

/// Outcome of one descriptor (immutable once produced)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyResult {
    pub descriptor_id: DescriptorId,
    pub category: Category,
    pub order: u32,
    /// A mutation was made and took effect
    pub applied: bool,
    /// The probe confirmed the target holds the desired value
    pub verified: bool,
    pub desired: ConfigValue,
    pub previous: Observed,
    pub observed: Observed,
    pub rollback: Option<RollbackOutcome>,
    pub error: Option<ChangeError>,
    pub duration_ms: i64,
}

impl ApplyResult {
    /// Result for a descriptor that was never started
    pub fn cancelled(spec: &ChangeSpec) -> Self {
        Self {
            descriptor_id: spec.id.clone(),
            category: spec.category,
            order: spec.order,
            applied: false,
            verified: false,
            desired: spec.desired.clone(),
            previous: Observed::Unavailable,
            observed: Observed::Unavailable,
            rollback: None,
            error: Some(ChangeError::Cancelled),
            duration_ms: 0,
        }
    }

    /// Target holds the desired value after this run
    ///
    /// Covers both a verified mutation and an idempotent no-op
    /// (`applied=false, verified=true`).
    pub fn is_success(&self) -> bool {
        self.verified && self.error.is_none()
    }
}

/// Summary classification of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportOutcome {
    Success,
    Partial,
    Failed,
}

impl fmt::Display for ReportOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportOutcome::Success => write!(f, "SUCCESS"),
            ReportOutcome::Partial => write!(f, "PARTIAL"),
            ReportOutcome::Failed => write!(f, "FAILED"),
        }
    }
}

/// Structured result of one profile run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub run_id: String,
    pub profile: String,
    pub platform: String,
    pub started_at: i64,  // epoch ms
    pub finished_at: i64, // epoch ms
    pub results: Vec<ApplyResult>,
    pub overall_success: bool,
    pub outcome: ReportOutcome,
}

impl Report {
    pub fn new(
        run_id: impl Into<String>,
        profile: impl Into<String>,
        platform: impl Into<String>,
        started_at: i64,
        finished_at: i64,
        results: Vec<ApplyResult>,
    ) -> Self {
        let succeeded = results.iter().filter(|r| r.is_success()).count();
        let overall_success = succeeded == results.len();
        let outcome = if overall_success {
            ReportOutcome::Success
        } else if succeeded > 0 {
            ReportOutcome::Partial
        } else {
            ReportOutcome::Failed
        };

        Self {
            run_id: run_id.into(),
            profile: profile.into(),
            platform: platform.into(),
            started_at,
            finished_at,
            results,
            overall_success,
            outcome,
        }
    }

    pub fn applied_count(&self) -> usize {
        self.results.iter().filter(|r| r.applied).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ApplyResult> {
        self.results.iter().filter(|r| !r.is_success())
    }

    pub fn duration_ms(&self) -> i64 {
        self.finished_at - self.started_at
    }
}
