// Tuning Orchestrator - applies a profile, verifies every change, rolls back failures

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::application::cancel::CancelToken;
use crate::application::constants::MIN_COMMAND_TIMEOUT;
use crate::domain::{
    ApplyResult, ChangeDescriptor, ChangeError, ChangeSpec, Observed, Profile, ProfileCatalog,
    Report, RollbackOutcome,
};
use crate::error::{AppError, Result};
use crate::port::{
    CommandExecutor, CommandSpec, IdProvider, PlatformCommands, TimeProvider, VerificationProbe,
};

/// Options for a single profile run
#[derive(Clone, Default)]
pub struct RunOptions {
    /// Run-scoped deadline; descriptors not started before it are cancelled
    pub deadline: Option<Duration>,
    pub cancel: Option<CancelToken>,
}

/// Outcome of one descriptor before timing is attached
struct Applied {
    applied: bool,
    verified: bool,
    observed: Observed,
    rollback: Option<RollbackOutcome>,
    error: Option<ChangeError>,
}

impl Applied {
    fn unavailable(observed: Observed, error: Option<ChangeError>) -> Self {
        Self {
            applied: false,
            verified: false,
            observed,
            rollback: None,
            error: Some(error.unwrap_or(ChangeError::TargetUnavailable)),
        }
    }
}

/// Applies profiles as sequences of verified changes
///
/// At most one run is in flight per orchestrator; a second concurrent call
/// fails with `OrchestratorBusy` instead of queuing.
pub struct TuningOrchestrator {
    catalog: Arc<ProfileCatalog>,
    executor: Arc<dyn CommandExecutor>,
    probe: Arc<dyn VerificationProbe>,
    commands: Arc<dyn PlatformCommands>,
    time_provider: Arc<dyn TimeProvider>,
    id_provider: Arc<dyn IdProvider>,
    command_timeout: Duration,
    run_lock: Mutex<()>,
}

impl TuningOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        catalog: Arc<ProfileCatalog>,
        executor: Arc<dyn CommandExecutor>,
        probe: Arc<dyn VerificationProbe>,
        commands: Arc<dyn PlatformCommands>,
        time_provider: Arc<dyn TimeProvider>,
        id_provider: Arc<dyn IdProvider>,
        command_timeout: Duration,
    ) -> Self {
        Self {
            catalog,
            executor,
            probe,
            commands,
            time_provider,
            id_provider,
            command_timeout,
            run_lock: Mutex::new(()),
        }
    }

    pub fn list_profiles(&self) -> Vec<String> {
        self.catalog.names()
    }

    pub fn catalog(&self) -> &ProfileCatalog {
        &self.catalog
    }

    fn resolve(&self, name: &str) -> Result<&Profile> {
        self.catalog
            .resolve(name)
            .ok_or_else(|| AppError::UnknownProfile(name.to_string()))
    }

    /// Dry run: capture every descriptor's current value without mutating
    pub async fn plan(&self, profile_name: &str) -> Result<Vec<ChangeDescriptor>> {
        let profile = self.resolve(profile_name)?;
        let mut descriptors = Vec::with_capacity(profile.len());
        for spec in profile.specs() {
            let previous = self.probe.read(&spec.target).await;
            descriptors.push(ChangeDescriptor::capture(spec, previous));
        }
        Ok(descriptors)
    }

    /// Apply a profile with default options
    pub async fn apply_profile(&self, profile_name: &str) -> Result<Report> {
        self.apply_profile_with(profile_name, RunOptions::default())
            .await
    }

    /// Apply a profile
    ///
    /// # Errors
    /// - AppError::UnknownProfile if the name is not in the catalog (nothing runs)
    /// - AppError::OrchestratorBusy if another run holds the orchestration lock
    ///
    /// Per-descriptor failures never surface here; they are recorded in the
    /// returned report.
    pub async fn apply_profile_with(
        &self,
        profile_name: &str,
        options: RunOptions,
    ) -> Result<Report> {
        let profile = self.resolve(profile_name)?;

        let _guard = self.run_lock.try_lock().map_err(|_| {
            warn!(profile = %profile.name(), "Rejecting run: orchestrator busy");
            AppError::OrchestratorBusy
        })?;

        let run_id = self.id_provider.generate_id();
        let started_at = self.time_provider.now_millis();
        let deadline = options.deadline.map(|d| Instant::now() + d);

        info!(
            run_id = %run_id,
            profile = %profile.name(),
            descriptors = profile.len(),
            platform = %self.commands.platform(),
            "Starting profile run"
        );

        let mut results = Vec::with_capacity(profile.len());
        for spec in profile.specs() {
            if let Some(reason) = interruption(&options, deadline) {
                info!(
                    run_id = %run_id,
                    descriptor_id = %spec.id,
                    reason,
                    "Descriptor skipped"
                );
                results.push(ApplyResult::cancelled(spec));
                continue;
            }
            results.push(self.apply_change(spec, deadline).await);
        }

        let finished_at = self.time_provider.now_millis();
        let report = Report::new(
            run_id,
            profile.name(),
            self.commands.platform(),
            started_at,
            finished_at,
            results,
        );

        info!(
            run_id = %report.run_id,
            profile = %report.profile,
            outcome = %report.outcome,
            applied = report.applied_count(),
            failed = report.failures().count(),
            duration_ms = report.duration_ms(),
            "Profile run completed"
        );

        Ok(report)
    }

    /// Capture, apply, verify and (if needed) roll back one change
    async fn apply_change(&self, spec: &ChangeSpec, deadline: Option<Instant>) -> ApplyResult {
        let started = self.time_provider.now_millis();

        let previous = self.probe.read(&spec.target).await;
        let descriptor = ChangeDescriptor::capture(spec, previous);
        let outcome = self.apply_descriptor(&descriptor, deadline).await;

        ApplyResult {
            descriptor_id: descriptor.id,
            category: descriptor.category,
            order: descriptor.order,
            applied: outcome.applied,
            verified: outcome.verified,
            desired: descriptor.desired,
            previous: descriptor.previous,
            observed: outcome.observed,
            rollback: outcome.rollback,
            error: outcome.error,
            duration_ms: self.time_provider.now_millis() - started,
        }
    }

    async fn apply_descriptor(
        &self,
        descriptor: &ChangeDescriptor,
        deadline: Option<Instant>,
    ) -> Applied {
        let target = &descriptor.target;

        if !descriptor.previous.is_available() {
            debug!(descriptor_id = %descriptor.id, "Target unavailable, skipping");
            return Applied::unavailable(Observed::Unavailable, None);
        }

        if descriptor.is_already_applied() {
            debug!(
                descriptor_id = %descriptor.id,
                value = %descriptor.desired,
                "Target already at desired value"
            );
            return Applied {
                applied: false,
                verified: true,
                observed: descriptor.previous.clone(),
                rollback: None,
                error: None,
            };
        }

        let Some(command) = self.commands.apply_command(target, &descriptor.desired) else {
            debug!(descriptor_id = %descriptor.id, "No apply command on this platform");
            return Applied::unavailable(descriptor.previous.clone(), None);
        };

        let command_error = self.run(&command, self.timeout_for(deadline)).await;
        let observed = self.probe.read(target).await;

        if !observed.is_available() {
            warn!(descriptor_id = %descriptor.id, "Target vanished after apply");
            return Applied::unavailable(observed, command_error);
        }

        let confirmed = observed.matches(&descriptor.desired)
            || (command_error.is_none() && descriptor.is_flush_confirmed_by(&observed));
        if confirmed {
            if let Some(error) = &command_error {
                warn!(
                    descriptor_id = %descriptor.id,
                    error = %error,
                    "Command reported failure but target holds desired value"
                );
            }
            info!(
                descriptor_id = %descriptor.id,
                previous = %descriptor.previous,
                value = %descriptor.desired,
                "Change applied and verified"
            );
            return Applied {
                applied: true,
                verified: true,
                observed,
                rollback: None,
                error: None,
            };
        }

        let error = command_error.unwrap_or_else(|| ChangeError::VerificationFailed {
            expected: descriptor.desired.clone(),
            observed: observed.clone(),
        });
        warn!(
            descriptor_id = %descriptor.id,
            expected = %descriptor.desired,
            observed = %observed,
            error = %error,
            "Change not verified"
        );

        // Nothing changed, nothing to undo
        let rollback = if observed == descriptor.previous {
            None
        } else {
            Some(self.rollback(descriptor).await)
        };

        Applied {
            applied: false,
            verified: false,
            observed,
            rollback,
            error: Some(error),
        }
    }

    /// Re-apply the previous value of a single descriptor
    async fn rollback(&self, descriptor: &ChangeDescriptor) -> RollbackOutcome {
        let target = &descriptor.target;

        if !target.is_reversible() {
            return RollbackOutcome::NotPossible {
                reason: "target cannot be restored once changed".to_string(),
            };
        }

        let command = match &descriptor.previous {
            Observed::Value(previous) => self.commands.apply_command(target, previous),
            Observed::Unset => self.commands.clear_command(target, &descriptor.desired),
            Observed::Unavailable => None,
        };
        let Some(command) = command else {
            return RollbackOutcome::NotPossible {
                reason: format!("no rollback command on {}", self.commands.platform()),
            };
        };

        warn!(
            descriptor_id = %descriptor.id,
            previous = %descriptor.previous,
            "Rolling back change"
        );

        // Rollback is not bounded by the run deadline
        let command_error = self.run(&command, self.command_timeout).await;
        let observed = self.probe.read(target).await;

        if observed == descriptor.previous {
            info!(descriptor_id = %descriptor.id, "Rollback restored previous value");
            RollbackOutcome::Restored { observed }
        } else {
            let reason = match command_error {
                Some(error) => error.to_string(),
                None => format!("expected {}, observed {}", descriptor.previous, observed),
            };
            warn!(descriptor_id = %descriptor.id, reason = %reason, "Rollback failed");
            RollbackOutcome::Failed { observed, reason }
        }
    }

    /// Run a mutation; `Some` describes why it did not exit cleanly
    async fn run(&self, command: &CommandSpec, timeout: Duration) -> Option<ChangeError> {
        match self.executor.execute(command, timeout).await {
            Ok(output) if output.success() => None,
            Ok(output) => Some(ChangeError::CommandFailed {
                exit_code: output.exit_code,
                stderr: output.stderr.trim().to_string(),
            }),
            Err(e) => Some(ChangeError::CommandError {
                message: e.to_string(),
            }),
        }
    }

    fn timeout_for(&self, deadline: Option<Instant>) -> Duration {
        match deadline {
            Some(deadline) => deadline
                .saturating_duration_since(Instant::now())
                .min(self.command_timeout)
                .max(MIN_COMMAND_TIMEOUT),
            None => self.command_timeout,
        }
    }
}

fn interruption(options: &RunOptions, deadline: Option<Instant>) -> Option<&'static str> {
    if options.cancel.as_ref().is_some_and(|c| c.is_cancelled()) {
        return Some("cancelled");
    }
    if deadline.is_some_and(|d| Instant::now() >= d) {
        return Some("deadline exceeded");
    }
    None
}
