// NetTune Service - library entry point bundling orchestration and diagnostics

use std::sync::Arc;

use crate::application::diagnostics::DiagnosticsRunner;
use crate::application::orchestrator::{RunOptions, TuningOrchestrator};
use crate::domain::{ChangeDescriptor, NetworkSnapshot, PingStats, Profile, Report, SpeedTestResult};
use crate::error::Result;

/// Facade over the tuning orchestrator and the diagnostics runner
#[derive(Clone)]
pub struct NetTuneService {
    orchestrator: Arc<TuningOrchestrator>,
    diagnostics: Arc<DiagnosticsRunner>,
}

impl NetTuneService {
    pub fn new(orchestrator: Arc<TuningOrchestrator>, diagnostics: Arc<DiagnosticsRunner>) -> Self {
        Self {
            orchestrator,
            diagnostics,
        }
    }

    pub fn list_profiles(&self) -> Vec<String> {
        self.orchestrator.list_profiles()
    }

    pub fn profiles(&self) -> &[Profile] {
        self.orchestrator.catalog().profiles()
    }

    pub async fn plan(&self, profile_name: &str) -> Result<Vec<ChangeDescriptor>> {
        self.orchestrator.plan(profile_name).await
    }

    pub async fn apply_profile(&self, profile_name: &str) -> Result<Report> {
        self.orchestrator.apply_profile(profile_name).await
    }

    pub async fn apply_profile_with(
        &self,
        profile_name: &str,
        options: RunOptions,
    ) -> Result<Report> {
        self.orchestrator
            .apply_profile_with(profile_name, options)
            .await
    }

    pub async fn run_speed_test(&self, max_duration_ms: u64) -> Result<SpeedTestResult> {
        self.diagnostics.run_speed_test(max_duration_ms).await
    }

    pub async fn run_ping(&self, host: &str, count: u32) -> Result<PingStats> {
        self.diagnostics.run_ping(host, count).await
    }

    pub async fn get_network_snapshot(&self) -> NetworkSnapshot {
        self.diagnostics.network_snapshot().await
    }
}
