//! Explicit context handed to callers instead of global client factories.

use std::sync::Arc;

use crate::batch::{BatchResult, BatchRunner};
use crate::config::{GenerationOptions, Settings};
use crate::llm::BackendFactory;
use crate::overlay::OverlayProbe;
use crate::provider::{ProviderClient, ProviderKind, ProviderRegistry, TaskKind, TaskRequest, TaskResult};
use crate::status::{StatusAggregator, StatusSnapshot};

/// Owns the provider registry and overlay probe for one process.
pub struct Orchestrator {
    registry: Arc<ProviderRegistry>,
    probe: Arc<OverlayProbe>,
    status: StatusAggregator,
}

impl Orchestrator {
    pub fn new(settings: Settings, factory: Arc<dyn BackendFactory>) -> Self {
        let probe = Arc::new(OverlayProbe::new(settings.overlay.clone()));
        let registry = Arc::new(ProviderRegistry::new(Arc::new(settings), factory));
        Self::from_parts(registry, probe)
    }

    pub fn from_parts(registry: Arc<ProviderRegistry>, probe: Arc<OverlayProbe>) -> Self {
        let status = StatusAggregator::new(Arc::clone(&registry), Some(Arc::clone(&probe)));
        Self {
            registry,
            probe,
            status,
        }
    }

    /// Provider that serves a task kind.
    pub fn provider_for(kind: TaskKind) -> ProviderKind {
        match kind {
            TaskKind::Analyze | TaskKind::GenerateTasks => ProviderKind::Gemini,
            TaskKind::Automate | TaskKind::Review | TaskKind::ImprovementPlan => ProviderKind::Claude,
        }
    }

    pub fn client(&self, kind: ProviderKind) -> Arc<ProviderClient> {
        self.registry.get(kind)
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    pub fn probe(&self) -> &Arc<OverlayProbe> {
        &self.probe
    }

    pub fn settings(&self) -> &Settings {
        self.registry.settings()
    }

    pub fn status(&self) -> StatusSnapshot {
        self.status.snapshot()
    }

    /// Run one task on the provider that serves its kind.
    pub async fn execute(&self, request: &TaskRequest) -> TaskResult {
        self.execute_with(request, &GenerationOptions::default()).await
    }

    pub async fn execute_with(&self, request: &TaskRequest, options: &GenerationOptions) -> TaskResult {
        let client = self.client(Self::provider_for(request.kind));
        client.execute_with(request, options).await
    }

    /// Run a batch against a single provider.
    pub async fn run_batch(&self, provider: ProviderKind, tasks: &[TaskRequest]) -> BatchResult {
        BatchRunner::new(self.client(provider)).run(tasks).await
    }

    /// Drip-feed automation descriptions to Claude.
    pub async fn run_automation_batch(&self, descriptions: &[String]) -> BatchResult {
        BatchRunner::new(self.client(ProviderKind::Claude))
            .run_automation(descriptions)
            .await
    }
}
