//! goose-dispatch: provider orchestration for LLM-backed automation.

pub mod api;
pub mod batch;
pub mod config;
pub mod error;
pub mod jobs;
pub mod llm;
pub mod orchestrator;
pub mod overlay;
pub mod provider;
pub mod status;

pub use batch::{BatchResult, BatchRunner};
pub use orchestrator::Orchestrator;
pub use provider::{ProviderClient, ProviderKind, TaskKind, TaskRequest, TaskResult};
pub use status::{StatusAggregator, StatusSnapshot};
