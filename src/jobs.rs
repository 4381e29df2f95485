//! Background job entry points.
//!
//! Each function is what a task-queue consumer calls for one job type. They
//! log start and finish and return the provider's text (or `None` on
//! failure), so a worker can store the result as-is.

use tracing::info;

use crate::batch::BatchResult;
use crate::orchestrator::Orchestrator;
use crate::provider::ProviderKind;

/// Analyze code with Gemini.
pub async fn analyze_codebase(orch: &Orchestrator, code: &str, instructions: &str) -> Option<String> {
    info!("Starting codebase analysis task");
    let result = orch
        .client(ProviderKind::Gemini)
        .analyze(code, instructions)
        .await;
    info!(succeeded = result.succeeded(), "Codebase analysis completed");
    result.into_text()
}

/// Turn requirements into a task list with Gemini.
pub async fn generate_task_list(orch: &Orchestrator, requirements: &str) -> Option<String> {
    info!("Generating task list");
    let result = orch
        .client(ProviderKind::Gemini)
        .generate_tasks(requirements)
        .await;
    info!(succeeded = result.succeeded(), "Task list generated");
    result.into_text()
}

/// Automate a coding task with Claude.
pub async fn automate_coding_task(orch: &Orchestrator, task: &str, context: &str) -> Option<String> {
    info!("Starting automated coding task: {}...", preview(task));
    let result = orch.client(ProviderKind::Claude).automate(task, context).await;
    info!(succeeded = result.succeeded(), "Coding task completed");
    result.into_text()
}

/// Review code changes with Claude.
pub async fn review_code_changes(orch: &Orchestrator, code: &str, requirements: &str) -> Option<String> {
    info!("Starting code review");
    let result = orch.client(ProviderKind::Claude).review(code, requirements).await;
    info!(succeeded = result.succeeded(), "Code review completed");
    result.into_text()
}

/// Build an improvement plan with Claude.
pub async fn create_improvement_plan(orch: &Orchestrator, analysis: &str) -> Option<String> {
    info!("Creating improvement plan");
    let result = orch
        .client(ProviderKind::Claude)
        .improvement_plan(analysis)
        .await;
    info!(succeeded = result.succeeded(), "Improvement plan created");
    result.into_text()
}

/// Drip-feed a list of coding tasks to Claude, one at a time.
pub async fn batch_process_tasks(orch: &Orchestrator, tasks: &[String]) -> BatchResult {
    orch.run_automation_batch(tasks).await
}

fn preview(text: &str) -> String {
    text.chars().take(50).collect()
}
