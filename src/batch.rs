//! Sequential batch execution with per-item failure isolation.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use serde::Serialize;
use tokio::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::DispatchError;
use crate::provider::{ProviderClient, TaskRequest, TaskResult};

/// Results of a batch, in input order. Always as long as the input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BatchResult {
    results: Vec<TaskResult>,
}

impl BatchResult {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn results(&self) -> &[TaskResult] {
        &self.results
    }

    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.succeeded()).count()
    }

    pub fn failed(&self) -> usize {
        self.len() - self.succeeded()
    }

    pub fn into_inner(self) -> Vec<TaskResult> {
        self.results
    }
}

/// Runs task lists against one provider, one item at a time.
pub struct BatchRunner {
    client: Arc<ProviderClient>,
}

impl BatchRunner {
    pub fn new(client: Arc<ProviderClient>) -> Self {
        Self { client }
    }

    /// Run every task in order. A failed or panicking item becomes a failed
    /// result at its position and the batch carries on.
    pub async fn run(&self, tasks: &[TaskRequest]) -> BatchResult {
        self.run_inner(tasks, None).await
    }

    /// Like `run`, but gives up on the remaining items once `budget` has
    /// elapsed. Items that never started are recorded as failed.
    pub async fn run_with_deadline(&self, tasks: &[TaskRequest], budget: Duration) -> BatchResult {
        self.run_inner(tasks, Some(Instant::now() + budget)).await
    }

    /// Drip-feed automation: each description becomes an `Automate` task
    /// with no codebase context.
    pub async fn run_automation(&self, descriptions: &[String]) -> BatchResult {
        let tasks: Vec<TaskRequest> = descriptions
            .iter()
            .map(|d| TaskRequest::automate(d.as_str(), ""))
            .collect();
        self.run(&tasks).await
    }

    async fn run_inner(&self, tasks: &[TaskRequest], deadline: Option<Instant>) -> BatchResult {
        let batch_id = Uuid::new_v4();
        let total = tasks.len();
        info!(
            batch_id = %batch_id,
            provider = %self.client.kind(),
            total = total,
            "Starting batch processing"
        );

        let mut results = Vec::with_capacity(total);
        for (index, task) in tasks.iter().enumerate() {
            let position = index + 1;

            if let Some(deadline) = deadline
                && Instant::now() >= deadline
            {
                warn!(batch_id = %batch_id, "Deadline reached, skipping task {}/{}", position, total);
                results.push(TaskResult::failed());
                continue;
            }

            info!(batch_id = %batch_id, kind = %task.kind, "Processing task {}/{}", position, total);
            let item = AssertUnwindSafe(self.client.execute(task)).catch_unwind();
            let result = match deadline {
                Some(deadline) => match tokio::time::timeout_at(deadline, item).await {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        warn!(batch_id = %batch_id, "Deadline reached during task {}/{}", position, total);
                        Ok(TaskResult::failed())
                    }
                },
                None => item.await,
            };

            let result = result.unwrap_or_else(|panic| {
                let e = DispatchError::BatchItem {
                    index,
                    reason: panic_message(panic.as_ref()),
                };
                error!(batch_id = %batch_id, error = %e, "Batch item panicked");
                TaskResult::failed()
            });
            if !result.succeeded() {
                warn!(batch_id = %batch_id, "Task {}/{} failed", position, total);
            }
            results.push(result);
        }

        let batch = BatchResult { results };
        info!(
            batch_id = %batch_id,
            succeeded = batch.succeeded(),
            failed = batch.failed(),
            "Batch processing completed"
        );
        batch
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
