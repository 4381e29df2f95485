//! Prompt templates for each task kind.
//!
//! The section lists are part of the output contract: downstream consumers
//! parse the numbered headings, so change them with care.

use super::{TaskKind, TaskRequest};

/// Token budget for short analyses, reviews and bare prompts.
pub const STANDARD_MAX_TOKENS: u32 = 4096;

/// Token budget for multi-file automation and planning.
pub const EXTENDED_MAX_TOKENS: u32 = 8192;

const AUTOMATE_SYSTEM: &str = "You are an expert software engineer working in headless automation mode. \n\
Generate clean, production-ready code that follows best practices. \n\
Provide complete implementations without placeholders.";

const REVIEW_SYSTEM: &str =
    "You are an expert code reviewer. Provide constructive, actionable feedback.";

const PLAN_SYSTEM: &str = "You are a technical architect creating improvement plans.\n\
Focus on practical, incremental improvements that deliver value.";

/// A rendered prompt ready for `send_raw`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub system: Option<&'static str>,
    pub prompt: String,
    pub max_tokens: u32,
}

impl TaskKind {
    /// Default token budget for this kind of task.
    pub fn default_max_tokens(self) -> u32 {
        match self {
            TaskKind::Automate | TaskKind::ImprovementPlan => EXTENDED_MAX_TOKENS,
            TaskKind::Analyze | TaskKind::GenerateTasks | TaskKind::Review => STANDARD_MAX_TOKENS,
        }
    }
}

/// Render the template for a request.
pub fn render(request: &TaskRequest) -> Template {
    let primary = request.primary_text.as_str();
    let secondary = request.secondary_text.as_deref().unwrap_or("");
    let (system, prompt) = match request.kind {
        TaskKind::Analyze => (None, analyze(primary, secondary)),
        TaskKind::GenerateTasks => (None, generate_tasks(primary)),
        TaskKind::Automate => (Some(AUTOMATE_SYSTEM), automate(primary, secondary)),
        TaskKind::Review => (Some(REVIEW_SYSTEM), review(primary, secondary)),
        TaskKind::ImprovementPlan => (Some(PLAN_SYSTEM), improvement_plan(primary)),
    };
    Template {
        system,
        prompt,
        max_tokens: request.kind.default_max_tokens(),
    }
}

fn analyze(code: &str, instructions: &str) -> String {
    format!(
        "Analyze the following code and provide insights:\n\n\
         {code}\n\n\
         {instructions}\n\n\
         Please provide:\n\
         1. Code quality assessment\n\
         2. Potential improvements\n\
         3. Security concerns\n\
         4. Best practices recommendations\n"
    )
}

fn generate_tasks(requirements: &str) -> String {
    format!(
        "Based on these requirements, create a detailed task list:\n\n\
         {requirements}\n\n\
         Please organize tasks by:\n\
         1. Priority (High/Medium/Low)\n\
         2. Estimated effort\n\
         3. Dependencies\n\
         4. Suggested order of implementation\n"
    )
}

fn automate(task: &str, context: &str) -> String {
    format!(
        "Task: {task}\n\n\
         Codebase Context:\n\
         {context}\n\n\
         Please provide:\n\
         1. Complete implementation\n\
         2. Necessary imports\n\
         3. Error handling\n\
         4. Comments for complex logic\n\
         5. Any setup/configuration needed\n"
    )
}

fn review(code: &str, requirements: &str) -> String {
    let requirements_line = if requirements.is_empty() {
        String::new()
    } else {
        format!("Requirements to check: {requirements}")
    };
    format!(
        "Please review this code:\n\n\
         ```\n{code}\n```\n\n\
         {requirements_line}\n\n\
         Provide:\n\
         1. Code quality assessment\n\
         2. Potential bugs or issues\n\
         3. Security concerns\n\
         4. Performance optimization suggestions\n\
         5. Recommended improvements\n"
    )
}

fn improvement_plan(analysis: &str) -> String {
    format!(
        "Based on this codebase analysis:\n\n\
         {analysis}\n\n\
         Create a detailed improvement plan with:\n\
         1. Prioritized list of improvements\n\
         2. Estimated effort for each item\n\
         3. Dependencies between tasks\n\
         4. Expected benefits\n\
         5. Suggested implementation order\n"
    )
}
