//! Provider clients.
//!
//! A `ProviderClient` wraps one external LLM provider behind a fixed set of
//! task templates. Construction never fails: a missing key, a missing vendor
//! SDK or a rejected client all leave the client `Unavailable`, and every
//! operation on it returns a failed `TaskResult` without touching the network.

pub mod prompts;
pub mod registry;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::config::{GenerationOptions, HEADLESS_MODE_FLAG, ProviderConfig};
use crate::error::DispatchError;
use crate::llm::{BackendFactory, ChatMessage, CompletionRequest, LlmBackend, LlmConfig, LlmProvider};

pub use prompts::{EXTENDED_MAX_TOKENS, STANDARD_MAX_TOKENS, Template};
pub use registry::ProviderRegistry;

/// The providers this build knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Generation-style provider (Google Gemini).
    Gemini,
    /// Conversational / headless-automation provider (Anthropic Claude).
    Claude,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 2] = [ProviderKind::Gemini, ProviderKind::Claude];

    pub fn name(self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::Claude => "claude",
        }
    }

    /// Vendor SDK behind this provider.
    pub fn backend(self) -> LlmBackend {
        match self {
            ProviderKind::Gemini => LlmBackend::Gemini,
            ProviderKind::Claude => LlmBackend::Anthropic,
        }
    }

    /// Task kinds this provider exposes.
    pub fn supports(self, kind: TaskKind) -> bool {
        match self {
            ProviderKind::Gemini => matches!(kind, TaskKind::Analyze | TaskKind::GenerateTasks),
            ProviderKind::Claude => matches!(
                kind,
                TaskKind::Automate | TaskKind::Review | TaskKind::ImprovementPlan
            ),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Kinds of task a provider can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Analyze,
    GenerateTasks,
    Automate,
    Review,
    ImprovementPlan,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskKind::Analyze => "analyze",
            TaskKind::GenerateTasks => "generate_tasks",
            TaskKind::Automate => "automate",
            TaskKind::Review => "review",
            TaskKind::ImprovementPlan => "improvement_plan",
        };
        f.write_str(s)
    }
}

/// One unit of work. `primary_text` is validated non-empty by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRequest {
    pub kind: TaskKind,
    pub primary_text: String,
    #[serde(default)]
    pub secondary_text: Option<String>,
}

impl TaskRequest {
    pub fn new(kind: TaskKind, primary: impl Into<String>, secondary: Option<String>) -> Self {
        Self {
            kind,
            primary_text: primary.into(),
            secondary_text: secondary,
        }
    }

    pub fn analyze(code: impl Into<String>, instructions: impl Into<String>) -> Self {
        Self::new(TaskKind::Analyze, code, Some(instructions.into()))
    }

    pub fn generate_tasks(requirements: impl Into<String>) -> Self {
        Self::new(TaskKind::GenerateTasks, requirements, None)
    }

    pub fn automate(task: impl Into<String>, context: impl Into<String>) -> Self {
        Self::new(TaskKind::Automate, task, Some(context.into()))
    }

    pub fn review(code: impl Into<String>, requirements: impl Into<String>) -> Self {
        Self::new(TaskKind::Review, code, Some(requirements.into()))
    }

    pub fn improvement_plan(analysis: impl Into<String>) -> Self {
        Self::new(TaskKind::ImprovementPlan, analysis, None)
    }
}

/// Outcome of one operation. `text` is present exactly when it succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskResult {
    text: Option<String>,
    succeeded: bool,
}

impl TaskResult {
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            succeeded: true,
        }
    }

    pub fn failed() -> Self {
        Self {
            text: None,
            succeeded: false,
        }
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn succeeded(&self) -> bool {
        self.succeeded
    }

    pub fn into_text(self) -> Option<String> {
        self.text
    }
}

impl From<Result<String, DispatchError>> for TaskResult {
    fn from(result: Result<String, DispatchError>) -> Self {
        match result {
            Ok(text) => TaskResult::ok(text),
            Err(_) => TaskResult::failed(),
        }
    }
}

/// Why a provider has no connection handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unavailable {
    /// No API key configured.
    NotConfigured,
    /// The vendor SDK is not part of this build.
    BackendMissing,
    /// The vendor client rejected construction.
    InitializationFailed(String),
}

impl fmt::Display for Unavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unavailable::NotConfigured => write!(f, "not configured"),
            Unavailable::BackendMissing => write!(f, "backend missing"),
            Unavailable::InitializationFailed(reason) => {
                write!(f, "initialization failed: {}", reason)
            }
        }
    }
}

/// Connection state, fixed at construction.
#[derive(Clone)]
pub enum Connection {
    Available(Arc<dyn LlmProvider>),
    Unavailable(Unavailable),
}

impl Connection {
    pub fn is_available(&self) -> bool {
        matches!(self, Connection::Available(_))
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Connection::Available(llm) => f
                .debug_tuple("Available")
                .field(&llm.model_name())
                .finish(),
            Connection::Unavailable(reason) => f.debug_tuple("Unavailable").field(reason).finish(),
        }
    }
}

/// Client for one provider.
#[derive(Debug)]
pub struct ProviderClient {
    kind: ProviderKind,
    config: ProviderConfig,
    connection: Connection,
}

impl ProviderClient {
    /// Build a client. Never fails; problems leave the client unavailable.
    pub fn connect(kind: ProviderKind, config: ProviderConfig, factory: &dyn BackendFactory) -> Self {
        let connection = Self::open(kind, &config, factory);
        if let Connection::Available(_) = connection {
            info!(provider = %kind, model = %config.model, "Provider ready");
            for (flag, value) in &config.flags {
                info!(provider = %kind, flag = %flag, value = value, "Provider mode flag");
            }
        }
        Self {
            kind,
            config,
            connection,
        }
    }

    /// Build a client around an existing handle.
    pub fn with_backend(kind: ProviderKind, config: ProviderConfig, llm: Arc<dyn LlmProvider>) -> Self {
        Self {
            kind,
            config,
            connection: Connection::Available(llm),
        }
    }

    fn open(kind: ProviderKind, config: &ProviderConfig, factory: &dyn BackendFactory) -> Connection {
        let backend = kind.backend();
        if !factory.supports(backend) {
            error!(provider = %kind, backend = %backend, "Vendor SDK not available in this build");
            return Connection::Unavailable(Unavailable::BackendMissing);
        }

        let Some(api_key) = config.api_key.clone() else {
            warn!(provider = %kind, "API key not configured");
            return Connection::Unavailable(Unavailable::NotConfigured);
        };

        let llm_config = LlmConfig {
            backend,
            api_key,
            model: config.model.clone(),
        };
        match factory.create(&llm_config) {
            Ok(llm) => Connection::Available(llm),
            Err(e) => {
                error!(provider = %kind, error = %e, "Failed to initialize provider client");
                Connection::Unavailable(Unavailable::InitializationFailed(e.to_string()))
            }
        }
    }

    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    /// Whether a connection handle is present.
    pub fn is_ready(&self) -> bool {
        self.connection.is_available()
    }

    pub fn headless_mode(&self) -> bool {
        self.config.flag(HEADLESS_MODE_FLAG)
    }

    /// Send a prompt and return the text, or the reason it failed.
    pub async fn try_send_raw(
        &self,
        prompt: &str,
        system: Option<&str>,
        max_tokens: Option<u32>,
        options: &GenerationOptions,
    ) -> Result<String, DispatchError> {
        let provider = self.kind.to_string();
        let llm = match &self.connection {
            Connection::Available(llm) => llm,
            Connection::Unavailable(_) => {
                return Err(DispatchError::NotInitialized { provider });
            }
        };

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system.filter(|s| !s.is_empty()) {
            messages.push(ChatMessage::system(system));
        }
        messages.push(ChatMessage::user(prompt));

        let request = CompletionRequest::new(messages)
            .with_max_tokens(max_tokens.unwrap_or(STANDARD_MAX_TOKENS))
            .with_options(self.config.options.merged(options));

        let response = llm
            .complete(request)
            .await
            .map_err(|source| DispatchError::Upstream {
                provider: provider.clone(),
                source,
            })?;

        if response.content.trim().is_empty() {
            return Err(DispatchError::EmptyResponse { provider });
        }

        debug!(
            provider = %self.kind,
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            "Completion received"
        );
        Ok(response.content)
    }

    /// Send a prompt. Failures are logged and collapsed into `TaskResult::failed`.
    pub async fn send_raw(
        &self,
        prompt: &str,
        system: Option<&str>,
        max_tokens: Option<u32>,
        options: &GenerationOptions,
    ) -> TaskResult {
        let result = self.try_send_raw(prompt, system, max_tokens, options).await;
        if let Err(e) = &result {
            error!(provider = %self.kind, error = %e, "Provider call failed");
        }
        result.into()
    }

    /// Run a request through its template.
    pub async fn execute(&self, request: &TaskRequest) -> TaskResult {
        self.execute_with(request, &GenerationOptions::default()).await
    }

    /// Run a request through its template with per-call option overrides.
    pub async fn execute_with(&self, request: &TaskRequest, options: &GenerationOptions) -> TaskResult {
        if !self.kind.supports(request.kind) {
            let e = DispatchError::Unsupported {
                provider: self.kind.to_string(),
                kind: request.kind.to_string(),
            };
            error!(provider = %self.kind, error = %e, "Rejected task");
            return TaskResult::failed();
        }
        let template = prompts::render(request);
        self.send_raw(
            &template.prompt,
            template.system,
            Some(template.max_tokens),
            options,
        )
        .await
    }

    pub async fn analyze(&self, code: &str, instructions: &str) -> TaskResult {
        self.execute(&TaskRequest::analyze(code, instructions)).await
    }

    pub async fn generate_tasks(&self, requirements: &str) -> TaskResult {
        self.execute(&TaskRequest::generate_tasks(requirements)).await
    }

    pub async fn review(&self, code: &str, requirements: &str) -> TaskResult {
        self.execute(&TaskRequest::review(code, requirements)).await
    }

    pub async fn automate(&self, task: &str, context: &str) -> TaskResult {
        self.execute(&TaskRequest::automate(task, context)).await
    }

    pub async fn improvement_plan(&self, analysis: &str) -> TaskResult {
        self.execute(&TaskRequest::improvement_plan(analysis)).await
    }
}
