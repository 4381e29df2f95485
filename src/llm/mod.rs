//! LLM integration for goose-dispatch.
//!
//! Supports:
//! - **Anthropic** (Claude): direct API access via rig-core
//! - **Gemini**: direct API access via rig-core
//!
//! Uses the rig-core crate for HTTP transport and the `RigAdapter` to bridge
//! rig's `CompletionModel` trait to our `LlmProvider` trait. A
//! `BackendFactory` decides which vendors this build can reach; providers
//! whose vendor is missing degrade to "unavailable" instead of failing.

pub mod provider;
mod rig_adapter;
#[cfg(test)]
pub(crate) mod testing;

pub use provider::*;
pub use rig_adapter::RigAdapter;

use std::fmt;
use std::sync::Arc;

use rig::client::CompletionClient;
use secrecy::ExposeSecret;

use crate::error::LlmError;

/// Supported LLM backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LlmBackend {
    Anthropic,
    Gemini,
}

impl fmt::Display for LlmBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmBackend::Anthropic => write!(f, "anthropic"),
            LlmBackend::Gemini => write!(f, "gemini"),
        }
    }
}

/// Configuration for creating an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub backend: LlmBackend,
    pub api_key: secrecy::SecretString,
    pub model: String,
}

/// Builds vendor connection handles.
pub trait BackendFactory: Send + Sync {
    /// Whether the vendor SDK for `backend` is available.
    fn supports(&self, backend: LlmBackend) -> bool;

    /// Construct a connection handle. Performs no network I/O.
    fn create(&self, config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError>;
}

/// Factory backed by rig-core.
#[derive(Debug, Default, Clone, Copy)]
pub struct RigBackendFactory;

impl BackendFactory for RigBackendFactory {
    fn supports(&self, _backend: LlmBackend) -> bool {
        true
    }

    fn create(&self, config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
        create_provider(config)
    }
}

/// Create an LLM provider from configuration.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    match config.backend {
        LlmBackend::Anthropic => create_anthropic_provider(config),
        LlmBackend::Gemini => create_gemini_provider(config),
    }
}

fn init_failed(backend: LlmBackend, error: impl fmt::Display) -> LlmError {
    LlmError::RequestFailed {
        provider: backend.to_string(),
        reason: format!("client construction failed: {error}"),
    }
}

fn create_anthropic_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    use rig::providers::anthropic;

    let backend = LlmBackend::Anthropic;
    let client: rig::client::Client<anthropic::client::AnthropicExt> =
        anthropic::Client::new(config.api_key.expose_secret())
            .map_err(|e| init_failed(backend, e))?;
    let model = client.completion_model(&config.model);
    tracing::debug!(backend = %backend, model = %config.model, "Vendor handle ready");
    Ok(Arc::new(RigAdapter::new(model, &config.model, backend)))
}

fn create_gemini_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    use rig::providers::gemini;

    let backend = LlmBackend::Gemini;
    let client: gemini::Client = gemini::Client::new(config.api_key.expose_secret())
        .map_err(|e| init_failed(backend, e))?;
    let model = client.completion_model(&config.model);
    tracing::debug!(backend = %backend, model = %config.model, "Vendor handle ready");
    Ok(Arc::new(RigAdapter::new(model, &config.model, backend)))
}
