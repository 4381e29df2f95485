//! Bridges rig-core's `CompletionModel` to our `LlmProvider` trait.

use async_trait::async_trait;
use rig::completion::{CompletionError, CompletionModel};
use rig::http_client;
use rig::message::{AssistantContent, Message};
use serde_json::{Map, Value, json};

use super::LlmBackend;
use super::provider::{CompletionRequest, CompletionResponse, LlmProvider, Role};
use crate::config::GenerationOptions;
use crate::error::LlmError;

/// Adapter from a rig completion model to `LlmProvider`.
pub struct RigAdapter<M> {
    model: M,
    model_name: String,
    backend: LlmBackend,
}

impl<M: CompletionModel> RigAdapter<M> {
    pub fn new(model: M, model_name: &str, backend: LlmBackend) -> Self {
        Self {
            model,
            model_name: model_name.to_string(),
            backend,
        }
    }
}

#[async_trait]
impl<M> LlmProvider for RigAdapter<M>
where
    M: CompletionModel + 'static,
{
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let provider = self.backend.to_string();
        let preamble = request.system_prompt();

        let mut turns: Vec<Message> = request
            .messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| Message::user(m.content.clone()))
            .collect();
        let prompt = turns.pop().ok_or_else(|| LlmError::RequestFailed {
            provider: provider.clone(),
            reason: "request has no user message".to_string(),
        })?;

        let mut builder = self.model.completion_request(prompt).messages(turns);
        if let Some(preamble) = preamble {
            builder = builder.preamble(preamble);
        }
        if let Some(max_tokens) = request.max_tokens {
            builder = builder.max_tokens(u64::from(max_tokens));
        }
        if let Some(temperature) = request.options.temperature {
            builder = builder.temperature(f64::from(temperature));
        }
        if let Some(params) = vendor_params(self.backend, &request.options) {
            builder = builder.additional_params(params);
        }

        tracing::debug!(
            provider = %provider,
            model = %self.model_name,
            max_tokens = ?request.max_tokens,
            "Sending completion request"
        );

        let response = builder
            .send()
            .await
            .map_err(|e| completion_error(&provider, e))?;

        let content = response
            .choice
            .iter()
            .filter_map(|c| match c {
                AssistantContent::Text(text) => Some(text.text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("");

        Ok(CompletionResponse {
            content,
            input_tokens: saturate(response.usage.input_tokens),
            output_tokens: saturate(response.usage.output_tokens),
        })
    }
}

/// Classify a rig failure by the vendor's HTTP status where one is known.
fn completion_error(provider: &str, error: CompletionError) -> LlmError {
    let status = match &error {
        CompletionError::HttpError(
            http_client::Error::InvalidStatusCode(status)
            | http_client::Error::InvalidStatusCodeWithMessage(status, _),
        ) => Some(status.as_u16()),
        _ => None,
    };
    match (status, &error) {
        (Some(401 | 403), _) => LlmError::AuthFailed {
            provider: provider.to_string(),
        },
        (Some(429), _) => LlmError::RateLimited {
            provider: provider.to_string(),
        },
        (None, CompletionError::JsonError(_) | CompletionError::ResponseError(_)) => {
            LlmError::InvalidResponse {
                provider: provider.to_string(),
                reason: error.to_string(),
            }
        }
        _ => LlmError::RequestFailed {
            provider: provider.to_string(),
            reason: error.to_string(),
        },
    }
}

fn saturate(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

/// Vendor-specific request parameters for the options rig has no builder
/// method for. Temperature and the token budget go through the builder for
/// every backend; rig's Gemini model only copies them into a
/// `generationConfig` that is already present, so Gemini always gets one.
pub(crate) fn vendor_params(backend: LlmBackend, options: &GenerationOptions) -> Option<Value> {
    let mut params = Map::new();
    match backend {
        LlmBackend::Anthropic => {
            if let Some(top_p) = options.top_p {
                params.insert("top_p".into(), json!(top_p));
            }
            if let Some(top_k) = options.top_k {
                params.insert("top_k".into(), json!(top_k));
            }
            if !options.stop_sequences.is_empty() {
                params.insert("stop_sequences".into(), json!(options.stop_sequences));
            }
        }
        LlmBackend::Gemini => {
            let mut generation = Map::new();
            if let Some(top_p) = options.top_p {
                generation.insert("topP".into(), json!(top_p));
            }
            if let Some(top_k) = options.top_k {
                generation.insert("topK".into(), json!(top_k));
            }
            if !options.stop_sequences.is_empty() {
                generation.insert("stopSequences".into(), json!(options.stop_sequences));
            }
            params.insert("generationConfig".into(), Value::Object(generation));
        }
    }
    if params.is_empty() {
        None
    } else {
        Some(Value::Object(params))
    }
}
