//! Test doubles for the vendor boundary.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{
    BackendFactory, CompletionRequest, CompletionResponse, LlmBackend, LlmConfig, LlmProvider,
};
use crate::error::LlmError;

/// One scripted vendor reply.
#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Text(String),
    Empty,
    Fail,
    Panic,
}

impl Reply {
    pub(crate) fn text(s: &str) -> Self {
        Reply::Text(s.to_string())
    }
}

/// Replays scripted replies in order and counts calls. Once the script runs
/// out every call answers "ok".
pub(crate) struct ScriptedLlm {
    script: Mutex<VecDeque<Reply>>,
    calls: AtomicUsize,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedLlm {
    pub(crate) fn new(script: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn always_ok() -> Arc<Self> {
        Self::new(Vec::new())
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn last_request(&self) -> Option<CompletionRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request);
        let reply = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Reply::text("ok"));
        let content = match reply {
            Reply::Text(text) => text,
            Reply::Empty => String::new(),
            Reply::Fail => {
                return Err(LlmError::RequestFailed {
                    provider: "scripted".to_string(),
                    reason: "scripted failure".to_string(),
                });
            }
            Reply::Panic => panic!("scripted panic"),
        };
        Ok(CompletionResponse {
            content,
            input_tokens: 10,
            output_tokens: 5,
        })
    }
}

/// Hands out a fixed backend and counts constructions.
pub(crate) struct StubFactory {
    backend: Arc<dyn LlmProvider>,
    supported: Vec<LlmBackend>,
    fail: bool,
    created: AtomicUsize,
}

impl StubFactory {
    pub(crate) fn new(backend: Arc<dyn LlmProvider>) -> Self {
        Self {
            backend,
            supported: vec![LlmBackend::Anthropic, LlmBackend::Gemini],
            fail: false,
            created: AtomicUsize::new(0),
        }
    }

    pub(crate) fn supporting(mut self, supported: Vec<LlmBackend>) -> Self {
        self.supported = supported;
        self
    }

    pub(crate) fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub(crate) fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl BackendFactory for StubFactory {
    fn supports(&self, backend: LlmBackend) -> bool {
        self.supported.contains(&backend)
    }

    fn create(&self, config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
        self.created.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(LlmError::AuthFailed {
                provider: config.backend.to_string(),
            });
        }
        Ok(Arc::clone(&self.backend))
    }
}
