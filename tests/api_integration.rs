//! Integration tests for the REST API.
//!
//! Each test spins up an Axum server on a random port backed by a stub LLM
//! and exercises the real HTTP contract with reqwest.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::time::timeout;

use goose_dispatch::Orchestrator;
use goose_dispatch::api::api_routes;
use goose_dispatch::config::Settings;
use goose_dispatch::error::LlmError;
use goose_dispatch::llm::{
    BackendFactory, CompletionRequest, CompletionResponse, LlmBackend, LlmConfig, LlmProvider,
};

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Stub LLM: replays scripted replies (`None` = upstream failure), then "stub".
struct StubLlm {
    replies: Mutex<VecDeque<Option<String>>>,
    calls: AtomicUsize,
    last_temperature: Mutex<Option<f32>>,
}

impl StubLlm {
    fn new(replies: Vec<Option<&str>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().map(|r| r.map(String::from)).collect()),
            calls: AtomicUsize::new(0),
            last_temperature: Mutex::new(None),
        })
    }
}

#[async_trait]
impl LlmProvider for StubLlm {
    fn model_name(&self) -> &str {
        "stub"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_temperature.lock().unwrap() = request.options.temperature;
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Some("stub".to_string()));
        match reply {
            Some(content) => Ok(CompletionResponse {
                content,
                input_tokens: 0,
                output_tokens: 0,
            }),
            None => Err(LlmError::RequestFailed {
                provider: "stub".into(),
                reason: "boom".into(),
            }),
        }
    }
}

struct StubFactory(Arc<StubLlm>);

impl BackendFactory for StubFactory {
    fn supports(&self, _backend: LlmBackend) -> bool {
        true
    }

    fn create(&self, _config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
        Ok(self.0.clone())
    }
}

/// Start an Axum server on a random port, return its base URL.
async fn start_server(settings: Settings, llm: Arc<StubLlm>) -> String {
    let orchestrator = Arc::new(Orchestrator::new(settings, Arc::new(StubFactory(llm))));
    let app = api_routes(orchestrator);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://127.0.0.1:{port}")
}

fn configured() -> Settings {
    let mut settings = Settings::default();
    settings.gemini = settings.gemini.with_api_key("k1");
    settings.gemini.model = "m1".to_string();
    settings.claude = settings.claude.with_api_key("sk-ant");
    settings
}

async fn post(url: String, body: Value) -> (u16, Value) {
    let resp = reqwest::Client::new()
        .post(url)
        .json(&body)
        .send()
        .await
        .expect("request failed");
    let status = resp.status().as_u16();
    let json = resp.json().await.unwrap_or(Value::Null);
    (status, json)
}

// ── Status ───────────────────────────────────────────────────────────

#[tokio::test]
async fn status_reports_unconfigured_providers() {
    timeout(TEST_TIMEOUT, async {
        let llm = StubLlm::new(vec![]);
        let base = start_server(Settings::default(), llm.clone()).await;

        let json: Value = reqwest::get(format!("{base}/api/status"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(json["status"], "ok");
        assert_eq!(json["providers"]["gemini"]["configured"], false);
        assert_eq!(json["providers"]["gemini"]["ready"], false);
        assert_eq!(json["providers"]["claude"]["ready"], false);
        assert_eq!(json["providers"]["claude"]["extra"]["headless_mode"], true);
        assert_eq!(json["network_identity"]["enabled"], false);
        assert!(json["network_identity"]["hostname"].is_null());
        assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn status_reports_ready_providers() {
    timeout(TEST_TIMEOUT, async {
        let base = start_server(configured(), StubLlm::new(vec![])).await;
        let json: Value = reqwest::get(format!("{base}/api/status"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(json["providers"]["gemini"]["ready"], true);
        assert_eq!(json["providers"]["gemini"]["model"], "m1");
        assert_eq!(json["providers"]["claude"]["ready"], true);
    })
    .await
    .expect("test timed out");
}

// ── Single tasks ─────────────────────────────────────────────────────

#[tokio::test]
async fn analyze_code_returns_provider_text() {
    timeout(TEST_TIMEOUT, async {
        let base = start_server(configured(), StubLlm::new(vec![Some("ok")])).await;
        let (status, json) = post(
            format!("{base}/api/analyze-code"),
            json!({"code": "def f(): pass"}),
        )
        .await;

        assert_eq!(status, 200);
        assert_eq!(json["analysis"], "ok");
        assert_eq!(json["model"], "m1");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn missing_input_is_bad_request() {
    timeout(TEST_TIMEOUT, async {
        let llm = StubLlm::new(vec![]);
        let base = start_server(configured(), llm.clone()).await;

        let (status, json) = post(format!("{base}/api/review-code"), json!({})).await;
        assert_eq!(status, 400);
        assert_eq!(json["error"], "Code is required");

        let (status, _) = post(format!("{base}/api/generate-tasks"), json!({"requirements": "  "})).await;
        assert_eq!(status, 400);

        assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn unconfigured_provider_is_unavailable() {
    timeout(TEST_TIMEOUT, async {
        let llm = StubLlm::new(vec![]);
        let base = start_server(Settings::default(), llm.clone()).await;

        let (status, json) = post(
            format!("{base}/api/automate-task"),
            json!({"task": "build X"}),
        )
        .await;
        assert_eq!(status, 503);
        assert_eq!(json["error"], "Claude not configured");
        assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn upstream_failure_is_bad_gateway() {
    timeout(TEST_TIMEOUT, async {
        let base = start_server(configured(), StubLlm::new(vec![None])).await;
        let (status, json) = post(
            format!("{base}/api/review-code"),
            json!({"code": "x = 1", "requirements": "pure"}),
        )
        .await;
        assert_eq!(status, 502);
        assert_eq!(json["error"], "Claude request failed");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn automate_reports_headless_mode() {
    timeout(TEST_TIMEOUT, async {
        let base = start_server(configured(), StubLlm::new(vec![Some("fn main() {}")])).await;
        let (status, json) = post(
            format!("{base}/api/automate-task"),
            json!({"task": "build X", "context": "cli"}),
        )
        .await;
        assert_eq!(status, 200);
        assert_eq!(json["result"], "fn main() {}");
        assert_eq!(json["headless_mode"], true);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn options_reach_the_backend_and_unknown_keys_are_rejected() {
    timeout(TEST_TIMEOUT, async {
        let llm = StubLlm::new(vec![]);
        let base = start_server(configured(), llm.clone()).await;

        let (status, _) = post(
            format!("{base}/api/generate-tasks"),
            json!({"requirements": "auth", "options": {"temperature": 0.25}}),
        )
        .await;
        assert_eq!(status, 200);
        assert_eq!(*llm.last_temperature.lock().unwrap(), Some(0.25));

        let (status, _) = post(
            format!("{base}/api/generate-tasks"),
            json!({"requirements": "auth", "options": {"logit_bias": {}}}),
        )
        .await;
        assert_eq!(status, 422);
        assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
    })
    .await
    .expect("test timed out");
}

// ── Batch ────────────────────────────────────────────────────────────

#[tokio::test]
async fn batch_isolates_failures() {
    timeout(TEST_TIMEOUT, async {
        let llm = StubLlm::new(vec![Some("one"), None, Some("three")]);
        let base = start_server(configured(), llm.clone()).await;

        let (status, json) = post(
            format!("{base}/api/batch"),
            json!({"tasks": ["a", "b", "c"]}),
        )
        .await;

        assert_eq!(status, 200);
        let results = json["results"].as_array().unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0], json!({"text": "one", "succeeded": true}));
        assert_eq!(results[1], json!({"text": null, "succeeded": false}));
        assert_eq!(results[2], json!({"text": "three", "succeeded": true}));
        assert_eq!(json["succeeded"], 2);
        assert_eq!(json["failed"], 1);
        assert_eq!(llm.calls.load(Ordering::SeqCst), 3);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn empty_batch_is_not_an_error() {
    timeout(TEST_TIMEOUT, async {
        let base = start_server(configured(), StubLlm::new(vec![])).await;
        let (status, json) = post(format!("{base}/api/batch"), json!({"tasks": []})).await;
        assert_eq!(status, 200);
        assert!(json["results"].as_array().unwrap().is_empty());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn health_endpoint() {
    timeout(TEST_TIMEOUT, async {
        let base = start_server(Settings::default(), StubLlm::new(vec![])).await;
        let json: Value = reqwest::get(format!("{base}/health"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(json["status"], "ok");
    })
    .await
    .expect("test timed out");
}
