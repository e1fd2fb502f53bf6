//! Shared test harness for E2E integration tests.
//!
//! Wires the real router, pipeline and Ollama client against an in-memory
//! SQLite database, a `wiremock` Ollama server and a recording push gateway.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use base64::{Engine, engine::general_purpose::STANDARD};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use noa_api::config::{AuthConfig, FeedbackConfig};
use noa_api::db;
use noa_api::generation::{OllamaClient, OllamaConfig};
use noa_api::push::{Credentials, PushGateway, PushTarget};
use noa_api::routes::build_router;
use noa_api::state::AppState;
use noa_protocol::knowledge::NewKnowledgeEntry;
use noa_retrieval::KnowledgeStore;

/// One recorded push.
#[derive(Debug, Clone)]
pub struct RecordedPush {
    pub target: PushTarget,
    pub username: String,
    pub config_text: String,
}

/// Push gateway that records every call and answers with a fixed result.
pub struct RecordingPushGateway {
    succeed: bool,
    pushes: Mutex<Vec<RecordedPush>>,
}

impl RecordingPushGateway {
    pub fn new(succeed: bool) -> Self {
        Self {
            succeed,
            pushes: Mutex::new(Vec::new()),
        }
    }

    pub fn pushes(&self) -> Vec<RecordedPush> {
        self.pushes.lock().unwrap().clone()
    }
}

#[async_trait]
impl PushGateway for RecordingPushGateway {
    async fn push(
        &self,
        target: &PushTarget,
        credentials: &Credentials,
        config_text: &str,
    ) -> bool {
        self.pushes.lock().unwrap().push(RecordedPush {
            target: target.clone(),
            username: credentials.username.clone(),
            config_text: config_text.to_string(),
        });
        self.succeed
    }
}

/// Harness options.
pub struct HarnessOptions {
    pub push_succeeds: bool,
    pub feedback: FeedbackConfig,
    pub max_attempts: u32,
}

impl Default for HarnessOptions {
    fn default() -> Self {
        Self {
            push_succeeds: true,
            feedback: FeedbackConfig::default(),
            max_attempts: 3,
        }
    }
}

/// End-to-end test harness.
pub struct TestHarness {
    pub router: Router,
    pub state: AppState,
    pub ollama: MockServer,
    pub gateway: Arc<RecordingPushGateway>,
}

pub const VLAN_BLOCK: &str =
    "vlan 30\n name IoT\n!\ninterface Vlan30\n ip address 192.168.30.1 255.255.255.0";

impl TestHarness {
    pub async fn start() -> Self {
        Self::with_options(HarnessOptions::default()).await
    }

    pub async fn with_options(options: HarnessOptions) -> Self {
        let ollama = MockServer::start().await;
        let pool = db::connect(":memory:").await.unwrap();

        let generator = OllamaClient::new(OllamaConfig {
            host: ollama.uri(),
            model: "mistral".into(),
            timeout_secs: 2,
            max_attempts: options.max_attempts,
            retry_delay_ms: 10,
        })
        .unwrap();
        let gateway = Arc::new(RecordingPushGateway::new(options.push_succeeds));

        let state = AppState::with_parts(
            pool,
            Arc::new(generator),
            gateway.clone(),
            Credentials {
                username: "netops".into(),
                password: "hunter2".into(),
            },
            AuthConfig::default(),
            options.feedback,
        );
        let router = build_router(state.clone());

        Self {
            router,
            state,
            ollama,
            gateway,
        }
    }

    pub fn store(&self) -> KnowledgeStore {
        KnowledgeStore::new(self.state.pool().clone())
    }

    /// Insert the Catalyst 9200 VLAN example.
    pub async fn seed_vlan_example(&self) {
        self.store()
            .insert(&NewKnowledgeEntry {
                vendor: "Cisco".into(),
                model: "Catalyst 9200".into(),
                os_version: "IOS XE".into(),
                feature: "VLAN".into(),
                cli_block: VLAN_BLOCK.into(),
                source: Some("catalyst-9200-guide".into()),
            })
            .await
            .unwrap();
    }

    /// Serve one NDJSON body for every generate call.
    pub async fn mount_generation(&self, fragments: &[&str]) {
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_string(ndjson(fragments)))
            .mount(&self.ollama)
            .await;
    }

    /// Prompts the mock Ollama server has received, in order.
    pub async fn received_prompts(&self) -> Vec<String> {
        self.ollama
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|request| {
                let body: Value = serde_json::from_slice(&request.body).unwrap();
                body["prompt"].as_str().unwrap().to_string()
            })
            .collect()
    }

    /// Send an authenticated request. Returns (status, JSON body).
    pub async fn call(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Basic {}", STANDARD.encode("admin:changeme")));
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    /// POST /api/v1/generate-config with the given body.
    pub async fn generate(&self, request: Value) -> (StatusCode, Value) {
        self.call("POST", "/api/v1/generate-config", Some(request)).await
    }

    pub async fn push(&self, id: i64) -> (StatusCode, Value) {
        self.call("POST", &format!("/api/v1/staging/{id}/push"), None).await
    }

    pub async fn reject(&self, id: i64) -> (StatusCode, Value) {
        self.call("POST", &format!("/api/v1/staging/{id}/reject"), None).await
    }

    pub async fn record(&self, id: i64) -> Value {
        let (status, json) = self.call("GET", &format!("/api/v1/staging/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        json
    }
}

/// The Catalyst 9200 VLAN request.
pub fn vlan_request() -> Value {
    json!({
        "vendor": "Cisco",
        "model": "Catalyst 9200",
        "os_version": "IOS XE",
        "feature": "VLAN",
        "parameters": "Create VLAN 30 named IoT, 192.168.30.1/24",
        "device_ip": "10.0.0.5",
        "device_name": "access-sw-01"
    })
}

/// Build an Ollama NDJSON stream body from text fragments.
pub fn ndjson(fragments: &[&str]) -> String {
    let mut body = String::new();
    for fragment in fragments {
        let line = json!({ "model": "mistral", "response": fragment, "done": false });
        body.push_str(&line.to_string());
        body.push('\n');
    }
    body.push_str(&json!({ "model": "mistral", "response": "", "done": true }).to_string());
    body.push('\n');
    body
}
