//! Throwaway HTTP services standing in for the analyzers and the assistant
//!
//! Each server binds an ephemeral port on 127.0.0.1 and lives as long as the
//! test's runtime.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Port 1 on loopback: connection refused
pub const UNREACHABLE_URL: &str = "http://127.0.0.1:1";

/// Serve a router on an ephemeral port, returning its base URL
pub async fn spawn_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Scripted analyzer service (`/analyze/text`, `/analyze/image`, `/health`)
#[derive(Clone)]
pub struct MockAnalyzerService {
    status: StatusCode,
    body: Value,
    delay: Duration,
    healthy: bool,
    received: Arc<Mutex<Vec<Bytes>>>,
}

impl MockAnalyzerService {
    /// Answers 200 with the given body
    pub fn scoring(body: Value) -> Self {
        Self {
            status: StatusCode::OK,
            body,
            delay: Duration::ZERO,
            healthy: true,
            received: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Answers with an error status
    pub fn failing(status: StatusCode) -> Self {
        Self::scoring(json!({"success": false, "error": "mock failure"})).with_status(status)
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn unhealthy(mut self) -> Self {
        self.healthy = false;
        self
    }

    /// Raw request bodies received so far
    pub fn received(&self) -> Vec<Bytes> {
        self.received.lock().unwrap().clone()
    }

    pub async fn spawn(&self) -> String {
        let router = Router::new()
            .route("/analyze/text", post(analyze))
            .route("/analyze/image", post(analyze))
            .route("/health", get(analyzer_health))
            .with_state(self.clone());
        spawn_server(router).await
    }
}

async fn analyze(State(service): State<MockAnalyzerService>, body: Bytes) -> impl IntoResponse {
    service.received.lock().unwrap().push(body);
    tokio::time::sleep(service.delay).await;
    (service.status, Json(service.body.clone()))
}

async fn analyzer_health(State(service): State<MockAnalyzerService>) -> StatusCode {
    if service.healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// Scripted Ollama-style service (`/api/generate`, `/api/tags`)
#[derive(Clone)]
pub struct MockAssistantService {
    status: StatusCode,
    body: Value,
    delay: Duration,
    models: Vec<String>,
    prompts: Arc<Mutex<Vec<Value>>>,
}

impl MockAssistantService {
    /// Answers every question with `text`
    pub fn answering(text: &str) -> Self {
        Self {
            status: StatusCode::OK,
            body: json!({"response": text, "done": true}),
            delay: Duration::ZERO,
            models: vec!["aapda-assistant:latest".to_string()],
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_models(mut self, models: &[&str]) -> Self {
        self.models = models.iter().map(|m| m.to_string()).collect();
        self
    }

    /// Generate requests received so far
    pub fn requests(&self) -> Vec<Value> {
        self.prompts.lock().unwrap().clone()
    }

    pub async fn spawn(&self) -> String {
        let router = Router::new()
            .route("/api/generate", post(generate))
            .route("/api/tags", get(tags))
            .with_state(self.clone());
        spawn_server(router).await
    }
}

async fn generate(State(service): State<MockAssistantService>, Json(request): Json<Value>) -> impl IntoResponse {
    service.prompts.lock().unwrap().push(request);
    tokio::time::sleep(service.delay).await;
    (service.status, Json(service.body.clone()))
}

async fn tags(State(service): State<MockAssistantService>) -> Json<Value> {
    let models: Vec<Value> = service.models.iter().map(|name| json!({"name": name})).collect();
    Json(json!({"models": models}))
}
