//! Test utilities for shopsight-core
//!
//! Provides a mock AI server speaking just enough of the Ollama and Gemini
//! HTTP APIs to exercise the real backends end to end.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::sync::oneshot;

#[derive(Default)]
struct MockState {
    reply: String,
    /// When set, every endpoint answers with this status
    fail_status: Option<u16>,
    last_prompt: Mutex<Option<String>>,
}

/// Mock AI server for testing
pub struct MockAiServer {
    addr: SocketAddr,
    state: Arc<MockState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockAiServer {
    /// Start a server that replies with `reply` to every generation request
    pub async fn start(reply: &str) -> Self {
        Self::start_with_state(MockState {
            reply: reply.to_string(),
            ..Default::default()
        })
        .await
    }

    /// Start a server that answers every request with `status`
    pub async fn start_failing(status: u16) -> Self {
        Self::start_with_state(MockState {
            fail_status: Some(status),
            ..Default::default()
        })
        .await
    }

    async fn start_with_state(state: MockState) -> Self {
        let state = Arc::new(state);
        let app = Router::new()
            .route("/api/tags", get(handle_ollama_tags))
            .route("/api/generate", post(handle_ollama_generate))
            .route("/v1beta/models", get(handle_gemini_models))
            .route("/v1beta/models/:model", post(handle_gemini_generate))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// The prompt text of the most recent generation request
    pub fn last_prompt(&self) -> Option<String> {
        self.state.last_prompt.lock().ok().and_then(|p| p.clone())
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockAiServer {
    fn drop(&mut self) {
        self.stop();
    }
}

impl MockState {
    fn failure(&self) -> Option<Response> {
        let status = StatusCode::from_u16(self.fail_status?).ok()?;
        Some((status, Json(json!({"error": {"message": "mock failure"}}))).into_response())
    }

    fn record(&self, prompt: Option<&str>) {
        if let Ok(mut last) = self.last_prompt.lock() {
            *last = prompt.map(str::to_string);
        }
    }
}

async fn handle_ollama_tags(State(state): State<Arc<MockState>>) -> Response {
    if let Some(resp) = state.failure() {
        return resp;
    }
    Json(json!({"models": [{"name": "llama3.2:latest"}]})).into_response()
}

async fn handle_ollama_generate(
    State(state): State<Arc<MockState>>,
    Json(request): Json<Value>,
) -> Response {
    if let Some(resp) = state.failure() {
        return resp;
    }
    state.record(request["prompt"].as_str());
    Json(json!({"model": request["model"], "response": state.reply, "done": true})).into_response()
}

async fn handle_gemini_models(State(state): State<Arc<MockState>>) -> Response {
    if let Some(resp) = state.failure() {
        return resp;
    }
    Json(json!({"models": [{"name": "models/gemini-1.5-flash"}]})).into_response()
}

async fn handle_gemini_generate(
    State(state): State<Arc<MockState>>,
    Json(request): Json<Value>,
) -> Response {
    if let Some(resp) = state.failure() {
        return resp;
    }
    state.record(request["contents"][0]["parts"][0]["text"].as_str());
    Json(json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": state.reply}]},
            "finishReason": "STOP"
        }]
    }))
    .into_response()
}
