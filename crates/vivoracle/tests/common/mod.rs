// In-process fake chat-completion API
//
// Binds an axum router on 127.0.0.1:0 and answers each request with
// whatever the test's script returns for it. Every request is recorded.

#![allow(dead_code)]

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use vivoracle::InferenceConfig;

/// One recorded request
#[derive(Debug, Clone)]
pub struct ChatCall {
    pub model: String,
    pub system: String,
    pub user: String,
    pub max_tokens: u64,
    pub temperature: f64,
    pub authorization: String,
}

/// Scripted answer
pub enum Scripted {
    Status(u16),
    Content(String),
    Delayed(Duration, String),
}

impl Scripted {
    /// Completion whose content is `value` serialized
    pub fn json(value: Value) -> Self {
        Scripted::Content(value.to_string())
    }
}

type Script = dyn Fn(&ChatCall) -> Scripted + Send + Sync;

struct Inner {
    script: Box<Script>,
    calls: Mutex<Vec<ChatCall>>,
}

pub struct FakeInference {
    pub base: String,
    inner: Arc<Inner>,
}

impl FakeInference {
    pub async fn start<F>(script: F) -> Self
    where
        F: Fn(&ChatCall) -> Scripted + Send + Sync + 'static,
    {
        let inner = Arc::new(Inner {
            script: Box::new(script),
            calls: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/chat/completions", post(complete))
            .with_state(Arc::clone(&inner));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base: format!("http://{}", addr),
            inner,
        }
    }

    pub fn calls(&self) -> Vec<ChatCall> {
        self.inner.calls.lock().unwrap().clone()
    }

    pub fn models_called(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.model).collect()
    }

    /// Fast-failing config pointed at this fake
    pub fn config(&self, fallback: &[&str], structure_model: &str) -> InferenceConfig {
        InferenceConfig {
            api_base: self.base.clone(),
            token: "test-token".to_string(),
            fallback_models: fallback.iter().map(|s| s.to_string()).collect(),
            structure_model: structure_model.to_string(),
            timeout_ms: 300,
            max_attempts: 2,
            backoff_ms: 20,
            ..Default::default()
        }
    }
}

async fn complete(
    State(inner): State<Arc<Inner>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let message = |i: usize| {
        body["messages"][i]["content"]
            .as_str()
            .unwrap_or_default()
            .to_string()
    };
    let call = ChatCall {
        model: body["model"].as_str().unwrap_or_default().to_string(),
        system: message(0),
        user: message(1),
        max_tokens: body["max_tokens"].as_u64().unwrap_or_default(),
        temperature: body["temperature"].as_f64().unwrap_or_default(),
        authorization: headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string(),
    };

    let scripted = (inner.script)(&call);
    inner.calls.lock().unwrap().push(call);

    match scripted {
        Scripted::Status(code) => {
            let status = StatusCode::from_u16(code).unwrap();
            (status, Json(json!({"error": {"message": "scripted failure"}}))).into_response()
        }
        Scripted::Content(content) => completion(content),
        Scripted::Delayed(delay, content) => {
            tokio::time::sleep(delay).await;
            completion(content)
        }
    }
}

fn completion(content: String) -> Response {
    Json(json!({"choices": [{"message": {"role": "assistant", "content": content}}]})).into_response()
}
