// One in-process upstream standing in for both the completion API and the
// cluster API, so router tests can drive every endpoint end to end.

#![allow(dead_code)]

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use vivoracle::prompts;
use vivserve::{build_app, AppState, ServerConfig};

#[derive(Default)]
pub struct Upstream {
    /// Shapes the structure stage answers with
    pub shapes: Vec<Value>,
    /// Status the structure stage answers with instead of shapes
    pub structure_status: Option<u16>,
    pub deployments: BTreeMap<String, Value>,
    pub pod_count: usize,
    pub fail_delete: Option<u16>,
}

#[derive(Clone)]
pub struct Harness {
    pub base: String,
    pub upstream: Arc<Mutex<Upstream>>,
}

type Shared = State<Arc<Mutex<Upstream>>>;

pub fn creature_shapes() -> Vec<Value> {
    vec![
        json!({"type": "rect", "x": 4, "y": 4, "w": 10, "h": 8, "role": "outline"}),
        json!({"type": "rect", "x": 5, "y": 5, "w": 8, "h": 6, "role": "body"}),
        json!({"type": "line", "x1": 0, "y1": 8, "x2": 3, "y2": 8, "role": "tail"}),
    ]
}

impl Harness {
    pub async fn start() -> Self {
        let upstream = Arc::new(Mutex::new(Upstream {
            shapes: creature_shapes(),
            ..Default::default()
        }));

        let app = Router::new()
            .route("/chat/completions", post(complete))
            .route("/api/v1/namespaces/:ns/pods", get(list_pods))
            .route("/api/v1/namespaces/:ns/pods/:name", axum::routing::delete(missing))
            .route(
                "/apis/apps/v1/namespaces/:ns/deployments",
                get(list_deployments).post(create_deployment),
            )
            .route(
                "/apis/apps/v1/namespaces/:ns/deployments/:name",
                get(get_deployment).delete(delete_deployment).patch(missing),
            )
            .route("/apis/metrics.k8s.io/v1beta1/namespaces/:ns/pods", get(missing))
            .with_state(Arc::clone(&upstream));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base: format!("http://{}", addr),
            upstream,
        }
    }

    pub fn config(&self) -> ServerConfig {
        let mut config = ServerConfig::default();
        config.inference.api_base = self.base.clone();
        config.inference.token = "test-token".to_string();
        config.inference.fallback_models = vec!["mini".to_string()];
        config.inference.structure_model = "big".to_string();
        config.inference.timeout_ms = 500;
        config.inference.backoff_ms = 10;
        config.cluster.api_url = self.base.clone();
        config.cluster.token = "cluster-token".to_string();
        config.cluster.request_timeout_ms = 2_000;
        config
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut Upstream) -> R) -> R {
        f(&mut self.upstream.lock().unwrap())
    }

    /// Send one request through the full layered app
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, http::HeaderMap, Value) {
        send_to(AppState::new(self.config()).unwrap(), request).await
    }
}

pub async fn send_to(state: AppState, request: Request<Body>) -> (StatusCode, http::HeaderMap, Value) {
    let response = build_app(state).oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, headers, body)
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn delete_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn post_json(uri: &str, body: &Value) -> Request<Body> {
    post_raw(uri, body.to_string())
}

pub fn post_raw(uri: &str, body: impl Into<String>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.into()))
        .unwrap()
}

fn completion(content: Value) -> Response {
    Json(json!({"choices": [{"message": {"role": "assistant", "content": content.to_string()}}]}))
        .into_response()
}

fn status(code: u16) -> Response {
    (
        StatusCode::from_u16(code).unwrap(),
        Json(json!({"message": "scripted failure"})),
    )
        .into_response()
}

async fn complete(State(state): Shared, Json(body): Json<Value>) -> Response {
    let system = body["messages"][0]["content"].as_str().unwrap_or_default();
    let upstream = state.lock().unwrap();

    if system == prompts::DESCRIBE {
        completion(json!({"parts": ["one rectangle as the body"]}))
    } else if system == prompts::COLOUR {
        completion(json!({"colors": {"outline": "#111111", "body": "#22aa22"}, "primaryColour": "#22aa22"}))
    } else if system == prompts::MOTION {
        completion(json!({"motions": []}))
    } else if system == prompts::ANIMATE {
        completion(json!({"animated": []}))
    } else if let Some(code) = upstream.structure_status {
        status(code)
    } else {
        completion(json!({"roles": ["outline", "body", "tail"], "shapes": upstream.shapes}))
    }
}

async fn list_pods(State(state): Shared) -> Response {
    let count = state.lock().unwrap().pod_count;
    let items: Vec<Value> = (0..count)
        .map(|i| json!({"metadata": {"name": format!("pod-{i}")}, "status": {"phase": "Running"}}))
        .collect();
    Json(json!({"items": items})).into_response()
}

async fn list_deployments(State(state): Shared) -> Response {
    let items: Vec<Value> = state.lock().unwrap().deployments.values().cloned().collect();
    Json(json!({"items": items})).into_response()
}

async fn create_deployment(State(state): Shared, Json(manifest): Json<Value>) -> Response {
    let name = manifest["metadata"]["name"].as_str().unwrap_or_default().to_string();
    let mut upstream = state.lock().unwrap();
    upstream.pod_count += manifest["spec"]["replicas"].as_u64().unwrap_or(0) as usize;
    upstream.deployments.insert(name, manifest.clone());
    (StatusCode::CREATED, Json(manifest)).into_response()
}

async fn get_deployment(State(state): Shared, Path((_ns, name)): Path<(String, String)>) -> Response {
    match state.lock().unwrap().deployments.get(&name) {
        Some(d) => Json(d.clone()).into_response(),
        None => status(404),
    }
}

async fn delete_deployment(State(state): Shared, Path((_ns, name)): Path<(String, String)>) -> Response {
    let mut upstream = state.lock().unwrap();
    if let Some(code) = upstream.fail_delete {
        return status(code);
    }
    match upstream.deployments.remove(&name) {
        Some(_) => Json(json!({"status": "Success"})).into_response(),
        None => status(404),
    }
}

async fn missing(Query(_q): Query<HashMap<String, String>>) -> Response {
    status(404)
}
