// In-process fake of the namespaced cluster API
//
// Deployments and pods live in memory. Creating a deployment also creates
// one Pending pod per replica so admission counts see them. Failure
// switches make individual endpoints answer with an error status.

#![allow(dead_code)]

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use vivcluster::ClusterConfig;

pub const NAMESPACE: &str = "creatures";

#[derive(Default)]
pub struct Cluster {
    pub deployments: BTreeMap<String, Value>,
    pub pods: Vec<Value>,
    pub metrics: Vec<Value>,
    /// `(method, path)` of every request
    pub requests: Vec<(String, String)>,
    pub authorization: Vec<String>,
    pub fail_pod_list: Option<u16>,
    pub fail_deployment_get: Option<u16>,
    pub fail_deployment_delete: Option<u16>,
    pub fail_create: Option<u16>,
    pub fail_metrics: Option<u16>,
}

#[derive(Clone)]
pub struct FakeCluster {
    pub base: String,
    pub state: Arc<Mutex<Cluster>>,
}

type Shared = State<Arc<Mutex<Cluster>>>;
type Params = Query<HashMap<String, String>>;

impl FakeCluster {
    pub async fn start() -> Self {
        let state = Arc::new(Mutex::new(Cluster::default()));

        let app = Router::new()
            .route("/api/v1/namespaces/:ns/pods", get(list_pods))
            .route("/api/v1/namespaces/:ns/pods/:name", axum::routing::delete(delete_pod))
            .route(
                "/apis/apps/v1/namespaces/:ns/deployments",
                get(list_deployments).post(create_deployment),
            )
            .route(
                "/apis/apps/v1/namespaces/:ns/deployments/:name",
                get(get_deployment)
                    .delete(delete_deployment)
                    .patch(patch_deployment),
            )
            .route("/apis/metrics.k8s.io/v1beta1/namespaces/:ns/pods", get(list_metrics))
            .layer(axum::middleware::from_fn_with_state(Arc::clone(&state), record))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base: format!("http://{}", addr),
            state,
        }
    }

    pub fn config(&self) -> ClusterConfig {
        ClusterConfig {
            api_url: self.base.clone(),
            token: "cluster-token".to_string(),
            namespace: NAMESPACE.to_string(),
            request_timeout_ms: 2_000,
            ..Default::default()
        }
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut Cluster) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    /// Add `count` unrelated Running pods
    pub fn seed_pods(&self, count: usize) {
        self.with(|c| {
            for i in 0..count {
                c.pods.push(pod(&format!("other-{i}"), "other", "Running", true));
            }
        });
    }

    pub fn seed_pod(&self, pod: Value) {
        self.with(|c| c.pods.push(pod));
    }

    /// Add an owned deployment carrying `labels` on top of `app=creature`
    pub fn seed_deployment(&self, name: &str, labels: &[(&str, String)], replicas: u32, ready: u32) {
        let mut all = serde_json::Map::new();
        all.insert("app".to_string(), json!("creature"));
        for (k, v) in labels {
            all.insert(k.to_string(), json!(v));
        }
        let deployment = json!({
            "metadata": {"name": name, "labels": all},
            "spec": {"replicas": replicas},
            "status": {"readyReplicas": ready}
        });
        self.with(|c| {
            c.deployments.insert(name.to_string(), deployment);
        });
    }

    pub fn deployment(&self, name: &str) -> Option<Value> {
        self.with(|c| c.deployments.get(name).cloned())
    }

    pub fn deployment_names(&self) -> Vec<String> {
        self.with(|c| c.deployments.keys().cloned().collect())
    }

    pub fn pod_count(&self) -> usize {
        self.with(|c| c.pods.len())
    }

    pub fn requests(&self) -> Vec<(String, String)> {
        self.with(|c| c.requests.clone())
    }
}

pub fn pod(name: &str, deployment: &str, phase: &str, ready: bool) -> Value {
    json!({
        "metadata": {
            "name": name,
            "labels": {"app": "creature", "creature-deployment": deployment}
        },
        "status": {
            "phase": phase,
            "startTime": "2026-10-14T12:00:00Z",
            "conditions": [{"type": "Ready", "status": if ready { "True" } else { "False" }}],
            "containerStatuses": [{"name": "creature", "restartCount": 1}]
        }
    })
}

async fn record(
    State(state): State<Arc<Mutex<Cluster>>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Response {
    {
        let mut cluster = state.lock().unwrap();
        cluster.requests.push((method.to_string(), uri.path().to_string()));
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        cluster.authorization.push(auth);
    }
    next.run(request).await
}

fn matches_selector(object: &Value, selector: Option<&String>) -> bool {
    let Some(selector) = selector else {
        return true;
    };
    selector.split(',').all(|term| match term.split_once('=') {
        Some((k, v)) => object["metadata"]["labels"][k] == v,
        None => false,
    })
}

fn failure(code: u16) -> Response {
    let status = StatusCode::from_u16(code).unwrap();
    (status, Json(json!({"kind": "Status", "message": "scripted failure"}))).into_response()
}

fn not_found(name: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"kind": "Status", "reason": "NotFound", "message": format!("\"{name}\" not found")})),
    )
        .into_response()
}

async fn list_pods(State(state): Shared, Path(_ns): Path<String>, Query(q): Params) -> Response {
    let cluster = state.lock().unwrap();
    if let Some(code) = cluster.fail_pod_list {
        return failure(code);
    }
    let items: Vec<Value> = cluster
        .pods
        .iter()
        .filter(|p| matches_selector(p, q.get("labelSelector")))
        .cloned()
        .collect();
    Json(json!({"kind": "PodList", "items": items})).into_response()
}

async fn delete_pod(State(state): Shared, Path((_ns, name)): Path<(String, String)>) -> Response {
    let mut cluster = state.lock().unwrap();
    let before = cluster.pods.len();
    cluster.pods.retain(|p| p["metadata"]["name"] != name.as_str());
    if cluster.pods.len() == before {
        return not_found(&name);
    }
    Json(json!({"kind": "Pod", "metadata": {"name": name}})).into_response()
}

async fn list_deployments(State(state): Shared, Path(_ns): Path<String>, Query(q): Params) -> Response {
    let cluster = state.lock().unwrap();
    let items: Vec<Value> = cluster
        .deployments
        .values()
        .filter(|d| matches_selector(d, q.get("labelSelector")))
        .cloned()
        .collect();
    Json(json!({"kind": "DeploymentList", "items": items})).into_response()
}

async fn create_deployment(
    State(state): Shared,
    Path(_ns): Path<String>,
    Json(manifest): Json<Value>,
) -> Response {
    let mut cluster = state.lock().unwrap();
    if let Some(code) = cluster.fail_create {
        return failure(code);
    }
    let name = manifest["metadata"]["name"].as_str().unwrap_or_default().to_string();
    if cluster.deployments.contains_key(&name) {
        return failure(409);
    }
    let replicas = manifest["spec"]["replicas"].as_u64().unwrap_or(0);
    for i in 0..replicas {
        cluster.pods.push(pod(&format!("{name}-{i}"), &name, "Pending", false));
    }
    cluster.deployments.insert(name, manifest.clone());
    (StatusCode::CREATED, Json(manifest)).into_response()
}

async fn get_deployment(State(state): Shared, Path((_ns, name)): Path<(String, String)>) -> Response {
    let cluster = state.lock().unwrap();
    if let Some(code) = cluster.fail_deployment_get {
        return failure(code);
    }
    match cluster.deployments.get(&name) {
        Some(d) => Json(d.clone()).into_response(),
        None => not_found(&name),
    }
}

async fn delete_deployment(State(state): Shared, Path((_ns, name)): Path<(String, String)>) -> Response {
    let mut cluster = state.lock().unwrap();
    if let Some(code) = cluster.fail_deployment_delete {
        return failure(code);
    }
    match cluster.deployments.remove(&name) {
        Some(_) => {
            cluster
                .pods
                .retain(|p| p["metadata"]["labels"]["creature-deployment"] != name.as_str());
            Json(json!({"kind": "Status", "status": "Success"})).into_response()
        }
        None => not_found(&name),
    }
}

async fn patch_deployment(
    State(state): Shared,
    Path((_ns, name)): Path<(String, String)>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if content_type != "application/merge-patch+json" {
        return failure(415);
    }
    let Ok(patch) = serde_json::from_str::<Value>(&body) else {
        return failure(400);
    };

    let mut cluster = state.lock().unwrap();
    let Some(deployment) = cluster.deployments.get_mut(&name) else {
        return not_found(&name);
    };
    if let Some(labels) = patch["metadata"]["labels"].as_object() {
        for (k, v) in labels {
            deployment["metadata"]["labels"][k] = v.clone();
        }
    }
    Json(deployment.clone()).into_response()
}

async fn list_metrics(State(state): Shared, Path(_ns): Path<String>, Query(q): Params) -> Response {
    let cluster = state.lock().unwrap();
    if let Some(code) = cluster.fail_metrics {
        return failure(code);
    }
    let items: Vec<Value> = cluster
        .metrics
        .iter()
        .filter(|m| matches_selector(m, q.get("labelSelector")))
        .cloned()
        .collect();
    Json(json!({"kind": "PodMetricsList", "items": items})).into_response()
}
