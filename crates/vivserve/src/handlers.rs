//! HTTP handlers for the sprite and cluster endpoints

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

use vivcluster::{
    DeployOutcome, DeployRequest, DeploymentStatus, HeartbeatOutcome, Orchestrator,
};
use vivoracle::{AnimatedSprite, AnimationRequest, GeneratedSprite, ModelCaller, SpritePipeline};

use crate::config::ServerConfig;
use crate::error::{ApiError, ApiResult};
use crate::responses::{DeletedResponse, HealthResponse, MetricsResponse, RestartedResponse};

/// Body of POST /generate-sprite
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    /// Subject to draw
    #[serde(default)]
    pub prompt: Option<String>,
}

/// `?deployment=` query and POST /k8s/heartbeat body
#[derive(Debug, Default, Deserialize)]
pub struct DeploymentParam {
    /// Deployment name
    #[serde(default)]
    pub deployment: Option<String>,
}

impl DeploymentParam {
    fn require(&self) -> ApiResult<&str> {
        self.deployment
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| ApiError::bad_request("Missing deployment parameter"))
    }
}

fn query_param(query: Result<Query<DeploymentParam>, QueryRejection>) -> ApiResult<DeploymentParam> {
    query.map(|Query(params)| params).map_err(|e| {
        debug!("Rejected query: {}", e);
        ApiError::bad_request("Invalid query string")
    })
}

fn path_name(path: Result<Path<String>, PathRejection>) -> ApiResult<String> {
    path.map(|Path(name)| name).map_err(|e| {
        debug!("Rejected path: {}", e);
        ApiError::bad_request("Invalid path")
    })
}

/// State shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Sprite generation stages
    pub pipeline: Arc<SpritePipeline>,

    /// Cluster lifecycle operations
    pub orchestrator: Arc<Orchestrator>,

    /// Immutable server configuration
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Build the pipeline and orchestrator described by `config`
    pub fn new(config: ServerConfig) -> ApiResult<Self> {
        let caller = ModelCaller::new(config.inference.clone()).map_err(|e| {
            error!("Failed to build model caller: {}", e);
            ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, format!("Model caller: {}", e))
        })?;
        let orchestrator = Orchestrator::new(config.cluster.clone()).map_err(|e| {
            error!("Failed to build cluster client: {}", e);
            ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, format!("Cluster client: {}", e))
        })?;

        Ok(Self {
            pipeline: Arc::new(SpritePipeline::new(caller, config.sprite.clone())),
            orchestrator: Arc::new(orchestrator),
            config: Arc::new(config),
        })
    }
}

/// GET /health - Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

/// POST /generate-sprite - Run the generation stages for a prompt
pub async fn generate_sprite(
    State(state): State<AppState>,
    body: Result<Json<GenerateRequest>, JsonRejection>,
) -> ApiResult<Json<GeneratedSprite>> {
    let Json(request) = body.map_err(|e| {
        debug!("Rejected generate body: {}", e);
        ApiError::bad_request("Bad prompt")
    })?;
    let prompt = request.prompt.unwrap_or_default();

    info!("Generating sprite for '{}'", prompt.trim());
    let sprite = state.pipeline.generate(&prompt).await?;
    Ok(Json(sprite))
}

/// POST /animate-sprite - Derive three frames from a generated sprite
pub async fn animate_sprite(
    State(state): State<AppState>,
    body: Result<Json<AnimationRequest>, JsonRejection>,
) -> ApiResult<Json<AnimatedSprite>> {
    let Json(request) = body.map_err(|e| {
        debug!("Rejected animate body: {}", e);
        ApiError::bad_request("Bad sprite data")
    })?;

    let animated = state.pipeline.animate(&request).await?;
    Ok(Json(animated))
}

/// POST /k8s/deploy - Admit and create a creature deployment
pub async fn deploy(
    State(state): State<AppState>,
    body: Result<Json<DeployRequest>, JsonRejection>,
) -> ApiResult<Json<DeployOutcome>> {
    let Json(request) = body.map_err(|_| ApiError::bad_request("Invalid JSON body"))?;

    let outcome = state
        .orchestrator
        .deploy(&request)
        .await
        .map_err(ApiError::cluster("Failed to create deployment"))?;
    Ok(Json(outcome))
}

/// GET /k8s/pods?deployment= - Pods and replica counts of a deployment
pub async fn pods(
    State(state): State<AppState>,
    query: Result<Query<DeploymentParam>, QueryRejection>,
) -> ApiResult<Response> {
    let params = query_param(query)?;
    let deployment = params.require()?;

    let status: DeploymentStatus = state
        .orchestrator
        .status(deployment)
        .await
        .map_err(ApiError::cluster("Failed to query pods"))?;
    Ok(no_cache(Json(status)))
}

/// DELETE /k8s/deploy/:name - Tear down a deployment
pub async fn teardown(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<DeletedResponse>> {
    let name = path_name(path)?;
    let outcome = state
        .orchestrator
        .teardown(&name)
        .await
        .map_err(ApiError::cluster("Failed to delete deployment"))?;

    Ok(Json(if outcome.already_gone {
        DeletedResponse::already_gone()
    } else {
        DeletedResponse::removed()
    }))
}

/// GET /k8s/pod-metrics?deployment= - Usage per pod
pub async fn pod_metrics(
    State(state): State<AppState>,
    query: Result<Query<DeploymentParam>, QueryRejection>,
) -> ApiResult<Response> {
    let params = query_param(query)?;
    let deployment = params.require()?;

    let metrics = state.orchestrator.metrics(deployment).await?;
    Ok(no_cache(Json(MetricsResponse { metrics })))
}

/// DELETE /k8s/pods/:pod - Delete one pod so it is replaced
pub async fn restart_pod(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<RestartedResponse>> {
    let pod = path_name(path)?;
    state
        .orchestrator
        .restart_pod(&pod)
        .await
        .map_err(ApiError::cluster("Failed to delete pod"))?;
    Ok(Json(RestartedResponse { restarted: true }))
}

/// POST /k8s/heartbeat - Extend a watched deployment's lease
pub async fn heartbeat(
    State(state): State<AppState>,
    body: Result<Json<DeploymentParam>, JsonRejection>,
) -> ApiResult<Json<HeartbeatOutcome>> {
    let Json(params) = body.map_err(|_| ApiError::bad_request("Invalid JSON body"))?;
    let deployment = params.require()?;

    let outcome = state
        .orchestrator
        .heartbeat(deployment)
        .await
        .map_err(ApiError::cluster("Failed to record heartbeat"))?;
    Ok(Json(outcome))
}

/// Every OPTIONS request gets an empty 200; CORS headers come from the layer
async fn options_ok() -> StatusCode {
    StatusCode::OK
}

async fn fallback(method: Method) -> Response {
    if method == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    ApiError::not_found("Not found").into_response()
}

fn no_cache(body: impl IntoResponse) -> Response {
    (
        [(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"))],
        body,
    )
        .into_response()
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!("Handler panicked: {}", detail);
    ApiError::internal().into_response()
}

/// Create router with all API endpoints
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check).options(options_ok))
        .route("/generate-sprite", post(generate_sprite).options(options_ok))
        .route("/animate-sprite", post(animate_sprite).options(options_ok))
        .route("/k8s/deploy", post(deploy).options(options_ok))
        .route("/k8s/deploy/:name", delete(teardown).options(options_ok))
        .route("/k8s/pods", get(pods).options(options_ok))
        .route("/k8s/pods/:pod", delete(restart_pod).options(options_ok))
        .route("/k8s/pod-metrics", get(pod_metrics).options(options_ok))
        .route("/k8s/heartbeat", post(heartbeat).options(options_ok))
        .fallback(fallback)
}

/// Router with state and the panic, trace and CORS layers applied
pub fn build_app(state: AppState) -> Router {
    with_layers(create_router().with_state(state))
}

fn with_layers(router: Router) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(Duration::from_secs(600));

    router
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
