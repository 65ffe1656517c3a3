//! Thin client for the namespaced Deployment, Pod and metrics endpoints

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

use crate::config::ClusterConfig;
use crate::error::{ClusterError, ClusterResult};
use crate::objects::{Deployment, ObjectList, Pod, PodMetrics};

const BODY_PREVIEW: usize = 300;

/// Bearer-authenticated client scoped to one namespace
#[derive(Debug, Clone)]
pub struct ClusterClient {
    http: reqwest::Client,
    base: String,
    token: String,
    namespace: String,
}

impl ClusterClient {
    /// Create a client from settings
    pub fn new(config: &ClusterConfig) -> ClusterResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;

        Ok(Self {
            http,
            base: config.api_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            namespace: config.namespace.clone(),
        })
    }

    /// Namespace every call is scoped to
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn pods_path(&self) -> String {
        format!("/api/v1/namespaces/{}/pods", self.namespace)
    }

    fn deployments_path(&self) -> String {
        format!("/apis/apps/v1/namespaces/{}/deployments", self.namespace)
    }

    fn metrics_path(&self) -> String {
        format!("/apis/metrics.k8s.io/v1beta1/namespaces/{}/pods", self.namespace)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        debug!("{} {}", method, path);
        self.http
            .request(method, format!("{}{}", self.base, path))
            .bearer_auth(&self.token)
            .header(ACCEPT, "application/json")
    }

    /// Pods in the namespace, optionally filtered by a label selector
    pub async fn list_pods(&self, selector: Option<&str>) -> ClusterResult<Vec<Pod>> {
        let mut request = self.request(Method::GET, &self.pods_path());
        if let Some(selector) = selector {
            request = request.query(&[("labelSelector", selector)]);
        }
        let list: ObjectList<Pod> = decode(send(request, "pods", &self.namespace).await?).await?;
        Ok(list.items)
    }

    /// Deployments matching a label selector
    pub async fn list_deployments(&self, selector: &str) -> ClusterResult<Vec<Deployment>> {
        let request = self
            .request(Method::GET, &self.deployments_path())
            .query(&[("labelSelector", selector)]);
        let list: ObjectList<Deployment> =
            decode(send(request, "deployments", &self.namespace).await?).await?;
        Ok(list.items)
    }

    /// One deployment; [`ClusterError::NotFound`] on 404
    pub async fn get_deployment(&self, name: &str) -> ClusterResult<Deployment> {
        let path = format!("{}/{}", self.deployments_path(), name);
        decode(send(self.request(Method::GET, &path), "deployment", name).await?).await
    }

    /// Submit a Deployment manifest
    pub async fn create_deployment(&self, manifest: &Value) -> ClusterResult<Deployment> {
        let name = manifest["metadata"]["name"].as_str().unwrap_or_default();
        let request = self
            .request(Method::POST, &self.deployments_path())
            .header(CONTENT_TYPE, "application/json")
            .json(manifest);
        decode(send(request, "deployment", name).await?).await
    }

    /// Delete a deployment; [`ClusterError::NotFound`] on 404
    pub async fn delete_deployment(&self, name: &str) -> ClusterResult<()> {
        let path = format!("{}/{}", self.deployments_path(), name);
        send(self.request(Method::DELETE, &path), "deployment", name).await?;
        Ok(())
    }

    /// Delete a pod; [`ClusterError::NotFound`] on 404
    pub async fn delete_pod(&self, name: &str) -> ClusterResult<()> {
        let path = format!("{}/{}", self.pods_path(), name);
        send(self.request(Method::DELETE, &path), "pod", name).await?;
        Ok(())
    }

    /// Merge `labels` into a deployment's metadata, returning the updated object
    pub async fn patch_deployment_labels(
        &self,
        name: &str,
        labels: &BTreeMap<&str, String>,
    ) -> ClusterResult<Deployment> {
        let path = format!("{}/{}", self.deployments_path(), name);
        let request = self
            .request(Method::PATCH, &path)
            .header(CONTENT_TYPE, "application/merge-patch+json")
            .body(json!({"metadata": {"labels": labels}}).to_string());
        decode(send(request, "deployment", name).await?).await
    }

    /// Pod usage from the metrics API
    pub async fn pod_metrics(&self, selector: &str) -> ClusterResult<Vec<PodMetrics>> {
        let request = self
            .request(Method::GET, &self.metrics_path())
            .query(&[("labelSelector", selector)]);
        let list: ObjectList<PodMetrics> =
            decode(send(request, "pod metrics", &self.namespace).await?).await?;
        Ok(list.items)
    }
}

async fn send(request: RequestBuilder, kind: &'static str, name: &str) -> ClusterResult<Response> {
    let response = request.send().await?;
    let status = response.status();

    if status == StatusCode::NOT_FOUND {
        return Err(ClusterError::NotFound {
            kind,
            name: name.to_string(),
        });
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ClusterError::Api {
            status: status.as_u16(),
            body: body.chars().take(BODY_PREVIEW).collect(),
        });
    }
    Ok(response)
}

async fn decode<T: DeserializeOwned>(response: Response) -> ClusterResult<T> {
    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| ClusterError::Decode(e.to_string()))
}
