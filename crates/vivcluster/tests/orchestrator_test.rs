// Integration tests for the orchestrator against an in-memory cluster API

mod common;

use common::{pod, FakeCluster};
use serde_json::json;
use vivcluster::{ClusterError, DeployRequest, Orchestrator, Strategy};

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

fn orchestrator(fake: &FakeCluster) -> Orchestrator {
    Orchestrator::new(fake.config()).unwrap()
}

fn request(name: &str, replicas: serde_json::Value, strategy: &str) -> DeployRequest {
    DeployRequest {
        name: json!(name),
        replicas,
        strategy: json!(strategy),
    }
}

#[tokio::test]
async fn test_admission_at_ceiling_minus_one() {
    let fake = FakeCluster::start().await;
    fake.seed_pods(29);
    let orchestrator = orchestrator(&fake);

    let err = orchestrator
        .deploy(&request("blob", json!(2), "RollingUpdate"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ClusterError::CapacityExceeded { running: 29, requested: 2, ceiling: 30 }
    ));
    assert!(fake.deployment_names().is_empty());

    let outcome = orchestrator
        .deploy(&request("blob", json!(1), "RollingUpdate"))
        .await
        .unwrap();
    assert_eq!(outcome.replicas, 1);
    assert_eq!(fake.deployment_names(), vec![outcome.deployment.clone()]);
    assert_eq!(fake.pod_count(), 30);
}

#[tokio::test]
async fn test_deploy_sanitizes_and_clamps() {
    let fake = FakeCluster::start().await;
    let orchestrator = orchestrator(&fake);

    let outcome = orchestrator
        .deploy(&request("Mr. Sparkles!! 🐉", json!(99), "bogus"))
        .await
        .unwrap();

    assert!(outcome.deployment.starts_with("creature-mr-sparkles-"));
    assert_eq!(outcome.deployment.len(), "creature-mr-sparkles-".len() + 4);
    assert_eq!(outcome.replicas, 6);
    assert_eq!(outcome.strategy, Strategy::RollingUpdate);
    assert_eq!(outcome.ttl, 600);

    let manifest = fake.deployment(&outcome.deployment).unwrap();
    assert_eq!(manifest["spec"]["replicas"], 6);
    assert_eq!(manifest["spec"]["strategy"]["type"], "RollingUpdate");
    assert_eq!(manifest["metadata"]["labels"]["creature-name"], "mr-sparkles");
    let created: i64 = manifest["metadata"]["labels"]["created-at"]
        .as_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!((now() - created).abs() <= 5);
    assert_eq!(
        manifest["spec"]["template"]["spec"]["containers"][0]["command"][4],
        "Mr. Sparkles!! 🐉"
    );

    let auth = fake.with(|c| c.authorization.clone());
    assert!(auth.iter().all(|a| a == "Bearer cluster-token"));
}

#[tokio::test]
async fn test_deploy_outcome_wire_shape() {
    let fake = FakeCluster::start().await;
    let outcome = orchestrator(&fake)
        .deploy(&request("snail", json!("2"), "Recreate"))
        .await
        .unwrap();

    let value = serde_json::to_value(&outcome).unwrap();
    assert_eq!(value["replicas"], 2);
    assert_eq!(value["strategy"], "Recreate");
    assert_eq!(value["ttl"], 600);
    assert!(value["deployment"].as_str().unwrap().starts_with("creature-snail-"));
}

#[tokio::test]
async fn test_deploy_sweeps_expired_before_admission() {
    let fake = FakeCluster::start().await;
    fake.seed_deployment("creature-old-aaaa", &[("created-at", (now() - 3600).to_string())], 1, 1);
    fake.seed_pod(pod("creature-old-aaaa-0", "creature-old-aaaa", "Running", true));
    fake.seed_pods(29);
    let orchestrator = orchestrator(&fake);

    let outcome = orchestrator
        .deploy(&request("fresh", json!(1), "Recreate"))
        .await
        .unwrap();

    assert!(fake.deployment("creature-old-aaaa").is_none());
    assert_eq!(fake.deployment_names(), vec![outcome.deployment]);
}

#[tokio::test]
async fn test_deploy_pod_count_failure_is_an_error() {
    let fake = FakeCluster::start().await;
    fake.with(|c| c.fail_pod_list = Some(500));

    let err = orchestrator(&fake)
        .deploy(&request("blob", json!(1), ""))
        .await
        .unwrap_err();
    assert!(matches!(err, ClusterError::Api { status: 500, .. }));
    assert!(fake.deployment_names().is_empty());
}

#[tokio::test]
async fn test_deploy_create_failure_is_an_error() {
    let fake = FakeCluster::start().await;
    fake.with(|c| c.fail_create = Some(403));

    let err = orchestrator(&fake)
        .deploy(&request("blob", json!(1), ""))
        .await
        .unwrap_err();
    assert!(matches!(err, ClusterError::Api { status: 403, .. }));
}

#[tokio::test]
async fn test_teardown_twice_succeeds() {
    let fake = FakeCluster::start().await;
    let orchestrator = orchestrator(&fake);
    let outcome = orchestrator
        .deploy(&request("blob", json!(2), ""))
        .await
        .unwrap();

    let first = orchestrator.teardown(&outcome.deployment).await.unwrap();
    let second = orchestrator.teardown(&outcome.deployment).await.unwrap();

    assert!(!first.already_gone);
    assert!(second.already_gone);
    assert!(fake.deployment_names().is_empty());
    assert_eq!(fake.pod_count(), 0);
}

#[tokio::test]
async fn test_teardown_upstream_failure_propagates() {
    let fake = FakeCluster::start().await;
    fake.with(|c| c.fail_deployment_delete = Some(500));

    let err = orchestrator(&fake).teardown("creature-x-0000").await.unwrap_err();
    assert!(matches!(err, ClusterError::Api { status: 500, .. }));
}

#[tokio::test]
async fn test_sweep_reclaims_only_expired() {
    let fake = FakeCluster::start().await;
    let now = now();
    fake.seed_deployment("creature-old-0001", &[("created-at", (now - 601).to_string())], 1, 1);
    fake.seed_deployment("creature-new-0002", &[("created-at", (now - 10).to_string())], 1, 1);
    fake.seed_deployment("creature-bare-0003", &[], 1, 1);
    fake.seed_deployment(
        "creature-watched-0004",
        &[
            ("created-at", (now - 700).to_string()),
            ("heartbeat-at", (now - 30).to_string()),
        ],
        1,
        1,
    );
    fake.seed_deployment(
        "creature-ancient-0005",
        &[
            ("created-at", (now - 2000).to_string()),
            ("heartbeat-at", (now - 5).to_string()),
        ],
        1,
        1,
    );

    let report = orchestrator(&fake).sweep_at(now).await.unwrap();

    assert_eq!(report.examined, 5);
    assert_eq!(report.reclaimed, vec!["creature-ancient-0005", "creature-old-0001"]);
    assert_eq!(report.unlabeled, vec!["creature-bare-0003"]);
    assert!(report.failed.is_empty());
    assert_eq!(
        fake.deployment_names(),
        vec!["creature-bare-0003", "creature-new-0002", "creature-watched-0004"]
    );
}

#[tokio::test]
async fn test_sweep_reports_failed_deletes() {
    let fake = FakeCluster::start().await;
    fake.seed_deployment("creature-old-0001", &[("created-at", "1".to_string())], 1, 1);
    fake.with(|c| c.fail_deployment_delete = Some(500));

    let report = orchestrator(&fake).sweep().await.unwrap();
    assert_eq!(report.failed, vec!["creature-old-0001"]);
    assert!(report.reclaimed.is_empty());
}

#[tokio::test]
async fn test_status_of_live_deployment() {
    let fake = FakeCluster::start().await;
    let name = "creature-blob-ab12";
    fake.seed_deployment(name, &[("created-at", now().to_string())], 2, 1);
    fake.seed_pod(pod("creature-blob-ab12-0", name, "Running", true));
    fake.seed_pod(pod("creature-blob-ab12-1", name, "Pending", false));
    fake.seed_pods(3);

    let status = orchestrator(&fake).status(name).await.unwrap();

    assert_eq!(status.exists, Some(true));
    assert_eq!(status.replicas, 2);
    assert_eq!(status.ready_replicas, 1);
    assert_eq!(status.pods.len(), 2);
    assert_eq!(status.pods[0].name, "creature-blob-ab12-0");
    assert!(status.pods[0].ready);
    assert_eq!(status.pods[1].phase, "Pending");
    assert!(!status.pods[1].ready);
    assert_eq!(status.pods[1].restarts, 1);
    assert_eq!(status.pods[1].started.as_deref(), Some("2026-10-14T12:00:00Z"));
    assert!(status.error.is_none());
}

#[tokio::test]
async fn test_status_of_missing_deployment() {
    let fake = FakeCluster::start().await;

    let status = orchestrator(&fake).status("creature-gone-0000").await.unwrap();

    assert_eq!(status.exists, Some(false));
    assert!(status.pods.is_empty());
    assert!(status.error.is_none());
}

#[tokio::test]
async fn test_status_fetch_error_is_ambiguous() {
    let fake = FakeCluster::start().await;
    fake.seed_deployment("creature-blob-ab12", &[("created-at", now().to_string())], 1, 1);
    fake.with(|c| c.fail_deployment_get = Some(500));

    let status = orchestrator(&fake).status("creature-blob-ab12").await.unwrap();

    assert_eq!(status.exists, None);
    assert!(status.error.unwrap().contains("500"));
}

#[tokio::test]
async fn test_status_pod_list_failure_is_an_error() {
    let fake = FakeCluster::start().await;
    fake.with(|c| c.fail_pod_list = Some(503));

    let err = orchestrator(&fake).status("creature-blob-ab12").await.unwrap_err();
    assert!(matches!(err, ClusterError::Api { status: 503, .. }));
}

#[tokio::test]
async fn test_status_triggers_background_sweep() {
    let fake = FakeCluster::start().await;
    fake.seed_deployment("creature-old-0001", &[("created-at", "1".to_string())], 1, 1);
    let orchestrator = orchestrator(&fake);

    orchestrator.status("creature-blob-ab12").await.unwrap();

    for _ in 0..50 {
        if fake.deployment("creature-old-0001").is_none() {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    panic!("background sweep never reclaimed the expired deployment");
}

#[tokio::test]
async fn test_metrics_mapping_and_defaults() {
    let fake = FakeCluster::start().await;
    let labels = json!({"creature-deployment": "creature-blob-ab12"});
    fake.with(|c| {
        c.metrics.push(json!({
            "metadata": {"name": "creature-blob-ab12-0", "labels": labels},
            "containers": [{"name": "creature", "usage": {"cpu": "2m", "memory": "3Mi"}}]
        }));
        c.metrics.push(json!({
            "metadata": {"name": "creature-blob-ab12-1", "labels": labels},
            "containers": []
        }));
    });

    let metrics = orchestrator(&fake).metrics("creature-blob-ab12").await.unwrap();

    assert_eq!(metrics.len(), 2);
    assert_eq!(metrics[0].cpu, "2m");
    assert_eq!(metrics[0].memory, "3Mi");
    assert_eq!(metrics[1].cpu, "0m");
    assert_eq!(metrics[1].memory, "0Mi");
    let value = serde_json::to_value(&metrics[0]).unwrap();
    assert_eq!(value["podName"], "creature-blob-ab12-0");
}

#[tokio::test]
async fn test_metrics_failure_is_empty() {
    let fake = FakeCluster::start().await;
    fake.with(|c| c.fail_metrics = Some(503));

    let metrics = orchestrator(&fake).metrics("creature-blob-ab12").await.unwrap();
    assert!(metrics.is_empty());
}

#[tokio::test]
async fn test_metrics_unreachable_is_empty() {
    let orchestrator = Orchestrator::new(vivcluster::ClusterConfig {
        api_url: "http://127.0.0.1:9".to_string(),
        ..Default::default()
    })
    .unwrap();

    let metrics = orchestrator.metrics("creature-blob-ab12").await.unwrap();
    assert!(metrics.is_empty());
}

#[tokio::test]
async fn test_restart_pod_idempotent() {
    let fake = FakeCluster::start().await;
    fake.seed_pod(pod("creature-blob-ab12-0", "creature-blob-ab12", "Running", true));
    let orchestrator = orchestrator(&fake);

    orchestrator.restart_pod("creature-blob-ab12-0").await.unwrap();
    orchestrator.restart_pod("creature-blob-ab12-0").await.unwrap();

    assert_eq!(fake.pod_count(), 0);
    let deletes = fake
        .requests()
        .into_iter()
        .filter(|(method, path)| method == "DELETE" && path.ends_with("/pods/creature-blob-ab12-0"))
        .count();
    assert_eq!(deletes, 2);
}

#[tokio::test]
async fn test_heartbeat_extends_idle_lease() {
    let fake = FakeCluster::start().await;
    let now = now();
    let name = "creature-watched-0004";
    fake.seed_deployment(name, &[("created-at", (now - 590).to_string())], 1, 1);
    let orchestrator = orchestrator(&fake);

    let outcome = orchestrator.heartbeat(name).await.unwrap();
    assert_eq!(outcome.deployment, name);
    assert_eq!(outcome.ttl, 600);
    assert!(!outcome.expires_at.is_empty());

    let beat: i64 = fake.deployment(name).unwrap()["metadata"]["labels"]["heartbeat-at"]
        .as_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!((now - beat).abs() <= 5);

    // without the heartbeat this would have expired
    let report = orchestrator.sweep_at(now + 60).await.unwrap();
    assert!(report.reclaimed.is_empty());
    assert!(fake.deployment(name).is_some());
}

#[tokio::test]
async fn test_heartbeat_missing_deployment() {
    let fake = FakeCluster::start().await;

    let err = orchestrator(&fake).heartbeat("creature-gone-0000").await.unwrap_err();
    assert!(err.is_not_found());
}
