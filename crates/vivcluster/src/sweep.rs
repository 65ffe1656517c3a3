//! TTL garbage collection of creature deployments
//!
//! A deployment expires once it has been idle for longer than the TTL,
//! idleness counted from the later of its `created-at` and `heartbeat-at`
//! labels, or once its `created-at` age exceeds the hard lifetime. A
//! deployment without a parsable `created-at` is never deleted.

use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::error::ClusterResult;
use crate::manifest::{ownership_selector, CREATED_AT_LABEL, HEARTBEAT_AT_LABEL};
use crate::orchestrator::{now_secs, Orchestrator};

/// How the sweep sees one deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaseState {
    /// No parsable creation label
    Unlabeled,
    /// Within its TTL
    Live,
    /// Eligible for deletion
    Expired,
}

/// Classify a deployment from its labels at `now` (unix seconds)
pub fn lease_state(
    labels: &BTreeMap<String, String>,
    now: i64,
    ttl_secs: u64,
    max_lifetime_secs: u64,
) -> LeaseState {
    let stamp = |key: &str| labels.get(key).and_then(|v| v.trim().parse::<i64>().ok());

    let Some(created) = stamp(CREATED_AT_LABEL) else {
        return LeaseState::Unlabeled;
    };
    let last_seen = stamp(HEARTBEAT_AT_LABEL).map_or(created, |beat| beat.max(created));

    let idle = now.saturating_sub(last_seen);
    let age = now.saturating_sub(created);
    if idle > ttl_secs as i64 || age > max_lifetime_secs as i64 {
        LeaseState::Expired
    } else {
        LeaseState::Live
    }
}

/// Outcome of one sweep
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Owned deployments looked at
    pub examined: usize,
    /// Deleted, or already gone when the delete landed
    pub reclaimed: Vec<String>,
    /// Skipped for lack of a creation label
    pub unlabeled: Vec<String>,
    /// Expired but the delete failed
    pub failed: Vec<String>,
}

impl Orchestrator {
    /// Sweep expired deployments now
    pub async fn sweep(&self) -> ClusterResult<SweepReport> {
        self.sweep_at(now_secs()).await
    }

    /// Sweep as if the current time were `now` (unix seconds)
    pub async fn sweep_at(&self, now: i64) -> ClusterResult<SweepReport> {
        let deployments = self.client.list_deployments(&ownership_selector()).await?;
        let mut report = SweepReport {
            examined: deployments.len(),
            ..Default::default()
        };

        for deployment in &deployments {
            let Some(name) = deployment.metadata.name.as_deref() else {
                continue;
            };

            match lease_state(
                &deployment.metadata.labels,
                now,
                self.config.ttl_secs,
                self.config.max_lifetime_secs,
            ) {
                LeaseState::Live => {}
                LeaseState::Unlabeled => {
                    warn!("Sweep: {} has no {} label, leaving it", name, CREATED_AT_LABEL);
                    report.unlabeled.push(name.to_string());
                }
                LeaseState::Expired => match self.client.delete_deployment(name).await {
                    Ok(()) => {
                        info!("Sweep: reclaimed {}", name);
                        report.reclaimed.push(name.to_string());
                    }
                    Err(e) if e.is_not_found() => report.reclaimed.push(name.to_string()),
                    Err(e) => {
                        warn!("Sweep: failed to delete {}: {}", name, e);
                        report.failed.push(name.to_string());
                    }
                },
            }
        }

        debug!(
            "Sweep examined {}, reclaimed {}",
            report.examined,
            report.reclaimed.len()
        );
        Ok(report)
    }

    /// Run one sweep in the background; its failure is only logged
    pub fn spawn_sweep(&self) -> JoinHandle<()> {
        let orchestrator = self.clone();
        tokio::spawn(async move {
            if let Err(e) = orchestrator.sweep().await {
                warn!("Background sweep failed: {}", e);
            }
        })
    }

    /// Sweep every `sweep_interval_secs` until the handle is aborted
    pub fn spawn_sweeper(&self) -> JoinHandle<()> {
        let orchestrator = self.clone();
        let period = Duration::from_secs(self.config.sweep_interval_secs.max(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!("Periodic sweep every {}s", period.as_secs());
            loop {
                ticker.tick().await;
                match orchestrator.sweep().await {
                    Ok(report) if !report.reclaimed.is_empty() => {
                        info!("Periodic sweep reclaimed {} deployment(s)", report.reclaimed.len())
                    }
                    Ok(_) => {}
                    Err(e) => warn!("Periodic sweep failed: {}", e),
                }
            }
        })
    }
}
