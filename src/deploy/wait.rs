//! Fixed-interval readiness polling and the readiness rules of each wait step.

use std::future::Future;
use std::time::Duration;

use anyhow::{Result, bail};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Pod;
use kube::ResourceExt;
use kube::core::DynamicObject;
use tokio::time::Instant;

/// Annotation OpenShift puts on every Build with its sequence number.
pub const BUILD_NUMBER_ANNOTATION: &str = "openshift.io/build.number";

/// Result of one readiness probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    /// The condition holds.
    Ready,
    /// Not yet; the text says what is missing.
    Pending(String),
    /// The condition can no longer become true.
    Failed(String),
}

/// How a wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The probe reported [`Readiness::Ready`].
    Ready,
    /// The timeout elapsed first.
    TimedOut,
}

/// Runs `probe` every `interval` until it reports ready or `timeout` elapses.
///
/// Probe errors are treated as transient: they are logged and polling
/// continues.
///
/// # Errors
///
/// Returns an error as soon as the probe reports [`Readiness::Failed`].
pub async fn poll_until<F, Fut>(
    what: &str,
    interval: Duration,
    timeout: Duration,
    mut probe: F,
) -> Result<WaitOutcome>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Readiness>>,
{
    // A timeout too large to represent never expires.
    let deadline = Instant::now().checked_add(timeout);
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;
        match probe().await {
            Ok(Readiness::Ready) => {
                tracing::info!(what, attempt, "ready");
                return Ok(WaitOutcome::Ready);
            }
            Ok(Readiness::Pending(reason)) => {
                tracing::info!(what, attempt, %reason, "waiting");
            }
            Ok(Readiness::Failed(reason)) => {
                bail!("{what} failed: {reason}");
            }
            Err(err) => {
                tracing::warn!(what, attempt, error = %format!("{err:#}"), "poll failed; retrying");
            }
        }

        let pause = match deadline {
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    return Ok(WaitOutcome::TimedOut);
                }
                interval.min(deadline - now)
            }
            None => interval,
        };
        tokio::time::sleep(pause).await;
    }
}

/// Readiness of an OLM operator install: some ClusterServiceVersion whose
/// name starts with `prefix` is in phase `Succeeded`.
///
/// During an upgrade the old and new CSVs coexist, so the install only
/// counts as failed once every matching CSV is `Failed`.
#[must_use]
pub fn csv_readiness(csvs: &[DynamicObject], prefix: &str) -> Readiness {
    let matching: Vec<&DynamicObject> = csvs
        .iter()
        .filter(|csv| csv.name_any().starts_with(prefix))
        .collect();
    if matching.is_empty() {
        return Readiness::Pending(format!("no ClusterServiceVersion named {prefix}*"));
    }
    if matching
        .iter()
        .any(|csv| status_field(csv, "phase") == Some("Succeeded"))
    {
        return Readiness::Ready;
    }
    if matching
        .iter()
        .all(|csv| status_field(csv, "phase") == Some("Failed"))
    {
        let reasons: Vec<String> = matching
            .iter()
            .map(|csv| {
                format!(
                    "{} is Failed: {}",
                    csv.name_any(),
                    status_field(csv, "message").unwrap_or("no message")
                )
            })
            .collect();
        return Readiness::Failed(reasons.join("; "));
    }
    let phases: Vec<String> = matching
        .iter()
        .map(|csv| {
            format!(
                "{} phase {}",
                csv.name_any(),
                status_field(csv, "phase").unwrap_or("unknown")
            )
        })
        .collect();
    Readiness::Pending(phases.join(", "))
}

/// Whether the pod's `Ready` condition is `True`.
#[must_use]
pub fn pod_is_ready(pod: &Pod) -> bool {
    pod.status
        .as_ref()
        .and_then(|status| status.conditions.as_ref())
        .is_some_and(|conditions| {
            conditions
                .iter()
                .any(|c| c.type_ == "Ready" && c.status == "True")
        })
}

/// At least `min_ready` pods exist and every one of them is Ready.
#[must_use]
pub fn pods_readiness(pods: &[Pod], min_ready: usize) -> Readiness {
    let total = pods.len();
    if total < min_ready {
        return Readiness::Pending(format!("{total}/{min_ready} pods scheduled"));
    }
    let ready = pods.iter().filter(|pod| pod_is_ready(pod)).count();
    if ready == total {
        Readiness::Ready
    } else {
        Readiness::Pending(format!("{ready}/{total} pods ready"))
    }
}

/// Ready replicas have caught up with the desired replica count.
#[must_use]
pub fn deployment_readiness(deployment: Option<&Deployment>) -> Readiness {
    let Some(deployment) = deployment else {
        return Readiness::Pending("deployment not found".to_string());
    };
    let desired = deployment
        .spec
        .as_ref()
        .and_then(|spec| spec.replicas)
        .unwrap_or(1);
    let ready = deployment
        .status
        .as_ref()
        .and_then(|status| status.ready_replicas)
        .unwrap_or(0);
    if ready >= desired {
        Readiness::Ready
    } else {
        Readiness::Pending(format!("{ready}/{desired} replicas ready"))
    }
}

/// State of the newest Build (highest build number) of a BuildConfig.
#[must_use]
pub fn build_readiness(builds: &[DynamicObject]) -> Readiness {
    let Some(build) = builds.iter().max_by_key(|build| build_number(build)) else {
        return Readiness::Pending("no builds yet".to_string());
    };
    let name = build.name_any();
    match status_field(build, "phase") {
        Some("Complete") => Readiness::Ready,
        Some(phase @ ("Failed" | "Error" | "Cancelled")) => {
            Readiness::Failed(format!("build {name} is {phase}"))
        }
        phase => Readiness::Pending(format!("build {name} {}", phase.unwrap_or("New"))),
    }
}

fn build_number(build: &DynamicObject) -> u64 {
    build
        .annotations()
        .get(BUILD_NUMBER_ANNOTATION)
        .and_then(|n| n.parse().ok())
        .unwrap_or(0)
}

fn status_field<'a>(object: &'a DynamicObject, field: &str) -> Option<&'a str> {
    object.data.get("status")?.get(field)?.as_str()
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use anyhow::anyhow;
    use k8s_openapi::api::apps::v1::{DeploymentSpec, DeploymentStatus};
    use k8s_openapi::api::core::v1::{PodCondition, PodStatus};
    use serde_json::json;

    use super::*;

    fn object(value: serde_json::Value) -> DynamicObject {
        match serde_json::from_value(value) {
            Ok(object) => object,
            Err(err) => panic!("invalid test object: {err}"),
        }
    }

    fn csv(name: &str, phase: &str) -> DynamicObject {
        object(json!({
            "apiVersion": "operators.coreos.com/v1alpha1",
            "kind": "ClusterServiceVersion",
            "metadata": { "name": name },
            "status": { "phase": phase, "message": "install strategy failed" }
        }))
    }

    fn build(number: &str, phase: &str) -> DynamicObject {
        object(json!({
            "apiVersion": "build.openshift.io/v1",
            "kind": "Build",
            "metadata": {
                "name": format!("hetero-app-{number}"),
                "annotations": { BUILD_NUMBER_ANNOTATION: number }
            },
            "status": { "phase": phase }
        }))
    }

    fn pod(ready: bool) -> Pod {
        Pod {
            status: Some(PodStatus {
                conditions: Some(vec![PodCondition {
                    type_: "Ready".into(),
                    status: if ready { "True" } else { "False" }.into(),
                    ..Default::default()
                }]),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn deployment(replicas: Option<i32>, ready: Option<i32>) -> Deployment {
        Deployment {
            spec: Some(DeploymentSpec {
                replicas,
                ..Default::default()
            }),
            status: Some(DeploymentStatus {
                ready_replicas: ready,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn csv_matches_by_prefix() {
        let csvs = [
            csv("other-operator.v1", "Succeeded"),
            csv("postgresoperator.v5.6.0", "Installing"),
        ];
        assert!(matches!(csv_readiness(&csvs, "postgresoperator"), Readiness::Pending(_)));
        assert_eq!(csv_readiness(&csvs, "other"), Readiness::Ready);
        assert!(matches!(csv_readiness(&[], "postgresoperator"), Readiness::Pending(_)));
    }

    #[test]
    fn failed_csv_is_terminal() {
        let csvs = [csv("postgresoperator.v5.6.0", "Failed")];
        let Readiness::Failed(reason) = csv_readiness(&csvs, "postgresoperator") else {
            panic!("expected failure");
        };
        assert!(reason.contains("install strategy failed"));
    }

    #[test]
    fn upgraded_csv_wins_over_replaced_one() {
        let csvs = [
            csv("postgresoperator.v5.5.0", "Replacing"),
            csv("postgresoperator.v5.6.0", "Succeeded"),
        ];
        assert_eq!(csv_readiness(&csvs, "postgresoperator"), Readiness::Ready);

        let csvs = [
            csv("postgresoperator.v5.5.0", "Failed"),
            csv("postgresoperator.v5.6.0", "Succeeded"),
        ];
        assert_eq!(csv_readiness(&csvs, "postgresoperator"), Readiness::Ready);

        let csvs = [
            csv("postgresoperator.v5.5.0", "Failed"),
            csv("postgresoperator.v5.6.0", "Installing"),
        ];
        assert!(matches!(csv_readiness(&csvs, "postgresoperator"), Readiness::Pending(_)));

        let csvs = [
            csv("postgresoperator.v5.5.0", "Failed"),
            csv("postgresoperator.v5.6.0", "Failed"),
        ];
        assert!(matches!(csv_readiness(&csvs, "postgresoperator"), Readiness::Failed(_)));
    }

    #[test]
    fn pods_need_minimum_count_and_all_ready() {
        assert!(matches!(pods_readiness(&[], 1), Readiness::Pending(_)));
        assert_eq!(pods_readiness(&[pod(true)], 1), Readiness::Ready);
        assert_eq!(
            pods_readiness(&[pod(true), pod(false)], 1),
            Readiness::Pending("1/2 pods ready".into())
        );
        assert!(matches!(pods_readiness(&[pod(true)], 2), Readiness::Pending(_)));
        assert!(!pod_is_ready(&Pod::default()));
    }

    #[test]
    fn deployment_compares_ready_to_desired() {
        assert!(matches!(deployment_readiness(None), Readiness::Pending(_)));
        let d = deployment(Some(2), Some(1));
        assert_eq!(
            deployment_readiness(Some(&d)),
            Readiness::Pending("1/2 replicas ready".into())
        );
        let d = deployment(Some(2), Some(2));
        assert_eq!(deployment_readiness(Some(&d)), Readiness::Ready);
        let d = deployment(None, None);
        assert!(matches!(deployment_readiness(Some(&d)), Readiness::Pending(_)));
    }

    #[test]
    fn newest_build_decides() {
        let builds = [build("1", "Failed"), build("10", "Complete"), build("2", "Running")];
        assert_eq!(build_readiness(&builds), Readiness::Ready);

        let builds = [build("1", "Complete"), build("2", "Cancelled")];
        assert!(matches!(build_readiness(&builds), Readiness::Failed(_)));

        assert!(matches!(build_readiness(&[]), Readiness::Pending(_)));
    }

    #[tokio::test]
    async fn poll_returns_ready_after_pending() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let outcome = poll_until("thing", Duration::from_millis(5), Duration::from_secs(5), || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                match n {
                    0 => Err(anyhow!("connection reset")),
                    1 => Ok(Readiness::Pending("starting".into())),
                    _ => Ok(Readiness::Ready),
                }
            }
        })
        .await;
        assert_eq!(outcome.ok(), Some(WaitOutcome::Ready));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn poll_times_out() {
        let outcome = poll_until("thing", Duration::from_millis(5), Duration::from_millis(30), || async {
            Ok::<_, anyhow::Error>(Readiness::Pending("never".into()))
        })
        .await;
        assert_eq!(outcome.ok(), Some(WaitOutcome::TimedOut));
    }

    #[tokio::test]
    async fn poll_accepts_unrepresentable_timeout() {
        let outcome = poll_until("thing", Duration::from_millis(5), Duration::MAX, || async {
            Ok::<_, anyhow::Error>(Readiness::Ready)
        })
        .await;
        assert_eq!(outcome.ok(), Some(WaitOutcome::Ready));
    }

    #[tokio::test]
    async fn poll_stops_on_failure() {
        let outcome = poll_until("build", Duration::from_millis(5), Duration::from_secs(5), || async {
            Ok::<_, anyhow::Error>(Readiness::Failed("build hetero-app-1 is Error".into()))
        })
        .await;
        assert!(outcome.is_err());
    }
}
