//! Executes a [`Plan`] against a cluster.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;

use anyhow::{Context, Result, bail};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Namespace, Node, Pod};
use kube::api::{DeleteParams, ListParams};
use kube::core::{DynamicObject, GroupVersionKind};
use kube::discovery::ApiResource;
use kube::{Api, Client, ResourceExt};
use tracing::Instrument;

use super::apply::apply_object;
use super::manifest::{describe, load_file, render_plan};
use super::nodes::{label_nodes, node_arch, unlabel_nodes};
use super::plan::{OnTimeout, Plan, Step};
use super::wait::{
    Readiness, WaitOutcome, build_readiness, csv_readiness, deployment_readiness, pod_is_ready,
    pods_readiness, poll_until,
};

/// Label OpenShift puts on every Build of a BuildConfig.
const BUILD_CONFIG_LABEL: &str = "openshift.io/build-config.name";

/// Where one pod landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodPlacement {
    /// Pod name.
    pub pod: String,
    /// Node the pod is scheduled on.
    pub node: String,
    /// The node's `kubernetes.io/arch` label.
    pub arch: String,
    /// Pod phase.
    pub phase: String,
    /// Whether the pod is Ready.
    pub ready: bool,
    /// Pod IP, once assigned.
    pub pod_ip: String,
}

/// Renders every object the plan would apply, as `path: Kind/name` lines.
///
/// # Errors
///
/// Returns an error if any manifest fails to load.
pub fn dry_run(plan: &Plan) -> Result<Vec<String>> {
    Ok(render_plan(plan)?
        .iter()
        .flat_map(|file| {
            file.objects
                .iter()
                .map(move |object| format!("{}: {}", file.path.display(), describe(object)))
        })
        .collect())
}

/// Runs plan steps against a cluster.
#[derive(Clone)]
pub struct Deployer {
    client: Client,
    plan: Plan,
}

impl fmt::Debug for Deployer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deployer")
            .field("plan", &self.plan)
            .finish_non_exhaustive()
    }
}

impl Deployer {
    /// Creates a new `Deployer`.
    #[must_use]
    pub fn new(client: Client, plan: Plan) -> Self {
        Self { client, plan }
    }

    /// Executes every step in order, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the failing step's error, including wait steps that time out
    /// with `on_timeout: fail`.
    pub async fn up(&self) -> Result<()> {
        let total = self.plan.steps.len();
        for (index, step) in self.plan.steps.iter().enumerate() {
            let number = index + 1;
            let span = tracing::info_span!("step", number, total, action = step.action());
            self.run_step(step)
                .instrument(span)
                .await
                .with_context(|| format!("step {number}/{total} ({}) failed", step.action()))?;
        }
        tracing::info!(namespace = %self.plan.namespace, steps = total, "deployment complete");
        Ok(())
    }

    async fn run_step(&self, step: &Step) -> Result<()> {
        let namespace = self.plan.namespace.as_str();

        match step {
            Step::LabelNodes { arch, labels } => {
                let nodes =
                    label_nodes(self.client.clone(), arch, labels, &self.plan.field_manager)
                        .await?;
                tracing::info!(arch = %arch, count = nodes.len(), "nodes labeled");
                Ok(())
            }
            Step::Apply { path } => {
                let file = load_file(&self.plan.resolve(path), &self.plan.variables())?;
                for object in &file.objects {
                    apply_object(&self.client, object, namespace, &self.plan.field_manager)
                        .await?;
                }
                Ok(())
            }
            Step::WaitForCsv { prefix, .. } => {
                let api = dynamic_api(
                    &self.client,
                    namespace,
                    "operators.coreos.com",
                    "v1alpha1",
                    "ClusterServiceVersion",
                );
                let api = &api;
                self.wait(step, &format!("operator {prefix}"), move || async move {
                    let list = api.list(&ListParams::default()).await?;
                    Ok::<_, anyhow::Error>(csv_readiness(&list.items, prefix))
                })
                .await
            }
            Step::WaitForPods {
                selector,
                min_ready,
                ..
            } => {
                let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
                let api = &api;
                let params = ListParams::default().labels(selector);
                let params = &params;
                let min_ready = *min_ready;
                self.wait(step, &format!("pods {selector}"), move || async move {
                    let list = api.list(params).await?;
                    Ok::<_, anyhow::Error>(pods_readiness(&list.items, min_ready))
                })
                .await
            }
            Step::WaitForBuild { build_config, .. } => {
                let api = dynamic_api(
                    &self.client,
                    namespace,
                    "build.openshift.io",
                    "v1",
                    "Build",
                );
                let api = &api;
                let params =
                    ListParams::default().labels(&format!("{BUILD_CONFIG_LABEL}={build_config}"));
                let params = &params;
                self.wait(step, &format!("build {build_config}"), move || async move {
                    let list = api.list(params).await?;
                    Ok::<_, anyhow::Error>(build_readiness(&list.items))
                })
                .await
            }
            Step::WaitForDeployment { name, .. } => {
                let api: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
                let api = &api;
                self.wait(step, &format!("deployment {name}"), move || async move {
                    let deployment = api.get_opt(name).await?;
                    Ok::<_, anyhow::Error>(deployment_readiness(deployment.as_ref()))
                })
                .await
            }
        }
    }

    /// Polls `probe` under the step's timeout policy.
    async fn wait<F, Fut>(&self, step: &Step, what: &str, probe: F) -> Result<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Readiness>>,
    {
        let Some((timeout, on_timeout)) = step.wait_policy() else {
            bail!("{} is not a wait step", step.action());
        };
        let outcome = poll_until(what, self.plan.poll_interval(), timeout, probe).await?;
        if outcome == WaitOutcome::TimedOut {
            match on_timeout {
                OnTimeout::Fail => {
                    bail!("timed out after {}s waiting for {what}", timeout.as_secs());
                }
                OnTimeout::Warn => tracing::warn!(
                    what,
                    timeout_secs = timeout.as_secs(),
                    "timed out; continuing"
                ),
            }
        }
        Ok(())
    }

    /// Lists pods in the plan namespace with the architecture of their node.
    ///
    /// # Errors
    ///
    /// Returns an error if pods or nodes cannot be listed.
    pub async fn status(&self) -> Result<Vec<PodPlacement>> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), &self.plan.namespace);
        let nodes: Api<Node> = Api::all(self.client.clone());

        let arch_by_node: BTreeMap<String, String> = nodes
            .list(&ListParams::default())
            .await
            .context("failed to list nodes")?
            .items
            .iter()
            .map(|node| {
                (
                    node.name_any(),
                    node_arch(node).unwrap_or("unknown").to_string(),
                )
            })
            .collect();

        let list = pods
            .list(&ListParams::default())
            .await
            .with_context(|| format!("failed to list pods in {}", self.plan.namespace))?;

        Ok(list
            .items
            .iter()
            .map(|pod| placement(pod, &arch_by_node))
            .collect())
    }

    /// Deletes the plan namespace and removes the labels added by
    /// `label_nodes` steps.
    ///
    /// # Errors
    ///
    /// Returns an error if the namespace delete or a node patch fails.
    pub async fn down(&self) -> Result<()> {
        let namespaces: Api<Namespace> = Api::all(self.client.clone());
        let namespace = self.plan.namespace.as_str();
        match namespaces.delete(namespace, &DeleteParams::default()).await {
            Ok(_) => tracing::info!(namespace, "namespace deletion requested"),
            Err(kube::Error::Api(response)) if response.code == 404 => {
                tracing::info!(namespace, "namespace already gone");
            }
            Err(err) => {
                return Err(err).with_context(|| format!("failed to delete namespace {namespace}"));
            }
        }

        for (arch, keys) in self.plan.node_labels() {
            unlabel_nodes(self.client.clone(), arch, &keys).await?;
        }
        Ok(())
    }
}

fn dynamic_api(
    client: &Client,
    namespace: &str,
    group: &str,
    version: &str,
    kind: &str,
) -> Api<DynamicObject> {
    let resource = ApiResource::from_gvk(&GroupVersionKind::gvk(group, version, kind));
    Api::namespaced_with(client.clone(), namespace, &resource)
}

fn placement(pod: &Pod, arch_by_node: &BTreeMap<String, String>) -> PodPlacement {
    let node = pod
        .spec
        .as_ref()
        .and_then(|spec| spec.node_name.clone())
        .unwrap_or_default();
    let arch = arch_by_node
        .get(&node)
        .cloned()
        .unwrap_or_else(|| "unknown".to_string());
    let status = pod.status.as_ref();
    PodPlacement {
        pod: pod.name_any(),
        node,
        arch,
        phase: status
            .and_then(|s| s.phase.clone())
            .unwrap_or_else(|| "Unknown".to_string()),
        ready: pod_is_ready(pod),
        pod_ip: status.and_then(|s| s.pod_ip.clone()).unwrap_or_default(),
    }
}
