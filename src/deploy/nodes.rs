//! Node labeling by CPU architecture.

use std::collections::BTreeMap;

use anyhow::{Context, Result, bail};
use k8s_openapi::api::core::v1::Node;
use kube::api::{ListParams, Patch, PatchParams};
use kube::{Api, Client, ResourceExt};
use serde_json::{Value, json};

/// Well-known node label carrying the CPU architecture.
pub const ARCH_LABEL: &str = "kubernetes.io/arch";

/// Merge patch adding `labels` to a node.
#[must_use]
pub fn label_patch(labels: &BTreeMap<String, String>) -> Value {
    json!({ "metadata": { "labels": labels } })
}

/// Merge patch removing `keys` from a node; `null` deletes a key.
#[must_use]
pub fn unlabel_patch(keys: &[&str]) -> Value {
    let labels: serde_json::Map<String, Value> = keys
        .iter()
        .map(|key| ((*key).to_string(), Value::Null))
        .collect();
    json!({ "metadata": { "labels": labels } })
}

/// Label selector for nodes of one architecture.
#[must_use]
pub fn arch_selector(arch: &str) -> String {
    format!("{ARCH_LABEL}={arch}")
}

async fn nodes_with_arch(api: &Api<Node>, arch: &str) -> Result<Vec<Node>> {
    let list = api
        .list(&ListParams::default().labels(&arch_selector(arch)))
        .await
        .with_context(|| format!("failed to list {arch} nodes"))?;
    Ok(list.items)
}

/// Merges `labels` onto every node of `arch`. Returns the labeled node names.
///
/// # Errors
///
/// Returns an error if no node has that architecture or a patch fails.
pub async fn label_nodes(
    client: Client,
    arch: &str,
    labels: &BTreeMap<String, String>,
    field_manager: &str,
) -> Result<Vec<String>> {
    let api: Api<Node> = Api::all(client);
    let nodes = nodes_with_arch(&api, arch).await?;
    if nodes.is_empty() {
        bail!("no nodes with {}", arch_selector(arch));
    }

    let params = PatchParams::apply(field_manager);
    let patch = label_patch(labels);
    let mut names = Vec::with_capacity(nodes.len());
    for node in nodes {
        let name = node.name_any();
        api.patch(&name, &params, &Patch::Merge(&patch))
            .await
            .with_context(|| format!("failed to label node {name}"))?;
        tracing::info!(node = %name, arch, "node labeled");
        names.push(name);
    }
    Ok(names)
}

/// Removes label `keys` from every node of `arch`. Missing nodes are not an
/// error.
///
/// # Errors
///
/// Returns an error if listing or patching fails.
pub async fn unlabel_nodes(client: Client, arch: &str, keys: &[&str]) -> Result<()> {
    let api: Api<Node> = Api::all(client);
    let patch = unlabel_patch(keys);
    for node in nodes_with_arch(&api, arch).await? {
        let name = node.name_any();
        api.patch(&name, &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .with_context(|| format!("failed to unlabel node {name}"))?;
        tracing::info!(node = %name, arch, "node labels removed");
    }
    Ok(())
}

/// Architecture label of a node, if set.
#[must_use]
pub fn node_arch(node: &Node) -> Option<&str> {
    node.labels().get(ARCH_LABEL).map(String::as_str)
}
