//! Server-side apply of arbitrary manifest objects.

use anyhow::{Context, Result, bail};
use kube::api::{Patch, PatchParams};
use kube::core::{DynamicObject, TypeMeta};
use kube::discovery::{self, ApiCapabilities, ApiResource, Scope};
use kube::{Api, Client, ResourceExt};

use super::manifest::describe;

/// Splits `apiVersion` into group and version; the core group is `""`.
#[must_use]
pub fn split_api_version(api_version: &str) -> (&str, &str) {
    match api_version.split_once('/') {
        Some((group, version)) => (group, version),
        None => ("", api_version),
    }
}

/// Namespace an object is applied into: its own, or `default_ns` when it is
/// namespaced and names none. Cluster-scoped objects get `None`.
#[must_use]
pub fn target_namespace<'a>(
    object: &'a DynamicObject,
    scope: &Scope,
    default_ns: &'a str,
) -> Option<&'a str> {
    match scope {
        Scope::Cluster => None,
        Scope::Namespaced => Some(object.metadata.namespace.as_deref().unwrap_or(default_ns)),
    }
}

/// Resolves a kind through API discovery. Runs per object so that CRDs
/// created by earlier steps are found.
async fn resolve(client: &Client, types: &TypeMeta) -> Result<(ApiResource, ApiCapabilities)> {
    let (group, version) = split_api_version(&types.api_version);
    let api_group = discovery::group(client, group)
        .await
        .with_context(|| format!("API group {:?} not served", types.api_version))?;
    match api_group
        .versioned_resources(version)
        .into_iter()
        .find(|(ar, _)| ar.kind == types.kind)
    {
        Some(found) => Ok(found),
        None => bail!("kind {} not found in {}", types.kind, types.api_version),
    }
}

/// Force-applies one object and returns a `Kind/name` label for it.
///
/// # Errors
///
/// Returns an error if the kind is unknown to the cluster or the API server
/// rejects the object.
pub async fn apply_object(
    client: &Client,
    object: &DynamicObject,
    default_ns: &str,
    field_manager: &str,
) -> Result<String> {
    let label = describe(object);
    let Some(types) = object.types.as_ref() else {
        bail!("{label}: missing apiVersion/kind");
    };
    let (resource, caps) = resolve(client, types).await?;

    let api: Api<DynamicObject> = match target_namespace(object, &caps.scope, default_ns) {
        Some(namespace) => Api::namespaced_with(client.clone(), namespace, &resource),
        None => Api::all_with(client.clone(), &resource),
    };

    let params = PatchParams::apply(field_manager).force();
    api.patch(&object.name_any(), &params, &Patch::Apply(object))
        .await
        .with_context(|| format!("failed to apply {label}"))?;
    tracing::info!(object = %label, "applied");
    Ok(label)
}
