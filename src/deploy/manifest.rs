//! Multi-document YAML manifests with `${VAR}` substitution.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use kube::ResourceExt;
use kube::core::DynamicObject;
use serde::Deserialize;

use super::plan::{Plan, Step};

/// Objects parsed from one manifest file.
#[derive(Debug, Clone)]
pub struct ManifestFile {
    /// Resolved file path.
    pub path: PathBuf,
    /// Objects in document order.
    pub objects: Vec<DynamicObject>,
}

/// Replaces every `${NAME}` in `text` with its value from `vars`.
///
/// `NAME` consists of ASCII uppercase letters, digits and underscores.
/// A `$` not followed by `{` is kept as-is.
///
/// # Errors
///
/// Returns an error for an unterminated or invalid reference, or for a
/// variable missing from `vars`.
pub fn substitute(text: &str, vars: &BTreeMap<String, String>) -> Result<String> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find("${") {
        let (before, tail) = rest.split_at(start);
        out.push_str(before);

        let body = tail.get(2..).unwrap_or_default();
        let Some(end) = body.find('}') else {
            bail!("unterminated variable reference: {}", truncate(tail, 40));
        };
        let name = body.get(..end).unwrap_or_default();
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
        {
            bail!("invalid variable name: ${{{name}}}");
        }
        let Some(value) = vars.get(name) else {
            bail!("undefined variable: ${{{name}}}");
        };
        out.push_str(value);
        rest = body.get(end + 1..).unwrap_or_default();
    }

    out.push_str(rest);
    Ok(out)
}

fn truncate(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Parses every non-empty document of a YAML stream into a [`DynamicObject`].
///
/// # Errors
///
/// Returns an error on malformed YAML or a document without `apiVersion`,
/// `kind` or `metadata.name`.
pub fn parse_manifests(text: &str) -> Result<Vec<DynamicObject>> {
    let mut objects = Vec::new();
    for (index, document) in serde_yaml::Deserializer::from_str(text).enumerate() {
        let number = index + 1;
        let value = serde_yaml::Value::deserialize(document)
            .with_context(|| format!("document {number}: invalid YAML"))?;
        if value.is_null() {
            continue;
        }
        let object: DynamicObject = serde_yaml::from_value(value)
            .with_context(|| format!("document {number}: not a Kubernetes object"))?;
        if object.types.is_none() {
            bail!("document {number}: missing apiVersion/kind");
        }
        if object.metadata.name.is_none() {
            bail!("document {number}: missing metadata.name");
        }
        objects.push(object);
    }
    Ok(objects)
}

/// `Kind/name` label for logs.
#[must_use]
pub fn describe(object: &DynamicObject) -> String {
    let kind = object.types.as_ref().map_or("<unknown>", |t| t.kind.as_str());
    format!("{kind}/{}", object.name_any())
}

/// Reads, substitutes and parses one manifest file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or fails to render.
pub fn load_file(path: &Path, vars: &BTreeMap<String, String>) -> Result<ManifestFile> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read manifest {}", path.display()))?;
    let rendered =
        substitute(&text, vars).with_context(|| format!("rendering {}", path.display()))?;
    let objects =
        parse_manifests(&rendered).with_context(|| format!("parsing {}", path.display()))?;
    Ok(ManifestFile {
        path: path.to_path_buf(),
        objects,
    })
}

/// Renders every manifest referenced by the plan's `apply` steps without
/// contacting a cluster.
///
/// # Errors
///
/// Returns the first file that fails to load.
pub fn render_plan(plan: &Plan) -> Result<Vec<ManifestFile>> {
    let vars = plan.variables();
    plan.steps
        .iter()
        .filter_map(|step| match step {
            Step::Apply { path } => Some(plan.resolve(path)),
            _ => None,
        })
        .map(|path| load_file(&path, &vars))
        .collect()
}
