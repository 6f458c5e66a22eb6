//! Deployment plan: an ordered list of steps loaded from YAML.
//!
//! ```yaml
//! namespace: hetero-demo
//! vars:
//!   GIT_URI: https://git.example.com/hetero-inventory.git
//! steps:
//!   - action: label_nodes
//!     arch: ppc64le
//!     labels: { hetero-demo/role: app }
//!   - action: apply
//!     path: manifests/00-namespace.yaml
//!   - action: wait_for_deployment
//!     name: hetero-app
//!     timeout_secs: 300
//!     on_timeout: warn
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail, ensure};
use serde::Deserialize;

/// Variable always defined for manifest substitution.
pub const NAMESPACE_VAR: &str = "NAMESPACE";

/// A complete deployment plan.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Plan {
    /// Namespace for namespaced objects that do not name one.
    pub namespace: String,

    /// Server-side apply field manager.
    #[serde(default = "default_field_manager")]
    pub field_manager: String,

    /// Fixed delay between readiness polls.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// `${VAR}` substitutions applied to every manifest.
    #[serde(default)]
    pub vars: BTreeMap<String, String>,

    /// Steps executed in order.
    pub steps: Vec<Step>,

    /// Directory manifest paths are resolved against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

/// What to do when a wait step runs out of time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnTimeout {
    /// Abort the deployment with a nonzero exit.
    #[default]
    Fail,
    /// Log a warning and continue with the next step.
    Warn,
}

/// One deployment step, tagged by `action`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case", deny_unknown_fields)]
pub enum Step {
    /// Merge `labels` onto every node whose `kubernetes.io/arch` is `arch`.
    LabelNodes {
        /// Architecture label value (`amd64`, `ppc64le`, ...).
        arch: String,
        /// Labels to add.
        labels: BTreeMap<String, String>,
    },
    /// Server-side apply every document of a YAML file.
    Apply {
        /// File path, relative to the plan file.
        path: PathBuf,
    },
    /// Wait for an OLM operator install to succeed.
    WaitForCsv {
        /// ClusterServiceVersion name prefix (e.g. `postgresoperator`).
        prefix: String,
        /// Hard timeout.
        timeout_secs: u64,
        /// Behavior on timeout.
        #[serde(default)]
        on_timeout: OnTimeout,
    },
    /// Wait for pods matching a label selector to be Ready.
    WaitForPods {
        /// Kubernetes label selector.
        selector: String,
        /// Minimum number of matching pods.
        #[serde(default = "default_min_ready")]
        min_ready: usize,
        /// Hard timeout.
        timeout_secs: u64,
        /// Behavior on timeout.
        #[serde(default)]
        on_timeout: OnTimeout,
    },
    /// Wait for the newest OpenShift Build of a BuildConfig to complete.
    WaitForBuild {
        /// BuildConfig name.
        build_config: String,
        /// Hard timeout.
        timeout_secs: u64,
        /// Behavior on timeout.
        #[serde(default)]
        on_timeout: OnTimeout,
    },
    /// Wait for a Deployment's ready replicas to reach its desired count.
    WaitForDeployment {
        /// Deployment name.
        name: String,
        /// Hard timeout.
        timeout_secs: u64,
        /// Behavior on timeout.
        #[serde(default)]
        on_timeout: OnTimeout,
    },
}

impl Step {
    /// Short action name for logs.
    #[must_use]
    pub const fn action(&self) -> &'static str {
        match self {
            Self::LabelNodes { .. } => "label_nodes",
            Self::Apply { .. } => "apply",
            Self::WaitForCsv { .. } => "wait_for_csv",
            Self::WaitForPods { .. } => "wait_for_pods",
            Self::WaitForBuild { .. } => "wait_for_build",
            Self::WaitForDeployment { .. } => "wait_for_deployment",
        }
    }

    /// Timeout and timeout policy of wait steps.
    #[must_use]
    pub const fn wait_policy(&self) -> Option<(Duration, OnTimeout)> {
        match self {
            Self::LabelNodes { .. } | Self::Apply { .. } => None,
            Self::WaitForCsv {
                timeout_secs,
                on_timeout,
                ..
            }
            | Self::WaitForPods {
                timeout_secs,
                on_timeout,
                ..
            }
            | Self::WaitForBuild {
                timeout_secs,
                on_timeout,
                ..
            }
            | Self::WaitForDeployment {
                timeout_secs,
                on_timeout,
                ..
            } => Some((Duration::from_secs(*timeout_secs), *on_timeout)),
        }
    }
}

impl Plan {
    /// Reads and validates a plan file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid YAML for a
    /// plan, or fails validation.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read plan {}", path.display()))?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self::from_yaml(&text, base_dir)
            .with_context(|| format!("invalid plan {}", path.display()))
    }

    /// Parses and validates a plan from YAML text.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed YAML or a plan that fails validation.
    pub fn from_yaml(text: &str, base_dir: PathBuf) -> Result<Self> {
        let mut plan: Self = serde_yaml::from_str(text)?;
        plan.base_dir = base_dir;
        plan.validate()?;
        Ok(plan)
    }

    /// Applies `KEY=VALUE` overrides. Overriding `NAMESPACE` also moves the
    /// plan's target namespace.
    pub fn apply_overrides<I>(&mut self, overrides: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in overrides {
            if key == NAMESPACE_VAR {
                self.namespace = value;
            } else {
                self.vars.insert(key, value);
            }
        }
    }

    /// Variables available to manifests, including `NAMESPACE`.
    #[must_use]
    pub fn variables(&self) -> BTreeMap<String, String> {
        let mut vars = self.vars.clone();
        vars.insert(NAMESPACE_VAR.to_string(), self.namespace.clone());
        vars
    }

    /// Fixed delay between readiness polls.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Resolves a manifest path against the plan directory.
    #[must_use]
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Labels added by `label_nodes` steps, grouped by architecture.
    #[must_use]
    pub fn node_labels(&self) -> Vec<(&str, Vec<&str>)> {
        self.steps
            .iter()
            .filter_map(|step| match step {
                Step::LabelNodes { arch, labels } => {
                    Some((arch.as_str(), labels.keys().map(String::as_str).collect()))
                }
                _ => None,
            })
            .collect()
    }

    fn validate(&self) -> Result<()> {
        ensure!(!self.namespace.trim().is_empty(), "namespace must not be empty");
        ensure!(self.poll_interval_secs > 0, "poll_interval_secs must be positive");
        ensure!(!self.steps.is_empty(), "plan has no steps");
        if self.vars.contains_key(NAMESPACE_VAR) {
            bail!("{NAMESPACE_VAR} is reserved; set `namespace` instead");
        }
        for (index, step) in self.steps.iter().enumerate() {
            let number = index + 1;
            match step {
                Step::LabelNodes { arch, labels } => {
                    ensure!(!arch.is_empty(), "step {number}: arch must not be empty");
                    ensure!(!labels.is_empty(), "step {number}: no labels given");
                }
                Step::WaitForPods {
                    selector,
                    min_ready,
                    ..
                } => {
                    ensure!(!selector.is_empty(), "step {number}: selector must not be empty");
                    ensure!(*min_ready > 0, "step {number}: min_ready must be positive");
                }
                _ => {}
            }
            if let Some((timeout, _)) = step.wait_policy() {
                ensure!(!timeout.is_zero(), "step {number}: timeout_secs must be positive");
            }
        }
        Ok(())
    }
}

fn default_field_manager() -> String {
    "hetero-deploy".to_string()
}

fn default_poll_interval_secs() -> u64 {
    10
}

fn default_min_ready() -> usize {
    1
}
