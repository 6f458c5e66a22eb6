//! Placement metadata for the cross-architecture demo.
//!
//! [`Topology`] combines what the running binary knows about itself
//! (machine architecture, kernel) with what the platform tells it through
//! environment variables (node and pod names, the database's location).

use crate::config::PlacementConfig;

/// Where the application server runs and where it expects its database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    /// Kubernetes node hosting this pod.
    pub node_name: String,
    /// This pod's name.
    pub pod_name: String,
    /// Machine-style architecture of the running binary (`ppc64le`, `x86_64`...).
    pub machine: String,
    /// `<OS>-<kernel release>-<machine>` description of the host.
    pub platform: String,
    /// Human label for the application server's architecture.
    pub app_arch_label: String,
    /// Human label for the database server's architecture.
    pub db_arch_label: String,
    /// Cluster DNS name of the database primary.
    pub db_host: String,
    /// Database port.
    pub db_port: u16,
}

impl Topology {
    /// Detects the local host and merges it with the configured placement.
    ///
    /// Reads the kernel release from procfs once; call at startup.
    #[must_use]
    pub fn detect(placement: &PlacementConfig) -> Self {
        let release = std::fs::read_to_string("/proc/sys/kernel/osrelease")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        Self::with_host(placement, machine_name(), release.as_deref())
    }

    /// Builds a topology for an explicit machine and kernel release.
    #[must_use]
    pub fn with_host(placement: &PlacementConfig, machine: &str, release: Option<&str>) -> Self {
        let os = os_name();
        let platform = match release {
            Some(release) => format!("{os}-{release}-{machine}"),
            None => format!("{os}-{machine}"),
        };
        Self {
            node_name: placement.node_name.clone(),
            pod_name: placement.pod_name.clone(),
            machine: machine.to_string(),
            platform,
            app_arch_label: placement.app_arch_label.clone(),
            db_arch_label: placement.db_arch_label.clone(),
            db_host: placement.db_host.clone(),
            db_port: placement.db_port,
        }
    }
}

/// Architecture name as `uname -m` reports it, rather than Rust's target
/// naming (`powerpc64` little-endian is `ppc64le`).
#[must_use]
pub fn machine_name() -> &'static str {
    match std::env::consts::ARCH {
        "powerpc64" if cfg!(target_endian = "little") => "ppc64le",
        "powerpc64" => "ppc64",
        "x86" => "i686",
        "arm" => "armv7l",
        other => other,
    }
}

fn os_name() -> &'static str {
    match std::env::consts::OS {
        "linux" => "Linux",
        "macos" => "Darwin",
        "windows" => "Windows",
        "freebsd" => "FreeBSD",
        other => other,
    }
}
