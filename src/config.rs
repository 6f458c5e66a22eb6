//! Server configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). Parsing goes through a lookup function
//! so the same code path can be driven from a map in tests.

use std::net::SocketAddr;

/// Default PostgreSQL connection pieces, matching the operator-managed
/// cluster created by `deploy/manifests/20-postgrescluster.yaml`.
const DEFAULT_PG_USER: &str = "appuser";
const DEFAULT_PG_PASSWORD: &str = "changeme";
const DEFAULT_PG_HOST: &str = "hetero-pgcluster-primary";
const DEFAULT_PG_PORT: &str = "5432";
const DEFAULT_PG_DBNAME: &str = "appdb";

/// Top-level server configuration.
///
/// Loaded once at startup via [`AppConfig::from_env`].
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:8080`).
    pub listen_addr: SocketAddr,

    /// PostgreSQL connection string with the `sslmode` parameter normalized.
    pub database_url: String,

    /// Maximum number of database connections in the pool.
    pub database_max_connections: u32,

    /// Minimum idle connections in the pool.
    pub database_min_connections: u32,

    /// Timeout in seconds for acquiring a database connection.
    pub database_connect_timeout_secs: u64,

    /// Schema initialization attempts at startup.
    pub database_connect_retries: u32,

    /// Fixed delay between schema initialization attempts.
    pub database_retry_delay_secs: u64,

    /// Master switch for the PostgreSQL store. When off, items live in memory.
    pub persistence_enabled: bool,

    /// Per-request timeout enforced by the HTTP layer.
    pub request_timeout_secs: u64,

    /// Emit JSON log lines instead of human-readable text.
    pub log_json: bool,

    /// Placement metadata reported by `/arch` and the web UI.
    pub placement: PlacementConfig,
}

/// Where this pod and its database are expected to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementConfig {
    /// Kubernetes node name injected through the downward API.
    pub node_name: String,
    /// Pod name injected through the downward API.
    pub pod_name: String,
    /// Human label for the application server's architecture.
    pub app_arch_label: String,
    /// Human label for the database server's architecture.
    pub db_arch_label: String,
    /// Cluster DNS name of the database primary service.
    pub db_host: String,
    /// Database service port.
    pub db_port: u16,
}

impl AppConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to sensible defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` is set but cannot be parsed as
    /// a [`SocketAddr`].
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` cannot be parsed as a [`SocketAddr`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Box<dyn std::error::Error>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let listen_addr: SocketAddr = lookup("LISTEN_ADDR")
            .unwrap_or_else(|| "0.0.0.0:8080".to_string())
            .parse()?;

        let sslmode = lookup("DATABASE_SSLMODE").unwrap_or_else(|| "require".to_string());
        let database_url = with_sslmode(&base_database_url(&lookup), &sslmode);

        let placement = PlacementConfig {
            node_name: lookup("NODE_NAME").unwrap_or_else(|| "unknown".to_string()),
            pod_name: lookup("POD_NAME").unwrap_or_else(|| "unknown".to_string()),
            app_arch_label: lookup("APP_ARCH_LABEL")
                .unwrap_or_else(|| "ppc64le (IBM Power)".to_string()),
            db_arch_label: lookup("DB_ARCH_LABEL").unwrap_or_else(|| "x86_64 (Intel)".to_string()),
            db_host: lookup("DB_SERVICE_HOST").unwrap_or_else(|| {
                "hetero-pgcluster-primary.hetero-demo.svc.cluster.local".to_string()
            }),
            db_port: parse_key(&lookup, "DB_SERVICE_PORT", 5432),
        };

        Ok(Self {
            listen_addr,
            database_url,
            database_max_connections: parse_key(&lookup, "DATABASE_MAX_CONNECTIONS", 5),
            database_min_connections: parse_key(&lookup, "DATABASE_MIN_CONNECTIONS", 0),
            database_connect_timeout_secs: parse_key(&lookup, "DATABASE_CONNECT_TIMEOUT_SECS", 5),
            database_connect_retries: parse_key(&lookup, "DATABASE_CONNECT_RETRIES", 5),
            database_retry_delay_secs: parse_key(&lookup, "DATABASE_RETRY_DELAY_SECS", 3),
            persistence_enabled: parse_key_bool(&lookup, "PERSISTENCE_ENABLED", true),
            request_timeout_secs: parse_key(&lookup, "REQUEST_TIMEOUT_SECS", 60),
            log_json: lookup("LOG_FORMAT").is_some_and(|v| v.eq_ignore_ascii_case("json")),
            placement,
        })
    }
}

/// Returns `DATABASE_URL` when set and non-empty, otherwise assembles a URL
/// from the individual `PG_*` keys.
fn base_database_url<F>(lookup: &F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup("DATABASE_URL").filter(|u| !u.is_empty()) {
        return url;
    }

    let user = lookup("PG_USER").unwrap_or_else(|| DEFAULT_PG_USER.to_string());
    let password = lookup("PG_PASSWORD").unwrap_or_else(|| DEFAULT_PG_PASSWORD.to_string());
    let host = lookup("PG_HOST").unwrap_or_else(|| DEFAULT_PG_HOST.to_string());
    let port = lookup("PG_PORT").unwrap_or_else(|| DEFAULT_PG_PORT.to_string());
    let dbname = lookup("PG_DBNAME").unwrap_or_else(|| DEFAULT_PG_DBNAME.to_string());

    format!(
        "postgresql://{}:{}@{host}:{port}/{dbname}",
        urlencoding::encode(&user),
        urlencoding::encode(&password),
    )
}

/// Replaces any `sslmode` query parameters in `url` with a single
/// `sslmode=<mode>` appended at the end. Other parameters keep their order.
#[must_use]
pub fn with_sslmode(url: &str, mode: &str) -> String {
    let (base, query) = url.split_once('?').unwrap_or((url, ""));
    let sslmode = format!("sslmode={mode}");

    let params: Vec<&str> = query
        .split('&')
        .filter(|p| !p.is_empty() && !p.starts_with("sslmode="))
        .chain(std::iter::once(sslmode.as_str()))
        .collect();

    format!("{base}?{}", params.join("&"))
}

/// Parses a key as `T`, returning `default` on missing or invalid values.
fn parse_key<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

/// Parses a key as a boolean. Accepts `"true"`, `"1"`, `"false"`, `"0"`
/// (case-insensitive). Returns `default` otherwise.
fn parse_key_bool<F>(lookup: &F, key: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).map(|v| v.to_ascii_lowercase()).as_deref() {
        Some("true" | "1") => true,
        Some("false" | "0") => false,
        _ => default,
    }
}
