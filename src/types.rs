use crate::error::{ColumnarError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Default key-value timeout in seconds
pub const DEFAULT_KV_TIMEOUT_SECS: u64 = 5;

/// Default query timeout in seconds
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 60;

/// How long `connect` waits for the cluster to report ready
pub const READY_DEADLINE: Duration = Duration::from_secs(5);

/// Scope name meaning "the bucket's default scope"
pub const DEFAULT_SCOPE: &str = "_default";

/// Connection parameters for one analytics cluster.
///
/// The configuration is fixed once a session has been established; create a
/// new one (and a new session) to change credentials or hosts.
///
/// # Examples
///
/// ```rust
/// use columnardemo::ConnectionConfig;
///
/// let config = ConnectionConfig::new("db.example.com", "Administrator", "secret")
///     .with_encryption(false)
///     .with_kv_timeout(10);
///
/// assert_eq!(config.connect_string(), "couchbase://db.example.com");
/// assert_eq!(config.timeouts().bootstrap.as_secs(), 20);
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Cluster node name, optionally with an explicit `:port`
    pub hostname: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    /// TLS on the wire (certificates are not verified)
    pub use_encryption: bool,
    pub kv_timeout_secs: u64,
    pub query_timeout_secs: u64,
}

impl ConnectionConfig {
    pub fn new(
        hostname: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            hostname: hostname.into(),
            username: username.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    pub fn with_encryption(mut self, use_encryption: bool) -> Self {
        self.use_encryption = use_encryption;
        self
    }

    pub fn with_kv_timeout(mut self, secs: u64) -> Self {
        self.kv_timeout_secs = secs;
        self
    }

    pub fn with_query_timeout(mut self, secs: u64) -> Self {
        self.query_timeout_secs = secs;
        self
    }

    /// Scheme, ports and discovery prefix implied by `use_encryption`.
    pub fn transport(&self) -> TransportSettings {
        TransportSettings::for_encryption(self.use_encryption)
    }

    /// Timeouts derived from the key-value and query timeouts.
    pub fn timeouts(&self) -> TimeoutOptions {
        TimeoutOptions::derive(self.kv_timeout_secs, self.query_timeout_secs)
    }

    /// Cluster connection string, e.g. `couchbases://db.example.com`.
    pub fn connect_string(&self) -> String {
        format!("{}{}", self.transport().cluster_scheme, self.hostname)
    }

    /// DNS SRV name used for service discovery.
    pub fn srv_name(&self) -> String {
        format!("{}{}", self.transport().srv_prefix, host_only(&self.hostname))
    }

    /// Base URL of the analytics REST service.
    ///
    /// An explicit port in `hostname` takes precedence over the default
    /// analytics port.
    pub fn analytics_base_url(&self) -> String {
        let transport = self.transport();
        if has_explicit_port(&self.hostname) {
            format!("{}{}", transport.http_scheme, self.hostname)
        } else {
            format!(
                "{}{}:{}",
                transport.http_scheme, self.hostname, transport.analytics_port
            )
        }
    }

    /// Reject configurations no session could be built from.
    pub fn validate(&self) -> Result<()> {
        if self.hostname.trim().is_empty() {
            return Err(ColumnarError::InvalidConfig(
                "hostname must not be empty".to_string(),
            ));
        }
        if is_bare_ipv6(self.hostname.trim()) {
            return Err(ColumnarError::InvalidConfig(format!(
                "IPv6 host {} must be written in brackets, e.g. [::1]",
                self.hostname
            )));
        }
        if self.username.is_empty() {
            return Err(ColumnarError::InvalidConfig(
                "username must not be empty".to_string(),
            ));
        }
        if self.kv_timeout_secs == 0 || self.query_timeout_secs == 0 {
            return Err(ColumnarError::InvalidConfig(
                "timeouts must be at least one second".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse a configuration from TOML text.
    #[cfg(feature = "toml")]
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| ColumnarError::InvalidConfig(e.to_string()))
    }

    /// Load a configuration from a TOML file.
    #[cfg(feature = "toml")]
    pub fn from_toml_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            hostname: "localhost".to_string(),
            username: "Administrator".to_string(),
            password: String::new(),
            use_encryption: true,
            kv_timeout_secs: DEFAULT_KV_TIMEOUT_SECS,
            query_timeout_secs: DEFAULT_QUERY_TIMEOUT_SECS,
        }
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("hostname", &self.hostname)
            .field("username", &self.username)
            .field("password", &"***")
            .field("use_encryption", &self.use_encryption)
            .field("kv_timeout_secs", &self.kv_timeout_secs)
            .field("query_timeout_secs", &self.query_timeout_secs)
            .finish()
    }
}

fn has_explicit_port(hostname: &str) -> bool {
    // Skip past a bracketed IPv6 literal before looking for the port separator
    match hostname.rfind(']') {
        Some(idx) => hostname[idx..].contains(':'),
        None => hostname.matches(':').count() == 1,
    }
}

/// An IPv6 literal must be bracketed to be told apart from a port.
fn is_bare_ipv6(hostname: &str) -> bool {
    !hostname.starts_with('[') && hostname.matches(':').count() > 1
}

fn host_only(hostname: &str) -> &str {
    if has_explicit_port(hostname) {
        hostname
            .rsplit_once(':')
            .map(|(host, _)| host)
            .unwrap_or(hostname)
    } else {
        hostname
    }
}

/// Wire-level settings that differ between TLS and plaintext clusters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportSettings {
    /// Scheme for REST endpoints
    pub http_scheme: &'static str,
    /// Scheme for the cluster connection string
    pub cluster_scheme: &'static str,
    /// Prefix of the DNS SRV record for service discovery
    pub srv_prefix: &'static str,
    pub admin_port: u16,
    pub node_port: u16,
    pub analytics_port: u16,
}

impl TransportSettings {
    pub const ENCRYPTED: TransportSettings = TransportSettings {
        http_scheme: "https://",
        cluster_scheme: "couchbases://",
        srv_prefix: "_couchbases._tcp.",
        admin_port: 18091,
        node_port: 19102,
        analytics_port: 18095,
    };

    pub const PLAINTEXT: TransportSettings = TransportSettings {
        http_scheme: "http://",
        cluster_scheme: "couchbase://",
        srv_prefix: "_couchbase._tcp.",
        admin_port: 8091,
        node_port: 9102,
        analytics_port: 8095,
    };

    pub fn for_encryption(use_encryption: bool) -> Self {
        if use_encryption {
            Self::ENCRYPTED
        } else {
            Self::PLAINTEXT
        }
    }
}

/// Per-phase client timeouts.
///
/// Finding the cluster (bootstrap, management) is allowed twice the
/// key-value budget; everything else waits for one key-value period,
/// except queries which have their own budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutOptions {
    pub query: Duration,
    pub kv: Duration,
    pub bootstrap: Duration,
    pub resolve: Duration,
    pub connect: Duration,
    pub management: Duration,
}

impl TimeoutOptions {
    pub fn derive(kv_secs: u64, query_secs: u64) -> Self {
        let kv = Duration::from_secs(kv_secs);
        Self {
            query: Duration::from_secs(query_secs),
            kv,
            bootstrap: kv * 2,
            resolve: kv,
            connect: kv,
            management: kv * 2,
        }
    }
}

impl Default for TimeoutOptions {
    fn default() -> Self {
        Self::derive(DEFAULT_KV_TIMEOUT_SECS, DEFAULT_QUERY_TIMEOUT_SECS)
    }
}
