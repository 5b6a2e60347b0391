//! Session builder for flexible configuration
//!
//! This module provides a builder for assembling a [`ConnectionConfig`],
//! connecting, and selecting the initial bucket/scope in one expression.

use crate::error::Result;
use crate::session::Session;
use crate::transport::AnalyticsTransport;
use crate::types::{ConnectionConfig, DEFAULT_SCOPE};

/// Builder for connected [`Session`]s.
///
/// # Examples
///
/// ```rust,no_run
/// use columnardemo::SessionBuilder;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let session = SessionBuilder::new("columnar.example.com")
///     .credentials("Administrator", "password")
///     .encryption(true)
///     .kv_timeout(5)
///     .query_timeout(60)
///     .bucket("cbdocs")
///     .connect()?;
///
/// assert_eq!(session.query_context()?, "default:cbdocs._default");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SessionBuilder {
    config: ConnectionConfig,
    bucket: Option<String>,
    scope: String,
}

impl SessionBuilder {
    /// Start from the default configuration for `hostname`.
    pub fn new(hostname: impl Into<String>) -> Self {
        Self::from_config(ConnectionConfig {
            hostname: hostname.into(),
            ..ConnectionConfig::default()
        })
    }

    /// Start from an existing configuration.
    pub fn from_config(config: ConnectionConfig) -> Self {
        Self {
            config,
            bucket: None,
            scope: DEFAULT_SCOPE.to_string(),
        }
    }

    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.config.username = username.into();
        self.config.password = password.into();
        self
    }

    /// Use TLS (`true`, the default) or plaintext transport.
    pub fn encryption(mut self, use_encryption: bool) -> Self {
        self.config.use_encryption = use_encryption;
        self
    }

    pub fn kv_timeout(mut self, secs: u64) -> Self {
        self.config.kv_timeout_secs = secs;
        self
    }

    pub fn query_timeout(mut self, secs: u64) -> Self {
        self.config.query_timeout_secs = secs;
        self
    }

    pub fn bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = Some(bucket.into());
        self
    }

    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Connect over HTTP and apply the selection.
    pub fn connect(self) -> Result<Session> {
        let (config, bucket, scope) = self.into_parts()?;
        let mut session = Session::connect(config)?;
        apply_selection(&mut session, bucket, scope);
        Ok(session)
    }

    /// Connect over `transport` and apply the selection.
    pub fn connect_with(self, transport: Box<dyn AnalyticsTransport>) -> Result<Session> {
        let (config, bucket, scope) = self.into_parts()?;
        let mut session = Session::connect_with(config, transport)?;
        apply_selection(&mut session, bucket, scope);
        Ok(session)
    }

    fn into_parts(self) -> Result<(ConnectionConfig, Option<String>, String)> {
        self.config.validate()?;
        Ok((self.config, self.bucket, self.scope))
    }
}

fn apply_selection(session: &mut Session, bucket: Option<String>, scope: String) {
    if let Some(bucket) = bucket {
        session.set_bucket(bucket);
    }
    session.set_scope(scope);
}
