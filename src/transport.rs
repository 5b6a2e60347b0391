//! Wire access to the analytics REST service
//!
//! [`AnalyticsTransport`] is the seam between a [`Session`](crate::Session)
//! and the network. [`HttpTransport`] talks to a real cluster; tests plug in
//! their own implementations.

use crate::error::{ColumnarError, Result};
use crate::types::ConnectionConfig;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, warn};

/// Path of the analytics query endpoint
pub const QUERY_PATH: &str = "/analytics/service";

/// Path of the readiness check
pub const PING_PATH: &str = "/admin/ping";

/// Outcome of one readiness ping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PingStatus {
    Ready,
    /// Credentials were refused; waiting longer will not help
    Unauthorized,
    /// Not reachable or not ready yet
    Unavailable(String),
}

/// Transport used by a session to reach the analytics service.
pub trait AnalyticsTransport: Send {
    /// Check whether the service is ready to accept queries.
    ///
    /// The check must give up once `timeout` has elapsed.
    fn ping(&self, timeout: Duration) -> Result<PingStatus>;

    /// Run one request and return the decoded response body.
    ///
    /// Engine-level errors are carried in [`AnalyticsResponse::errors`];
    /// an `Err` means the request never produced a readable response.
    fn execute(&self, request: &AnalyticsRequest) -> Result<AnalyticsResponse>;
}

/// Body of a query request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsRequest {
    pub statement: String,
    pub query_context: String,
    pub client_context_id: String,
    /// Server-side timeout as a duration string, e.g. `60s`
    pub timeout: String,
    /// Named parameters, keys carry the leading `$`
    #[serde(flatten)]
    pub named_args: Map<String, Value>,
}

impl AnalyticsRequest {
    pub fn new(
        statement: impl Into<String>,
        query_context: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            statement: statement.into(),
            query_context: query_context.into(),
            client_context_id: uuid::Uuid::new_v4().to_string(),
            timeout: format_timeout(timeout),
            named_args: Map::new(),
        }
    }

    /// Bind a named parameter; `name` may be given with or without `$`.
    pub fn with_param(mut self, name: &str, value: Value) -> Self {
        let key = if name.starts_with('$') {
            name.to_string()
        } else {
            format!("${}", name)
        };
        self.named_args.insert(key, value);
        self
    }
}

fn format_timeout(timeout: Duration) -> String {
    if timeout.subsec_millis() == 0 {
        format!("{}s", timeout.as_secs())
    } else {
        format!("{}ms", timeout.as_millis())
    }
}

/// One error reported by the analytics engine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EngineError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub msg: String,
}

/// Execution statistics reported with a response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryMetrics {
    pub elapsed_time: String,
    pub execution_time: String,
    pub result_count: u64,
    pub result_size: u64,
    pub processed_objects: u64,
}

/// Decoded body of a query response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AnalyticsResponse {
    #[serde(rename = "requestID")]
    pub request_id: Option<String>,
    pub status: String,
    pub results: Vec<Value>,
    pub errors: Vec<EngineError>,
    pub metrics: Option<QueryMetrics>,
}

impl AnalyticsResponse {
    /// Split into result items and metrics, or the engine's first error.
    pub fn into_results(self) -> Result<(Vec<Value>, Option<QueryMetrics>)> {
        if let Some(err) = self.errors.first() {
            return Err(ColumnarError::Query(format!("{}: {}", err.code, err.msg)));
        }
        if !self.status.is_empty() && self.status != "success" {
            return Err(ColumnarError::Query(format!(
                "query finished with status {}",
                self.status
            )));
        }
        Ok((self.results, self.metrics))
    }
}

/// Blocking HTTP transport for the analytics REST API.
pub struct HttpTransport {
    client: Client,
    base_url: String,
    username: String,
    password: String,
    query_timeout: Duration,
}

impl HttpTransport {
    /// Build a client for `config`.
    ///
    /// With encryption enabled the server certificate is NOT verified.
    pub fn new(config: &ConnectionConfig) -> Result<Self> {
        let timeouts = config.timeouts();
        let mut builder = Client::builder()
            .connect_timeout(timeouts.connect)
            .timeout(timeouts.query);

        if config.use_encryption {
            warn!(
                host = %config.hostname,
                "TLS certificate verification is disabled for this cluster"
            );
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder
            .build()
            .map_err(|e| ColumnarError::Connection(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.analytics_base_url(),
            username: config.username.clone(),
            password: config.password.clone(),
            query_timeout: timeouts.query,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl AnalyticsTransport for HttpTransport {
    fn ping(&self, timeout: Duration) -> Result<PingStatus> {
        let url = format!("{}{}", self.base_url, PING_PATH);
        let response = match self
            .client
            .get(&url)
            .basic_auth(&self.username, Some(&self.password))
            .timeout(timeout)
            .send()
        {
            Ok(response) => response,
            Err(e) => return Ok(PingStatus::Unavailable(e.to_string())),
        };

        let status = response.status();
        if status.is_success() {
            Ok(PingStatus::Ready)
        } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            Ok(PingStatus::Unauthorized)
        } else {
            Ok(PingStatus::Unavailable(format!("HTTP {}", status)))
        }
    }

    fn execute(&self, request: &AnalyticsRequest) -> Result<AnalyticsResponse> {
        let url = format!("{}{}", self.base_url, QUERY_PATH);
        debug!(
            client_context_id = %request.client_context_id,
            query_context = %request.query_context,
            "sending analytics request"
        );

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.username, Some(&self.password))
            .timeout(self.query_timeout)
            .json(request)
            .send()?;

        let status = response.status();
        let body = response.text()?;

        // Failed queries still answer with a JSON body describing the errors
        match serde_json::from_str::<AnalyticsResponse>(&body) {
            Ok(decoded) if status.is_success() || !decoded.errors.is_empty() => Ok(decoded),
            _ if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN => Err(
                ColumnarError::Query("authentication rejected by the cluster".to_string()),
            ),
            Ok(_) => Err(ColumnarError::Query(format!("HTTP {}", status))),
            Err(e) if status.is_success() => Err(ColumnarError::Serialization(e)),
            Err(_) => Err(ColumnarError::Query(format!("HTTP {}: {}", status, body.trim()))),
        }
    }
}
