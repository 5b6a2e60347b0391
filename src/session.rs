//! Analytics session: connect, pick a bucket/scope, run queries
//!
//! A [`Session`] owns an immutable [`ConnectionConfig`] and a mutable
//! bucket/scope selection. Every query is sent with the query context
//! `default:<bucket>.<scope>` built from the current selection and returns
//! a fully materialized [`QueryResult`].

use crate::error::{ColumnarError, Result};
use crate::spatial::CoordinatePair;
use crate::transport::{
    AnalyticsRequest, AnalyticsTransport, HttpTransport, PingStatus, QueryMetrics,
};
use crate::types::{ConnectionConfig, DEFAULT_SCOPE, READY_DEADLINE};
use serde_json::{Map, Value};
use std::fmt;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Interval between readiness pings while connecting
const READY_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// One result row: column name to value, in the engine's key order.
pub type Row = Map<String, Value>;

/// Connected handle to an analytics cluster.
///
/// A session is not meant to be shared between concurrent callers; the
/// selection setters take `&mut self`.
///
/// # Examples
///
/// ```rust,no_run
/// use columnardemo::{ConnectionConfig, Session};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ConnectionConfig::new("columnar.example.com", "Administrator", "password");
/// let mut session = Session::connect(config)?;
/// session.select_scope("cbdocs", "_default");
///
/// let result = session.query("SELECT c.name FROM customers c LIMIT 5")?;
/// for row in result.rows() {
///     println!("{:?}", row.get("name"));
/// }
/// # Ok(())
/// # }
/// ```
pub struct Session {
    config: ConnectionConfig,
    transport: Box<dyn AnalyticsTransport>,
    bucket: Option<String>,
    scope: String,
}

impl Session {
    /// Connect over HTTP and wait until the analytics service is ready.
    pub fn connect(config: ConnectionConfig) -> Result<Self> {
        config.validate()?;
        debug!("Connect string: {}", config.connect_string());
        let transport = HttpTransport::new(&config)?;
        Self::connect_with(config, Box::new(transport))
    }

    /// Connect over an arbitrary transport.
    pub fn connect_with(
        config: ConnectionConfig,
        transport: Box<dyn AnalyticsTransport>,
    ) -> Result<Self> {
        wait_until_ready(transport.as_ref(), READY_DEADLINE, config.timeouts().kv)?;
        info!(host = %config.hostname, "analytics service ready");

        Ok(Self {
            config,
            transport,
            bucket: None,
            scope: DEFAULT_SCOPE.to_string(),
        })
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Select the bucket and scope later queries resolve names against.
    ///
    /// No I/O happens here; an unknown bucket or scope is reported by the
    /// first query that uses it.
    pub fn select_scope(&mut self, bucket: impl Into<String>, scope: impl Into<String>) -> &mut Self {
        self.bucket = Some(bucket.into());
        self.scope = scope.into();
        self
    }

    pub fn set_bucket(&mut self, bucket: impl Into<String>) -> &mut Self {
        self.bucket = Some(bucket.into());
        self
    }

    pub fn set_scope(&mut self, scope: impl Into<String>) -> &mut Self {
        self.scope = scope.into();
        self
    }

    pub fn bucket(&self) -> Option<&str> {
        self.bucket.as_deref()
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Query context for the current selection, e.g. `default:cbdocs._default`.
    pub fn query_context(&self) -> Result<String> {
        match self.bucket.as_deref() {
            Some(bucket) if !bucket.is_empty() && !self.scope.is_empty() => {
                Ok(format!("default:{}.{}", bucket, self.scope))
            }
            _ => Err(ColumnarError::ScopeNotSelected),
        }
    }

    /// Run `statement` and collect every row.
    pub fn query(&self, statement: &str) -> Result<QueryResult> {
        self.query_with(statement, Map::new())
    }

    /// Run `statement` with named parameters (`$name` placeholders).
    ///
    /// Values travel in the request body, never inside the statement text.
    pub fn query_with(&self, statement: &str, params: Map<String, Value>) -> Result<QueryResult> {
        let context = self.query_context()?;
        let mut request =
            AnalyticsRequest::new(statement, context, self.config.timeouts().query);
        for (name, value) in params {
            request = request.with_param(&name, value);
        }
        debug!(query_context = %request.query_context, "running analytics query");

        let response = self.transport.execute(&request).map_err(into_query_error)?;
        let (items, metrics) = response.into_results()?;

        Ok(QueryResult {
            rows: items.into_iter().map(into_row).collect(),
            metrics,
        })
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("bucket", &self.bucket)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

/// Poll `transport` until it is ready or `deadline` has passed.
///
/// Each ping is capped at `ping_timeout` and at the time left, so a
/// hanging ping cannot extend the deadline.
fn wait_until_ready(
    transport: &dyn AnalyticsTransport,
    deadline: Duration,
    ping_timeout: Duration,
) -> Result<()> {
    let started = Instant::now();
    let mut last_reason = String::from("no response");

    loop {
        let remaining = deadline.saturating_sub(started.elapsed());
        match transport.ping(ping_timeout.min(remaining)) {
            Ok(PingStatus::Ready) => return Ok(()),
            Ok(PingStatus::Unauthorized) => {
                return Err(ColumnarError::Connection(
                    "authentication rejected by the cluster".to_string(),
                ));
            }
            Ok(PingStatus::Unavailable(reason)) => last_reason = reason,
            Err(e) => last_reason = e.to_string(),
        }

        let elapsed = started.elapsed();
        if elapsed >= deadline {
            return Err(ColumnarError::Connection(format!(
                "cluster not ready after {:?}: {}",
                deadline, last_reason
            )));
        }
        thread::sleep(READY_POLL_INTERVAL.min(deadline - elapsed));
    }
}

fn into_query_error(err: ColumnarError) -> ColumnarError {
    match err {
        ColumnarError::Query(_) => err,
        other => ColumnarError::Query(other.to_string()),
    }
}

fn into_row(item: Value) -> Row {
    match item {
        Value::Object(map) => map,
        other => {
            let mut row = Map::new();
            row.insert("$1".to_string(), other);
            row
        }
    }
}

/// Materialized rows of one query, in the order the engine returned them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    rows: Vec<Row>,
    metrics: Option<QueryMetrics>,
}

impl QueryResult {
    pub fn from_rows(rows: Vec<Row>) -> Self {
        Self {
            rows,
            metrics: None,
        }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    pub fn metrics(&self) -> Option<&QueryMetrics> {
        self.metrics.as_ref()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    /// Column names in first-seen order across all rows.
    pub fn columns(&self) -> Vec<&str> {
        let mut columns: Vec<&str> = Vec::new();
        for row in &self.rows {
            for key in row.keys() {
                if !columns.contains(&key.as_str()) {
                    columns.push(key.as_str());
                }
            }
        }
        columns
    }

    /// Values of one column, `Value::Null` where a row lacks it.
    pub fn column(&self, name: &str) -> Vec<&Value> {
        self.rows
            .iter()
            .map(|row| row.get(name).unwrap_or(&Value::Null))
            .collect()
    }

    /// Coordinates held in `column`, skipping rows without a usable value.
    ///
    /// Accepts `{"lon": .., "lat": ..}` objects (also `lng`/`longitude` and
    /// `latitude`) and GeoJSON-style `[lon, lat]` arrays.
    pub fn coordinates(&self, column: &str) -> Vec<CoordinatePair> {
        self.rows
            .iter()
            .filter_map(|row| row.get(column))
            .filter_map(parse_coordinate)
            .filter(CoordinatePair::is_valid)
            .collect()
    }
}

impl<'a> IntoIterator for &'a QueryResult {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

fn parse_coordinate(value: &Value) -> Option<CoordinatePair> {
    match value {
        Value::Object(map) => {
            let lon = ["lon", "lng", "longitude"]
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_f64))?;
            let lat = ["lat", "latitude"]
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_f64))?;
            Some(CoordinatePair::new(lon, lat))
        }
        Value::Array(items) if items.len() >= 2 => {
            Some(CoordinatePair::new(items[0].as_f64()?, items[1].as_f64()?))
        }
        _ => None,
    }
}
