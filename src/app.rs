//! Dashboard application state
//!
//! Everything a dashboard front end needs between interactions lives in an
//! explicit [`AppState`] value: the logged-in session and the selected
//! filters. A renderer receives a [`DashboardSnapshot`] per refresh.

use crate::builder::SessionBuilder;
use crate::error::{ColumnarError, Result};
use crate::queries::{CUSTOMER_LOCATIONS, SPEND_BY_CATEGORY, TOP_SPENDERS};
use crate::session::{QueryResult, Session};
use crate::spatial::{Centroid, centroid};
use crate::transport::AnalyticsTransport;
use crate::types::ConnectionConfig;
use serde_json::{Map, Value};
use std::fmt;
use tracing::{info, warn};

/// Row column holding customer coordinates
pub const LOCATION_COLUMN: &str = "geo";

/// Failed login, shown to users as a generic notice.
///
/// The underlying cause is only reachable through
/// [`std::error::Error::source`], for logs.
#[derive(Debug)]
pub struct LoginError {
    cause: ColumnarError,
}

impl LoginError {
    pub fn cause(&self) -> &ColumnarError {
        &self.cause
    }
}

impl fmt::Display for LoginError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Can not login to Columnar")
    }
}

impl std::error::Error for LoginError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.cause)
    }
}

/// User-selected filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    pub category: Option<String>,
    /// Limits the map to customers in one state
    pub state: Option<String>,
}

/// Data for one dashboard render.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSnapshot {
    pub top_spenders: QueryResult,
    /// Present when a category filter is selected
    pub category_spend: Option<QueryResult>,
    pub locations: QueryResult,
    /// `None` when no location row carries coordinates
    pub map_center: Option<Centroid>,
}

/// Login flag, session and filters for one dashboard user.
#[derive(Debug, Default)]
pub struct AppState {
    session: Option<Session>,
    filters: Filters,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    /// Connect with `config` and select `bucket`/`scope`.
    ///
    /// Any previous session is dropped first; on failure the state stays
    /// logged out.
    pub fn login(
        &mut self,
        config: ConnectionConfig,
        bucket: &str,
        scope: &str,
    ) -> std::result::Result<(), LoginError> {
        self.logout();
        let result = Self::builder(config, bucket, scope).connect();
        self.finish_login(result)
    }

    /// Like [`login`](Self::login), over an explicit transport.
    pub fn login_with(
        &mut self,
        config: ConnectionConfig,
        bucket: &str,
        scope: &str,
        transport: Box<dyn AnalyticsTransport>,
    ) -> std::result::Result<(), LoginError> {
        self.logout();
        let result = Self::builder(config, bucket, scope).connect_with(transport);
        self.finish_login(result)
    }

    fn builder(config: ConnectionConfig, bucket: &str, scope: &str) -> SessionBuilder {
        SessionBuilder::from_config(config).bucket(bucket).scope(scope)
    }

    fn finish_login(&mut self, result: Result<Session>) -> std::result::Result<(), LoginError> {
        match result {
            Ok(session) => {
                info!(host = %session.config().hostname, "logged in");
                self.session = Some(session);
                Ok(())
            }
            Err(cause) => {
                warn!(error = %cause, "login failed");
                Err(LoginError { cause })
            }
        }
    }

    /// Drop the session and reset all filters.
    pub fn logout(&mut self) {
        self.session = None;
        self.filters = Filters::default();
    }

    pub fn select_category(&mut self, category: Option<String>) {
        self.filters.category = category;
    }

    pub fn select_state(&mut self, state: Option<String>) {
        self.filters.state = state;
    }

    /// Run every dashboard query and compute the map centre.
    pub fn refresh(&self) -> Result<DashboardSnapshot> {
        let session = self
            .session
            .as_ref()
            .ok_or_else(|| ColumnarError::Connection("not logged in".to_string()))?;

        let no_params = Map::new();
        let top_spenders = TOP_SPENDERS.run(session, &no_params)?;

        let category_spend = match &self.filters.category {
            Some(category) => {
                let mut params = Map::new();
                params.insert("category".to_string(), Value::String(category.clone()));
                Some(SPEND_BY_CATEGORY.run(session, &params)?)
            }
            None => None,
        };

        let mut location_params = Map::new();
        if let Some(state) = &self.filters.state {
            location_params.insert("state".to_string(), Value::String(state.clone()));
        }
        let locations = CUSTOMER_LOCATIONS.run(session, &location_params)?;
        let map_center = match centroid(&locations.coordinates(LOCATION_COLUMN)) {
            Ok(center) => Some(center),
            Err(ColumnarError::EmptyInput) => None,
            Err(e) => return Err(e),
        };

        Ok(DashboardSnapshot {
            top_spenders,
            category_spend,
            locations,
            map_center,
        })
    }
}
