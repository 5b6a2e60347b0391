//! # columnardemo - analytics dashboard core for Couchbase Columnar
//!
//! columnardemo connects to a Couchbase Columnar (Analytics) cluster, runs a
//! small set of fixed analytical queries and computes what a dashboard needs
//! to render them: ordered result rows and a geographic map centre.
//!
//! ## Features
//!
//! - **Session gateway**: connect with two-tier timeouts, select a bucket and
//!   scope, run queries with named parameters
//! - **Ordered results**: rows keep the engine's row order and key order
//! - **Spherical centroid**: map centring that behaves across the poles and
//!   the antimeridian
//! - **Explicit app state**: login, filters and refresh without globals
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use columnardemo::{centroid, queries, ConnectionConfig, Session};
//! use serde_json::Map;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConnectionConfig::new("columnar.example.com", "Administrator", "password");
//! let mut session = Session::connect(config)?;
//! session.select_scope("cbdocs", "_default");
//!
//! let top = queries::TOP_SPENDERS.run(&session, &Map::new())?;
//! println!("{} customers", top.len());
//!
//! let locations = queries::CUSTOMER_LOCATIONS.run(&session, &Map::new())?;
//! let center = centroid(&locations.coordinates("geo"))?;
//! println!("Map centre: {}", center);
//! # Ok(())
//! # }
//! ```
//!
//! ## Centroid Only
//!
//! ```rust
//! use columnardemo::{centroid, CoordinatePair};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let stores = [
//!     CoordinatePair::new(-96.7970, 32.7767), // Dallas
//!     CoordinatePair::new(-95.3698, 29.7604), // Houston
//!     CoordinatePair::new(-97.7431, 30.2672), // Austin
//! ];
//! let center = centroid(&stores)?;
//! assert!(center.latitude > 29.0 && center.latitude < 33.0);
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod builder;
pub mod error;
pub mod queries;
pub mod session;
pub mod spatial;
pub mod transport;
pub mod types;

pub use app::{AppState, DashboardSnapshot, Filters, LoginError};
pub use builder::SessionBuilder;
pub use error::{ColumnarError, Result};
pub use queries::QueryTemplate;
pub use session::{QueryResult, Row, Session};
pub use spatial::{Centroid, CoordinatePair, SphericalMean, centroid, spherical_mean};
pub use transport::{AnalyticsTransport, HttpTransport, PingStatus, QueryMetrics};
pub use types::{ConnectionConfig, TimeoutOptions, TransportSettings};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    pub use crate::{
        AppState, Centroid, ColumnarError, ConnectionConfig, CoordinatePair, QueryResult, Result,
        Session, SessionBuilder, centroid,
    };
}
