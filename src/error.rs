use thiserror::Error;

/// Error types for columnardemo
#[derive(Error, Debug)]
pub enum ColumnarError {
    /// Cluster unreachable, credentials rejected or readiness deadline missed
    #[error("Connection error: {0}")]
    Connection(String),

    /// Compilation, runtime or timeout failure reported for a query
    #[error("Query error: {0}")]
    Query(String),

    /// Centroid requested for an empty set of coordinates
    #[error("Cannot compute a centroid of zero points")]
    EmptyInput,

    /// Query issued before a bucket was selected
    #[error("No bucket selected for the query context")]
    ScopeNotSelected,

    /// Coordinate outside the WGS84 range
    #[error("Invalid coordinate: lon={lon}, lat={lat}")]
    InvalidCoordinate { lon: f64, lat: f64 },

    /// Query template parameter without a bound value
    #[error("Missing value for query parameter ${0}")]
    MissingParameter(String),

    /// Configuration could not be loaded or is inconsistent
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ColumnarError {
    /// Whether this error came from establishing the session.
    pub fn is_connection(&self) -> bool {
        matches!(self, ColumnarError::Connection(_))
    }

    /// Whether this error came from running a query.
    pub fn is_query(&self) -> bool {
        matches!(self, ColumnarError::Query(_) | ColumnarError::ScopeNotSelected)
    }
}

/// Result type alias for columnardemo operations
pub type Result<T> = std::result::Result<T, ColumnarError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ColumnarError::Query("24045: Cannot find dataset".to_string());
        assert_eq!(err.to_string(), "Query error: 24045: Cannot find dataset");

        let err = ColumnarError::MissingParameter("category".to_string());
        assert_eq!(err.to_string(), "Missing value for query parameter $category");
    }

    #[test]
    fn test_error_classification() {
        assert!(ColumnarError::Connection("down".into()).is_connection());
        assert!(ColumnarError::ScopeNotSelected.is_query());
        assert!(!ColumnarError::EmptyInput.is_query());
        assert!(!ColumnarError::EmptyInput.is_connection());
    }
}
