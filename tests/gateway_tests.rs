use columnardemo::transport::{AnalyticsRequest, AnalyticsResponse, EngineError};
use columnardemo::{
    AnalyticsTransport, ColumnarError, ConnectionConfig, PingStatus, Result, Session,
    SessionBuilder, queries,
};
use serde_json::{Map, Value, json};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Transport that records every request and answers with fixed rows.
struct RecordingTransport {
    requests: Arc<Mutex<Vec<AnalyticsRequest>>>,
    response: AnalyticsResponse,
}

impl RecordingTransport {
    fn new(results: Vec<Value>) -> (Self, Arc<Mutex<Vec<AnalyticsRequest>>>) {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let transport = Self {
            requests: requests.clone(),
            response: AnalyticsResponse {
                status: "success".to_string(),
                results,
                ..Default::default()
            },
        };
        (transport, requests)
    }

    fn failing(code: i64, msg: &str) -> Self {
        Self {
            requests: Arc::new(Mutex::new(Vec::new())),
            response: AnalyticsResponse {
                status: "fatal".to_string(),
                errors: vec![EngineError {
                    code,
                    msg: msg.to_string(),
                }],
                ..Default::default()
            },
        }
    }
}

impl AnalyticsTransport for RecordingTransport {
    fn ping(&self, _timeout: Duration) -> Result<PingStatus> {
        Ok(PingStatus::Ready)
    }

    fn execute(&self, request: &AnalyticsRequest) -> Result<AnalyticsResponse> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(self.response.clone())
    }
}

fn config() -> ConnectionConfig {
    ConnectionConfig::new("columnar.local", "Administrator", "password")
}

#[test]
fn test_query_context_after_select_scope() {
    let (transport, requests) = RecordingTransport::new(vec![]);
    let mut session = Session::connect_with(config(), Box::new(transport)).unwrap();

    session.select_scope("b1", "sc1");
    session.query("SELECT 1").unwrap();

    let requests = requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].query_context, "default:b1.sc1");
    assert_eq!(requests[0].statement, "SELECT 1");
    assert_eq!(requests[0].timeout, "60s");
}

#[test]
fn test_query_without_bucket_fails_fast() {
    let (transport, requests) = RecordingTransport::new(vec![]);
    let session = Session::connect_with(config(), Box::new(transport)).unwrap();

    let err = session.query("SELECT 1").unwrap_err();
    assert!(matches!(err, ColumnarError::ScopeNotSelected));
    assert!(requests.lock().unwrap().is_empty());
}

#[test]
fn test_rows_keep_order_and_keys() {
    let (transport, _) =
        RecordingTransport::new(vec![json!({"score": 28, "name": "A"}), json!({"score": 19, "name": "B"})]);
    let mut session = Session::connect_with(config(), Box::new(transport)).unwrap();
    session.select_scope("cbdocs", "_default");

    let result = session.query("SELECT score, name FROM scores").unwrap();
    assert_eq!(result.len(), 2);

    let first: Vec<&str> = result.rows()[0].keys().map(String::as_str).collect();
    assert_eq!(first, vec!["score", "name"]);
    assert_eq!(result.rows()[0]["score"], json!(28));
    assert_eq!(result.rows()[0]["name"], json!("A"));
    assert_eq!(result.rows()[1]["score"], json!(19));
    assert_eq!(result.rows()[1]["name"], json!("B"));
    assert_eq!(result.columns(), vec!["score", "name"]);
}

#[test]
fn test_engine_error_surfaces_as_query_error() {
    let transport =
        RecordingTransport::failing(24045, "Cannot find analytics collection with name customers");
    let mut session = Session::connect_with(config(), Box::new(transport)).unwrap();
    session.select_scope("cbdocs", "_default");

    match session.query("SELECT * FROM customers") {
        Err(ColumnarError::Query(msg)) => {
            assert!(msg.contains("24045"));
            assert!(msg.contains("Cannot find analytics collection"));
        }
        other => panic!("unexpected: {:?}", other),
    }
}

#[test]
fn test_transport_errors_become_query_errors() {
    struct Broken;
    impl AnalyticsTransport for Broken {
        fn ping(&self, _timeout: Duration) -> Result<PingStatus> {
            Ok(PingStatus::Ready)
        }
        fn execute(&self, _request: &AnalyticsRequest) -> Result<AnalyticsResponse> {
            Err(ColumnarError::Io(std::io::Error::other("connection reset")))
        }
    }

    let mut session = Session::connect_with(config(), Box::new(Broken)).unwrap();
    session.select_scope("cbdocs", "_default");

    let err = session.query("SELECT 1").unwrap_err();
    assert!(err.is_query());
    assert!(err.to_string().contains("connection reset"));
}

#[test]
fn test_named_parameters_are_not_interpolated() {
    let (transport, requests) = RecordingTransport::new(vec![]);
    let session = SessionBuilder::new("columnar.local")
        .credentials("Administrator", "password")
        .bucket("cbdocs")
        .connect_with(Box::new(transport))
        .unwrap();

    let hostile = "Grocery' OR 1=1 --";
    let mut values = Map::new();
    values.insert("category".to_string(), json!(hostile));
    queries::SPEND_BY_CATEGORY.run(&session, &values).unwrap();

    let requests = requests.lock().unwrap();
    assert_eq!(requests[0].statement, queries::SPEND_BY_CATEGORY.statement);
    assert!(!requests[0].statement.contains(hostile));
    assert_eq!(requests[0].named_args["$category"], json!(hostile));
    assert_eq!(requests[0].query_context, "default:cbdocs._default");
}

#[test]
fn test_each_request_has_its_own_context_id() {
    let (transport, requests) = RecordingTransport::new(vec![]);
    let mut session = Session::connect_with(config(), Box::new(transport)).unwrap();
    session.select_scope("cbdocs", "_default");

    session.query("SELECT 1").unwrap();
    session.query("SELECT 2").unwrap();

    let requests = requests.lock().unwrap();
    assert_ne!(requests[0].client_context_id, requests[1].client_context_id);
}
