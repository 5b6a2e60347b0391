use columnardemo::{Centroid, ColumnarError, CoordinatePair, QueryResult, centroid, spherical_mean};
use serde_json::json;

const TOLERANCE: f64 = 1e-9;

fn assert_close(c: Centroid, lat: f64, lon: f64, tolerance: f64) {
    assert!(
        (c.latitude - lat).abs() < tolerance && (c.longitude - lon).abs() < tolerance,
        "expected ({}, {}), got {}",
        lat,
        lon,
        c
    );
}

#[test]
fn test_single_point_round_trips() {
    let cities = [
        (-74.0060, 40.7128),  // New York
        (-0.1278, 51.5074),   // London
        (139.6503, 35.6762),  // Tokyo
        (151.2153, -33.8568), // Sydney
        (-180.0, -45.0),
    ];

    for (lon, lat) in cities {
        let c = centroid(&[CoordinatePair::new(lon, lat)]).unwrap();
        assert!((c.latitude - lat).abs() < TOLERANCE);
        // -180 and 180 are the same meridian
        let dlon = (c.longitude - lon).abs();
        assert!(dlon < TOLERANCE || (dlon - 360.0).abs() < TOLERANCE);
    }
}

#[test]
fn test_empty_input_is_an_error() {
    assert!(matches!(centroid(&[]), Err(ColumnarError::EmptyInput)));
    assert!(matches!(spherical_mean(&[]), Err(ColumnarError::EmptyInput)));
}

#[test]
fn test_small_square_around_origin() {
    let d = 0.01;
    let square = [
        CoordinatePair::new(-d, -d),
        CoordinatePair::new(d, -d),
        CoordinatePair::new(d, d),
        CoordinatePair::new(-d, d),
    ];
    assert_close(centroid(&square).unwrap(), 0.0, 0.0, TOLERANCE);
}

#[test]
fn test_antimeridian_not_naive_average() {
    let points = [CoordinatePair::new(-179.0, 10.0), CoordinatePair::new(179.0, 10.0)];
    let c = centroid(&points).unwrap();

    // A degree average would land on the prime meridian
    assert!(c.longitude.abs() > 179.9);
    assert!((c.latitude - 10.0).abs() < 0.01);
}

#[test]
fn test_points_around_the_pole() {
    let ring: Vec<CoordinatePair> = (0..8)
        .map(|i| CoordinatePair::new(-180.0 + 45.0 * i as f64, 80.0))
        .collect();

    let c = centroid(&ring).unwrap();
    assert!((c.latitude - 90.0).abs() < 1e-6);
}

#[test]
fn test_texas_customers() {
    let stores = [
        CoordinatePair::new(-96.7970, 32.7767), // Dallas
        CoordinatePair::new(-95.3698, 29.7604), // Houston
        CoordinatePair::new(-97.7431, 30.2672), // Austin
        CoordinatePair::new(-98.4936, 29.4241), // San Antonio
    ];
    let c = centroid(&stores).unwrap();

    // Close to the planar average at this scale
    assert_close(c, 30.56, -97.1, 0.1);
}

#[test]
fn test_antipodal_points_are_flagged() {
    let points = [CoordinatePair::new(30.0, 45.0), CoordinatePair::new(-150.0, -45.0)];
    let mean = spherical_mean(&points).unwrap();
    assert!(mean.is_degenerate(1e-9));
    // Still a finite answer
    assert!(mean.centroid.latitude.is_finite());
    assert!(mean.centroid.longitude.is_finite());
}

#[test]
fn test_centroid_from_query_rows() {
    let rows = [
        json!({"name": "A", "geo": {"lon": 2.0, "lat": 1.0}}),
        json!({"name": "B", "geo": {"lon": -2.0, "lat": -1.0}}),
        json!({"name": "C"}),
    ]
    .into_iter()
    .filter_map(|v| v.as_object().cloned())
    .collect();
    let result = QueryResult::from_rows(rows);

    let coords = result.coordinates("geo");
    assert_eq!(coords.len(), 2);
    assert_close(centroid(&coords).unwrap(), 0.0, 0.0, TOLERANCE);
}
