use columnardemo::{CoordinatePair, QueryResult, centroid, spherical_mean};
use serde_json::json;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Map centre demo");

    // Rows shaped like the customer_locations query output
    let rows = [
        json!({"name": "Ana Ruiz", "state": "TX", "geo": {"lon": -96.7970, "lat": 32.7767}}),
        json!({"name": "Bo Chen", "state": "TX", "geo": {"lon": -95.3698, "lat": 29.7604}}),
        json!({"name": "Cara Diaz", "state": "OK", "geo": [-97.5164, 35.4676]}),
        json!({"name": "Dev Patel", "state": "NM"}),
    ]
    .into_iter()
    .filter_map(|row| row.as_object().cloned())
    .collect();
    let result = QueryResult::from_rows(rows);

    let coords = result.coordinates("geo");
    println!("{} of {} rows carry coordinates", coords.len(), result.len());

    let center = centroid(&coords)?;
    println!("Centre: {}", center);

    // Naive degree averaging fails across the antimeridian
    let pacific = [CoordinatePair::new(-179.0, 10.0), CoordinatePair::new(179.0, 10.0)];
    let mean = spherical_mean(&pacific)?;
    println!(
        "Pacific centre: {} (resultant length {:.3})",
        mean.centroid, mean.resultant_length
    );

    Ok(())
}
