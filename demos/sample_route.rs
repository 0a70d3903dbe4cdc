//! Offline walkthrough: decode a route, sample it and aggregate places from a
//! canned nearby search.
//!
//! Run with: cargo run --example sample_route

use async_trait::async_trait;
use route_poi::services::{NearbyPlace, NearbySearch};
use route_poi::{
    aggregate, categories, polyline, AggregatorConfig, Coordinate, EnrichmentConfig, Route,
    ServiceError,
};

/// Answers every search with two made-up places next to the queried point.
struct CannedSearch;

#[async_trait]
impl NearbySearch for CannedSearch {
    async fn nearby(
        &self,
        location: Coordinate,
        _radius_meters: u32,
        place_type: &str,
    ) -> Result<Vec<NearbyPlace>, ServiceError> {
        Ok((0..2)
            .map(|i| NearbyPlace {
                geometry: Some(Coordinate::new(location.lat + 0.001 * i as f64, location.lng)),
                name: format!("{} #{}", place_type, i + 1),
                types: vec![place_type.to_string(), "point_of_interest".to_string()],
                rating: Some(serde_json::json!(4.0 + 0.3 * i as f64)),
                user_ratings_total: Some(serde_json::json!(120 * (i + 1))),
                ..NearbyPlace::default()
            })
            .collect())
    }
}

#[tokio::main]
async fn main() {
    env_logger::init();

    // San Diego to Irvine, as a straight line of 120 points
    let points: Vec<Coordinate> = (0..120)
        .map(|i| {
            let t = i as f64 / 119.0;
            Coordinate::new(32.7157 + t * (33.6846 - 32.7157), -117.1611 + t * (-117.8265 + 117.1611))
        })
        .collect();
    let encoded = polyline::encode(&points);
    let route = Route::from_polyline(&encoded);

    println!("Route Sampling Example\n");
    println!("Polyline: {} chars, {} points", encoded.len(), route.points.len());
    println!("Length: {:.1} km", route.length_meters() / 1000.0);
    if let Some(center) = route.center {
        println!("Center: ({:.4}, {:.4})\n", center.lat, center.lng);
    }

    let filters = categories::expand(&["Food and Drink", "Entertainment"]);
    println!("{} filters from two categories: {:?}", filters.len(), filters);

    let config = AggregatorConfig::default();
    for count in [1, 5, filters.len()] {
        let step = polyline::effective_step(config.base_step, count, config.max_total_filters);
        let samples = polyline::sample(&route.points, step);
        println!("  {:>2} filters -> step {:>3}, {} sample points", count, step, samples.len());
    }

    let aggregation = aggregate(
        &route.points,
        &filters,
        &CannedSearch,
        &config,
        &EnrichmentConfig::default(),
    )
    .await;

    println!(
        "\nApplied {:?} at {} sample points: {} places",
        aggregation.applied_filters,
        aggregation.sampled_points,
        aggregation.places.len()
    );
    for place in aggregation.places.iter().take(10) {
        println!(
            "  [{:>3}] {:<24} {} rating={:?} ({:?} reviews)",
            place.sample_index,
            place.name,
            place.color.background,
            place.rating,
            place.rating_count
        );
    }
}
