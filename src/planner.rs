//! Trip planning: from two addresses to an annotated list of places.
//!
//! Directions and geocoding are prerequisites, so their failures end the
//! request. Once the route exists, every later failure only shrinks the
//! result.

use std::future::Future;
use std::time::Duration;
use log::info;
use serde::{Deserialize, Serialize};
use crate::aggregator::{aggregate, AggregatorConfig};
use crate::enrichment::{enrich_weather, EnrichmentConfig};
use crate::preferences::PreferenceStore;
use crate::services::{DirectionsProvider, Geocoder, NearbySearch, WeatherProvider};
use crate::{Coordinate, Place, PlanError, Route, ServiceError};

/// A request to plan a trip.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TripRequest {
    pub start_address: String,
    pub destination_address: String,
    /// Output format hint, passed through untouched
    #[serde(default)]
    pub format: Option<String>,
}

/// A planned trip.
#[derive(Debug, Clone, Serialize)]
pub struct TripPlan {
    pub polyline: String,
    pub center_coordinate: Option<Coordinate>,
    pub places: Vec<Place>,
    pub destination_coordinate: Coordinate,
    pub start_coordinate: Coordinate,
    pub filters_in_effect: Vec<String>,
    pub filters_actually_applied: Vec<String>,
    pub route_length_m: f64,
    pub format: Option<String>,
}

/// The external services one trip needs.
#[derive(Clone, Copy)]
pub struct TripServices<'a> {
    pub directions: &'a dyn DirectionsProvider,
    pub geocoder: &'a dyn Geocoder,
    pub nearby: &'a dyn NearbySearch,
    pub weather: &'a dyn WeatherProvider,
}

#[derive(Debug, Clone)]
pub struct PlannerConfig {
    pub aggregator: AggregatorConfig,
    pub enrichment: EnrichmentConfig,
    /// Deadline for the directions and geocoding lookups. Default: 10s
    pub lookup_timeout: Duration,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            aggregator: AggregatorConfig::default(),
            enrichment: EnrichmentConfig::default(),
            lookup_timeout: Duration::from_secs(10),
        }
    }
}

/// Plan a trip using the filters currently held by `preferences`.
///
/// Fails with a 400-class [`PlanError`] when an address is blank and with a
/// 500-class one when directions or geocoding fail. Search and weather
/// failures never fail the plan.
pub async fn plan_trip(
    request: &TripRequest,
    preferences: &PreferenceStore,
    services: &TripServices<'_>,
    config: &PlannerConfig,
) -> Result<TripPlan, PlanError> {
    let start = required(&request.start_address, "start_address")?;
    let destination = required(&request.destination_address, "destination_address")?;
    let deadline = config.lookup_timeout;

    info!("[Planner] Planning '{}' -> '{}'", start, destination);

    let polyline = with_deadline(deadline, services.directions.route_polyline(start, destination))
        .await
        .map_err(PlanError::Routing)?;

    let (start_coordinate, destination_coordinate) = futures::try_join!(
        geocode(services.geocoder, start, deadline),
        geocode(services.geocoder, destination, deadline),
    )?;

    let route = Route::from_polyline(&polyline);
    let filters = preferences.get();

    let aggregation = aggregate(
        &route.points,
        filters,
        services.nearby,
        &config.aggregator,
        &config.enrichment,
    )
    .await;
    let places = enrich_weather(aggregation.places, services.weather, &config.enrichment).await;

    let route_length_m = route.length_meters();
    info!(
        "[Planner] Route of {} points ({:.1} km), {} places",
        route.points.len(),
        route_length_m / 1000.0,
        places.len()
    );

    Ok(TripPlan {
        polyline: route.encoded_polyline,
        center_coordinate: route.center,
        places,
        destination_coordinate,
        start_coordinate,
        filters_in_effect: filters.to_vec(),
        filters_actually_applied: aggregation.applied_filters,
        route_length_m,
        format: request.format.clone(),
    })
}

fn required<'a>(value: &'a str, field: &'static str) -> Result<&'a str, PlanError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(PlanError::MissingInput(field));
    }
    Ok(value)
}

async fn geocode(geocoder: &dyn Geocoder, address: &str, deadline: Duration) -> Result<Coordinate, PlanError> {
    with_deadline(deadline, geocoder.geocode(address))
        .await
        .map_err(|source| PlanError::Geocoding {
            address: address.to_string(),
            source,
        })
}

async fn with_deadline<T>(
    deadline: Duration,
    call: impl Future<Output = Result<T, ServiceError>>,
) -> Result<T, ServiceError> {
    tokio::time::timeout(deadline, call)
        .await
        .unwrap_or(Err(ServiceError::Timeout(deadline)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use crate::polyline;
    use crate::test_utils::{
        straight_route, MockClassifier, MockDirections, MockGeocoder, MockNearby, MockWeather,
    };

    const SAN_DIEGO: Coordinate = Coordinate { lat: 32.7157, lng: -117.1611 };
    const IRVINE: Coordinate = Coordinate { lat: 33.6846, lng: -117.8265 };

    fn request() -> TripRequest {
        TripRequest {
            start_address: "San Diego, CA".to_string(),
            destination_address: "Irvine, CA".to_string(),
            format: None,
        }
    }

    fn geocoder() -> MockGeocoder {
        MockGeocoder::new(&[("San Diego, CA", SAN_DIEGO), ("Irvine, CA", IRVINE)])
    }

    fn config() -> PlannerConfig {
        PlannerConfig {
            aggregator: AggregatorConfig {
                base_step: 23,
                ..AggregatorConfig::default()
            },
            ..PlannerConfig::default()
        }
    }

    async fn restaurant_preferences() -> PreferenceStore {
        let mut store = PreferenceStore::default();
        let classifier = MockClassifier::replying("restaurant");
        store
            .set(&[] as &[&str], Some("somewhere to eat"), &classifier, &mut StdRng::seed_from_u64(0))
            .await;
        store
    }

    #[tokio::test]
    async fn test_missing_address_is_bad_request() {
        let directions = MockDirections::returning("");
        let geocoder = geocoder();
        let nearby = MockNearby::new(1);
        let weather = MockWeather::new();
        let services = TripServices {
            directions: &directions,
            geocoder: &geocoder,
            nearby: &nearby,
            weather: &weather,
        };

        let mut req = request();
        req.destination_address = "   ".to_string();
        let err = plan_trip(&req, &PreferenceStore::default(), &services, &config())
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), 400);
        assert!(matches!(err, PlanError::MissingInput("destination_address")));
    }

    #[tokio::test]
    async fn test_directions_failure_is_server_error() {
        let directions = MockDirections::failing();
        let geocoder = geocoder();
        let nearby = MockNearby::new(1);
        let weather = MockWeather::new();
        let services = TripServices {
            directions: &directions,
            geocoder: &geocoder,
            nearby: &nearby,
            weather: &weather,
        };

        let err = plan_trip(&request(), &restaurant_preferences().await, &services, &config())
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), 500);
        assert!(matches!(err, PlanError::Routing(_)));
        assert_eq!(nearby.call_count(), 0);
    }

    #[tokio::test]
    async fn test_geocoding_failure_is_server_error() {
        let directions = MockDirections::returning(&polyline::encode(&straight_route(10)));
        let geocoder = MockGeocoder::new(&[("San Diego, CA", SAN_DIEGO)]);
        let nearby = MockNearby::new(1);
        let weather = MockWeather::new();
        let services = TripServices {
            directions: &directions,
            geocoder: &geocoder,
            nearby: &nearby,
            weather: &weather,
        };

        let err = plan_trip(&request(), &restaurant_preferences().await, &services, &config())
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), 500);
        match err {
            PlanError::Geocoding { address, .. } => assert_eq!(address, "Irvine, CA"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_weather_timeout_still_plans_trip() {
        let encoded = polyline::encode(&straight_route(100));
        let decoded = polyline::decode(&encoded);

        let directions = MockDirections::returning(&encoded);
        let geocoder = geocoder();
        let nearby = MockNearby::new(2);
        let weather = MockWeather::slow_at(vec![decoded[46]]);
        let services = TripServices {
            directions: &directions,
            geocoder: &geocoder,
            nearby: &nearby,
            weather: &weather,
        };

        let plan = plan_trip(&request(), &restaurant_preferences().await, &services, &config())
            .await
            .unwrap();

        assert_eq!(plan.polyline, encoded);
        assert_eq!(plan.center_coordinate, Some(decoded[50]));
        assert_eq!(plan.start_coordinate, SAN_DIEGO);
        assert_eq!(plan.destination_coordinate, IRVINE);
        assert_eq!(plan.filters_in_effect, vec!["restaurant"]);
        assert_eq!(plan.filters_actually_applied, vec!["restaurant"]);
        assert!(plan.route_length_m > 0.0);

        assert_eq!(plan.places.len(), 5);
        for place in &plan.places {
            assert!(place.rating.is_some());
            assert!(place.rating_count.is_some());
            if place.sample_index == 46 {
                assert!(place.weather.is_none());
            } else {
                assert!(place.weather.is_some());
            }
        }
    }

    #[tokio::test]
    async fn test_no_preferences_yields_no_places() {
        let directions = MockDirections::returning(&polyline::encode(&straight_route(40)));
        let geocoder = geocoder();
        let nearby = MockNearby::new(1);
        let weather = MockWeather::new();
        let services = TripServices {
            directions: &directions,
            geocoder: &geocoder,
            nearby: &nearby,
            weather: &weather,
        };

        let plan = plan_trip(&request(), &PreferenceStore::default(), &services, &config())
            .await
            .unwrap();

        assert!(plan.places.is_empty());
        assert!(plan.filters_actually_applied.is_empty());
        assert_eq!(nearby.call_count(), 0);
    }

    #[test]
    fn test_plan_serializes() {
        let plan = TripPlan {
            polyline: "_p~iF~ps|U".to_string(),
            center_coordinate: Some(Coordinate::new(38.5, -120.2)),
            places: Vec::new(),
            destination_coordinate: IRVINE,
            start_coordinate: SAN_DIEGO,
            filters_in_effect: vec!["zoo".to_string()],
            filters_actually_applied: vec!["zoo".to_string()],
            route_length_m: 0.0,
            format: Some("json".to_string()),
        };

        let value = serde_json::to_value(&plan).unwrap();
        assert_eq!(value["center_coordinate"]["lat"], 38.5);
        assert_eq!(value["filters_actually_applied"][0], "zoo");
    }
}
