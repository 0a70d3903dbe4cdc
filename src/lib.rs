//! # Route POI
//!
//! Points of interest along a driving route, annotated with category color,
//! rating, photo and live weather.
//!
//! This library provides:
//! - Encoded polyline decoding/encoding and adaptive route sampling
//! - A static category table mapping place-type filters to display colors
//! - Place aggregation over sample points with bounded, order-preserving fan-out
//! - Best-effort enrichment (rating, photo, weather) that tolerates partial failures
//!
//! ## Features
//!
//! - **`http`** - Enable HTTP clients for Google Maps, Open-Meteo and OpenRouter
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use route_poi::{categories, polyline, Route};
//!
//! let route = Route::from_polyline("_p~iF~ps|U_ulLnnqC_mqNvxq`@");
//! assert_eq!(route.points.len(), 3);
//!
//! // Every second point, starting at index 0
//! let samples = polyline::sample(&route.points, 2);
//! assert_eq!(samples.len(), 2);
//!
//! let filters = categories::expand(&["Food and Drink"]);
//! assert!(filters.contains(&"restaurant".to_string()));
//! ```
//!
//! External lookups go through the traits in [`services`]; everything that
//! touches them is async and expects to run inside a tokio runtime.

use geo::{Distance, Haversine, Point};
use serde::{Deserialize, Serialize};

pub mod aggregator;
pub mod categories;
pub mod config;
pub mod enrichment;
pub mod error;
pub mod planner;
pub mod polyline;
pub mod preferences;
pub mod services;

// HTTP clients for the external services
#[cfg(feature = "http")]
pub mod http;

#[cfg(test)]
pub(crate) mod test_utils;

pub use aggregator::{aggregate, Aggregation, AggregatorConfig};
pub use categories::{color_for, expand, Category, DEFAULT_COLOR};
pub use config::Config;
pub use enrichment::{enrich_weather, EnrichmentConfig};
pub use error::{ErrorBody, PlanError, ServiceError};
pub use planner::{plan_trip, PlannerConfig, TripPlan, TripRequest, TripServices};
pub use preferences::{FilterSet, PreferenceStore, PreferenceUpdate};
pub use services::{
    DirectionsProvider, Geocoder, NearbyPlace, NearbySearch, PhotoRef, TagClassifier,
    WeatherProvider,
};

#[cfg(feature = "http")]
pub use http::{GoogleMapsClient, OpenMeteoClient, OpenRouterClassifier};

// ============================================================================
// Core Types
// ============================================================================

/// A WGS84 coordinate.
///
/// # Example
/// ```
/// use route_poi::Coordinate;
/// let irvine = Coordinate::new(33.6846, -117.8265);
/// assert!(irvine.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    /// Create a new coordinate.
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Check if the coordinate is finite and within WGS84 ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && self.lat >= -90.0
            && self.lat <= 90.0
            && self.lng >= -180.0
            && self.lng <= 180.0
    }

    fn to_point(self) -> Point {
        Point::new(self.lng, self.lat)
    }
}

/// Marker colors as hex strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColorSpec {
    pub background: &'static str,
    pub border: &'static str,
    pub glyph: &'static str,
}

/// A best-effort point-in-time weather reading. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub temperature_c: Option<f64>,
    pub feels_like: Option<f64>,
    pub humidity: Option<f64>,
    pub precipitation: Option<f64>,
    pub weather_code: Option<i32>,
    pub wind_speed: Option<f64>,
    pub observation_time: Option<String>,
}

/// A point of interest discovered along the route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Place {
    pub coordinates: Coordinate,
    pub name: String,
    pub color: ColorSpec,
    pub rating: Option<f64>,
    pub rating_count: Option<u32>,
    pub photo_url: Option<String>,
    pub weather: Option<WeatherSnapshot>,
    /// Place types as reported by the search service, in reported order
    pub types: Vec<String>,
    /// External identifier, if the service reported one
    pub place_id: Option<String>,
    /// Filter whose query discovered this place
    pub discovered_by: String,
    /// Index of the sampled route point the query was issued from
    pub sample_index: usize,
}

/// A decoded driving route.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    /// The polyline exactly as received from the directions service
    pub encoded_polyline: String,
    /// Decoded points, in route order
    pub points: Vec<Coordinate>,
    /// Midpoint of the point sequence by index.
    ///
    /// This is a placeholder for map centering, not a geometric centroid.
    /// `None` when the route has no points.
    pub center: Option<Coordinate>,
}

impl Route {
    /// Decode a route from an encoded polyline.
    ///
    /// A malformed polyline produces a route with no points rather than an error.
    pub fn from_polyline(encoded: &str) -> Self {
        let points = polyline::decode(encoded);
        let center = points.get(points.len() / 2).copied();

        Self {
            encoded_polyline: encoded.to_string(),
            points,
            center,
        }
    }

    /// Total length of the route in meters (sum of haversine segment lengths).
    pub fn length_meters(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| Haversine::distance(w[0].to_point(), w[1].to_point()))
            .sum()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_validation() {
        assert!(Coordinate::new(32.7157, -117.1611).is_valid());
        assert!(!Coordinate::new(91.0, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, 181.0).is_valid());
        assert!(!Coordinate::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn test_route_center_is_index_midpoint() {
        let route = Route::from_polyline("_p~iF~ps|U_ulLnnqC_mqNvxq`@");
        assert_eq!(route.points.len(), 3);
        // Middle of the sequence, not the mean of the coordinates
        assert_eq!(route.center, Some(route.points[1]));
    }

    #[test]
    fn test_empty_route() {
        let route = Route::from_polyline("");
        assert!(route.points.is_empty());
        assert_eq!(route.center, None);
        assert_eq!(route.length_meters(), 0.0);
    }

    #[test]
    fn test_route_length() {
        let route = Route::from_polyline("_p~iF~ps|U_ulLnnqC_mqNvxq`@");
        // (38.5,-120.2) -> (40.7,-120.95) -> (43.252,-126.453) is roughly 250km + 530km
        let length = route.length_meters();
        assert!(length > 700_000.0 && length < 850_000.0, "got {}", length);
    }
}
