//! Capability contracts for the external services.
//!
//! The aggregation and planning code only ever talks to these traits, so any
//! backend (the `http` clients, a cache, a test double) can be plugged in.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::{Coordinate, ServiceError, WeatherSnapshot};

/// A photo attached to a search result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhotoRef {
    pub photo_reference: Option<String>,
}

/// One result from a nearby search, as loosely typed as the service reports it.
///
/// `rating` and `user_ratings_total` are kept as raw JSON values; they are
/// coerced to numbers when the result becomes a [`crate::Place`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NearbyPlace {
    pub geometry: Option<Coordinate>,
    pub name: String,
    pub types: Vec<String>,
    pub rating: Option<Value>,
    pub user_ratings_total: Option<Value>,
    pub photos: Vec<PhotoRef>,
    pub place_id: Option<String>,
}

/// Turns a start and destination address into an encoded route polyline.
#[async_trait]
pub trait DirectionsProvider: Send + Sync {
    async fn route_polyline(&self, start: &str, destination: &str) -> Result<String, ServiceError>;
}

/// Turns an address into a coordinate.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<Coordinate, ServiceError>;
}

/// Finds places of one type around a coordinate.
#[async_trait]
pub trait NearbySearch: Send + Sync {
    /// Results in the order the service ranks them.
    async fn nearby(
        &self,
        location: Coordinate,
        radius_meters: u32,
        place_type: &str,
    ) -> Result<Vec<NearbyPlace>, ServiceError>;
}

/// Reports the current weather at a coordinate.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current_weather(&self, location: Coordinate) -> Result<WeatherSnapshot, ServiceError>;
}

/// Interprets free text as a comma-separated list of place-type tags.
#[async_trait]
pub trait TagClassifier: Send + Sync {
    async fn classify_tags(&self, free_text: &str) -> Result<String, ServiceError>;
}
