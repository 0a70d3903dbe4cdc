//! Test doubles for the external services.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use async_trait::async_trait;
use serde_json::json;
use crate::services::{
    DirectionsProvider, Geocoder, NearbyPlace, NearbySearch, PhotoRef, TagClassifier,
    WeatherProvider,
};
use crate::{Coordinate, ServiceError, WeatherSnapshot};

/// Straight route heading north-east out of San Diego.
pub fn straight_route(count: usize) -> Vec<Coordinate> {
    (0..count)
        .map(|i| Coordinate::new(32.7157 + i as f64 * 0.01, -117.1611 + i as f64 * 0.005))
        .collect()
}

pub fn nearby_place(name: &str, geometry: Option<Coordinate>) -> NearbyPlace {
    NearbyPlace {
        geometry,
        name: name.to_string(),
        ..Default::default()
    }
}

/// Nearby search returning `results_per_call` places per query.
///
/// The first result sits exactly on the queried location; later ones are
/// offset slightly north.
pub struct MockNearby {
    calls: Mutex<Vec<(Coordinate, String)>>,
    fail_at: Vec<Coordinate>,
    results_per_call: usize,
    first_without_geometry: bool,
    ids_shared_across_filters: bool,
}

impl MockNearby {
    pub fn new(results_per_call: usize) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_at: Vec::new(),
            results_per_call,
            first_without_geometry: false,
            ids_shared_across_filters: false,
        }
    }

    pub fn failing_at(mut self, locations: Vec<Coordinate>) -> Self {
        self.fail_at = locations;
        self
    }

    pub fn first_without_geometry(mut self) -> Self {
        self.first_without_geometry = true;
        self
    }

    pub fn ids_shared_across_filters(mut self) -> Self {
        self.ids_shared_across_filters = true;
        self
    }

    pub fn calls(&self) -> Vec<(Coordinate, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl NearbySearch for MockNearby {
    async fn nearby(
        &self,
        location: Coordinate,
        _radius_meters: u32,
        place_type: &str,
    ) -> Result<Vec<NearbyPlace>, ServiceError> {
        self.calls.lock().unwrap().push((location, place_type.to_string()));

        if self.fail_at.contains(&location) {
            return Err(ServiceError::Status(500));
        }

        Ok((0..self.results_per_call)
            .map(|k| {
                let geometry = if k == 0 && self.first_without_geometry {
                    None
                } else {
                    Some(Coordinate::new(location.lat + k as f64 * 0.001, location.lng))
                };
                let place_id = if self.ids_shared_across_filters {
                    format!("{:.5},{:.5}#{}", location.lat, location.lng, k)
                } else {
                    format!("{}@{:.5},{:.5}#{}", place_type, location.lat, location.lng, k)
                };
                NearbyPlace {
                    geometry,
                    name: format!("{} #{} near {:.4},{:.4}", place_type, k, location.lat, location.lng),
                    types: vec![place_type.to_string(), "point_of_interest".to_string()],
                    rating: Some(json!(4.2)),
                    user_ratings_total: Some(json!(310)),
                    photos: vec![PhotoRef { photo_reference: Some(format!("photo-{}", k)) }],
                    place_id: Some(place_id),
                }
            })
            .collect())
    }
}

/// Weather provider that hangs at `slow` locations and can fail everywhere.
pub struct MockWeather {
    slow: Vec<Coordinate>,
    fail_all: bool,
}

impl MockWeather {
    pub fn new() -> Self {
        Self { slow: Vec::new(), fail_all: false }
    }

    pub fn slow_at(slow: Vec<Coordinate>) -> Self {
        Self { slow, fail_all: false }
    }

    pub fn failing() -> Self {
        Self { slow: Vec::new(), fail_all: true }
    }
}

#[async_trait]
impl WeatherProvider for MockWeather {
    async fn current_weather(&self, location: Coordinate) -> Result<WeatherSnapshot, ServiceError> {
        if self.fail_all {
            return Err(ServiceError::Status(502));
        }
        if self.slow.contains(&location) {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
        Ok(WeatherSnapshot {
            temperature_c: Some(21.5),
            feels_like: Some(20.9),
            humidity: Some(64.0),
            precipitation: Some(0.0),
            weather_code: Some(1),
            wind_speed: Some(11.2),
            observation_time: Some("2025-05-03T14:00".to_string()),
        })
    }
}

pub struct MockGeocoder {
    known: HashMap<String, Coordinate>,
}

impl MockGeocoder {
    pub fn new(known: &[(&str, Coordinate)]) -> Self {
        Self {
            known: known.iter().map(|(a, c)| (a.to_string(), *c)).collect(),
        }
    }
}

#[async_trait]
impl Geocoder for MockGeocoder {
    async fn geocode(&self, address: &str) -> Result<Coordinate, ServiceError> {
        self.known
            .get(address)
            .copied()
            .ok_or_else(|| ServiceError::NoResults(address.to_string()))
    }
}

pub struct MockDirections {
    polyline: Option<String>,
}

impl MockDirections {
    pub fn returning(polyline: &str) -> Self {
        Self { polyline: Some(polyline.to_string()) }
    }

    pub fn failing() -> Self {
        Self { polyline: None }
    }
}

#[async_trait]
impl DirectionsProvider for MockDirections {
    async fn route_polyline(&self, _start: &str, _destination: &str) -> Result<String, ServiceError> {
        self.polyline
            .clone()
            .ok_or_else(|| ServiceError::Upstream("NOT_FOUND".to_string()))
    }
}

pub struct MockClassifier {
    reply: Option<String>,
    hang: bool,
    calls: AtomicU32,
}

impl MockClassifier {
    pub fn replying(reply: &str) -> Self {
        Self { reply: Some(reply.to_string()), hang: false, calls: AtomicU32::new(0) }
    }

    pub fn failing() -> Self {
        Self { reply: None, hang: false, calls: AtomicU32::new(0) }
    }

    /// Replies with `reply`, but only after a minute.
    pub fn hanging(reply: &str) -> Self {
        Self { reply: Some(reply.to_string()), hang: true, calls: AtomicU32::new(0) }
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl TagClassifier for MockClassifier {
    async fn classify_tags(&self, _free_text: &str) -> Result<String, ServiceError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if self.hang {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
        self.reply.clone().ok_or(ServiceError::Status(401))
    }
}
