//! HTTP clients for the external services.
//!
//! - [`GoogleMapsClient`]: directions, geocoding and nearby search
//! - [`OpenMeteoClient`]: current weather
//! - [`OpenRouterClassifier`]: free text to place-type tags
//!
//! Every client uses a pooled `reqwest` client with a per-request timeout.
//! Nothing is retried here: a failed call is reported as a [`ServiceError`]
//! and the caller decides what that means.

use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{Duration, Instant};
use crate::categories::all_place_types;
use crate::services::{
    DirectionsProvider, Geocoder, NearbyPlace, NearbySearch, PhotoRef, TagClassifier,
    WeatherProvider,
};
use crate::{Coordinate, ServiceError, WeatherSnapshot};

const GOOGLE_MAPS_BASE: &str = "https://maps.googleapis.com/maps/api";
const OPEN_METEO_URL: &str = "https://api.open-meteo.com/v1/forecast";
const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
const OPEN_METEO_FIELDS: &str =
    "temperature_2m,apparent_temperature,relative_humidity_2m,precipitation,weather_code,wind_speed_10m";
const MAX_IDLE_PER_HOST: usize = 16;

impl From<reqwest::Error> for ServiceError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => ServiceError::Status(status.as_u16()),
            None => ServiceError::Transport(e.to_string()),
        }
    }
}

fn build_client(timeout: Duration) -> Result<Client, ServiceError> {
    Client::builder()
        .pool_max_idle_per_host(MAX_IDLE_PER_HOST)
        .pool_idle_timeout(Duration::from_secs(60))
        .tcp_keepalive(Duration::from_secs(30))
        .timeout(timeout)
        .build()
        .map_err(ServiceError::from)
}

/// Send a request and decode a JSON body, treating non-2xx as an error.
async fn fetch_json<T: DeserializeOwned>(request: RequestBuilder, what: &str) -> Result<T, ServiceError> {
    let start = Instant::now();
    let response = request.send().await?;
    let status = response.status();

    if !status.is_success() {
        warn!("[HTTP] {} returned {} after {:?}", what, status, start.elapsed());
        return Err(ServiceError::Status(status.as_u16()));
    }

    let bytes = response.bytes().await?;
    debug!(
        "[HTTP] {} ok in {:?} ({:.1}KB)",
        what,
        start.elapsed(),
        bytes.len() as f64 / 1024.0
    );
    Ok(serde_json::from_slice(&bytes)?)
}

// ============================================================================
// Google Maps Platform
// ============================================================================

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: Option<LatLng>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    status: String,
    #[serde(default)]
    routes: Vec<DirectionsRoute>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DirectionsRoute {
    overview_polyline: OverviewPolyline,
}

#[derive(Debug, Deserialize)]
struct OverviewPolyline {
    points: String,
}

#[derive(Debug, Deserialize)]
struct NearbyResponse {
    status: String,
    #[serde(default)]
    results: Vec<NearbyResult>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NearbyResult {
    geometry: Option<Geometry>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    types: Vec<String>,
    rating: Option<Value>,
    user_ratings_total: Option<Value>,
    #[serde(default)]
    photos: Vec<PhotoRef>,
    place_id: Option<String>,
}

impl From<NearbyResult> for NearbyPlace {
    fn from(r: NearbyResult) -> Self {
        NearbyPlace {
            geometry: r
                .geometry
                .and_then(|g| g.location)
                .map(|l| Coordinate::new(l.lat, l.lng)),
            name: r.name,
            types: r.types,
            rating: r.rating,
            user_ratings_total: r.user_ratings_total,
            photos: r.photos,
            place_id: r.place_id,
        }
    }
}

/// Map a Google API status field onto a result. `ZERO_RESULTS` counts as
/// success here; callers decide whether an empty answer is an error.
fn check_status(status: &str, error_message: Option<String>) -> Result<(), ServiceError> {
    match status {
        "OK" | "ZERO_RESULTS" => Ok(()),
        other => Err(ServiceError::Upstream(match error_message {
            Some(msg) => format!("{}: {}", other, msg),
            None => other.to_string(),
        })),
    }
}

fn parse_geocode(response: GeocodeResponse, address: &str) -> Result<Coordinate, ServiceError> {
    check_status(&response.status, response.error_message)?;
    response
        .results
        .into_iter()
        .find_map(|r| r.geometry.location)
        .map(|l| Coordinate::new(l.lat, l.lng))
        .ok_or_else(|| ServiceError::NoResults(address.to_string()))
}

fn parse_directions(response: DirectionsResponse, query: &str) -> Result<String, ServiceError> {
    check_status(&response.status, response.error_message)?;
    response
        .routes
        .into_iter()
        .next()
        .map(|r| r.overview_polyline.points)
        .ok_or_else(|| ServiceError::NoResults(query.to_string()))
}

fn parse_nearby(response: NearbyResponse) -> Result<Vec<NearbyPlace>, ServiceError> {
    check_status(&response.status, response.error_message)?;
    Ok(response.results.into_iter().map(NearbyPlace::from).collect())
}

/// Google Maps Platform client (Directions, Geocoding, Places Nearby Search).
pub struct GoogleMapsClient {
    client: Client,
    api_key: String,
}

impl GoogleMapsClient {
    /// Create a client with the given API key and per-request timeout.
    pub fn new(api_key: &str, timeout: Duration) -> Result<Self, ServiceError> {
        if api_key.trim().is_empty() {
            return Err(ServiceError::MissingCredential("Google Maps"));
        }

        Ok(Self {
            client: build_client(timeout)?,
            api_key: api_key.trim().to_string(),
        })
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    fn endpoint(path: &str) -> String {
        format!("{}/{}", GOOGLE_MAPS_BASE, path)
    }
}

#[async_trait]
impl DirectionsProvider for GoogleMapsClient {
    async fn route_polyline(&self, start: &str, destination: &str) -> Result<String, ServiceError> {
        let request = self.client.get(Self::endpoint("directions/json")).query(&[
            ("origin", start),
            ("destination", destination),
            ("mode", "driving"),
            ("key", self.api_key.as_str()),
        ]);
        let response: DirectionsResponse = fetch_json(request, "directions").await?;
        let polyline = parse_directions(response, &format!("{} -> {}", start, destination))?;
        info!("[GoogleMaps] Route '{}' -> '{}': {} polyline bytes", start, destination, polyline.len());
        Ok(polyline)
    }
}

#[async_trait]
impl Geocoder for GoogleMapsClient {
    async fn geocode(&self, address: &str) -> Result<Coordinate, ServiceError> {
        let request = self
            .client
            .get(Self::endpoint("geocode/json"))
            .query(&[("address", address), ("key", self.api_key.as_str())]);
        let response: GeocodeResponse = fetch_json(request, "geocode").await?;
        parse_geocode(response, address)
    }
}

#[async_trait]
impl NearbySearch for GoogleMapsClient {
    async fn nearby(
        &self,
        location: Coordinate,
        radius_meters: u32,
        place_type: &str,
    ) -> Result<Vec<NearbyPlace>, ServiceError> {
        let request = self.client.get(Self::endpoint("place/nearbysearch/json")).query(&[
            ("location", format!("{},{}", location.lat, location.lng)),
            ("radius", radius_meters.to_string()),
            ("type", place_type.to_string()),
            ("key", self.api_key.clone()),
        ]);
        let response: NearbyResponse = fetch_json(request, "nearby search").await?;
        let places = parse_nearby(response)?;
        debug!(
            "[GoogleMaps] {} '{}' results near ({:.5}, {:.5})",
            places.len(),
            place_type,
            location.lat,
            location.lng
        );
        Ok(places)
    }
}

// ============================================================================
// Open-Meteo
// ============================================================================

#[derive(Debug, Deserialize)]
struct OpenMeteoResponse {
    current: Option<OpenMeteoCurrent>,
}

#[derive(Debug, Deserialize)]
struct OpenMeteoCurrent {
    time: Option<String>,
    temperature_2m: Option<f64>,
    apparent_temperature: Option<f64>,
    relative_humidity_2m: Option<f64>,
    precipitation: Option<f64>,
    weather_code: Option<i32>,
    wind_speed_10m: Option<f64>,
}

fn parse_weather(response: OpenMeteoResponse) -> Result<WeatherSnapshot, ServiceError> {
    let current = response
        .current
        .ok_or_else(|| ServiceError::NoResults("current weather".to_string()))?;

    Ok(WeatherSnapshot {
        temperature_c: current.temperature_2m,
        feels_like: current.apparent_temperature,
        humidity: current.relative_humidity_2m,
        precipitation: current.precipitation,
        weather_code: current.weather_code,
        wind_speed: current.wind_speed_10m,
        observation_time: current.time,
    })
}

/// Open-Meteo current-conditions client. No API key required.
pub struct OpenMeteoClient {
    client: Client,
}

impl OpenMeteoClient {
    pub fn new(timeout: Duration) -> Result<Self, ServiceError> {
        Ok(Self {
            client: build_client(timeout)?,
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoClient {
    async fn current_weather(&self, location: Coordinate) -> Result<WeatherSnapshot, ServiceError> {
        let request = self.client.get(OPEN_METEO_URL).query(&[
            ("latitude", location.lat.to_string()),
            ("longitude", location.lng.to_string()),
            ("current", OPEN_METEO_FIELDS.to_string()),
        ]);
        let response: OpenMeteoResponse = fetch_json(request, "weather").await?;
        parse_weather(response)
    }
}

// ============================================================================
// OpenRouter tag classifier
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

fn parse_chat(response: ChatResponse) -> Result<String, ServiceError> {
    response
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.content.unwrap_or_default())
        .ok_or_else(|| ServiceError::NoResults("chat completion".to_string()))
}

fn system_prompt() -> String {
    let vocabulary = all_place_types()
        .map(|t| format!("'{}'", t))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "You are a road-trip helper. Given a traveller's description of their ideal journey, \
         choose the best matching place-type filters from this list: {}.\n\
         Reply with a comma-separated list of filters and nothing else, for example: \
         bakery,aquarium,museum,zoo\n\
         Use only filters from the list. If nothing in the list fits, reply with an empty string.",
        vocabulary
    )
}

/// Tag classifier backed by an OpenRouter chat model.
pub struct OpenRouterClassifier {
    client: Client,
    api_key: String,
    model: String,
    system_prompt: String,
}

impl OpenRouterClassifier {
    pub fn new(api_key: &str, model: &str, timeout: Duration) -> Result<Self, ServiceError> {
        if api_key.trim().is_empty() {
            return Err(ServiceError::MissingCredential("OpenRouter"));
        }

        Ok(Self {
            client: build_client(timeout)?,
            api_key: api_key.trim().to_string(),
            model: model.to_string(),
            system_prompt: system_prompt(),
        })
    }
}

#[async_trait]
impl TagClassifier for OpenRouterClassifier {
    async fn classify_tags(&self, free_text: &str) -> Result<String, ServiceError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: &self.system_prompt },
                ChatMessage { role: "user", content: free_text },
            ],
        };
        let request = self
            .client
            .post(OPENROUTER_URL)
            .bearer_auth(&self.api_key)
            .json(&body);
        let response: ChatResponse = fetch_json(request, "tag classification").await?;
        let reply = parse_chat(response)?;
        info!("[OpenRouter] {} classified '{}' as '{}'", self.model, free_text, reply.trim());
        Ok(reply)
    }
}
