//! Place enrichment: rating, review count, photo URL and current weather.
//!
//! Rating and photo come straight from the search result, so no per-place
//! detail call is made. Weather is a separate best-effort lookup per place
//! with a hard timeout; a failed lookup leaves `weather` empty and never
//! fails the enclosing pass.

use std::time::{Duration, Instant};
use futures::stream::{self, StreamExt};
use log::{debug, info, warn};
use serde_json::Value;
use url::Url;
use crate::categories::color_for;
use crate::services::{NearbyPlace, PhotoRef, WeatherProvider};
use crate::{Coordinate, Place, WeatherSnapshot};

pub const PHOTO_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/place/photo";

/// Upper bound on any single weather lookup.
pub const MAX_WEATHER_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for place enrichment.
#[derive(Debug, Clone)]
pub struct EnrichmentConfig {
    /// Credential appended to photo URLs. No key, no photo URL.
    pub photo_api_key: Option<String>,
    /// `maxwidth` requested for photos, in pixels. Default: 400
    pub photo_max_width: u32,
    /// Deadline for each weather lookup, capped at [`MAX_WEATHER_TIMEOUT`].
    /// Default: 5s
    pub weather_timeout: Duration,
    /// Weather lookups in flight at once. Default: 8
    pub max_concurrency: usize,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            photo_api_key: None,
            photo_max_width: 400,
            weather_timeout: MAX_WEATHER_TIMEOUT,
            max_concurrency: 8,
        }
    }
}

/// Coerce a reported rating to a number.
///
/// Accepts JSON numbers and numeric strings; anything else (or a non-finite
/// value) is treated as absent.
pub fn rating_from(value: &Value) -> Option<f64> {
    let rating = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    rating.is_finite().then_some(rating)
}

/// Coerce a reported review count to an integer.
///
/// Accepts non-negative integral JSON numbers, and strings holding one
/// (`"87"`, `"12.0"`).
pub fn rating_count_from(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => match n.as_u64() {
            Some(count) => u32::try_from(count).ok(),
            None => n.as_f64().and_then(integral_count),
        },
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u32>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral_count))
        }
        _ => None,
    }
}

fn integral_count(f: f64) -> Option<u32> {
    (f.is_finite() && f.fract() == 0.0 && f >= 0.0 && f <= u32::MAX as f64).then_some(f as u32)
}

/// Photo URL for the first photo carrying a reference.
///
/// Returns `None` unless both a non-empty reference and a non-empty key exist.
/// Query values are percent-encoded.
///
/// # Example
/// ```
/// use route_poi::enrichment::photo_url;
/// use route_poi::PhotoRef;
///
/// let photos = vec![PhotoRef { photo_reference: Some("abc".to_string()) }];
/// assert_eq!(
///     photo_url(&photos, Some("KEY"), 400).as_deref(),
///     Some("https://maps.googleapis.com/maps/api/place/photo?maxwidth=400&photo_reference=abc&key=KEY"),
/// );
/// assert_eq!(photo_url(&photos, None, 400), None);
/// ```
pub fn photo_url(photos: &[PhotoRef], api_key: Option<&str>, max_width: u32) -> Option<String> {
    let key = api_key.filter(|k| !k.is_empty())?;
    let reference = photos
        .iter()
        .filter_map(|p| p.photo_reference.as_deref())
        .find(|r| !r.is_empty())?;

    let params = [
        ("maxwidth", max_width.to_string()),
        ("photo_reference", reference.to_string()),
        ("key", key.to_string()),
    ];
    Url::parse_with_params(PHOTO_ENDPOINT, &params)
        .map(String::from)
        .map_err(|e| warn!("[Enrichment] Could not build photo URL: {}", e))
        .ok()
}

/// Build a [`Place`] from a search result.
///
/// Returns `None` when the result has no usable geometry. Rating fields that
/// cannot be coerced are left empty; weather is filled in later by
/// [`enrich_weather`].
pub fn build_place(
    result: &NearbyPlace,
    active_filters: &[String],
    discovered_by: &str,
    sample_index: usize,
    config: &EnrichmentConfig,
) -> Option<Place> {
    let coordinates = result.geometry.filter(Coordinate::is_valid)?;

    Some(Place {
        coordinates,
        name: result.name.clone(),
        color: color_for(&result.types, active_filters),
        rating: result.rating.as_ref().and_then(rating_from),
        rating_count: result.user_ratings_total.as_ref().and_then(rating_count_from),
        photo_url: photo_url(&result.photos, config.photo_api_key.as_deref(), config.photo_max_width),
        weather: None,
        types: result.types.clone(),
        place_id: result.place_id.clone(),
        discovered_by: discovered_by.to_string(),
        sample_index,
    })
}

/// Attach current weather to every place.
///
/// Lookups run with bounded concurrency and keep the input order. Each one is
/// cut off after `config.weather_timeout` (never more than
/// [`MAX_WEATHER_TIMEOUT`]); failures and timeouts are logged and leave that
/// place's `weather` as `None`.
pub async fn enrich_weather(
    places: Vec<Place>,
    weather: &dyn WeatherProvider,
    config: &EnrichmentConfig,
) -> Vec<Place> {
    if places.is_empty() {
        return places;
    }

    let start = Instant::now();
    let deadline = config.weather_timeout.min(MAX_WEATHER_TIMEOUT);

    let readings: Vec<Option<WeatherSnapshot>> = stream::iter(places.iter())
        .map(|place| async move {
            match tokio::time::timeout(deadline, weather.current_weather(place.coordinates)).await {
                Ok(Ok(snapshot)) => {
                    debug!("[Weather] {} -> {:?}C", place.name, snapshot.temperature_c);
                    Some(snapshot)
                }
                Ok(Err(e)) => {
                    warn!("[Weather] Lookup failed for '{}': {}", place.name, e);
                    None
                }
                Err(_) => {
                    warn!("[Weather] Lookup for '{}' timed out after {:?}", place.name, deadline);
                    None
                }
            }
        })
        .buffered(config.max_concurrency.max(1))
        .collect()
        .await;

    let found = readings.iter().filter(|r| r.is_some()).count();
    info!(
        "[Weather] {}/{} places enriched in {:.2}s",
        found,
        places.len(),
        start.elapsed().as_secs_f64()
    );

    places
        .into_iter()
        .zip(readings)
        .map(|(mut place, reading)| {
            place.weather = reading;
            place
        })
        .collect()
}
