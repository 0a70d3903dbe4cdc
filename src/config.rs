//! # Config
//!
//! Settings for the external services and the aggregation pass, read from
//! the environment (and a `.env` file when present).

use std::time::Duration;
use config::{ConfigError, Environment};
use dotenv::dotenv;
use serde::Deserialize;
use crate::aggregator::AggregatorConfig;
use crate::enrichment::{EnrichmentConfig, MAX_WEATHER_TIMEOUT};
use crate::planner::PlannerConfig;

/// struct holding configuration options
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Google Maps Platform key (directions, geocoding, places, photos)
    pub google_api_key: String,

    /// OpenRouter key for the tag classifier
    pub openrouter_api_key: String,

    /// chat model used by the tag classifier
    pub classifier_model: String,

    /// sampling step before widening for query load
    pub base_step: usize,

    /// nearby search radius in meters
    pub search_radius_m: u32,

    /// results inspected per (point, filter) pair
    pub per_point_per_filter_cap: usize,

    /// filters applied per aggregation pass
    pub max_total_filters: usize,

    /// searches or weather lookups in flight at once
    pub max_concurrency: usize,

    /// deadline for directions, geocoding and nearby search calls
    pub request_timeout_ms: u64,

    /// deadline for each weather lookup, capped at 5000
    pub weather_timeout_ms: u64,

    /// deadline for tag classification
    pub classifier_timeout_ms: u64,

    /// requested photo width in pixels
    pub photo_max_width: u32,

    /// drop repeated places by external id
    pub dedupe_places: bool,
}

impl Default for Config {
    fn default() -> Self {
        log::warn!("(default) Creating Config object with default values.");
        Self::new()
    }
}

impl Config {
    /// Default values for Config
    pub fn new() -> Self {
        Config {
            google_api_key: String::new(),
            openrouter_api_key: String::new(),
            classifier_model: String::from("deepseek/deepseek-chat-v3-0324"),
            base_step: 27,
            search_radius_m: 5000,
            per_point_per_filter_cap: 3,
            max_total_filters: 5,
            max_concurrency: 8,
            request_timeout_ms: 10_000,
            weather_timeout_ms: 5_000,
            classifier_timeout_ms: 15_000,
            photo_max_width: 400,
            dedupe_places: false,
        }
    }

    /// Create a new `Config` object using environment variables
    pub fn try_from_env() -> Result<Self, ConfigError> {
        // read .env file if present
        dotenv().ok();
        let default_config = Config::new();

        config::Config::builder()
            .set_default("google_api_key", default_config.google_api_key)?
            .set_default("openrouter_api_key", default_config.openrouter_api_key)?
            .set_default("classifier_model", default_config.classifier_model)?
            .set_default("base_step", default_config.base_step as i64)?
            .set_default("search_radius_m", default_config.search_radius_m as i64)?
            .set_default("per_point_per_filter_cap", default_config.per_point_per_filter_cap as i64)?
            .set_default("max_total_filters", default_config.max_total_filters as i64)?
            .set_default("max_concurrency", default_config.max_concurrency as i64)?
            .set_default("request_timeout_ms", default_config.request_timeout_ms as i64)?
            .set_default("weather_timeout_ms", default_config.weather_timeout_ms as i64)?
            .set_default("classifier_timeout_ms", default_config.classifier_timeout_ms as i64)?
            .set_default("photo_max_width", default_config.photo_max_width as i64)?
            .set_default("dedupe_places", default_config.dedupe_places)?
            .add_source(Environment::default().separator("__"))
            .build()?
            .try_deserialize()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Weather deadline, capped at [`MAX_WEATHER_TIMEOUT`].
    pub fn weather_timeout(&self) -> Duration {
        let configured = Duration::from_millis(self.weather_timeout_ms);
        if configured > MAX_WEATHER_TIMEOUT {
            log::warn!(
                "(weather_timeout) {}ms exceeds the {:?} cap, using the cap.",
                self.weather_timeout_ms,
                MAX_WEATHER_TIMEOUT
            );
            return MAX_WEATHER_TIMEOUT;
        }
        configured
    }

    pub fn classifier_timeout(&self) -> Duration {
        Duration::from_millis(self.classifier_timeout_ms)
    }

    pub fn aggregator_config(&self) -> AggregatorConfig {
        AggregatorConfig {
            base_step: self.base_step,
            search_radius_m: self.search_radius_m,
            per_point_per_filter_cap: self.per_point_per_filter_cap,
            max_total_filters: self.max_total_filters,
            max_concurrency: self.max_concurrency,
            search_timeout: self.request_timeout(),
            dedupe_by_place_id: self.dedupe_places,
        }
    }

    pub fn enrichment_config(&self) -> EnrichmentConfig {
        EnrichmentConfig {
            photo_api_key: Some(self.google_api_key.clone()).filter(|k| !k.is_empty()),
            photo_max_width: self.photo_max_width,
            weather_timeout: self.weather_timeout(),
            max_concurrency: self.max_concurrency,
        }
    }

    pub fn planner_config(&self) -> PlannerConfig {
        PlannerConfig {
            aggregator: self.aggregator_config(),
            enrichment: self.enrichment_config(),
            lookup_timeout: self.request_timeout(),
        }
    }
}
