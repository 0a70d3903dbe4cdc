//! # Place Aggregation
//!
//! Queries a nearby search for every (sampled point, filter) pair along a
//! route and flattens the answers into one ordered list of places.
//!
//! ## Algorithm
//! 1. No filters, no work: return immediately without any external call
//! 2. Apply at most `max_total_filters` filters, in the given order
//! 3. Widen the sampling step by the *requested* filter count, so asking for
//!    more filters always thins out the sample points
//! 4. For each sampled point, for each applied filter, search around the
//!    point and keep the first of the top `per_point_per_filter_cap` results
//!    that has geometry
//! 5. A failed or timed-out search skips that pair only
//!
//! Searches run through an ordered buffered stream, so up to
//! `max_concurrency` are in flight while the output keeps the sequential
//! order: ascending sample index, then applied-filter order.

use std::collections::HashSet;
use std::time::{Duration, Instant};
use futures::stream::{self, StreamExt};
use log::{debug, info, warn};
use crate::enrichment::{build_place, EnrichmentConfig};
use crate::polyline::{effective_step, sample};
use crate::services::NearbySearch;
use crate::{Coordinate, Place, ServiceError};

/// Configuration for place aggregation.
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Sampling step before widening for query load.
    /// Default: 27 points
    pub base_step: usize,

    /// Radius passed to every nearby search.
    /// Default: 5000 meters
    pub search_radius_m: u32,

    /// How many ranked results are inspected per (point, filter) pair.
    /// Only the first one with geometry is kept. Default: 3
    pub per_point_per_filter_cap: usize,

    /// Maximum number of filters queried in one pass.
    /// Default: 5
    pub max_total_filters: usize,

    /// Searches in flight at once. 1 reproduces a fully sequential pass.
    /// Default: 8
    pub max_concurrency: usize,

    /// Deadline for each nearby search.
    /// Default: 10s
    pub search_timeout: Duration,

    /// Drop places whose external id was already emitted (first one wins).
    /// Default: false
    pub dedupe_by_place_id: bool,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            base_step: 27,
            search_radius_m: 5000,
            per_point_per_filter_cap: 3,
            max_total_filters: 5,
            max_concurrency: 8,
            search_timeout: Duration::from_secs(10),
            dedupe_by_place_id: false,
        }
    }
}

/// Result of one aggregation pass.
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    /// Places in discovery order
    pub places: Vec<Place>,
    /// Filters actually queried (requested filters truncated to the cap)
    pub applied_filters: Vec<String>,
    /// Number of route points searched around
    pub sampled_points: usize,
    /// Number of (point, filter) searches that failed or timed out
    pub failed_queries: usize,
}

struct Query {
    sample_index: usize,
    location: Coordinate,
    filter: String,
}

/// Collect places along a route.
///
/// `filters` is the full requested filter list; only its first
/// `config.max_total_filters` entries are queried, but the sampling step is
/// computed from its full length. At most one place is kept per
/// (point, filter) pair. Search failures are logged and skipped.
///
/// # Example
/// ```no_run
/// # async fn run(search: &dyn route_poi::NearbySearch) {
/// use route_poi::{aggregate, AggregatorConfig, EnrichmentConfig, Route};
///
/// let route = Route::from_polyline("_p~iF~ps|U_ulLnnqC_mqNvxq`@");
/// let filters = vec!["restaurant".to_string(), "museum".to_string()];
/// let result = aggregate(
///     &route.points,
///     &filters,
///     search,
///     &AggregatorConfig::default(),
///     &EnrichmentConfig::default(),
/// )
/// .await;
/// println!("{} places from {:?}", result.places.len(), result.applied_filters);
/// # }
/// ```
pub async fn aggregate(
    points: &[Coordinate],
    filters: &[String],
    search: &dyn NearbySearch,
    config: &AggregatorConfig,
    enrichment: &EnrichmentConfig,
) -> Aggregation {
    if filters.is_empty() {
        debug!("[Aggregator] No active filters, skipping search");
        return Aggregation::default();
    }

    let applied: Vec<String> = filters.iter().take(config.max_total_filters).cloned().collect();
    let step = effective_step(config.base_step, filters.len(), config.max_total_filters);
    let samples = sample(points, step);

    if filters.len() > applied.len() {
        info!(
            "[Aggregator] {} filters requested, applying the first {}",
            filters.len(),
            applied.len()
        );
    }

    let queries: Vec<Query> = samples
        .iter()
        .flat_map(|&(sample_index, location)| {
            applied.iter().map(move |filter| Query {
                sample_index,
                location,
                filter: filter.clone(),
            })
        })
        .collect();

    info!(
        "[Aggregator] {} route points, step {}, {} samples x {} filters = {} searches",
        points.len(),
        step,
        samples.len(),
        applied.len(),
        queries.len()
    );

    let start = Instant::now();
    let timeout = config.search_timeout;
    let radius = config.search_radius_m;

    let outcomes: Vec<(&Query, Result<_, ServiceError>)> = stream::iter(queries.iter())
        .map(|query| async move {
            let result = tokio::time::timeout(timeout, search.nearby(query.location, radius, &query.filter))
                .await
                .unwrap_or(Err(ServiceError::Timeout(timeout)));
            (query, result)
        })
        .buffered(config.max_concurrency.max(1))
        .collect()
        .await;

    let mut places = Vec::new();
    let mut seen_ids: HashSet<String> = HashSet::new();
    let mut failed_queries = 0;

    for (query, result) in outcomes {
        let results = match result {
            Ok(results) => results,
            Err(e) => {
                failed_queries += 1;
                warn!(
                    "[Aggregator] Search failed at point {} ({:.5}, {:.5}) for '{}': {}",
                    query.sample_index, query.location.lat, query.location.lng, query.filter, e
                );
                continue;
            }
        };

        let found = results
            .iter()
            .take(config.per_point_per_filter_cap)
            .find_map(|r| build_place(r, &applied, &query.filter, query.sample_index, enrichment));

        let Some(place) = found else {
            debug!(
                "[Aggregator] Nothing usable at point {} for '{}' ({} results)",
                query.sample_index,
                query.filter,
                results.len()
            );
            continue;
        };

        if config.dedupe_by_place_id {
            if let Some(id) = &place.place_id {
                if !seen_ids.insert(id.clone()) {
                    debug!("[Aggregator] Dropping duplicate place {} ('{}')", id, place.name);
                    continue;
                }
            }
        }

        places.push(place);
    }

    info!(
        "[Aggregator] DONE: {} places from {} searches ({} failed) in {:.2}s",
        places.len(),
        queries.len(),
        failed_queries,
        start.elapsed().as_secs_f64()
    );

    Aggregation {
        places,
        applied_filters: applied,
        sampled_points: samples.len(),
        failed_queries,
    }
}
