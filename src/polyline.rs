//! # Polyline Sampling
//!
//! Encoded polyline codec and route sampling.
//!
//! ## Overview
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`decode`] | Encoded polyline to an ordered list of coordinates |
//! | [`encode`] | Coordinates back to an encoded polyline |
//! | [`sample`] | Every `step`-th point, starting at index 0 |
//! | [`effective_step`] | Sampling step widened by the number of requested filters |
//!
//! ## Example
//!
//! ```rust
//! use route_poi::polyline;
//!
//! let points = polyline::decode("_p~iF~ps|U_ulLnnqC_mqNvxq`@");
//! assert_eq!(points.len(), 3);
//! assert!((points[0].lat - 38.5).abs() < 1e-9);
//!
//! // Three filters with a cap of two per request doubles the step
//! let step = polyline::effective_step(27, 3, 2);
//! assert_eq!(step, 54);
//! ```
//!
//! ## Format Notes
//!
//! The encoding stores each coordinate as the delta from the previous one,
//! scaled by 1e5 and rounded. Each signed delta is zig-zag folded, split into
//! 5-bit chunks (least significant first), and every chunk except the last
//! carries the `0x20` continuation bit. Chunks are offset by 63 so the output
//! stays in the printable range `'?'..='~'`.
//!
//! Reference: [Encoded Polyline Algorithm Format](https://developers.google.com/maps/documentation/utilities/polylinealgorithm)

use log::{debug, warn};
use crate::Coordinate;

const PRECISION: f64 = 1e5;
const CHUNK_OFFSET: u8 = 63;
const CONTINUATION: i64 = 0x20;
const CHUNK_MASK: i64 = 0x1f;

// =============================================================================
// Codec
// =============================================================================

/// Decode an encoded polyline into coordinates.
///
/// Decoding never fails the caller: an empty string, a character outside the
/// encoding alphabet, a truncated value or a latitude without its longitude
/// all produce an empty list (and a warning in the log).
///
/// # Example
///
/// ```rust
/// use route_poi::polyline;
///
/// assert!(polyline::decode("").is_empty());
/// assert!(polyline::decode("not a polyline!").is_empty());
/// ```
pub fn decode(encoded: &str) -> Vec<Coordinate> {
    if encoded.is_empty() {
        return Vec::new();
    }

    match try_decode(encoded.as_bytes()) {
        Some(points) => {
            debug!("[Polyline] Decoded {} points from {} bytes", points.len(), encoded.len());
            points
        }
        None => {
            warn!("[Polyline] Malformed polyline ({} bytes), treating as empty route", encoded.len());
            Vec::new()
        }
    }
}

fn try_decode(bytes: &[u8]) -> Option<Vec<Coordinate>> {
    let mut index = 0;
    let mut lat: i64 = 0;
    let mut lng: i64 = 0;
    let mut points = Vec::new();

    while index < bytes.len() {
        lat = lat.checked_add(next_value(bytes, &mut index)?)?;
        lng = lng.checked_add(next_value(bytes, &mut index)?)?;
        points.push(Coordinate::new(lat as f64 / PRECISION, lng as f64 / PRECISION));
    }

    Some(points)
}

/// Read one zig-zag encoded value starting at `index`, advancing it.
fn next_value(bytes: &[u8], index: &mut usize) -> Option<i64> {
    let mut result: i64 = 0;
    let mut shift: u32 = 0;

    loop {
        let byte = *bytes.get(*index)?;
        *index += 1;

        if !(CHUNK_OFFSET..=b'~').contains(&byte) {
            return None;
        }
        // 13 chunks already exceed any 64-bit value
        if shift > 60 {
            return None;
        }

        let chunk = (byte - CHUNK_OFFSET) as i64;
        result |= (chunk & CHUNK_MASK) << shift;
        shift += 5;

        if chunk & CONTINUATION == 0 {
            break;
        }
    }

    Some(if result & 1 != 0 { !(result >> 1) } else { result >> 1 })
}

/// Encode coordinates as a polyline with 5 decimal places of precision.
///
/// Points outside WGS84 ranges (or non-finite) are skipped with a warning.
///
/// # Example
///
/// ```rust
/// use route_poi::{polyline, Coordinate};
///
/// let points = vec![
///     Coordinate::new(38.5, -120.2),
///     Coordinate::new(40.7, -120.95),
///     Coordinate::new(43.252, -126.453),
/// ];
/// assert_eq!(polyline::encode(&points), "_p~iF~ps|U_ulLnnqC_mqNvxq`@");
/// ```
pub fn encode(points: &[Coordinate]) -> String {
    let mut out = String::with_capacity(points.len() * 8);
    let mut prev_lat: i64 = 0;
    let mut prev_lng: i64 = 0;

    let mut skipped = 0;

    for p in points {
        if !p.is_valid() {
            skipped += 1;
            continue;
        }
        let lat = (p.lat * PRECISION).round() as i64;
        let lng = (p.lng * PRECISION).round() as i64;
        push_value(lat - prev_lat, &mut out);
        push_value(lng - prev_lng, &mut out);
        prev_lat = lat;
        prev_lng = lng;
    }

    if skipped > 0 {
        warn!("[Polyline] Skipped {} invalid points while encoding", skipped);
    }

    out
}

fn push_value(value: i64, out: &mut String) {
    let mut folded = if value < 0 { !(value << 1) } else { value << 1 };

    while folded >= CONTINUATION {
        out.push(((CONTINUATION | (folded & CHUNK_MASK)) as u8 + CHUNK_OFFSET) as char);
        folded >>= 5;
    }
    out.push((folded as u8 + CHUNK_OFFSET) as char);
}

// =============================================================================
// Sampling
// =============================================================================

/// Take every `step`-th point starting at index 0, keeping the original index.
///
/// Produces `ceil(points.len() / step)` samples. A `step` of 0 is treated as 1.
///
/// # Example
///
/// ```rust
/// use route_poi::{polyline, Coordinate};
///
/// let points: Vec<Coordinate> = (0..10)
///     .map(|i| Coordinate::new(33.0 + i as f64 * 0.01, -117.0))
///     .collect();
///
/// let indices: Vec<usize> = polyline::sample(&points, 4).iter().map(|(i, _)| *i).collect();
/// assert_eq!(indices, vec![0, 4, 8]);
/// ```
pub fn sample(points: &[Coordinate], step: usize) -> Vec<(usize, Coordinate)> {
    points
        .iter()
        .copied()
        .enumerate()
        .step_by(step.max(1))
        .collect()
}

/// Sampling step for a query load of `filter_count` filters.
///
/// `base_step * max(1, 1 + floor(filter_count / max_filters_per_request))`, so
/// density drops as more filters are requested, bounding the total number of
/// external queries (`samples × filters`). A cap of 0 is treated as 1.
#[inline]
pub fn effective_step(base_step: usize, filter_count: usize, max_filters_per_request: usize) -> usize {
    let multiplier = (1 + filter_count / max_filters_per_request.max(1)).max(1);
    base_step.max(1) * multiplier
}

// =============================================================================
// Unit Tests
// =============================================================================
