//! Spatial primitives: coordinates and cached great-circle distance.
//!
//! This module provides:
//!
//! - **Coordinate**: a plain WGS-84 lat/lon pair
//! - **Quantization**: rounding used to build routing cache keys
//! - **Distance calculations**: haversine distance between coordinates, LRU-cached

use std::num::NonZeroUsize;
use std::sync::{Mutex, OnceLock};

use lru::LruCache;
use serde::{Deserialize, Serialize};

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A WGS-84 coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Round to `p` decimal places. `p = 5` is ~1m precision and is what the
    /// routing cache keys on.
    pub fn quantized(&self, p: i32) -> (i64, i64) {
        (quantize(self.lat, p), quantize(self.lon, p))
    }
}

fn quantize(x: f64, p: i32) -> i64 {
    let scale = 10f64.powi(p);
    (x * scale).round() as i64
}

fn quantized_bits(x: f64) -> u64 {
    // round to 5 decimal places before hashing/ordering so near-identical
    // floats produced by independent computations still collide.
    let q = quantize(x, 5) as f64 / 1e5;
    q.to_bits()
}

/// Uncached distance calculation (internal use).
fn haversine_m_uncached(a: Coordinate, b: Coordinate) -> f64 {
    let (lat1, lon1) = (a.lat.to_radians(), a.lon.to_radians());
    let (lat2, lon2) = (b.lat.to_radians(), b.lon.to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let sin_dlat = (dlat * 0.5).sin();
    let sin_dlon = (dlon * 0.5).sin();
    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_M * c
}

/// Symmetric, quantized cache key for a pair of coordinates.
type DistanceKey = ((u64, u64), (u64, u64));

fn distance_key(a: Coordinate, b: Coordinate) -> DistanceKey {
    let ka = (quantized_bits(a.lat), quantized_bits(a.lon));
    let kb = (quantized_bits(b.lat), quantized_bits(b.lon));
    if ka <= kb {
        (ka, kb)
    } else {
        (kb, ka)
    }
}

/// Global distance cache (20,000 entries).
fn get_distance_cache() -> &'static Mutex<LruCache<DistanceKey, f64>> {
    static CACHE: OnceLock<Mutex<LruCache<DistanceKey, f64>>> = OnceLock::new();
    CACHE.get_or_init(|| {
        Mutex::new(LruCache::new(
            NonZeroUsize::new(20_000).expect("cache size must be non-zero"),
        ))
    })
}

/// Haversine distance between two coordinates, in meters, with LRU caching.
///
/// Uses a global LRU cache keyed symmetrically so repeated candidate-scoring
/// calls against the same pair of points (in either order) hit the cache.
pub fn haversine_m(a: Coordinate, b: Coordinate) -> f64 {
    let key = distance_key(a, b);
    let mut cache = get_distance_cache().lock().unwrap();
    *cache.get_or_insert(key, || haversine_m_uncached(a, b))
}
