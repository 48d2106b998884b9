//! LRU-caching decorator over a [`RoutingBackend`], keyed on the quantized
//! `(start, dest, profile)` triple.
//!
//! Two independent caches are kept, one for full-geometry fetches and one
//! for cheap summaries, sized asymmetrically: far more candidates are
//! summary-scored in [`crate::matching::builder`] than are ever fully
//! fetched, so the summary cache is larger.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use lru::LruCache;

use crate::geo::Coordinate;
use crate::route::{Profile, RouteData};

use super::{RoutingBackend, RoutingError, SummaryResponse};

/// Default capacity for the full-geometry route cache.
pub const DEFAULT_FULL_CACHE_CAPACITY: usize = 50_000;
/// Default capacity for the geometry-free summary cache.
pub const DEFAULT_SUMMARY_CACHE_CAPACITY: usize = 200_000;

/// Quantization precision (decimal places) used to build cache keys, ~1m.
const QUANTIZE_DECIMALS: i32 = 5;

type RouteKey = ((i64, i64), (i64, i64), Profile);

fn cache_key(start: Coordinate, dest: Coordinate, profile: Profile) -> RouteKey {
    (
        start.quantized(QUANTIZE_DECIMALS),
        dest.quantized(QUANTIZE_DECIMALS),
        profile,
    )
}

/// Caching decorator over any [`RoutingBackend`]. This is the type
/// [`crate::matching::builder::MatchBuilder`] and
/// [`crate::dispatcher::Dispatcher`] actually depend on.
pub struct CachedRoutingClient {
    backend: Arc<dyn RoutingBackend>,
    full_cache: Mutex<LruCache<RouteKey, Arc<RouteData>>>,
    summary_cache: Mutex<LruCache<RouteKey, SummaryResponse>>,
}

impl std::fmt::Debug for CachedRoutingClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedRoutingClient").finish_non_exhaustive()
    }
}

impl CachedRoutingClient {
    pub fn new(backend: Arc<dyn RoutingBackend>) -> Self {
        Self::with_capacities(
            backend,
            DEFAULT_FULL_CACHE_CAPACITY,
            DEFAULT_SUMMARY_CACHE_CAPACITY,
        )
    }

    pub fn with_capacities(
        backend: Arc<dyn RoutingBackend>,
        full_capacity: usize,
        summary_capacity: usize,
    ) -> Self {
        Self {
            backend,
            full_cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(full_capacity).expect("full cache capacity must be non-zero"),
            )),
            summary_cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(summary_capacity)
                    .expect("summary cache capacity must be non-zero"),
            )),
        }
    }

    /// Full route (geometry + per-segment metrics), memoized on the
    /// quantized `(start, dest, profile)` key. Failures are never cached.
    pub fn fetch(
        &self,
        start: Coordinate,
        dest: Coordinate,
        profile: Profile,
    ) -> Result<Arc<RouteData>, RoutingError> {
        let key = cache_key(start, dest, profile);

        if let Some(hit) = self.full_cache.lock().unwrap().get(&key) {
            return Ok(hit.clone());
        }

        let resp = self.backend.fetch(start, dest, profile)?;
        let geometry: Vec<Coordinate> = resp
            .coordinates_lat_lon
            .iter()
            .map(|(lat, lon)| Coordinate::new(*lat, *lon))
            .collect();

        let route = RouteData::new(
            start,
            dest,
            geometry,
            resp.seg_dist_m,
            resp.seg_time_s,
            profile,
        )
        .map_err(|err| RoutingError::MalformedResponse(err.to_string()))?;

        let route = Arc::new(route);
        self.full_cache.lock().unwrap().put(key, route.clone());
        Ok(route)
    }

    /// Cheap `(total_dist_m, total_time_s)` summary, memoized independently
    /// of the full-route cache.
    pub fn fetch_summary(
        &self,
        start: Coordinate,
        dest: Coordinate,
        profile: Profile,
    ) -> Result<(f64, f64), RoutingError> {
        let key = cache_key(start, dest, profile);

        if let Some(hit) = self.summary_cache.lock().unwrap().get(&key) {
            return Ok((hit.distance_m, hit.duration_s));
        }

        let resp = self.backend.fetch_summary(start, dest, profile)?;
        self.summary_cache.lock().unwrap().put(key, resp);
        Ok((resp.distance_m, resp.duration_s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::testkit::GridRoutingBackend;

    #[test]
    fn repeated_fetch_with_same_quantized_key_hits_cache() {
        let backend = Arc::new(GridRoutingBackend::new());
        let client = CachedRoutingClient::new(backend.clone());

        let a = Coordinate::new(52.52, 13.405);
        let b = Coordinate::new(52.53, 13.41);

        let r1 = client.fetch(a, b, Profile::Walking).unwrap();
        let calls_after_first = backend.full_fetch_calls();
        let r2 = client.fetch(a, b, Profile::Walking).unwrap();

        assert_eq!(r1.total_dist_m, r2.total_dist_m);
        assert_eq!(backend.full_fetch_calls(), calls_after_first);
    }

    #[test]
    fn near_identical_coordinates_share_a_cache_key() {
        let backend = Arc::new(GridRoutingBackend::new());
        let client = CachedRoutingClient::new(backend.clone());

        let a = Coordinate::new(52.520001, 13.405001);
        let a_close = Coordinate::new(52.5200014, 13.4050006);
        let b = Coordinate::new(52.53, 13.41);

        client.fetch(a, b, Profile::Walking).unwrap();
        let calls = backend.full_fetch_calls();
        client.fetch(a_close, b, Profile::Walking).unwrap();
        assert_eq!(backend.full_fetch_calls(), calls);
    }

    #[test]
    fn failures_are_not_memoized() {
        let backend = Arc::new(GridRoutingBackend::failing());
        let client = CachedRoutingClient::new(backend.clone());

        let a = Coordinate::new(0.0, 0.0);
        let b = Coordinate::new(0.0, 1.0);

        assert!(client.fetch(a, b, Profile::Walking).is_err());
        assert!(client.fetch(a, b, Profile::Walking).is_err());
        assert_eq!(backend.full_fetch_calls(), 2);
    }
}
