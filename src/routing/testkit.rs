//! Deterministic, in-memory [`RoutingBackend`] fakes for tests and
//! benchmarks, following the convention of a `test_helpers`-style module
//! colocated with the crate rather than bolted onto `tests/`.
//!
//! [`GridRoutingBackend`] synthesizes a straight-line polyline between any
//! two points at a fixed speed for the profile, so tests get reproducible
//! distances/times without a network dependency.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::geo::{haversine_m, Coordinate};
use crate::route::Profile;

use super::response::{RouteResponse, SummaryResponse};
use super::{RoutingBackend, RoutingError};

const DRIVING_SPEED_MPS: f64 = 13.9; // ~50 km/h
const WALKING_SPEED_MPS: f64 = 1.4; // ~5 km/h

fn speed_for(profile: Profile) -> f64 {
    match profile {
        Profile::Driving => DRIVING_SPEED_MPS,
        Profile::Walking => WALKING_SPEED_MPS,
    }
}

/// A backend that synthesizes a straight line of `segments` hops between
/// `start` and `dest`, at a fixed per-profile speed. Optionally always fails,
/// to exercise error paths.
pub struct GridRoutingBackend {
    segments: usize,
    always_fail: bool,
    full_fetch_calls: AtomicU64,
    summary_fetch_calls: AtomicU64,
    /// Optional fixed override routes keyed by `(start, dest)` for tests
    /// that need a specific non-straight-line polyline.
    overrides: Mutex<Vec<(Coordinate, Coordinate, Profile, RouteResponse)>>,
}

impl GridRoutingBackend {
    pub fn new() -> Self {
        Self {
            segments: 8,
            always_fail: false,
            full_fetch_calls: AtomicU64::new(0),
            summary_fetch_calls: AtomicU64::new(0),
            overrides: Mutex::new(Vec::new()),
        }
    }

    pub fn with_segments(segments: usize) -> Self {
        Self {
            segments,
            ..Self::new()
        }
    }

    pub fn failing() -> Self {
        Self {
            always_fail: true,
            ..Self::new()
        }
    }

    pub fn full_fetch_calls(&self) -> u64 {
        self.full_fetch_calls.load(Ordering::SeqCst)
    }

    pub fn summary_fetch_calls(&self) -> u64 {
        self.summary_fetch_calls.load(Ordering::SeqCst)
    }

    /// Register an exact response for a given `(start, dest, profile)`,
    /// bypassing straight-line synthesis. Useful for constructing scenarios
    /// with a specific detour shape.
    pub fn with_override(
        self,
        start: Coordinate,
        dest: Coordinate,
        profile: Profile,
        response: RouteResponse,
    ) -> Self {
        self.overrides
            .lock()
            .unwrap()
            .push((start, dest, profile, response));
        self
    }

    fn find_override(
        &self,
        start: Coordinate,
        dest: Coordinate,
        profile: Profile,
    ) -> Option<RouteResponse> {
        self.overrides
            .lock()
            .unwrap()
            .iter()
            .find(|(s, d, p, _)| coords_close(*s, start) && coords_close(*d, dest) && *p == profile)
            .map(|(_, _, _, resp)| resp.clone())
    }

    fn synthesize(&self, start: Coordinate, dest: Coordinate, profile: Profile) -> RouteResponse {
        let n = self.segments.max(1);
        let mut coords = Vec::with_capacity(n + 1);
        for i in 0..=n {
            let alpha = i as f64 / n as f64;
            coords.push((
                start.lat + alpha * (dest.lat - start.lat),
                start.lon + alpha * (dest.lon - start.lon),
            ));
        }

        let speed = speed_for(profile);
        let mut seg_dist_m = Vec::with_capacity(n);
        let mut seg_time_s = Vec::with_capacity(n);
        for w in coords.windows(2) {
            let (a, b) = (
                Coordinate::new(w[0].0, w[0].1),
                Coordinate::new(w[1].0, w[1].1),
            );
            let d = haversine_m(a, b);
            seg_dist_m.push(d);
            seg_time_s.push(d / speed);
        }

        let total_dist_m: f64 = seg_dist_m.iter().sum();
        let total_time_s: f64 = seg_time_s.iter().sum();

        RouteResponse {
            distance_m: total_dist_m,
            duration_s: total_time_s,
            coordinates_lat_lon: coords,
            seg_dist_m,
            seg_time_s,
        }
    }
}

impl Default for GridRoutingBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn coords_close(a: Coordinate, b: Coordinate) -> bool {
    (a.lat - b.lat).abs() < 1e-6 && (a.lon - b.lon).abs() < 1e-6
}

impl RoutingBackend for GridRoutingBackend {
    fn fetch(
        &self,
        start: Coordinate,
        dest: Coordinate,
        profile: Profile,
    ) -> Result<RouteResponse, RoutingError> {
        self.full_fetch_calls.fetch_add(1, Ordering::SeqCst);
        if self.always_fail {
            return Err(RoutingError::Upstream("synthetic failure".into()));
        }
        Ok(self
            .find_override(start, dest, profile)
            .unwrap_or_else(|| self.synthesize(start, dest, profile)))
    }

    fn fetch_summary(
        &self,
        start: Coordinate,
        dest: Coordinate,
        profile: Profile,
    ) -> Result<SummaryResponse, RoutingError> {
        self.summary_fetch_calls.fetch_add(1, Ordering::SeqCst);
        if self.always_fail {
            return Err(RoutingError::Upstream("synthetic failure".into()));
        }
        let full = self
            .find_override(start, dest, profile)
            .unwrap_or_else(|| self.synthesize(start, dest, profile));
        Ok(SummaryResponse {
            distance_m: full.distance_m,
            duration_s: full.duration_s,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthesized_route_has_requested_segment_count() {
        let backend = GridRoutingBackend::with_segments(4);
        let resp = backend
            .fetch(
                Coordinate::new(0.0, 0.0),
                Coordinate::new(0.0, 1.0),
                Profile::Walking,
            )
            .unwrap();
        assert_eq!(resp.coordinates_lat_lon.len(), 5);
        assert_eq!(resp.seg_dist_m.len(), 4);
    }

    #[test]
    fn failing_backend_always_errors() {
        let backend = GridRoutingBackend::failing();
        assert!(backend
            .fetch(
                Coordinate::new(0.0, 0.0),
                Coordinate::new(0.0, 1.0),
                Profile::Walking
            )
            .is_err());
    }
}
