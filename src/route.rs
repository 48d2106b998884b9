//! Immutable polylines with per-segment distance/time and position-at-time
//! interpolation.

use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;

/// Which upstream routing profile a [`RouteData`] was built against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    Driving,
    Walking,
}

/// Errors building or querying a [`RouteData`].
#[derive(Debug, Clone, PartialEq)]
pub enum RouteError {
    /// Fewer than two geometry points; a route needs at least a start and end.
    EmptyRoute,
    /// The per-segment/prefix-sum arrays don't agree in length with the geometry.
    MalformedArrays,
    /// A prefix sum went backwards, which should be impossible for a well-formed route.
    NonMonotonicPrefixSum,
}

impl std::fmt::Display for RouteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouteError::EmptyRoute => write!(f, "route geometry has fewer than 2 points"),
            RouteError::MalformedArrays => {
                write!(f, "route segment/prefix arrays do not match geometry length")
            }
            RouteError::NonMonotonicPrefixSum => {
                write!(f, "route prefix sums are not non-decreasing")
            }
        }
    }
}

impl std::error::Error for RouteError {}

fn cum_array(values: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len() + 1);
    out.push(0.0);
    let mut running = 0.0;
    for v in values {
        running += v;
        out.push(running);
    }
    out
}

/// An immutable route: geometry plus derived per-segment and cumulative
/// distance/time arrays. Once built, never mutated; safe to share behind an
/// [`std::sync::Arc`] between every [`crate::agent::Agent`] and
/// [`crate::matching::types::Match`] that reference it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteData {
    pub start: Coordinate,
    pub dest: Coordinate,
    pub geometry: Vec<Coordinate>,
    pub seg_dist_m: Vec<f64>,
    pub seg_time_s: Vec<f64>,
    pub cum_dist_m: Vec<f64>,
    pub cum_time_s: Vec<f64>,
    pub total_dist_m: f64,
    pub total_time_s: f64,
    pub profile: Profile,
}

impl RouteData {
    /// Build a route from raw geometry and per-segment metrics, deriving the
    /// prefix-sum arrays and validating the invariants in the data model.
    pub fn new(
        start: Coordinate,
        dest: Coordinate,
        geometry: Vec<Coordinate>,
        seg_dist_m: Vec<f64>,
        seg_time_s: Vec<f64>,
        profile: Profile,
    ) -> Result<Self, RouteError> {
        if geometry.len() < 2 {
            return Err(RouteError::EmptyRoute);
        }
        if seg_dist_m.len() != geometry.len() - 1 || seg_time_s.len() != geometry.len() - 1 {
            return Err(RouteError::MalformedArrays);
        }

        let cum_dist_m = cum_array(&seg_dist_m);
        let cum_time_s = cum_array(&seg_time_s);

        if !is_non_decreasing(&cum_dist_m) || !is_non_decreasing(&cum_time_s) {
            return Err(RouteError::NonMonotonicPrefixSum);
        }

        let total_dist_m = *cum_dist_m.last().unwrap();
        let total_time_s = *cum_time_s.last().unwrap();

        Ok(Self {
            start,
            dest,
            geometry,
            seg_dist_m,
            seg_time_s,
            cum_dist_m,
            cum_time_s,
            total_dist_m,
            total_time_s,
            profile,
        })
    }

    /// Number of geometry points.
    pub fn len(&self) -> usize {
        self.geometry.len()
    }

    pub fn is_empty(&self) -> bool {
        false // construction rejects < 2 points
    }

    /// Position along the route at relative time `t` (seconds from route
    /// start), together with the segment index the position falls in.
    ///
    /// `t <= 0` clamps to the start; `t >= total_time_s` clamps to the end.
    /// At an exact segment boundary the higher segment index is preferred.
    pub fn position_at_time(&self, t: f64) -> (Coordinate, usize) {
        if t <= 0.0 {
            return (self.geometry[0], 0);
        }
        if t >= self.total_time_s {
            return (*self.geometry.last().unwrap(), self.geometry.len() - 1);
        }

        let i = largest_index_with_cum_le(&self.cum_time_s, t);
        let seg_time = self.seg_time_s[i];
        let alpha = if seg_time == 0.0 {
            1.0
        } else {
            (t - self.cum_time_s[i]) / seg_time
        };

        let a = self.geometry[i];
        let b = self.geometry[i + 1];
        let pos = Coordinate::new(
            a.lat + alpha * (b.lat - a.lat),
            a.lon + alpha * (b.lon - a.lon),
        );
        (pos, i)
    }
}

fn is_non_decreasing(xs: &[f64]) -> bool {
    xs.windows(2).all(|w| w[1] + 1e-9 >= w[0])
}

/// Largest segment index `i` (into `cum_time_s`, which has `geometry.len()`
/// entries and therefore `geometry.len() - 1` segments) such that
/// `cum_time_s[i] <= t`. Assumes `0 < t < cum_time_s.last()`, i.e. the
/// boundary clamps in [`RouteData::position_at_time`] have already been
/// handled. Ties at an exact boundary resolve to the higher segment index,
/// matching `bisect_right` minus one.
fn largest_index_with_cum_le(cum_time_s: &[f64], t: f64) -> usize {
    // binary search for the rightmost index with cum_time_s[idx] <= t
    let mut lo = 0usize;
    let mut hi = cum_time_s.len() - 1; // last valid segment start index is len-2
    while lo < hi {
        let mid = lo + (hi - lo + 1) / 2;
        if cum_time_s[mid] <= t {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }
    lo.min(cum_time_s.len() - 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_route() -> RouteData {
        RouteData::new(
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, 3.0),
            vec![
                Coordinate::new(0.0, 0.0),
                Coordinate::new(0.0, 1.0),
                Coordinate::new(0.0, 2.0),
                Coordinate::new(0.0, 3.0),
            ],
            vec![100.0, 100.0, 100.0],
            vec![10.0, 10.0, 10.0],
            Profile::Walking,
        )
        .unwrap()
    }

    #[test]
    fn rejects_short_geometry() {
        let err = RouteData::new(
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, 0.0),
            vec![Coordinate::new(0.0, 0.0)],
            vec![],
            vec![],
            Profile::Walking,
        )
        .unwrap_err();
        assert_eq!(err, RouteError::EmptyRoute);
    }

    #[test]
    fn rejects_mismatched_arrays() {
        let err = RouteData::new(
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, 1.0),
            vec![Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 1.0)],
            vec![1.0, 2.0],
            vec![1.0],
            Profile::Walking,
        )
        .unwrap_err();
        assert_eq!(err, RouteError::MalformedArrays);
    }

    #[test]
    fn cum_dist_matches_total() {
        let r = sample_route();
        assert!((r.cum_dist_m.last().unwrap() - r.total_dist_m).abs() < 1e-6);
        assert_eq!(r.cum_time_s[0], 0.0);
    }

    #[test]
    fn position_at_zero_is_start() {
        let r = sample_route();
        let (pos, idx) = r.position_at_time(0.0);
        assert_eq!(pos, r.geometry[0]);
        assert_eq!(idx, 0);
    }

    #[test]
    fn position_at_or_past_end_is_dest() {
        let r = sample_route();
        let (pos, idx) = r.position_at_time(1_000.0);
        assert_eq!(pos, *r.geometry.last().unwrap());
        assert_eq!(idx, r.geometry.len() - 1);
    }

    #[test]
    fn position_interpolates_midsegment() {
        let r = sample_route();
        let (pos, idx) = r.position_at_time(15.0);
        assert_eq!(idx, 1);
        assert!((pos.lon - 1.5).abs() < 1e-9);
    }

    #[test]
    fn zero_duration_segment_does_not_divide_by_zero() {
        let r = RouteData::new(
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, 2.0),
            vec![
                Coordinate::new(0.0, 0.0),
                Coordinate::new(0.0, 1.0),
                Coordinate::new(0.0, 2.0),
            ],
            vec![100.0, 100.0],
            vec![10.0, 0.0],
            Profile::Walking,
        )
        .unwrap();
        let (pos, idx) = r.position_at_time(10.0);
        assert_eq!(idx, 1);
        assert_eq!(pos, r.geometry[2]);
    }

    #[test]
    fn repeated_query_is_idempotent() {
        let r = sample_route();
        assert_eq!(r.position_at_time(12.5), r.position_at_time(12.5));
    }
}
