//! Tunable matching parameters, as a builder-with-defaults config struct.

/// Policy knobs for [`super::builder::MatchBuilder`]. Construct with
/// [`MatchPolicy::default`] and adjust via the `with_*` methods.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchPolicy {
    /// Candidate pickup points considered per driver (top-K by haversine
    /// distance to the walker's start).
    pub k_pickup: usize,
    /// Candidate dropoff points considered per driver (top-K by haversine
    /// distance to the walker's destination, restricted to the suffix after
    /// the chosen pickup).
    pub k_dropoff: usize,
    /// Minimum distance saved by riding versus walking the whole way, in
    /// meters, for a match to be considered worthwhile.
    pub min_saving_m: f64,
    /// Maximum haversine distance, in meters, between a Phase-2 walking
    /// route's endpoint and the intended pickup/dropoff before the match is
    /// rejected as a routing snap mismatch.
    pub snap_tolerance_m: f64,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self {
            k_pickup: 15,
            k_dropoff: 10,
            min_saving_m: 800.0,
            snap_tolerance_m: 30.0,
        }
    }
}

impl MatchPolicy {
    pub fn with_k_pickup(mut self, k_pickup: usize) -> Self {
        self.k_pickup = k_pickup;
        self
    }

    pub fn with_k_dropoff(mut self, k_dropoff: usize) -> Self {
        self.k_dropoff = k_dropoff;
        self
    }

    pub fn with_min_saving_m(mut self, min_saving_m: f64) -> Self {
        self.min_saving_m = min_saving_m;
        self
    }

    pub fn with_snap_tolerance_m(mut self, snap_tolerance_m: f64) -> Self {
        self.snap_tolerance_m = snap_tolerance_m;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_values() {
        let p = MatchPolicy::default();
        assert_eq!(p.k_pickup, 15);
        assert_eq!(p.k_dropoff, 10);
        assert_eq!(p.min_saving_m, 800.0);
        assert_eq!(p.snap_tolerance_m, 30.0);
    }

    #[test]
    fn builder_methods_chain() {
        let p = MatchPolicy::default()
            .with_k_pickup(5)
            .with_min_saving_m(400.0);
        assert_eq!(p.k_pickup, 5);
        assert_eq!(p.min_saving_m, 400.0);
        assert_eq!(p.k_dropoff, 10);
    }
}
