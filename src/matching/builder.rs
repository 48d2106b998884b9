//! Two-phase (cheap/expensive) matching: propose the best pickup/dropoff on
//! a driver's route for a walker, then decide the best driver for a walker
//! under the dispatcher-level policy.

use std::sync::Arc;

use crate::agent::Agent;
use crate::geo::{haversine_m, Coordinate};
use crate::route::{Profile, RouteData};
use crate::routing::CachedRoutingClient;

use super::candidates::topk_by_haversine;
use super::policy::MatchPolicy;
use super::types::{Match, MatchError, SnapLeg};

/// The cheaply-computed half of a match: pickup/dropoff points and walking
/// summaries, before the expensive full-route snap check.
#[derive(Debug, Clone)]
struct MatchLight {
    pickup: Coordinate,
    dropoff: Coordinate,
    pickup_index: usize,
    dropoff_index: usize,
    pick_walk_m: f64,
    pick_walk_s: f64,
    drop_walk_m: f64,
    drop_walk_s: f64,
}

/// Builds [`Match`]es for a driver/walker pair, and selects the best driver
/// for a walker under [`MatchPolicy`].
pub struct MatchBuilder {
    routing: Arc<CachedRoutingClient>,
    policy: MatchPolicy,
}

impl MatchBuilder {
    pub fn new(routing: Arc<CachedRoutingClient>, policy: MatchPolicy) -> Self {
        Self { routing, policy }
    }

    pub fn policy(&self) -> &MatchPolicy {
        &self.policy
    }

    fn find_pickup_light(
        &self,
        driver: &RouteData,
        walker_start: Coordinate,
    ) -> Result<(Coordinate, f64, f64, usize), MatchError> {
        let candidates = topk_by_haversine(&driver.geometry, walker_start, self.policy.k_pickup);

        let mut best: Option<(usize, f64, f64)> = None;
        for i in candidates {
            let (m, s) = self
                .routing
                .fetch_summary(walker_start, driver.geometry[i], Profile::Walking)?;
            if best.map(|(_, best_m, _)| m < best_m).unwrap_or(true) {
                best = Some((i, m, s));
            }
        }

        let (i, m, s) = best.ok_or(MatchError::NoPickupFound)?;
        Ok((driver.geometry[i], m, s, i))
    }

    fn find_dropoff_light(
        &self,
        driver: &RouteData,
        walker_dest: Coordinate,
        pickup_index: usize,
    ) -> Result<(Coordinate, f64, f64, usize), MatchError> {
        if pickup_index + 1 >= driver.geometry.len() {
            return Err(MatchError::PickupAtEnd);
        }
        let tail = &driver.geometry[pickup_index + 1..];
        let local_candidates = topk_by_haversine(tail, walker_dest, self.policy.k_dropoff);

        let mut best: Option<(usize, f64, f64)> = None;
        for local_i in local_candidates {
            let i = pickup_index + 1 + local_i;
            let (m, s) = self
                .routing
                .fetch_summary(driver.geometry[i], walker_dest, Profile::Walking)?;
            if best.map(|(_, best_m, _)| m < best_m).unwrap_or(true) {
                best = Some((i, m, s));
            }
        }

        let (i, m, s) = best.ok_or(MatchError::NoDropoffFound)?;
        Ok((driver.geometry[i], m, s, i))
    }

    /// Phase 1: propose pickup/dropoff candidates and their cheap summary
    /// costs for one driver/walker pair.
    fn light_candidate(
        &self,
        driver: &RouteData,
        walker: &RouteData,
    ) -> Result<MatchLight, MatchError> {
        let (pickup, pick_walk_m, pick_walk_s, pickup_index) =
            self.find_pickup_light(driver, walker.start)?;
        let (dropoff, drop_walk_m, drop_walk_s, dropoff_index) =
            self.find_dropoff_light(driver, walker.dest, pickup_index)?;

        if dropoff_index <= pickup_index {
            return Err(MatchError::DropoffBeforePickup);
        }

        Ok(MatchLight {
            pickup,
            dropoff,
            pickup_index,
            dropoff_index,
            pick_walk_m,
            pick_walk_s,
            drop_walk_m,
            drop_walk_s,
        })
    }

    /// Phase 2: fetch the full walking routes for the winning candidate and
    /// assemble the committed [`Match`]. No fallback to a runner-up if the
    /// routing snap check fails here; the caller's walker simply stays
    /// unmatched this tick.
    fn finalize(
        &self,
        driver: Arc<RouteData>,
        walker: Arc<RouteData>,
        ml: MatchLight,
    ) -> Result<Match, MatchError> {
        let walk_to_pickup = self
            .routing
            .fetch(walker.start, ml.pickup, Profile::Walking)?;
        if haversine_m(*walk_to_pickup.geometry.last().unwrap(), ml.pickup)
            > self.policy.snap_tolerance_m
        {
            return Err(MatchError::SnapMismatch(SnapLeg::ToPickup));
        }

        let walk_from_dropoff = self
            .routing
            .fetch(ml.dropoff, walker.dest, Profile::Walking)?;
        if haversine_m(walk_from_dropoff.geometry[0], ml.dropoff) > self.policy.snap_tolerance_m {
            return Err(MatchError::SnapMismatch(SnapLeg::FromDropoff));
        }

        let pi = ml.pickup_index;
        let di = ml.dropoff_index;

        let total_walk_m = ml.pick_walk_m + ml.drop_walk_m;
        let total_walk_s = ml.pick_walk_s + ml.drop_walk_s;
        let ride_m = driver.cum_dist_m[di] - driver.cum_dist_m[pi];
        let ride_s = driver.cum_time_s[di] - driver.cum_time_s[pi];
        let saving_m = walker.total_dist_m - total_walk_m;
        let saving_s = walker.total_time_s - total_walk_s;

        Ok(Match {
            driver_route: driver.clone(),
            walker_route: walker,
            walk_to_pickup,
            walk_from_dropoff,
            pickup: ml.pickup,
            dropoff: ml.dropoff,
            pickup_index: pi,
            dropoff_index: di,
            pick_walk_m: ml.pick_walk_m,
            pick_walk_s: ml.pick_walk_s,
            drop_walk_m: ml.drop_walk_m,
            drop_walk_s: ml.drop_walk_s,
            total_walk_m,
            total_walk_s,
            ride_m,
            ride_s,
            saving_m,
            saving_s,
            driver_pickup_eta_s: driver.cum_time_s[pi],
            driver_dropoff_eta_s: driver.cum_time_s[di],
        })
    }

    /// Find the best driver (by index into `drivers`) for `walker` under
    /// policy, and build the committed [`Match`]. Evaluates Phase 1 against
    /// every driver, ranks survivors by walker-arrival time (ties by smaller
    /// total walk distance, then smaller pickup index), and runs Phase 2
    /// only for the winner. A Phase-2 failure returns `None` outright; there
    /// is no fallback to the runner-up.
    pub fn find_best_match(&self, drivers: &[Agent], walker: &Agent) -> Option<(usize, Match)> {
        let mut best: Option<(usize, MatchLight, f64)> = None;

        for (i, driver_agent) in drivers.iter().enumerate() {
            let ml = match self.light_candidate(&driver_agent.route, &walker.route) {
                Ok(ml) => ml,
                Err(_) => continue,
            };

            let total_walk_m = ml.pick_walk_m + ml.drop_walk_m;
            let saving_m = walker.route.total_dist_m - total_walk_m;
            if saving_m < self.policy.min_saving_m {
                continue;
            }
            if ml.pick_walk_s > driver_agent.route.cum_time_s[ml.pickup_index] {
                continue;
            }

            let arrival = driver_agent.route.cum_time_s[ml.dropoff_index] + ml.drop_walk_s;

            let is_better = match &best {
                None => true,
                Some((_, best_ml, best_arrival)) => {
                    let best_total_walk_m = best_ml.pick_walk_m + best_ml.drop_walk_m;
                    rank_key(arrival, total_walk_m, ml.pickup_index)
                        < rank_key(*best_arrival, best_total_walk_m, best_ml.pickup_index)
                }
            };

            if is_better {
                best = Some((i, ml, arrival));
            }
        }

        let (i, ml, _) = best?;
        let driver_route = drivers[i].route.clone();
        let walker_route = walker.route.clone();

        match self.finalize(driver_route, walker_route, ml) {
            Ok(m) => Some((i, m)),
            Err(_) => None,
        }
    }
}

fn rank_key(arrival: f64, total_walk_m: f64, pickup_index: usize) -> (f64, f64, usize) {
    (arrival, total_walk_m, pickup_index)
}
