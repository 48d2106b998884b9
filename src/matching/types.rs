//! The [`Match`] value type and the errors that can prevent one from being
//! built.

use std::sync::Arc;

use crate::geo::Coordinate;
use crate::route::RouteData;
use crate::routing::RoutingError;

/// Which leg of a match's walking routes failed the routing-snap check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapLeg {
    /// The walk from the walker's start didn't actually arrive at `pickup`.
    ToPickup,
    /// The walk from `dropoff` didn't actually start at `dropoff`.
    FromDropoff,
}

/// Reasons a match could not be built for a given driver/walker pair.
#[derive(Debug)]
pub enum MatchError {
    /// No candidate pickup point was found on the driver's route.
    NoPickupFound,
    /// The pickup candidate left no suffix of the driver's route to search
    /// for a dropoff in.
    PickupAtEnd,
    /// No candidate dropoff point was found after the chosen pickup.
    NoDropoffFound,
    /// The best dropoff candidate was not strictly after the best pickup
    /// candidate.
    DropoffBeforePickup,
    /// Saving versus walking the whole way fell below the policy minimum.
    InsufficientSaving,
    /// The walker couldn't reach the pickup before the driver does.
    PickupTooSlow,
    /// A Phase-2 walking route's endpoint was too far from its intended
    /// pickup/dropoff point.
    SnapMismatch(SnapLeg),
    /// The routing service failed while evaluating a candidate.
    Routing(RoutingError),
}

impl std::fmt::Display for MatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchError::NoPickupFound => write!(f, "no pickup point found"),
            MatchError::PickupAtEnd => write!(f, "pickup is at the end of the driver route"),
            MatchError::NoDropoffFound => write!(f, "no dropoff point found"),
            MatchError::DropoffBeforePickup => write!(f, "dropoff is before pickup"),
            MatchError::InsufficientSaving => write!(f, "saving below policy minimum"),
            MatchError::PickupTooSlow => write!(f, "walker cannot reach pickup in time"),
            MatchError::SnapMismatch(leg) => write!(f, "routing snap mismatch on {leg:?} leg"),
            MatchError::Routing(err) => write!(f, "routing failed: {err}"),
        }
    }
}

impl std::error::Error for MatchError {}

impl From<RoutingError> for MatchError {
    fn from(err: RoutingError) -> Self {
        MatchError::Routing(err)
    }
}

/// A committed pairing of a driver route and a walker route: where the
/// walker boards and alights, the two walking legs that get them there, and
/// the derived distance/time accounting. Immutable once built.
#[derive(Debug, Clone)]
pub struct Match {
    pub driver_route: Arc<RouteData>,
    pub walker_route: Arc<RouteData>,
    pub walk_to_pickup: Arc<RouteData>,
    pub walk_from_dropoff: Arc<RouteData>,

    pub pickup: Coordinate,
    pub dropoff: Coordinate,
    pub pickup_index: usize,
    pub dropoff_index: usize,

    pub pick_walk_m: f64,
    pub pick_walk_s: f64,
    pub drop_walk_m: f64,
    pub drop_walk_s: f64,
    pub total_walk_m: f64,
    pub total_walk_s: f64,
    pub ride_m: f64,
    pub ride_s: f64,
    pub saving_m: f64,
    pub saving_s: f64,

    pub driver_pickup_eta_s: f64,
    pub driver_dropoff_eta_s: f64,
}
