//! `detour_core`: the matching and simulation engine behind a detour-based
//! ride-sharing dispatcher.
//!
//! A driver travels a route; a walker wants to get somewhere too. If the
//! driver can pick the walker up and drop them off along (or near) their
//! existing route without too much of a detour, they're matched and the ride
//! is simulated tick by tick until the walker is dropped off.
//!
//! Module map:
//!
//! - [`geo`] / [`route`] / [`agent`]: spatial primitives, immutable routes
//!   with position-at-time interpolation, and the agents that move along them.
//! - [`routing`]: fetching routes from an external routing service
//!   (real HTTP behind the `osrm` feature, or an in-memory fake for tests),
//!   with an LRU-caching decorator in front.
//! - [`matching`]: the two-phase algorithm that proposes and finalizes a
//!   pickup/dropoff pairing between a driver and a walker.
//! - [`ride_sim`]: the phase state machine for a single committed match.
//! - [`dispatcher`]: the tick loop tying all of the above together, plus the
//!   ingress queue and request-status ledger.
//! - [`snapshot`]: turning dispatcher state into the published JSON
//!   artifacts, written atomically.
//! - [`ids`]: the UUID-backed identifier newtypes used throughout.

pub mod agent;
pub mod dispatcher;
pub mod geo;
pub mod ids;
pub mod matching;
pub mod ride_sim;
pub mod route;
pub mod routing;
pub mod snapshot;
