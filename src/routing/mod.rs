//! Routing: fetching polylines and per-segment metrics from an external
//! routing service, with a caching decorator in front of it.
//!
//! [`RoutingBackend`] is the thin seam a production HTTP implementation
//! ([`client::OsrmRoutingClient`], behind the `osrm` feature) or a
//! deterministic test fake ([`testkit`]) plugs into. [`cache::CachedRoutingClient`]
//! wraps any backend with quantized LRU caching and is
//! what [`crate::matching::builder::MatchBuilder`] and
//! [`crate::dispatcher::Dispatcher`] actually hold.

pub mod cache;
#[cfg(feature = "osrm")]
pub mod client;
pub mod error;
mod parser;
mod response;
#[cfg(feature = "test-helpers")]
pub mod testkit;

pub use cache::CachedRoutingClient;
#[cfg(feature = "osrm")]
pub use client::OsrmRoutingClient;
pub use error::RoutingError;
pub use response::{RouteResponse, SummaryResponse};

use crate::geo::Coordinate;
use crate::route::Profile;

/// A routing service backend: fetches a full route or a cheap summary for a
/// `(start, dest, profile)` triple. Implementations are not expected to
/// cache; caching is [`cache::CachedRoutingClient`]'s job.
pub trait RoutingBackend: Send + Sync {
    fn fetch(
        &self,
        start: Coordinate,
        dest: Coordinate,
        profile: Profile,
    ) -> Result<RouteResponse, RoutingError>;

    fn fetch_summary(
        &self,
        start: Coordinate,
        dest: Coordinate,
        profile: Profile,
    ) -> Result<SummaryResponse, RoutingError>;
}
