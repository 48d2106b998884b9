//! Matching: propose a pickup/dropoff pairing for a driver and walker route,
//! and select the best driver for a walker.

pub mod builder;
pub mod candidates;
pub mod policy;
pub mod types;

pub use builder::MatchBuilder;
pub use policy::MatchPolicy;
pub use types::{Match, MatchError, SnapLeg};
