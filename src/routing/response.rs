//! Deserialization shapes for the routing service's `/route/v1/{profile}/...`
//! responses, and the subset of fields this crate actually consumes.

use serde::Deserialize;

/// A fully-resolved route: geometry and per-segment distance/time.
#[derive(Clone, Debug, PartialEq)]
pub struct RouteResponse {
    pub distance_m: f64,
    pub duration_s: f64,
    pub coordinates_lat_lon: Vec<(f64, f64)>,
    pub seg_dist_m: Vec<f64>,
    pub seg_time_s: Vec<f64>,
}

/// A cheap, geometry-free summary: just the totals.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SummaryResponse {
    pub distance_m: f64,
    pub duration_s: f64,
}

#[derive(Deserialize)]
pub(super) struct OsrmResponse {
    pub(super) code: String,
    pub(super) routes: Option<Vec<OsrmRoute>>,
}

#[derive(Deserialize)]
pub(super) struct OsrmRoute {
    pub(super) distance: f64,
    pub(super) duration: f64,
    pub(super) geometry: Option<OsrmGeometry>,
    pub(super) legs: Option<Vec<OsrmLeg>>,
}

#[derive(Deserialize)]
pub(super) struct OsrmGeometry {
    /// `[lon, lat]` pairs, per GeoJSON convention.
    pub(super) coordinates: Vec<[f64; 2]>,
}

#[derive(Deserialize)]
pub(super) struct OsrmLeg {
    pub(super) annotation: Option<OsrmAnnotation>,
}

#[derive(Deserialize)]
pub(super) struct OsrmAnnotation {
    pub(super) distance: Option<Vec<f64>>,
    pub(super) duration: Option<Vec<f64>>,
    #[allow(dead_code)]
    pub(super) nodes: Option<Vec<u64>>,
}
