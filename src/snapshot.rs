//! Turns dispatcher state into the two published JSON artifacts (positions,
//! routes) and writes them atomically so a concurrent reader never sees a
//! half-written file.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::dispatcher::Dispatcher;
use crate::geo::Coordinate;
use crate::ids::{AgentId, MatchId};

const MAX_WRITE_RETRIES: u32 = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkerView {
    pub agent_id: AgentId,
    pub lat: f64,
    pub lon: f64,
    #[serde(rename = "pIdx")]
    pub p_idx: usize,
    #[serde(rename = "dIdx")]
    pub d_idx: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverView {
    pub agent_id: AgentId,
    pub lat: f64,
    pub lon: f64,
    pub idx: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimMeta {
    pub t_driver_pickup: f64,
    pub t_driver_dropoff: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimPosition {
    pub sim_id: MatchId,
    pub phase: String,
    pub walker: WalkerView,
    pub driver: DriverView,
    pub meta: SimMeta,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeftoverAgent {
    pub agent_id: AgentId,
    pub lat: f64,
    pub lon: f64,
}

/// The `positions.json` contract: every active ride's current positions plus
/// whoever is still waiting in the unmatched pools.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionsSnapshot {
    pub t_s: f64,
    pub sims: Vec<SimPosition>,
    pub leftover_drivers: Vec<LeftoverAgent>,
    pub leftover_walkers: Vec<LeftoverAgent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutePolyline {
    pub geometry_latlon: Vec<(f64, f64)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutePoints {
    pub pickup: (f64, f64),
    pub dropoff: (f64, f64),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteIndices {
    pub pickup: usize,
    pub dropoff: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteEntry {
    pub match_id: MatchId,
    pub driver_route: RoutePolyline,
    pub walk_to_pickup: RoutePolyline,
    pub walk_from_dropoff: RoutePolyline,
    pub points: RoutePoints,
    pub idx: RouteIndices,
}

/// The `routes.json` contract: the full polylines backing every currently
/// active ride, versioned so subscribers only refetch on an actual change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutesSnapshot {
    pub routes_version: f64,
    pub routes: Vec<RouteEntry>,
}

fn polyline(geometry: &[Coordinate]) -> RoutePolyline {
    RoutePolyline {
        geometry_latlon: geometry.iter().map(|c| (c.lat, c.lon)).collect(),
    }
}

/// Builds snapshot payloads from a [`Dispatcher`]'s current state and writes
/// them atomically to disk.
pub struct SnapshotPublisher {
    out_dir: PathBuf,
    last_routes_version: Option<f64>,
}

impl SnapshotPublisher {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            last_routes_version: None,
        }
    }

    /// Build the positions payload for the current tick. Always changes
    /// (the clock moves every tick), so this has no version gate.
    pub fn build_positions(&self, dispatcher: &Dispatcher) -> PositionsSnapshot {
        let sims = dispatcher
            .active_rides()
            .iter()
            .map(|ride| {
                let walker_pos = ride.walker_pos().unwrap_or(ride.r#match.pickup);
                let driver_pos = ride.driver_pos().unwrap_or(ride.r#match.driver_route.start);
                SimPosition {
                    sim_id: ride.match_id,
                    phase: ride.phase.as_str().to_string(),
                    walker: WalkerView {
                        agent_id: ride.walker_agent.agent_id,
                        lat: walker_pos.lat,
                        lon: walker_pos.lon,
                        p_idx: ride.walk_to_pickup_agent.idx,
                        d_idx: ride.walk_from_dropoff_agent.idx,
                    },
                    driver: DriverView {
                        agent_id: ride.driver_agent.agent_id,
                        lat: driver_pos.lat,
                        lon: driver_pos.lon,
                        idx: ride.driver_agent.idx,
                    },
                    meta: SimMeta {
                        t_driver_pickup: ride.r#match.driver_pickup_eta_s,
                        t_driver_dropoff: ride.r#match.driver_dropoff_eta_s,
                    },
                }
            })
            .collect();

        let leftover_drivers = dispatcher
            .unmatched_drivers()
            .iter()
            .filter_map(|a| a.get_pos().ok().map(|p| (a.agent_id, p)))
            .map(|(agent_id, p)| LeftoverAgent {
                agent_id,
                lat: p.lat,
                lon: p.lon,
            })
            .collect();

        let leftover_walkers = dispatcher
            .unmatched_walkers()
            .iter()
            .filter_map(|a| a.get_pos().ok().map(|p| (a.agent_id, p)))
            .map(|(agent_id, p)| LeftoverAgent {
                agent_id,
                lat: p.lat,
                lon: p.lon,
            })
            .collect();

        PositionsSnapshot {
            t_s: dispatcher.t(),
            sims,
            leftover_drivers,
            leftover_walkers,
        }
    }

    /// Build the routes payload, but only if `dispatcher`'s active-ride set
    /// has changed since the last call that returned `Some`.
    pub fn build_routes_if_changed(&mut self, dispatcher: &Dispatcher) -> Option<RoutesSnapshot> {
        let version = dispatcher.routes_version();
        if self.last_routes_version == Some(version) {
            return None;
        }
        self.last_routes_version = Some(version);

        let routes = dispatcher
            .active_rides()
            .iter()
            .map(|ride| RouteEntry {
                match_id: ride.match_id,
                driver_route: polyline(&ride.r#match.driver_route.geometry),
                walk_to_pickup: polyline(&ride.r#match.walk_to_pickup.geometry),
                walk_from_dropoff: polyline(&ride.r#match.walk_from_dropoff.geometry),
                points: RoutePoints {
                    pickup: (ride.r#match.pickup.lat, ride.r#match.pickup.lon),
                    dropoff: (ride.r#match.dropoff.lat, ride.r#match.dropoff.lon),
                },
                idx: RouteIndices {
                    pickup: ride.r#match.pickup_index,
                    dropoff: ride.r#match.dropoff_index,
                },
            })
            .collect();

        Some(RoutesSnapshot {
            routes_version: version,
            routes,
        })
    }

    /// Write `positions.json` for this tick.
    pub fn publish_positions(&self, dispatcher: &Dispatcher) -> io::Result<()> {
        let snapshot = self.build_positions(dispatcher);
        self.write_atomic("positions.json", &snapshot)
    }

    /// Write `routes.json`, but only when the active-ride set actually
    /// changed since the last publish.
    pub fn publish_routes_if_changed(&mut self, dispatcher: &Dispatcher) -> io::Result<()> {
        if let Some(snapshot) = self.build_routes_if_changed(dispatcher) {
            self.write_atomic("routes.json", &snapshot)?;
        }
        Ok(())
    }

    /// Serialize `value` to `self.out_dir/name`, writing to a temp file in
    /// the same directory, fsyncing it, then renaming over the target so
    /// readers never observe a partial write. Retries a bounded number of
    /// times on transient I/O errors.
    fn write_atomic<T: Serialize>(&self, name: &str, value: &T) -> io::Result<()> {
        fs::create_dir_all(&self.out_dir)?;
        let target = self.out_dir.join(name);
        let tmp = self.out_dir.join(format!(".{name}.tmp"));

        let body = serde_json::to_vec(value)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let mut last_err = None;
        for attempt in 0..=MAX_WRITE_RETRIES {
            match Self::write_and_rename(&tmp, &target, &body) {
                Ok(()) => return Ok(()),
                Err(err) => {
                    log::warn!("snapshot write attempt {attempt} for {name} failed: {err}");
                    last_err = Some(err);
                }
            }
        }
        Err(last_err.unwrap())
    }

    fn write_and_rename(tmp: &Path, target: &Path, body: &[u8]) -> io::Result<()> {
        let mut file = File::create(tmp)?;
        file.write_all(body)?;
        file.sync_all()?;
        drop(file);
        fs::rename(tmp, target)
    }
}
