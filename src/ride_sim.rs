//! The ride state machine: WALK_TO_PICKUP → WAIT_AT_PICKUP → RIDE_WITH_DRIVER
//! → WALK_FROM_DROPOFF → DONE.

use crate::agent::Agent;
use crate::geo::Coordinate;
use crate::ids::MatchId;
use crate::matching::Match;

/// A ride's current phase. Monotonically non-decreasing for a given
/// [`RideSim`]; `Done` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    WalkToPickup,
    WaitAtPickup,
    RideWithDriver,
    WalkFromDropoff,
    Done,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::WalkToPickup => "WALK_TO_PICKUP",
            Phase::WaitAtPickup => "WAIT_AT_PICKUP",
            Phase::RideWithDriver => "RIDE_WITH_DRIVER",
            Phase::WalkFromDropoff => "WALK_FROM_DROPOFF",
            Phase::Done => "DONE",
        }
    }
}

/// A single active ride: a committed [`Match`] plus the four agents that
/// move its participants, and the phase/position bookkeeping for reporting.
///
/// `driver_agent` is advanced by the owning [`crate::dispatcher::Dispatcher`]
/// with global time; `update` reads its position but never advances it.
pub struct RideSim {
    pub match_id: MatchId,
    pub r#match: Match,
    pub driver_agent: Agent,
    pub walker_agent: Agent,
    pub walk_to_pickup_agent: Agent,
    pub walk_from_dropoff_agent: Agent,
    pub phase: Phase,
    pub creation_time_s: f64,
    walker_pos: Option<Coordinate>,
}

impl RideSim {
    pub fn new(
        r#match: Match,
        driver_agent: Agent,
        walker_agent: Agent,
        walk_to_pickup_agent: Agent,
        walk_from_dropoff_agent: Agent,
        creation_time_s: f64,
    ) -> Self {
        Self {
            match_id: MatchId::new(),
            r#match,
            driver_agent,
            walker_agent,
            walk_to_pickup_agent,
            walk_from_dropoff_agent,
            phase: Phase::WalkToPickup,
            creation_time_s,
            walker_pos: None,
        }
    }

    /// Advance this ride to global time `t`. Does not advance `driver_agent`
    /// (the dispatcher does, with the same global `t`, before or after
    /// calling this — either order is fine since this only reads its
    /// position).
    pub fn update(&mut self, t: f64) {
        let t_local = t - self.creation_time_s;

        let t_walk_to_pickup_end = self.r#match.walk_to_pickup.total_time_s;
        let t_driver_pickup = self.r#match.driver_pickup_eta_s;
        let t_driver_dropoff = self.r#match.driver_dropoff_eta_s;
        let t_walk_from_dropoff_end = t_driver_dropoff + self.r#match.walk_from_dropoff.total_time_s;

        if t_local < t_walk_to_pickup_end {
            self.phase = Phase::WalkToPickup;
            self.walk_to_pickup_agent.update_position(t_local);
            self.walker_pos = self.walk_to_pickup_agent.get_pos().ok();
        } else if t_local < t_driver_pickup {
            self.phase = Phase::WaitAtPickup;
            self.walker_pos = Some(self.r#match.pickup);
        } else if t_local < t_driver_dropoff {
            self.phase = Phase::RideWithDriver;
            self.walker_pos = self.driver_agent.get_pos().ok();
        } else if t_local < t_walk_from_dropoff_end {
            self.phase = Phase::WalkFromDropoff;
            self.walk_from_dropoff_agent
                .update_position(t_local - t_driver_dropoff);
            self.walker_pos = self.walk_from_dropoff_agent.get_pos().ok();
        } else {
            self.phase = Phase::Done;
            self.walker_pos = Some(self.r#match.walk_from_dropoff.dest);
        }
    }

    pub fn walker_pos(&self) -> Option<Coordinate> {
        self.walker_pos
    }

    pub fn driver_pos(&self) -> Option<Coordinate> {
        self.driver_agent.get_pos().ok()
    }

    pub fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }
}
