//! A positioned actor bound to a [`RouteData`], advanced by global
//! simulation time.

use std::sync::Arc;

use crate::geo::Coordinate;
use crate::ids::AgentId;
use crate::route::RouteData;

/// Error accessing an [`Agent`]'s position before it has ever been advanced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionNotReady;

impl std::fmt::Display for PositionNotReady {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "agent position queried before any update_position call")
    }
}

impl std::error::Error for PositionNotReady {}

/// A single driver or walker, bound to a route and advanced in lockstep with
/// the simulation's global clock.
#[derive(Debug, Clone)]
pub struct Agent {
    pub agent_id: AgentId,
    pub route: Arc<RouteData>,
    pub start_offset_s: f64,
    pub time_scale: f64,
    pub idx: usize,
    pos: Option<Coordinate>,
    pub done: bool,
    pub assigned: bool,
}

impl Agent {
    /// Create an agent at its route start, scheduled to begin moving at
    /// `start_offset_s` in global simulation time.
    pub fn new(route: Arc<RouteData>, start_offset_s: f64) -> Self {
        Self {
            agent_id: AgentId::new(),
            route,
            start_offset_s,
            time_scale: 1.0,
            idx: 0,
            pos: None,
            done: false,
            assigned: false,
        }
    }

    pub fn with_time_scale(mut self, time_scale: f64) -> Self {
        self.time_scale = time_scale;
        self
    }

    /// Advance this agent's position to global time `global_t`. No-op once
    /// `done`. `idx` never decreases across calls.
    pub fn update_position(&mut self, global_t: f64) {
        if self.done {
            return;
        }

        let t_rel = (global_t - self.start_offset_s) * self.time_scale;

        if t_rel <= 0.0 {
            self.pos = Some(self.route.geometry[0]);
            return;
        }

        if t_rel >= self.route.total_time_s {
            self.pos = Some(*self.route.geometry.last().unwrap());
            self.idx = self.route.geometry.len() - 1;
            self.done = true;
            return;
        }

        let (pos, idx) = self.route.position_at_time(t_rel);
        self.pos = Some(pos);
        self.idx = self.idx.max(idx);
    }

    /// The agent's current position. Fails if `update_position` has never
    /// been called.
    pub fn get_pos(&self) -> Result<Coordinate, PositionNotReady> {
        self.pos.ok_or(PositionNotReady)
    }
}
