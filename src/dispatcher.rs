//! The simulation loop: drains ingress, matches new arrivals, advances every
//! agent and ride, and tracks enough bookkeeping for [`crate::snapshot`] to
//! report on.

use std::collections::HashMap;
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::agent::Agent;
use crate::geo::Coordinate;
use crate::ids::{AgentId, MatchId, RequestId};
use crate::matching::{Match, MatchBuilder, MatchPolicy};
use crate::route::Profile;
use crate::ride_sim::RideSim;
use crate::routing::CachedRoutingClient;

/// Fixed wall-clock interval the reference loop sleeps between ticks,
/// independent of the simulation's own `speed`.
pub const TICK_REAL_INTERVAL: Duration = Duration::from_millis(50);

const MIN_SPEED: f64 = 0.001;
const SPEED_STEP: f64 = 0.05;

/// A create-request's kind, as named in the ingress wire contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    Driver,
    Walker,
}

impl AgentKind {
    fn profile(self) -> Profile {
        match self {
            AgentKind::Driver => Profile::Driving,
            AgentKind::Walker => Profile::Walking,
        }
    }

    fn opposite(self) -> Self {
        match self {
            AgentKind::Driver => AgentKind::Walker,
            AgentKind::Walker => AgentKind::Driver,
        }
    }
}

/// The body of an ingress create-request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRequestPayload {
    #[serde(rename = "type")]
    pub kind: AgentKind,
    pub start: Coordinate,
    pub dest: Coordinate,
}

/// A transport-wrapped ingress create-request, as it arrives on the queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngressRequest {
    pub request_id: RequestId,
    pub payload: CreateRequestPayload,
}

/// Status of a tracked create-request, polled via [`Dispatcher::request_status`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RequestStatus {
    Queued,
    Created { agent_id: AgentId },
    Matched { agent_id: AgentId, match_id: MatchId },
    NotMatched { agent_id: AgentId },
    Failed { reason: String },
}

/// A ledger entry: the request's kind plus its current status, flattened
/// together so the polled JSON carries both per the wire contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestStatusEntry {
    pub kind: AgentKind,
    #[serde(flatten)]
    pub status: RequestStatus,
}

/// Dispatcher configuration. Everything tunable about the tick loop and the
/// matching policy it runs under lives here.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Initial simulation-time advance per tick.
    pub initial_speed: f64,
    pub match_policy: MatchPolicy,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            initial_speed: 0.2,
            match_policy: MatchPolicy::default(),
        }
    }
}

impl DispatcherConfig {
    pub fn with_initial_speed(mut self, speed: f64) -> Self {
        self.initial_speed = speed;
        self
    }

    pub fn with_match_policy(mut self, policy: MatchPolicy) -> Self {
        self.match_policy = policy;
        self
    }
}

/// Owns the unmatched agent pools, the active rides, the simulation clock,
/// and the ingress queue. Single-threaded with respect to its own state: the
/// only thread-safe seam is the ingress [`Sender`]/[`Receiver`] pair.
pub struct Dispatcher {
    routing: Arc<CachedRoutingClient>,
    match_builder: MatchBuilder,
    ingress_rx: Receiver<IngressRequest>,

    t: f64,
    speed: f64,
    routes_version: f64,

    unmatched_drivers: Vec<Agent>,
    unmatched_walkers: Vec<Agent>,
    active_rides: Vec<RideSim>,

    request_status: HashMap<RequestId, RequestStatusEntry>,
    agent_to_request: HashMap<AgentId, RequestId>,
}

impl Dispatcher {
    /// Build a new dispatcher and the [`Sender`] producers use to submit
    /// ingress requests.
    pub fn new(
        routing: Arc<CachedRoutingClient>,
        config: DispatcherConfig,
    ) -> (Self, Sender<IngressRequest>) {
        let (tx, rx) = channel();
        let match_builder = MatchBuilder::new(routing.clone(), config.match_policy);
        let dispatcher = Self {
            routing,
            match_builder,
            ingress_rx: rx,
            t: 0.0,
            speed: config.initial_speed,
            routes_version: 0.0,
            unmatched_drivers: Vec::new(),
            unmatched_walkers: Vec::new(),
            active_rides: Vec::new(),
            request_status: HashMap::new(),
            agent_to_request: HashMap::new(),
        };
        (dispatcher, tx)
    }

    pub fn t(&self) -> f64 {
        self.t
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: f64) {
        self.speed = speed.max(MIN_SPEED);
    }

    pub fn speed_up(&mut self) {
        self.set_speed(self.speed + SPEED_STEP);
    }

    pub fn speed_down(&mut self) {
        self.set_speed(self.speed - SPEED_STEP);
    }

    pub fn routes_version(&self) -> f64 {
        self.routes_version
    }

    pub fn active_rides(&self) -> &[RideSim] {
        &self.active_rides
    }

    pub fn unmatched_drivers(&self) -> &[Agent] {
        &self.unmatched_drivers
    }

    pub fn unmatched_walkers(&self) -> &[Agent] {
        &self.unmatched_walkers
    }

    pub fn request_status(&self, request_id: RequestId) -> Option<&RequestStatusEntry> {
        self.request_status.get(&request_id)
    }

    /// Run one tick: drain ingress, match newcomers, advance every agent and
    /// ride by `self.speed`, and retire finished rides. Does not sleep; the
    /// real wall-clock pacing is the caller's concern (see
    /// [`TICK_REAL_INTERVAL`]).
    pub fn tick(&mut self) {
        self.drain_and_process_ingress();

        for agent in self.unmatched_drivers.iter_mut() {
            agent.update_position(self.t);
        }
        for agent in self.unmatched_walkers.iter_mut() {
            agent.update_position(self.t);
        }

        for ride in self.active_rides.iter_mut() {
            ride.driver_agent.update_position(self.t);
            ride.update(self.t);
        }

        let before = self.active_rides.len();
        self.active_rides.retain(|r| !r.is_done());
        if self.active_rides.len() != before {
            self.routes_version = self.t;
        }

        self.t += self.speed;
    }

    fn drain_and_process_ingress(&mut self) {
        loop {
            let req = match self.ingress_rx.try_recv() {
                Ok(req) => req,
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            };
            self.process_ingress_request(req);
        }
    }

    fn set_status(&mut self, request_id: RequestId, kind: AgentKind, status: RequestStatus) {
        self.request_status
            .insert(request_id, RequestStatusEntry { kind, status });
    }

    fn process_ingress_request(&mut self, req: IngressRequest) {
        let t = self.t;
        let kind = req.payload.kind;
        let route = self
            .routing
            .fetch(req.payload.start, req.payload.dest, kind.profile());

        let route = match route {
            Ok(route) => route,
            Err(err) => {
                log::warn!("routing failed for ingress request {}: {err}", req.request_id);
                self.set_status(
                    req.request_id,
                    kind,
                    RequestStatus::Failed {
                        reason: err.to_string(),
                    },
                );
                return;
            }
        };

        let agent = Agent::new(route, t);
        let agent_id = agent.agent_id;
        self.set_status(req.request_id, kind, RequestStatus::Created { agent_id });
        self.agent_to_request.insert(agent_id, req.request_id);

        let outcome = match kind {
            AgentKind::Driver => self.process_new_driver(agent, t),
            AgentKind::Walker => self.process_new_walker(agent, t),
        };

        match outcome {
            Some((match_id, partner_agent_id)) => {
                self.set_status(
                    req.request_id,
                    kind,
                    RequestStatus::Matched { agent_id, match_id },
                );
                if let Some(partner_req_id) = self.agent_to_request.get(&partner_agent_id).copied() {
                    self.set_status(
                        partner_req_id,
                        kind.opposite(),
                        RequestStatus::Matched {
                            agent_id: partner_agent_id,
                            match_id,
                        },
                    );
                }
                log::info!("match {match_id} committed");
            }
            None => {
                self.set_status(req.request_id, kind, RequestStatus::NotMatched { agent_id });
            }
        }
    }

    /// A newly-arrived driver is matched against unmatched walkers in FIFO
    /// order; the first walker it can serve wins.
    fn process_new_driver(&mut self, driver_agent: Agent, t: f64) -> Option<(MatchId, AgentId)> {
        let mut found: Option<(usize, Match)> = None;
        for (wi, walker) in self.unmatched_walkers.iter().enumerate() {
            let single_driver = std::slice::from_ref(&driver_agent);
            if let Some((_, m)) = self.match_builder.find_best_match(single_driver, walker) {
                found = Some((wi, m));
                break;
            }
        }

        match found {
            Some((wi, m)) => {
                let walker_agent = self.unmatched_walkers.remove(wi);
                let walker_id = walker_agent.agent_id;
                let match_id = self.commit_ride(m, driver_agent, walker_agent, t);
                Some((match_id, walker_id))
            }
            None => {
                self.unmatched_drivers.push(driver_agent);
                None
            }
        }
    }

    /// A newly-arrived walker is evaluated against every unmatched driver;
    /// the policy-ranked winner is finalized.
    fn process_new_walker(&mut self, walker_agent: Agent, t: f64) -> Option<(MatchId, AgentId)> {
        match self
            .match_builder
            .find_best_match(&self.unmatched_drivers, &walker_agent)
        {
            Some((di, m)) => {
                let driver_agent = self.unmatched_drivers.remove(di);
                let driver_id = driver_agent.agent_id;
                let match_id = self.commit_ride(m, driver_agent, walker_agent, t);
                Some((match_id, driver_id))
            }
            None => {
                self.unmatched_walkers.push(walker_agent);
                None
            }
        }
    }

    fn commit_ride(&mut self, m: Match, mut driver_agent: Agent, mut walker_agent: Agent, t: f64) -> MatchId {
        driver_agent.assigned = true;
        walker_agent.assigned = true;

        // start_offset_s = 0 for both: RideSim::update always passes an
        // already-local time to these agents, so neither needs an offset
        // of its own.
        let walk_to_pickup_agent = Agent::new(m.walk_to_pickup.clone(), 0.0);
        let walk_from_dropoff_agent = Agent::new(m.walk_from_dropoff.clone(), 0.0);

        let ride = RideSim::new(m, driver_agent, walker_agent, walk_to_pickup_agent, walk_from_dropoff_agent, t);
        let match_id = ride.match_id;
        self.active_rides.push(ride);
        self.routes_version = t;
        match_id
    }
}
