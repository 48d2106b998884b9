#![allow(dead_code)]

use std::sync::mpsc::Sender;
use std::sync::Arc;

use detour_core::dispatcher::{
    AgentKind, CreateRequestPayload, Dispatcher, DispatcherConfig, IngressRequest,
};
use detour_core::geo::Coordinate;
use detour_core::ids::RequestId;
use detour_core::matching::MatchPolicy;
use detour_core::routing::testkit::GridRoutingBackend;
use detour_core::routing::CachedRoutingClient;

/// Builder configuration for a reproducible test dispatcher.
#[derive(Clone, Debug)]
pub struct TestDispatcherConfig {
    pub segments: usize,
    pub policy: MatchPolicy,
    pub initial_speed: f64,
    pub always_fail_routing: bool,
}

impl Default for TestDispatcherConfig {
    fn default() -> Self {
        Self {
            segments: 30,
            policy: MatchPolicy::default(),
            initial_speed: 0.2,
            always_fail_routing: false,
        }
    }
}

impl TestDispatcherConfig {
    pub fn with_policy(mut self, policy: MatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_initial_speed(mut self, speed: f64) -> Self {
        self.initial_speed = speed;
        self
    }

    pub fn failing_routing(mut self) -> Self {
        self.always_fail_routing = true;
        self
    }
}

/// Build a dispatcher wired to a deterministic in-memory routing backend.
pub fn build_dispatcher(config: TestDispatcherConfig) -> (Dispatcher, Sender<IngressRequest>) {
    let backend: Arc<GridRoutingBackend> = if config.always_fail_routing {
        Arc::new(GridRoutingBackend::failing())
    } else {
        Arc::new(GridRoutingBackend::with_segments(config.segments))
    };
    let routing = Arc::new(CachedRoutingClient::new(backend));
    let dispatcher_config = DispatcherConfig::default()
        .with_match_policy(config.policy)
        .with_initial_speed(config.initial_speed);
    Dispatcher::new(routing, dispatcher_config)
}

/// Submit an ingress create-request and return its id for status polling.
pub fn submit(
    tx: &Sender<IngressRequest>,
    kind: AgentKind,
    start: Coordinate,
    dest: Coordinate,
) -> RequestId {
    let request_id = RequestId::new();
    tx.send(IngressRequest {
        request_id,
        payload: CreateRequestPayload { kind, start, dest },
    })
    .expect("dispatcher ingress receiver dropped");
    request_id
}

/// A driver route that runs east for roughly 22km, and a walker route that
/// parallels a slice of it closely enough to produce a worthwhile detour.
pub fn compatible_driver_and_walker() -> (
    (Coordinate, Coordinate),
    (Coordinate, Coordinate),
) {
    (
        (Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 0.2)),
        (Coordinate::new(0.0005, 0.02), Coordinate::new(0.0005, 0.18)),
    )
}
