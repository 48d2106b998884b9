mod support;

use detour_core::dispatcher::AgentKind;
use detour_core::ride_sim::Phase;
use detour_core::snapshot::SnapshotPublisher;

use support::{build_dispatcher, compatible_driver_and_walker, submit, TestDispatcherConfig};

#[test]
fn committed_ride_progresses_through_every_phase_and_then_retires() {
    let config = TestDispatcherConfig::default().with_initial_speed(200.0);
    let (mut dispatcher, tx) = build_dispatcher(config);
    let ((driver_start, driver_dest), (walker_start, walker_dest)) = compatible_driver_and_walker();

    submit(&tx, AgentKind::Driver, driver_start, driver_dest);
    dispatcher.tick();
    submit(&tx, AgentKind::Walker, walker_start, walker_dest);
    dispatcher.tick();
    assert_eq!(dispatcher.active_rides().len(), 1);

    let mut seen_phases = vec![dispatcher.active_rides()[0].phase];
    for _ in 0..500 {
        if dispatcher.active_rides().is_empty() {
            break;
        }
        dispatcher.tick();
        if let Some(ride) = dispatcher.active_rides().first() {
            if seen_phases.last() != Some(&ride.phase) {
                seen_phases.push(ride.phase);
            }
        }
    }

    assert!(
        dispatcher.active_rides().is_empty(),
        "ride should have retired after reaching Done within the tick budget"
    );
    assert!(
        seen_phases.windows(2).all(|w| w[0] <= w[1]),
        "phase must never regress: {seen_phases:?}"
    );
    assert_eq!(seen_phases.first(), Some(&Phase::WalkToPickup));
}

#[test]
fn positions_snapshot_tracks_the_active_ride_and_routes_snapshot_is_versioned() {
    let (mut dispatcher, tx) = build_dispatcher(TestDispatcherConfig::default());
    let ((driver_start, driver_dest), (walker_start, walker_dest)) = compatible_driver_and_walker();

    submit(&tx, AgentKind::Driver, driver_start, driver_dest);
    dispatcher.tick();
    submit(&tx, AgentKind::Walker, walker_start, walker_dest);
    dispatcher.tick();

    let mut publisher = SnapshotPublisher::new(std::env::temp_dir().join("detour_core_integration_test_unused"));

    let positions = publisher.build_positions(&dispatcher);
    assert_eq!(positions.sims.len(), 1);
    assert_eq!(positions.leftover_drivers.len(), 0);
    assert_eq!(positions.leftover_walkers.len(), 0);

    let routes_first = publisher.build_routes_if_changed(&dispatcher);
    assert!(routes_first.is_some());
    assert_eq!(routes_first.unwrap().routes.len(), 1);

    let routes_second = publisher.build_routes_if_changed(&dispatcher);
    assert!(
        routes_second.is_none(),
        "routes snapshot should not be re-emitted without a change to the active ride set"
    );

    dispatcher.tick();
    let routes_after_more_ticking = publisher.build_routes_if_changed(&dispatcher);
    assert!(
        routes_after_more_ticking.is_none(),
        "ride is still in progress, so the route set hasn't changed"
    );
}
