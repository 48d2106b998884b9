//! Performance benchmarks for detour_core using Criterion.rs.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use detour_core::agent::Agent;
use detour_core::geo::Coordinate;
use detour_core::matching::candidates::topk_by_haversine;
use detour_core::matching::{MatchBuilder, MatchPolicy};
use detour_core::route::Profile;
use detour_core::routing::testkit::GridRoutingBackend;
use detour_core::routing::{CachedRoutingClient, RoutingBackend};

fn straight_route(segments: usize, total_lon: f64) -> Arc<detour_core::route::RouteData> {
    let backend = GridRoutingBackend::with_segments(segments);
    let resp = backend
        .fetch(
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, total_lon),
            Profile::Driving,
        )
        .unwrap();
    let geometry = resp
        .coordinates_lat_lon
        .iter()
        .map(|(lat, lon)| Coordinate::new(*lat, *lon))
        .collect();
    Arc::new(
        detour_core::route::RouteData::new(
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, total_lon),
            geometry,
            resp.seg_dist_m,
            resp.seg_time_s,
            Profile::Driving,
        )
        .unwrap(),
    )
}

fn bench_position_at_time(c: &mut Criterion) {
    let mut group = c.benchmark_group("position_at_time");
    for segments in [10usize, 100, 1_000] {
        let route = straight_route(segments, 1.0);
        group.bench_with_input(
            BenchmarkId::from_parameter(segments),
            &route,
            |b, route| {
                b.iter(|| {
                    black_box(route.position_at_time(black_box(route.total_time_s * 0.37)));
                });
            },
        );
    }
    group.finish();
}

fn bench_topk_by_haversine(c: &mut Criterion) {
    let mut group = c.benchmark_group("topk_by_haversine");
    for n in [50usize, 500, 5_000] {
        let points: Vec<Coordinate> = (0..n)
            .map(|i| Coordinate::new(0.0, i as f64 * 0.001))
            .collect();
        let target = Coordinate::new(0.0001, (n as f64 * 0.0005));
        group.bench_with_input(BenchmarkId::from_parameter(n), &points, |b, points| {
            b.iter(|| black_box(topk_by_haversine(points, black_box(target), 15)));
        });
    }
    group.finish();
}

fn bench_find_best_match(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_best_match");
    for num_drivers in [10usize, 50, 200] {
        let backend = Arc::new(GridRoutingBackend::with_segments(40));
        let routing = Arc::new(CachedRoutingClient::new(backend));
        let builder = MatchBuilder::new(routing, MatchPolicy::default());

        let drivers: Vec<Agent> = (0..num_drivers)
            .map(|i| {
                let offset = i as f64 * 0.0002;
                Agent::new(straight_route(40, 0.2), 0.0).with_time_scale(1.0 + offset)
            })
            .collect();
        let walker = Agent::new(
            {
                let backend = GridRoutingBackend::with_segments(20);
                let resp = backend
                    .fetch(
                        Coordinate::new(0.0005, 0.02),
                        Coordinate::new(0.0005, 0.18),
                        Profile::Walking,
                    )
                    .unwrap();
                let geometry = resp
                    .coordinates_lat_lon
                    .iter()
                    .map(|(lat, lon)| Coordinate::new(*lat, *lon))
                    .collect();
                Arc::new(
                    detour_core::route::RouteData::new(
                        Coordinate::new(0.0005, 0.02),
                        Coordinate::new(0.0005, 0.18),
                        geometry,
                        resp.seg_dist_m,
                        resp.seg_time_s,
                        Profile::Walking,
                    )
                    .unwrap(),
                )
            },
            0.0,
        );

        group.bench_with_input(
            BenchmarkId::from_parameter(num_drivers),
            &(drivers, walker),
            |b, (drivers, walker)| {
                b.iter(|| black_box(builder.find_best_match(drivers, walker)));
            },
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_position_at_time,
    bench_topk_by_haversine,
    bench_find_best_match
);
criterion_main!(benches);
