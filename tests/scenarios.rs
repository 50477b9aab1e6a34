//! End-to-end scenarios over the public engine API.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use rvrp_engine::engine::{ImproveConfig, SolverEngine};
use rvrp_engine::evaluation::RouteEvaluator;
use rvrp_engine::matrix::TravelMatrix;
use rvrp_engine::models::{Cost, Courier, Job, Point, Storage, Window};

const DAY: i64 = 86_400;

/// Line world: location 0 is the depot, locations 1..n sit on a line
/// 1000 m / 100 s apart per hop.
fn line_matrix(n: usize) -> TravelMatrix {
    let dist: Vec<Vec<i64>> = (0..n)
        .map(|i| (0..n).map(|j| (i as i64 - j as i64).abs() * 1000).collect())
        .collect();
    let time: Vec<Vec<i64>> = (0..n)
        .map(|i| (0..n).map(|j| (i as i64 - j as i64).abs() * 100).collect())
        .collect();
    TravelMatrix::new("driver", dist, time).expect("square tables")
}

fn depot() -> Storage {
    Storage::new(
        "depot",
        0,
        Point::new(0, 0.0, 0.0),
        Window::new(0, DAY).expect("valid window"),
    )
}

fn courier(name: &str, capacity: Vec<i32>) -> Courier {
    Courier::new(
        name,
        "driver",
        Cost::new(0.0, 1.0, 0.0),
        capacity,
        Window::new(0, DAY).expect("valid window"),
        Point::new(0, 0.0, 0.0),
        Point::new(0, 0.0, 0.0),
    )
    .with_depots(vec!["depot".into()])
}

fn job(id: &str, site: usize, value: Vec<i32>) -> Job {
    Job::new(
        id,
        0,
        value,
        Point::new(site, 0.0, 0.0),
        vec![Window::new(0, DAY).expect("valid window")],
    )
}

/// Every job id lives in exactly one place: a track or its storage pool.
fn assert_conservation(engine: &SolverEngine, expected: usize) {
    let mut seen = HashSet::new();
    for route in engine.routes() {
        for track in route.tracks() {
            for &job in track.jobs() {
                assert!(seen.insert(job), "job appears twice");
            }
        }
    }
    for storage in engine.storages() {
        for &job in storage.unassigned() {
            assert!(seen.insert(job), "job appears twice");
        }
    }
    assert_eq!(seen.len(), expected, "job lost or invented");
}

/// Re-evaluates every route through the public evaluator and checks the
/// cached states did not go stale (state additivity, property of the
/// whole engine).
fn assert_states_fresh(engine: &SolverEngine) {
    for route in engine.routes() {
        let courier = &engine.couriers()[route.courier().index()];
        let evaluator = RouteEvaluator::new(
            engine.jobs(),
            engine.storages(),
            courier,
            engine.matrix_for(route.courier()),
        );
        let fresh = evaluator
            .route_state(route)
            .expect("committed route must stay feasible");
        assert_eq!(&fresh, route.state(), "cached state went stale");
    }
}

// S1 — feasibility and waiting: the job's window opens 600 s after the
// earliest possible arrival.
#[test]
fn s1_waiting_for_window() {
    let mut engine = SolverEngine::new(
        vec![depot()],
        vec![courier("ann", vec![10])],
        vec![line_matrix(2)],
        true,
    )
    .expect("valid setup")
    .with_seed(1);

    // Earliest arrival at site 1 is 100 s; the window opens at 700 s.
    let delayed = Job::new(
        "late",
        30,
        vec![1],
        Point::new(1, 0.0, 0.0),
        vec![Window::new(700, DAY).expect("valid window")],
    );
    engine.add_job(delayed, "depot");
    engine.build_tour();

    assert_eq!(engine.assigned_jobs(), 1);
    let state = engine.get_state();
    // Transit out 100 s + 600 s wait + 30 s service + 100 s return.
    assert_eq!(state.travel_time, 100 + 600 + 30 + 100);
    // Circled track: out and back.
    assert_eq!(state.distance, 2 * 1000);
}

// S2 — capacity: three unit jobs against a capacity of two.
#[test]
fn s2_capacity_reject() {
    let mut engine = SolverEngine::new(
        vec![depot()],
        vec![courier("ann", vec![2])],
        vec![line_matrix(4)],
        true,
    )
    .expect("valid setup")
    .with_seed(2);

    engine.add_jobs(
        vec![
            job("a", 1, vec![1]),
            job("b", 2, vec![1]),
            job("c", 3, vec![1]),
        ],
        "depot",
    );
    engine.build_tour();

    // A reload lets everything through, but never more than two per
    // track.
    for route in engine.routes() {
        for track in route.tracks() {
            assert!(track.len() <= 2, "track exceeds capacity");
        }
    }
    assert_conservation(&engine, 3);
}

// S2b — one track only: with the shift cut so short that a second track
// cannot be opened, at most two jobs are served.
#[test]
fn s2_capacity_single_track() {
    let storages = vec![depot()];
    let couriers = vec![Courier::new(
        "ann",
        "driver",
        Cost::new(0.0, 1.0, 0.0),
        vec![2],
        // Enough for depot→1→2→depot (600 s) but not for a second trip.
        Window::new(0, 700).expect("valid window"),
        Point::new(0, 0.0, 0.0),
        Point::new(0, 0.0, 0.0),
    )
    .with_depots(vec!["depot".into()])];
    let mut engine = SolverEngine::new(storages, couriers, vec![line_matrix(4)], true)
        .expect("valid setup")
        .with_seed(2);

    engine.add_jobs(
        vec![
            job("a", 1, vec![1]),
            job("b", 2, vec![1]),
            job("c", 3, vec![1]),
        ],
        "depot",
    );
    engine.build_tour();
    engine.improve(ImproveConfig {
        max_fails: 2,
        ..ImproveConfig::default()
    });

    assert!(engine.assigned_jobs() <= 2);
    assert!(engine.unassigned_jobs() >= 1);
    assert_conservation(&engine, 3);
}

// S3 — skills: a job demanding a skill the courier lacks is never
// assigned.
#[test]
fn s3_skill_mismatch_never_assigned() {
    let mut engine = SolverEngine::new(
        vec![depot()],
        vec![courier("ann", vec![10])],
        vec![line_matrix(3)],
        true,
    )
    .expect("valid setup")
    .with_seed(3);

    engine.add_job(job("plain", 1, vec![1]), "depot");
    engine.add_job(
        job("special", 2, vec![1]).with_skills(vec!["X".into()]),
        "depot",
    );
    engine.build_tour();
    engine.improve(ImproveConfig {
        max_fails: 3,
        ..ImproveConfig::default()
    });

    assert_eq!(engine.assigned_jobs(), 1);
    assert_eq!(engine.unassigned_jobs(), 1);
    let unassigned = engine.storages()[0].unassigned();
    assert_eq!(engine.job(unassigned[0]).id(), "special");
}

// S4 — 2-opt: a deliberately crossed visit order is untangled by
// improvement and stays stable afterwards.
#[test]
fn s4_two_opt_untangles() {
    // Square world: depot in the middle of four sites.
    let coords: [(i64, i64); 5] = [(0, 0), (10, 10), (10, -10), (-10, -10), (-10, 10)];
    let scale = 100;
    let n = coords.len();
    let dist: Vec<Vec<i64>> = (0..n)
        .map(|i| {
            (0..n)
                .map(|j| {
                    let dx = coords[i].0 - coords[j].0;
                    let dy = coords[i].1 - coords[j].1;
                    ((((dx * dx + dy * dy) as f64).sqrt()) * scale as f64) as i64
                })
                .collect()
        })
        .collect();
    let time = dist.clone();
    let matrix = TravelMatrix::new("driver", dist, time).expect("square tables");

    let mut engine = SolverEngine::new(
        vec![depot()],
        vec![courier("ann", vec![10])],
        vec![matrix],
        true,
    )
    .expect("valid setup")
    .with_seed(4);

    engine.add_jobs(
        vec![
            job("p1", 1, vec![1]),
            job("p2", 2, vec![1]),
            job("p3", 3, vec![1]),
            job("p4", 4, vec![1]),
        ],
        "depot",
    );
    engine.build_tour();
    let before = engine.get_state();

    engine.improve(ImproveConfig {
        max_fails: 3,
        post_three_opt: true,
        post_cross: true,
        ..ImproveConfig::default()
    });
    let after = engine.get_state();

    assert_eq!(engine.assigned_jobs(), 4);
    assert!(after <= before, "improvement went backwards");
    assert_conservation(&engine, 4);
    assert_states_fresh(&engine);

    // A second improvement run finds nothing new.
    let settled = engine.get_state();
    engine.improve(ImproveConfig {
        max_fails: 1,
        ..ImproveConfig::default()
    });
    assert!(engine.get_state() <= settled);
}

// S6 — deadline: a one-second budget returns promptly and never loses
// jobs.
#[test]
fn s6_deadline_budget() {
    let mut engine = SolverEngine::new(
        vec![depot()],
        vec![courier("ann", vec![4]), courier("bob", vec![4])],
        vec![line_matrix(9)],
        true,
    )
    .expect("valid setup")
    .with_seed(6);

    let jobs: Vec<Job> = (1..9).map(|i| job(&format!("j{i}"), i, vec![1])).collect();
    engine.add_jobs(jobs, "depot");
    engine.build_tour();
    let initial = engine.assigned_jobs();

    let started = Instant::now();
    engine.improve(ImproveConfig {
        work_time: 1,
        max_fails: 9_999,
        ..ImproveConfig::default()
    });
    assert!(
        started.elapsed() < Duration::from_millis(1_500),
        "deadline overrun: {:?}",
        started.elapsed()
    );
    assert!(engine.assigned_jobs() >= initial);
    assert_conservation(&engine, 8);
    assert_states_fresh(&engine);
}

// Multi-depot binding: jobs may only be served through their own
// storage, and only by couriers permitted there.
#[test]
fn multi_depot_binding() {
    let n = 7;
    let storages = vec![
        depot(),
        Storage::new(
            "east",
            0,
            Point::new(6, 0.0, 0.0),
            Window::new(0, DAY).expect("valid window"),
        ),
    ];
    let couriers = vec![
        courier("ann", vec![10]), // only "depot"
        Courier::new(
            "bob",
            "driver",
            Cost::new(0.0, 1.0, 0.0),
            vec![10],
            Window::new(0, DAY).expect("valid window"),
            Point::new(0, 0.0, 0.0),
            Point::new(0, 0.0, 0.0),
        )
        .with_depots(vec!["depot".into(), "east".into()]),
    ];
    let mut engine = SolverEngine::new(storages, couriers, vec![line_matrix(n)], true)
        .expect("valid setup")
        .with_seed(7);

    engine.add_jobs(vec![job("w1", 1, vec![1]), job("w2", 2, vec![1])], "depot");
    engine.add_jobs(vec![job("e1", 5, vec![1])], "east");
    engine.build_tour();
    engine.improve(ImproveConfig {
        max_fails: 2,
        ..ImproveConfig::default()
    });

    assert_conservation(&engine, 3);
    // Track/storage binding is structural: every track's jobs came from
    // its storage, and "east" tracks only appear on bob's route.
    let east = engine
        .storages()
        .iter()
        .position(|s| s.name() == "east")
        .expect("exists");
    for (idx, route) in engine.routes().iter().enumerate() {
        for track in route.tracks() {
            if track.storage().index() == east {
                assert_eq!(idx, 1, "ann is not permitted at east");
            }
        }
    }
}

// Priorities: the urgent tier is placed even when it crowds out cheaper
// work.
#[test]
fn priority_tier_wins_scarce_slot() {
    let storages = vec![depot()];
    let couriers = vec![Courier::new(
        "ann",
        "driver",
        Cost::new(0.0, 1.0, 0.0),
        vec![1],
        Window::new(0, 900).expect("valid window"),
        Point::new(0, 0.0, 0.0),
        Point::new(0, 0.0, 0.0),
    )
    .with_depots(vec!["depot".into()])];
    let mut engine = SolverEngine::new(storages, couriers, vec![line_matrix(5)], true)
        .expect("valid setup")
        .with_seed(8)
        .with_priority_tiers(true);

    engine.add_job(job("cheap", 1, vec![1]).with_priority(3), "depot");
    engine.add_job(job("urgent", 4, vec![1]).with_priority(0), "depot");
    engine.build_tour();

    let assigned: Vec<String> = engine
        .routes()
        .iter()
        .flat_map(|r| r.tracks())
        .flat_map(|t| t.jobs())
        .map(|&j| engine.job(j).id().to_string())
        .collect();
    assert_eq!(assigned, vec!["urgent".to_string()]);
}

// Time-sliced matrices: once past end_time the world is unroutable and
// jobs stay unassigned.
#[test]
fn sliced_matrix_expires() {
    let slice_d = vec![vec![0i64, 1000], vec![1000, 0]];
    let slice_t = vec![vec![0i64, 100], vec![100, 0]];
    let matrix = TravelMatrix::time_sliced(
        "driver",
        vec![slice_d.clone(), slice_d],
        vec![slice_t.clone(), slice_t],
        300,
        0,
        400,
    )
    .expect("valid matrix");

    let storages = vec![depot()];
    let couriers = vec![courier("ann", vec![10])];
    let mut engine = SolverEngine::new(storages, couriers, vec![matrix], true)
        .expect("valid setup")
        .with_seed(9);

    // The job's window only opens at 600, after the matrix expires; the
    // waiting makes every continuation unroutable.
    let late = Job::new(
        "late",
        0,
        vec![1],
        Point::new(1, 0.0, 0.0),
        vec![Window::new(600, DAY).expect("valid window")],
    );
    engine.add_job(late, "depot");
    engine.build_tour();

    assert_eq!(engine.assigned_jobs(), 0);
    assert_eq!(engine.unassigned_jobs(), 1);
}

// Conservation under the full loop, including ruin and recreate.
#[test]
fn conservation_through_improvement() {
    let mut engine = SolverEngine::new(
        vec![depot()],
        vec![courier("ann", vec![3]), courier("bob", vec![3])],
        vec![line_matrix(8)],
        true,
    )
    .expect("valid setup")
    .with_seed(10);

    let jobs: Vec<Job> = (1..8).map(|i| job(&format!("j{i}"), i, vec![1])).collect();
    engine.add_jobs(jobs, "depot");
    engine.build_tour();
    engine.improve(ImproveConfig {
        max_fails: 4,
        post_three_opt: true,
        post_cross: true,
        ..ImproveConfig::default()
    });

    assert_conservation(&engine, 7);
    assert_states_fresh(&engine);
    // Capacity holds on every track.
    for route in engine.routes() {
        for track in route.tracks() {
            let load: i32 = track
                .jobs()
                .iter()
                .map(|&j| engine.job(j).value()[0])
                .sum();
            assert!(load <= 3);
        }
    }
}

// Conservation and state freshness across a spread of random seeds.
#[test]
fn conservation_across_seeds() {
    for seed in [0u64, 1, 7, 1234, 98_765] {
        let mut engine = SolverEngine::new(
            vec![depot()],
            vec![courier("ann", vec![2]), courier("bob", vec![2])],
            vec![line_matrix(6)],
            true,
        )
        .expect("valid setup")
        .with_seed(seed);

        let jobs: Vec<Job> = (1..6).map(|i| job(&format!("j{i}"), i, vec![1])).collect();
        engine.add_jobs(jobs, "depot");
        engine.build_tour();
        engine.improve(ImproveConfig {
            max_fails: 2,
            ..ImproveConfig::default()
        });

        assert_conservation(&engine, 5);
        assert_states_fresh(&engine);
    }
}

// Parsing the boundary time format.
#[test]
fn window_parse_boundary_format() {
    let window = Window::parse("2021-06-01T10:00:00Z", "2021-06-01T12:30:00Z")
        .expect("well-formed timestamps");
    assert_eq!(window.end() - window.start(), 9_000);
    assert!(Window::parse("2021-13-99T99:99:99Z", "2021-06-01T12:30:00Z").is_none());
}
