//! Greedy tour seeding.
//!
//! # Algorithm
//!
//! Each courier leaves its start point, heads for the nearest permitted
//! storage that still has jobs it can actually serve, and keeps taking
//! the feasible job with the smallest incremental state — but only while
//! the route stays completable (the courier can return to the storage if
//! circling and still reach its end point in time). When a storage runs
//! dry the courier opens a track at the next one; when nothing fits
//! anymore it drives home.
//!
//! # Reference
//!
//! Solomon, M.M. (1987). "Algorithms for the Vehicle Routing and
//! Scheduling Problems with Time Window Constraints", *Operations
//! Research* 35(2), 254-265 (sequential insertion family).

use tracing::{debug, info};

use crate::engine::SolverEngine;
use crate::models::{JobId, State, StorageId, Track};

impl SolverEngine {
    /// Seeds one route per courier by nearest-feasible construction.
    ///
    /// Couriers are processed in arena order, each consuming jobs from
    /// the shared storage pools.
    pub fn greedy_tour(&mut self) {
        info!(
            couriers = self.routes.len(),
            unassigned = self.unassigned_jobs(),
            "seeding tour greedily"
        );
        self.check_block();
        for idx in 0..self.routes.len() {
            self.greedy_route(idx);
        }
        info!(assigned = self.assigned_jobs(), "greedy seed finished");
    }

    fn greedy_route(&mut self, idx: usize) {
        let courier = self.routes[idx].courier().index();
        let dims = self.couriers[courier].capacity().len();
        let mut current = self.couriers[courier].start().matrix_id();
        let mut state = State::new(0, 0, self.couriers[courier].cost().start());
        let mut built = false;

        loop {
            // A fresh track starts with an empty hold.
            state.load = Some(vec![0; dims]);
            let Some((sid, opened_state, first_job)) = self.open_track(idx, current, &state)
            else {
                break;
            };
            self.take_job(sid, first_job);
            let mut track = Track::with_job(first_job, sid);
            state = opened_state;
            current = self.jobs[first_job.index()].location().matrix_id();
            built = true;

            while let Some((job, next_state)) = self.pick_job(idx, sid, current, &state) {
                self.take_job(sid, job);
                track.jobs_mut().push(job);
                state = next_state;
                current = self.jobs[job.index()].location().matrix_id();
            }

            if self.routes[idx].circle_track() {
                let back = {
                    let route = &self.routes[idx];
                    self.evaluator_for(route)
                        .return_leg(current, &state, sid, route)
                };
                if let Some(leg) = back {
                    state += leg;
                    current = self.storages[sid.index()].location().matrix_id();
                }
            }

            debug!(jobs = track.len(), storage = sid.index(), "track closed");
            self.routes[idx].tracks_mut().push(track);
            self.mark_route(idx, true);
        }

        if built {
            let closing = {
                let route = &self.routes[idx];
                self.evaluator_for(route).closing_leg(current, &state, route)
            };
            if let Some(leg) = closing {
                state += leg;
                state.load = None;
                self.routes[idx].set_state(state);
            }
        }
    }

    /// Finds the nearest storage a track can be opened at: permitted,
    /// nonempty, reachable, and holding at least one servable job.
    /// Returns the storage, the state after serving that first job, and
    /// the job itself.
    fn open_track(
        &self,
        idx: usize,
        current: usize,
        state: &State,
    ) -> Option<(StorageId, State, JobId)> {
        let route = &self.routes[idx];
        let ev = self.evaluator_for(route);
        for (_, sid) in self.sorted_storages(idx, current, state) {
            let Some(leg) = ev.leg_to_storage(current, state, sid, route) else {
                continue;
            };
            let at_storage = state + &leg;
            let location = self.storages[sid.index()].location().matrix_id();
            if let Some((job, served)) = self.pick_job(idx, sid, location, &at_storage) {
                return Some((sid, served, job));
            }
        }
        None
    }

    /// The feasible job of `sid` with the smallest incremental state,
    /// subject to the route still being completable afterwards.
    fn pick_job(
        &self,
        idx: usize,
        sid: StorageId,
        from: usize,
        state: &State,
    ) -> Option<(JobId, State)> {
        let route = &self.routes[idx];
        let ev = self.evaluator_for(route);
        let storage = &self.storages[sid.index()];
        let mut best: Option<(JobId, State)> = None;

        for &job in storage.unassigned() {
            let Some(leg) = ev.leg_to_job(from, state, job, route) else {
                continue;
            };
            let served = state + &leg;
            if best.as_ref().is_some_and(|(_, b)| !(served < *b)) {
                continue;
            }

            let job_location = self.jobs[job.index()].location().matrix_id();
            let (end_state, end_point) = if route.circle_track() {
                let Some(back) = ev.return_leg(job_location, &served, sid, route) else {
                    continue;
                };
                (&served + &back, storage.location().matrix_id())
            } else {
                (served.clone(), job_location)
            };
            if ev.closing_leg(end_point, &end_state, route).is_some() {
                best = Some((job, served));
            }
        }

        best
    }

    /// Permitted storages with work left, nearest first.
    fn sorted_storages(
        &self,
        idx: usize,
        current: usize,
        state: &State,
    ) -> Vec<(i64, StorageId)> {
        let route = &self.routes[idx];
        let courier = route.courier().index();
        let matrix = &self.matrices[self.matrix_of[courier]];
        let now = route.start_time() + state.travel_time;

        let mut order = Vec::new();
        for &sid in &self.permitted[courier] {
            if self.storages[sid.index()].unassigned().is_empty() {
                continue;
            }
            let location = self.storages[sid.index()].location().matrix_id();
            let Some(tt) = matrix.time(current, location, now) else {
                continue;
            };
            order.push((tt, sid));
        }
        order.sort();
        order
    }

    fn take_job(&mut self, sid: StorageId, job: JobId) {
        let pool = self.storages[sid.index()].unassigned_mut();
        if let Some(pos) = pool.iter().position(|&j| j == job) {
            pool.remove(pos);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::SolverEngine;
    use crate::matrix::TravelMatrix;
    use crate::models::{Cost, Courier, Job, Point, State, Storage, Window};

    // Depot at 0, sites 1..=3 on a line, 1000 m / 100 s per hop.
    fn line_matrix() -> TravelMatrix {
        let n = 4usize;
        let dist: Vec<Vec<i64>> = (0..n)
            .map(|i| (0..n).map(|j| (i as i64 - j as i64).abs() * 1000).collect())
            .collect();
        let time: Vec<Vec<i64>> = (0..n)
            .map(|i| (0..n).map(|j| (i as i64 - j as i64).abs() * 100).collect())
            .collect();
        TravelMatrix::new("driver", dist, time).expect("valid")
    }

    fn setup(capacity: i32, shift_end: i64) -> SolverEngine {
        let storages = vec![Storage::new(
            "depot",
            0,
            Point::new(0, 0.0, 0.0),
            Window::new(0, shift_end).expect("valid"),
        )];
        let couriers = vec![Courier::new(
            "ann",
            "driver",
            Cost::new(0.0, 1.0, 0.0),
            vec![capacity],
            Window::new(0, shift_end).expect("valid"),
            Point::new(0, 0.0, 0.0),
            Point::new(0, 0.0, 0.0),
        )
        .with_depots(vec!["depot".into()])];
        SolverEngine::new(storages, couriers, vec![line_matrix()], true)
            .expect("valid setup")
            .with_seed(3)
    }

    fn job(id: &str, site: usize) -> Job {
        Job::new(
            id,
            0,
            vec![1],
            Point::new(site, 0.0, 0.0),
            vec![Window::new(0, 1_000_000).expect("valid")],
        )
    }

    #[test]
    fn test_greedy_serves_everything_when_roomy() {
        let mut e = setup(10, 1_000_000);
        e.add_jobs(vec![job("a", 1), job("b", 2), job("c", 3)], "depot");
        e.greedy_tour();
        assert_eq!(e.assigned_jobs(), 3);
        assert_eq!(e.unassigned_jobs(), 0);
        // One track suffices: the hold fits all three.
        assert_eq!(e.routes()[0].tracks().len(), 1);
    }

    #[test]
    fn test_greedy_picks_nearest_first() {
        let mut e = setup(10, 1_000_000);
        e.add_jobs(vec![job("far", 3), job("near", 1)], "depot");
        e.greedy_tour();
        let first = e.routes()[0].tracks()[0].jobs()[0];
        assert_eq!(e.job(first).id(), "near");
    }

    #[test]
    fn test_greedy_splits_tracks_on_capacity() {
        let mut e = setup(2, 1_000_000);
        e.add_jobs(vec![job("a", 1), job("b", 2), job("c", 3)], "depot");
        e.greedy_tour();
        assert_eq!(e.assigned_jobs(), 3);
        // Capacity two forces a reload: at least two tracks.
        assert!(e.routes()[0].tracks().len() >= 2);
    }

    #[test]
    fn test_greedy_state_matches_evaluator() {
        let mut e = setup(2, 1_000_000);
        e.add_jobs(vec![job("a", 1), job("b", 2), job("c", 3)], "depot");
        e.greedy_tour();
        let route = &e.routes()[0];
        let fresh = e.evaluator_for(route).route_state(route).expect("feasible");
        assert_eq!(&fresh, route.state());
    }

    #[test]
    fn test_greedy_respects_shift_end() {
        // Shift of 450 s: depot→1→depot→end fits (200 s), anything
        // deeper does not once the return legs are counted.
        let mut e = setup(10, 450);
        e.add_jobs(vec![job("a", 1), job("b", 3)], "depot");
        e.greedy_tour();
        assert_eq!(e.assigned_jobs(), 1);
        assert_eq!(e.unassigned_jobs(), 1);
    }

    #[test]
    fn test_greedy_no_jobs_leaves_zero_state() {
        let mut e = setup(10, 1_000_000);
        e.greedy_tour();
        assert!(e.routes()[0].tracks().is_empty());
        assert_eq!(e.get_state(), State::default());
    }
}
