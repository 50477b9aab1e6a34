//! Ruin heuristics: evicting assigned jobs back to their storages.
//!
//! # Reference
//!
//! Schrimpf, G. et al. (2000). "Record Breaking Optimization Results
//! Using the Ruin and Recreate Principle", *Journal of Computational
//! Physics* 159(2), 139-171.

use std::collections::BTreeSet;

use rand::Rng;
use tracing::debug;

use super::SolverEngine;

impl SolverEngine {
    /// Evicts up to `count` uniformly random jobs from the tour back to
    /// their storages' pools. Touched routes are marked changed, empty
    /// tracks are cleared, and the touched routes' states re-evaluated.
    pub(crate) fn random_ruin(&mut self, count: usize) {
        let count = count.min(self.assigned_jobs());
        if count == 0 || self.routes.is_empty() {
            return;
        }
        debug!(count, "random ruin");
        let mut touched = BTreeSet::new();

        for _ in 0..count {
            loop {
                let r = self.rng.random_range(0..self.routes.len());
                if self.routes[r].tracks().is_empty() {
                    continue;
                }
                let t = self.rng.random_range(0..self.routes[r].tracks().len());
                if self.routes[r].tracks()[t].is_empty() {
                    self.remove_empty_tracks();
                    continue;
                }
                let j = self
                    .rng
                    .random_range(0..self.routes[r].tracks()[t].jobs().len());
                self.evict(r, t, j);
                touched.insert(r);
                break;
            }
        }

        self.remove_empty_tracks();
        for r in touched {
            self.mark_route(r, true);
            self.refresh_route_state(r);
        }
    }

    /// Evicts a random seed job plus every assigned job within `radius`
    /// seconds of travel from it (on each route's own matrix).
    pub fn radial_ruin(&mut self, radius: i64) {
        if self.assigned_jobs() == 0 || self.routes.is_empty() {
            return;
        }
        let seed_location = loop {
            let r = self.rng.random_range(0..self.routes.len());
            if self.routes[r].tracks().is_empty() {
                continue;
            }
            let t = self.rng.random_range(0..self.routes[r].tracks().len());
            if self.routes[r].tracks()[t].is_empty() {
                self.remove_empty_tracks();
                continue;
            }
            let j = self
                .rng
                .random_range(0..self.routes[r].tracks()[t].jobs().len());
            let job = self.routes[r].tracks()[t].jobs()[j];
            let location = self.jobs[job.index()].location().matrix_id();
            self.evict(r, t, j);
            self.mark_route(r, true);
            break location;
        };
        debug!(radius, "radial ruin");

        let mut touched = BTreeSet::new();
        for r in 0..self.routes.len() {
            let matrix = &self.matrices[self.matrix_of[self.routes[r].courier().index()]];
            let now = self.routes[r].start_time();
            for t in 0..self.routes[r].tracks().len() {
                let jobs = self.routes[r].tracks()[t].jobs().to_vec();
                let (evicted, kept): (Vec<_>, Vec<_>) = jobs.into_iter().partition(|&job| {
                    let location = self.jobs[job.index()].location().matrix_id();
                    matrix
                        .time(seed_location, location, now)
                        .is_some_and(|tt| tt <= radius)
                });
                if evicted.is_empty() {
                    continue;
                }
                let storage = self.routes[r].tracks()[t].storage();
                self.routes[r].tracks_mut()[t].set_jobs(kept);
                self.storages[storage.index()]
                    .unassigned_mut()
                    .extend(evicted);
                touched.insert(r);
            }
        }

        self.remove_empty_tracks();
        for r in touched {
            self.mark_route(r, true);
            self.refresh_route_state(r);
        }
    }

    /// Moves one job out of a track back to its storage's pool.
    fn evict(&mut self, route: usize, track: usize, position: usize) {
        let storage = self.routes[route].tracks()[track].storage();
        let job = self.routes[route].tracks_mut()[track]
            .jobs_mut()
            .remove(position);
        self.storages[storage.index()].unassigned_mut().push(job);
    }
}
