//! Priority-tiered cheapest insertion over the whole tour.
//!
//! # Algorithm
//!
//! For the current priority tier (0 first, then ascending; all tiers
//! merge when priorities are disabled), every unassigned job is priced
//! against two placement families: into an existing track of its own
//! storage at every position, or as a fresh single-job track at every
//! position among a route's tracks. The globally cheapest feasible delta
//! commits and the scan repeats; the tier advances once nothing fits.
//!
//! Insertion both seeds tours ([`SolverEngine::build_tour`]) and serves
//! as the recreate step of the improvement loop.

use tracing::{debug, info};

use crate::engine::SolverEngine;
use crate::local_search::segment;
use crate::models::{JobId, Route, State, StorageId, Track};

/// Where a candidate insertion lands.
enum Placement {
    IntoTrack { track: usize, position: usize },
    NewTrack { position: usize },
}

struct Candidate {
    route: usize,
    placement: Placement,
    delta: State,
    new_state: State,
}

impl SolverEngine {
    /// Seeds the tour by repeated best insertion, honoring priority
    /// tiers when they are enabled.
    pub fn build_tour(&mut self) {
        info!(
            unassigned = self.unassigned_jobs(),
            "building tour by best insertion"
        );
        self.check_block();
        self.unassigned_insert();
        info!(assigned = self.assigned_jobs(), "insertion finished");
    }

    /// Inserts unassigned jobs until nothing fits anymore; returns
    /// whether anything was inserted.
    pub(crate) fn unassigned_insert(&mut self) -> bool {
        let mut inserted = false;
        if self.use_priority {
            let Some(max) = self.max_priority() else {
                return false;
            };
            for tier in 0..=max {
                while self.insert_best(Some(tier)) {
                    inserted = true;
                }
            }
        } else {
            while self.insert_best(None) {
                inserted = true;
            }
        }
        inserted
    }

    /// Highest tier number among unassigned jobs (tier 0 is the most
    /// urgent; larger numbers insert later).
    fn max_priority(&self) -> Option<u32> {
        self.storages
            .iter()
            .flat_map(|s| s.unassigned())
            .map(|job| self.jobs[job.index()].priority())
            .max()
    }

    /// One scan: commits the globally cheapest feasible insertion of the
    /// given tier (or of any job when `tier` is `None`).
    fn insert_best(&mut self, tier: Option<u32>) -> bool {
        let mut best: Option<(Candidate, StorageId, usize, JobId)> = None;

        for s in 0..self.storages.len() {
            let sid = StorageId(s as u32);
            for (pool_idx, &job) in self.storages[s].unassigned().iter().enumerate() {
                if tier.is_some_and(|t| self.jobs[job.index()].priority() != t) {
                    continue;
                }
                let into = self.best_into_track(job, sid);
                let fresh = self.best_new_track(job, sid);
                let candidate = match (into, fresh) {
                    (None, None) => continue,
                    (Some(c), None) | (None, Some(c)) => c,
                    (Some(a), Some(b)) => {
                        if a.delta < b.delta {
                            a
                        } else {
                            b
                        }
                    }
                };
                if best
                    .as_ref()
                    .is_none_or(|(b, _, _, _)| candidate.delta < b.delta)
                {
                    best = Some((candidate, sid, pool_idx, job));
                }
            }
        }

        let Some((candidate, sid, pool_idx, job)) = best else {
            return false;
        };

        let route = &mut self.routes[candidate.route];
        match candidate.placement {
            Placement::IntoTrack { track, position } => {
                let jobs = segment::insert(position, job, route.tracks()[track].jobs());
                route.tracks_mut()[track].set_jobs(jobs);
            }
            Placement::NewTrack { position } => {
                route.tracks_mut().insert(position, Track::with_job(job, sid));
            }
        }
        route.set_state(candidate.new_state);
        self.storages[sid.index()].unassigned_mut().remove(pool_idx);
        self.mark_route(candidate.route, true);
        debug!(
            job = %self.jobs[job.index()].id(),
            route = candidate.route,
            "inserted"
        );
        true
    }

    /// Cheapest insertion of `job` into an existing track of its storage.
    fn best_into_track(&self, job: JobId, sid: StorageId) -> Option<Candidate> {
        let mut best: Option<Candidate> = None;
        for (r, route) in self.routes.iter().enumerate() {
            if !self.insertion_route_ok(r, route, job, sid) {
                continue;
            }
            let ev = self.evaluator_for(route);
            for (t, track) in route.tracks().iter().enumerate() {
                if track.storage() != sid || !self.capacity_fits(route, track, job) {
                    continue;
                }
                for position in 0..=track.jobs().len() {
                    let mut probe = route.clone();
                    probe.tracks_mut()[t].set_jobs(segment::insert(
                        position,
                        job,
                        track.jobs(),
                    ));
                    let Some(new_state) = ev.route_state(&probe) else {
                        continue;
                    };
                    let delta = &new_state - route.state();
                    if best.as_ref().is_none_or(|b| delta < b.delta) {
                        best = Some(Candidate {
                            route: r,
                            placement: Placement::IntoTrack { track: t, position },
                            delta,
                            new_state,
                        });
                    }
                }
            }
        }
        best
    }

    /// Cheapest insertion of `job` as a fresh single-job track.
    fn best_new_track(&self, job: JobId, sid: StorageId) -> Option<Candidate> {
        let mut best: Option<Candidate> = None;
        for (r, route) in self.routes.iter().enumerate() {
            if !self.insertion_route_ok(r, route, job, sid) {
                continue;
            }
            let ev = self.evaluator_for(route);
            let track = Track::with_job(job, sid);

            // Cheap lower bound before trying every position.
            let Some(optimistic) = ev.track_state(&track, route) else {
                continue;
            };
            if !ev.check_courier(&(route.state() + &optimistic), route) {
                continue;
            }

            for position in 0..=route.tracks().len() {
                let mut probe = route.clone();
                probe.tracks_mut().insert(position, track.clone());
                let Some(new_state) = ev.route_state(&probe) else {
                    continue;
                };
                let delta = &new_state - route.state();
                if best.as_ref().is_none_or(|b| delta < b.delta) {
                    best = Some(Candidate {
                        route: r,
                        placement: Placement::NewTrack { position },
                        delta,
                        new_state,
                    });
                }
            }
        }
        best
    }

    fn insertion_route_ok(&self, idx: usize, route: &Route, job: JobId, sid: StorageId) -> bool {
        let courier = &self.couriers[route.courier().index()];
        self.check_route(idx)
            && self.permits(route.courier(), sid)
            && crate::evaluation::has_skills(self.jobs[job.index()].skills(), courier.skills())
            && crate::evaluation::has_skills(
                self.storages[sid.index()].skills(),
                courier.skills(),
            )
    }

    /// Component-wise capacity pre-screen for adding `job` to `track`.
    fn capacity_fits(&self, route: &Route, track: &Track, job: JobId) -> bool {
        let capacity = self.couriers[route.courier().index()].capacity();
        let job = &self.jobs[job.index()];
        if job.value().len() != capacity.len() {
            return false;
        }
        let mut load = job.value().to_vec();
        for &carried in track.jobs() {
            for (acc, v) in load
                .iter_mut()
                .zip(self.jobs[carried.index()].value())
            {
                *acc += *v;
            }
        }
        load.iter().zip(capacity).all(|(have, cap)| have <= cap)
    }
}
