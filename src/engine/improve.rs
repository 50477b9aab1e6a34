//! The ruin-and-recreate improvement loop.
//!
//! One *phase* is a pass of intra- and inter-route improvement (in random
//! order) plus an attempt to insert unassigned jobs. Phases repeat while
//! something changes; when nothing does and post-optimization is allowed,
//! 3-opt and cross-exchange get one last attempt. Around that inner loop
//! the engine ruins part of the best tour and reinserts, keeping the best
//! tour seen and restoring it at the end. The tabu memory decides whether
//! an operator's improved copy may replace the original; routes untouched
//! for two consecutive phases are skipped.

use std::time::{Duration, Instant};

use rand::Rng;
use tracing::{debug, info};

use crate::local_search::{deadline_passed, inter, intra};
use crate::models::{JobId, Route, State};

use super::SolverEngine;

/// Knobs of [`SolverEngine::improve`].
///
/// # Examples
///
/// ```
/// use rvrp_engine::engine::ImproveConfig;
///
/// let config = ImproveConfig {
///     work_time: 30,
///     post_three_opt: true,
///     ..ImproveConfig::default()
/// };
/// assert_eq!(config.max_fails, 5);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ImproveConfig {
    /// Wall-clock budget in seconds; 0 disables the deadline.
    pub work_time: u64,
    /// Consecutive unimproving outer iterations tolerated before
    /// stopping.
    pub max_fails: u32,
    /// Phase-count bound; 0 disables it.
    pub phases: u32,
    /// Allow 3-opt as a post-optimization last resort.
    pub post_three_opt: bool,
    /// Allow cross-exchange as a post-optimization last resort.
    pub post_cross: bool,
}

impl Default for ImproveConfig {
    fn default() -> Self {
        Self {
            work_time: 0,
            max_fails: 5,
            phases: 0,
            post_three_opt: false,
            post_cross: false,
        }
    }
}

enum InterOp {
    Swap,
    Replace,
    Cross,
}

impl SolverEngine {
    /// Improves the current tour in place.
    ///
    /// A no-op when the fleet is empty or there are no jobs anywhere.
    /// The best tour seen during the run is always the one left behind.
    pub fn improve(&mut self, config: ImproveConfig) {
        if self.routes.is_empty() || self.assigned_jobs() + self.unassigned_jobs() == 0 {
            return;
        }
        let started = Instant::now();
        let deadline = (config.work_time > 0)
            .then(|| started + Duration::from_secs(config.work_time));
        info!(
            assigned = self.assigned_jobs(),
            unassigned = self.unassigned_jobs(),
            "improvement started"
        );
        self.check_block();
        self.continuous_improve(&config, deadline);
        info!(
            assigned = self.assigned_jobs(),
            tt = self.get_state().travel_time,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "improvement finished"
        );
    }

    fn continuous_improve(&mut self, config: &ImproveConfig, deadline: Option<Instant>) {
        let mut best_routes = self.routes.clone();
        let mut best_pools = self.snapshot_pools();
        let mut best_state = self.get_state();
        let mut best_jobs = self.assigned_jobs();
        let mut fails = 0u32;

        while fails < config.max_fails && self.check_continue(config.phases, deadline) {
            debug!(
                best_jobs,
                tt = best_state.travel_time,
                cost = best_state.cost,
                fails,
                "outer iteration"
            );
            self.improve_tour(config, deadline);

            let new_state = self.get_state();
            let new_jobs = self.assigned_jobs();
            if new_jobs > best_jobs || (new_state < best_state && new_jobs >= best_jobs) {
                debug!(jobs = new_jobs, tt = new_state.travel_time, "tour improved");
                best_state = new_state;
                best_jobs = new_jobs;
                best_routes = self.routes.clone();
                best_pools = self.snapshot_pools();
                fails = 0;
            } else {
                fails += 1;
            }

            if !(fails < config.max_fails && self.check_continue(config.phases, deadline)) {
                break;
            }

            // Restart from the best tour and shake it: ruin 10% of the
            // assigned jobs, growing to 15% as failures accumulate, with
            // a floor of five.
            self.routes = best_routes.clone();
            self.restore_pools(&best_pools);
            let n = self.assigned_jobs();
            let step =
                n as f64 * 0.05 * f64::from(fails) / f64::from(config.max_fails.max(1));
            let count = (n / 10 + step as usize).max(5);
            self.random_ruin(count);
            self.unassigned_insert();
        }

        self.routes = best_routes;
        self.restore_pools(&best_pools);
    }

    fn check_continue(&self, phases: u32, deadline: Option<Instant>) -> bool {
        !deadline_passed(deadline) && (phases == 0 || self.phase() + 1 < phases)
    }

    fn improve_tour(&mut self, config: &ImproveConfig, deadline: Option<Instant>) {
        let mut changed = true;
        let mut post_intra = false;
        let mut post_inter = false;
        let mut last_hope = config.post_three_opt || config.post_cross;

        while (changed || last_hope) && self.check_continue(config.phases, deadline) {
            if !changed && last_hope {
                post_intra = config.post_three_opt;
                post_inter = config.post_cross;
            }
            changed = false;

            // Intra and inter passes run in random order; different
            // orders can settle in different local minima.
            let intra_first: bool = self.rng.random();
            if intra_first && self.intra_improve(post_intra, deadline) {
                changed = true;
            }
            if deadline_passed(deadline) {
                break;
            }
            if self.inter_improve(post_inter, deadline) {
                changed = true;
            }
            if deadline_passed(deadline) {
                break;
            }
            if !intra_first && self.intra_improve(post_intra, deadline) {
                changed = true;
            }
            if deadline_passed(deadline) {
                break;
            }
            if self.unassigned_insert() {
                changed = true;
            }
            self.update_phase();

            if post_intra || post_inter {
                post_intra = false;
                post_inter = false;
                last_hope = changed;
            }
        }
    }

    fn intra_improve(&mut self, post_three_opt: bool, deadline: Option<Instant>) -> bool {
        if deadline_passed(deadline) {
            return false;
        }
        let mut result = false;

        for idx in 0..self.routes.len() {
            if deadline_passed(deadline) {
                break;
            }
            if !post_three_opt && !self.check_route(idx) {
                continue;
            }

            let mut copy = self.routes[idx].clone();
            let mut any = false;
            for t in 0..copy.tracks().len() {
                let mv = {
                    let ev = self.evaluator_for(&copy);
                    let eval = |candidate: &[JobId]| {
                        let mut probe = copy.clone();
                        probe.tracks_mut()[t].set_jobs(candidate.to_vec());
                        ev.route_state(&probe)
                    };
                    let jobs = copy.tracks()[t].jobs();
                    if post_three_opt {
                        intra::three_opt(jobs, copy.state(), eval, deadline)
                    } else {
                        intra::two_opt(jobs, copy.state(), eval, deadline)
                    }
                };
                if let Some((jobs, state)) = mv {
                    copy.tracks_mut()[t].set_jobs(jobs);
                    copy.set_state(state);
                    any = true;
                }
            }

            let committed = any && self.adopt_single(idx, &copy);
            self.mark_route(idx, committed);
            result |= committed;
        }

        result
    }

    fn inter_improve(&mut self, post_cross: bool, deadline: Option<Instant>) -> bool {
        if deadline_passed(deadline) {
            return false;
        }
        let mut result = false;
        let n = self.routes.len();
        for i in 0..n {
            for j in i..n {
                if i == j {
                    result |= self.improve_one(i, post_cross, deadline);
                } else {
                    result |= self.improve_double(i, j, post_cross, deadline);
                }
            }
        }
        self.remove_empty_tracks();
        result
    }

    /// Inter-track improvement between two tracks of one route.
    fn improve_one(&mut self, i: usize, post_cross: bool, deadline: Option<Instant>) -> bool {
        if deadline_passed(deadline) {
            return false;
        }
        let mut result = false;
        let mut copy = self.routes[i].clone();

        for k in 0..copy.tracks().len() {
            for l in k + 1..copy.tracks().len() {
                if !post_cross && !self.check_route(i) {
                    continue;
                }
                if copy.tracks()[k].storage() != copy.tracks()[l].storage() {
                    continue;
                }
                let ops: &[InterOp] = if post_cross {
                    &[InterOp::Cross]
                } else {
                    &[InterOp::Swap, InterOp::Replace]
                };
                for op in ops {
                    if let Some(mv) = self.single_move(op, &copy, k, l, deadline) {
                        copy.tracks_mut()[k].set_jobs(mv.jobs1);
                        copy.tracks_mut()[l].set_jobs(mv.jobs2);
                        copy.set_state(mv.state1);
                        result |= self.adopt_single(i, &copy);
                    }
                    if deadline_passed(deadline) {
                        self.mark_route(i, result);
                        return result;
                    }
                }
            }
        }

        self.mark_route(i, result);
        result
    }

    /// Inter-track improvement between tracks of two different routes.
    fn improve_double(
        &mut self,
        i: usize,
        j: usize,
        post_cross: bool,
        deadline: Option<Instant>,
    ) -> bool {
        if deadline_passed(deadline) {
            return false;
        }
        let mut result = false;
        let mut copy1 = self.routes[i].clone();
        let mut copy2 = self.routes[j].clone();

        for k in 0..copy1.tracks().len() {
            for l in 0..copy2.tracks().len() {
                if !post_cross && !self.check_route(i) && !self.check_route(j) {
                    continue;
                }
                if copy1.tracks()[k].storage() != copy2.tracks()[l].storage() {
                    continue;
                }
                let ops: &[InterOp] = if post_cross {
                    &[InterOp::Cross]
                } else {
                    &[InterOp::Swap, InterOp::Replace]
                };
                for op in ops {
                    if let Some(mv) = self.pair_move(op, &copy1, k, &copy2, l, deadline) {
                        copy1.tracks_mut()[k].set_jobs(mv.jobs1);
                        copy1.set_state(mv.state1);
                        copy2.tracks_mut()[l].set_jobs(mv.jobs2);
                        copy2.set_state(mv.state2);
                        result |= self.adopt_pair(i, &copy1, j, &copy2);
                    }
                    if deadline_passed(deadline) {
                        self.mark_route(i, result);
                        self.mark_route(j, result);
                        return result;
                    }
                }
            }
        }

        self.mark_route(i, result);
        self.mark_route(j, result);
        result
    }

    /// Runs one inter operator over tracks `k` and `l` of a single route
    /// copy; the closure prices the whole route and pads the second slot
    /// with the zero state.
    fn single_move(
        &self,
        op: &InterOp,
        copy: &Route,
        k: usize,
        l: usize,
        deadline: Option<Instant>,
    ) -> Option<inter::PairMove> {
        let ev = self.evaluator_for(copy);
        let eval = |a: &[JobId], b: &[JobId]| {
            let mut probe = copy.clone();
            probe.tracks_mut()[k].set_jobs(a.to_vec());
            probe.tracks_mut()[l].set_jobs(b.to_vec());
            let state = ev.route_state(&probe)?;
            Some((state, State::default()))
        };
        let jobs1 = copy.tracks()[k].jobs();
        let jobs2 = copy.tracks()[l].jobs();
        let zero = State::default();
        match op {
            InterOp::Swap => inter::inter_swap(jobs1, jobs2, copy.state(), &zero, eval, deadline),
            InterOp::Replace => {
                inter::inter_replace(jobs1, jobs2, copy.state(), &zero, eval, deadline)
            }
            InterOp::Cross => inter::inter_cross(jobs1, jobs2, copy.state(), &zero, eval, deadline),
        }
    }

    /// Runs one inter operator over track `k` of `copy1` and track `l`
    /// of `copy2`.
    fn pair_move(
        &self,
        op: &InterOp,
        copy1: &Route,
        k: usize,
        copy2: &Route,
        l: usize,
        deadline: Option<Instant>,
    ) -> Option<inter::PairMove> {
        let ev1 = self.evaluator_for(copy1);
        let ev2 = self.evaluator_for(copy2);
        let eval = |a: &[JobId], b: &[JobId]| {
            let mut probe1 = copy1.clone();
            probe1.tracks_mut()[k].set_jobs(a.to_vec());
            let mut probe2 = copy2.clone();
            probe2.tracks_mut()[l].set_jobs(b.to_vec());
            Some((ev1.route_state(&probe1)?, ev2.route_state(&probe2)?))
        };
        let jobs1 = copy1.tracks()[k].jobs();
        let jobs2 = copy2.tracks()[l].jobs();
        match op {
            InterOp::Swap => {
                inter::inter_swap(jobs1, jobs2, copy1.state(), copy2.state(), eval, deadline)
            }
            InterOp::Replace => {
                inter::inter_replace(jobs1, jobs2, copy1.state(), copy2.state(), eval, deadline)
            }
            InterOp::Cross => {
                inter::inter_cross(jobs1, jobs2, copy1.state(), copy2.state(), eval, deadline)
            }
        }
    }
}
