//! The solver engine: problem arenas, routes, tabu memory, and the
//! public in-process API.

mod improve;
mod ruin;

pub use improve::ImproveConfig;

use std::collections::{HashMap, HashSet};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::evaluation::RouteEvaluator;
use crate::matrix::TravelMatrix;
use crate::models::{Courier, CourierId, Job, JobId, Route, State, Storage, StorageId};

/// Tabu fingerprint of a tour. The monetary cost is stored as fixed-point
/// hundredths so the hash is deterministic across platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct TourKey {
    assigned: usize,
    unassigned: usize,
    travel_time: i64,
    distance: i64,
    cost_cents: i64,
}

/// A rich-VRP solver over couriers, storages, and per-profile travel
/// matrices.
///
/// The engine owns the problem arenas and one route per courier. Jobs
/// enter through [`add_job`](Self::add_job), tours are seeded with
/// [`build_tour`](Self::build_tour) (priority-aware best insertion) or
/// [`greedy_tour`](Self::greedy_tour), and refined with
/// [`improve`](Self::improve).
///
/// # Examples
///
/// ```
/// use rvrp_engine::engine::SolverEngine;
/// use rvrp_engine::matrix::TravelMatrix;
/// use rvrp_engine::models::{Cost, Courier, Job, Point, Storage, Window};
///
/// let storages = vec![Storage::new(
///     "depot",
///     0,
///     Point::new(0, 0.0, 0.0),
///     Window::new(0, 10_000).unwrap(),
/// )];
/// let couriers = vec![Courier::new(
///     "ann",
///     "driver",
///     Cost::new(0.0, 1.0, 0.0),
///     vec![5],
///     Window::new(0, 10_000).unwrap(),
///     Point::new(0, 0.0, 0.0),
///     Point::new(0, 0.0, 0.0),
/// )
/// .with_depots(vec!["depot".into()])];
/// let matrices = vec![TravelMatrix::new(
///     "driver",
///     vec![vec![0, 100], vec![100, 0]],
///     vec![vec![0, 60], vec![60, 0]],
/// )
/// .unwrap()];
///
/// let mut engine = SolverEngine::new(storages, couriers, matrices, true)
///     .unwrap()
///     .with_seed(7);
/// let job = Job::new(
///     "j1",
///     0,
///     vec![1],
///     Point::new(1, 0.0, 0.0),
///     vec![Window::new(0, 10_000).unwrap()],
/// );
/// engine.add_job(job, "depot").unwrap();
/// engine.build_tour();
/// assert_eq!(engine.assigned_jobs() + engine.unassigned_jobs(), 1);
/// ```
pub struct SolverEngine {
    pub(crate) jobs: Vec<Job>,
    pub(crate) storages: Vec<Storage>,
    pub(crate) couriers: Vec<Courier>,
    pub(crate) matrices: Vec<TravelMatrix>,
    pub(crate) matrix_of: Vec<usize>,
    pub(crate) permitted: Vec<Vec<StorageId>>,
    pub(crate) routes: Vec<Route>,
    pub(crate) use_priority: bool,
    phase: u32,
    previous_phase: Vec<bool>,
    current_phase: Vec<bool>,
    tabu: HashSet<TourKey>,
    job_index: HashMap<String, JobId>,
    pub(crate) rng: ChaCha8Rng,
}

impl SolverEngine {
    /// Creates an engine with one empty route per courier.
    ///
    /// Returns `None` when a courier references an unknown matrix
    /// profile or permitted depot name.
    pub fn new(
        storages: Vec<Storage>,
        couriers: Vec<Courier>,
        matrices: Vec<TravelMatrix>,
        circle_track: bool,
    ) -> Option<Self> {
        let mut matrix_of = Vec::with_capacity(couriers.len());
        let mut permitted = Vec::with_capacity(couriers.len());
        for courier in &couriers {
            let matrix = matrices
                .iter()
                .position(|m| m.profile() == courier.profile())?;
            matrix_of.push(matrix);
            let mut depots = Vec::with_capacity(courier.depots().len());
            for name in courier.depots() {
                let storage = storages.iter().position(|s| s.name() == name)?;
                depots.push(StorageId(storage as u32));
            }
            permitted.push(depots);
        }

        let routes: Vec<Route> = couriers
            .iter()
            .enumerate()
            .map(|(i, c)| Route::new(CourierId(i as u32), c.work_time().start(), circle_track))
            .collect();
        let count = routes.len();

        Some(Self {
            jobs: Vec::new(),
            storages,
            couriers,
            matrices,
            matrix_of,
            permitted,
            routes,
            use_priority: false,
            phase: 0,
            previous_phase: vec![false; count],
            current_phase: vec![true; count],
            tabu: HashSet::new(),
            job_index: HashMap::new(),
            rng: ChaCha8Rng::from_os_rng(),
        })
    }

    /// Seeds the engine's random generator for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        self
    }

    /// Enables priority tiers: tier 0 is inserted first, then ascending.
    /// When disabled (the default) all tiers merge.
    pub fn with_priority_tiers(mut self, enabled: bool) -> Self {
        self.use_priority = enabled;
        self
    }

    // ---- queries -------------------------------------------------------

    /// All routes, one per courier.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// All storages with their unassigned job pools.
    pub fn storages(&self) -> &[Storage] {
        &self.storages
    }

    /// All couriers.
    pub fn couriers(&self) -> &[Courier] {
        &self.couriers
    }

    /// The job arena; indexed by [`JobId`].
    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    /// Resolves a job id to the job.
    pub fn job(&self, id: JobId) -> &Job {
        &self.jobs[id.index()]
    }

    /// The travel matrix a courier moves on.
    pub fn matrix_for(&self, courier: CourierId) -> &TravelMatrix {
        &self.matrices[self.matrix_of[courier.index()]]
    }

    /// Looks a job up by its string identity.
    pub fn find_job(&self, id: &str) -> Option<JobId> {
        self.job_index.get(id).copied()
    }

    /// Number of jobs currently on routes.
    pub fn assigned_jobs(&self) -> usize {
        self.routes.iter().map(Route::assigned_jobs).sum()
    }

    /// Number of jobs still waiting in storage pools.
    pub fn unassigned_jobs(&self) -> usize {
        self.storages.iter().map(|s| s.unassigned().len()).sum()
    }

    /// Summed state of the whole tour.
    pub fn get_state(&self) -> State {
        self.routes
            .iter()
            .fold(State::default(), |acc, route| &acc + route.state())
    }

    // ---- job pool mutation ---------------------------------------------

    /// Adds a job to a storage's unassigned pool.
    ///
    /// Silently no-ops (returns `None`) when the storage is unknown or a
    /// job with the same id already exists. Clears the tabu set and
    /// resets the phase flags.
    pub fn add_job(&mut self, job: Job, storage: &str) -> Option<JobId> {
        self.set_zeros();
        let sid = self.find_storage(storage)?;
        if self.job_index.contains_key(job.id()) {
            return None;
        }
        let jid = JobId(self.jobs.len() as u32);
        self.job_index.insert(job.id().to_string(), jid);
        self.jobs.push(job);
        self.storages[sid.index()].unassigned_mut().push(jid);
        Some(jid)
    }

    /// Adds several jobs to a storage; unknown storages and duplicate ids
    /// are skipped silently.
    pub fn add_jobs(&mut self, jobs: Vec<Job>, storage: &str) -> Vec<JobId> {
        jobs.into_iter()
            .filter_map(|job| self.add_job(job, storage))
            .collect()
    }

    /// Removes a job, wherever it currently lives: the storage's pool or
    /// any track. Unknown storages or job ids are silently ignored.
    /// Clears the tabu set and resets the phase flags.
    pub fn remove_job(&mut self, job_id: &str, storage: &str) {
        self.set_zeros();
        let Some(sid) = self.find_storage(storage) else {
            return;
        };
        let Some(&jid) = self.job_index.get(job_id) else {
            return;
        };

        let pool = self.storages[sid.index()].unassigned_mut();
        if let Some(pos) = pool.iter().position(|&j| j == jid) {
            pool.remove(pos);
            self.job_index.remove(job_id);
            return;
        }

        for r in 0..self.routes.len() {
            for t in 0..self.routes[r].tracks().len() {
                let Some(pos) = self.routes[r].tracks()[t]
                    .jobs()
                    .iter()
                    .position(|&j| j == jid)
                else {
                    continue;
                };
                self.routes[r].tracks_mut()[t].jobs_mut().remove(pos);
                self.job_index.remove(job_id);
                self.refresh_route_state(r);
                self.remove_empty_tracks();
                return;
            }
        }
    }

    /// Removes several jobs from one storage.
    pub fn remove_jobs(&mut self, job_ids: &[&str], storage: &str) {
        for id in job_ids {
            self.remove_job(id, storage);
        }
    }

    // ---- internals shared by construction, improvement, and ruin -------

    pub(crate) fn find_storage(&self, name: &str) -> Option<StorageId> {
        self.storages
            .iter()
            .position(|s| s.name() == name)
            .map(|i| StorageId(i as u32))
    }

    pub(crate) fn evaluator_for(&self, route: &Route) -> RouteEvaluator<'_> {
        let courier = route.courier().index();
        RouteEvaluator::new(
            &self.jobs,
            &self.storages,
            &self.couriers[courier],
            &self.matrices[self.matrix_of[courier]],
        )
    }

    pub(crate) fn permits(&self, courier: CourierId, storage: StorageId) -> bool {
        self.permitted[courier.index()].contains(&storage)
    }

    pub(crate) fn refresh_route_state(&mut self, idx: usize) {
        let state = {
            let route = &self.routes[idx];
            self.evaluator_for(route).route_state(route)
        };
        if let Some(state) = state {
            self.routes[idx].set_state(state);
        }
    }

    pub(crate) fn remove_empty_tracks(&mut self) {
        for route in &mut self.routes {
            route.tracks_mut().retain(|t| !t.is_empty());
        }
    }

    // ---- phase flags ---------------------------------------------------

    /// Ensures the phase flags cover every route; fresh routes start
    /// editable.
    pub(crate) fn check_block(&mut self) {
        if self.current_phase.len() != self.routes.len() {
            self.current_phase = vec![true; self.routes.len()];
            self.previous_phase = vec![false; self.routes.len()];
        }
    }

    /// Reopens every route for editing and forgets the tabu memory.
    /// Called whenever the job pool changes under the engine.
    pub(crate) fn set_zeros(&mut self) {
        self.current_phase = vec![true; self.routes.len()];
        self.previous_phase = vec![false; self.routes.len()];
        self.tabu.clear();
    }

    /// Rotates the phase flags and records the current tour in the tabu
    /// set.
    pub(crate) fn update_phase(&mut self) {
        self.previous_phase =
            std::mem::replace(&mut self.current_phase, vec![false; self.routes.len()]);
        self.phase += 1;
        self.save_tour();
    }

    pub(crate) fn phase(&self) -> u32 {
        self.phase
    }

    /// Marks a route as changed in the current phase. Marks are sticky
    /// until the next rotation.
    pub(crate) fn mark_route(&mut self, idx: usize, changed: bool) {
        if changed {
            self.current_phase[idx] = true;
        }
    }

    /// A route may be edited while it changed in this phase or the last;
    /// otherwise the operators have already proven it locally optimal.
    pub(crate) fn check_route(&self, idx: usize) -> bool {
        self.previous_phase[idx] || self.current_phase[idx]
    }

    // ---- tabu memory ---------------------------------------------------

    fn tour_key(&self, state: &State) -> TourKey {
        TourKey {
            assigned: self.assigned_jobs(),
            unassigned: self.unassigned_jobs(),
            travel_time: state.travel_time,
            distance: state.distance,
            cost_cents: (state.cost * 100.0).round() as i64,
        }
    }

    pub(crate) fn save_tour(&mut self) {
        let key = self.tour_key(&self.get_state());
        self.tabu.insert(key);
    }

    /// Would the tour obtained by applying `delta` to the current state
    /// be new territory? `delta` is `old − candidate` per touched route.
    pub(crate) fn tour_is_new(&self, delta: &State) -> bool {
        let candidate = &self.get_state() - delta;
        let fresh = !self.tabu.contains(&self.tour_key(&candidate));
        if !fresh {
            debug!("candidate tour rejected by tabu memory");
        }
        fresh
    }

    /// Replaces a route with an improved copy unless that revisits a
    /// known tour. Improvement itself is not re-checked here; the
    /// operator already proved it, and novelty is what admits plateau
    /// escapes.
    pub(crate) fn adopt_single(&mut self, idx: usize, candidate: &Route) -> bool {
        let delta = self.routes[idx].state() - candidate.state();
        if self.tour_is_new(&delta) {
            self.routes[idx] = candidate.clone();
            true
        } else {
            false
        }
    }

    /// Two-route variant of [`adopt_single`](Self::adopt_single); the
    /// novelty check uses the combined delta.
    pub(crate) fn adopt_pair(
        &mut self,
        i: usize,
        candidate1: &Route,
        j: usize,
        candidate2: &Route,
    ) -> bool {
        let delta = &(self.routes[i].state() - candidate1.state())
            + &(self.routes[j].state() - candidate2.state());
        if self.tour_is_new(&delta) {
            self.routes[i] = candidate1.clone();
            self.routes[j] = candidate2.clone();
            true
        } else {
            false
        }
    }

    // ---- snapshots for the improvement loop ----------------------------

    pub(crate) fn snapshot_pools(&self) -> Vec<Vec<JobId>> {
        self.storages
            .iter()
            .map(|s| s.unassigned().to_vec())
            .collect()
    }

    pub(crate) fn restore_pools(&mut self, pools: &[Vec<JobId>]) {
        for (storage, pool) in self.storages.iter_mut().zip(pools) {
            storage.set_unassigned(pool.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Cost, Point, Window};

    fn matrix() -> TravelMatrix {
        TravelMatrix::new(
            "driver",
            vec![
                vec![0, 1000, 2000],
                vec![1000, 0, 1000],
                vec![2000, 1000, 0],
            ],
            vec![vec![0, 100, 200], vec![100, 0, 100], vec![200, 100, 0]],
        )
        .expect("valid")
    }

    fn storage() -> Storage {
        Storage::new(
            "depot",
            0,
            Point::new(0, 0.0, 0.0),
            Window::new(0, 100_000).expect("valid"),
        )
    }

    fn courier(name: &str) -> Courier {
        Courier::new(
            name,
            "driver",
            Cost::new(0.0, 1.0, 0.0),
            vec![10],
            Window::new(0, 100_000).expect("valid"),
            Point::new(0, 0.0, 0.0),
            Point::new(0, 0.0, 0.0),
        )
        .with_depots(vec!["depot".into()])
    }

    fn job(id: &str, matrix_id: usize) -> Job {
        Job::new(
            id,
            0,
            vec![1],
            Point::new(matrix_id, 0.0, 0.0),
            vec![Window::new(0, 100_000).expect("valid")],
        )
    }

    fn engine() -> SolverEngine {
        SolverEngine::new(vec![storage()], vec![courier("ann")], vec![matrix()], true)
            .expect("valid setup")
            .with_seed(1)
    }

    #[test]
    fn test_new_rejects_unknown_profile() {
        let bad = Courier::new(
            "c",
            "rocket",
            Cost::new(0.0, 1.0, 0.0),
            vec![1],
            Window::new(0, 10).expect("valid"),
            Point::new(0, 0.0, 0.0),
            Point::new(0, 0.0, 0.0),
        );
        assert!(SolverEngine::new(vec![storage()], vec![bad], vec![matrix()], true).is_none());
    }

    #[test]
    fn test_new_rejects_unknown_depot() {
        let bad = courier("c").with_depots(vec!["atlantis".into()]);
        assert!(SolverEngine::new(vec![storage()], vec![bad], vec![matrix()], true).is_none());
    }

    #[test]
    fn test_add_job_fills_pool() {
        let mut e = engine();
        let id = e.add_job(job("a", 1), "depot").expect("added");
        assert_eq!(e.unassigned_jobs(), 1);
        assert_eq!(e.assigned_jobs(), 0);
        assert_eq!(e.job(id).id(), "a");
        assert_eq!(e.find_job("a"), Some(id));
    }

    #[test]
    fn test_add_job_unknown_storage_noop() {
        let mut e = engine();
        assert!(e.add_job(job("a", 1), "atlantis").is_none());
        assert_eq!(e.unassigned_jobs(), 0);
    }

    #[test]
    fn test_add_job_duplicate_id_noop() {
        let mut e = engine();
        assert!(e.add_job(job("a", 1), "depot").is_some());
        assert!(e.add_job(job("a", 2), "depot").is_none());
        assert_eq!(e.unassigned_jobs(), 1);
    }

    #[test]
    fn test_remove_job_from_pool() {
        let mut e = engine();
        e.add_jobs(vec![job("a", 1), job("b", 2)], "depot");
        e.remove_job("a", "depot");
        assert_eq!(e.unassigned_jobs(), 1);
        assert!(e.find_job("a").is_none());
        assert!(e.find_job("b").is_some());
    }

    #[test]
    fn test_remove_job_from_track() {
        let mut e = engine();
        e.add_jobs(vec![job("a", 1), job("b", 2)], "depot");
        e.build_tour();
        assert_eq!(e.assigned_jobs(), 2);
        e.remove_job("a", "depot");
        assert_eq!(e.assigned_jobs() + e.unassigned_jobs(), 1);
        // The surviving route state matches a fresh evaluation.
        let route = &e.routes()[0];
        let fresh = e.evaluator_for(route).route_state(route).expect("feasible");
        assert_eq!(&fresh, route.state());
    }

    #[test]
    fn test_remove_job_unknown_noop() {
        let mut e = engine();
        e.add_job(job("a", 1), "depot");
        e.remove_job("zzz", "depot");
        e.remove_job("a", "atlantis");
        assert_eq!(e.unassigned_jobs(), 1);
    }

    #[test]
    fn test_pool_mutation_clears_tabu_and_flags() {
        let mut e = engine();
        e.add_job(job("a", 1), "depot");
        e.build_tour();
        e.update_phase();
        e.update_phase();
        assert!(!e.check_route(0));
        e.add_job(job("b", 2), "depot");
        assert!(e.check_route(0));
        assert!(e.tabu.is_empty());
    }

    #[test]
    fn test_tabu_rejects_seen_tour() {
        let mut e = engine();
        e.add_jobs(vec![job("a", 1), job("b", 2)], "depot");
        e.build_tour();
        // Remember the current tour, then try to "re-adopt" an identical
        // copy: the tabu memory must refuse it.
        e.save_tour();
        let copy = e.routes()[0].clone();
        assert!(!e.adopt_single(0, &copy));
        // A genuinely different state passes.
        let mut other = copy.clone();
        let mut better = other.state().clone();
        better.travel_time -= 1;
        other.set_state(better);
        assert!(e.adopt_single(0, &other));
    }

    #[test]
    fn test_get_state_sums_routes() {
        let mut e = engine();
        e.add_jobs(vec![job("a", 1), job("b", 2)], "depot");
        e.build_tour();
        let total = e.get_state();
        let by_hand = e
            .routes()
            .iter()
            .fold(State::default(), |acc, r| &acc + r.state());
        assert_eq!(total, by_hand);
    }

    #[test]
    fn test_snapshot_restore_pools() {
        let mut e = engine();
        e.add_jobs(vec![job("a", 1), job("b", 2)], "depot");
        let snap = e.snapshot_pools();
        e.storages[0].unassigned_mut().clear();
        assert_eq!(e.unassigned_jobs(), 0);
        e.restore_pools(&snap);
        assert_eq!(e.unassigned_jobs(), 2);
    }
}
