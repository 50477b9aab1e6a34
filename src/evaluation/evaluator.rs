//! Full-route simulation against every courier constraint.

use crate::matrix::TravelMatrix;
use crate::models::{Courier, Job, JobId, Route, State, Storage, StorageId, Track, Window};

/// Seconds a courier has to wait at `arrival` to enter one of the given
/// windows.
///
/// Returns 0 when the arrival already falls inside a window, the smallest
/// positive wait otherwise, and `None` when every window has already
/// closed.
///
/// # Examples
///
/// ```
/// use rvrp_engine::evaluation::waiting_time;
/// use rvrp_engine::models::Window;
///
/// let windows = [Window::new(100, 200).unwrap(), Window::new(400, 500).unwrap()];
/// assert_eq!(waiting_time(150, &windows), Some(0));
/// assert_eq!(waiting_time(250, &windows), Some(150));
/// assert_eq!(waiting_time(600, &windows), None);
/// ```
pub fn waiting_time(arrival: i64, windows: &[Window]) -> Option<i64> {
    let mut wait: Option<i64> = None;
    for window in windows {
        if window.contains(arrival) {
            return Some(0);
        }
        let delta = window.start() - arrival;
        if delta > 0 && wait.is_none_or(|best| delta < best) {
            wait = Some(delta);
        }
    }
    wait
}

/// Returns `true` if every required skill tag is available.
pub fn has_skills(required: &[String], available: &[String]) -> bool {
    required.iter().all(|skill| available.contains(skill))
}

/// Prices and validates route plans for one courier.
///
/// Borrows the job and storage arenas together with the courier and its
/// travel matrix; all methods are pure with respect to the borrowed data.
///
/// # Examples
///
/// ```
/// use rvrp_engine::evaluation::RouteEvaluator;
/// use rvrp_engine::models::{Cost, Courier, Job, Point, Storage, Window};
/// use rvrp_engine::matrix::TravelMatrix;
///
/// let jobs = vec![Job::new(
///     "j1",
///     0,
///     vec![1],
///     Point::new(1, 0.0, 0.0),
///     vec![Window::new(0, 1_000).unwrap()],
/// )];
/// let storages = vec![Storage::new(
///     "depot",
///     0,
///     Point::new(0, 0.0, 0.0),
///     Window::new(0, 1_000).unwrap(),
/// )];
/// let courier = Courier::new(
///     "c",
///     "driver",
///     Cost::new(0.0, 1.0, 0.0),
///     vec![10],
///     Window::new(0, 1_000).unwrap(),
///     Point::new(0, 0.0, 0.0),
///     Point::new(0, 0.0, 0.0),
/// );
/// let matrix = TravelMatrix::new(
///     "driver",
///     vec![vec![0, 100], vec![100, 0]],
///     vec![vec![0, 60], vec![60, 0]],
/// )
/// .unwrap();
///
/// let evaluator = RouteEvaluator::new(&jobs, &storages, &courier, &matrix);
/// ```
pub struct RouteEvaluator<'a> {
    jobs: &'a [Job],
    storages: &'a [Storage],
    courier: &'a Courier,
    matrix: &'a TravelMatrix,
}

impl<'a> RouteEvaluator<'a> {
    /// Creates an evaluator over the given arenas.
    pub fn new(
        jobs: &'a [Job],
        storages: &'a [Storage],
        courier: &'a Courier,
        matrix: &'a TravelMatrix,
    ) -> Self {
        Self {
            jobs,
            storages,
            courier,
            matrix,
        }
    }

    /// Simulates the whole route and returns its state, or `None` when
    /// any constraint is violated along the way.
    ///
    /// The simulation starts at the courier's start point with the fixed
    /// start cost, resets the load at every storage visit, serves each
    /// track's jobs in order (waiting into time windows as needed),
    /// optionally returns to the storage, and closes at the courier's end
    /// point. A route with no nonempty tracks evaluates to the zero
    /// state.
    pub fn route_state(&self, route: &Route) -> Option<State> {
        if route.tracks().iter().all(Track::is_empty) {
            return Some(State::default());
        }

        let dims = self.courier.capacity().len();
        let mut state = State::new(0, 0, self.courier.cost().start());
        let mut current = self.courier.start().matrix_id();

        for track in route.tracks() {
            if track.is_empty() {
                continue;
            }
            state.load = Some(vec![0; dims]);

            let storage = &self.storages[track.storage().index()];
            let leg = self.leg_to_storage(current, &state, track.storage(), route)?;
            state += leg;
            current = storage.location().matrix_id();

            for &job in track.jobs() {
                let leg = self.leg_to_job(current, &state, job, route)?;
                state += leg;
                current = self.jobs[job.index()].location().matrix_id();
            }

            if route.circle_track() {
                let leg = self.return_leg(current, &state, track.storage(), route)?;
                state += leg;
                current = storage.location().matrix_id();
            }
        }

        if !self.check_courier(&state, route) {
            return None;
        }
        let leg = self.closing_leg(current, &state, route)?;
        state += leg;
        state.load = None;
        Some(state)
    }

    /// Cost of travelling from `from` to a storage and reloading there:
    /// matrix legs, the storage's service time, and any wait for its
    /// working window. `None` when skills are missing, the window is
    /// unreachable, or the courier would run over a limit.
    pub fn leg_to_storage(
        &self,
        from: usize,
        state: &State,
        storage: StorageId,
        route: &Route,
    ) -> Option<State> {
        let storage = &self.storages[storage.index()];
        if !has_skills(storage.skills(), self.courier.skills()) {
            return None;
        }
        let now = route.start_time() + state.travel_time;
        let dst = storage.location().matrix_id();
        let travel = self.matrix.time(from, dst, now)?;
        let distance = self.matrix.distance(from, dst, now)?;
        let arrival = now + travel;
        let wait = waiting_time(arrival, std::slice::from_ref(storage.work_time()))?;
        let tt = travel + wait + storage.load();
        let leg = State::new(tt, distance, self.leg_cost(tt, distance));
        if !self.check_courier(&(state + &leg), route) {
            return None;
        }
        Some(leg)
    }

    /// Cost of travelling from `from` to a job and serving it: matrix
    /// legs, the job's service delay, any wait into one of its windows,
    /// and its load. `None` when skills are missing, no window is
    /// reachable, or the courier would run over a limit.
    pub fn leg_to_job(
        &self,
        from: usize,
        state: &State,
        job: JobId,
        route: &Route,
    ) -> Option<State> {
        let job = &self.jobs[job.index()];
        if !has_skills(job.skills(), self.courier.skills()) {
            return None;
        }
        let now = route.start_time() + state.travel_time;
        let dst = job.location().matrix_id();
        let travel = self.matrix.time(from, dst, now)?;
        let distance = self.matrix.distance(from, dst, now)?;
        let arrival = now + travel;
        let wait = waiting_time(arrival, job.time_windows())?;
        let tt = travel + wait + job.delay();
        let leg =
            State::new(tt, distance, self.leg_cost(tt, distance)).with_load(job.value().to_vec());
        if !self.check_courier(&(state + &leg), route) {
            return None;
        }
        Some(leg)
    }

    /// Bare return segment from `from` back to the storage closing a
    /// circled track: travel only, no second service, no reload, no wait.
    pub fn return_leg(
        &self,
        from: usize,
        state: &State,
        storage: StorageId,
        route: &Route,
    ) -> Option<State> {
        let dst = self.storages[storage.index()].location().matrix_id();
        self.bare_leg(from, dst, state, route)
    }

    /// Final segment from `from` to the courier's end point.
    pub fn closing_leg(&self, from: usize, state: &State, route: &Route) -> Option<State> {
        let dst = self.courier.end().matrix_id();
        self.bare_leg(from, dst, state, route)
    }

    fn bare_leg(&self, from: usize, dst: usize, state: &State, route: &Route) -> Option<State> {
        let now = route.start_time() + state.travel_time;
        let tt = self.matrix.time(from, dst, now)?;
        let distance = self.matrix.distance(from, dst, now)?;
        let leg = State::new(tt, distance, self.leg_cost(tt, distance));
        if !self.check_courier(&(state + &leg), route) {
            return None;
        }
        Some(leg)
    }

    /// Optimistic price of a track on its own: from the storage through
    /// its jobs (and back, for circled tracks) with no waiting and no
    /// prior route context. Used as a lower bound and for capacity
    /// pre-screening; `None` when a leg is unroutable.
    pub fn track_state(&self, track: &Track, route: &Route) -> Option<State> {
        let storage = &self.storages[track.storage().index()];
        let mut location = storage.location().matrix_id();
        let mut state = State::default();
        for &job in track.jobs() {
            let job = &self.jobs[job.index()];
            let now = route.start_time() + state.travel_time;
            let dst = job.location().matrix_id();
            let tt = self.matrix.time(location, dst, now)? + job.delay();
            let distance = self.matrix.distance(location, dst, now)?;
            state += State::new(tt, distance, self.leg_cost(tt, distance))
                .with_load(job.value().to_vec());
            location = dst;
        }
        if route.circle_track() {
            let now = route.start_time() + state.travel_time;
            let dst = storage.location().matrix_id();
            let tt = self.matrix.time(location, dst, now)?;
            let distance = self.matrix.distance(location, dst, now)?;
            state += State::new(tt, distance, self.leg_cost(tt, distance));
        }
        Some(state)
    }

    /// Checks the courier's limits against an accumulated state: the
    /// current time must stay within the shift, the distance within
    /// `max_distance` (when set), and the load within the capacity
    /// vector.
    pub fn check_courier(&self, state: &State, route: &Route) -> bool {
        let current = route.start_time() + state.travel_time;
        if !self.courier.work_time().contains(current) {
            return false;
        }
        if self.courier.max_distance() > 0 && state.distance > self.courier.max_distance() {
            return false;
        }
        if let Some(load) = &state.load {
            let capacity = self.courier.capacity();
            if load.len() != capacity.len() {
                return false;
            }
            if load.iter().zip(capacity).any(|(have, cap)| have > cap) {
                return false;
            }
        }
        true
    }

    fn leg_cost(&self, travel_time: i64, distance: i64) -> f64 {
        travel_time as f64 * self.courier.cost().per_second()
            + distance as f64 * self.courier.cost().per_meter()
    }
}
