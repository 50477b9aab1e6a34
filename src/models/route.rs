//! Tracks and routes: the visit plans the search manipulates.

use super::{CourierId, JobId, State, StorageId};

/// A sub-route: one visit to a storage followed by an ordered list of its
/// jobs, optionally returning to the same storage.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    storage: StorageId,
    jobs: Vec<JobId>,
}

impl Track {
    /// Creates an empty track for the given storage.
    pub fn new(storage: StorageId) -> Self {
        Self {
            storage,
            jobs: Vec::new(),
        }
    }

    /// Creates a track carrying a single job.
    pub fn with_job(job: JobId, storage: StorageId) -> Self {
        Self {
            storage,
            jobs: vec![job],
        }
    }

    /// The storage this track draws its jobs from.
    pub fn storage(&self) -> StorageId {
        self.storage
    }

    /// Jobs in visit order.
    pub fn jobs(&self) -> &[JobId] {
        &self.jobs
    }

    pub(crate) fn jobs_mut(&mut self) -> &mut Vec<JobId> {
        &mut self.jobs
    }

    pub(crate) fn set_jobs(&mut self, jobs: Vec<JobId>) {
        self.jobs = jobs;
    }

    /// Number of jobs on this track.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Returns `true` if the track carries no jobs.
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

/// All tracks assigned to one courier, with the cached evaluation
/// [`State`] of the whole plan.
///
/// The cached state is maintained by the engine: it is recomputed (or
/// carried over from a validated candidate) on every mutation and never
/// trusted across edits without re-evaluation.
#[derive(Debug, Clone)]
pub struct Route {
    courier: CourierId,
    start_time: i64,
    circle_track: bool,
    tracks: Vec<Track>,
    state: State,
}

impl Route {
    pub(crate) fn new(courier: CourierId, start_time: i64, circle_track: bool) -> Self {
        Self {
            courier,
            start_time,
            circle_track,
            tracks: Vec::new(),
            state: State::default(),
        }
    }

    /// The courier bound to this route.
    pub fn courier(&self) -> CourierId {
        self.courier
    }

    /// Absolute start of the route (the courier's shift start).
    pub fn start_time(&self) -> i64 {
        self.start_time
    }

    /// Whether every track must end back at its storage.
    pub fn circle_track(&self) -> bool {
        self.circle_track
    }

    /// Tracks in visit order.
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub(crate) fn tracks_mut(&mut self) -> &mut Vec<Track> {
        &mut self.tracks
    }

    /// Cached evaluation of this route.
    pub fn state(&self) -> &State {
        &self.state
    }

    pub(crate) fn set_state(&mut self, state: State) {
        self.state = state;
    }

    /// Number of jobs assigned to this route across all tracks.
    pub fn assigned_jobs(&self) -> usize {
        self.tracks.iter().map(Track::len).sum()
    }
}
