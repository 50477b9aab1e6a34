//! Storages (depots) that own the unassigned job pool.

use serde::{Deserialize, Serialize};

use super::{JobId, Point, Window};

/// Index of a [`Storage`] in the engine's storage arena.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct StorageId(pub(crate) u32);

impl StorageId {
    /// Position in the storage arena.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A depot holding jobs that have not been routed yet.
///
/// Jobs are bound to their storage and can only be served through it; a
/// courier visiting the storage must carry its skill tags and fit its
/// working window. `load` is the reloading service time in seconds.
///
/// # Examples
///
/// ```
/// use rvrp_engine::models::{Point, Storage, Window};
///
/// let depot = Storage::new(
///     "west",
///     600,
///     Point::new(0, 55.7, 37.6),
///     Window::new(0, 86_400).unwrap(),
/// );
/// assert_eq!(depot.name(), "west");
/// assert!(depot.unassigned().is_empty());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Storage {
    name: String,
    load: i64,
    skills: Vec<String>,
    location: Point,
    work_time: Window,
    unassigned: Vec<JobId>,
}

impl Storage {
    /// Creates a storage with an empty job pool and no skill requirements.
    pub fn new(
        name: impl Into<String>,
        load: i64,
        location: Point,
        work_time: Window,
    ) -> Self {
        Self {
            name: name.into(),
            load,
            skills: Vec::new(),
            location,
            work_time,
            unassigned: Vec::new(),
        }
    }

    /// Sets the skill tags required of couriers visiting this storage.
    pub fn with_skills(mut self, skills: Vec<String>) -> Self {
        self.skills = skills;
        self
    }

    /// Storage name; identity at the engine boundary.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reloading service time in seconds.
    pub fn load(&self) -> i64 {
        self.load
    }

    /// Skills required of visiting couriers.
    pub fn skills(&self) -> &[String] {
        &self.skills
    }

    /// Storage location.
    pub fn location(&self) -> &Point {
        &self.location
    }

    /// Working window of the storage.
    pub fn work_time(&self) -> &Window {
        &self.work_time
    }

    /// Jobs of this storage that are not on any route.
    pub fn unassigned(&self) -> &[JobId] {
        &self.unassigned
    }

    pub(crate) fn unassigned_mut(&mut self) -> &mut Vec<JobId> {
        &mut self.unassigned
    }

    pub(crate) fn set_unassigned(&mut self, jobs: Vec<JobId>) {
        self.unassigned = jobs;
    }
}
