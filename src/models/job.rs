//! Jobs (orders) and their ids.

use serde::{Deserialize, Serialize};

use super::{Point, Window};

/// Index of a [`Job`] in the engine's job arena.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct JobId(pub(crate) u32);

impl JobId {
    /// Position in the job arena.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A single delivery job.
///
/// Jobs belong to exactly one storage and can only be served through it.
/// Equality is by `id`, which must be unique across the problem.
///
/// # Examples
///
/// ```
/// use rvrp_engine::models::{Job, Point, Window};
///
/// let job = Job::new(
///     "order-17",
///     300,
///     vec![1, 0],
///     Point::new(4, 55.7, 37.6),
///     vec![Window::new(0, 86_400).unwrap()],
/// )
/// .with_priority(2)
/// .with_skills(vec!["fridge".into()]);
///
/// assert_eq!(job.id(), "order-17");
/// assert_eq!(job.priority(), 2);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    id: String,
    delay: i64,
    priority: u32,
    value: Vec<i32>,
    skills: Vec<String>,
    location: Point,
    time_windows: Vec<Window>,
}

impl Job {
    /// Creates a job with priority 0 (highest) and no skill requirements.
    ///
    /// `delay` is the on-site service time in seconds; `time_windows` must
    /// be nonempty for the job to ever be servable.
    pub fn new(
        id: impl Into<String>,
        delay: i64,
        value: Vec<i32>,
        location: Point,
        time_windows: Vec<Window>,
    ) -> Self {
        Self {
            id: id.into(),
            delay,
            priority: 0,
            value,
            skills: Vec::new(),
            location,
            time_windows,
        }
    }

    /// Sets the priority tier; 0 is the highest (inserted first).
    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the skill tags a courier must have to serve this job.
    pub fn with_skills(mut self, skills: Vec<String>) -> Self {
        self.skills = skills;
        self
    }

    /// Unique job identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// On-site service time in seconds.
    pub fn delay(&self) -> i64 {
        self.delay
    }

    /// Priority tier (0 = highest).
    pub fn priority(&self) -> u32 {
        self.priority
    }

    /// Load vector added to the courier when this job is taken on board.
    pub fn value(&self) -> &[i32] {
        &self.value
    }

    /// Skills required of the serving courier.
    pub fn skills(&self) -> &[String] {
        &self.skills
    }

    /// Delivery location.
    pub fn location(&self) -> &Point {
        &self.location
    }

    /// Allowed delivery windows.
    pub fn time_windows(&self) -> &[Window] {
        &self.time_windows
    }
}

impl PartialEq for Job {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
