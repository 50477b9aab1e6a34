//! Couriers and their cost model.

use serde::{Deserialize, Serialize};

use super::{Point, Window};

/// Index of a [`Courier`] in the engine's courier arena.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct CourierId(pub(crate) u32);

impl CourierId {
    /// Position in the courier arena.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The price of a courier's work: a fixed amount for starting the shift,
/// plus per-second and per-meter rates.
///
/// # Examples
///
/// ```
/// use rvrp_engine::models::Cost;
///
/// let cost = Cost::new(10.0, 0.5, 0.01);
/// assert_eq!(cost.start(), 10.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cost {
    start: f64,
    per_second: f64,
    per_meter: f64,
}

impl Cost {
    /// Creates a cost model; all components are nonnegative.
    pub fn new(start: f64, per_second: f64, per_meter: f64) -> Self {
        Self {
            start,
            per_second,
            per_meter,
        }
    }

    /// Fixed cost charged once per route.
    pub fn start(&self) -> f64 {
        self.start
    }

    /// Rate per second of work.
    pub fn per_second(&self) -> f64 {
        self.per_second
    }

    /// Rate per meter travelled.
    pub fn per_meter(&self) -> f64 {
        self.per_meter
    }
}

/// A courier with a matrix profile, capacity vector, skills, and working
/// limits.
///
/// # Examples
///
/// ```
/// use rvrp_engine::models::{Cost, Courier, Point, Window};
///
/// let courier = Courier::new(
///     "bob",
///     "driver",
///     Cost::new(0.0, 1.0, 0.0),
///     vec![10],
///     Window::new(0, 28_800).unwrap(),
///     Point::new(0, 55.7, 37.6),
///     Point::new(0, 55.7, 37.6),
/// )
/// .with_depots(vec!["west".into()])
/// .with_max_distance(50_000);
///
/// assert_eq!(courier.name(), "bob");
/// assert_eq!(courier.max_distance(), 50_000);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Courier {
    name: String,
    profile: String,
    cost: Cost,
    capacity: Vec<i32>,
    skills: Vec<String>,
    max_distance: i64,
    work_time: Window,
    start: Point,
    end: Point,
    depots: Vec<String>,
}

impl Courier {
    /// Creates a courier with no skills, no distance limit, and no
    /// permitted depots.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        profile: impl Into<String>,
        cost: Cost,
        capacity: Vec<i32>,
        work_time: Window,
        start: Point,
        end: Point,
    ) -> Self {
        Self {
            name: name.into(),
            profile: profile.into(),
            cost,
            capacity,
            skills: Vec::new(),
            max_distance: 0,
            work_time,
            start,
            end,
            depots: Vec::new(),
        }
    }

    /// Sets the courier's skill tags.
    pub fn with_skills(mut self, skills: Vec<String>) -> Self {
        self.skills = skills;
        self
    }

    /// Sets the maximum route distance in meters; 0 means unlimited.
    pub fn with_max_distance(mut self, max_distance: i64) -> Self {
        self.max_distance = max_distance;
        self
    }

    /// Sets the storages this courier is permitted to visit, by name.
    pub fn with_depots(mut self, depots: Vec<String>) -> Self {
        self.depots = depots;
        self
    }

    /// Courier name; identity at the engine boundary.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Travel matrix profile this courier moves on.
    pub fn profile(&self) -> &str {
        &self.profile
    }

    /// Cost model.
    pub fn cost(&self) -> &Cost {
        &self.cost
    }

    /// Capacity vector; same dimensionality as job load vectors.
    pub fn capacity(&self) -> &[i32] {
        &self.capacity
    }

    /// Skill tags this courier carries.
    pub fn skills(&self) -> &[String] {
        &self.skills
    }

    /// Maximum route distance in meters; 0 means unlimited.
    pub fn max_distance(&self) -> i64 {
        self.max_distance
    }

    /// Shift window.
    pub fn work_time(&self) -> &Window {
        &self.work_time
    }

    /// Where the shift starts.
    pub fn start(&self) -> &Point {
        &self.start
    }

    /// Where the shift ends; may differ from the start.
    pub fn end(&self) -> &Point {
        &self.end
    }

    /// Names of the storages this courier may visit.
    pub fn depots(&self) -> &[String] {
        &self.depots
    }
}
