//! Scalar cost state carried along routes.

use std::cmp::Ordering;
use std::ops::{Add, AddAssign, Sub};

use serde::{Deserialize, Serialize};

/// The price of a route, a tour, or a single leg: travel time in seconds,
/// distance in meters, monetary cost, and an optional running load vector.
///
/// States add segment-wise; subtraction produces a pure delta and drops
/// the load. Comparison is lexicographic on (travel_time, cost, distance):
/// time dominates, then money, then distance. The load is a transient
/// per-track accumulator and participates in neither comparison nor
/// equality.
///
/// # Examples
///
/// ```
/// use rvrp_engine::models::State;
///
/// let a = State::new(100, 500, 2.5);
/// let b = State::new(100, 400, 2.5);
/// assert!(b < a); // same time and cost, shorter distance wins
///
/// let sum = &a + &b;
/// assert_eq!(sum.travel_time, 200);
/// assert_eq!(sum.distance, 900);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct State {
    /// Accumulated travel, service, and waiting time in seconds.
    pub travel_time: i64,
    /// Accumulated distance in meters.
    pub distance: i64,
    /// Accumulated monetary cost.
    pub cost: f64,
    /// Running load vector, present only while a track is being priced.
    pub load: Option<Vec<i32>>,
}

impl State {
    /// Creates a state without a load vector.
    pub fn new(travel_time: i64, distance: i64, cost: f64) -> Self {
        Self {
            travel_time,
            distance,
            cost,
            load: None,
        }
    }

    /// Attaches a load vector.
    pub fn with_load(mut self, load: Vec<i32>) -> Self {
        self.load = Some(load);
        self
    }

    fn merge_loads(a: Option<&Vec<i32>>, b: Option<&Vec<i32>>) -> Option<Vec<i32>> {
        match (a, b) {
            (None, None) => None,
            (Some(x), None) => Some(x.clone()),
            (None, Some(y)) => Some(y.clone()),
            (Some(x), Some(y)) => {
                let n = x.len().max(y.len());
                Some(
                    (0..n)
                        .map(|i| x.get(i).copied().unwrap_or(0) + y.get(i).copied().unwrap_or(0))
                        .collect(),
                )
            }
        }
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.travel_time == other.travel_time
            && self.distance == other.distance
            && self.cost == other.cost
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(
            self.travel_time
                .cmp(&other.travel_time)
                .then_with(|| self.cost.total_cmp(&other.cost))
                .then_with(|| self.distance.cmp(&other.distance)),
        )
    }
}

impl Add<&State> for &State {
    type Output = State;

    fn add(self, rhs: &State) -> State {
        State {
            travel_time: self.travel_time + rhs.travel_time,
            distance: self.distance + rhs.distance,
            cost: self.cost + rhs.cost,
            load: State::merge_loads(self.load.as_ref(), rhs.load.as_ref()),
        }
    }
}

impl AddAssign<State> for State {
    fn add_assign(&mut self, rhs: State) {
        self.travel_time += rhs.travel_time;
        self.distance += rhs.distance;
        self.cost += rhs.cost;
        self.load = State::merge_loads(self.load.as_ref(), rhs.load.as_ref());
    }
}

impl Sub<&State> for &State {
    type Output = State;

    fn sub(self, rhs: &State) -> State {
        State::new(
            self.travel_time - rhs.travel_time,
            self.distance - rhs.distance,
            self.cost - rhs.cost,
        )
    }
}
