//! Domain model types for rich vehicle routing problems.
//!
//! Provides the core abstractions: jobs with load vectors, priorities,
//! skills and time windows; storages (depots) that own unassigned jobs;
//! couriers with costs, capacities and permitted depots; tracks and
//! routes as ordered visit plans; and the scalar [`State`] every plan is
//! priced with.
//!
//! Entities live in flat arenas owned by the engine and reference each
//! other through the typed ids [`JobId`], [`StorageId`] and [`CourierId`].

mod courier;
mod job;
mod point;
mod route;
mod state;
mod storage;
mod window;

pub use courier::{Cost, Courier, CourierId};
pub use job::{Job, JobId};
pub use point::Point;
pub use route::{Route, Track};
pub use state::State;
pub use storage::{Storage, StorageId};
pub use window::Window;
