//! # rvrp-engine
//!
//! Rich vehicle routing: couriers serve jobs bound to depots (storages)
//! under time windows, multidimensional capacities, skill tags, and
//! per-courier limits. Tours are seeded by greedy construction or
//! priority-tiered best insertion and improved by a ruin-and-recreate
//! loop over intra- and inter-route edge-exchange operators, guarded by
//! a tabu memory of visited tours.
//!
//! ## Modules
//!
//! - [`models`] — Domain model types (Job, Storage, Courier, Track, Route, State)
//! - [`matrix`] — Per-profile travel time and distance tables, optionally time-sliced
//! - [`evaluation`] — Route feasibility checking and cost evaluation
//! - [`local_search`] — Sequence primitives and intra/inter improvement operators
//! - [`engine`] — The solver engine: construction, insertion, improvement, ruin

mod construction;
pub mod engine;
pub mod evaluation;
pub mod local_search;
pub mod matrix;
pub mod models;
