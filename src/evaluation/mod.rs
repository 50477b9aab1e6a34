//! Route feasibility checking and cost evaluation.
//!
//! [`RouteEvaluator`] is the single source of truth: every candidate plan
//! the search produces is priced and validated here, and an infeasible
//! plan is simply `None`.

mod evaluator;

pub use evaluator::{has_skills, waiting_time, RouteEvaluator};
