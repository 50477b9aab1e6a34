//! In-track improvement operators.
//!
//! # Algorithm
//!
//! Both operators sweep a single track's job sequence, re-evaluating the
//! whole owning route for every candidate through the supplied closure
//! (an infeasible candidate evaluates to `None` and is skipped). The
//! best strictly-improving candidate of a sweep is committed and the
//! sweep restarts, until a full sweep finds nothing or the deadline
//! passes.
//!
//! # Reference
//!
//! Croes, G.A. (1958). "A method for solving traveling salesman
//! problems", *Operations Research* 6(6), 791-812.
//! Lin, S. (1965). "Computer Solutions of the Traveling Salesman
//! Problem", *Bell System Technical Journal* 44(10), 2245-2269.

use std::time::Instant;

use tracing::trace;

use crate::models::{JobId, State};

use super::segment;
use super::deadline_passed;

/// 2-opt: reverses job segments inside one track.
///
/// `jobs` is the track's current sequence, `base` the state of the whole
/// route, and `eval` prices the route with the track's jobs replaced by a
/// candidate. Returns the improved sequence and route state, or `None`
/// when no improvement was found.
pub fn two_opt<F>(
    jobs: &[JobId],
    base: &State,
    eval: F,
    deadline: Option<Instant>,
) -> Option<(Vec<JobId>, State)>
where
    F: Fn(&[JobId]) -> Option<State>,
{
    if jobs.len() < 2 {
        return None;
    }
    let mut best_jobs = jobs.to_vec();
    let mut best_state = base.clone();
    let mut improved = false;
    let mut changed = true;

    while changed {
        changed = false;
        let n = best_jobs.len();
        let mut sweep: Option<(Vec<JobId>, State)> = None;
        for i in 0..n {
            for j in i + 1..n {
                let candidate = segment::reverse_segment(&best_jobs, i, j);
                let Some(state) = eval(&candidate) else {
                    continue;
                };
                let bar = sweep.as_ref().map_or(&best_state, |(_, s)| s);
                if state < *bar {
                    sweep = Some((candidate, state));
                }
            }
        }
        if let Some((jobs, state)) = sweep {
            trace!(tt = state.travel_time, cost = state.cost, "2-opt improved");
            best_jobs = jobs;
            best_state = state;
            improved = true;
            changed = !deadline_passed(deadline);
        }
    }

    improved.then_some((best_jobs, best_state))
}

/// 3-opt: reconnects one track around three cut edges, trying the four
/// proper reconnection patterns per triple.
///
/// Same contract as [`two_opt`].
pub fn three_opt<F>(
    jobs: &[JobId],
    base: &State,
    eval: F,
    deadline: Option<Instant>,
) -> Option<(Vec<JobId>, State)>
where
    F: Fn(&[JobId]) -> Option<State>,
{
    if jobs.len() < 3 {
        return None;
    }
    let mut best_jobs = jobs.to_vec();
    let mut best_state = base.clone();
    let mut improved = false;
    let mut changed = true;

    while changed {
        changed = false;
        let n = best_jobs.len();
        let mut sweep: Option<(Vec<JobId>, State)> = None;
        for x in 0..n {
            for y in x + 1..n {
                for z in y + 1..n {
                    for variant in 0..4u8 {
                        let candidate =
                            segment::three_opt_exchange(&best_jobs, variant, x, y, z);
                        let Some(state) = eval(&candidate) else {
                            continue;
                        };
                        let bar = sweep.as_ref().map_or(&best_state, |(_, s)| s);
                        if state < *bar {
                            sweep = Some((candidate, state));
                        }
                    }
                }
            }
        }
        if let Some((jobs, state)) = sweep {
            trace!(tt = state.travel_time, cost = state.cost, "3-opt improved");
            best_jobs = jobs;
            best_state = state;
            improved = true;
            changed = !deadline_passed(deadline);
        }
    }

    improved.then_some((best_jobs, best_state))
}

#[cfg(test)]
mod tests {
    use super::*;

    // A toy objective over a line of points: the route cost is the walk
    // 0 → jobs... → 0 where job k sits at coordinate k+1.
    fn walk_cost(order: &[JobId]) -> Option<State> {
        let mut at = 0i64;
        let mut total = 0i64;
        for job in order {
            let next = job.index() as i64 + 1;
            total += (next - at).abs();
            at = next;
        }
        total += at;
        Some(State::new(total, total, 0.0))
    }

    fn ids(raw: &[u32]) -> Vec<JobId> {
        raw.iter().map(|&i| JobId(i)).collect()
    }

    #[test]
    fn test_two_opt_fixes_scrambled_line() {
        let jobs = ids(&[2, 0, 1]);
        let base = walk_cost(&jobs).expect("priced");
        let (improved, state) =
            two_opt(&jobs, &base, walk_cost, None).expect("improvement exists");
        assert_eq!(state, walk_cost(&improved).expect("priced"));
        // The optimal walk totals 6; the scramble costs 8.
        assert_eq!(state.travel_time, 6);
        let mut sorted = improved.clone();
        sorted.sort();
        assert_eq!(sorted, ids(&[0, 1, 2]));
    }

    #[test]
    fn test_two_opt_none_on_optimum() {
        let jobs = ids(&[0, 1, 2]);
        let base = walk_cost(&jobs).expect("priced");
        assert!(two_opt(&jobs, &base, walk_cost, None).is_none());
    }

    #[test]
    fn test_two_opt_short_sequences() {
        let jobs = ids(&[0]);
        let base = walk_cost(&jobs).expect("priced");
        assert!(two_opt(&jobs, &base, walk_cost, None).is_none());
        assert!(two_opt(&[], &State::default(), walk_cost, None).is_none());
    }

    #[test]
    fn test_two_opt_skips_infeasible_candidates() {
        // Forbid any order that starts with job 0; the operator must
        // still find an improvement among the remaining candidates.
        let eval = |order: &[JobId]| {
            if order.first() == Some(&JobId(0)) {
                None
            } else {
                walk_cost(order)
            }
        };
        let jobs = ids(&[2, 0, 1]);
        let base = walk_cost(&jobs).expect("priced");
        let (improved, state) = two_opt(&jobs, &base, eval, None).expect("improves");
        assert_ne!(improved.first(), Some(&JobId(0)));
        assert!(state < base);
    }

    #[test]
    fn test_three_opt_improves_scramble() {
        let jobs = ids(&[3, 1, 0, 2]);
        let base = walk_cost(&jobs).expect("priced");
        let (improved, state) =
            three_opt(&jobs, &base, walk_cost, None).expect("improvement exists");
        assert!(state < base);
        let mut sorted = improved.clone();
        sorted.sort();
        assert_eq!(sorted, ids(&[0, 1, 2, 3]));
    }

    #[test]
    fn test_three_opt_short_sequence() {
        let jobs = ids(&[1, 0]);
        let base = walk_cost(&jobs).expect("priced");
        assert!(three_opt(&jobs, &base, walk_cost, None).is_none());
    }

    #[test]
    fn test_deadline_stops_after_first_sweep() {
        let past = Some(Instant::now() - std::time::Duration::from_secs(1));
        let jobs = ids(&[2, 0, 1]);
        let base = walk_cost(&jobs).expect("priced");
        // Still returns the first sweep's improvement, then stops.
        let got = two_opt(&jobs, &base, walk_cost, past);
        assert!(got.is_some());
    }
}
