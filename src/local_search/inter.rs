//! Between-track improvement operators.
//!
//! All three operators exchange jobs between two tracks drawn from the
//! same storage — the caller guarantees that invariant and supplies an
//! evaluation closure pricing both owning routes for a candidate pair of
//! job sequences (`None` = infeasible). When both tracks live in one
//! route the closure prices that route once and reports the zero state
//! for the second slot.
//!
//! # Reference
//!
//! Taillard, É. et al. (1997). "A Tabu Search Heuristic for the Vehicle
//! Routing Problem with Soft Time Windows", *Transportation Science*
//! 31(2), 170-186 (cross-exchange).

use std::time::Instant;

use tracing::trace;

use crate::models::{JobId, State};

use super::deadline_passed;
use super::segment;

/// An improving exchange between two tracks: the new job sequences and
/// the resulting route states to commit.
#[derive(Debug, Clone)]
pub struct PairMove {
    /// New job sequence for the first track.
    pub jobs1: Vec<JobId>,
    /// New job sequence for the second track.
    pub jobs2: Vec<JobId>,
    /// Resulting state of the first route.
    pub state1: State,
    /// Resulting state of the second route (zero when both tracks share
    /// one route).
    pub state2: State,
}

/// Swaps single jobs between two tracks at every position pair,
/// committing the best improving swap per sweep until stable.
pub fn inter_swap<F>(
    jobs1: &[JobId],
    jobs2: &[JobId],
    base1: &State,
    base2: &State,
    eval: F,
    deadline: Option<Instant>,
) -> Option<PairMove>
where
    F: Fn(&[JobId], &[JobId]) -> Option<(State, State)>,
{
    let mut j1 = jobs1.to_vec();
    let mut j2 = jobs2.to_vec();
    let mut s1 = base1.clone();
    let mut s2 = base2.clone();
    let mut improved = false;
    let mut changed = true;

    while changed {
        changed = false;
        let mut best: Option<(usize, usize, State, State)> = None;
        let mut best_total = &s1 + &s2;

        for a in 0..j1.len() {
            for b in 0..j2.len() {
                std::mem::swap(&mut j1[a], &mut j2[b]);
                if let Some((n1, n2)) = eval(&j1, &j2) {
                    let total = &n1 + &n2;
                    if total < best_total {
                        best_total = total;
                        best = Some((a, b, n1, n2));
                    }
                }
                std::mem::swap(&mut j1[a], &mut j2[b]);
            }
        }

        if let Some((a, b, n1, n2)) = best {
            std::mem::swap(&mut j1[a], &mut j2[b]);
            trace!(tt = best_total.travel_time, "inter-swap improved");
            s1 = n1;
            s2 = n2;
            improved = true;
            changed = !deadline_passed(deadline);
        }
    }

    improved.then_some(PairMove {
        jobs1: j1,
        jobs2: j2,
        state1: s1,
        state2: s2,
    })
}

/// Relocates single jobs between two tracks, greedily in both directions,
/// until neither direction improves.
pub fn inter_replace<F>(
    jobs1: &[JobId],
    jobs2: &[JobId],
    base1: &State,
    base2: &State,
    eval: F,
    deadline: Option<Instant>,
) -> Option<PairMove>
where
    F: Fn(&[JobId], &[JobId]) -> Option<(State, State)>,
{
    let mut j1 = jobs1.to_vec();
    let mut j2 = jobs2.to_vec();
    let mut s1 = base1.clone();
    let mut s2 = base2.clone();
    let mut improved = false;
    let mut changed = true;

    while changed && !deadline_passed(deadline) {
        let forward = relocate_sweep(
            &mut j1,
            &mut j2,
            &mut s1,
            &mut s2,
            |dst, src| eval(dst, src),
            deadline,
        );
        if deadline_passed(deadline) {
            improved |= forward;
            break;
        }
        let backward = relocate_sweep(
            &mut j2,
            &mut j1,
            &mut s2,
            &mut s1,
            |dst, src| eval(src, dst).map(|(a, b)| (b, a)),
            deadline,
        );
        changed = forward || backward;
        improved |= changed;
    }

    improved.then_some(PairMove {
        jobs1: j1,
        jobs2: j2,
        state1: s1,
        state2: s2,
    })
}

/// Moves jobs from `src` into `dst` while that improves the combined
/// state, best move per sweep.
fn relocate_sweep<F>(
    dst: &mut Vec<JobId>,
    src: &mut Vec<JobId>,
    dst_state: &mut State,
    src_state: &mut State,
    eval: F,
    deadline: Option<Instant>,
) -> bool
where
    F: Fn(&[JobId], &[JobId]) -> Option<(State, State)>,
{
    let mut improved = false;
    let mut changed = true;

    while changed {
        changed = false;
        let mut best: Option<(Vec<JobId>, Vec<JobId>, State, State)> = None;
        let mut best_total = &*dst_state + &*src_state;

        for i in 0..=dst.len() {
            for j in 0..src.len() {
                let (cand_dst, cand_src) = segment::replace_point(dst, src, i, j);
                if let Some((nd, ns)) = eval(&cand_dst, &cand_src) {
                    let total = &nd + &ns;
                    if total < best_total {
                        best_total = total;
                        best = Some((cand_dst, cand_src, nd, ns));
                    }
                }
            }
        }

        if let Some((cand_dst, cand_src, nd, ns)) = best {
            trace!(tt = best_total.travel_time, "relocate improved");
            *dst = cand_dst;
            *src = cand_src;
            *dst_state = nd;
            *src_state = ns;
            improved = true;
            changed = !deadline_passed(deadline);
        }
    }

    improved
}

/// Cross-exchange: swaps contiguous job ranges between two tracks,
/// first-improvement.
pub fn inter_cross<F>(
    jobs1: &[JobId],
    jobs2: &[JobId],
    base1: &State,
    base2: &State,
    eval: F,
    deadline: Option<Instant>,
) -> Option<PairMove>
where
    F: Fn(&[JobId], &[JobId]) -> Option<(State, State)>,
{
    let base_total = base1 + base2;
    for i1 in 0..jobs1.len() {
        for i2 in i1..jobs1.len() {
            for i3 in 0..jobs2.len() {
                for i4 in i3..jobs2.len() {
                    if deadline_passed(deadline) {
                        return None;
                    }
                    let (c1, c2) = segment::cross(jobs1, jobs2, i1, i2, i3, i4);
                    if let Some((n1, n2)) = eval(&c1, &c2) {
                        if &n1 + &n2 < base_total {
                            trace!(tt = (&n1 + &n2).travel_time, "cross-exchange improved");
                            return Some(PairMove {
                                jobs1: c1,
                                jobs2: c2,
                                state1: n1,
                                state2: n2,
                            });
                        }
                    }
                }
            }
        }
    }
    None
}
