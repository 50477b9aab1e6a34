//! Dense, optionally time-sliced travel matrices.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Slice {
    distance: Vec<i64>,
    travel_time: Vec<i64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct Slicing {
    discreteness: i64,
    start_time: i64,
    end_time: i64,
}

/// Per-profile travel tables: distances in meters and travel times in
/// seconds, stored row-major.
///
/// A matrix is either flat (one slice, valid forever) or time-sliced:
/// a lookup at absolute time `now` picks slice
/// `(now − start_time) / discreteness`, clamped to the available range,
/// and a lookup past `end_time` reports `None` — the leg is unroutable
/// and callers must treat it as infeasible.
///
/// # Examples
///
/// ```
/// use rvrp_engine::matrix::TravelMatrix;
///
/// let m = TravelMatrix::new(
///     "driver",
///     vec![vec![0, 500], vec![500, 0]],
///     vec![vec![0, 60], vec![60, 0]],
/// )
/// .unwrap();
/// assert_eq!(m.time(0, 1, 12_345), Some(60));
/// assert_eq!(m.distance(1, 0, 0), Some(500));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TravelMatrix {
    profile: String,
    size: usize,
    slices: Vec<Slice>,
    slicing: Option<Slicing>,
}

impl TravelMatrix {
    /// Creates a flat (time-independent) matrix from square tables.
    ///
    /// Returns `None` if the tables are empty, ragged, or of mismatched
    /// size.
    pub fn new(
        profile: impl Into<String>,
        distance: Vec<Vec<i64>>,
        travel_time: Vec<Vec<i64>>,
    ) -> Option<Self> {
        let size = distance.len();
        let slice = Slice {
            distance: flatten(size, distance)?,
            travel_time: flatten(size, travel_time)?,
        };
        if size == 0 {
            return None;
        }
        Some(Self {
            profile: profile.into(),
            size,
            slices: vec![slice],
            slicing: None,
        })
    }

    /// Creates a time-sliced matrix: one table pair per slice of
    /// `discreteness` seconds, covering `[start_time, end_time]`.
    ///
    /// Returns `None` on empty input, ragged tables, mismatched slice
    /// counts or sizes, nonpositive `discreteness`, or an inverted time
    /// range.
    pub fn time_sliced(
        profile: impl Into<String>,
        distance: Vec<Vec<Vec<i64>>>,
        travel_time: Vec<Vec<Vec<i64>>>,
        discreteness: i64,
        start_time: i64,
        end_time: i64,
    ) -> Option<Self> {
        if distance.is_empty()
            || distance.len() != travel_time.len()
            || discreteness <= 0
            || start_time > end_time
        {
            return None;
        }
        let size = distance[0].len();
        if size == 0 {
            return None;
        }
        let mut slices = Vec::with_capacity(distance.len());
        for (d, t) in distance.into_iter().zip(travel_time) {
            if d.len() != size || t.len() != size {
                return None;
            }
            slices.push(Slice {
                distance: flatten(size, d)?,
                travel_time: flatten(size, t)?,
            });
        }
        Some(Self {
            profile: profile.into(),
            size,
            slices,
            slicing: Some(Slicing {
                discreteness,
                start_time,
                end_time,
            }),
        })
    }

    /// Profile name this matrix serves.
    pub fn profile(&self) -> &str {
        &self.profile
    }

    /// Number of locations.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Travel time in seconds from `src` to `dst` at absolute time `now`.
    ///
    /// Returns `None` when the matrix no longer covers `now`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    pub fn time(&self, src: usize, dst: usize, now: i64) -> Option<i64> {
        self.slice_for(now)
            .map(|s| s.travel_time[src * self.size + dst])
    }

    /// Distance in meters from `src` to `dst` at absolute time `now`.
    ///
    /// Returns `None` when the matrix no longer covers `now`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    pub fn distance(&self, src: usize, dst: usize, now: i64) -> Option<i64> {
        self.slice_for(now)
            .map(|s| s.distance[src * self.size + dst])
    }

    fn slice_for(&self, now: i64) -> Option<&Slice> {
        let Some(slicing) = self.slicing else {
            return Some(&self.slices[0]);
        };
        if now > slicing.end_time {
            return None;
        }
        let raw = (now - slicing.start_time) / slicing.discreteness;
        let idx = raw.clamp(0, self.slices.len() as i64 - 1) as usize;
        Some(&self.slices[idx])
    }
}

fn flatten(size: usize, table: Vec<Vec<i64>>) -> Option<Vec<i64>> {
    if table.len() != size {
        return None;
    }
    let mut data = Vec::with_capacity(size * size);
    for row in table {
        if row.len() != size {
            return None;
        }
        data.extend(row);
    }
    Some(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat() -> TravelMatrix {
        TravelMatrix::new(
            "driver",
            vec![vec![0, 100, 200], vec![100, 0, 300], vec![200, 300, 0]],
            vec![vec![0, 10, 20], vec![10, 0, 30], vec![20, 30, 0]],
        )
        .expect("valid")
    }

    #[test]
    fn test_flat_lookup() {
        let m = flat();
        assert_eq!(m.size(), 3);
        assert_eq!(m.profile(), "driver");
        assert_eq!(m.time(0, 2, 0), Some(20));
        assert_eq!(m.distance(1, 2, 0), Some(300));
    }

    #[test]
    fn test_flat_ignores_time() {
        let m = flat();
        assert_eq!(m.time(0, 1, i64::MAX), Some(10));
        assert_eq!(m.distance(0, 1, -5), Some(100));
    }

    #[test]
    fn test_flat_rejects_ragged() {
        assert!(TravelMatrix::new("p", vec![vec![0, 1]], vec![vec![0, 1]]).is_none());
        assert!(TravelMatrix::new(
            "p",
            vec![vec![0, 1], vec![1, 0]],
            vec![vec![0], vec![1, 0]],
        )
        .is_none());
        assert!(TravelMatrix::new("p", vec![], vec![]).is_none());
    }

    fn sliced() -> TravelMatrix {
        TravelMatrix::time_sliced(
            "driver",
            vec![
                vec![vec![0, 100], vec![100, 0]],
                vec![vec![0, 150], vec![150, 0]],
            ],
            vec![
                vec![vec![0, 10], vec![10, 0]],
                vec![vec![0, 25], vec![25, 0]],
            ],
            900,
            1000,
            2800,
        )
        .expect("valid")
    }

    #[test]
    fn test_sliced_picks_slice() {
        let m = sliced();
        // First slice covers [1000, 1900), second [1900, ...]
        assert_eq!(m.time(0, 1, 1000), Some(10));
        assert_eq!(m.time(0, 1, 1899), Some(10));
        assert_eq!(m.time(0, 1, 1900), Some(25));
        assert_eq!(m.distance(0, 1, 2500), Some(150));
    }

    #[test]
    fn test_sliced_clamps_early_and_late() {
        let m = sliced();
        // Before start_time the first slice answers.
        assert_eq!(m.time(0, 1, 0), Some(10));
        // Past the last full slice but before end_time the last answers.
        assert_eq!(m.time(0, 1, 2800), Some(25));
    }

    #[test]
    fn test_sliced_unroutable_after_end() {
        let m = sliced();
        assert_eq!(m.time(0, 1, 2801), None);
        assert_eq!(m.distance(0, 1, 2801), None);
    }

    #[test]
    fn test_sliced_rejects_bad_input() {
        let d = vec![vec![vec![0i64, 1], vec![1, 0]]];
        let t = vec![vec![vec![0i64, 1], vec![1, 0]]];
        assert!(TravelMatrix::time_sliced("p", d.clone(), t.clone(), 0, 0, 10).is_none());
        assert!(TravelMatrix::time_sliced("p", d.clone(), t.clone(), 10, 10, 0).is_none());
        assert!(TravelMatrix::time_sliced("p", vec![], vec![], 10, 0, 10).is_none());
        assert!(TravelMatrix::time_sliced("p", d, vec![], 10, 0, 10).is_none());
    }
}
