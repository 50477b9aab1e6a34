//! Absolute time windows.

use chrono::DateTime;
use serde::{Deserialize, Serialize};

/// A closed interval of absolute time, in seconds since the UNIX epoch.
///
/// # Examples
///
/// ```
/// use rvrp_engine::models::Window;
///
/// let w = Window::new(100, 200).unwrap();
/// assert!(w.contains(150));
/// assert!(!w.contains(250));
///
/// let parsed = Window::parse("2021-06-01T10:00:00Z", "2021-06-01T12:00:00Z").unwrap();
/// assert_eq!(parsed.end() - parsed.start(), 2 * 3600);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    start: i64,
    end: i64,
}

impl Window {
    /// Creates a window from epoch seconds.
    ///
    /// Returns `None` if `start > end`.
    pub fn new(start: i64, end: i64) -> Option<Self> {
        if start > end {
            return None;
        }
        Some(Self { start, end })
    }

    /// Parses a window from a pair of `YYYY-MM-DDTHH:MM:SSZ` (UTC) strings.
    ///
    /// Returns `None` on malformed input or an inverted interval.
    pub fn parse(start: &str, end: &str) -> Option<Self> {
        let s = DateTime::parse_from_rfc3339(start).ok()?.timestamp();
        let e = DateTime::parse_from_rfc3339(end).ok()?.timestamp();
        Self::new(s, e)
    }

    /// Opening time of the window.
    pub fn start(&self) -> i64 {
        self.start
    }

    /// Closing time of the window.
    pub fn end(&self) -> i64 {
        self.end
    }

    /// Returns `true` if the given instant falls within this window.
    pub fn contains(&self, t: i64) -> bool {
        self.start <= t && t <= self.end
    }
}
