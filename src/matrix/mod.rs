//! Travel time and distance lookup.
//!
//! Each courier moves on a named profile ("driver", "walker", ...) backed
//! by a [`TravelMatrix`]: square integer tables of meters and seconds,
//! optionally repeated over fixed time slices for time-dependent travel.

mod travel;

pub use travel::TravelMatrix;
