//! The running counter.
//!
//! [`TimeCrunch`] owns the linked [`System`](crate::system::System) behind an
//! `Arc` and a mutable [`TimeMap`](crate::time::TimeMap). Ticking a unit adds
//! to its count; reaching the unit's threshold resets it to zero and ticks
//! the unit it rolls into, one step at a time.
//!
//! ```text
//!   tick()            second += 1
//!                        │ second >= 60
//!                        ▼
//!   tick(minute)      second = 0, minute += 1, minute hook
//!                        │ minute >= 60
//!                        ▼
//!   tick(hour)        minute = 0, hour += 1, hour hook
//! ```

mod crunch;
mod update;


pub use crunch::TimeCrunch;
pub use update::UpdateObject;
