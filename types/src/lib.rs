//! Shared types for TimeCrunch.
//!
//! Kept separate from `timecrunch-core` so hosts that only render snapshots
//! (overlays, CLIs) can depend on the identifier and formatting helpers
//! without pulling in the engine.

pub mod formatting;
mod unit_id;

pub use unit_id::{StateName, UnitId};
