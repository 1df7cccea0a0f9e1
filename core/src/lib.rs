pub mod buckets;
pub mod config;
pub mod definition;
pub mod engine;
pub mod error;
pub mod link;
pub mod system;
pub mod time;
pub mod utils;
pub mod validate;

// Re-exports for convenience
pub use config::{Bindings, RawUnit, default_definitions_dir, load_directory, load_file, parse_units};
pub use definition::{Makes, States, TaggedUnit, UnitDefinition};
pub use engine::{TimeCrunch, UpdateObject};
pub use error::TimeError;
pub use system::{ResolvedUnit, System, Threshold};
pub use time::TimeMap;
pub use utils::{Context, Resolvable};
pub use timecrunch_types::{StateName, UnitId};
