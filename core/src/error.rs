//! Error type shared by construction, ticking and definition loading.

use std::path::PathBuf;

use thiserror::Error;
use timecrunch_types::UnitId;

#[derive(Debug, Error)]
pub enum TimeError {
    // ─── Construction ───────────────────────────────────────────────────────
    #[error("No config provided.")]
    NoConfig,

    /// Every structural problem found in one validation run. The messages
    /// are logged individually before this is returned.
    #[error("{message}")]
    InvalidConfiguration { message: String, errors: Vec<String> },

    // ─── Operational ────────────────────────────────────────────────────────
    #[error("No tickUnit found!")]
    NoTickUnit,

    #[error("No such unit in system: {id}, units include: {known}")]
    UnknownUnit { id: UnitId, known: String },

    #[error("Unit {id} has no states defined")]
    NoStates { id: UnitId },

    #[error("Invalid unit {id}: no state matches count {count}")]
    InvalidUnit { id: UnitId, count: i64 },

    /// A computed `makes` stopped producing the unit it rolled into at link time.
    #[error("Unit {id} no longer makes {next}")]
    MissingThreshold { id: UnitId, next: UnitId },

    // ─── Loading ────────────────────────────────────────────────────────────
    #[error("IO error reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {origin}: {source}")]
    Parse {
        origin: String,
        source: toml::de::Error,
    },
}

impl TimeError {
    /// Validation messages carried by a configuration failure, empty otherwise.
    pub fn messages(&self) -> &[String] {
        match self {
            Self::InvalidConfiguration { errors, .. } => errors,
            _ => &[],
        }
    }
}
