//! Loading unit hierarchies from TOML
//!
//! A definitions file is a list of `[[unit]]` tables:
//!
//! ```toml
//! [[unit]]
//! id = "second"
//! tick = true
//! makes = { minute = 60 }
//!
//! [[unit]]
//! id = "day"
//! makes = "month_length"    # computed mapping registered in Bindings
//! on_increment = "log_day"  # hook registered in Bindings
//! ```
//!
//! Computed values and hooks cannot live in TOML, so string values name
//! entries of a [`Bindings`] registry. Tables are kept raw until then and
//! checked by the validator like any other declaration, so a bad file
//! reports every problem at once instead of failing on the first field.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use hashbrown::HashMap;
use serde::Deserialize;
use timecrunch_types::UnitId;

use crate::definition::{
    Declaration, FieldShape, Hook, IdShape, Makes, Shape, States, TaggedUnit, UnitDefinition,
};
use crate::engine::TimeCrunch;
use crate::error::TimeError;
use crate::utils::{CONFIG_ERROR_MESSAGE, Computed, Context, Resolvable, computed};

const KNOWN_KEYS: [&str; 5] = ["id", "tick", "makes", "states", "on_increment"];

/// Root of a definitions file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UnitFile {
    #[serde(default, rename = "unit")]
    pub units: Vec<toml::Table>,
}

// ═══════════════════════════════════════════════════════════════════════════
// Bindings
// ═══════════════════════════════════════════════════════════════════════════

/// Named computed values and hooks that TOML files can refer to.
#[derive(Clone, Default)]
pub struct Bindings {
    makes: HashMap<String, Computed<Makes>>,
    states: HashMap<String, Computed<States>>,
    thresholds: HashMap<String, Computed<i64>>,
    hooks: HashMap<String, Hook>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// A whole `makes` mapping, e.g. `makes = "month_length"`.
    pub fn with_makes<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Context<'_>) -> Makes + Send + Sync + 'static,
    {
        self.makes.insert(name.into(), computed(f));
        self
    }

    pub fn with_states<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Context<'_>) -> States + Send + Sync + 'static,
    {
        self.states.insert(name.into(), computed(f));
        self
    }

    /// A single threshold inside a `makes` table, e.g. `makes = { month = "days" }`.
    pub fn with_threshold<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Context<'_>) -> i64 + Send + Sync + 'static,
    {
        self.thresholds.insert(name.into(), computed(f));
        self
    }

    pub fn with_hook<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut TimeCrunch) + Send + Sync + 'static,
    {
        self.hooks.insert(name.into(), Arc::new(f));
        self
    }

    /// Bind the names used in one `[[unit]]` table.
    pub fn raw_unit(&self, table: toml::Table) -> RawUnit {
        for key in table.keys() {
            if !KNOWN_KEYS.contains(&key.as_str()) {
                tracing::warn!(key = %key, "Ignoring unknown unit key");
            }
        }

        RawUnit {
            id: table.get("id").cloned(),
            tick: table.get("tick").cloned(),
            makes: table.get("makes").map(|value| self.bind_makes(value)),
            states: table.get("states").map(|value| self.bind_states(value)),
            on_increment: table.get("on_increment").map(|value| self.bind_hook(value)),
            source: table,
        }
    }

    fn bind_makes(&self, value: &toml::Value) -> Slot<Resolvable<Makes>> {
        match value {
            toml::Value::String(name) => match self.makes.get(name) {
                Some(f) => Slot::Bound(Resolvable::Computed(Arc::clone(f))),
                None => Slot::Invalid,
            },
            toml::Value::Table(table) => {
                let mut makes = Makes::with_capacity(table.len());
                for (key, threshold) in table {
                    let threshold = match threshold {
                        toml::Value::Integer(n) => Resolvable::Static(*n),
                        toml::Value::String(name) => match self.thresholds.get(name) {
                            Some(f) => Resolvable::Computed(Arc::clone(f)),
                            None => return Slot::Malformed,
                        },
                        _ => return Slot::Malformed,
                    };
                    makes.push((table_key(key), threshold));
                }
                Slot::Bound(Resolvable::Static(makes))
            }
            _ => Slot::Invalid,
        }
    }

    fn bind_states(&self, value: &toml::Value) -> Slot<Resolvable<States>> {
        match value {
            toml::Value::String(name) => match self.states.get(name) {
                Some(f) => Slot::Bound(Resolvable::Computed(Arc::clone(f))),
                None => Slot::Invalid,
            },
            toml::Value::Table(table) => {
                let mut states = States::with_capacity(table.len());
                for (name, threshold) in table {
                    let Some(threshold) = threshold.as_integer() else {
                        return Slot::Malformed;
                    };
                    states.push((name.clone(), threshold));
                }
                Slot::Bound(Resolvable::Static(states))
            }
            _ => Slot::Invalid,
        }
    }

    fn bind_hook(&self, value: &toml::Value) -> Slot<Hook> {
        value
            .as_str()
            .and_then(|name| self.hooks.get(name))
            .map_or(Slot::Invalid, |hook| Slot::Bound(Arc::clone(hook)))
    }
}

impl std::fmt::Debug for Bindings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bindings")
            .field("makes", &self.makes.keys().collect::<Vec<_>>())
            .field("states", &self.states.keys().collect::<Vec<_>>())
            .field("thresholds", &self.thresholds.keys().collect::<Vec<_>>())
            .field("hooks", &self.hooks.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// TOML keys are always strings; integer-looking ones name numeric units.
fn table_key(key: &str) -> UnitId {
    key.parse::<i64>()
        .map_or_else(|_| UnitId::from(key), UnitId::from)
}

// ═══════════════════════════════════════════════════════════════════════════
// Raw declarations
// ═══════════════════════════════════════════════════════════════════════════

/// A field after name binding.
#[derive(Clone)]
enum Slot<T> {
    Bound(T),
    /// Wrong kind of value, or a name with no binding
    Invalid,
    /// A table with unusable entries
    Malformed,
}

impl<T> Slot<T> {
    fn shape(&self) -> FieldShape {
        match self {
            Self::Bound(_) => FieldShape::Valid,
            Self::Invalid => FieldShape::Invalid,
            Self::Malformed => FieldShape::Malformed,
        }
    }
}

fn field_shape<T>(slot: &Option<Slot<T>>) -> FieldShape {
    slot.as_ref().map_or(FieldShape::Absent, Slot::shape)
}

/// One `[[unit]]` table with its names bound but its shape unchecked.
#[derive(Clone)]
pub struct RawUnit {
    id: Option<toml::Value>,
    tick: Option<toml::Value>,
    makes: Option<Slot<Resolvable<Makes>>>,
    states: Option<Slot<Resolvable<States>>>,
    on_increment: Option<Slot<Hook>>,
    source: toml::Table,
}

impl RawUnit {
    fn id_shape(&self) -> IdShape {
        match &self.id {
            None => IdShape::Missing,
            Some(toml::Value::String(name)) if name.is_empty() => IdShape::Missing,
            Some(toml::Value::String(name)) => IdShape::Valid(UnitId::from(name.as_str())),
            Some(toml::Value::Integer(n)) => IdShape::Valid(UnitId::from(*n)),
            Some(_) => IdShape::Invalid,
        }
    }

    fn rejected(&self, field: &str) -> TimeError {
        TimeError::InvalidConfiguration {
            message: CONFIG_ERROR_MESSAGE.to_string(),
            errors: vec![format!("Unusable '{field}' in {}", self.describe())],
        }
    }
}

impl Declaration for RawUnit {
    fn shape(&self) -> Shape {
        Shape {
            id: self.id_shape(),
            tick: match &self.tick {
                None => FieldShape::Absent,
                Some(toml::Value::Boolean(_)) => FieldShape::Valid,
                Some(_) => FieldShape::Invalid,
            },
            makes: field_shape(&self.makes),
            states: field_shape(&self.states),
            on_increment: field_shape(&self.on_increment),
        }
    }

    fn is_tick(&self) -> bool {
        matches!(self.tick, Some(toml::Value::Boolean(true)))
    }

    fn describe(&self) -> String {
        serde_json::to_string(&self.source).unwrap_or_default()
    }
}

impl std::fmt::Debug for RawUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawUnit")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl TryFrom<RawUnit> for TaggedUnit {
    type Error = TimeError;

    fn try_from(raw: RawUnit) -> Result<Self, Self::Error> {
        fn take<T>(slot: Option<Slot<T>>, raw: &RawUnit, field: &str) -> Result<Option<T>, TimeError> {
            match slot {
                None => Ok(None),
                Some(Slot::Bound(value)) => Ok(Some(value)),
                Some(_) => Err(raw.rejected(field)),
            }
        }

        let IdShape::Valid(id) = raw.id_shape() else {
            return Err(raw.rejected("id"));
        };
        let definition = UnitDefinition {
            tick: raw.is_tick(),
            makes: take(raw.makes.clone(), &raw, "makes")?,
            states: take(raw.states.clone(), &raw, "states")?,
            on_increment: take(raw.on_increment.clone(), &raw, "on_increment")?,
        };
        Ok(definition.tagged(id))
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Loading
// ═══════════════════════════════════════════════════════════════════════════

/// Parse the `[[unit]]` tables of a definitions file. `origin` names the
/// source in parse errors.
pub fn parse_units(text: &str, origin: &str, bindings: &Bindings) -> Result<Vec<RawUnit>, TimeError> {
    let file: UnitFile = toml::from_str(text).map_err(|source| TimeError::Parse {
        origin: origin.to_string(),
        source,
    })?;
    Ok(file
        .units
        .into_iter()
        .map(|table| bindings.raw_unit(table))
        .collect())
}

/// Load a single TOML definitions file
pub fn load_file(path: &Path, bindings: &Bindings) -> Result<Vec<RawUnit>, TimeError> {
    let contents = fs::read_to_string(path).map_err(|e| TimeError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_units(&contents, &path.display().to_string(), bindings)
}

/// Load every `*.toml` file in `dir`, in file-name order. Files that fail
/// to load are logged and skipped.
pub fn load_directory(dir: &Path, bindings: &Bindings) -> Result<Vec<RawUnit>, TimeError> {
    let entries = fs::read_dir(dir).map_err(|e| TimeError::Io {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut paths: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "toml"))
        .collect();
    paths.sort();

    let mut units = Vec::new();
    for path in paths {
        match load_file(&path, bindings) {
            Ok(loaded) => {
                tracing::debug!(file = ?path.file_name(), count = loaded.len(), "Loaded unit definitions");
                units.extend(loaded);
            }
            Err(e) => {
                tracing::warn!(file = ?path.file_name(), error = %e, "Failed to load unit definitions");
            }
        }
    }
    Ok(units)
}

/// Default directory for user definitions files
pub fn default_definitions_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("timecrunch"))
}
