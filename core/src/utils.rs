//! Small helpers shared by the validator, linker and engine.
//!
//! - [`Resolvable`]: a configured value that is either static or computed
//!   from a [`Context`] on demand ("maybe-call").
//! - [`create_id_list`]: comma-separated listing of numeric unit ids.
//! - [`handle_errors`]: pass-through aggregator that fails once with every
//!   accumulated message.

use std::fmt;
use std::sync::Arc;

use timecrunch_types::{StateName, UnitId};

use crate::buckets::select_state;
use crate::error::TimeError;
use crate::system::System;
use crate::time::TimeMap;

/// Read-only view handed to computed values.
///
/// Holds shared borrows only, so a computed value sees a fixed snapshot of
/// the system and time for the duration of the call.
#[derive(Clone, Copy)]
pub struct Context<'a> {
    pub system: &'a System,
    pub time: &'a TimeMap,
}

impl<'a> Context<'a> {
    pub fn new(system: &'a System, time: &'a TimeMap) -> Self {
        Self { system, time }
    }

    /// Current count of a named unit, zero when absent.
    pub fn count(&self, name: &str) -> i64 {
        self.time.count(name)
    }

    /// Current state of a unit.
    pub fn state(&self, id: &UnitId) -> Result<StateName, TimeError> {
        let unit = self.system.require(id)?;
        let states = unit
            .states
            .as_ref()
            .ok_or_else(|| TimeError::NoStates { id: id.clone() })?
            .resolve(self);
        let count = self.time.get(id).unwrap_or(0);
        select_state(states, count).ok_or_else(|| TimeError::InvalidUnit {
            id: id.clone(),
            count,
        })
    }

    /// Whether a named unit is currently in `state`. Any lookup failure
    /// reads as `false`.
    pub fn state_is(&self, name: &str, state: &str) -> bool {
        self.state(&UnitId::from(name))
            .is_ok_and(|current| current == state)
    }
}

impl fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("tick_unit", &self.system.tick_unit)
            .field("time", &self.time)
            .finish()
    }
}

/// A function computing a value from the current context.
pub type Computed<T> = Arc<dyn Fn(&Context<'_>) -> T + Send + Sync>;

/// Box a closure as a [`Computed`] value.
pub fn computed<T, F>(f: F) -> Computed<T>
where
    F: Fn(&Context<'_>) -> T + Send + Sync + 'static,
{
    Arc::new(f)
}

/// A configured value: either given directly or computed when consumed.
#[derive(Clone)]
pub enum Resolvable<T> {
    Static(T),
    Computed(Computed<T>),
}

impl<T: Clone> Resolvable<T> {
    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(&Context<'_>) -> T + Send + Sync + 'static,
    {
        Self::Computed(computed(f))
    }

    /// Evaluate against `ctx`; static values are returned as-is.
    pub fn resolve(&self, ctx: &Context<'_>) -> T {
        match self {
            Self::Static(value) => value.clone(),
            Self::Computed(f) => f(ctx),
        }
    }

    pub fn as_static(&self) -> Option<&T> {
        match self {
            Self::Static(value) => Some(value),
            Self::Computed(_) => None,
        }
    }

    pub fn is_computed(&self) -> bool {
        matches!(self, Self::Computed(_))
    }
}

impl<T> From<T> for Resolvable<T> {
    fn from(value: T) -> Self {
        Self::Static(value)
    }
}

impl<T: fmt::Debug> fmt::Debug for Resolvable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(value) => f.debug_tuple("Static").field(value).finish(),
            Self::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// Join the numeric ids among `ids` with `", "`.
///
/// Named ids are skipped, so a list of purely named units renders as an
/// empty string.
pub fn create_id_list<'a, I>(ids: I) -> String
where
    I: IntoIterator<Item = Option<&'a UnitId>>,
{
    ids.into_iter()
        .flatten()
        .filter(|id| id.is_number())
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Anything that carries an accumulated list of validation messages.
pub trait Reported {
    fn errors(&self) -> &[String];
}

pub const CONFIG_ERROR_LABEL: &str = "Configuration Error";
pub const CONFIG_ERROR_MESSAGE: &str = "Invalid TimeSystem Configuration, see logs.";

/// Pass `value` through untouched when it carries no messages; otherwise log
/// each one under `label` and fail with a single summary error.
pub fn handle_errors<T: Reported>(label: &str, message: &str, value: T) -> Result<T, TimeError> {
    if value.errors().is_empty() {
        return Ok(value);
    }
    let errors = value.errors();
    for err in errors {
        tracing::error!(error = %err, "{label}");
    }
    Err(TimeError::InvalidConfiguration {
        message: message.to_string(),
        errors: errors.to_vec(),
    })
}

pub fn handle_config_errors<T: Reported>(value: T) -> Result<T, TimeError> {
    handle_errors(CONFIG_ERROR_LABEL, CONFIG_ERROR_MESSAGE, value)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Messages(Vec<String>);

    impl Reported for Messages {
        fn errors(&self) -> &[String] {
            &self.0
        }
    }

    #[test]
    fn test_create_id_list_keeps_numbers_only() {
        let ids = [
            UnitId::from("2"),
            UnitId::from(1),
            UnitId::from("hour"),
            UnitId::from(7),
        ];
        let listed = create_id_list(ids.iter().map(Some).chain([None]));
        assert_eq!(listed, "1, 7");
    }

    #[test]
    fn test_create_id_list_empty() {
        assert_eq!(create_id_list(std::iter::empty()), "");
    }

    #[test]
    fn test_handle_errors_passes_through_when_empty() {
        let out = handle_errors("first", "second", Messages(vec![])).unwrap();
        assert!(out.0.is_empty());
    }

    #[test]
    fn test_handle_errors_fails_with_every_message() {
        let err = handle_config_errors(Messages(vec!["test".into(), "other".into()]))
            .err()
            .unwrap();
        assert_eq!(err.to_string(), CONFIG_ERROR_MESSAGE);
        assert_eq!(err.messages(), ["test".to_string(), "other".to_string()]);
    }

    #[test]
    fn test_resolve_static_and_computed() {
        let system = System::default();
        let mut time = TimeMap::new();
        time.insert(UnitId::from("month"), 3);
        let ctx = Context::new(&system, &time);

        let fixed: Resolvable<i64> = 12.into();
        assert_eq!(fixed.resolve(&ctx), 12);
        assert_eq!(fixed.as_static(), Some(&12));

        let days: Resolvable<i64> = Resolvable::computed(|ctx: &Context<'_>| {
            if ctx.count("month") % 2 == 1 { 31 } else { 30 }
        });
        assert!(days.is_computed());
        assert_eq!(days.resolve(&ctx), 31);
    }
}
