use std::sync::Arc;

use timecrunch_types::{StateName, UnitId};

use crate::config::RawUnit;
use crate::definition::{TaggedUnit, UnitDefinition};
use crate::error::TimeError;
use crate::link::link;
use crate::system::{ResolvedUnit, System};
use crate::time::TimeMap;
use crate::utils::Context;
use crate::validate::{Validation, validate};

use super::update::UpdateObject;

/// A validated, linked time system and its current counts.
#[derive(Debug, Clone)]
pub struct TimeCrunch {
    system: Arc<System>,
    time: TimeMap,
    errors: Vec<String>,
}

impl TimeCrunch {
    /// Build from `(id, definition)` pairs. Pair order is declaration order.
    pub fn new<K, I>(config: I) -> Result<Self, TimeError>
    where
        K: Into<UnitId>,
        I: IntoIterator<Item = (K, UnitDefinition)>,
    {
        let units: Vec<TaggedUnit> = config
            .into_iter()
            .map(|(id, definition)| definition.tagged(id))
            .collect();
        Self::from_tagged(units)
    }

    pub fn define<K, I>(config: I) -> Result<Self, TimeError>
    where
        K: Into<UnitId>,
        I: IntoIterator<Item = (K, UnitDefinition)>,
    {
        Self::new(config)
    }

    pub fn from_tagged(units: Vec<TaggedUnit>) -> Result<Self, TimeError> {
        if units.is_empty() {
            return Err(TimeError::NoConfig);
        }
        let validation = validate(Validation::new(units))?;
        Self::from_validation(validation)
    }

    /// Build from declarations loaded out of TOML. Shape errors in the raw
    /// values are reported by validation before any conversion happens.
    pub fn from_raw(units: Vec<RawUnit>) -> Result<Self, TimeError> {
        if units.is_empty() {
            return Err(TimeError::NoConfig);
        }
        let validation = validate(Validation::new(units))?.try_map_input(TaggedUnit::try_from)?;
        Self::from_validation(validation)
    }

    fn from_validation(validation: Validation<TaggedUnit>) -> Result<Self, TimeError> {
        let linked = link(validation)?;
        tracing::debug!(
            units = linked.system.units.len(),
            tick_unit = ?linked.system.tick_unit,
            "Time system ready"
        );
        Ok(Self {
            system: Arc::new(linked.system),
            time: linked.time,
            errors: linked.errors,
        })
    }

    // ─── Accessors ──────────────────────────────────────────────────────────

    pub fn system(&self) -> &System {
        &self.system
    }

    pub fn time(&self) -> &TimeMap {
        &self.time
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn unit(&self, id: &UnitId) -> Option<&ResolvedUnit> {
        self.system.unit(id)
    }

    /// Current count of a named unit, zero when absent.
    pub fn count(&self, name: &str) -> i64 {
        self.time.count(name)
    }

    /// View handed to computed values and hooks.
    pub fn context(&self) -> Context<'_> {
        Context::new(&self.system, &self.time)
    }

    // ─── Ticking ────────────────────────────────────────────────────────────

    /// Advance a unit. `None` advances the tick unit by exactly one through
    /// [`optimized_increment`](Self::optimized_increment) and ignores
    /// `amount`.
    pub fn tick(&mut self, id: Option<&UnitId>, amount: i64) -> Result<&mut Self, TimeError> {
        match id {
            None => {
                let tick_unit = self.system.tick_unit.clone().ok_or(TimeError::NoTickUnit)?;
                self.optimized_increment(&tick_unit)
            }
            Some(id) => self.increment(id, amount),
        }
    }

    /// Advance the tick unit by one.
    pub fn advance(&mut self) -> Result<&mut Self, TimeError> {
        self.tick(None, 1)
    }

    pub fn tick_by(&mut self, id: impl Into<UnitId>, amount: i64) -> Result<&mut Self, TimeError> {
        let id = id.into();
        self.tick(Some(&id), amount)
    }

    /// Add `amount` to a unit, roll it over once if it reached its threshold,
    /// then run its hook.
    ///
    /// Rollover is a single step: the count resets to zero no matter how far
    /// past the threshold it went, and `next` is ticked once.
    pub fn increment(&mut self, id: &UnitId, amount: i64) -> Result<&mut Self, TimeError> {
        let system = Arc::clone(&self.system);
        let unit = system.require(id)?;

        let count = self.time.add(id, amount);
        if let Some(max) = &unit.max {
            let max = max.resolve(id, &self.context())?;
            if count >= max {
                self.roll_over(unit, count, max)?;
            }
        }

        if let Some(hook) = &unit.on_increment {
            hook(&mut *self);
        }
        Ok(self)
    }

    /// Fast path for the tick unit: always one step, thresholds read
    /// directly when fixed, no hook.
    pub fn optimized_increment(&mut self, id: &UnitId) -> Result<&mut Self, TimeError> {
        let system = Arc::clone(&self.system);
        let unit = system.require(id)?;

        let count = self.time.add(id, 1);
        let max = match &unit.max {
            Some(max) => match max.fixed() {
                Some(max) => Some(max),
                None => Some(max.resolve(id, &self.context())?),
            },
            None => None,
        };
        if let Some(max) = max
            && count >= max
        {
            self.roll_over(unit, count, max)?;
        }
        Ok(self)
    }

    fn roll_over(&mut self, unit: &ResolvedUnit, count: i64, max: i64) -> Result<(), TimeError> {
        self.time.insert(unit.id.clone(), 0);
        tracing::trace!(unit = %unit.id, count, max, next = ?unit.next, "Rollover");
        if let Some(next) = &unit.next {
            self.tick(Some(next), 1)?;
        }
        Ok(())
    }

    // ─── Queries ────────────────────────────────────────────────────────────

    /// Current state bucket of a unit.
    pub fn state(&self, id: &UnitId) -> Result<StateName, TimeError> {
        self.context().state(id)
    }

    /// Overwrite counts for the given units. Ids outside the system are
    /// stored as well.
    pub fn synchronize_time<K, I>(&mut self, time: I)
    where
        K: Into<UnitId>,
        I: IntoIterator<Item = (K, i64)>,
    {
        for (id, count) in time {
            self.time.insert(id.into(), count);
        }
    }

    /// Counts as people read them: one-based.
    pub fn human_time(&self) -> TimeMap {
        self.time
            .iter()
            .map(|(id, count)| (id.clone(), count.saturating_add(1)))
            .collect()
    }

    /// Snapshot of every unit's state plus the human time.
    pub fn update_object(&self) -> Result<UpdateObject, TimeError> {
        let states = self
            .system
            .iter()
            .map(|unit| {
                let state = match unit.states {
                    Some(_) => Some(self.state(&unit.id)?),
                    None => None,
                };
                Ok((unit.id.clone(), state))
            })
            .collect::<Result<_, TimeError>>()?;

        Ok(UpdateObject {
            states,
            time: self.human_time(),
        })
    }
}
