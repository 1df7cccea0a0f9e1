//! The linked unit hierarchy.

use std::fmt;

use hashbrown::HashMap;
use timecrunch_types::UnitId;

use crate::definition::{Hook, Makes, States, TaggedUnit};
use crate::error::TimeError;
use crate::utils::{Computed, Context, Resolvable};

/// Count at which a unit rolls over.
#[derive(Clone)]
pub enum Threshold {
    /// Resolved once at link time
    Fixed(i64),
    /// Re-read from a computed `makes` every time it is consulted
    Live { next: UnitId, makes: Computed<Makes> },
}

impl Threshold {
    pub fn fixed(&self) -> Option<i64> {
        match self {
            Self::Fixed(max) => Some(*max),
            Self::Live { .. } => None,
        }
    }

    pub fn resolve(&self, id: &UnitId, ctx: &Context<'_>) -> Result<i64, TimeError> {
        match self {
            Self::Fixed(max) => Ok(*max),
            Self::Live { next, makes } => makes(ctx)
                .iter()
                .find(|(target, _)| target == next)
                .map(|(_, threshold)| threshold.resolve(ctx))
                .ok_or_else(|| TimeError::MissingThreshold {
                    id: id.clone(),
                    next: next.clone(),
                }),
        }
    }
}

impl fmt::Debug for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(max) => f.debug_tuple("Fixed").field(max).finish(),
            Self::Live { next, .. } => f.debug_struct("Live").field("next", next).finish(),
        }
    }
}

/// A unit record with its rollover target resolved.
#[derive(Clone)]
pub struct ResolvedUnit {
    pub id: UnitId,
    pub tick: bool,
    /// Kept as declared; only the first entry was used to derive `next`/`max`.
    pub makes: Option<Resolvable<Makes>>,
    pub states: Option<Resolvable<States>>,
    pub on_increment: Option<Hook>,

    pub next: Option<UnitId>,
    pub max: Option<Threshold>,
}

impl From<TaggedUnit> for ResolvedUnit {
    fn from(unit: TaggedUnit) -> Self {
        let def = unit.definition;
        Self {
            id: unit.id,
            tick: def.tick,
            makes: def.makes,
            states: def.states,
            on_increment: def.on_increment,
            next: None,
            max: None,
        }
    }
}

impl fmt::Debug for ResolvedUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedUnit")
            .field("id", &self.id)
            .field("tick", &self.tick)
            .field("next", &self.next)
            .field("max", &self.max)
            .field("states", &self.states)
            .field("on_increment", &self.on_increment.is_some())
            .finish()
    }
}

/// Tick unit plus every resolved unit, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct System {
    pub tick_unit: Option<UnitId>,
    pub units: HashMap<UnitId, ResolvedUnit>,
    /// Unit ids in declaration order
    pub order: Vec<UnitId>,
}

impl System {
    pub fn unit(&self, id: &UnitId) -> Option<&ResolvedUnit> {
        self.units.get(id)
    }

    /// Units in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &ResolvedUnit> {
        self.order.iter().filter_map(|id| self.units.get(id))
    }

    /// Insert a unit record; a repeated id replaces the record but keeps its
    /// original position.
    pub fn insert(&mut self, unit: ResolvedUnit) {
        if !self.units.contains_key(&unit.id) {
            self.order.push(unit.id.clone());
        }
        self.units.insert(unit.id.clone(), unit);
    }

    /// Every known id, comma separated.
    pub fn id_listing(&self) -> String {
        self.order
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Look up a unit, failing with the list of known ids.
    pub fn require(&self, id: &UnitId) -> Result<&ResolvedUnit, TimeError> {
        self.unit(id).ok_or_else(|| TimeError::UnknownUnit {
            id: id.clone(),
            known: self.id_listing(),
        })
    }
}
