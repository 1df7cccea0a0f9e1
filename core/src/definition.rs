//! Unit definition types
//!
//! A definition describes one unit of the hierarchy: whether it is the tick
//! unit, what it rolls over into (`makes`), its state buckets and an
//! optional increment hook. Definitions are built in Rust with the builder
//! methods below, or loaded from TOML (see [`crate::config`]).

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use timecrunch_types::{StateName, UnitId};

use crate::engine::TimeCrunch;
use crate::utils::{Context, Resolvable};

/// Ordered `downstream unit -> threshold` pairs. Only the first entry is used.
pub type Makes = Vec<(UnitId, Resolvable<i64>)>;

/// Ordered `state name -> lower threshold` pairs.
pub type States = Vec<(StateName, i64)>;

/// Side effect run with the engine after a unit is incremented. The hook may
/// tick or resynchronize the engine.
pub type Hook = Arc<dyn Fn(&mut TimeCrunch) + Send + Sync>;

/// Definition of a single time unit (before linking)
#[derive(Clone, Default)]
pub struct UnitDefinition {
    /// Advanced by an argument-free tick. Exactly one unit sets this.
    pub tick: bool,

    /// What this unit rolls over into. `None` marks the outermost unit.
    pub makes: Option<Resolvable<Makes>>,

    /// Named state buckets derived from the current count
    pub states: Option<Resolvable<States>>,

    pub on_increment: Option<Hook>,
}

impl UnitDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick(mut self) -> Self {
        self.tick = true;
        self
    }

    /// Static rollover thresholds, e.g. `makes([("minute", 60)])`.
    pub fn makes<K, I>(mut self, entries: I) -> Self
    where
        K: Into<UnitId>,
        I: IntoIterator<Item = (K, i64)>,
    {
        let makes = entries
            .into_iter()
            .map(|(id, threshold)| (id.into(), Resolvable::Static(threshold)))
            .collect();
        self.makes = Some(Resolvable::Static(makes));
        self
    }

    /// Rollover declared with any mix of static and computed parts.
    pub fn makes_with(mut self, makes: Resolvable<Makes>) -> Self {
        self.makes = Some(makes);
        self
    }

    pub fn makes_computed<F>(self, f: F) -> Self
    where
        F: Fn(&Context<'_>) -> Makes + Send + Sync + 'static,
    {
        self.makes_with(Resolvable::computed(f))
    }

    pub fn states<K, I>(mut self, entries: I) -> Self
    where
        K: Into<StateName>,
        I: IntoIterator<Item = (K, i64)>,
    {
        let states = entries
            .into_iter()
            .map(|(name, threshold)| (name.into(), threshold))
            .collect();
        self.states = Some(Resolvable::Static(states));
        self
    }

    pub fn states_computed<F>(mut self, f: F) -> Self
    where
        F: Fn(&Context<'_>) -> States + Send + Sync + 'static,
    {
        self.states = Some(Resolvable::computed(f));
        self
    }

    pub fn on_increment<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut TimeCrunch) + Send + Sync + 'static,
    {
        self.on_increment = Some(Arc::new(f));
        self
    }

    /// Attach an identifier.
    pub fn tagged(self, id: impl Into<UnitId>) -> TaggedUnit {
        TaggedUnit {
            id: id.into(),
            definition: self,
        }
    }
}

impl fmt::Debug for UnitDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitDefinition")
            .field("tick", &self.tick)
            .field("makes", &self.makes)
            .field("states", &self.states)
            .field("on_increment", &self.on_increment.is_some())
            .finish()
    }
}

/// A definition carrying its own identifier.
#[derive(Debug, Clone)]
pub struct TaggedUnit {
    pub id: UnitId,
    pub definition: UnitDefinition,
}

// ═══════════════════════════════════════════════════════════════════════════
// Declaration shape (validator input)
// ═══════════════════════════════════════════════════════════════════════════

/// How an identifier was declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdShape {
    Missing,
    /// Declared, but neither a string nor an integer
    Invalid,
    Valid(UnitId),
}

/// How an optional field was declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldShape {
    Absent,
    Valid,
    /// Wrong kind of value altogether (e.g. `makes = 5`)
    Invalid,
    /// Right container, unusable entries (e.g. a non-integer threshold)
    Malformed,
}

impl FieldShape {
    pub fn is_present(self) -> bool {
        self != FieldShape::Absent
    }
}

/// Field-by-field summary of a declaration, before any checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shape {
    pub id: IdShape,
    pub tick: FieldShape,
    pub makes: FieldShape,
    pub states: FieldShape,
    pub on_increment: FieldShape,
}

impl Shape {
    pub fn id(&self) -> Option<&UnitId> {
        match &self.id {
            IdShape::Valid(id) => Some(id),
            _ => None,
        }
    }
}

/// Anything the validator can inspect: typed definitions built in Rust and
/// raw declarations read from TOML.
pub trait Declaration {
    fn shape(&self) -> Shape;

    /// Declared with `tick = true`.
    fn is_tick(&self) -> bool;

    /// JSON rendering used in validation messages.
    fn describe(&self) -> String;
}

impl Declaration for TaggedUnit {
    fn shape(&self) -> Shape {
        let present = |yes: bool| if yes { FieldShape::Valid } else { FieldShape::Absent };
        Shape {
            id: if self.id.is_blank() {
                IdShape::Missing
            } else {
                IdShape::Valid(self.id.clone())
            },
            tick: FieldShape::Valid,
            makes: present(self.definition.makes.is_some()),
            states: present(self.definition.states.is_some()),
            on_increment: present(self.definition.on_increment.is_some()),
        }
    }

    fn is_tick(&self) -> bool {
        self.definition.tick
    }

    fn describe(&self) -> String {
        #[derive(Serialize)]
        struct Described<'a> {
            #[serde(skip_serializing_if = "Option::is_none")]
            id: Option<&'a UnitId>,
            #[serde(skip_serializing_if = "std::ops::Not::not")]
            tick: bool,
        }

        serde_json::to_string(&Described {
            id: (!self.id.is_blank()).then_some(&self.id),
            tick: self.definition.tick,
        })
        .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_keeps_makes_order() {
        let def = UnitDefinition::new()
            .tick()
            .makes([("minute", 60), ("hour", 3600)]);
        assert!(def.tick);
        let makes = def.makes.as_ref().and_then(Resolvable::as_static).unwrap();
        let targets: Vec<_> = makes.iter().map(|(id, _)| id.to_string()).collect();
        assert_eq!(targets, vec!["minute", "hour"]);
    }

    #[test]
    fn test_tagged_shape_blank_id_is_missing() {
        let unit = UnitDefinition::new().tick().tagged("");
        assert_eq!(unit.shape().id, IdShape::Missing);
        assert_eq!(unit.describe(), r#"{"tick":true}"#);
    }

    #[test]
    fn test_tagged_shape_reports_present_fields() {
        let unit = UnitDefinition::new()
            .states([("day", 6), ("night", 20)])
            .tagged("hour");
        let shape = unit.shape();
        assert_eq!(shape.id(), Some(&UnitId::from("hour")));
        assert_eq!(shape.makes, FieldShape::Absent);
        assert_eq!(shape.states, FieldShape::Valid);
        assert!(!unit.is_tick());
    }
}
