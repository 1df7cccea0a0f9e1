//! Linking: seed the time map, materialize unit records, resolve each unit's
//! rollover target (`next`) and threshold (`max`), then check the chain.

use std::collections::HashSet;

use timecrunch_types::UnitId;

use crate::definition::TaggedUnit;
use crate::error::TimeError;
use crate::system::{ResolvedUnit, System, Threshold};
use crate::time::TimeMap;
use crate::utils::{Context, Reported, Resolvable, handle_config_errors};
use crate::validate::Validation;

/// Accumulator threaded through the linking passes.
#[derive(Debug)]
struct Linking {
    input: Vec<TaggedUnit>,
    system: System,
    errors: Vec<String>,
    time: TimeMap,
}

impl Reported for Linking {
    fn errors(&self) -> &[String] {
        &self.errors
    }
}

/// Output of [`link`].
#[derive(Debug, Clone)]
pub struct Linked {
    pub system: System,
    pub time: TimeMap,
    pub errors: Vec<String>,
}

pub fn link(validation: Validation<TaggedUnit>) -> Result<Linked, TimeError> {
    let linking = build_time(validation);
    let linking = build_system_units(linking);
    let linking = link_to_next(linking);
    let linking = handle_config_errors(validate_chain(linking))?;

    tracing::debug!(
        units = linking.system.units.len(),
        tick_unit = ?linking.system.tick_unit,
        "Linked time system"
    );

    Ok(Linked {
        system: linking.system,
        time: linking.time,
        errors: linking.errors,
    })
}

fn build_time(validation: Validation<TaggedUnit>) -> Linking {
    let time = validation
        .input
        .iter()
        .map(|unit| (unit.id.clone(), 0))
        .collect();

    Linking {
        input: validation.input,
        system: validation.system,
        errors: validation.errors,
        time,
    }
}

fn build_system_units(mut linking: Linking) -> Linking {
    for unit in &linking.input {
        linking.system.insert(ResolvedUnit::from(unit.clone()));
    }
    linking
}

fn link_to_next(mut linking: Linking) -> Linking {
    // Resolve against an unlinked snapshot, then write back.
    let resolved: Vec<(UnitId, Option<UnitId>, Option<Threshold>)> = {
        let ctx = Context::new(&linking.system, &linking.time);
        linking
            .system
            .iter()
            .map(|unit| {
                let (next, max) = resolve_rollover(unit, &ctx);
                (unit.id.clone(), next, max)
            })
            .collect()
    };

    for (id, next, max) in resolved {
        if let Some(unit) = linking.system.units.get_mut(&id) {
            unit.next = next;
            unit.max = max;
        }
    }
    linking
}

/// First `makes` entry becomes `next`; its threshold becomes `max`.
fn resolve_rollover(
    unit: &ResolvedUnit,
    ctx: &Context<'_>,
) -> (Option<UnitId>, Option<Threshold>) {
    match &unit.makes {
        None => (None, None),
        Some(Resolvable::Static(makes)) => match makes.first() {
            Some((next, threshold)) => (
                Some(next.clone()),
                Some(Threshold::Fixed(threshold.resolve(ctx))),
            ),
            None => (None, None),
        },
        Some(Resolvable::Computed(makes)) => match makes(ctx).first() {
            Some((next, _)) => (
                Some(next.clone()),
                Some(Threshold::Live {
                    next: next.clone(),
                    makes: makes.clone(),
                }),
            ),
            None => {
                tracing::warn!(unit = %unit.id, "Computed makes returned no units; unit will not roll over");
                (None, None)
            }
        },
    }
}

/// Reject rollover cycles. Targets that are not declared units are only
/// warned about: ticking into them fails at call time instead.
fn validate_chain(mut linking: Linking) -> Linking {
    let system = &linking.system;
    let mut reported: HashSet<Vec<UnitId>> = HashSet::new();

    for unit in system.iter() {
        if let Some(next) = &unit.next
            && system.unit(next).is_none()
        {
            tracing::warn!(unit = %unit.id, next = %next, "Unit rolls over into an undeclared unit");
        }

        let mut path = vec![unit.id.clone()];
        let mut current = unit;
        while let Some(next) = &current.next {
            if let Some(pos) = path.iter().position(|id| id == next) {
                let mut cycle = path[pos..].to_vec();
                // Same cycle found from a different start: report once.
                let mut key = cycle.clone();
                key.sort();
                if reported.insert(key) {
                    cycle.push(next.clone());
                    let rendered: Vec<String> = cycle.iter().map(ToString::to_string).collect();
                    linking
                        .errors
                        .push(format!("Rollover cycle detected: {}", rendered.join(" -> ")));
                }
                break;
            }
            let Some(next_unit) = system.unit(next) else {
                break;
            };
            path.push(next.clone());
            current = next_unit;
        }
    }
    linking
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::UnitDefinition;
    use crate::validate::validate;

    fn linked(units: Vec<TaggedUnit>) -> Result<Linked, TimeError> {
        link(validate(Validation::new(units))?)
    }

    #[test]
    fn test_empty_input_links_to_empty_system() {
        let out = link(Validation::new(Vec::new())).unwrap();
        assert!(out.system.units.is_empty());
        assert!(out.time.is_empty());
        assert!(out.errors.is_empty());
    }

    #[test]
    fn test_time_is_seeded_with_zeroes_in_order() {
        let out = linked(vec![
            UnitDefinition::new().tick().makes([("minute", 60)]).tagged("second"),
            UnitDefinition::new().tagged("minute"),
        ])
        .unwrap();
        let seeded: Vec<_> = out.time.iter().map(|(id, n)| (id.to_string(), n)).collect();
        assert_eq!(
            seeded,
            vec![("second".to_string(), 0), ("minute".to_string(), 0)]
        );
    }

    #[test]
    fn test_first_makes_entry_wins() {
        let out = linked(vec![
            UnitDefinition::new()
                .tick()
                .makes([("minute", 60), ("hour", 3600)])
                .tagged("second"),
            UnitDefinition::new().makes([("hour", 60)]).tagged("minute"),
            UnitDefinition::new().tagged("hour"),
        ])
        .unwrap();
        let second = out.system.unit(&UnitId::from("second")).unwrap();
        assert_eq!(second.next, Some(UnitId::from("minute")));
        assert_eq!(second.max.as_ref().and_then(Threshold::fixed), Some(60));

        let hour = out.system.unit(&UnitId::from("hour")).unwrap();
        assert_eq!(hour.next, None);
        assert!(hour.max.is_none());
    }

    #[test]
    fn test_computed_threshold_is_evaluated_at_link_time() {
        let out = linked(vec![
            UnitDefinition::new()
                .tick()
                .makes_with(Resolvable::Static(vec![(
                    UnitId::from("day"),
                    Resolvable::computed(|ctx| ctx.system.units.len() as i64 * 10),
                )]))
                .tagged("hour"),
            UnitDefinition::new().tagged("day"),
        ])
        .unwrap();
        let hour = out.system.unit(&UnitId::from("hour")).unwrap();
        assert_eq!(hour.max.as_ref().and_then(Threshold::fixed), Some(20));
    }

    #[test]
    fn test_computed_makes_takes_keys_from_result() {
        let out = linked(vec![
            UnitDefinition::new().tick().makes([("month", 30)]).tagged("day"),
            UnitDefinition::new()
                .makes_computed(|_| vec![(UnitId::from("year"), Resolvable::Static(12))])
                .tagged("month"),
            UnitDefinition::new().tagged("year"),
        ])
        .unwrap();
        let month = out.system.unit(&UnitId::from("month")).unwrap();
        assert_eq!(month.next, Some(UnitId::from("year")));
        assert!(matches!(month.max, Some(Threshold::Live { .. })));
    }

    #[test]
    fn test_cycle_is_rejected_once() {
        let err = linked(vec![
            UnitDefinition::new().tick().makes([("b", 2)]).tagged("a"),
            UnitDefinition::new().makes([("a", 2)]).tagged("b"),
        ])
        .unwrap_err();
        assert_eq!(
            err.messages(),
            ["Rollover cycle detected: a -> b -> a".to_string()]
        );
    }

    #[test]
    fn test_self_rollover_is_a_cycle() {
        let err = linked(vec![
            UnitDefinition::new().tick().makes([("a", 2)]).tagged("a"),
        ])
        .unwrap_err();
        assert_eq!(err.messages(), ["Rollover cycle detected: a -> a".to_string()]);
    }

    #[test]
    fn test_undeclared_target_is_allowed() {
        let out = linked(vec![
            UnitDefinition::new().tick().makes([("month", 30)]).tagged("day"),
            UnitDefinition::new().makes([("year", 12)]).tagged("month"),
        ])
        .unwrap();
        let month = out.system.unit(&UnitId::from("month")).unwrap();
        assert_eq!(month.next, Some(UnitId::from("year")));
    }
}
