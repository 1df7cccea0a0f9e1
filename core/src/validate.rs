//! Structural validation of unit declarations.
//!
//! Every check appends to a shared message list instead of stopping, so one
//! run reports as many problems as possible. The pipeline ends in
//! [`handle_config_errors`], which fails once if anything was recorded.

use crate::definition::{Declaration, FieldShape, IdShape, Shape};
use crate::error::TimeError;
use crate::system::System;
use crate::utils::{Reported, create_id_list, handle_config_errors};

/// Accumulator threaded through validation: messages, the partially built
/// system (only `tick_unit` is set here) and the declarations themselves.
#[derive(Debug, Clone, Default)]
pub struct Validation<D> {
    pub errors: Vec<String>,
    pub system: System,
    pub input: Vec<D>,
}

impl<D> Validation<D> {
    pub fn new(input: Vec<D>) -> Self {
        Self {
            errors: Vec::new(),
            system: System::default(),
            input,
        }
    }

    /// Convert the declarations, keeping messages and system as they are.
    pub fn try_map_input<E, F, T>(self, f: F) -> Result<Validation<E>, T>
    where
        F: FnMut(D) -> Result<E, T>,
    {
        let input = self.input.into_iter().map(f).collect::<Result<_, _>>()?;
        Ok(Validation {
            errors: self.errors,
            system: self.system,
            input,
        })
    }
}

impl<D> Reported for Validation<D> {
    fn errors(&self) -> &[String] {
        &self.errors
    }
}

/// Run every structural check, then fail if any message was recorded.
pub fn validate<D: Declaration>(seed: Validation<D>) -> Result<Validation<D>, TimeError> {
    let shapes: Vec<Shape> = seed.input.iter().map(Declaration::shape).collect();

    let seed = validate_parameters(seed, &shapes);
    let seed = validate_tick(seed, &shapes);
    let seed = validate_makes(seed, &shapes);
    let seed = validate_hooks(seed, &shapes);
    handle_config_errors(seed)
}

fn validate_parameters<D: Declaration>(
    mut seed: Validation<D>,
    shapes: &[Shape],
) -> Validation<D> {
    for (value, shape) in seed.input.iter().zip(shapes) {
        match shape.id {
            IdShape::Missing => {
                seed.errors
                    .push(format!("Id is not defined. {}", value.describe()));
            }
            IdShape::Invalid => {
                seed.errors
                    .push(format!("Id is not a string or number. {}", value.describe()));
            }
            IdShape::Valid(_) => {}
        }

        if shape.tick == FieldShape::Invalid {
            seed.errors
                .push(format!("Tick must be a boolean. {}", value.describe()));
        }

        match shape.makes {
            FieldShape::Invalid => {
                seed.errors
                    .push("Makes must be a plain object or a function".to_string());
            }
            FieldShape::Malformed => {
                seed.errors.push(format!(
                    "Makes thresholds must be integers or named computed values. {}",
                    value.describe()
                ));
            }
            _ => {}
        }

        match shape.states {
            FieldShape::Invalid => {
                seed.errors
                    .push("States must be a plain object or a function".to_string());
            }
            FieldShape::Malformed => {
                seed.errors.push(format!(
                    "States thresholds must be integers. {}",
                    value.describe()
                ));
            }
            _ => {}
        }

        if matches!(
            shape.on_increment,
            FieldShape::Invalid | FieldShape::Malformed
        ) {
            seed.errors.push("onIncrement must be a function".to_string());
        }
    }
    seed
}

fn validate_tick<D: Declaration>(mut seed: Validation<D>, shapes: &[Shape]) -> Validation<D> {
    let ticks: Vec<&Shape> = seed
        .input
        .iter()
        .zip(shapes)
        .filter(|(value, _)| value.is_tick())
        .map(|(_, shape)| shape)
        .collect();

    if ticks.len() != 1 {
        let mut message = format!(
            "You need one and only one 'tick' defined. Found {}.",
            ticks.len()
        );
        if !ticks.is_empty() {
            message.push_str(&format!(
                " Found: {}",
                create_id_list(ticks.iter().map(|shape| shape.id()))
            ));
        }
        seed.errors.push(message);
    }

    if let Some(id) = ticks.first().and_then(|shape| shape.id()) {
        seed.system.tick_unit = Some(id.clone());
    }
    seed
}

fn validate_makes<D>(mut seed: Validation<D>, shapes: &[Shape]) -> Validation<D> {
    let roots: Vec<&Shape> = shapes
        .iter()
        .filter(|shape| !shape.makes.is_present())
        .collect();

    if roots.len() > 1 {
        seed.errors.push(format!(
            "You should have no more than one defined time unit that does not make up a larger time unit. Found: {}",
            create_id_list(roots.iter().map(|shape| shape.id()))
        ));
    }
    seed
}

fn validate_hooks<D>(mut seed: Validation<D>, shapes: &[Shape]) -> Validation<D> {
    let bad_hooks: Vec<&Shape> = shapes
        .iter()
        .filter(|shape| {
            matches!(
                shape.on_increment,
                FieldShape::Invalid | FieldShape::Malformed
            )
        })
        .collect();

    if !bad_hooks.is_empty() {
        seed.errors.push(format!(
            "Expected a function for all uses of 'onIncrement'. Exceptions include {}.",
            create_id_list(bad_hooks.iter().map(|shape| shape.id()))
        ));
    }
    seed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{TaggedUnit, UnitDefinition};
    use timecrunch_types::UnitId;

    fn seed(input: Vec<TaggedUnit>) -> Validation<TaggedUnit> {
        Validation::new(input)
    }

    #[test]
    fn test_valid_input_sets_tick_unit() {
        let out = validate(seed(vec![UnitDefinition::new().tick().tagged(2)])).unwrap();
        assert!(out.errors.is_empty());
        assert_eq!(out.system.tick_unit, Some(UnitId::from(2)));
        assert_eq!(out.input.len(), 1);
    }

    #[test]
    fn test_two_ticks_name_numeric_ids() {
        let err = validate(seed(vec![
            UnitDefinition::new().tick().makes([("x", 1)]).tagged(1),
            UnitDefinition::new().tick().makes([("x", 1)]).tagged(2),
        ]))
        .unwrap_err();
        assert_eq!(
            err.messages(),
            ["You need one and only one 'tick' defined. Found 2. Found: 1, 2".to_string()]
        );
    }

    #[test]
    fn test_no_tick() {
        let err = validate(seed(vec![UnitDefinition::new().tagged("second")])).unwrap_err();
        assert_eq!(
            err.messages(),
            ["You need one and only one 'tick' defined. Found 0.".to_string()]
        );
    }

    #[test]
    fn test_more_than_one_root() {
        let err = validate(seed(vec![
            UnitDefinition::new().makes([(2, 10)]).tagged(1),
            UnitDefinition::new().tick().makes([(1, 10)]).tagged(2),
            UnitDefinition::new().tagged(3),
            UnitDefinition::new().tagged(4),
        ]))
        .unwrap_err();
        assert_eq!(
            err.messages(),
            ["You should have no more than one defined time unit that does not make up a larger time unit. Found: 3, 4".to_string()]
        );
    }

    #[test]
    fn test_missing_id_is_reported() {
        let err = validate(seed(vec![UnitDefinition::new().tick().tagged("")])).unwrap_err();
        assert!(
            err.messages()
                .contains(&r#"Id is not defined. {"tick":true}"#.to_string())
        );
    }

    #[test]
    fn test_named_ids_are_left_out_of_listings() {
        let err = validate(seed(vec![
            UnitDefinition::new().tick().tagged("second"),
            UnitDefinition::new().tick().tagged("minute"),
        ]))
        .unwrap_err();
        assert!(
            err.messages()
                .contains(&"You need one and only one 'tick' defined. Found 2. Found: ".to_string())
        );
    }
}
