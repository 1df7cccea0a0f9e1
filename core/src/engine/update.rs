use serde::ser::{Serialize, SerializeMap, Serializer};
use timecrunch_types::{StateName, UnitId};

use crate::time::TimeMap;

/// Per-unit states plus human time, as handed to a UI.
///
/// Serializes flat: `{ "second": null, "month": "winter", "time": { .. } }`.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateObject {
    /// Declaration order; `None` for units without states
    pub states: Vec<(UnitId, Option<StateName>)>,
    pub time: TimeMap,
}

impl UpdateObject {
    pub fn state(&self, id: &UnitId) -> Option<&str> {
        self.states
            .iter()
            .find(|(unit, _)| unit == id)
            .and_then(|(_, state)| state.as_deref())
    }
}

impl Serialize for UpdateObject {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.states.len() + 1))?;
        for (id, state) in &self.states {
            map.serialize_entry(&id.to_string(), state)?;
        }
        map.serialize_entry("time", &self.time)?;
        map.end()
    }
}
