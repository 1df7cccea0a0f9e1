//! Per-unit counts, kept in declaration order.

use hashbrown::HashMap;
use serde::ser::{Serialize, SerializeMap, Serializer};
use timecrunch_types::UnitId;

/// Map from unit id to its zero-indexed count.
///
/// Iteration follows insertion order, so snapshots and logs list units the
/// way they were declared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeMap {
    order: Vec<UnitId>,
    counts: HashMap<UnitId, i64>,
}

impl TimeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a count, appending the id if it is new. Returns the previous count.
    pub fn insert(&mut self, id: UnitId, count: i64) -> Option<i64> {
        if !self.counts.contains_key(&id) {
            self.order.push(id.clone());
        }
        self.counts.insert(id, count)
    }

    /// Add `amount` to a count (missing ids start at zero) and return the new value.
    pub fn add(&mut self, id: &UnitId, amount: i64) -> i64 {
        if !self.counts.contains_key(id) {
            self.order.push(id.clone());
        }
        let count = self.counts.entry(id.clone()).or_insert(0);
        *count = count.saturating_add(amount);
        *count
    }

    pub fn get(&self, id: &UnitId) -> Option<i64> {
        self.counts.get(id).copied()
    }

    /// Count for a named unit, zero when absent.
    pub fn count(&self, name: &str) -> i64 {
        self.get(&UnitId::from(name)).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&UnitId, i64)> {
        self.order
            .iter()
            .filter_map(|id| self.counts.get(id).map(|count| (id, *count)))
    }
}

impl FromIterator<(UnitId, i64)> for TimeMap {
    fn from_iter<I: IntoIterator<Item = (UnitId, i64)>>(iter: I) -> Self {
        let mut time = TimeMap::new();
        for (id, count) in iter {
            time.insert(id, count);
        }
        time
    }
}

impl Serialize for TimeMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (id, count) in self.iter() {
            map.serialize_entry(id, &count)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iteration_keeps_insertion_order() {
        let mut time = TimeMap::new();
        time.insert(UnitId::from("second"), 0);
        time.insert(UnitId::from("minute"), 3);
        time.insert(UnitId::from("second"), 7);

        let listed: Vec<_> = time.iter().map(|(id, n)| (id.to_string(), n)).collect();
        assert_eq!(
            listed,
            vec![("second".to_string(), 7), ("minute".to_string(), 3)]
        );
    }

    #[test]
    fn test_add_starts_missing_ids_at_zero() {
        let mut time = TimeMap::new();
        assert_eq!(time.add(&UnitId::from("hour"), 5), 5);
        assert_eq!(time.add(&UnitId::from("hour"), 2), 7);
        assert_eq!(time.len(), 1);
    }

    #[test]
    fn test_serializes_as_ordered_map() {
        let time: TimeMap = [(UnitId::from("b"), 1), (UnitId::from("a"), 2)]
            .into_iter()
            .collect();
        assert_eq!(serde_json::to_string(&time).unwrap(), r#"{"b":1,"a":2}"#);
    }
}
