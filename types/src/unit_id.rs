use std::fmt;

use serde::{Deserialize, Serialize};

/// Name of a state bucket (e.g. "winter", "night").
pub type StateName = String;

/// Identifier of a time unit.
///
/// Units are usually named (`"hour"`), but numeric identifiers are accepted
/// as well. Only numeric identifiers show up in validation listings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UnitId {
    Number(i64),
    Name(String),
}

impl UnitId {
    pub fn is_number(&self) -> bool {
        matches!(self, Self::Number(_))
    }

    /// An empty name is treated the same as a missing identifier.
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Name(name) if name.is_empty())
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Name(name) => Some(name),
            Self::Number(_) => None,
        }
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

impl From<&str> for UnitId {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for UnitId {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<i64> for UnitId {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for UnitId {
    fn from(n: i32) -> Self {
        Self::Number(i64::from(n))
    }
}

impl PartialEq<str> for UnitId {
    fn eq(&self, other: &str) -> bool {
        self.as_name() == Some(other)
    }
}

impl PartialEq<&str> for UnitId {
    fn eq(&self, other: &&str) -> bool {
        self.as_name() == Some(*other)
    }
}
