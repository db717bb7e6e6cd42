// Domain value objects representing core business concepts

use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of a demand group (e.g. "moderate", "severe", "critical")
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(String);

impl GroupId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GroupId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for GroupId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Whether a group's allocation may exceed its own demand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacityPolicy {
    /// Only `x ≥ 0` and the shared capacity row. The whole budget always goes
    /// to the highest-weight group, scarce or not, so that group can be
    /// allocated more than its own demand while others get nothing.
    #[default]
    Uncapped,
    /// Adds `x[g] ≤ demand[g]` for every group
    CapAtDemand,
}

impl fmt::Display for CapacityPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapacityPolicy::Uncapped => write!(f, "Uncapped"),
            CapacityPolicy::CapAtDemand => write!(f, "Capped at demand"),
        }
    }
}
