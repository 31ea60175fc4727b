//! Display ordering of the invention registry.

use crate::invention::Invention;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::fmt;
use std::str::FromStr;

/// User-selected ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortOrder {
    /// Stored order, newest first.
    #[default]
    #[serde(rename = "none")]
    Default,
    #[serde(rename = "stability-asc")]
    StabilityAscending,
    #[serde(rename = "stability-desc")]
    StabilityDescending,
}

impl SortOrder {
    pub const ALL: [SortOrder; 3] = [
        SortOrder::Default,
        SortOrder::StabilityAscending,
        SortOrder::StabilityDescending,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SortOrder::Default => "none",
            SortOrder::StabilityAscending => "stability-asc",
            SortOrder::StabilityDescending => "stability-desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown sort order: {0}")]
pub struct UnknownSortOrder(pub String);

impl FromStr for SortOrder {
    type Err = UnknownSortOrder;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortOrder::ALL
            .into_iter()
            .find(|order| order.label() == s)
            .ok_or_else(|| UnknownSortOrder(s.to_string()))
    }
}

/// A new ordered view of `inventions`; the slice itself is untouched.
///
/// Stability orders compare `quantum_stability` only and keep ties in
/// their stored order.
pub fn sorted(inventions: &[Invention], order: SortOrder) -> Vec<&Invention> {
    let mut view: Vec<&Invention> = inventions.iter().collect();
    match order {
        SortOrder::Default => {}
        SortOrder::StabilityAscending => view.sort_by_key(|inv| inv.quantum_stability),
        SortOrder::StabilityDescending => view.sort_by_key(|inv| Reverse(inv.quantum_stability)),
    }
    view
}
