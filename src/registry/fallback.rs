use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::config::Validate;
use crate::model::{SignalGroup, SignalGroupId, SignalGroupType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct IdRange {
    pub first: u32,
    pub last: u32,
}

impl IdRange {
    pub fn new(first: u32, last: u32) -> Self {
        Self { first, last }
    }

    pub fn contains(&self, id: u32) -> bool {
        self.first <= id && id <= self.last
    }

    pub fn overlaps(&self, other: &IdRange) -> bool {
        self.first <= other.last && other.first <= self.last
    }
}

/// Guesses a signal group's type from its id when the signal-group table has no entry for it.
///
/// The ranges only describe how one set of sample data happened to be numbered. Anything typed
/// by this is a degraded result, not a fact about the intersection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TypeHeuristic {
    pub pedestrian_ids: IdRange,
    pub cyclist_ids: IdRange,
    pub default_type: SignalGroupType,
}

impl Default for TypeHeuristic {
    fn default() -> Self {
        Self {
            pedestrian_ids: IdRange::new(7, 10),
            cyclist_ids: IdRange::new(6, 6),
            default_type: SignalGroupType::FV,
        }
    }
}

impl TypeHeuristic {
    pub fn infer(&self, id: SignalGroupId) -> SignalGroupType {
        if self.pedestrian_ids.contains(id.0) {
            SignalGroupType::FG
        } else if self.cyclist_ids.contains(id.0) {
            SignalGroupType::RD
        } else {
            self.default_type
        }
    }

    pub fn placeholder_name(id: SignalGroupId) -> String {
        format!("SG{}", id.0)
    }

    /// Signal group with a synthesized name and an inferred type.
    pub fn placeholder(&self, id: SignalGroupId) -> SignalGroup {
        SignalGroup::new(id, Self::placeholder_name(id), self.infer(id))
    }
}

impl Validate for TypeHeuristic {
    fn validate(&self) -> Result<()> {
        for (name, range) in [("pedestrian_ids", &self.pedestrian_ids), ("cyclist_ids", &self.cyclist_ids)] {
            if range.first > range.last {
                return Err(anyhow!("{} range is empty ({}..={})", name, range.first, range.last));
            }
        }

        if self.pedestrian_ids.overlaps(&self.cyclist_ids) {
            return Err(anyhow!("pedestrian_ids and cyclist_ids ranges must not overlap"));
        }

        Ok(())
    }
}
