//! Merges the signal-group table into a decoded intersection.
//!
//! Groups the table knows get their authoritative name and type. Groups it doesn't know keep
//! the type the [`TypeHeuristic`] guessed for them and are reported back so callers can flag
//! the run as degraded.

use log::{info, warn};
use serde::Serialize;

use crate::decode::SignalGroupTable;
use crate::model::{Intersection, SignalGroup, SignalGroupId};

pub mod fallback;

pub use fallback::*;

/// What merging the table changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegistryReport {
    /// Groups whose name and type came from the table.
    pub updated: Vec<SignalGroupId>,
    /// Table entries that control nothing in the topology.
    pub added: Vec<SignalGroupId>,
    /// Groups typed by the heuristic only.
    pub fallback: Vec<SignalGroupId>,
    pub table_present: bool,
}

impl RegistryReport {
    pub fn is_degraded(&self) -> bool {
        !self.table_present || !self.fallback.is_empty()
    }
}

pub struct SignalGroupRegistry {
    heuristic: TypeHeuristic,
}

impl Default for SignalGroupRegistry {
    fn default() -> Self {
        Self::new(TypeHeuristic::default())
    }
}

impl SignalGroupRegistry {
    pub fn new(heuristic: TypeHeuristic) -> Self {
        Self { heuristic }
    }

    pub fn heuristic(&self) -> &TypeHeuristic {
        &self.heuristic
    }

    /// Applies `table` to every physical group in `intersection`. Never fails: a missing table or
    /// missing entries fall back to the heuristic.
    pub fn apply(&self, intersection: &mut Intersection, table: Option<&SignalGroupTable>) -> RegistryReport {
        let mut report = RegistryReport {
            table_present: table.is_some(),
            ..RegistryReport::default()
        };
        let known: Vec<SignalGroupId> = intersection.signal_groups().map(|sg| sg.id).collect();

        let table = match table {
            Some(table) => table,
            None => {
                warn!(
                    "No signal group table, {} signal groups keep inferred types",
                    known.len()
                );
                for id in known {
                    self.retype(intersection, id);
                    report.fallback.push(id);
                }
                return report;
            }
        };

        for id in known {
            match table.get(id) {
                Some(entry) => {
                    intersection.upsert_signal_group(SignalGroup::new(id, entry.name.clone(), entry.group_type));
                    report.updated.push(id);
                }
                None => {
                    self.retype(intersection, id);
                    report.fallback.push(id);
                }
            }
        }

        for (id, entry) in table.iter() {
            if !intersection.has_signal_group(id) {
                intersection.upsert_signal_group(SignalGroup::new(id, entry.name.clone(), entry.group_type));
                report.added.push(id);
            }
        }

        if !report.fallback.is_empty() {
            warn!(
                "Signal groups {:?} are missing from the table, their types are guessed",
                report.fallback.iter().map(|id| id.0).collect::<Vec<_>>()
            );
        }
        info!(
            "Signal group table applied: {} updated, {} added, {} inferred",
            report.updated.len(),
            report.added.len(),
            report.fallback.len()
        );
        report
    }

    // The decoder may have used a different heuristic.
    fn retype(&self, intersection: &mut Intersection, id: SignalGroupId) {
        if let Some(group) = intersection.signal_group_mut(id) {
            group.group_type = self.heuristic.infer(id);
        }
    }
}
