use std::fmt;

use super::{direction_label, statistics, IntersectionSummary};
use crate::model::{Intersection, ManeuverType};
use crate::rules::ValidationResult;

/// Plain-text validation report, results sorted by their "IN → OUT" label.
pub struct ResultsText<'a> {
    pub intersection: &'a Intersection,
    pub results: &'a [ValidationResult],
}

impl fmt::Display for ResultsText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let stats = statistics(self.intersection, self.results);
        writeln!(f, "===== GREEN CYCLIST ARROW VALIDATION RESULTS =====")?;
        writeln!(f)?;
        writeln!(
            f,
            "Cyclist right turns checked: {} (Valid: {}, Invalid: {}, Not evaluable: {})",
            self.results.len(),
            stats.valid,
            stats.invalid,
            stats.not_evaluable
        )?;

        let mut labelled: Vec<(String, &ValidationResult)> = self
            .results
            .iter()
            .map(|r| {
                let label = self
                    .intersection
                    .connection(r.connection)
                    .and_then(|c| direction_label(self.intersection, c))
                    .unwrap_or_else(|| "?".to_string());
                (label, r)
            })
            .collect();
        labelled.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.connection.cmp(&b.1.connection)));

        for (label, result) in labelled {
            writeln!(f)?;
            writeln!(f, "[{}] {}", label, result)?;
            for rule in &result.executed_rules {
                writeln!(f, "    {} {}", rule.rule, rule.status)?;
            }
        }
        Ok(())
    }
}

/// Plain-text overview of lanes, connections and signal groups.
pub struct SummaryText<'a>(pub &'a Intersection);

impl fmt::Display for SummaryText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let intersection = self.0;
        let summary = IntersectionSummary::from(intersection);
        writeln!(f, "===== INTERSECTION SUMMARY =====")?;
        writeln!(f, "ID: {} (Region: {})", summary.id, summary.region)?;
        if let Some(name) = &summary.name {
            writeln!(f, "Name: {}", name)?;
        }
        writeln!(f, "Revision: {}", summary.revision)?;
        if let (Some(lat), Some(long)) = (summary.ref_lat, summary.ref_long) {
            writeln!(f, "Reference Point: ({}, {})", lat, long)?;
        }

        writeln!(f)?;
        writeln!(f, "Ingress Lanes by Direction:")?;
        for (direction, lanes) in intersection.ingress_lanes_by_direction() {
            writeln!(f, "  {}: {} lanes", direction, lanes.len())?;
            for lane in lanes {
                write!(f, "    Lane {}", lane.id)?;
                if lane.kind.vehicle {
                    write!(f, " [Vehicle]")?;
                }
                if lane.kind.bike {
                    write!(f, " [Bike]")?;
                }
                if lane.allows_cyclists() {
                    write!(f, " [Cyclists Allowed]")?;
                }
                writeln!(f)?;
            }
        }

        writeln!(f)?;
        writeln!(f, "Egress Lanes by Direction:")?;
        for (direction, lanes) in intersection.egress_lanes_by_direction() {
            writeln!(f, "  {}: {} lanes", direction, lanes.len())?;
        }

        writeln!(f)?;
        writeln!(f, "Connections:")?;
        writeln!(f, "  Total: {}", summary.connection_count)?;
        for maneuver in [ManeuverType::Right, ManeuverType::Left, ManeuverType::Straight] {
            writeln!(
                f,
                "  {}: {}",
                maneuver,
                intersection.connections_with_maneuver(maneuver).len()
            )?;
        }

        writeln!(f)?;
        writeln!(f, "Signal Groups:")?;
        for group in intersection.signal_groups() {
            writeln!(
                f,
                "  {}: {} ({}) - {} connections",
                group.id,
                group.name,
                group.group_type,
                group.controlled_connections().len()
            )?;
        }
        Ok(())
    }
}
