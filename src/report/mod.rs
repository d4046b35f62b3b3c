//! Read-only projections of an intersection and its validation results, shaped for JSON output.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::{
    Connection, ConnectionId, Direction, Intersection, Lane, LaneId, ManeuverFlags, ManeuverType,
    SignalGroupId, SignalGroupType,
};
use crate::rules::{ValidationResult, Verdict};

pub mod text;

pub use text::*;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionInfo {
    pub id: ConnectionId,
    pub ingress_lane: LaneId,
    pub ingress_direction: Option<Direction>,
    pub egress_lane: LaneId,
    pub egress_direction: Option<Direction>,
    pub maneuver: ManeuverType,
    pub maneuvers: ManeuverFlags,
    pub logical_signal_group: Option<u32>,
    pub signal_groups: Vec<SignalGroupId>,
}

impl ConnectionInfo {
    pub fn new(intersection: &Intersection, connection: &Connection) -> Self {
        let direction = |lane| intersection.lane(lane).and_then(|l| l.direction);
        Self {
            id: connection.id,
            ingress_lane: connection.ingress,
            ingress_direction: direction(connection.ingress),
            egress_lane: connection.egress,
            egress_direction: direction(connection.egress),
            maneuver: connection.maneuver_type(),
            maneuvers: connection.maneuvers,
            logical_signal_group: connection.logical_signal_group,
            signal_groups: connection.signal_groups().iter().copied().collect(),
        }
    }
}

fn connection_list(intersection: &Intersection, connections: Vec<&Connection>) -> Vec<ConnectionInfo> {
    connections
        .into_iter()
        .map(|c| ConnectionInfo::new(intersection, c))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntersectionSummary {
    pub id: u32,
    pub name: Option<String>,
    pub region: u32,
    pub revision: u32,
    pub ref_lat: Option<f64>,
    pub ref_long: Option<f64>,
    pub lane_count: usize,
    pub connection_count: usize,
    pub signal_group_count: usize,
    pub traffic_stream_count: usize,
}

impl From<&Intersection> for IntersectionSummary {
    fn from(intersection: &Intersection) -> Self {
        Self {
            id: intersection.id,
            name: intersection.name.clone(),
            region: intersection.region,
            revision: intersection.revision,
            ref_lat: intersection.ref_lat,
            ref_long: intersection.ref_long,
            lane_count: intersection.lane_count(),
            connection_count: intersection.connection_count(),
            signal_group_count: intersection.signal_group_count(),
            traffic_stream_count: intersection.traffic_streams().len(),
        }
    }
}

fn lane_ids(lanes: BTreeMap<Direction, Vec<&Lane>>) -> BTreeMap<Direction, Vec<LaneId>> {
    lanes
        .into_iter()
        .map(|(direction, lanes)| (direction, lanes.iter().map(|l| l.id).collect()))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectionSummary {
    pub ingress_lanes: BTreeMap<Direction, Vec<LaneId>>,
    pub egress_lanes: BTreeMap<Direction, Vec<LaneId>>,
    pub connections_by_maneuver: BTreeMap<ManeuverType, Vec<ConnectionInfo>>,
}

impl From<&Intersection> for DirectionSummary {
    fn from(intersection: &Intersection) -> Self {
        let connections_by_maneuver = [
            ManeuverType::Straight,
            ManeuverType::Left,
            ManeuverType::Right,
            ManeuverType::UTurn,
        ]
        .into_iter()
        .map(|m| (m, connection_list(intersection, intersection.connections_with_maneuver(m))))
        .collect();

        Self {
            ingress_lanes: lane_ids(intersection.ingress_lanes_by_direction()),
            egress_lanes: lane_ids(intersection.egress_lanes_by_direction()),
            connections_by_maneuver,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalGroupSummary {
    pub id: SignalGroupId,
    pub name: String,
    pub group_type: SignalGroupType,
    pub controls_only_left_turns: bool,
    pub connection_count: usize,
    pub connections: Vec<ConnectionInfo>,
}

pub fn signal_group_summaries(intersection: &Intersection) -> Vec<SignalGroupSummary> {
    intersection
        .signal_groups()
        .map(|group| {
            let connections = connection_list(intersection, intersection.connections_by_signal_group(group.id));
            SignalGroupSummary {
                id: group.id,
                name: group.name.clone(),
                group_type: group.group_type,
                controls_only_left_turns: group.controls_only_left_turns(intersection),
                connection_count: connections.len(),
                connections,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Statistics {
    pub total_connections: usize,
    pub cyclist_right_turns: usize,
    pub valid: usize,
    pub invalid: usize,
    pub not_evaluable: usize,
    /// How often each clause ran, whatever its outcome.
    pub executed_rules: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultEntry {
    pub connection_id: ConnectionId,
    /// "IN → OUT", when both lane directions are known
    pub direction: Option<String>,
    pub maneuver: String,
    pub is_cyclist_right_turn: bool,
    pub valid: bool,
    pub verdict: Verdict,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<String>,
}

/// Validation results grouped by the ingress approach of each connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupedReport {
    pub statistics: Statistics,
    pub approaches: BTreeMap<Direction, Vec<ResultEntry>>,
    /// Results whose ingress lane has no direction.
    pub unassigned: Vec<ResultEntry>,
}

pub fn direction_label(intersection: &Intersection, connection: &Connection) -> Option<String> {
    let ingress = intersection.lane(connection.ingress)?.direction?;
    let egress = intersection.lane(connection.egress)?.direction?;
    Some(format!("{} → {}", ingress.name(), egress.name()))
}

pub fn statistics(intersection: &Intersection, results: &[ValidationResult]) -> Statistics {
    let mut stats = Statistics {
        total_connections: intersection.connection_count(),
        cyclist_right_turns: intersection.cyclist_right_turn_connections().len(),
        ..Statistics::default()
    };
    for result in results {
        match result.verdict {
            Verdict::Valid => stats.valid += 1,
            Verdict::Invalid => stats.invalid += 1,
            Verdict::NotEvaluable => stats.not_evaluable += 1,
        }
        for rule in &result.executed_rules {
            *stats.executed_rules.entry(rule.rule.clone()).or_insert(0) += 1;
        }
    }
    stats
}

pub fn grouped_report(intersection: &Intersection, results: &[ValidationResult]) -> GroupedReport {
    let mut approaches: BTreeMap<Direction, Vec<ResultEntry>> = BTreeMap::new();
    let mut unassigned = Vec::new();

    for result in results {
        let connection = match intersection.connection(result.connection) {
            Some(connection) => connection,
            None => continue,
        };
        let entry = ResultEntry {
            connection_id: connection.id,
            direction: direction_label(intersection, connection),
            maneuver: connection.maneuver_type().label().to_string(),
            is_cyclist_right_turn: connection.is_cyclist_right_turn(intersection),
            valid: result.valid,
            verdict: result.verdict,
            reasons: result.reasons.clone(),
        };
        match intersection.lane(connection.ingress).and_then(|l| l.direction) {
            Some(direction) => approaches.entry(direction).or_default().push(entry),
            None => unassigned.push(entry),
        }
    }

    GroupedReport {
        statistics: statistics(intersection, results),
        approaches,
        unassigned,
    }
}
