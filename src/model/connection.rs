use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

use super::{ConnectionId, Intersection, Lane, LaneId, SignalGroupId};

/// Coarse maneuver class. Derived from the first set bit among straight, left, right, u-turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ManeuverType {
    Straight,
    Left,
    Right,
    UTurn,
    Unknown,
}

impl ManeuverType {
    pub fn label(self) -> &'static str {
        match self {
            ManeuverType::Straight => "Straight",
            ManeuverType::Left => "Left Turn",
            ManeuverType::Right => "Right Turn",
            ManeuverType::UTurn => "U-Turn",
            ManeuverType::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for ManeuverType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The eleven `AllowedManeuvers` flags of a connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ManeuverFlags {
    pub straight: bool,
    pub left: bool,
    pub right: bool,
    pub u_turn: bool,
    pub left_on_red: bool,
    pub right_on_red: bool,
    pub lane_change: bool,
    pub no_stopping: bool,
    pub yield_always: bool,
    pub go_with_halt: bool,
    pub caution: bool,
}

impl ManeuverFlags {
    pub fn maneuver_type(&self) -> ManeuverType {
        if self.straight {
            ManeuverType::Straight
        } else if self.left {
            ManeuverType::Left
        } else if self.right {
            ManeuverType::Right
        } else if self.u_turn {
            ManeuverType::UTurn
        } else {
            ManeuverType::Unknown
        }
    }

    pub fn straight() -> Self {
        Self { straight: true, ..Self::default() }
    }

    pub fn left() -> Self {
        Self { left: true, ..Self::default() }
    }

    pub fn right() -> Self {
        Self { right: true, ..Self::default() }
    }
}

/// A permitted maneuver from one ingress lane to one egress lane.
#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    pub id: ConnectionId,
    pub ingress: LaneId,
    pub egress: LaneId,
    pub maneuvers: ManeuverFlags,
    /// Join key from the encoded connection; not a physical signal.
    pub logical_signal_group: Option<u32>,
    pub(crate) signal_groups: BTreeSet<SignalGroupId>,
}

impl Connection {
    pub fn new(id: ConnectionId, ingress: LaneId, egress: LaneId, maneuvers: ManeuverFlags) -> Self {
        Self {
            id,
            ingress,
            egress,
            maneuvers,
            logical_signal_group: None,
            signal_groups: BTreeSet::new(),
        }
    }

    pub fn with_logical_signal_group(mut self, logical: u32) -> Self {
        self.logical_signal_group = Some(logical);
        self
    }

    pub fn maneuver_type(&self) -> ManeuverType {
        self.maneuvers.maneuver_type()
    }

    pub fn is_left_turn(&self) -> bool {
        self.maneuvers.left
    }

    pub fn is_right_turn(&self) -> bool {
        self.maneuvers.right
    }

    pub fn is_straight(&self) -> bool {
        self.maneuvers.straight
    }

    pub fn is_u_turn(&self) -> bool {
        self.maneuvers.u_turn
    }

    /// Physical signal groups, ascending by id.
    pub fn signal_groups(&self) -> &BTreeSet<SignalGroupId> {
        &self.signal_groups
    }

    pub fn has_signal_groups(&self) -> bool {
        !self.signal_groups.is_empty()
    }

    pub fn has_signal_group(&self, id: SignalGroupId) -> bool {
        self.signal_groups.contains(&id)
    }

    fn both_lanes(&self, intersection: &Intersection, allows: impl Fn(&Lane) -> bool) -> bool {
        match (intersection.lane(self.ingress), intersection.lane(self.egress)) {
            (Some(ingress), Some(egress)) => allows(ingress) && allows(egress),
            _ => false,
        }
    }

    pub fn allows_cyclists(&self, intersection: &Intersection) -> bool {
        self.both_lanes(intersection, |lane| lane.permissions.cyclist)
    }

    pub fn allows_pedestrians(&self, intersection: &Intersection) -> bool {
        self.both_lanes(intersection, |lane| lane.permissions.pedestrian)
    }

    pub fn allows_motorized(&self, intersection: &Intersection) -> bool {
        self.both_lanes(intersection, |lane| lane.permissions.motorized)
    }

    pub fn allows_public_transport(&self, intersection: &Intersection) -> bool {
        self.both_lanes(intersection, |lane| lane.permissions.public_transport)
    }

    pub fn is_cyclist_right_turn(&self, intersection: &Intersection) -> bool {
        self.is_right_turn() && self.allows_cyclists(intersection)
    }

    pub fn shares_egress_with(&self, other: &Connection) -> bool {
        self.egress == other.egress
    }

    pub fn is_from_opposite_direction_of(&self, other: &Connection, intersection: &Intersection) -> bool {
        let mine = intersection.lane(self.ingress).and_then(|l| l.direction);
        let theirs = intersection.lane(other.ingress).and_then(|l| l.direction);
        match (mine, theirs) {
            (Some(mine), Some(theirs)) => mine.opposite() == theirs,
            _ => false,
        }
    }

    /// A left turn from the opposing approach that converges on the same exit lane.
    pub fn is_conflicting_left_turn(&self, right_turn: &Connection, intersection: &Intersection) -> bool {
        self.is_left_turn()
            && self.id != right_turn.id
            && self.is_from_opposite_direction_of(right_turn, intersection)
            && self.shares_egress_with(right_turn)
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Connection{{id={}, ingress={}, egress={}, maneuver={}, signal_groups={:?}}}",
            self.id,
            self.ingress,
            self.egress,
            self.maneuver_type(),
            self.signal_groups.iter().map(|sg| sg.0).collect::<Vec<_>>()
        )
    }
}
