use nalgebra::Point2;
use serde::Serialize;

use super::{ConnectionId, Direction, LaneId};

pub type Point = Point2<f64>;

/// Which road users may use a lane (the `sharedWith` bit string plus lane-type implications).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LanePermissions {
    pub motorized: bool,
    pub public_transport: bool,
    pub pedestrian: bool,
    pub cyclist: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LaneKind {
    pub vehicle: bool,
    pub bike: bool,
    pub crosswalk: bool,
}

/// One geometry node. Coordinates are the raw integer offsets from the encoded node list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NodePoint {
    pub x: i32,
    pub y: i32,
    pub stop_line: bool,
}

impl NodePoint {
    pub fn new(x: i32, y: i32, stop_line: bool) -> Self {
        Self { x, y, stop_line }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x as f64, self.y as f64)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Lane {
    pub id: LaneId,
    pub name: Option<String>,
    pub ingress: bool,
    pub egress: bool,
    pub approach_id: Option<u32>,
    /// Set by the geometry classifier.
    pub direction: Option<Direction>,
    pub kind: LaneKind,
    pub permissions: LanePermissions,
    pub nodes: Vec<NodePoint>,
    // Maintained by Intersection::add_connection
    pub(crate) incoming: Vec<ConnectionId>,
    pub(crate) outgoing: Vec<ConnectionId>,
}

impl Lane {
    pub fn new(id: LaneId) -> Self {
        Self {
            id,
            name: None,
            ingress: false,
            egress: false,
            approach_id: None,
            direction: None,
            kind: LaneKind::default(),
            permissions: LanePermissions::default(),
            nodes: Vec::new(),
            incoming: Vec::new(),
            outgoing: Vec::new(),
        }
    }

    pub fn ingress(id: LaneId, approach_id: u32) -> Self {
        let mut lane = Self::new(id);
        lane.ingress = true;
        lane.approach_id = Some(approach_id);
        lane
    }

    pub fn egress(id: LaneId, approach_id: u32) -> Self {
        let mut lane = Self::new(id);
        lane.egress = true;
        lane.approach_id = Some(approach_id);
        lane
    }

    pub fn add_node(&mut self, x: i32, y: i32, stop_line: bool) {
        self.nodes.push(NodePoint::new(x, y, stop_line));
    }

    pub fn first_node(&self) -> Option<&NodePoint> {
        self.nodes.first()
    }

    pub fn last_node(&self) -> Option<&NodePoint> {
        self.nodes.last()
    }

    /// First node flagged as stop line, if any.
    pub fn stop_line(&self) -> Option<&NodePoint> {
        self.nodes.iter().find(|n| n.stop_line)
    }

    pub fn is_ingress_vehicle_lane(&self) -> bool {
        self.ingress && self.kind.vehicle
    }

    pub fn allows_cyclists(&self) -> bool {
        self.permissions.cyclist
    }

    pub fn incoming_connections(&self) -> &[ConnectionId] {
        &self.incoming
    }

    pub fn outgoing_connections(&self) -> &[ConnectionId] {
        &self.outgoing
    }
}
