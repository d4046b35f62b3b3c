use std::collections::BTreeMap;
use std::fmt;

use super::{
    Connection, ConnectionId, Direction, Lane, LaneId, ManeuverType, ModelError, Point,
    SignalGroup, SignalGroupId, TrafficStream,
};

/// Owns every lane, connection and physical signal group of one intersection. Cross references
/// are ids resolved through the maps below; maps are ordered so iteration is by ascending id.
#[derive(Debug, Clone, Default)]
pub struct Intersection {
    pub id: u32,
    pub region: u32,
    pub name: Option<String>,
    pub revision: u32,
    pub ref_lat: Option<f64>,
    pub ref_long: Option<f64>,
    center: Option<Point>,
    lanes: BTreeMap<LaneId, Lane>,
    connections: BTreeMap<ConnectionId, Connection>,
    signal_groups: BTreeMap<SignalGroupId, SignalGroup>,
    traffic_streams: Vec<TrafficStream>,
}

impl Intersection {
    pub fn new(id: u32, region: u32) -> Self {
        Self {
            id,
            region,
            ..Self::default()
        }
    }

    pub fn add_lane(&mut self, lane: Lane) -> Result<(), ModelError> {
        if self.lanes.contains_key(&lane.id) {
            return Err(ModelError::DuplicateLane(lane.id));
        }
        self.lanes.insert(lane.id, lane);
        Ok(())
    }

    pub fn lane(&self, id: LaneId) -> Option<&Lane> {
        self.lanes.get(&id)
    }

    pub fn lane_mut(&mut self, id: LaneId) -> Option<&mut Lane> {
        self.lanes.get_mut(&id)
    }

    pub fn lanes(&self) -> impl Iterator<Item = &Lane> {
        self.lanes.values()
    }

    pub(crate) fn lanes_mut(&mut self) -> impl Iterator<Item = &mut Lane> {
        self.lanes.values_mut()
    }

    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    /// Adds a connection and registers it on both endpoint lanes. Both lanes must already exist
    /// and the id must be unused.
    pub fn add_connection(&mut self, connection: Connection) -> Result<ConnectionId, ModelError> {
        if self.connections.contains_key(&connection.id) {
            return Err(ModelError::DuplicateConnection(connection.id));
        }
        for lane in [connection.ingress, connection.egress] {
            if !self.lanes.contains_key(&lane) {
                return Err(ModelError::UnknownLane(lane));
            }
        }

        let id = connection.id;
        if let Some(ingress) = self.lanes.get_mut(&connection.ingress) {
            ingress.outgoing.push(id);
        }
        if let Some(egress) = self.lanes.get_mut(&connection.egress) {
            egress.incoming.push(id);
        }
        self.connections.insert(id, connection);
        Ok(id)
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&id)
    }

    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Connection from `ingress` to `egress`, lowest id first if the pair appears twice.
    pub fn find_connection(&self, ingress: LaneId, egress: LaneId) -> Option<&Connection> {
        let lane = self.lanes.get(&ingress)?;
        lane.outgoing
            .iter()
            .filter_map(|id| self.connections.get(id))
            .filter(|c| c.egress == egress)
            .min_by_key(|c| c.id)
    }

    /// Both endpoint lanes of a connection. Failing here means the graph is broken.
    pub fn endpoints(&self, connection: &Connection) -> Result<(&Lane, &Lane), ModelError> {
        let ingress = self
            .lanes
            .get(&connection.ingress)
            .ok_or(ModelError::UnknownLane(connection.ingress))?;
        let egress = self
            .lanes
            .get(&connection.egress)
            .ok_or(ModelError::UnknownLane(connection.egress))?;
        Ok((ingress, egress))
    }

    /// Inserts a signal group, or overwrites name and type of an existing one while keeping the
    /// connections it already controls.
    pub fn upsert_signal_group(&mut self, group: SignalGroup) {
        match self.signal_groups.get_mut(&group.id) {
            Some(existing) => {
                existing.name = group.name;
                existing.group_type = group.group_type;
            }
            None => {
                self.signal_groups.insert(group.id, group);
            }
        }
    }

    pub fn signal_group(&self, id: SignalGroupId) -> Option<&SignalGroup> {
        self.signal_groups.get(&id)
    }

    pub(crate) fn signal_group_mut(&mut self, id: SignalGroupId) -> Option<&mut SignalGroup> {
        self.signal_groups.get_mut(&id)
    }

    pub fn has_signal_group(&self, id: SignalGroupId) -> bool {
        self.signal_groups.contains_key(&id)
    }

    pub fn signal_groups(&self) -> impl Iterator<Item = &SignalGroup> {
        self.signal_groups.values()
    }

    pub fn signal_group_count(&self) -> usize {
        self.signal_groups.len()
    }

    /// Registers `connection` as controlled by `group` on both sides. Idempotent; returns whether
    /// the link is new.
    pub fn link_signal_group(
        &mut self,
        group: SignalGroupId,
        connection: ConnectionId,
    ) -> Result<bool, ModelError> {
        if !self.connections.contains_key(&connection) {
            return Err(ModelError::UnknownConnection(connection));
        }
        let sg = self
            .signal_groups
            .get_mut(&group)
            .ok_or(ModelError::UnknownSignalGroup(group))?;
        let added = sg.controlled.insert(connection);
        if let Some(conn) = self.connections.get_mut(&connection) {
            conn.signal_groups.insert(group);
        }
        Ok(added)
    }

    pub fn add_traffic_stream(&mut self, stream: TrafficStream) {
        self.traffic_streams.push(stream);
    }

    pub fn traffic_streams(&self) -> &[TrafficStream] {
        &self.traffic_streams
    }

    pub fn set_center(&mut self, center: Point) {
        self.center = Some(center);
    }

    pub fn center(&self) -> Option<Point> {
        self.center
    }

    pub fn cyclist_right_turn_connections(&self) -> Vec<&Connection> {
        self.connections()
            .filter(|c| c.is_cyclist_right_turn(self))
            .collect()
    }

    pub fn ingress_lanes_by_direction(&self) -> BTreeMap<Direction, Vec<&Lane>> {
        let mut result: BTreeMap<Direction, Vec<&Lane>> = BTreeMap::new();
        for lane in self.lanes().filter(|l| l.ingress) {
            if let Some(direction) = lane.direction {
                result.entry(direction).or_default().push(lane);
            }
        }
        result
    }

    pub fn egress_lanes_by_direction(&self) -> BTreeMap<Direction, Vec<&Lane>> {
        let mut result: BTreeMap<Direction, Vec<&Lane>> = BTreeMap::new();
        for lane in self.lanes().filter(|l| l.egress) {
            if let Some(direction) = lane.direction {
                result.entry(direction).or_default().push(lane);
            }
        }
        result
    }

    pub fn ingress_lanes_from(&self, direction: Direction) -> Vec<&Lane> {
        self.lanes()
            .filter(|l| l.ingress && l.direction == Some(direction))
            .collect()
    }

    pub fn left_turns_from(&self, lane: &Lane) -> Vec<&Connection> {
        lane.outgoing
            .iter()
            .filter_map(|id| self.connections.get(id))
            .filter(|c| c.is_left_turn())
            .collect()
    }

    pub fn connections_by_signal_group(&self, group: SignalGroupId) -> Vec<&Connection> {
        self.connections()
            .filter(|c| c.has_signal_group(group))
            .collect()
    }

    pub fn connections_by_logical_signal_group(&self, logical: u32) -> Vec<&Connection> {
        self.connections()
            .filter(|c| c.logical_signal_group == Some(logical))
            .collect()
    }

    pub fn connections_without_signal_groups(&self) -> Vec<&Connection> {
        self.connections()
            .filter(|c| !c.has_signal_groups())
            .collect()
    }

    /// Connections whose maneuver flags permit `maneuver`. A connection allowing both straight and
    /// right shows up under both.
    pub fn connections_with_maneuver(&self, maneuver: ManeuverType) -> Vec<&Connection> {
        self.connections()
            .filter(|c| match maneuver {
                ManeuverType::Straight => c.is_straight(),
                ManeuverType::Left => c.is_left_turn(),
                ManeuverType::Right => c.is_right_turn(),
                ManeuverType::UTurn => c.is_u_turn(),
                ManeuverType::Unknown => c.maneuver_type() == ManeuverType::Unknown,
            })
            .collect()
    }
}

impl fmt::Display for Intersection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Intersection{{id={}, name='{}', lanes={}, connections={}, signal_groups={}, traffic_streams={}}}",
            self.id,
            self.name.as_deref().unwrap_or(""),
            self.lanes.len(),
            self.connections.len(),
            self.signal_groups.len(),
            self.traffic_streams.len()
        )
    }
}
