use std::io::Read;
use std::str::FromStr;

use log::{debug, info, warn};
use roxmltree::Node;

use super::{BitString, DecodeError};
use crate::model::{
    Connection, ConnectionId, Intersection, Lane, LaneId, LaneKind, LanePermissions, ManeuverFlags,
    NodePoint, SignalGroupId, TrafficStream,
};
use crate::registry::TypeHeuristic;

#[derive(Debug, Clone, PartialEq)]
pub struct DecodeOptions {
    /// Added to the raw connection id when either endpoint lane is a crosswalk.
    pub crosswalk_connection_offset: u32,
    /// Types signal groups that show up in traffic streams before the table is merged.
    pub heuristic: TypeHeuristic,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            crosswalk_connection_offset: 1000,
            heuristic: TypeHeuristic::default(),
        }
    }
}

/// Turns an XER encoded MAP message into an [`Intersection`] with physical signal groups
/// attached to their connections.
///
/// Elements are matched by local name, so `DSRC:` / `MapExtension:` prefixes are irrelevant as
/// long as the document declares them.
pub struct MapemDecoder {
    options: DecodeOptions,
}

struct PendingConnection {
    ingress: LaneId,
    egress: LaneId,
    raw_id: Option<u32>,
    maneuvers: ManeuverFlags,
    logical_signal_group: Option<u32>,
}

impl Default for MapemDecoder {
    fn default() -> Self {
        Self::new(DecodeOptions::default())
    }
}

impl MapemDecoder {
    pub fn new(options: DecodeOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    pub fn decode<R: Read>(&self, mut reader: R) -> Result<Intersection, DecodeError> {
        let mut raw = String::new();
        reader.read_to_string(&mut raw)?;
        self.decode_str(&raw)
    }

    pub fn decode_str(&self, raw: &str) -> Result<Intersection, DecodeError> {
        let tree = roxmltree::Document::parse(raw)?;
        let geometry = tree
            .descendants()
            .find(|n| is_named(n, "IntersectionGeometry"))
            .ok_or(DecodeError::NoIntersection)?;

        let mut intersection = decode_identity(geometry)?;
        info!("Decoding intersection {} (region {})", intersection.id, intersection.region);

        let mut pending = Vec::new();
        for lane_node in geometry.descendants().filter(|n| is_named(n, "GenericLane")) {
            let lane = decode_lane(lane_node)?;
            pending.extend(decode_connections(lane_node, lane.id)?);
            debug!(
                "Lane {}: ingress={} egress={} approach={:?} nodes={}",
                lane.id,
                lane.ingress,
                lane.egress,
                lane.approach_id,
                lane.nodes.len()
            );
            intersection.add_lane(lane)?;
        }
        info!("Decoded {} lanes", intersection.lane_count());

        for connection in pending {
            self.add_connection(&mut intersection, connection)?;
        }
        info!("Decoded {} connections", intersection.connection_count());

        for stream_node in tree.descendants().filter(|n| is_named(n, "TrafficStreamConfigData")) {
            self.add_traffic_stream(&mut intersection, stream_node)?;
        }
        info!(
            "Decoded {} traffic streams referencing {} signal groups",
            intersection.traffic_streams().len(),
            intersection.signal_group_count()
        );

        check_signal_coverage(&intersection)?;
        Ok(intersection)
    }

    fn add_connection(
        &self,
        intersection: &mut Intersection,
        pending: PendingConnection,
    ) -> Result<(), DecodeError> {
        let context = || format!("connection from lane {}", pending.ingress);
        let ingress = intersection.lane(pending.ingress).ok_or_else(|| DecodeError::UnknownLane {
            lane: pending.ingress,
            context: context(),
        })?;
        let egress = intersection.lane(pending.egress).ok_or_else(|| DecodeError::UnknownLane {
            lane: pending.egress,
            context: context(),
        })?;
        let raw_id = pending.raw_id.ok_or(DecodeError::MissingConnectionId {
            lane: pending.ingress,
            target: pending.egress,
        })?;

        let id = if ingress.kind.crosswalk || egress.kind.crosswalk {
            raw_id
                .checked_add(self.options.crosswalk_connection_offset)
                .ok_or_else(|| DecodeError::InvalidValue {
                    field: "connectionID",
                    value: raw_id.to_string(),
                })?
        } else {
            raw_id
        };

        let mut connection =
            Connection::new(ConnectionId(id), pending.ingress, pending.egress, pending.maneuvers);
        if let Some(logical) = pending.logical_signal_group {
            connection = connection.with_logical_signal_group(logical);
        }
        debug!("{}", connection);
        intersection.add_connection(connection)?;
        Ok(())
    }

    /// Records the stream and attaches its physical group to every connection sharing the
    /// addressed connection's logical signal group.
    fn add_traffic_stream(
        &self,
        intersection: &mut Intersection,
        node: Node,
    ) -> Result<(), DecodeError> {
        const ELEMENT: &str = "TrafficStreamConfigData";
        let ref_lane = LaneId(required(node, ELEMENT, "refLaneId")?);
        let connect_to = LaneId(required(node, ELEMENT, "refConnectTo")?);
        for lane in [ref_lane, connect_to] {
            if intersection.lane(lane).is_none() {
                return Err(DecodeError::UnknownLane {
                    lane,
                    context: format!("traffic stream {} -> {}", ref_lane, connect_to),
                });
            }
        }

        let mut stream = TrafficStream::new(ref_lane, connect_to);
        stream.intersection_part = optional(node, "intersectionPart")?;

        if let Some(groups) = child(node, "signalGroups") {
            if let Some(vt) = physical_id(groups, "primary")? {
                stream.physical_signal_group = Some(vt);
                stream.primary = true;
            } else if let Some(vt) = physical_id(groups, "secondary")? {
                stream.physical_signal_group = Some(vt);
            }
        }
        stream.connection = intersection.find_connection(ref_lane, connect_to).map(|c| c.id);

        match (stream.physical_signal_group, stream.connection) {
            (None, _) => {
                warn!("Traffic stream {} -> {} names no physical signal group", ref_lane, connect_to);
            }
            (Some(group), connection) => {
                if !intersection.has_signal_group(group) {
                    let placeholder = self.options.heuristic.placeholder(group);
                    debug!("Created {}", placeholder);
                    intersection.upsert_signal_group(placeholder);
                }
                match connection {
                    Some(connection) => fan_out(intersection, group, connection)?,
                    None => warn!(
                        "No connection {} -> {} for traffic stream of signal group {}",
                        ref_lane, connect_to, group
                    ),
                }
            }
        }

        intersection.add_traffic_stream(stream);
        Ok(())
    }
}

fn fan_out(
    intersection: &mut Intersection,
    group: SignalGroupId,
    connection: ConnectionId,
) -> Result<(), DecodeError> {
    let logical = intersection
        .connection(connection)
        .and_then(|c| c.logical_signal_group);
    let targets: Vec<ConnectionId> = match logical {
        Some(logical) => intersection
            .connections_by_logical_signal_group(logical)
            .iter()
            .map(|c| c.id)
            .collect(),
        None => vec![connection],
    };
    for target in targets {
        if intersection.link_signal_group(group, target)? {
            debug!("Linked connection {} to signal group {}", target, group);
        }
    }
    Ok(())
}

/// Every ingress lane used by a traffic stream needs at least one outgoing connection with a
/// physical signal group.
fn check_signal_coverage(intersection: &Intersection) -> Result<(), DecodeError> {
    let mut unsignalled: Vec<LaneId> = intersection
        .traffic_streams()
        .iter()
        .filter_map(|s| intersection.lane(s.ref_lane))
        .filter(|lane| lane.ingress)
        .filter(|lane| {
            !lane
                .outgoing_connections()
                .iter()
                .filter_map(|id| intersection.connection(*id))
                .any(|c| c.has_signal_groups())
        })
        .map(|lane| lane.id)
        .collect();
    unsignalled.sort();
    unsignalled.dedup();
    if !unsignalled.is_empty() {
        return Err(DecodeError::UnsignalledIngress(unsignalled));
    }

    let uncontrolled = intersection.connections_without_signal_groups();
    if !uncontrolled.is_empty() {
        warn!(
            "{} connections have no signal group: {:?}",
            uncontrolled.len(),
            uncontrolled.iter().map(|c| c.id.0).collect::<Vec<_>>()
        );
    }
    Ok(())
}

fn decode_identity(geometry: Node) -> Result<Intersection, DecodeError> {
    const ELEMENT: &str = "IntersectionGeometry";
    let id_node = child(geometry, "id").ok_or(DecodeError::MissingField {
        element: ELEMENT,
        field: "id",
    })?;
    let id = required(id_node, "id", "id")?;
    let region = optional(id_node, "region")?.unwrap_or(0);

    let mut intersection = Intersection::new(id, region);
    intersection.name = child_text(geometry, "name").map(str::to_string);
    intersection.revision = optional(geometry, "revision")?.unwrap_or(0);
    if let Some(ref_point) = child(geometry, "refPoint") {
        intersection.ref_lat = optional(ref_point, "lat")?;
        intersection.ref_long = optional(ref_point, "long")?;
    }
    Ok(intersection)
}

fn decode_lane(node: Node) -> Result<Lane, DecodeError> {
    let mut lane = Lane::new(LaneId(required(node, "GenericLane", "laneID")?));
    lane.name = child_text(node, "name").map(str::to_string);

    let ingress_approach: Option<u32> = optional(node, "ingressApproach")?;
    let egress_approach: Option<u32> = optional(node, "egressApproach")?;
    lane.ingress = ingress_approach.is_some();
    lane.egress = egress_approach.is_some();
    lane.approach_id = ingress_approach.or(egress_approach);

    if let Some(attributes) = child(node, "laneAttributes") {
        if let Some(lane_type) = child(attributes, "laneType") {
            lane.kind = LaneKind {
                vehicle: child(lane_type, "vehicle").is_some(),
                bike: child(lane_type, "bikeLane").is_some(),
                crosswalk: child(lane_type, "crosswalk").is_some(),
            };
        }
        let permissions = match child_text(attributes, "sharedWith") {
            Some(raw) => LanePermissions::from(bits(raw, "sharedWith")?),
            None => LanePermissions::default(),
        };
        lane.permissions = permissions.with_lane_kind(lane.kind);
    }

    if let Some(node_list) = child(node, "nodeList") {
        for node_xy in node_list.descendants().filter(|n| is_named(n, "NodeXY")) {
            if let Some(point) = decode_node(node_xy)? {
                lane.nodes.push(point);
            }
        }
    }
    Ok(lane)
}

fn decode_node(node_xy: Node) -> Result<Option<NodePoint>, DecodeError> {
    let offset = child(node_xy, "delta").and_then(|delta| {
        delta
            .children()
            .find(|c| c.is_element() && c.tag_name().name().starts_with("node-XY"))
    });
    let offset = match offset {
        Some(offset) => offset,
        None => return Ok(None),
    };

    let stop_line = child(node_xy, "attributes")
        .and_then(|a| child(a, "localNode"))
        .map_or(false, |local| local.descendants().any(|n| is_named(&n, "stopLine")));

    Ok(Some(NodePoint::new(
        required(offset, "node-XY", "x")?,
        required(offset, "node-XY", "y")?,
        stop_line,
    )))
}

fn decode_connections(lane_node: Node, lane: LaneId) -> Result<Vec<PendingConnection>, DecodeError> {
    let mut result = Vec::new();
    let connects_to = match child(lane_node, "connectsTo") {
        Some(node) => node,
        None => return Ok(result),
    };

    for node in connects_to.children().filter(|n| is_named(n, "Connection")) {
        let connecting = child(node, "connectingLane").ok_or(DecodeError::MissingField {
            element: "Connection",
            field: "connectingLane",
        })?;
        let maneuvers = match child_text(connecting, "maneuver") {
            Some(raw) => ManeuverFlags::from(bits(raw, "maneuver")?),
            None => ManeuverFlags::default(),
        };
        result.push(PendingConnection {
            ingress: lane,
            egress: LaneId(required(connecting, "connectingLane", "lane")?),
            raw_id: optional(node, "connectionID")?,
            maneuvers,
            logical_signal_group: optional(node, "signalGroup")?,
        });
    }
    Ok(result)
}

/// `<vt>` under the given `primary`/`secondary` element. Zero means unassigned.
fn physical_id(groups: Node, slot: &str) -> Result<Option<SignalGroupId>, DecodeError> {
    let vt = match child(groups, slot).and_then(|n| n.descendants().find(|d| is_named(d, "vt"))) {
        Some(vt) => vt,
        None => return Ok(None),
    };
    match vt.text().map(str::trim).filter(|t| !t.is_empty()) {
        Some(raw) => {
            let id: u32 = parse(raw, "vt")?;
            Ok(Some(SignalGroupId(id)).filter(|_| id > 0))
        }
        None => Ok(None),
    }
}

fn is_named(node: &Node, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|c| is_named(c, name))
}

fn child_text<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    child(node, name)
        .and_then(|c| c.text())
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn parse<T: FromStr>(raw: &str, field: &'static str) -> Result<T, DecodeError> {
    raw.parse().map_err(|_| DecodeError::InvalidValue {
        field,
        value: raw.to_string(),
    })
}

fn required<T: FromStr>(
    node: Node,
    element: &'static str,
    field: &'static str,
) -> Result<T, DecodeError> {
    let raw = child_text(node, field).ok_or(DecodeError::MissingField { element, field })?;
    parse(raw, field)
}

fn optional<T: FromStr>(node: Node, field: &'static str) -> Result<Option<T>, DecodeError> {
    child_text(node, field).map(|raw| parse(raw, field)).transpose()
}

fn bits(raw: &str, field: &'static str) -> Result<BitString, DecodeError> {
    BitString::parse(raw).ok_or_else(|| DecodeError::InvalidValue {
        field,
        value: raw.to_string(),
    })
}
