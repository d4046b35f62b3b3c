//! Helpers for building small MAPEM documents in tests.
#![allow(dead_code)]

use std::fmt::Write;

pub const FIXTURE_MAPEM: &str = "tests/fixtures/crossing.xml";
pub const FIXTURE_STG: &str = "tests/fixtures/crossing.stg";

pub const STRAIGHT: &str = "100000000000";
pub const LEFT: &str = "010000000000";
pub const RIGHT: &str = "001000000000";

pub const MOTORIZED_AND_CYCLISTS: &str = "0001000100";
pub const MOTORIZED_ONLY: &str = "0001000000";
pub const PEDESTRIANS: &str = "0000001000";

pub fn fixture_mapem() -> String {
    std::fs::read_to_string(FIXTURE_MAPEM).unwrap()
}

pub fn fixture_stg() -> String {
    std::fs::read_to_string(FIXTURE_STG).unwrap()
}

pub struct ConnectionXml {
    target: u32,
    maneuver: &'static str,
    logical: Option<u32>,
    id: Option<u32>,
}

pub struct LaneXml {
    id: u32,
    ingress: Option<u32>,
    egress: Option<u32>,
    shared: &'static str,
    kind: &'static str,
    nodes: Vec<(i32, i32, bool)>,
    connections: Vec<ConnectionXml>,
}

impl LaneXml {
    pub fn ingress(id: u32, approach: u32) -> Self {
        Self {
            id,
            ingress: Some(approach),
            egress: None,
            shared: MOTORIZED_AND_CYCLISTS,
            kind: "vehicle",
            nodes: Vec::new(),
            connections: Vec::new(),
        }
    }

    pub fn egress(id: u32, approach: u32) -> Self {
        Self {
            egress: Some(approach),
            ingress: None,
            ..Self::ingress(id, approach)
        }
    }

    pub fn shared(mut self, bits: &'static str) -> Self {
        self.shared = bits;
        self
    }

    pub fn kind(mut self, kind: &'static str) -> Self {
        self.kind = kind;
        self
    }

    pub fn node(mut self, x: i32, y: i32) -> Self {
        self.nodes.push((x, y, false));
        self
    }

    pub fn stop_line(mut self, x: i32, y: i32) -> Self {
        self.nodes.push((x, y, true));
        self
    }

    pub fn connect(mut self, target: u32, maneuver: &'static str, logical: u32, id: u32) -> Self {
        self.connections.push(ConnectionXml {
            target,
            maneuver,
            logical: Some(logical),
            id: Some(id),
        });
        self
    }

    pub fn connect_without_id(mut self, target: u32, maneuver: &'static str) -> Self {
        self.connections.push(ConnectionXml {
            target,
            maneuver,
            logical: None,
            id: None,
        });
        self
    }

    fn write(&self, out: &mut String) {
        writeln!(out, "<DSRC:GenericLane><DSRC:laneID>{}</DSRC:laneID>", self.id).unwrap();
        if let Some(a) = self.ingress {
            writeln!(out, "<DSRC:ingressApproach>{}</DSRC:ingressApproach>", a).unwrap();
        }
        if let Some(a) = self.egress {
            writeln!(out, "<DSRC:egressApproach>{}</DSRC:egressApproach>", a).unwrap();
        }
        writeln!(
            out,
            "<DSRC:laneAttributes><DSRC:sharedWith>{}</DSRC:sharedWith><DSRC:laneType><DSRC:{kind}>00</DSRC:{kind}></DSRC:laneType></DSRC:laneAttributes>",
            self.shared,
            kind = self.kind
        )
        .unwrap();
        out.push_str("<DSRC:nodeList><DSRC:nodes>\n");
        for (x, y, stop) in &self.nodes {
            write!(
                out,
                "<DSRC:NodeXY><DSRC:delta><DSRC:node-XY5><DSRC:x>{}</DSRC:x><DSRC:y>{}</DSRC:y></DSRC:node-XY5></DSRC:delta>",
                x, y
            )
            .unwrap();
            if *stop {
                out.push_str("<DSRC:attributes><DSRC:localNode><DSRC:NodeAttributeXY><DSRC:stopLine/></DSRC:NodeAttributeXY></DSRC:localNode></DSRC:attributes>");
            }
            out.push_str("</DSRC:NodeXY>\n");
        }
        out.push_str("</DSRC:nodes></DSRC:nodeList>\n");
        if !self.connections.is_empty() {
            out.push_str("<DSRC:connectsTo>\n");
            for c in &self.connections {
                write!(
                    out,
                    "<DSRC:Connection><DSRC:connectingLane><DSRC:lane>{}</DSRC:lane><DSRC:maneuver>{}</DSRC:maneuver></DSRC:connectingLane>",
                    c.target, c.maneuver
                )
                .unwrap();
                if let Some(logical) = c.logical {
                    write!(out, "<DSRC:signalGroup>{}</DSRC:signalGroup>", logical).unwrap();
                }
                if let Some(id) = c.id {
                    write!(out, "<DSRC:connectionID>{}</DSRC:connectionID>", id).unwrap();
                }
                out.push_str("</DSRC:Connection>\n");
            }
            out.push_str("</DSRC:connectsTo>\n");
        }
        out.push_str("</DSRC:GenericLane>\n");
    }
}

#[derive(Default)]
pub struct MapemBuilder {
    lanes: Vec<LaneXml>,
    streams: Vec<(u32, u32, &'static str, u32)>,
}

impl MapemBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lane(mut self, lane: LaneXml) -> Self {
        self.lanes.push(lane);
        self
    }

    pub fn stream(mut self, ref_lane: u32, connect_to: u32, vt: u32) -> Self {
        self.streams.push((ref_lane, connect_to, "primary", vt));
        self
    }

    pub fn secondary_stream(mut self, ref_lane: u32, connect_to: u32, vt: u32) -> Self {
        self.streams.push((ref_lane, connect_to, "secondary", vt));
        self
    }

    pub fn build(&self) -> String {
        let mut out = String::new();
        out.push_str(
            "<MAPEM xmlns:DSRC=\"http://www.etsi.org/its/DSRC\" xmlns:MapExtension=\"http://www.etsi.org/its/MapExtension\">\n",
        );
        out.push_str("<DSRC:IntersectionGeometry><DSRC:id><DSRC:region>1</DSRC:region><DSRC:id>42</DSRC:id></DSRC:id>\n");
        out.push_str("<DSRC:laneSet>\n");
        for lane in &self.lanes {
            lane.write(&mut out);
        }
        out.push_str("</DSRC:laneSet>\n");
        out.push_str("<DSRC:regional><MapExtension:trafficStreams>\n");
        for (ref_lane, connect_to, slot, vt) in &self.streams {
            writeln!(
                out,
                "<MapExtension:TrafficStreamConfigData><MapExtension:refLaneId>{}</MapExtension:refLaneId><MapExtension:refConnectTo>{}</MapExtension:refConnectTo><MapExtension:signalGroups><MapExtension:{slot}><MapExtension:vt>{}</MapExtension:vt></MapExtension:{slot}></MapExtension:signalGroups></MapExtension:TrafficStreamConfigData>",
                ref_lane,
                connect_to,
                vt,
                slot = slot
            )
            .unwrap();
        }
        out.push_str("</MapExtension:trafficStreams></DSRC:regional>\n");
        out.push_str("</DSRC:IntersectionGeometry>\n</MAPEM>\n");
        out
    }
}

/// West approach with a cyclist right turn (connection 1, lane 4 -> 13) and an opposing east
/// approach with a left turn (connection 3, lane 2 -> `left_turn_egress`) on signal group 2.
pub fn opposing_left_turn(left_turn_egress: u32) -> MapemBuilder {
    MapemBuilder::new()
        .lane(LaneXml::ingress(1, 1).stop_line(-150, 1000).connect(13, STRAIGHT, 4, 6))
        .lane(
            LaneXml::ingress(2, 2)
                .stop_line(1000, 150)
                .connect(left_turn_egress, LEFT, 2, 3)
                .connect(14, STRAIGHT, 3, 4),
        )
        .lane(LaneXml::ingress(3, 3).stop_line(150, -1000).connect(11, STRAIGHT, 5, 9))
        .lane(
            LaneXml::ingress(4, 4)
                .stop_line(-1000, -150)
                .connect(13, RIGHT, 1, 1)
                .connect(12, STRAIGHT, 1, 2),
        )
        .lane(LaneXml::egress(11, 1).node(150, 1000))
        .lane(LaneXml::egress(12, 2).node(1000, -150))
        .lane(LaneXml::egress(13, 3).node(-150, -1000))
        .lane(LaneXml::egress(14, 4).node(-1000, 150))
        .stream(1, 13, 4)
        .stream(2, left_turn_egress, 2)
        .stream(2, 14, 3)
        .stream(3, 11, 5)
        .stream(4, 13, 1)
}
