use serde::Serialize;

use super::{ConnectionId, LaneId, SignalGroupId};

/// Raw traffic-stream record linking a lane pair to a physical signal group. Kept after
/// decoding for diagnostics only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrafficStream {
    pub ref_lane: LaneId,
    pub connect_to: LaneId,
    pub intersection_part: Option<u32>,
    pub physical_signal_group: Option<SignalGroupId>,
    pub primary: bool,
    /// Connection the stream addressed directly, when one was found.
    pub connection: Option<ConnectionId>,
}

impl TrafficStream {
    pub fn new(ref_lane: LaneId, connect_to: LaneId) -> Self {
        Self {
            ref_lane,
            connect_to,
            intersection_part: None,
            physical_signal_group: None,
            primary: false,
            connection: None,
        }
    }
}
