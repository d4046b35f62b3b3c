use serde::Serialize;
use std::fmt;
use thiserror::Error;

pub mod direction;
pub mod lane;
pub mod connection;
pub mod signal_group;
pub mod traffic_stream;
pub mod intersection;

pub use direction::*;
pub use lane::*;
pub use connection::*;
pub use signal_group::*;
pub use traffic_stream::*;
pub use intersection::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct LaneId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ConnectionId(pub u32);

/// Physical signal group id ("vt" in the traffic stream records).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SignalGroupId(pub u32);

impl fmt::Display for LaneId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for SignalGroupId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("lane {0} is not part of the intersection")]
    UnknownLane(LaneId),
    #[error("connection {0} is not part of the intersection")]
    UnknownConnection(ConnectionId),
    #[error("signal group {0} is not part of the intersection")]
    UnknownSignalGroup(SignalGroupId),
    #[error("lane {0} is declared more than once")]
    DuplicateLane(LaneId),
    #[error("connection id {0} is used more than once")]
    DuplicateConnection(ConnectionId),
}
