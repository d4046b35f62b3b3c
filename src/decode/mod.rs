use thiserror::Error;

use crate::model::{ConnectionId, LaneId, ModelError, SignalGroupId};

pub mod bits;
pub mod mapem;
pub mod stg;

pub use bits::BitString;
pub use mapem::*;
pub use stg::*;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("could not read input: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed XML: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("no IntersectionGeometry element found")]
    NoIntersection,
    #[error("<{element}> is missing required field <{field}>")]
    MissingField {
        element: &'static str,
        field: &'static str,
    },
    #[error("field <{field}> has invalid value '{value}'")]
    InvalidValue { field: &'static str, value: String },
    #[error("{context} references unknown lane {lane}")]
    UnknownLane { lane: LaneId, context: String },
    #[error("connection from lane {lane} to lane {target} has no connectionID, the input is corrupt")]
    MissingConnectionId { lane: LaneId, target: LaneId },
    #[error("lane {0} is declared more than once")]
    DuplicateLane(LaneId),
    #[error("connection id {0} is used more than once")]
    DuplicateConnection(ConnectionId),
    #[error("signal group {0} was never created")]
    UnknownSignalGroup(SignalGroupId),
    #[error(
        "ingress lanes {} take part in traffic streams but have no signal-controlled connection",
        format_lanes(.0)
    )]
    UnsignalledIngress(Vec<LaneId>),
}

fn format_lanes(lanes: &[LaneId]) -> String {
    lanes
        .iter()
        .map(|l| l.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<ModelError> for DecodeError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::UnknownLane(lane) => DecodeError::UnknownLane {
                lane,
                context: "the intersection model".to_string(),
            },
            ModelError::DuplicateLane(lane) => DecodeError::DuplicateLane(lane),
            ModelError::DuplicateConnection(id) => DecodeError::DuplicateConnection(id),
            ModelError::UnknownSignalGroup(id) => DecodeError::UnknownSignalGroup(id),
            ModelError::UnknownConnection(id) => DecodeError::InvalidValue {
                field: "connectionID",
                value: id.to_string(),
            },
        }
    }
}
