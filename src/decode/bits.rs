//! Fixed-width ASN.1 BIT STRING values as they appear in XER encoded MAP messages.
//!
//! Bits are numbered from 0 at the leftmost character, so `"0001000100"` has bits 3 and 7 set.

use crate::model::{LaneKind, LanePermissions, ManeuverFlags};

/// Bit positions of the `LaneSharing` (`sharedWith`) field.
pub mod shared_with {
    pub const MOTORIZED: usize = 3;
    pub const PUBLIC_TRANSPORT: usize = 4;
    pub const PEDESTRIAN: usize = 6;
    pub const CYCLIST: usize = 7;
}

/// Bit positions of the `AllowedManeuvers` field.
pub mod maneuver {
    pub const STRAIGHT: usize = 0;
    pub const LEFT: usize = 1;
    pub const RIGHT: usize = 2;
    pub const U_TURN: usize = 3;
    pub const LEFT_ON_RED: usize = 4;
    pub const RIGHT_ON_RED: usize = 5;
    pub const LANE_CHANGE: usize = 6;
    pub const NO_STOPPING: usize = 7;
    pub const YIELD_ALWAYS: usize = 8;
    pub const GO_WITH_HALT: usize = 9;
    pub const CAUTION: usize = 10;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BitString {
    bits: u64,
    len: usize,
}

impl BitString {
    pub const MAX_LEN: usize = 64;

    /// Parses a string of '0'/'1' characters. Whitespace and '_' separators are ignored. Returns
    /// `None` for any other character or more than 64 bits.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut result = BitString::default();
        for ch in raw.chars().filter(|c| !c.is_whitespace() && *c != '_') {
            if result.len == Self::MAX_LEN {
                return None;
            }
            let bit: u64 = match ch {
                '0' => 0,
                '1' => 1,
                _ => return None,
            };
            result.bits |= bit << (Self::MAX_LEN - 1 - result.len);
            result.len += 1;
        }
        Some(result)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bit `index` counted from the left. Positions past the end read as unset.
    pub fn get(&self, index: usize) -> bool {
        index < self.len && self.bits & (1u64 << (Self::MAX_LEN - 1 - index)) != 0
    }
}

impl From<BitString> for LanePermissions {
    fn from(bits: BitString) -> Self {
        LanePermissions {
            motorized: bits.get(shared_with::MOTORIZED),
            public_transport: bits.get(shared_with::PUBLIC_TRANSPORT),
            pedestrian: bits.get(shared_with::PEDESTRIAN),
            cyclist: bits.get(shared_with::CYCLIST),
        }
    }
}

impl From<BitString> for ManeuverFlags {
    fn from(bits: BitString) -> Self {
        ManeuverFlags {
            straight: bits.get(maneuver::STRAIGHT),
            left: bits.get(maneuver::LEFT),
            right: bits.get(maneuver::RIGHT),
            u_turn: bits.get(maneuver::U_TURN),
            left_on_red: bits.get(maneuver::LEFT_ON_RED),
            right_on_red: bits.get(maneuver::RIGHT_ON_RED),
            lane_change: bits.get(maneuver::LANE_CHANGE),
            no_stopping: bits.get(maneuver::NO_STOPPING),
            yield_always: bits.get(maneuver::YIELD_ALWAYS),
            go_with_halt: bits.get(maneuver::GO_WITH_HALT),
            caution: bits.get(maneuver::CAUTION),
        }
    }
}

impl LanePermissions {
    /// Lane types imply permissions the `sharedWith` bits may leave out.
    pub fn with_lane_kind(mut self, kind: LaneKind) -> Self {
        if kind.bike {
            self.cyclist = true;
        }
        if kind.crosswalk {
            self.pedestrian = true;
        }
        self
    }
}
