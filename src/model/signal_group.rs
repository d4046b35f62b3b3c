use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use super::{Connection, ConnectionId, Intersection, SignalGroupId};

/// Signal group types as used in German signal plans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SignalGroupType {
    /// Fahrverkehr, individual vehicle traffic
    FV,
    /// Diagonalgrünpfeil for left turners
    DN,
    /// Radverkehr
    RD,
    /// Fußgänger
    FG,
    /// Rechtsabbiegepfeil
    RA,
}

impl SignalGroupType {
    pub fn code(self) -> &'static str {
        match self {
            SignalGroupType::FV => "FV",
            SignalGroupType::DN => "DN",
            SignalGroupType::RD => "RD",
            SignalGroupType::FG => "FG",
            SignalGroupType::RA => "RA",
        }
    }
}

impl fmt::Display for SignalGroupType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for SignalGroupType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "FV" => Ok(SignalGroupType::FV),
            "DN" => Ok(SignalGroupType::DN),
            "RD" => Ok(SignalGroupType::RD),
            "FG" => Ok(SignalGroupType::FG),
            "RA" => Ok(SignalGroupType::RA),
            other => Err(format!("unknown signal group type '{}'", other)),
        }
    }
}

/// A physical signal group. Controlled connections are registered through
/// `Intersection::link_signal_group`, which keeps both sides in sync.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalGroup {
    pub id: SignalGroupId,
    pub name: String,
    pub group_type: SignalGroupType,
    pub(crate) controlled: BTreeSet<ConnectionId>,
}

impl SignalGroup {
    pub fn new(id: SignalGroupId, name: impl Into<String>, group_type: SignalGroupType) -> Self {
        Self {
            id,
            name: name.into(),
            group_type,
            controlled: BTreeSet::new(),
        }
    }

    pub fn controlled_connections(&self) -> &BTreeSet<ConnectionId> {
        &self.controlled
    }

    pub fn is_diagonal_left_turn(&self) -> bool {
        self.group_type == SignalGroupType::DN
    }

    pub fn is_bicycle_signal(&self) -> bool {
        self.group_type == SignalGroupType::RD
    }

    pub fn is_right_turn_arrow(&self) -> bool {
        self.group_type == SignalGroupType::RA
    }

    fn controls_only(&self, intersection: &Intersection, pred: impl Fn(&Connection) -> bool) -> bool {
        !self.controlled.is_empty()
            && self
                .controlled
                .iter()
                .all(|id| intersection.connection(*id).map_or(false, |c| pred(c)))
    }

    pub fn controls_only_left_turns(&self, intersection: &Intersection) -> bool {
        self.controls_only(intersection, Connection::is_left_turn)
    }

    pub fn controls_only_right_turns(&self, intersection: &Intersection) -> bool {
        self.controls_only(intersection, Connection::is_right_turn)
    }

    pub fn provides_conflict_free_left_turn(&self, intersection: &Intersection) -> bool {
        self.is_diagonal_left_turn() || self.controls_only_left_turns(intersection)
    }

    pub fn has_directional_arrows(&self, intersection: &Intersection) -> bool {
        self.is_diagonal_left_turn()
            || self.is_right_turn_arrow()
            || self.controls_only_left_turns(intersection)
    }
}

impl fmt::Display for SignalGroup {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "SignalGroup{{id={}, name='{}', type={}, connections={}}}",
            self.id,
            self.name,
            self.group_type,
            self.controlled.len()
        )
    }
}
