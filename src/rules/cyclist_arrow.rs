//! Clauses of VwV-StVO zu §37 XI.1 for the green cyclist right-turn arrow.
//!
//! Each clause sees the right-turn connection and the left turns from the opposing approach
//! that end on the same egress lane, ascending by connection id. A clause reports only the first
//! conflict it finds.

use log::debug;

use super::{Clause, ClauseOutcome, ValidationError};
use crate::model::{Connection, Direction, Intersection, SignalGroup};

pub const CONFLICT_FREE_LEFT_TURN: &str = "§37 XI.1.a";
pub const DIAGONAL_GREEN_ARROW: &str = "§37 XI.1.b";
pub const DIRECTIONAL_ARROWS: &str = "§37 XI.1.c";

pub const CLAUSES: [Clause; 3] = [
    Clause {
        name: CONFLICT_FREE_LEFT_TURN,
        check: conflict_free_left_turn,
    },
    Clause {
        name: DIAGONAL_GREEN_ARROW,
        check: diagonal_green_arrow,
    },
    Clause {
        name: DIRECTIONAL_ARROWS,
        check: directional_arrows,
    },
];

/// Left turns from the approach opposite `direction` converging with `right_turn`.
pub fn opposing_left_turns<'a>(
    intersection: &'a Intersection,
    right_turn: &Connection,
    direction: Direction,
) -> Vec<&'a Connection> {
    let mut left_turns: Vec<&Connection> = intersection
        .ingress_lanes_from(direction.opposite())
        .into_iter()
        .flat_map(|lane| intersection.left_turns_from(lane))
        .filter(|left| left.id != right_turn.id && left.shares_egress_with(right_turn))
        .collect();
    left_turns.sort_by_key(|c| c.id);
    left_turns.dedup_by_key(|c| c.id);
    left_turns
}

/// First (left turn, signal group) pair whose group satisfies `pred`.
fn first_conflict<'a>(
    intersection: &'a Intersection,
    left_turns: &[&'a Connection],
    pred: impl Fn(&SignalGroup) -> bool,
) -> Result<Option<(&'a Connection, &'a SignalGroup)>, ValidationError> {
    for left in left_turns {
        for id in left.signal_groups() {
            let group = intersection
                .signal_group(*id)
                .ok_or(ValidationError::MissingSignalGroup {
                    connection: left.id,
                    group: *id,
                })?;
            if pred(group) {
                return Ok(Some((*left, group)));
            }
        }
    }
    Ok(None)
}

fn conflict_free_left_turn(
    intersection: &Intersection,
    right_turn: &Connection,
    direction: Direction,
) -> Result<ClauseOutcome, ValidationError> {
    let left_turns = opposing_left_turns(intersection, right_turn, direction);
    let conflict = first_conflict(intersection, &left_turns, |g| {
        g.provides_conflict_free_left_turn(intersection)
    })?;
    Ok(match conflict {
        Some((left, group)) => {
            debug!("Connection {} conflicts with left turn {}", right_turn.id, left.id);
            ClauseOutcome::Fail(format!(
                "{} — conflict-free left turn from opposing approach {}: signal group {} (id {}) controls connection {}",
                CONFLICT_FREE_LEFT_TURN,
                direction.opposite(),
                group.name,
                group.id,
                left.id
            ))
        }
        None => ClauseOutcome::Pass,
    })
}

fn diagonal_green_arrow(
    intersection: &Intersection,
    right_turn: &Connection,
    direction: Direction,
) -> Result<ClauseOutcome, ValidationError> {
    let left_turns = opposing_left_turns(intersection, right_turn, direction);
    let conflict = first_conflict(intersection, &left_turns, SignalGroup::is_diagonal_left_turn)?;
    Ok(match conflict {
        Some((left, group)) => ClauseOutcome::Fail(format!(
            "{} — diagonal green arrow for opposing left turn from {}: DN signal group {} (id {}) controls connection {}",
            DIAGONAL_GREEN_ARROW,
            direction.opposite(),
            group.name,
            group.id,
            left.id
        )),
        None => ClauseOutcome::Pass,
    })
}

// Arrow shapes in the right-turn signal head are not part of MAP data.
fn directional_arrows(
    _intersection: &Intersection,
    _right_turn: &Connection,
    _direction: Direction,
) -> Result<ClauseOutcome, ValidationError> {
    Ok(ClauseOutcome::NotEvaluable(
        "directional arrows in the right-turn signal head are not recorded in the topology".to_string(),
    ))
}
