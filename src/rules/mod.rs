use log::{info, warn};
use thiserror::Error;

use crate::model::{Connection, ConnectionId, Direction, Intersection, ModelError, SignalGroupId};

pub mod cyclist_arrow;
pub mod result;

pub use result::*;

/// Ruleset names understood by [`RuleEngine::for_ruleset`].
pub const RULESETS: [&str; 1] = ["cyclist-arrow"];

/// A graph invariant the decoder should have guaranteed does not hold.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("connection {connection} is broken: {source}")]
    BrokenConnection {
        connection: ConnectionId,
        #[source]
        source: ModelError,
    },
    #[error("connection {connection} is linked to signal group {group}, which does not exist")]
    MissingSignalGroup {
        connection: ConnectionId,
        group: SignalGroupId,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClauseOutcome {
    Pass,
    Fail(String),
    NotEvaluable(String),
}

pub type ClauseFn =
    fn(&Intersection, &Connection, Direction) -> Result<ClauseOutcome, ValidationError>;

/// A named check run against one right-turn connection whose approach direction is known.
#[derive(Clone, Copy)]
pub struct Clause {
    pub name: &'static str,
    pub check: ClauseFn,
}

/// Runs an ordered list of clauses over every cyclist right turn of an intersection.
pub struct RuleEngine {
    clauses: Vec<Clause>,
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new(cyclist_arrow::CLAUSES.to_vec())
    }
}

impl RuleEngine {
    pub fn new(clauses: Vec<Clause>) -> Self {
        Self { clauses }
    }

    pub fn for_ruleset(name: &str) -> Option<Self> {
        match name {
            "cyclist-arrow" => Some(Self::default()),
            _ => None,
        }
    }

    pub fn clause_names(&self) -> Vec<&'static str> {
        self.clauses.iter().map(|c| c.name).collect()
    }

    /// One result per cyclist right-turn connection, ascending by connection id.
    pub fn validate(&self, intersection: &Intersection) -> Result<Vec<ValidationResult>, ValidationError> {
        let candidates = intersection.cyclist_right_turn_connections();
        info!("Validating {} cyclist right turns", candidates.len());

        let results = candidates
            .into_iter()
            .map(|connection| self.validate_connection(intersection, connection))
            .collect::<Result<Vec<_>, _>>()?;

        let invalid = results.iter().filter(|r| r.verdict == Verdict::Invalid).count();
        let not_evaluable = results.iter().filter(|r| r.verdict == Verdict::NotEvaluable).count();
        info!(
            "{} valid, {} invalid, {} not evaluable",
            results.len() - invalid - not_evaluable,
            invalid,
            not_evaluable
        );
        Ok(results)
    }

    pub fn validate_connection(
        &self,
        intersection: &Intersection,
        connection: &Connection,
    ) -> Result<ValidationResult, ValidationError> {
        let (ingress, _) =
            intersection
                .endpoints(connection)
                .map_err(|source| ValidationError::BrokenConnection {
                    connection: connection.id,
                    source,
                })?;
        let mut result = ValidationResult::new(connection.id);

        let direction = match ingress.direction {
            Some(direction) => direction,
            None => {
                warn!(
                    "Connection {} starts on lane {} with unknown direction, skipping",
                    connection.id, ingress.id
                );
                result.mark_not_evaluable();
                for clause in &self.clauses {
                    result.record(
                        clause.name,
                        RuleStatus::NotEvaluable,
                        Some(format!("direction of lane {} is unknown", ingress.id)),
                    );
                }
                return Ok(result);
            }
        };

        for clause in &self.clauses {
            match (clause.check)(intersection, connection, direction)? {
                ClauseOutcome::Pass => result.record(clause.name, RuleStatus::Passed, None),
                ClauseOutcome::Fail(reason) => result.record(clause.name, RuleStatus::Failed, Some(reason)),
                ClauseOutcome::NotEvaluable(note) => {
                    warn!("{} not evaluable for connection {}: {}", clause.name, connection.id, note);
                    result.record(clause.name, RuleStatus::NotEvaluable, Some(note));
                }
            }
        }

        if result.valid {
            info!("Connection {} is valid for the green cyclist arrow", connection.id);
        } else {
            info!("Connection {} is invalid: {:?}", connection.id, result.reasons);
        }
        Ok(result)
    }
}
