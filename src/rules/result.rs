use serde::Serialize;
use std::fmt;

use crate::model::ConnectionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RuleStatus {
    Passed,
    Failed,
    /// The data needed to decide the clause is not in the topology.
    NotEvaluable,
}

impl fmt::Display for RuleStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RuleStatus::Passed => write!(f, "passed"),
            RuleStatus::Failed => write!(f, "failed"),
            RuleStatus::NotEvaluable => write!(f, "not evaluable"),
        }
    }
}

/// One entry of the audit trail: which clause ran and how it ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleExecution {
    pub rule: String,
    pub status: RuleStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Verdict {
    Valid,
    Invalid,
    NotEvaluable,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Verdict::Valid => write!(f, "VALID"),
            Verdict::Invalid => write!(f, "INVALID"),
            Verdict::NotEvaluable => write!(f, "NOT EVALUABLE"),
        }
    }
}

/// Outcome for one cyclist right-turn connection.
///
/// `valid` only says that no clause produced a failure reason. A result whose approach direction
/// is unknown is also `valid` in that sense, so check [`verdict`](Self::verdict) (or
/// `evaluable`) before treating it as a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub connection: ConnectionId,
    pub valid: bool,
    pub evaluable: bool,
    pub verdict: Verdict,
    pub reasons: Vec<String>,
    pub executed_rules: Vec<RuleExecution>,
}

impl ValidationResult {
    pub fn new(connection: ConnectionId) -> Self {
        Self {
            connection,
            valid: true,
            evaluable: true,
            verdict: Verdict::Valid,
            reasons: Vec::new(),
            executed_rules: Vec::new(),
        }
    }

    pub fn record(&mut self, rule: &str, status: RuleStatus, note: Option<String>) {
        if let (RuleStatus::Failed, Some(reason)) = (status, &note) {
            self.reasons.push(reason.clone());
        }
        self.executed_rules.push(RuleExecution {
            rule: rule.to_string(),
            status,
            note,
        });
        self.refresh();
    }

    pub fn mark_not_evaluable(&mut self) {
        self.evaluable = false;
        self.refresh();
    }

    fn refresh(&mut self) {
        self.valid = self.reasons.is_empty();
        self.verdict = if !self.valid {
            Verdict::Invalid
        } else if !self.evaluable {
            Verdict::NotEvaluable
        } else {
            Verdict::Valid
        };
    }

    pub fn executed_rule_names(&self) -> Vec<&str> {
        self.executed_rules.iter().map(|r| r.rule.as_str()).collect()
    }

    pub fn rules_with_status(&self, status: RuleStatus) -> impl Iterator<Item = &RuleExecution> {
        self.executed_rules.iter().filter(move |r| r.status == status)
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Connection {}: {}", self.connection, self.verdict)?;
        for reason in &self.reasons {
            write!(f, "\n  - {}", reason)?;
        }
        Ok(())
    }
}
