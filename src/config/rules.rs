use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use super::Validate;
use crate::rules::{RuleEngine, RULESETS};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RulesConfig {
    pub ruleset: String,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            ruleset: "cyclist-arrow".to_string(),
        }
    }
}

impl RulesConfig {
    pub fn engine(&self) -> Result<RuleEngine> {
        RuleEngine::for_ruleset(&self.ruleset).ok_or_else(|| anyhow!("Unknown ruleset '{}'", self.ruleset))
    }
}

impl Validate for RulesConfig {
    fn validate(&self) -> Result<()> {
        if !RULESETS.contains(&self.ruleset.as_str()) {
            return Err(anyhow!(
                "Unknown ruleset '{}', expected one of: {}",
                self.ruleset,
                RULESETS.join(", ")
            ));
        }
        Ok(())
    }
}
