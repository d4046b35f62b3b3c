use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use super::Validate;
use crate::decode::DecodeOptions;
use crate::registry::TypeHeuristic;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Keeps crosswalk connection ids apart from vehicle connection ids.
    pub crosswalk_connection_offset: u32,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            crosswalk_connection_offset: 1000,
        }
    }
}

impl DecoderConfig {
    pub fn options(&self, heuristic: &TypeHeuristic) -> DecodeOptions {
        DecodeOptions {
            crosswalk_connection_offset: self.crosswalk_connection_offset,
            heuristic: heuristic.clone(),
        }
    }
}

impl Validate for DecoderConfig {
    fn validate(&self) -> Result<()> {
        if self.crosswalk_connection_offset == 0 {
            return Err(anyhow!("crosswalk_connection_offset must be positive"));
        }
        Ok(())
    }
}
