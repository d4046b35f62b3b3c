use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::registry::TypeHeuristic;

pub mod decoder;
pub mod rules;

pub use decoder::*;
pub use rules::*;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ValidatorConfig {
    pub decoder: DecoderConfig,
    pub registry: TypeHeuristic,
    pub rules: RulesConfig,
}

impl ValidatorConfig {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("loading config {}", path.display()))?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: ValidatorConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }
}

impl Validate for ValidatorConfig {
    fn validate(&self) -> Result<()> {
        self.decoder.validate()?;
        self.registry.validate()?;
        self.rules.validate()?;
        Ok(())
    }
}

pub trait Validate {
    fn validate(&self) -> Result<()>;
}
