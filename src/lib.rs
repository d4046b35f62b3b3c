pub mod config;
pub mod model;
pub mod decode;
pub mod geometry;
pub mod registry;
pub mod rules;
pub mod report;
pub mod pipeline;

pub use model::*;
pub use pipeline::*;
pub use config::{Validate, ValidatorConfig};
