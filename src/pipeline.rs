use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;

use instant::Instant;
use log::{info, warn};
use serde::Serialize;
use thiserror::Error;

use crate::config::ValidatorConfig;
use crate::decode::{DecodeError, MapemDecoder, SignalGroupTable};
use crate::geometry::{Classification, GeometryClassifier, GeometryError};
use crate::model::{ConnectionId, Intersection, LaneId, SignalGroupId};
use crate::registry::{RegistryReport, SignalGroupRegistry};
use crate::report::{grouped_report, GroupedReport};
use crate::rules::{RuleEngine, ValidationError, ValidationResult, Verdict};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("could not open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not load intersection: {0}")]
    Decode(#[from] DecodeError),
    #[error("could not classify approaches: {0}")]
    Geometry(#[from] GeometryError),
    #[error("validation aborted: {0}")]
    Validation(#[from] ValidationError),
}

/// Something the run had to guess or skip. The results are still usable but less certain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Degradation {
    MissingSignalGroupTable,
    FallbackSignalGroupTypes { groups: Vec<SignalGroupId> },
    NoStopLines,
    UnclassifiedLanes { lanes: Vec<LaneId> },
    NotEvaluated { connections: Vec<ConnectionId> },
}

impl fmt::Display for Degradation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Degradation::MissingSignalGroupTable => {
                write!(f, "no signal group table, all types are inferred from ids")
            }
            Degradation::FallbackSignalGroupTypes { groups } => write!(
                f,
                "signal groups {:?} are not in the table, their types are inferred",
                groups.iter().map(|g| g.0).collect::<Vec<_>>()
            ),
            Degradation::NoStopLines => write!(f, "no stop lines, the center defaulted to (0, 0)"),
            Degradation::UnclassifiedLanes { lanes } => write!(
                f,
                "lanes {:?} have no direction",
                lanes.iter().map(|l| l.0).collect::<Vec<_>>()
            ),
            Degradation::NotEvaluated { connections } => write!(
                f,
                "connections {:?} could not be evaluated",
                connections.iter().map(|c| c.0).collect::<Vec<_>>()
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PhaseTimings {
    pub decode: Duration,
    pub classify: Duration,
    pub register: Duration,
    pub validate: Duration,
}

impl PhaseTimings {
    pub fn total(&self) -> Duration {
        self.decode + self.classify + self.register + self.validate
    }
}

/// Everything one run produced. The intersection is not touched again after validation.
#[derive(Debug, Clone)]
pub struct ValidationRun {
    pub intersection: Intersection,
    pub classification: Classification,
    pub registry: RegistryReport,
    pub results: Vec<ValidationResult>,
    pub degradations: Vec<Degradation>,
    pub timings: PhaseTimings,
}

impl ValidationRun {
    pub fn is_degraded(&self) -> bool {
        !self.degradations.is_empty()
    }

    pub fn result(&self, connection: ConnectionId) -> Option<&ValidationResult> {
        self.results.iter().find(|r| r.connection == connection)
    }

    pub fn grouped_report(&self) -> GroupedReport {
        grouped_report(&self.intersection, &self.results)
    }
}

/// decode → classify → register → validate
pub struct Pipeline {
    decoder: MapemDecoder,
    classifier: GeometryClassifier,
    registry: SignalGroupRegistry,
    engine: RuleEngine,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self {
            decoder: MapemDecoder::default(),
            classifier: GeometryClassifier::new(),
            registry: SignalGroupRegistry::default(),
            engine: RuleEngine::default(),
        }
    }
}

impl Pipeline {
    pub fn from_config(config: &ValidatorConfig) -> anyhow::Result<Self> {
        Ok(Self {
            decoder: MapemDecoder::new(config.decoder.options(&config.registry)),
            classifier: GeometryClassifier::new(),
            registry: SignalGroupRegistry::new(config.registry.clone()),
            engine: config.rules.engine()?,
        })
    }

    pub fn run<M: Read, S: Read>(&self, mapem: M, stg: Option<S>) -> Result<ValidationRun, PipelineError> {
        let table = stg.map(SignalGroupTable::parse).transpose()?;
        self.run_with_table(mapem, table.as_ref())
    }

    pub fn run_files(&self, mapem: &Path, stg: Option<&Path>) -> Result<ValidationRun, PipelineError> {
        let mapem = open(mapem)?;
        let stg = stg.map(open).transpose()?;
        self.run(mapem, stg)
    }

    /// Runs against an already parsed table, which may be shared between runs.
    pub fn run_with_table<M: Read>(
        &self,
        mapem: M,
        table: Option<&SignalGroupTable>,
    ) -> Result<ValidationRun, PipelineError> {
        let mut timings = PhaseTimings::default();

        let start = Instant::now();
        let mut intersection = self.decoder.decode(mapem)?;
        timings.decode = start.elapsed();

        let start = Instant::now();
        let classification = self.classifier.classify(&mut intersection)?;
        timings.classify = start.elapsed();

        let start = Instant::now();
        let registry = self.registry.apply(&mut intersection, table);
        timings.register = start.elapsed();

        let start = Instant::now();
        let results = self.engine.validate(&intersection)?;
        timings.validate = start.elapsed();

        let degradations = collect_degradations(&classification, &registry, &results);
        for degradation in &degradations {
            warn!("Degraded result: {}", degradation);
        }
        info!(
            "Validated {} in {:.2}ms ({} results)",
            intersection,
            ms(timings.total()),
            results.len()
        );

        Ok(ValidationRun {
            intersection,
            classification,
            registry,
            results,
            degradations,
            timings,
        })
    }

    /// Decodes, classifies and merges the table without running any rules.
    pub fn load<M: Read>(
        &self,
        mapem: M,
        table: Option<&SignalGroupTable>,
    ) -> Result<(Intersection, Vec<Degradation>), PipelineError> {
        let mut intersection = self.decoder.decode(mapem)?;
        let classification = self.classifier.classify(&mut intersection)?;
        let registry = self.registry.apply(&mut intersection, table);
        let degradations = collect_degradations(&classification, &registry, &[]);
        Ok((intersection, degradations))
    }
}

fn collect_degradations(
    classification: &Classification,
    registry: &RegistryReport,
    results: &[ValidationResult],
) -> Vec<Degradation> {
    let mut degradations = Vec::new();
    if !registry.table_present {
        degradations.push(Degradation::MissingSignalGroupTable);
    } else if !registry.fallback.is_empty() {
        degradations.push(Degradation::FallbackSignalGroupTypes {
            groups: registry.fallback.clone(),
        });
    }
    if classification.center_degraded {
        degradations.push(Degradation::NoStopLines);
    }
    if !classification.unclassified.is_empty() {
        degradations.push(Degradation::UnclassifiedLanes {
            lanes: classification.unclassified.clone(),
        });
    }
    let not_evaluated: Vec<ConnectionId> = results
        .iter()
        .filter(|r| r.verdict == Verdict::NotEvaluable)
        .map(|r| r.connection)
        .collect();
    if !not_evaluated.is_empty() {
        degradations.push(Degradation::NotEvaluated {
            connections: not_evaluated,
        });
    }
    degradations
}

fn open(path: &Path) -> Result<File, PipelineError> {
    File::open(path).map_err(|source| PipelineError::Open {
        path: path.to_path_buf(),
        source,
    })
}

fn ms(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}
