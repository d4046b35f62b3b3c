use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};

use traffic_validator::{
    decode::SignalGroupTable,
    report::{
        signal_group_summaries, DirectionSummary, GroupedReport, IntersectionSummary,
        ResultsText, SignalGroupSummary, SummaryText,
    },
    Degradation, Pipeline, ValidatorConfig,
};

#[derive(Parser)]
#[command(name = "traffic-validator")]
#[command(about = "Checks where a green cyclist right-turn arrow (VwV-StVO zu §37 XI) may be installed")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose logging for per-lane and per-connection decoding
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Validate every cyclist right turn of an intersection
    Validate(Inputs),
    /// Describe lanes, directions and signal groups without running rules
    Summary(Inputs),
}

#[derive(clap::Args)]
struct Inputs {
    /// MAPEM topology (XML)
    #[arg(short, long)]
    mapem: PathBuf,

    /// Signal group table (STG); types are inferred from ids without it
    #[arg(short, long)]
    stg: Option<PathBuf>,

    /// Validator configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct ValidateOutput<'a> {
    intersection: IntersectionSummary,
    ruleset: &'a str,
    degradations: &'a [Degradation],
    results: GroupedReport,
}

#[derive(Serialize)]
struct SummaryOutput<'a> {
    summary: IntersectionSummary,
    directions: DirectionSummary,
    signal_groups: Vec<SignalGroupSummary>,
    degradations: &'a [Degradation],
}

fn load_config(path: Option<&Path>) -> Result<ValidatorConfig> {
    match path {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            ValidatorConfig::load_from_file(path)
        }
        None => Ok(ValidatorConfig::default()),
    }
}

fn validate(inputs: &Inputs) -> Result<()> {
    let config = load_config(inputs.config.as_deref())?;
    let pipeline = Pipeline::from_config(&config)?;
    let run = pipeline
        .run_files(&inputs.mapem, inputs.stg.as_deref())
        .with_context(|| format!("validating {}", inputs.mapem.display()))?;

    if inputs.json {
        let output = ValidateOutput {
            intersection: IntersectionSummary::from(&run.intersection),
            ruleset: &config.rules.ruleset,
            degradations: &run.degradations,
            results: run.grouped_report(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print!(
            "{}",
            ResultsText {
                intersection: &run.intersection,
                results: &run.results,
            }
        );
        for degradation in &run.degradations {
            println!("warning: {}", degradation);
        }
    }
    Ok(())
}

fn summary(inputs: &Inputs) -> Result<()> {
    let config = load_config(inputs.config.as_deref())?;
    let pipeline = Pipeline::from_config(&config)?;
    let table = match &inputs.stg {
        Some(path) => {
            let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
            Some(SignalGroupTable::parse(file)?)
        }
        None => None,
    };
    let mapem = File::open(&inputs.mapem).with_context(|| format!("opening {}", inputs.mapem.display()))?;
    let (intersection, degradations) = pipeline.load(mapem, table.as_ref())?;

    if inputs.json {
        let output = SummaryOutput {
            summary: IntersectionSummary::from(&intersection),
            directions: DirectionSummary::from(&intersection),
            signal_groups: signal_group_summaries(&intersection),
            degradations: &degradations,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print!("{}", SummaryText(&intersection));
        for degradation in &degradations {
            println!("warning: {}", degradation);
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_default_env()
        .filter_level(if args.verbose { log::LevelFilter::Debug } else { log::LevelFilter::Info })
        .init();

    match &args.command {
        Command::Validate(inputs) => validate(inputs),
        Command::Summary(inputs) => summary(inputs),
    }
}
