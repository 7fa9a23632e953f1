use anyhow::Context;
use clap::{Parser, Subcommand};
use log::info;
use std::path::{Path, PathBuf};

mod baseline;
mod config;
mod detection;
mod error;
mod input;
mod output;
mod synthetic;

use crate::baseline::{BaselineFailure, PatientBaseline};
use crate::baseline::formulas::{self, Sex};
use crate::config::Config;
use crate::detection::AkiDetector;
use crate::output::LevelFormat;
use crate::synthetic::{CohortGenerator, SyntheticConfig};

#[derive(Parser)]
#[command(name = "aki_detection")]
#[command(about = "Creatinine baseline estimation and RIFLE-based AKI detection")]
struct Cli {
    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Estimate a statistical creatinine baseline per patient
    Baseline {
        /// Measurements CSV (PatientID, Cr_Value, Date)
        #[arg(short, long)]
        input: PathBuf,

        /// Output CSV path
        #[arg(short, long)]
        output: PathBuf,

        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Grade every reading and write events, baselines and a report
    Detect {
        /// Measurements CSV (PatientID, Cr_Value, Date)
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,

        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Precomputed baselines CSV (PatientID, Create_Baseline)
        #[arg(short, long)]
        baselines: Option<PathBuf>,

        /// Write RIFLE labels instead of numeric levels
        #[arg(long)]
        rifle_labels: bool,
    },

    /// Write a synthetic measurements CSV
    Generate {
        /// Output CSV path
        #[arg(short, long)]
        output: PathBuf,

        /// Number of patients to generate
        #[arg(short, long, default_value = "20")]
        patients: usize,

        /// Readings per patient
        #[arg(short, long, default_value = "40")]
        readings: usize,

        /// Random seed for reproducibility
        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// Print demographic reference baselines
    Reference {
        /// Age in years
        #[arg(short, long)]
        age: f64,

        /// m, male, f or female
        #[arg(short, long)]
        sex: String,

        /// Patient is black
        #[arg(long)]
        black: bool,

        /// Creatinine (mg/dl) for the CKD-EPI eGFR
        #[arg(long)]
        creatinine: Option<f64>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose { log::LevelFilter::Debug } else { log::LevelFilter::Info };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    match cli.command {
        Command::Baseline { input, output, config } => {
            let config = load_config(config.as_deref())?;
            let timelines = load_timelines(&input)?;

            let baselines = baseline::estimate_all(&timelines, &config.baseline);
            output::save_baselines(&baselines, &output)
                .with_context(|| format!("writing baselines to {:?}", output))?;
            info!("Baselines saved to {:?}", output);
        },
        Command::Detect { input, output, config, baselines, rifle_labels } => {
            let config = load_config(config.as_deref())?;
            let timelines = load_timelines(&input)?;

            let baselines = match baselines {
                Some(path) => load_external_baselines(&path)?,
                None => baseline::estimate_all(&timelines, &config.baseline),
            };

            let run = AkiDetector::new(&config).detect_all(&timelines, &baselines);

            std::fs::create_dir_all(&output)?;
            let format = if rifle_labels { LevelFormat::Rifle } else { LevelFormat::Numeric };
            output::save_results(&baselines, &run, &output, format)
                .with_context(|| format!("writing results to {:?}", output))?;
        },
        Command::Generate { output, patients, readings, seed } => {
            let synthetic = SyntheticConfig {
                patients,
                readings_per_patient: readings,
                ..SyntheticConfig::default()
            };

            let measurements = CohortGenerator::new(synthetic, seed).generate()?;
            output::save_measurements(&measurements, &output)
                .with_context(|| format!("writing measurements to {:?}", output))?;
            info!("{} synthetic measurements saved to {:?}", measurements.len(), output);
        },
        Command::Reference { age, sex, black, creatinine } => {
            let sex = Sex::parse(&sex)?;

            println!("gender_fixed\t{:.3}", formulas::gender_fixed_baseline(sex));
            println!("revised\t{:.3}", formulas::revised_baseline(age, sex, black));
            println!("mdrd\t{:.3}", formulas::mdrd_baseline(age, sex, black)?);
            if let Some(cr_value) = creatinine {
                println!("ckd_epi_gfr\t{:.1}", formulas::ckd_epi_gfr(age, sex, black, cr_value)?);
            }
        },
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => {
            let config = Config::from_file(path)
                .with_context(|| format!("loading configuration from {:?}", path))?;
            info!("Loaded configuration from {:?}", path);
            Ok(config)
        },
        None => Ok(Config::default()),
    }
}

fn load_timelines(path: &Path) -> anyhow::Result<Vec<input::PatientTimeline>> {
    let measurements = input::load_measurements(path)
        .with_context(|| format!("reading measurements from {:?}", path))?;
    let timelines = input::group_timelines(measurements);
    info!("Loaded {} patient timelines from {:?}", timelines.len(), path);
    Ok(timelines)
}

fn load_external_baselines(path: &Path) -> anyhow::Result<Vec<PatientBaseline>> {
    let rows = input::load_baselines(path)
        .with_context(|| format!("reading baselines from {:?}", path))?;
    info!("Loaded {} precomputed baselines from {:?}", rows.len(), path);

    Ok(rows.into_iter()
        .map(|(patient_id, value)| PatientBaseline {
            patient_id,
            outcome: value.ok_or(BaselineFailure::NotProvided),
        })
        .collect())
}
