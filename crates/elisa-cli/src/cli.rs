//! CLI argument definitions for the plate QC engine.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "elisa-qc",
    version,
    about = "ELISA plate QC - classify plate reader exports into reportable results",
    long_about = "Classify ELISA plate reader CSV exports into per-sample reportable\n\
                  results, curve and control pass/fail status and plate-level outcome\n\
                  codes, using batch calibration, QC-limit and sample-assignment tables."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Evaluate one or more plate exports against the batch tables.
    Evaluate(EvaluateArgs),

    /// Print the loaded reference tables.
    Tables(TablesArgs),
}

#[derive(Parser)]
pub struct EvaluateArgs {
    /// Plate reader CSV export files.
    #[arg(value_name = "PLATE_CSV", required = true)]
    pub plates: Vec<PathBuf>,

    /// Sample assignment sheet for the batch.
    #[arg(long = "samples", value_name = "PATH")]
    pub samples: PathBuf,

    /// Calibration table with per-serotype top-standard concentrations.
    #[arg(long = "calibration", value_name = "PATH")]
    pub calibration: PathBuf,

    /// QC acceptance limits table.
    #[arg(long = "qc-limits", value_name = "PATH")]
    pub qc_limits: PathBuf,

    /// Exclude sample wells with OD above this value.
    #[arg(long = "od-upper", value_name = "OD")]
    pub od_upper: Option<f64>,

    /// Exclude sample wells with OD below this value.
    #[arg(long = "od-lower", value_name = "OD")]
    pub od_lower: Option<f64>,

    /// Report values below the limit of quantification as-is instead of
    /// censoring them to the "<0.15" marker.
    #[arg(long = "no-lloq")]
    pub no_lloq: bool,

    /// Emit full evaluation results as JSON instead of a summary table.
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Parser)]
pub struct TablesArgs {
    /// Calibration table with per-serotype top-standard concentrations.
    #[arg(long = "calibration", value_name = "PATH")]
    pub calibration: PathBuf,

    /// QC acceptance limits table.
    #[arg(long = "qc-limits", value_name = "PATH")]
    pub qc_limits: PathBuf,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
