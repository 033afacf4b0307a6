//! Command-line parsing for the epidemic growth-curve fitter.
//!
//! The goal of this module is to keep **argument parsing** and **command
//! dispatch** separate from the modeling/math code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::{DEFAULT_BINS, DEFAULT_FIT_DAYS};
use crate::io::dates::DEFAULT_ANCHOR;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "epifit", version, about = "Epidemic case-count growth-curve fitter")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit growth models to count files, print diagnostics/forecasts, and
    /// optionally plot/export.
    Fit(FitArgs),
    /// Print the forecast table only (useful for scripting).
    Forecast(FitArgs),
    /// Plot a previously exported fit JSON.
    Plot(PlotArgs),
    /// Generate a synthetic count file in the input format.
    Sample(SampleArgs),
}

/// Common options for fitting and forecasting.
#[derive(Debug, Parser, Clone)]
pub struct FitArgs {
    /// Input files ("day count" per line). Several files fit in parallel.
    #[arg(value_name = "FILE", required = true)]
    pub inputs: Vec<PathBuf>,

    /// Display label (e.g. a country name). Defaults to the file stem;
    /// only meaningful with a single input.
    #[arg(short, long)]
    pub label: Option<String>,

    /// Reference anchor "<index>:<YY/MM/DD>" tying a day index to a date.
    #[arg(long, default_value = DEFAULT_ANCHOR)]
    pub anchor: String,

    /// Number of bins in the series buffer.
    #[arg(long, default_value_t = DEFAULT_BINS)]
    pub bins: usize,

    /// Length (days) of the fit window.
    #[arg(long, default_value_t = DEFAULT_FIT_DAYS)]
    pub fit_days: usize,

    /// Maximum optimizer iterations per fit step.
    #[arg(long, default_value_t = 200)]
    pub max_iter: usize,

    /// Show top-N forecast days and residual outliers.
    #[arg(long, default_value_t = 10)]
    pub top: usize,

    /// Render an ASCII plot in the terminal (enabled by default).
    #[arg(long, default_value_t = true)]
    pub plot: bool,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Log-scale y axis for the plot.
    #[arg(long)]
    pub log: bool,

    /// Export per-bin results to CSV (single input only).
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Export fitted models + series to JSON (single input only).
    #[arg(long = "export-fit")]
    pub export_fit: Option<PathBuf>,
}

/// Options for plotting a saved fit.
#[derive(Debug, Parser)]
pub struct PlotArgs {
    /// Fit JSON file produced by `epifit fit --export-fit`.
    #[arg(value_name = "JSON")]
    pub fit: PathBuf,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Log-scale y axis.
    #[arg(long)]
    pub log: bool,
}

/// Options for synthetic sample generation.
#[derive(Debug, Parser)]
pub struct SampleArgs {
    /// Number of observed days to generate.
    #[arg(long, default_value_t = DEFAULT_FIT_DAYS)]
    pub days: usize,

    /// Model level A.
    #[arg(long, default_value_t = 3.0)]
    pub base: f64,

    /// Growth rate B per day.
    #[arg(long, default_value_t = 0.2)]
    pub growth: f64,

    /// Reciprocal-time coefficient C.
    #[arg(long, default_value_t = -1.5, allow_hyphen_values = true)]
    pub damping: f64,

    /// Random seed (same seed, same file).
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Output file (stdout if omitted).
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}
