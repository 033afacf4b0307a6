//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting
//! - exported to JSON/CSV
//! - reloaded later for plotting or comparisons

use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Number of bins in the series buffer.
pub const DEFAULT_BINS: usize = 100;

/// Length (in days) of the fit window.
pub const DEFAULT_FIT_DAYS: usize = 45;

/// Offset of the fit domain from integer day indices.
///
/// The refined model divides by `t`, so the domain must exclude `t = 0`.
/// Shifting both edges by half a day guarantees that structurally.
pub const DOMAIN_OFFSET: f64 = 0.5;

/// One day-indexed slot of the series buffer.
///
/// `uncertainty` is the Poisson convention `sqrt(count)`. A zero count means
/// "no observation yet", never "observed zero cases"; its uncertainty is zero
/// and downstream consumers must skip it rather than treat it as data. A true
/// observed zero is not representable under this convention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseBin {
    /// 1-based chronological position in the buffer.
    pub index: u32,
    /// Calendar date from the reference anchor.
    pub date: NaiveDate,
    pub count: u64,
    pub uncertainty: f64,
}

impl CaseBin {
    /// Two-digit `YY-MM-DD` date label for axis/report output.
    pub fn date_label(&self) -> String {
        self.date.format("%y-%m-%d").to_string()
    }

    /// Whether this bin holds a real observation.
    pub fn is_observed(&self) -> bool {
        self.count > 0
    }
}

/// Fixed-length, chronologically ordered buffer of case bins.
///
/// Invariants (established by the series builder, never mutated after):
/// - exactly the configured number of bins
/// - `bins[i].index == i + 1`
/// - `uncertainty == sqrt(count)` for every bin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseSeries {
    pub bins: Vec<CaseBin>,
}

impl CaseSeries {
    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn max_count(&self) -> u64 {
        self.bins.iter().map(|b| b.count).max().unwrap_or(0)
    }

    /// Number of bins holding real observations.
    pub fn observed_days(&self) -> usize {
        self.bins.iter().filter(|b| b.is_observed()).count()
    }
}

/// Which growth model a parameter vector belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// Pure exponential growth: `y = A exp(B t)`.
    Baseline,
    /// Exponential with a reciprocal-time correction: `y = A exp(B t + C/t)`.
    Refined,
}

impl ModelKind {
    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            ModelKind::Baseline => "baseline",
            ModelKind::Refined => "refined",
        }
    }

    /// Number of free parameters.
    pub fn param_len(self) -> usize {
        match self {
            ModelKind::Baseline => 2,
            ModelKind::Refined => 3,
        }
    }
}

/// Fitted model parameters and metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrowthModel {
    pub kind: ModelKind,
    pub display_name: String,
    /// `[A, B]` for the baseline, `[A, B, C]` for the refined model.
    pub params: Vec<f64>,
    /// Fit domain `[xmin, xmax]`; `xmin` is always offset away from zero.
    pub domain: (f64, f64),
}

impl GrowthModel {
    /// Legend-style formula with fitted coefficients,
    /// e.g. `3.21 exp(0.19 t + -1.52/t)`.
    pub fn formula(&self) -> String {
        match self.kind {
            ModelKind::Baseline => {
                format!("{:.2} exp({:.2} t)", self.params[0], self.params[1])
            }
            ModelKind::Refined => format!(
                "{:.2} exp({:.2} t + {:.2}/t)",
                self.params[0], self.params[1], self.params[2]
            ),
        }
    }
}

/// Fit quality diagnostics.
///
/// `converged == false` marks a degraded fit; the pipeline still completes
/// and it is up to the consumer to decide whether to trust the forecasts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitQuality {
    pub chi2: f64,
    /// Degrees of freedom (observed in-domain points minus parameters).
    pub ndf: usize,
    /// Upper-tail chi-square probability at `ndf` degrees of freedom.
    pub prob: f64,
    pub converged: bool,
    pub iterations: usize,
}

/// Fit output for a single model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitResult {
    pub model: GrowthModel,
    pub quality: FitQuality,
}

/// Output of the three-step fit protocol.
///
/// `refined` holds the parameters after the second re-seeded pass; the
/// intermediate refined fit is discarded. `baseline` is kept for reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitSequence {
    pub baseline: FitResult,
    pub refined: FitResult,
}

/// Observed-minus-predicted value for a bin with real data.
///
/// `index` back-references the source bin; the uncertainty is the bin's own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResidualPoint {
    pub index: u32,
    pub date: NaiveDate,
    pub observed: u64,
    pub predicted: f64,
    pub residual: f64,
    pub uncertainty: f64,
}

/// Model prediction substituted for a bin with no real data.
///
/// `count` is the rounded prediction; `uncertainty` is the square root of the
/// raw (unrounded) prediction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub index: u32,
    pub date: NaiveDate,
    pub count: u64,
    pub uncertainty: f64,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct FitConfig {
    pub input: PathBuf,
    /// Display label for reports and plots (e.g. a country name).
    pub label: String,
    /// Reference anchor string, `"<index>:<YY/MM/DD>"`.
    pub anchor: String,
    pub bins: usize,
    pub fit_days: usize,
    pub max_iter: usize,

    /// How many forecast days and residual outliers to show.
    pub top_n: usize,

    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,
    pub log_scale: bool,

    pub export_results: Option<PathBuf>,
    pub export_fit: Option<PathBuf>,
}

impl FitConfig {
    /// Fit domain `[xmin, xmax]`. Never includes `t = 0`.
    pub fn fit_domain(&self) -> (f64, f64) {
        (DOMAIN_OFFSET, self.fit_days as f64 + DOMAIN_OFFSET)
    }
}

/// Fitted curve sampled on a regular grid (for plotting without re-evaluation).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitGrid {
    pub t: Vec<f64>,
    pub y: Vec<f64>,
}

/// A saved fit file (JSON).
///
/// This is the portable form of the core output contract: the series, both
/// fitted models, and the residual/forecast series, exactly as computed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitFile {
    pub tool: String,
    pub label: String,
    pub anchor_index: i64,
    pub anchor_date: NaiveDate,
    pub bins: usize,
    pub baseline: FitResult,
    pub refined: FitResult,
    pub series: Vec<CaseBin>,
    pub residuals: Vec<ResidualPoint>,
    pub forecasts: Vec<ForecastPoint>,
    pub grid: FitGrid,
}
