//! Shared "fit pipeline" logic for a single input file.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! ingest -> sequential fits -> residuals -> forecasts -> outlier ranking
//!
//! The CLI front-end then focuses on presentation and exports. One run owns
//! all of its outputs; independent runs share nothing mutable, so the app
//! layer is free to execute several of them in parallel.

use crate::domain::{FitConfig, FitSequence, ForecastPoint, ResidualPoint};
use crate::error::AppError;
use crate::fit::{fit_sequence, LmOptions};
use crate::io::ingest::{self, IngestedData};
use crate::report::{self, Outliers};

/// All computed outputs of a single `epifit fit` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub ingest: IngestedData,
    pub fits: FitSequence,
    pub residuals: Vec<ResidualPoint>,
    pub forecasts: Vec<ForecastPoint>,
    pub outliers: Outliers,
}

/// Execute the full fitting pipeline for one input and return the outputs.
pub fn run_fit(config: &FitConfig) -> Result<RunOutput, AppError> {
    // 1) Parse the input into the fixed-length series buffer.
    let ingest = ingest::load_series(config)?;

    // 2) Run the three-step fit protocol over the configured window.
    let opts = LmOptions {
        max_iter: config.max_iter,
        ..LmOptions::default()
    };
    let fits = fit_sequence(&ingest.series, config.fit_domain(), &opts)?;

    // 3) Derive residual and forecast series from the final refined model.
    let residuals = report::compute_residuals(&ingest.series, &fits.refined)?;
    let forecasts = report::compute_forecasts(&ingest.series, &fits.refined)?;
    let outliers = report::rank_outliers(&residuals, config.top_n);

    Ok(RunOutput {
        ingest,
        fits,
        residuals,
        forecasts,
        outliers,
    })
}
