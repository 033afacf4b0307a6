//! Read/write fit JSON files.
//!
//! The fit file is the "portable" representation of a completed run and
//! carries the full core output contract unchanged:
//! - the series buffer (index/date/count/uncertainty per bin)
//! - both fitted models with their quality metrics
//! - the residual and forecast series
//! - a precomputed fitted grid for quick plotting
//!
//! The schema is defined by `domain::FitFile`.

use std::fs::File;
use std::path::Path;

use crate::domain::{FitFile, FitGrid, FitSequence, ForecastPoint, ResidualPoint};
use crate::error::AppError;
use crate::io::ingest::IngestedData;
use crate::models::predict;

/// Number of grid samples stored alongside the fitted models.
const GRID_POINTS: usize = 101;

/// Write a fit JSON file.
pub fn write_fit_json(
    path: &Path,
    label: &str,
    ingest: &IngestedData,
    fits: &FitSequence,
    residuals: &[ResidualPoint],
    forecasts: &[ForecastPoint],
) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::usage(format!(
            "Failed to create fit JSON '{}': {e}",
            path.display()
        ))
    })?;

    let out = FitFile {
        tool: "epifit".to_string(),
        label: label.to_string(),
        anchor_index: ingest.anchor.index,
        anchor_date: ingest.anchor.date,
        bins: ingest.series.len(),
        baseline: fits.baseline.clone(),
        refined: fits.refined.clone(),
        series: ingest.series.bins.clone(),
        residuals: residuals.to_vec(),
        forecasts: forecasts.to_vec(),
        grid: build_grid(fits, GRID_POINTS),
    };

    serde_json::to_writer_pretty(file, &out)
        .map_err(|e| AppError::usage(format!("Failed to write fit JSON: {e}")))?;

    Ok(())
}

/// Read a fit JSON file.
pub fn read_fit_json(path: &Path) -> Result<FitFile, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::usage(format!("Failed to open fit JSON '{}': {e}", path.display()))
    })?;
    let fit: FitFile = serde_json::from_reader(file)
        .map_err(|e| AppError::usage(format!("Invalid fit JSON: {e}")))?;
    Ok(fit)
}

fn build_grid(fits: &FitSequence, n: usize) -> FitGrid {
    let n = n.max(2);
    let model = &fits.refined.model;
    let (t0, t1) = model.domain;

    let mut t = Vec::with_capacity(n);
    let mut y = Vec::with_capacity(n);
    for i in 0..n {
        let u = i as f64 / (n as f64 - 1.0);
        let ti = t0 + u * (t1 - t0);
        t.push(ti);
        y.push(predict(model.kind, ti, &model.params));
    }

    FitGrid { t, y }
}
