//! Export per-bin results to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream
//! scripts: one row per bin, with either residual or forecast columns filled
//! depending on whether the bin was observed.

use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::{CaseSeries, FitSequence, ForecastPoint, ResidualPoint};
use crate::error::AppError;
use crate::models::predict;

/// Write per-bin results to a CSV file.
pub fn write_results_csv(
    path: &Path,
    series: &CaseSeries,
    fits: &FitSequence,
    residuals: &[ResidualPoint],
    forecasts: &[ForecastPoint],
) -> Result<(), AppError> {
    let mut file = File::create(path).map_err(|e| {
        AppError::usage(format!(
            "Failed to create export CSV '{}': {e}",
            path.display()
        ))
    })?;

    let residual_by_index: HashMap<u32, &ResidualPoint> =
        residuals.iter().map(|r| (r.index, r)).collect();
    let forecast_by_index: HashMap<u32, &ForecastPoint> =
        forecasts.iter().map(|f| (f.index, f)).collect();

    writeln!(
        file,
        "index,date,count,uncertainty,fitted,residual,forecast,forecast_uncertainty,kind"
    )
    .map_err(|e| AppError::usage(format!("Failed to write export CSV header: {e}")))?;

    for bin in &series.bins {
        let fitted = predict(
            fits.refined.model.kind,
            f64::from(bin.index),
            &fits.refined.model.params,
        );

        let (residual, forecast, forecast_unc, kind) = match (
            residual_by_index.get(&bin.index),
            forecast_by_index.get(&bin.index),
        ) {
            (Some(r), _) => (format!("{:.4}", r.residual), String::new(), String::new(), "observed"),
            (None, Some(f)) => (
                String::new(),
                f.count.to_string(),
                format!("{:.4}", f.uncertainty),
                "forecast",
            ),
            (None, None) => (String::new(), String::new(), String::new(), "none"),
        };

        writeln!(
            file,
            "{},{},{},{:.6},{:.4},{},{},{},{}",
            bin.index,
            bin.date,
            bin.count,
            bin.uncertainty,
            fitted,
            residual,
            forecast,
            forecast_unc,
            kind,
        )
        .map_err(|e| AppError::usage(format!("Failed to write export CSV row: {e}")))?;
    }

    Ok(())
}
