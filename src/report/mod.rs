//! Residual and forecast series, plus residual rankings.
//!
//! Both derived series are pure functions of `(CaseSeries, FitResult)` and
//! partition the buffer between them: a bin with a real observation gets a
//! residual, a placeholder bin gets a forecast, never both.

use crate::domain::{CaseSeries, FitResult, ForecastPoint, ResidualPoint};
use crate::error::AppError;
use crate::models::predict;

pub mod format;

/// Largest observed-minus-predicted deviations (top-N each side).
#[derive(Debug, Clone)]
pub struct Outliers {
    /// Days where observations most exceed the model.
    pub above: Vec<ResidualPoint>,
    /// Days where observations fall furthest below the model.
    pub below: Vec<ResidualPoint>,
}

/// Compute residuals for every bin with a real observation.
///
/// The residual keeps the bin's own Poisson uncertainty; zero-count bins
/// carry no residual by definition.
pub fn compute_residuals(
    series: &CaseSeries,
    fit: &FitResult,
) -> Result<Vec<ResidualPoint>, AppError> {
    let mut out = Vec::new();
    for bin in &series.bins {
        if !bin.is_observed() {
            continue;
        }
        let predicted = predict(fit.model.kind, f64::from(bin.index), &fit.model.params);
        if !predicted.is_finite() {
            return Err(AppError::numeric(
                "Non-finite model prediction during residual computation.",
            ));
        }
        out.push(ResidualPoint {
            index: bin.index,
            date: bin.date,
            observed: bin.count,
            predicted,
            residual: bin.count as f64 - predicted,
            uncertainty: bin.uncertainty,
        });
    }
    Ok(out)
}

/// Compute forecasts for every bin with no real observation.
///
/// The forecast count is the rounded prediction; its uncertainty is the
/// square root of the raw prediction (Poisson convention on the model side).
pub fn compute_forecasts(
    series: &CaseSeries,
    fit: &FitResult,
) -> Result<Vec<ForecastPoint>, AppError> {
    let mut out = Vec::new();
    for bin in &series.bins {
        if bin.is_observed() {
            continue;
        }
        let raw = predict(fit.model.kind, f64::from(bin.index), &fit.model.params);
        if !raw.is_finite() {
            return Err(AppError::numeric(
                "Non-finite model prediction during forecast computation.",
            ));
        }
        let raw = raw.max(0.0);
        out.push(ForecastPoint {
            index: bin.index,
            date: bin.date,
            count: raw.round() as u64,
            uncertainty: raw.sqrt(),
        });
    }
    Ok(out)
}

/// Rank the days that deviate most from the fitted curve, each side.
pub fn rank_outliers(residuals: &[ResidualPoint], top_n: usize) -> Outliers {
    let mut sorted = residuals.to_vec();
    sorted.sort_by(|a, b| {
        b.residual
            .partial_cmp(&a.residual)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let above = sorted.iter().take(top_n).cloned().collect();

    sorted.sort_by(|a, b| {
        a.residual
            .partial_cmp(&b.residual)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let below = sorted.iter().take(top_n).cloned().collect();

    Outliers { above, below }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::domain::{CaseBin, FitQuality, GrowthModel, ModelKind};

    fn series_with_counts(counts: &[u64]) -> CaseSeries {
        let start = NaiveDate::from_ymd_opt(2020, 2, 15).unwrap();
        let bins = counts
            .iter()
            .enumerate()
            .map(|(i, &count)| CaseBin {
                index: (i + 1) as u32,
                date: start + chrono::Duration::days(i as i64),
                count,
                uncertainty: (count as f64).sqrt(),
            })
            .collect();
        CaseSeries { bins }
    }

    fn constant_model(level: f64) -> FitResult {
        FitResult {
            model: GrowthModel {
                kind: ModelKind::Baseline,
                display_name: "baseline".to_string(),
                // B = 0 makes the model a constant A.
                params: vec![level, 0.0],
                domain: (0.5, 45.5),
            },
            quality: FitQuality {
                chi2: 0.0,
                ndf: 1,
                prob: 1.0,
                converged: true,
                iterations: 1,
            },
        }
    }

    #[test]
    fn residuals_and_forecasts_partition_the_series() {
        let series = series_with_counts(&[10, 0, 22, 0, 0, 31]);
        let fit = constant_model(20.0);

        let residuals = compute_residuals(&series, &fit).unwrap();
        let forecasts = compute_forecasts(&series, &fit).unwrap();

        assert_eq!(residuals.len() + forecasts.len(), series.len());

        let residual_idx: Vec<u32> = residuals.iter().map(|r| r.index).collect();
        let forecast_idx: Vec<u32> = forecasts.iter().map(|f| f.index).collect();
        assert_eq!(residual_idx, vec![1, 3, 6]);
        assert_eq!(forecast_idx, vec![2, 4, 5]);
        for idx in &residual_idx {
            assert!(!forecast_idx.contains(idx));
        }
    }

    #[test]
    fn residual_preserves_observed_uncertainty() {
        let series = series_with_counts(&[25]);
        let fit = constant_model(20.0);

        let residuals = compute_residuals(&series, &fit).unwrap();
        assert_eq!(residuals.len(), 1);
        assert!((residuals[0].residual - 5.0).abs() < 1e-12);
        assert!((residuals[0].uncertainty - 5.0).abs() < 1e-12);
    }

    #[test]
    fn forecast_rounds_and_takes_sqrt_of_raw_prediction() {
        let series = series_with_counts(&[0]);
        let fit = constant_model(42.0);

        let forecasts = compute_forecasts(&series, &fit).unwrap();
        assert_eq!(forecasts.len(), 1);
        assert_eq!(forecasts[0].count, 42);
        assert!((forecasts[0].uncertainty - 42f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn outliers_rank_both_sides() {
        let series = series_with_counts(&[30, 20, 5]);
        let fit = constant_model(20.0);
        let residuals = compute_residuals(&series, &fit).unwrap();

        let outliers = rank_outliers(&residuals, 1);
        assert_eq!(outliers.above.len(), 1);
        assert_eq!(outliers.above[0].index, 1);
        assert_eq!(outliers.below.len(), 1);
        assert_eq!(outliers.below[0].index, 3);
    }
}
