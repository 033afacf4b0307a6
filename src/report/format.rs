//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the math/fitting code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

use crate::domain::{FitConfig, FitResult, FitSequence, ForecastPoint};
use crate::io::ingest::IngestedData;
use crate::report::Outliers;

/// Format the full run summary (dataset stats + fit diagnostics + final model).
pub fn format_run_summary(
    ingest: &IngestedData,
    fits: &FitSequence,
    config: &FitConfig,
) -> String {
    let mut out = String::new();
    let (xmin, xmax) = config.fit_domain();

    out.push_str("=== epifit - epidemic growth-curve fit ===\n");
    out.push_str(&format!("Label: {}\n", config.label));
    out.push_str(&format!("Input: {}\n", config.input.display()));
    out.push_str(&format!(
        "Anchor: index {} = {}\n",
        ingest.anchor.index, ingest.anchor.date
    ));
    out.push_str(&format!(
        "Series: {} bins | observed days: {} | max count: {}\n",
        ingest.series.len(),
        ingest.stats.n_observed,
        ingest.stats.max_count
    ));
    out.push_str(&format!(
        "Fit window: t in [{xmin:.1}, {xmax:.1}] ({} days)\n",
        config.fit_days
    ));

    out.push_str("\nFit sequence:\n");
    out.push_str(&format_fit_line(&fits.baseline, "A exp(B t)"));
    out.push_str(&format_fit_line(&fits.refined, "A exp(B t + C/t)"));

    out.push_str(&format!("\nFinal model: {}\n", fits.refined.model.formula()));
    out.push_str(&format!(
        "Baseline:    {}\n",
        fits.baseline.model.formula()
    ));

    out
}

fn format_fit_line(fit: &FitResult, form: &str) -> String {
    let q = &fit.quality;
    let flag = if q.converged { "" } else { "  NOT CONVERGED" };
    format!(
        "  {:<9} {:<18} chi2/ndf={:.1}/{} prob={:.4} iters={}{}\n",
        fit.model.display_name, form, q.chi2, q.ndf, q.prob, q.iterations, flag
    )
}

/// Format the forecast table (next `top_n` unobserved days).
pub fn format_forecasts(forecasts: &[ForecastPoint], top_n: usize) -> String {
    let mut out = String::new();

    out.push_str("Forecast (unobserved days):\n");
    if forecasts.is_empty() {
        out.push_str("  (none: every bin in the buffer is observed)\n");
        return out;
    }

    out.push_str(&format!(
        "{:>6} {:<10} {:>10} {:>10}\n",
        "day", "date", "cases", "+/-"
    ));
    for f in forecasts.iter().take(top_n) {
        out.push_str(&format!(
            "{:>6} {:<10} {:>10} {:>10.1}\n",
            f.index,
            f.date.format("%y-%m-%d"),
            f.count,
            f.uncertainty
        ));
    }
    if forecasts.len() > top_n {
        out.push_str(&format!("  ... {} more\n", forecasts.len() - top_n));
    }

    out
}

/// Format the largest deviations from the fitted curve.
pub fn format_outliers(outliers: &Outliers) -> String {
    let mut out = String::new();

    out.push_str("Days most above the curve:\n");
    out.push_str(&format_residual_table(&outliers.above));
    out.push('\n');
    out.push_str("Days most below the curve:\n");
    out.push_str(&format_residual_table(&outliers.below));

    out
}

fn format_residual_table(rows: &[crate::domain::ResidualPoint]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:>6} {:<10} {:>10} {:>12} {:>12} {:>10}\n",
        "day", "date", "observed", "predicted", "residual", "+/-"
    ));
    for r in rows {
        out.push_str(&format!(
            "{:>6} {:<10} {:>10} {:>12.1} {:>12.1} {:>10.1}\n",
            r.index,
            r.date.format("%y-%m-%d"),
            r.observed,
            r.predicted,
            r.residual,
            r.uncertainty
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn forecast_table_truncates_to_top_n() {
        let date = NaiveDate::from_ymd_opt(2020, 3, 20).unwrap();
        let forecasts: Vec<ForecastPoint> = (36..=45)
            .map(|i| ForecastPoint {
                index: i,
                date,
                count: 1000 + u64::from(i),
                uncertainty: 30.0,
            })
            .collect();

        let txt = format_forecasts(&forecasts, 3);
        assert!(txt.contains("1036"));
        assert!(txt.contains("... 7 more"));
        assert!(!txt.contains("1045"));
    }

    #[test]
    fn empty_forecast_table_says_so() {
        let txt = format_forecasts(&[], 5);
        assert!(txt.contains("every bin in the buffer is observed"));
    }
}
