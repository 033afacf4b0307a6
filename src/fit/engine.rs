//! Sequential growth-model fitting.
//!
//! Given the series buffer and a fit domain, we run the fixed three-step
//! protocol:
//!
//! 1. fit the baseline model, seeded from a weighted log-linear regression
//! 2. fit the refined model, seeded from the baseline's `A, B` (with `C = 0`)
//! 3. re-fit the refined model, seeded from its own step-2 parameters
//!
//! Step 3 exists to escape the shallow local minima a poor initial `C` can
//! leave the optimizer in. The sequence always runs to completion; a step
//! that fails to converge is flagged in its `FitQuality`, never an abort.
//!
//! Each step is a weighted Levenberg-Marquardt least-squares solve:
//! the objective is `chi2 = sum_i w_i (y_i - f(t_i))^2` with `w_i =
//! 1/uncertainty_i^2 = 1/count_i`. Bins with `count == 0` are placeholders,
//! not observations, and are excluded before weights are formed, which also
//! rules out division by zero.

use nalgebra::{DMatrix, DVector};
use statrs::distribution::{ChiSquared, ContinuousCDF};

use crate::domain::{CaseSeries, FitQuality, FitResult, FitSequence, GrowthModel, ModelKind};
use crate::error::AppError;
use crate::math::solve_least_squares;
use crate::models::{fill_jacobian_row, predict};

/// Seed for the reciprocal-time coefficient before the first refined fit.
const C_SEED_DEFAULT: f64 = 0.0;

/// Minimum number of observations beyond the parameter count.
const MIN_POINTS_BUFFER: usize = 2;

/// Levenberg-Marquardt options.
#[derive(Debug, Clone)]
pub struct LmOptions {
    pub max_iter: usize,
    /// Relative chi-square improvement below which a step counts as converged.
    pub tol: f64,
    pub lambda_init: f64,
    pub lambda_up: f64,
    pub lambda_down: f64,
    /// Damping ceiling; past this the step is abandoned (quality-flagged).
    pub lambda_max: f64,
}

impl Default for LmOptions {
    fn default() -> Self {
        Self {
            max_iter: 200,
            tol: 1e-10,
            lambda_init: 1e-3,
            lambda_up: 10.0,
            lambda_down: 0.1,
            lambda_max: 1e12,
        }
    }
}

/// One weighted observation inside the fit domain.
#[derive(Debug, Clone, Copy)]
struct FitPoint {
    t: f64,
    y: f64,
    w: f64,
}

/// Run the full three-step fit protocol over the given domain.
pub fn fit_sequence(
    series: &CaseSeries,
    domain: (f64, f64),
    opts: &LmOptions,
) -> Result<FitSequence, AppError> {
    let points = collect_points(series, domain);

    let needed = ModelKind::Refined.param_len() + MIN_POINTS_BUFFER;
    if points.len() < needed {
        return Err(AppError::data(format!(
            "Only {} observed day(s) inside the fit window; need at least {needed}.",
            points.len()
        )));
    }

    // Step 1: baseline, seeded from the closed-form log-linear estimate.
    let seed = seed_baseline(&points)?;
    let baseline = fit_model(ModelKind::Baseline, &points, domain, &seed, opts)?;

    // Step 2: refined, seeded from the baseline's A and B.
    let seed = vec![
        baseline.model.params[0],
        baseline.model.params[1],
        C_SEED_DEFAULT,
    ];
    let first_pass = fit_model(ModelKind::Refined, &points, domain, &seed, opts)?;

    // Step 3: refined again, seeded from its own fitted parameters.
    let refined = fit_model(
        ModelKind::Refined,
        &points,
        domain,
        &first_pass.model.params,
        opts,
    )?;

    Ok(FitSequence { baseline, refined })
}

/// Fit a single model kind with Levenberg-Marquardt from the given seed.
fn fit_model(
    kind: ModelKind,
    points: &[FitPoint],
    domain: (f64, f64),
    seed: &[f64],
    opts: &LmOptions,
) -> Result<FitResult, AppError> {
    let p = kind.param_len();
    if seed.len() != p {
        return Err(AppError::numeric(format!(
            "Seed length {} does not match {} model ({p} parameters).",
            seed.len(),
            kind.display_name()
        )));
    }
    if points.len() < p + MIN_POINTS_BUFFER {
        return Err(AppError::data(format!(
            "Underdetermined {} fit: {} point(s) for {p} parameters.",
            kind.display_name(),
            points.len()
        )));
    }

    let mut params = seed.to_vec();
    let mut chi2 = chi2_of(kind, points, &params);
    let mut lambda = opts.lambda_init;
    let mut converged = false;
    let mut iterations = 0usize;

    // A non-finite seed objective cannot be iterated on; surface it as a
    // degraded fit rather than aborting the sequence.
    if chi2.is_finite() {
        while iterations < opts.max_iter {
            iterations += 1;

            let Some(trial) = lm_step(kind, points, &params, lambda) else {
                // Singular step: inflate damping and retry.
                lambda *= opts.lambda_up;
                if lambda > opts.lambda_max {
                    break;
                }
                continue;
            };

            let trial_chi2 = chi2_of(kind, points, &trial);
            if trial_chi2.is_finite() && trial_chi2 <= chi2 {
                let improvement = (chi2 - trial_chi2) / chi2.max(f64::MIN_POSITIVE);
                params = trial;
                chi2 = trial_chi2;
                lambda = (lambda * opts.lambda_down).max(1e-15);
                if improvement < opts.tol {
                    converged = true;
                    break;
                }
            } else {
                lambda *= opts.lambda_up;
                if lambda > opts.lambda_max {
                    break;
                }
            }
        }
    }

    let ndf = points.len() - p;
    Ok(FitResult {
        model: GrowthModel {
            kind,
            display_name: kind.display_name().to_string(),
            params,
            domain,
        },
        quality: FitQuality {
            chi2,
            ndf,
            prob: chi2_prob(chi2, ndf),
            converged,
            iterations,
        },
    })
}

/// Extract the weighted observations inside `[xmin, xmax]`.
///
/// Zero-count bins fall inside the window once the observed prefix is shorter
/// than the window; they carry no information and are skipped here, which is
/// what keeps the `1/count` weights finite.
fn collect_points(series: &CaseSeries, domain: (f64, f64)) -> Vec<FitPoint> {
    let (xmin, xmax) = domain;
    series
        .bins
        .iter()
        .filter(|bin| bin.count > 0)
        .filter_map(|bin| {
            let t = f64::from(bin.index);
            if t < xmin || t > xmax {
                return None;
            }
            let y = bin.count as f64;
            Some(FitPoint { t, y, w: 1.0 / y })
        })
        .collect()
}

/// Closed-form seed for the baseline model.
///
/// `ln y = ln A + B t` is linear, so a weighted linear regression on the log
/// counts gives a deterministic starting point. The weights are the counts
/// themselves (`Var[ln y] ~ 1/y` under the Poisson convention).
fn seed_baseline(points: &[FitPoint]) -> Result<Vec<f64>, AppError> {
    let n = points.len();
    let mut xw = DMatrix::<f64>::zeros(n, 2);
    let mut yw = DVector::<f64>::zeros(n);

    for (i, pt) in points.iter().enumerate() {
        let sw = pt.y.sqrt();
        xw[(i, 0)] = sw;
        xw[(i, 1)] = pt.t * sw;
        yw[i] = pt.y.ln() * sw;
    }

    let beta = solve_least_squares(&xw, &yw)
        .ok_or_else(|| AppError::numeric("Log-linear seed regression is singular."))?;

    Ok(vec![beta[0].exp(), beta[1]])
}

/// One damped Gauss-Newton step: solve the augmented system
/// `[J_w; sqrt(lambda D)] d = [r_w; 0]` and return the trial parameters.
fn lm_step(kind: ModelKind, points: &[FitPoint], params: &[f64], lambda: f64) -> Option<Vec<f64>> {
    let n = points.len();
    let p = kind.param_len();

    let mut aug = DMatrix::<f64>::zeros(n + p, p);
    let mut rhs = DVector::<f64>::zeros(n + p);
    let mut row = vec![0.0; p];

    for (i, pt) in points.iter().enumerate() {
        fill_jacobian_row(kind, pt.t, params, &mut row);
        let sw = pt.w.sqrt();
        for j in 0..p {
            let v = row[j] * sw;
            if !v.is_finite() {
                return None;
            }
            aug[(i, j)] = v;
        }
        let r = (pt.y - predict(kind, pt.t, params)) * sw;
        if !r.is_finite() {
            return None;
        }
        rhs[i] = r;
    }

    // Marquardt scaling: damp each column by its own curvature.
    for j in 0..p {
        let mut diag = 0.0;
        for i in 0..n {
            diag += aug[(i, j)] * aug[(i, j)];
        }
        aug[(n + j, j)] = (lambda * diag.max(1e-12)).sqrt();
    }

    let delta = solve_least_squares(&aug, &rhs)?;
    Some(
        params
            .iter()
            .zip(delta.iter())
            .map(|(param, d)| param + d)
            .collect(),
    )
}

fn chi2_of(kind: ModelKind, points: &[FitPoint], params: &[f64]) -> f64 {
    points
        .iter()
        .map(|pt| {
            let r = pt.y - predict(kind, pt.t, params);
            pt.w * r * r
        })
        .sum()
}

/// Upper-tail chi-square probability at `ndf` degrees of freedom.
fn chi2_prob(chi2: f64, ndf: usize) -> f64 {
    if ndf == 0 || !chi2.is_finite() || chi2 < 0.0 {
        return 0.0;
    }
    match ChiSquared::new(ndf as f64) {
        Ok(dist) => (1.0 - dist.cdf(chi2)).clamp(0.0, 1.0),
        Err(_) => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::domain::CaseBin;

    /// Series whose counts follow `a * exp(b * t + c / t)` exactly (rounded).
    fn synthetic_series(a: f64, b: f64, c: f64, days: usize, bins: usize) -> CaseSeries {
        let start = NaiveDate::from_ymd_opt(2020, 2, 15).unwrap();
        let bins_out: Vec<CaseBin> = (1..=bins)
            .map(|i| {
                let t = i as f64;
                let count = if i <= days {
                    (a * (b * t + c / t).exp()).round().max(1.0) as u64
                } else {
                    0
                };
                CaseBin {
                    index: i as u32,
                    date: start + chrono::Duration::days((i - 1) as i64),
                    count,
                    uncertainty: (count as f64).sqrt(),
                }
            })
            .collect();
        CaseSeries { bins: bins_out }
    }

    #[test]
    fn baseline_recovers_clean_exponential() {
        let series = synthetic_series(5.0, 0.3, 0.0, 45, 100);
        let fits = fit_sequence(&series, (0.5, 45.5), &LmOptions::default()).unwrap();

        let params = &fits.baseline.model.params;
        assert!(
            (params[0] - 5.0).abs() / 5.0 < 0.05,
            "A = {} should be near 5",
            params[0]
        );
        assert!(
            (params[1] - 0.3).abs() < 5e-3,
            "B = {} should be near 0.3",
            params[1]
        );
        assert!(fits.baseline.quality.converged);
    }

    #[test]
    fn refined_recovers_reciprocal_term() {
        let series = synthetic_series(20.0, 0.2, -2.0, 45, 100);
        let fits = fit_sequence(&series, (0.5, 45.5), &LmOptions::default()).unwrap();

        let params = &fits.refined.model.params;
        assert!(
            (params[1] - 0.2).abs() < 0.02,
            "B = {} should be near 0.2",
            params[1]
        );
        assert!(
            (params[2] + 2.0).abs() < 0.5,
            "C = {} should be near -2",
            params[2]
        );
    }

    #[test]
    fn repeated_fits_are_identical() {
        let series = synthetic_series(8.0, 0.25, -1.0, 40, 100);
        let first = fit_sequence(&series, (0.5, 45.5), &LmOptions::default()).unwrap();
        let second = fit_sequence(&series, (0.5, 45.5), &LmOptions::default()).unwrap();

        for (a, b) in first
            .refined
            .model
            .params
            .iter()
            .zip(second.refined.model.params.iter())
        {
            assert_eq!(a, b);
        }
    }

    #[test]
    fn zero_count_bins_are_excluded_from_the_objective() {
        let mut series = synthetic_series(5.0, 0.3, 0.0, 30, 100);
        // Padding bins sit inside the 45-day window but must not contribute.
        assert!(series.bins[30..45].iter().all(|b| b.count == 0));

        let points = collect_points(&series, (0.5, 45.5));
        assert_eq!(points.len(), 30);
        assert!(points.iter().all(|p| p.w.is_finite() && p.w > 0.0));

        // Observed count of zero anywhere behaves the same way.
        series.bins[10].count = 0;
        series.bins[10].uncertainty = 0.0;
        let points = collect_points(&series, (0.5, 45.5));
        assert_eq!(points.len(), 29);
    }

    #[test]
    fn too_few_observations_is_a_data_error() {
        let series = synthetic_series(5.0, 0.3, 0.0, 3, 100);
        let err = fit_sequence(&series, (0.5, 45.5), &LmOptions::default()).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn quality_reports_probability_bounds() {
        assert!(chi2_prob(0.0, 10) > 0.999);
        assert!(chi2_prob(1_000.0, 10) < 1e-6);
        assert_eq!(chi2_prob(f64::NAN, 10), 0.0);
        assert_eq!(chi2_prob(5.0, 0), 0.0);
    }
}
