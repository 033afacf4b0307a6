//! Model evaluation for the two growth-model families.
//!
//! The fitter relies on two primitive operations:
//! - predict `y(t)` given a parameter vector (for the objective and forecasts)
//! - fill a Jacobian row of partial derivatives at `t` (for the LM step)
//!
//! Both models are exponentials, so the partials come out in terms of the
//! prediction itself:
//!
//! - baseline `y = A exp(B t)`:        `dy/dA = y/A`, `dy/dB = t y`
//! - refined  `y = A exp(B t + C/t)`:  `dy/dA = y/A`, `dy/dB = t y`, `dy/dC = y/t`
//!
//! The fit domain keeps `t` away from zero (`xmin = 0.5`), so the `C/t` term
//! is well defined for every point the fitter sees.

use crate::domain::ModelKind;

/// Epsilon for guarding against `t = 0` in the reciprocal term.
///
/// The domain convention makes `t = 0` unreachable from the fitter, but
/// `predict` is also called by plotting/export consumers on arbitrary grids.
const T_EPS: f64 = 1e-12;

/// Predict `y(t)` for the given model kind.
pub fn predict(kind: ModelKind, t: f64, params: &[f64]) -> f64 {
    match kind {
        ModelKind::Baseline => params[0] * (params[1] * t).exp(),
        ModelKind::Refined => {
            let t = if t.abs() < T_EPS { T_EPS } else { t };
            params[0] * (params[1] * t + params[2] / t).exp()
        }
    }
}

/// Fill a Jacobian row (`dy/dparam_j`) for the given model kind.
///
/// # Panics
/// Panics if `out` does not have length `kind.param_len()` or `params` is
/// shorter than the model's parameter count. Callers size these correctly.
pub fn fill_jacobian_row(kind: ModelKind, t: f64, params: &[f64], out: &mut [f64]) {
    match kind {
        ModelKind::Baseline => {
            let e = (params[1] * t).exp();
            out[0] = e;
            out[1] = params[0] * t * e;
        }
        ModelKind::Refined => {
            let t = if t.abs() < T_EPS { T_EPS } else { t };
            let e = (params[1] * t + params[2] / t).exp();
            out[0] = e;
            out[1] = params[0] * t * e;
            out[2] = params[0] * e / t;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_predict_matches_closed_form() {
        let params = [5.0, 0.3];
        let y = predict(ModelKind::Baseline, 10.0, &params);
        assert!((y - 5.0 * (3.0f64).exp()).abs() < 1e-9);
    }

    #[test]
    fn refined_predict_finite_on_domain() {
        let params = [5.0, 0.3, -1.5];
        for &t in &[0.5, 1.0, 10.0, 45.5] {
            assert!(predict(ModelKind::Refined, t, &params).is_finite());
        }
    }

    #[test]
    fn jacobian_matches_finite_differences() {
        let cases = [
            (ModelKind::Baseline, vec![4.0, 0.25]),
            (ModelKind::Refined, vec![4.0, 0.25, -0.8]),
        ];
        let h = 1e-6;

        for (kind, params) in cases {
            let p = kind.param_len();
            let mut row = vec![0.0; p];
            for &t in &[1.0, 7.0, 20.0] {
                fill_jacobian_row(kind, t, &params, &mut row);
                for j in 0..p {
                    let mut bumped = params.clone();
                    bumped[j] += h;
                    let fd = (predict(kind, t, &bumped) - predict(kind, t, &params)) / h;
                    let scale = fd.abs().max(1.0);
                    assert!(
                        (row[j] - fd).abs() / scale < 1e-4,
                        "kind={kind:?} t={t} j={j}: analytic={} fd={fd}",
                        row[j]
                    );
                }
            }
        }
    }
}
