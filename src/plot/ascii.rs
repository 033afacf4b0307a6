//! ASCII/Unicode plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - observed counts: `o`
//! - forecast counts: `+`
//! - fitted curve: `-` line
//!
//! All styling is carried by an explicit [`PlotStyle`] value; there is no
//! process-global plot state.

use crate::domain::{CaseSeries, FitFile, FitSequence, ForecastPoint, GrowthModel};
use crate::models::predict;

/// Explicit styling configuration for the terminal plot.
#[derive(Debug, Clone)]
pub struct PlotStyle {
    pub width: usize,
    pub height: usize,
    /// Log-scale y axis (counts clamped at 1 before taking the log).
    pub log_scale: bool,
}

/// Render observed data, the fitted curve, and forecasts over the fit domain.
pub fn render_series_plot(
    series: &CaseSeries,
    fits: &FitSequence,
    forecasts: &[ForecastPoint],
    style: &PlotStyle,
) -> String {
    let (t_min, t_max) = fits.refined.model.domain;
    let curve = sample_curve(&fits.refined.model, t_min, t_max, style.width.max(2));

    let observed: Vec<(f64, f64)> = series
        .bins
        .iter()
        .filter(|b| b.is_observed())
        .map(|b| (f64::from(b.index), b.count as f64))
        .collect();
    let predicted: Vec<(f64, f64)> = forecasts
        .iter()
        .map(|f| (f64::from(f.index), f.count as f64))
        .collect();

    render_plot(&observed, &predicted, Some(&curve), t_min, t_max, style)
}

/// Render a plot from a saved fit file (uses the precomputed grid).
pub fn render_plot_from_fit_file(file: &FitFile, style: &PlotStyle) -> String {
    let curve: Vec<(f64, f64)> = file
        .grid
        .t
        .iter()
        .zip(file.grid.y.iter())
        .map(|(&t, &y)| (t, y))
        .collect();
    let (t_min, t_max) = file.refined.model.domain;

    let observed: Vec<(f64, f64)> = file
        .series
        .iter()
        .filter(|b| b.is_observed())
        .map(|b| (f64::from(b.index), b.count as f64))
        .collect();
    let predicted: Vec<(f64, f64)> = file
        .forecasts
        .iter()
        .map(|f| (f64::from(f.index), f.count as f64))
        .collect();

    render_plot(&observed, &predicted, Some(&curve), t_min, t_max, style)
}

fn render_plot(
    observed: &[(f64, f64)],
    predicted: &[(f64, f64)],
    curve: Option<&[(f64, f64)]>,
    t_min: f64,
    t_max: f64,
    style: &PlotStyle,
) -> String {
    let width = style.width.max(10);
    let height = style.height.max(5);

    let in_range = |&&(t, _): &&(f64, f64)| t >= t_min && t <= t_max;
    let observed: Vec<(f64, f64)> = observed.iter().filter(in_range).copied().collect();
    let predicted: Vec<(f64, f64)> = predicted.iter().filter(in_range).copied().collect();

    let (y_min_raw, y_max_raw) =
        y_range(&observed, &predicted, curve).unwrap_or((0.0, 1.0));
    let yt = |v: f64| {
        if style.log_scale {
            v.max(1.0).ln()
        } else {
            v
        }
    };
    let (y_min, y_max) = pad_range(yt(y_min_raw), yt(y_max_raw), 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Draw the curve first (so points can overlay).
    if let Some(curve) = curve {
        draw_curve(&mut grid, curve, t_min, t_max, y_min, y_max, yt);
    }

    for &(t, y) in &predicted {
        let x = map_x(t, t_min, t_max, width);
        let yy = map_y(yt(y), y_min, y_max, height);
        grid[yy][x] = '+';
    }
    for &(t, y) in &observed {
        let x = map_x(t, t_min, t_max, width);
        let yy = map_y(yt(y), y_min, y_max, height);
        grid[yy][x] = 'o';
    }

    let scale = if style.log_scale { " (log)" } else { "" };
    let mut out = String::new();
    out.push_str(&format!(
        "Plot: days [{t_min:.1}, {t_max:.1}] | cases [{y_min_raw:.0}, {y_max_raw:.0}]{scale} | o observed  + forecast  - fitted\n"
    ));

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    out
}

fn sample_curve(model: &GrowthModel, t_min: f64, t_max: f64, n: usize) -> Vec<(f64, f64)> {
    let n = n.max(2);
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let u = i as f64 / (n as f64 - 1.0);
        let t = t_min + u * (t_max - t_min);
        out.push((t, predict(model.kind, t, &model.params)));
    }
    out
}

fn y_range(
    observed: &[(f64, f64)],
    predicted: &[(f64, f64)],
    curve: Option<&[(f64, f64)]>,
) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;

    for &(_, y) in observed.iter().chain(predicted.iter()) {
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }
    if let Some(curve) = curve {
        for &(_, y) in curve {
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }
    }

    if min_y.is_finite() && max_y.is_finite() && max_y > min_y {
        Some((min_y, max_y))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y = max maps to the top row.
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve<F: Fn(f64) -> f64>(
    grid: &mut [Vec<char>],
    curve: &[(f64, f64)],
    t_min: f64,
    t_max: f64,
    y_min: f64,
    y_max: f64,
    yt: F,
) {
    if curve.len() < 2 {
        return;
    }
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(t, y) in curve {
        let x = map_x(t, t_min, t_max, width);
        let yy = map_y(yt(y), y_min, y_max, height);
        if let Some((x0, y0)) = prev {
            draw_line(grid, x0, y0, x, yy, '-');
        } else {
            grid[yy][x] = '-';
        }
        prev = Some((x, yy));
    }
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plot_has_expected_shape_and_markers() {
        let observed = vec![(1.0, 10.0), (20.0, 500.0)];
        let predicted = vec![(40.0, 2000.0)];
        let curve = vec![(0.5, 8.0), (45.5, 2500.0)];
        let style = PlotStyle {
            width: 40,
            height: 12,
            log_scale: false,
        };

        let txt = render_plot(&observed, &predicted, Some(&curve), 0.5, 45.5, &style);
        let lines: Vec<&str> = txt.lines().collect();

        // Header plus one line per grid row.
        assert_eq!(lines.len(), 13);
        assert!(lines[0].starts_with("Plot: days [0.5, 45.5]"));
        for line in &lines[1..] {
            assert_eq!(line.chars().count(), 40);
        }

        let body = lines[1..].join("\n");
        assert_eq!(body.matches('o').count(), 2);
        assert_eq!(body.matches('+').count(), 1);
        assert!(body.contains('-'));
    }

    #[test]
    fn log_scale_is_reflected_in_header() {
        let observed = vec![(1.0, 10.0), (30.0, 10_000.0)];
        let style = PlotStyle {
            width: 20,
            height: 8,
            log_scale: true,
        };
        let txt = render_plot(&observed, &[], None, 0.5, 45.5, &style);
        assert!(txt.contains("(log)"));
        assert!(txt.contains("cases [10, 10000]"));
    }

    #[test]
    fn points_outside_the_domain_are_clipped() {
        let observed = vec![(60.0, 100.0), (10.0, 50.0), (20.0, 80.0)];
        let style = PlotStyle {
            width: 20,
            height: 8,
            log_scale: false,
        };
        let txt = render_plot(&observed, &[], None, 0.5, 45.5, &style);
        let body: String = txt.lines().skip(1).collect();
        assert_eq!(body.matches('o').count(), 2);
    }
}
