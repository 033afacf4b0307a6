//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - runs the fit pipeline (in parallel across input files)
//! - prints reports/plots
//! - writes optional exports

use std::io::Write;

use clap::Parser;
use rayon::prelude::*;

use crate::cli::{Command, FitArgs, PlotArgs, SampleArgs};
use crate::data::{generate_sample, SampleOptions};
use crate::domain::FitConfig;
use crate::error::AppError;
use crate::plot::PlotStyle;

pub mod pipeline;

/// Entry point for the `epifit` binary.
pub fn run() -> Result<(), AppError> {
    // We want `epifit data/IT.txt` to behave like `epifit fit data/IT.txt`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of
    // the argv list before parsing. This preserves a clean clap structure
    // while retaining the shorthand UX.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Fit(args) => handle_fit(args, OutputMode::Full),
        Command::Forecast(args) => handle_fit(args, OutputMode::ForecastOnly),
        Command::Plot(args) => handle_plot(args),
        Command::Sample(args) => handle_sample(args),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Full,
    ForecastOnly,
}

fn handle_fit(args: FitArgs, mode: OutputMode) -> Result<(), AppError> {
    let configs = fit_configs_from_args(&args)?;

    // Each run is strictly sequential internally (fit step 2 depends on step
    // 1, step 3 on step 2), but runs own their data exclusively, so separate
    // input files fit in parallel.
    let runs: Vec<Result<pipeline::RunOutput, AppError>> =
        configs.par_iter().map(pipeline::run_fit).collect();

    for (config, run) in configs.iter().zip(runs) {
        let run = run?;

        match mode {
            OutputMode::Full => {
                println!(
                    "{}",
                    crate::report::format::format_run_summary(&run.ingest, &run.fits, config)
                );
                println!("{}", crate::report::format::format_outliers(&run.outliers));
            }
            OutputMode::ForecastOnly => {}
        }

        println!(
            "{}",
            crate::report::format::format_forecasts(&run.forecasts, config.top_n)
        );

        if mode == OutputMode::Full && config.plot {
            let style = PlotStyle {
                width: config.plot_width,
                height: config.plot_height,
                log_scale: config.log_scale,
            };
            let plot = crate::plot::render_series_plot(
                &run.ingest.series,
                &run.fits,
                &run.forecasts,
                &style,
            );
            println!("{plot}");
        }

        if let Some(path) = &config.export_results {
            crate::io::export::write_results_csv(
                path,
                &run.ingest.series,
                &run.fits,
                &run.residuals,
                &run.forecasts,
            )?;
        }
        if let Some(path) = &config.export_fit {
            crate::io::fit_file::write_fit_json(
                path,
                &config.label,
                &run.ingest,
                &run.fits,
                &run.residuals,
                &run.forecasts,
            )?;
        }
    }

    Ok(())
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let fit = crate::io::fit_file::read_fit_json(&args.fit)?;
    let style = PlotStyle {
        width: args.width,
        height: args.height,
        log_scale: args.log,
    };

    println!("{}", crate::plot::render_plot_from_fit_file(&fit, &style));
    Ok(())
}

fn handle_sample(args: SampleArgs) -> Result<(), AppError> {
    let text = generate_sample(&SampleOptions {
        days: args.days,
        base: args.base,
        growth: args.growth,
        damping: args.damping,
        seed: args.seed,
    })?;

    match &args.out {
        Some(path) => {
            let mut file = std::fs::File::create(path).map_err(|e| {
                AppError::usage(format!("Failed to create '{}': {e}", path.display()))
            })?;
            file.write_all(text.as_bytes())
                .map_err(|e| AppError::usage(format!("Failed to write sample: {e}")))?;
        }
        None => print!("{text}"),
    }
    Ok(())
}

pub fn fit_configs_from_args(args: &FitArgs) -> Result<Vec<FitConfig>, AppError> {
    if args.inputs.len() > 1 {
        if args.label.is_some() {
            return Err(AppError::usage(
                "`--label` requires a single input file; labels default to file stems.",
            ));
        }
        if args.export.is_some() || args.export_fit.is_some() {
            return Err(AppError::usage(
                "`--export`/`--export-fit` require a single input file.",
            ));
        }
    }

    let configs = args
        .inputs
        .iter()
        .map(|input| {
            let label = match &args.label {
                Some(label) => label.clone(),
                None => input
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| input.display().to_string()),
            };
            FitConfig {
                input: input.clone(),
                label,
                anchor: args.anchor.clone(),
                bins: args.bins,
                fit_days: args.fit_days,
                max_iter: args.max_iter,
                top_n: args.top,
                plot: args.plot && !args.no_plot,
                plot_width: args.width,
                plot_height: args.height,
                log_scale: args.log,
                export_results: args.export.clone(),
                export_fit: args.export_fit.clone(),
            }
        })
        .collect();

    Ok(configs)
}

/// Rewrite argv so a bare input path defaults to the `fit` subcommand.
///
/// Rules:
/// - `epifit`                        -> unchanged (clap prints usage)
/// - `epifit data.txt ...`           -> `epifit fit data.txt ...`
/// - `epifit --help/--version/-h`    -> unchanged
/// - `epifit fit/forecast/plot/...`  -> unchanged
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        return argv;
    };

    let is_top_level_help_or_version =
        matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "fit" | "forecast" | "plot" | "sample");
    if is_subcommand {
        return argv;
    }

    // Anything else (a path or a flag) is treated as "fit arguments".
    argv.insert(1, "fit".to_string());
    argv
}
