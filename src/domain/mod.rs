//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the series buffer (`CaseSeries`, `CaseBin`)
//! - fitted-model outputs (`FitResult`, `GrowthModel`, `FitSequence`)
//! - derived series points (`ResidualPoint`, `ForecastPoint`)
//! - run configuration (`FitConfig`) and the saved fit file schema

pub mod types;

pub use types::*;
