//! Input parsing and result export.
//!
//! - `dates`: day-index to calendar-date mapping
//! - `ingest`: line-oriented input -> fixed-length series buffer
//! - `export`: per-bin results CSV
//! - `fit_file`: portable fit JSON (re-loadable for plotting)

pub mod dates;
pub mod export;
pub mod fit_file;
pub mod ingest;
