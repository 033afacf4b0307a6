//! Curve fitting orchestration.
//!
//! Responsibilities:
//!
//! - assemble weighted in-domain observations from the series buffer
//! - run the three-step baseline -> refined -> re-seeded refined protocol
//! - report per-step quality (chi-square, probability, convergence flag)

pub mod engine;

pub use engine::*;
