//! Growth-model evaluation primitives (prediction and Jacobian rows).

pub mod model;

pub use model::*;
