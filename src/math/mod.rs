//! Mathematical utilities: the damped least-squares core of the fitter.

pub mod lsq;

pub use lsq::*;
