//! Terminal plotting (the rendering consumer of the core outputs).

pub mod ascii;

pub use ascii::*;
