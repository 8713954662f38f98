//! Report module - charts and terminal tables for analysis results

pub mod chart;
pub mod display;
pub mod summary;

pub use chart::*;
pub use display::*;
pub use summary::*;
