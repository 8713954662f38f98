//! Pipeline module - loading and the statistical analyzers

pub mod anomaly;
pub mod benford;
pub mod correlation;
pub mod isolation_forest;
pub mod loader;
pub mod missing;

pub use anomaly::*;
pub use benford::*;
pub use correlation::*;
pub use isolation_forest::*;
pub use loader::*;
pub use missing::*;
