pub mod drift_analyzer;

pub use drift_analyzer::{DriftAnalyzer, DriftStatistics, SpeedStats};
