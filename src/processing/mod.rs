// src/processing/mod.rs
pub mod change;
pub mod classify;
pub mod correlation;
pub mod indices;
pub mod pipeline;
pub mod stats;

// Re-export main components
pub use change::change_raster;
pub use classify::{classify, CategoryGrid, LandCover, ThresholdContext};
pub use correlation::{analyze_correlation, CorrelationOutcome};
pub use indices::{IndexCalculator, IndexGrid, IndexSample, Observation, NDI};
pub use pipeline::{AnalysisBundle, AnalysisPipeline};
pub use stats::{area_statistics, AreaStatistics};
