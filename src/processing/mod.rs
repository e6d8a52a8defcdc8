// src/processing/mod.rs
//! Windowed quality grading pipeline stages

pub mod aggregator;
pub mod cleaning;
pub mod mapper;
pub mod scheduler;
pub mod scorer;

pub use aggregator::{AccumulationBuffer, IndexMapping, IntervalMapping, SampleMapping};
pub use cleaning::{EcgCleaner, NoopCleaner, SignalCleaner};
pub use mapper::{QualityClass, QualityMapper, QualityOutput, QualitySegment, QualityValues};
pub use scheduler::WindowPlan;
pub use scorer::{window_range, WindowScore, WindowScorer};
