//! Streaming signal-quality statistics

mod level;
mod quality;

pub use level::{
    analyze_frame, FrameAnalysis, CLIP_FRACTION_THRESHOLD, CLIP_SAMPLE_THRESHOLD, FULL_SCALE,
    MAX_VALID_DB, MIN_VALID_DB, QUIET_FLOOR_DB,
};
pub use quality::{QualityMetrics, DEFAULT_SILENCE_THRESHOLD_DB};
