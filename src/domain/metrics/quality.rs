//! Session-wide quality accumulator

use super::level::{analyze_frame, FrameAnalysis};

/// Default level below which a frame counts as silent
pub const DEFAULT_SILENCE_THRESHOLD_DB: f64 = -40.0;

/// Running statistics over every frame of the current session.
///
/// Level bounds are `None` until a frame has produced them, so an
/// untouched session never reports a misleading zero.
#[derive(Debug, Clone, PartialEq)]
pub struct QualityMetrics {
    silence_threshold_db: f64,
    avg_db: Option<f64>,
    max_db: Option<f64>,
    min_db: Option<f64>,
    clip_count: u32,
    silence_count: u32,
    error_count: u32,
    total_chunks: u32,
}

impl QualityMetrics {
    pub fn new(silence_threshold_db: f64) -> Self {
        Self {
            silence_threshold_db,
            avg_db: None,
            max_db: None,
            min_db: None,
            clip_count: 0,
            silence_count: 0,
            error_count: 0,
            total_chunks: 0,
        }
    }

    /// Clear all statistics; the silence threshold is kept
    pub fn reset(&mut self) {
        *self = Self::new(self.silence_threshold_db);
    }

    /// Fold one frame of samples into the statistics
    pub fn observe(&mut self, samples: &[i16]) -> Option<FrameAnalysis> {
        self.observe_samples(samples.iter().copied())
    }

    /// Fold one frame of 16-bit little-endian PCM bytes into the statistics.
    /// A trailing odd byte is ignored.
    pub fn observe_pcm_le(&mut self, bytes: &[u8]) -> Option<FrameAnalysis> {
        self.observe_samples(
            bytes
                .chunks_exact(2)
                .map(|pair| i16::from_le_bytes([pair[0], pair[1]])),
        )
    }

    fn observe_samples<I>(&mut self, samples: I) -> Option<FrameAnalysis>
    where
        I: IntoIterator<Item = i16>,
    {
        let analysis = analyze_frame(samples)?;
        self.observe_analysis(&analysis).then_some(analysis)
    }

    /// Fold a pre-computed frame analysis into the statistics.
    ///
    /// Returns false (and changes nothing) when the frame's level is not a
    /// finite value inside the accepted range.
    pub fn observe_analysis(&mut self, analysis: &FrameAnalysis) -> bool {
        if !analysis.has_valid_db() {
            return false;
        }
        let db = analysis.db;

        self.total_chunks += 1;
        let total = f64::from(self.total_chunks);
        let previous = self.avg_db.unwrap_or(0.0);
        self.avg_db = Some((previous * (total - 1.0) + db) / total);

        if !analysis.is_digital_silence {
            self.max_db = Some(self.max_db.map_or(db, |max| max.max(db)));
            self.min_db = Some(self.min_db.map_or(db, |min| min.min(db)));
        }

        if analysis.is_clipped() {
            self.clip_count += 1;
        }
        if db < self.silence_threshold_db {
            self.silence_count += 1;
        }

        true
    }

    /// Count a failed capture read; no level statistics change
    pub fn record_capture_error(&mut self) {
        self.error_count += 1;
    }

    pub fn silence_threshold_db(&self) -> f64 {
        self.silence_threshold_db
    }

    pub fn avg_db(&self) -> Option<f64> {
        self.avg_db
    }

    pub fn max_db(&self) -> Option<f64> {
        self.max_db
    }

    pub fn min_db(&self) -> Option<f64> {
        self.min_db
    }

    pub fn clip_count(&self) -> u32 {
        self.clip_count
    }

    pub fn silence_count(&self) -> u32 {
        self.silence_count
    }

    pub fn error_count(&self) -> u32 {
        self.error_count
    }

    pub fn total_chunks(&self) -> u32 {
        self.total_chunks
    }
}

impl Default for QualityMetrics {
    fn default() -> Self {
        Self::new(DEFAULT_SILENCE_THRESHOLD_DB)
    }
}
