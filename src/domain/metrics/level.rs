//! Per-frame level analysis for 16-bit PCM

/// Reference amplitude for 0 dBFS
pub const FULL_SCALE: f64 = 32768.0;

/// Absolute sample value at or above which a sample counts as clipped
pub const CLIP_SAMPLE_THRESHOLD: i32 = 30_000;

/// Fraction of clipped samples above which the whole frame is clipped
pub const CLIP_FRACTION_THRESHOLD: f64 = 0.01;

/// Level reported for a frame of digital silence (RMS of exactly zero)
pub const QUIET_FLOOR_DB: f64 = -120.0;

/// Lowest dB value accepted into the statistics
pub const MIN_VALID_DB: f64 = -200.0;

/// Highest dB value accepted into the statistics
pub const MAX_VALID_DB: f64 = 100.0;

/// Level and clipping of one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameAnalysis {
    pub rms: f64,
    pub db: f64,
    /// True when `rms` was zero and `db` is the quiet floor
    pub is_digital_silence: bool,
    pub clipped_samples: usize,
    pub sample_count: usize,
}

impl FrameAnalysis {
    /// Whether the clipped-sample fraction exceeds the clip threshold
    pub fn is_clipped(&self) -> bool {
        self.sample_count > 0
            && (self.clipped_samples as f64 / self.sample_count as f64) > CLIP_FRACTION_THRESHOLD
    }

    /// Whether `db` is usable for aggregation
    pub fn has_valid_db(&self) -> bool {
        self.db.is_finite() && (MIN_VALID_DB..=MAX_VALID_DB).contains(&self.db)
    }
}

/// Analyze one frame of samples in a single pass.
///
/// Returns `None` for an empty frame.
pub fn analyze_frame<I>(samples: I) -> Option<FrameAnalysis>
where
    I: IntoIterator<Item = i16>,
{
    let mut sum_squares = 0.0f64;
    let mut sample_count = 0usize;
    let mut clipped_samples = 0usize;

    for sample in samples {
        let value = i32::from(sample);
        sum_squares += f64::from(value) * f64::from(value);
        sample_count += 1;
        if value.abs() >= CLIP_SAMPLE_THRESHOLD {
            clipped_samples += 1;
        }
    }

    if sample_count == 0 {
        return None;
    }

    let rms = (sum_squares / sample_count as f64).sqrt();
    let (db, is_digital_silence) = if rms == 0.0 {
        (QUIET_FLOOR_DB, true)
    } else if rms > FULL_SCALE {
        (0.0, false)
    } else {
        (20.0 * (rms / FULL_SCALE).log10(), false)
    };

    Some(FrameAnalysis {
        rms,
        db,
        is_digital_silence,
        clipped_samples,
        sample_count,
    })
}
