//! Audio capture adapters

mod cpal_source;
mod synthetic;

pub use cpal_source::CpalCaptureSource;
pub use synthetic::SyntheticCaptureSource;

/// Write samples as 16-bit little-endian PCM, returning bytes written
pub(crate) fn write_pcm_le(samples: impl IntoIterator<Item = i16>, buf: &mut [u8]) -> usize {
    let mut written = 0;
    for (sample, slot) in samples.into_iter().zip(buf.chunks_exact_mut(2)) {
        slot.copy_from_slice(&sample.to_le_bytes());
        written += 2;
    }
    written
}
