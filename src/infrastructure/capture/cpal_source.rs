//! Microphone capture source using cpal
//!
//! The audio callback pushes samples into a bounded queue; `read_frame`
//! blocks on that queue until a full frame is available. If the loop falls
//! behind, the oldest samples are dropped and the next read reports an
//! overrun so the session counts it as a capture error.
//!
//! The stream runs for the life of the source, so the queue also fills
//! while no session is active. `reset` empties it at session start.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SampleRate, StreamConfig};
use tracing::{info, warn};

use super::write_pcm_le;
use crate::application::ports::{CaptureError, CaptureSource};
use crate::domain::recording::{AudioFormat, Duration};

/// Minimum queue depth in frames before the oldest samples are discarded
const MIN_QUEUE_FRAMES: usize = 32;

/// Upper bound on the queued backlog, in seconds of audio
const MAX_BACKLOG_SECS: u64 = 60;

/// Queue limit in samples: room for twice the longest stall of the
/// capture loop, never less than `MIN_QUEUE_FRAMES` frames.
fn queue_limit(format: AudioFormat, max_stall: Duration) -> usize {
    let frame = format.frame_samples();
    let samples_per_sec = u64::from(format.sample_rate()) * u64::from(format.channels());
    let stall_ms = max_stall.as_millis().min(MAX_BACKLOG_SECS * 1000);
    let stall_samples = (samples_per_sec * stall_ms * 2 / 1000) as usize;
    let frames = stall_samples.div_ceil(frame).max(MIN_QUEUE_FRAMES);
    frames * frame
}

/// State shared with the audio callback thread
struct SharedQueue {
    samples: Mutex<VecDeque<i16>>,
    ready: Condvar,
    limit: usize,
    dropped: AtomicU64,
    stream_failed: AtomicBool,
}

impl SharedQueue {
    fn new(limit: usize) -> Self {
        Self {
            samples: Mutex::new(VecDeque::with_capacity(limit)),
            ready: Condvar::new(),
            limit,
            dropped: AtomicU64::new(0),
            stream_failed: AtomicBool::new(false),
        }
    }

    fn push(&self, samples: impl Iterator<Item = i16>) {
        let Ok(mut queue) = self.samples.lock() else {
            return;
        };
        for sample in samples {
            if queue.len() == self.limit {
                queue.pop_front();
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
            queue.push_back(sample);
        }
        self.ready.notify_one();
    }

    /// Drop everything queued along with pending overrun and stream errors
    fn clear(&self) {
        if let Ok(mut queue) = self.samples.lock() {
            queue.clear();
            // Under the lock, so the callback cannot count a drop in between
            self.dropped.store(0, Ordering::Relaxed);
        }
        self.stream_failed.store(false, Ordering::SeqCst);
    }

    /// Wait for `wanted` samples and write them into `buf` as PCM
    fn take_frame(
        &self,
        buf: &mut [u8],
        wanted: usize,
        timeout: Duration,
    ) -> Result<usize, CaptureError> {
        let guard = self
            .samples
            .lock()
            .map_err(|_| CaptureError::Driver("capture queue poisoned".to_string()))?;
        let (mut samples, wait) = self
            .ready
            .wait_timeout_while(guard, timeout.as_std(), |q| {
                q.len() < wanted && !self.stream_failed.load(Ordering::SeqCst)
            })
            .map_err(|_| CaptureError::Driver("capture queue poisoned".to_string()))?;

        if self.stream_failed.swap(false, Ordering::SeqCst) {
            return Err(CaptureError::Driver("audio stream reported an error".to_string()));
        }
        if wait.timed_out() && samples.len() < wanted {
            return Err(CaptureError::Timeout);
        }

        let dropped = self.dropped.swap(0, Ordering::Relaxed);
        let written = write_pcm_le(samples.drain(..wanted), buf);
        if dropped > 0 {
            return Err(CaptureError::Driver(format!(
                "overrun: {} samples dropped",
                dropped
            )));
        }
        Ok(written)
    }
}

/// Capture source reading from the default input device.
///
/// Holds the cpal stream, so it must stay on the thread that created it.
pub struct CpalCaptureSource {
    _stream: cpal::Stream,
    queue: Arc<SharedQueue>,
    frame_samples: usize,
    device_name: String,
}

impl CpalCaptureSource {
    /// Open the default input device and start streaming in `format`.
    ///
    /// `max_stall` is the longest the caller may go between reads; the
    /// queue holds at least twice that much audio.
    pub fn open(format: AudioFormat, max_stall: Duration) -> Result<Self, CaptureError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or(CaptureError::NoAudioDevice)?;
        let device_name = device.name().unwrap_or_else(|_| "default".to_string());

        let (config, sample_format) = Self::input_config(&device, format)?;
        let device_channels = usize::from(config.channels);
        let target_channels = usize::from(format.channels());

        let queue = Arc::new(SharedQueue::new(queue_limit(format, max_stall)));

        let on_error = {
            let queue = Arc::clone(&queue);
            move |err: cpal::StreamError| {
                warn!(error = %err, "Audio stream error");
                queue.stream_failed.store(true, Ordering::SeqCst);
                queue.ready.notify_one();
            }
        };

        let stream = match sample_format {
            SampleFormat::I16 => {
                let queue = Arc::clone(&queue);
                device.build_input_stream(
                    &config,
                    move |data: &[i16], _: &cpal::InputCallbackInfo| {
                        queue.push(remix(data.iter().copied(), device_channels, target_channels));
                    },
                    on_error,
                    None,
                )
            }
            SampleFormat::F32 => {
                let queue = Arc::clone(&queue);
                device.build_input_stream(
                    &config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        let converted = data.iter().map(|&s| f32_to_i16(s));
                        queue.push(remix(converted, device_channels, target_channels));
                    },
                    on_error,
                    None,
                )
            }
            other => {
                return Err(CaptureError::StartFailed(format!(
                    "Unsupported sample format: {:?}",
                    other
                )))
            }
        }
        .map_err(|e| CaptureError::StartFailed(e.to_string()))?;

        stream
            .play()
            .map_err(|e| CaptureError::StartFailed(e.to_string()))?;

        info!(
            device = %device_name,
            sample_rate = format.sample_rate(),
            channels = format.channels(),
            "Audio capture started"
        );

        Ok(Self {
            _stream: stream,
            queue,
            frame_samples: format.frame_samples(),
            device_name,
        })
    }

    /// Pick an i16 or f32 input config running at the requested rate
    fn input_config(
        device: &cpal::Device,
        format: AudioFormat,
    ) -> Result<(StreamConfig, SampleFormat), CaptureError> {
        let rate = format.sample_rate();
        let supported = device
            .supported_input_configs()
            .map_err(|e| CaptureError::StartFailed(format!("Failed to get configs: {}", e)))?;

        let mut best: Option<cpal::SupportedStreamConfigRange> = None;
        for range in supported {
            if !matches!(range.sample_format(), SampleFormat::I16 | SampleFormat::F32) {
                continue;
            }
            if range.min_sample_rate().0 > rate || range.max_sample_rate().0 < rate {
                continue;
            }
            // Stereo capture needs a stereo stream; mono can be mixed down
            let channels_ok = if format.channels() == 1 {
                range.channels() >= 1
            } else {
                range.channels() == format.channels()
            };
            if !channels_ok {
                continue;
            }
            // Prefer the closest channel count, then native i16
            let better = match &best {
                None => true,
                Some(current) => {
                    range.channels() < current.channels()
                        || (range.channels() == current.channels()
                            && range.sample_format() == SampleFormat::I16)
                }
            };
            if better {
                best = Some(range);
            }
        }

        let range = best.ok_or_else(|| {
            CaptureError::StartFailed(format!("No input config supports {} Hz", rate))
        })?;

        let config = StreamConfig {
            channels: range.channels(),
            sample_rate: SampleRate(rate),
            buffer_size: cpal::BufferSize::Default,
        };
        Ok((config, range.sample_format()))
    }
}

impl CaptureSource for CpalCaptureSource {
    fn read_frame(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, CaptureError> {
        let wanted = self.frame_samples.min(buf.len() / 2);
        self.queue.take_frame(buf, wanted, timeout)
    }

    fn reset(&mut self) {
        self.queue.clear();
    }

    fn name(&self) -> &str {
        &self.device_name
    }
}

fn f32_to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * 32767.0) as i16
}

/// Mix interleaved device channels down to mono, or pass through
fn remix(
    samples: impl Iterator<Item = i16>,
    device_channels: usize,
    target_channels: usize,
) -> impl Iterator<Item = i16> {
    let mut samples = samples.peekable();
    std::iter::from_fn(move || {
        samples.peek()?;
        if device_channels == target_channels || target_channels != 1 {
            return samples.next();
        }
        let mut sum: i32 = 0;
        let mut n: i32 = 0;
        for sample in samples.by_ref().take(device_channels) {
            sum += i32::from(sample);
            n += 1;
        }
        Some((sum / n.max(1)) as i16)
    })
}
