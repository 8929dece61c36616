//! Dynamic-range rating
//!
//! Incremental DR measurement in the style of the DR14 meter:
//! 1. Each channel is cut into 3-second windows. A window records its RMS,
//!    `sqrt(2 * mean(x²))`, and its peak `|x|`. A trailing partial window
//!    counts when non-empty.
//! 2. Per channel, the loudest 20% of window RMS values (at least one) are
//!    combined as `sqrt(mean(rms²))`, and the second-highest window peak is
//!    taken (the highest when there is only one window).
//! 3. Channel DR is `20 * log10(peak / rms)`; the rating is the mean over
//!    channels, clamped to `[0, 100]`. Silent channels rate 0.

use crate::decode::SampleBlock;
use crate::error::{Error, Result};

/// Window length in seconds
const WINDOW_SECONDS: u32 = 3;

/// Fraction of loudest windows used for the RMS term
const LOUDEST_FRACTION: f64 = 0.2;

const MAX_RATING: f32 = 100.0;

#[derive(Debug, Default)]
struct ChannelWindows {
    sum_squares: f64,
    peak: f32,
    window_rms: Vec<f64>,
    window_peaks: Vec<f32>,
}

impl ChannelWindows {
    fn close_window(&mut self, frames: usize) -> Result<()> {
        self.window_rms
            .try_reserve(1)
            .and_then(|_| self.window_peaks.try_reserve(1))
            .map_err(|e| Error::ResourceExhausted(format!("dynamic range windows: {}", e)))?;

        self.window_rms
            .push((2.0 * self.sum_squares / frames as f64).sqrt());
        self.window_peaks.push(self.peak);
        self.sum_squares = 0.0;
        self.peak = 0.0;
        Ok(())
    }

    fn rating(&mut self) -> f64 {
        if self.window_rms.is_empty() {
            return 0.0;
        }

        self.window_rms.sort_by(|a, b| b.total_cmp(a));
        let loudest = ((self.window_rms.len() as f64 * LOUDEST_FRACTION) as usize).max(1);
        let mean_square =
            self.window_rms[..loudest].iter().map(|r| r * r).sum::<f64>() / loudest as f64;
        let rms = mean_square.sqrt();

        self.window_peaks.sort_by(|a, b| b.total_cmp(a));
        let peak = f64::from(
            self.window_peaks
                .get(1)
                .copied()
                .unwrap_or(self.window_peaks[0]),
        );

        if rms <= 0.0 || peak <= 0.0 {
            return 0.0;
        }

        20.0 * (peak / rms).log10()
    }
}

/// Running peak/RMS state for every channel of a stream
#[derive(Debug)]
pub struct DynamicRangeAccumulator {
    channels: Vec<ChannelWindows>,
    window_frames: usize,
    frames_in_window: usize,
    processed_frames: u64,
}

impl DynamicRangeAccumulator {
    /// Create an accumulator for `num_channels` channels at `sample_rate` Hz
    ///
    /// # Errors
    /// `Error::DecodeFailure` if `sample_rate` is zero.
    pub fn new(num_channels: usize, sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(Error::DecodeFailure("stream reports zero sample rate".to_string()));
        }

        let mut channels = Vec::new();
        channels.resize_with(num_channels, ChannelWindows::default);

        Ok(Self {
            channels,
            window_frames: (sample_rate * WINDOW_SECONDS) as usize,
            frames_in_window: 0,
            processed_frames: 0,
        })
    }

    /// Feed one interleaved block
    pub fn push(&mut self, block: &SampleBlock) -> Result<()> {
        let num_channels = self.channels.len();
        if num_channels == 0 {
            return Ok(());
        }

        for frame in block.samples().chunks_exact(num_channels) {
            for (channel, &sample) in self.channels.iter_mut().zip(frame) {
                let value = f64::from(sample);
                channel.sum_squares += value * value;
                channel.peak = channel.peak.max(sample.abs());
            }

            self.frames_in_window += 1;
            self.processed_frames += 1;

            if self.frames_in_window == self.window_frames {
                for channel in &mut self.channels {
                    channel.close_window(self.window_frames)?;
                }
                self.frames_in_window = 0;
            }
        }

        Ok(())
    }

    /// Total frames seen so far
    pub fn processed_frames(&self) -> u64 {
        self.processed_frames
    }

    /// Flush the partial window and compute the rating
    ///
    /// # Errors
    /// `Error::ResourceExhausted` if the trailing window cannot be recorded.
    pub fn finish(mut self) -> Result<f32> {
        if self.frames_in_window > 0 {
            let frames = self.frames_in_window;
            for channel in &mut self.channels {
                channel.close_window(frames)?;
            }
        }

        if self.channels.is_empty() {
            return Ok(0.0);
        }

        let total: f64 = self.channels.iter_mut().map(|c| c.rating()).sum();
        let rating = (total / self.channels.len() as f64) as f32;
        Ok(rating.clamp(0.0, MAX_RATING))
    }
}
