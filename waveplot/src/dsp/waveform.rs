//! Full-resolution waveform accumulation
//!
//! The accumulator appends one amplitude column per decoded block: the mean
//! absolute sample value over every channel and frame of the block. Columns
//! are stored as 8-bit fixed point, `(200.0 * value) as u8`. Stored and
//! retrieved waveforms depend on this exact scale and on truncation, so
//! neither may change.

use super::dynamic_range::DynamicRangeAccumulator;
use crate::decode::SampleBlock;
use crate::error::{Error, Result};
use crate::models::AudioInfo;
use tracing::debug;

/// Fixed-point scale of the full-resolution waveform
pub const AMPLITUDE_SCALE: f32 = 200.0;

/// Convert an amplitude to its stored byte (truncating, saturating)
pub fn quantize(value: f32) -> u8 {
    (AMPLITUDE_SCALE * value) as u8
}

/// Convert a stored byte back to an amplitude
pub fn dequantize(value: u8) -> f32 {
    f32::from(value) / AMPLITUDE_SCALE
}

/// Output of a completed accumulation run
#[derive(Debug, Clone, PartialEq)]
pub struct FinalizedWaveform {
    /// One quantized column per non-empty decoded block
    pub full: Vec<u8>,
    /// Dynamic-range rating of the whole stream
    pub dr_level: f32,
    /// Decoded frames (samples per channel) across all blocks
    pub frames: u64,
}

/// Accumulator in the decoding state
///
/// Created from format metadata, fed blocks via [`push`](Self::push), and
/// consumed by [`finish`](Self::finish). Dropping it without finishing
/// discards everything accumulated so far.
#[derive(Debug)]
pub struct WaveformAccumulator {
    columns: Vec<u8>,
    dynamic_range: DynamicRangeAccumulator,
    num_channels: usize,
}

impl WaveformAccumulator {
    /// Start accumulating a stream described by `info`
    ///
    /// # Errors
    /// `Error::DecodeFailure` if the stream reports no channels or no
    /// sample rate.
    pub fn new(info: &AudioInfo) -> Result<Self> {
        let num_channels = usize::from(info.num_channels);
        if num_channels == 0 {
            return Err(Error::DecodeFailure("stream reports zero channels".to_string()));
        }

        Ok(Self {
            columns: Vec::new(),
            dynamic_range: DynamicRangeAccumulator::new(num_channels, info.sample_rate)?,
            num_channels,
        })
    }

    /// Add one decoded block
    ///
    /// Empty blocks are ignored.
    ///
    /// # Errors
    /// - `Error::DecodeFailure` if the block's channel count differs from the
    ///   stream's
    /// - `Error::ResourceExhausted` if the column buffer cannot grow
    pub fn push(&mut self, block: &SampleBlock) -> Result<()> {
        if block.is_empty() {
            return Ok(());
        }

        if block.num_channels() != self.num_channels {
            return Err(Error::DecodeFailure(format!(
                "block has {} channels, stream has {}",
                block.num_channels(),
                self.num_channels
            )));
        }

        self.columns
            .try_reserve(1)
            .map_err(|e| Error::ResourceExhausted(format!("waveform buffer: {}", e)))?;
        self.columns.push(quantize(column_value(block.samples())));

        self.dynamic_range.push(block)
    }

    /// Number of columns accumulated so far
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Freeze the columns and flush the dynamic-range rating
    ///
    /// # Errors
    /// `Error::ResourceExhausted` if the dynamic-range flush cannot allocate.
    pub fn finish(self) -> Result<FinalizedWaveform> {
        let frames = self.dynamic_range.processed_frames();
        let dr_level = self.dynamic_range.finish()?;

        debug!(
            columns = self.columns.len(),
            frames = frames,
            dr_level = dr_level,
            "Waveform accumulation finished"
        );

        Ok(FinalizedWaveform {
            full: self.columns,
            dr_level,
            frames,
        })
    }
}

/// Mean absolute amplitude, clamped to [0, 1]
fn column_value(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f32 = samples.iter().map(|s| s.abs()).sum();
    (sum / samples.len() as f32).clamp(0.0, 1.0)
}
