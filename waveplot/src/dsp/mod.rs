//! Signal processing primitives for WavePlot generation
//!
//! - [`waveform`]: streaming amplitude accumulation and the 8-bit fixed-point
//!   representation of the full-resolution waveform
//! - [`dynamic_range`]: incremental peak/RMS tracking and the DR rating
//! - [`resample`]: fixed-width downsampling for preview and thumbnail images

pub mod dynamic_range;
pub mod resample;
pub mod waveform;

pub use dynamic_range::DynamicRangeAccumulator;
pub use resample::{resample, to_bytes};
pub use waveform::{dequantize, quantize, FinalizedWaveform, WaveformAccumulator, AMPLITUDE_SCALE};

/// Target dimensions of a rendered waveform image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageShape {
    pub width: usize,
    pub height: usize,
}

impl ImageShape {
    /// Vertical scale passed to the resampler (half the image height,
    /// since the image mirrors around its centre line)
    pub const fn resample_height(&self) -> usize {
        self.height / 2
    }
}

/// Preview image: 400 × 151
pub const PREVIEW: ImageShape = ImageShape {
    width: 400,
    height: 151,
};

/// Thumbnail image: 50 × 21
pub const THUMBNAIL: ImageShape = ImageShape {
    width: 50,
    height: 21,
};
