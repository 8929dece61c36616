//! WavePlot data model

mod version;
mod waveplot;

pub use version::{UnknownVersion, Version};
pub use waveplot::{AudioInfo, WavePlot, WavePlotSummary, WaveformData};
