//! Audio test fixture generator
//!
//! Writes small WAV files with hound so decode tests run against real
//! container and codec parsing.

use std::path::{Path, PathBuf};

/// Configuration for generated audio
#[derive(Debug, Clone)]
pub struct AudioConfig {
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    /// Peak amplitude as a fraction of full scale
    pub amplitude: f32,
    pub frequency: f32,
    /// Second half of the file is silent when set
    pub fade_to_silence: bool,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            duration_seconds: 2.0,
            sample_rate: 44100,
            channels: 2,
            amplitude: 0.3,
            frequency: 441.0,
            fade_to_silence: false,
        }
    }
}

/// Generate a 16-bit PCM WAV file
pub fn generate_test_wav(path: &Path, config: &AudioConfig) -> anyhow::Result<PathBuf> {
    let spec = hound::WavSpec {
        channels: config.channels,
        sample_rate: config.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    let total_frames = (config.duration_seconds * config.sample_rate as f64) as usize;

    for i in 0..total_frames {
        let sample = if config.fade_to_silence && i >= total_frames / 2 {
            0
        } else {
            let t = i as f32 / config.sample_rate as f32;
            (config.amplitude
                * (2.0 * std::f32::consts::PI * config.frequency * t).sin()
                * i16::MAX as f32) as i16
        };

        for _ in 0..config.channels {
            writer.write_sample(sample)?;
        }
    }

    writer.finalize()?;
    Ok(path.to_path_buf())
}

/// Write bytes no decoder recognises
pub fn write_garbage(path: &Path) -> anyhow::Result<PathBuf> {
    std::fs::write(path, "this is not audio data\n".repeat(200))?;
    Ok(path.to_path_buf())
}
