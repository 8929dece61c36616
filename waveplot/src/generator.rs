//! Streaming generation pipeline
//!
//! Pulls blocks from a [`SampleSource`] into a [`WaveformAccumulator`] until
//! end of stream. The source is taken by value and dropped before this
//! function returns, on success and on every error path.

use crate::decode::{Pull, SampleBlock, SampleSource};
use crate::dsp::WaveformAccumulator;
use crate::error::Result;
use crate::models::{Version, WaveformData};
use tracing::debug;

/// Decode `source` to completion and build the waveform data
///
/// When the source could not report its duration up front, duration and bit
/// rate are filled in from the number of frames actually decoded.
///
/// # Errors
/// Any error from the source or the accumulator aborts the run; nothing
/// accumulated so far is returned.
pub fn generate_from_source<S: SampleSource>(mut source: S, version: Version) -> Result<WaveformData> {
    let mut info = source.info().clone();
    let mut accumulator = WaveformAccumulator::new(&info)?;
    let mut block = SampleBlock::new();
    let mut pending = 0usize;

    loop {
        match source.pull(&mut block)? {
            Pull::Samples(_) => accumulator.push(&block)?,
            Pull::Pending => pending += 1,
            Pull::EndOfStream => break,
        }
    }

    let finalized = accumulator.finish()?;

    if info.duration_secs == 0 && info.sample_rate > 0 {
        let duration_secs = finalized.frames / u64::from(info.sample_rate);
        info.duration_secs = duration_secs as u32;
        if info.bit_rate == 0 && duration_secs > 0 {
            if let Some(len) = source.byte_len() {
                info.bit_rate = (len * 8 / duration_secs) as u32;
            }
        }
    }

    debug!(
        columns = finalized.full.len(),
        pending_pulls = pending,
        "Decoded stream to end"
    );

    Ok(WaveformData::new(info, finalized.dr_level, finalized.full, version))
}
