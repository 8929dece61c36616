//! Fingerprint derivation
//!
//! Two independent fingerprints of a finalized waveform:
//! - the content hash, SHA-1 over the stored bytes, used as an identity and
//!   tamper check
//! - the sonic hash, a 16-bit perceptual summary of the preview-shaped
//!   amplitude envelope

use crate::dsp::{dequantize, resample, PREVIEW};
use sha1::{Digest, Sha1};

/// Number of bits in a sonic hash
pub const SONIC_HASH_BITS: usize = 16;

/// SHA-1 of the full-resolution waveform as 40 lower-case hex characters
pub fn content_hash(full: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(full);
    format!("{:x}", hasher.finalize())
}

/// 16-bit perceptual hash of the full-resolution waveform
///
/// The waveform is resampled to the preview shape without truncation and the
/// 400 columns are split into 16 segments of 25. Bit `15 - k` is set when
/// segment `k` is louder on average than the whole preview.
pub fn sonic_hash(full: &[u8]) -> u16 {
    let values: Vec<f32> = full.iter().map(|&b| dequantize(b)).collect();
    let columns = resample(&values, PREVIEW.width, PREVIEW.resample_height());
    hash_columns(&columns)
}

fn hash_columns(columns: &[f32]) -> u16 {
    if columns.is_empty() {
        return 0;
    }

    let overall = columns.iter().sum::<f32>() / columns.len() as f32;
    let segment_len = (columns.len() / SONIC_HASH_BITS).max(1);

    columns
        .chunks(segment_len)
        .take(SONIC_HASH_BITS)
        .enumerate()
        .fold(0u16, |hash, (k, segment)| {
            let mean = segment.iter().sum::<f32>() / segment.len() as f32;
            if mean > overall {
                hash | (1 << (SONIC_HASH_BITS - 1 - k))
            } else {
                hash
            }
        })
}
