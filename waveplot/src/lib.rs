//! waveplot - audio fingerprinting and registry sync
//!
//! Decodes an audio file into a full-resolution amplitude waveform, derives
//! preview/thumbnail images and compact hashes from it, and exchanges the
//! result with a WavePlot registry.

pub mod decode;
pub mod dsp;
pub mod error;
pub mod fingerprint;
pub mod generator;
pub mod models;
pub mod sync;

pub use crate::error::{Error, Result};
pub use crate::models::{AudioInfo, Version, WavePlot, WavePlotSummary, WaveformData};
pub use crate::sync::{LinkContext, Registration, RegistryClient};
