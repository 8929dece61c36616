//! Decode adapter
//!
//! Narrow boundary between the pipeline and the audio decoding library
//! (symphonia). Everything the pipeline knows about decoding goes through:
//! - [`init`]: explicit, idempotent process-wide initialization
//! - [`Library::open`]: opens a [`DecodeSession`] that exclusively owns its
//!   format reader, codec decoder and scratch buffer
//! - [`SampleSource::pull`]: pull-based block iteration
//!
//! A session releases every handle it owns when dropped, so early returns
//! and `?` propagation inside the pipeline cannot leak decoder state.

mod session;

pub use session::DecodeSession;

use crate::error::{Error, Result};
use crate::models::AudioInfo;
use once_cell::sync::OnceCell;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use symphonia::core::codecs::CodecRegistry;
use symphonia::core::probe::Probe;
use tracing::info;

/// Fingerprint algorithm revision produced by this library
pub const ALGORITHM_VERSION: &str = "DAMSON";

static LIBRARY: OnceCell<Library> = OnceCell::new();

/// Process-wide decoding library state
///
/// Holds the codec and format registries plus a count of live decode
/// sessions. Immutable after [`init`] apart from the atomic counter.
pub struct Library {
    codecs: &'static CodecRegistry,
    probe: &'static Probe,
    open_sessions: AtomicUsize,
}

/// Initialize the decoding library
///
/// Safe to call any number of times from any thread; only the first call
/// does work. Every call returns the same handle.
pub fn init() -> &'static Library {
    LIBRARY.get_or_init(|| {
        info!(version = ALGORITHM_VERSION, "Initializing audio decode library");
        Library {
            codecs: symphonia::default::get_codecs(),
            probe: symphonia::default::get_probe(),
            open_sessions: AtomicUsize::new(0),
        }
    })
}

impl Library {
    /// Open an audio file for decoding
    ///
    /// # Errors
    /// - `Error::FileNotFound` if `path` is not an existing file
    /// - `Error::DecodeFailure` if the container or codec is not supported
    pub fn open(&'static self, path: &Path) -> Result<DecodeSession> {
        DecodeSession::open(self, path)
    }

    /// Fingerprint algorithm version string
    pub fn version(&self) -> &'static str {
        ALGORITHM_VERSION
    }

    /// Number of decode sessions currently holding decoder resources
    pub fn open_sessions(&self) -> usize {
        self.open_sessions.load(Ordering::SeqCst)
    }

    fn session_opened(&self) {
        self.open_sessions.fetch_add(1, Ordering::SeqCst);
    }

    fn session_closed(&self) {
        self.open_sessions.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Result of one pull from a [`SampleSource`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pull {
    /// `n` frames were written into the block
    Samples(usize),
    /// No new data yet, but the stream is not finished
    Pending,
    /// The stream is exhausted
    EndOfStream,
}

/// A pull-based stream of decoded sample blocks
pub trait SampleSource {
    /// Format metadata, valid from construction onward
    fn info(&self) -> &AudioInfo;

    /// Decode the next block into `block`
    ///
    /// On `Pull::Pending` and `Pull::EndOfStream` the block is left empty.
    /// An `Err` ends the stream; callers must not pull again.
    fn pull(&mut self, block: &mut SampleBlock) -> Result<Pull>;

    /// Size of the encoded source in bytes, if known
    fn byte_len(&self) -> Option<u64> {
        None
    }
}

/// Interleaved `f32` samples for one decoded block
///
/// Reused across pulls so steady-state decoding does not allocate.
#[derive(Debug, Clone, Default)]
pub struct SampleBlock {
    samples: Vec<f32>,
    num_channels: usize,
}

impl SampleBlock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the block contents with `samples` (interleaved)
    ///
    /// # Errors
    /// `Error::ResourceExhausted` if the block cannot grow to fit.
    pub fn fill_interleaved(&mut self, samples: &[f32], num_channels: usize) -> Result<()> {
        self.samples.clear();
        self.samples.try_reserve(samples.len()).map_err(|e| {
            Error::ResourceExhausted(format!("sample block of {} values: {}", samples.len(), e))
        })?;
        self.samples.extend_from_slice(samples);
        self.num_channels = num_channels;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Interleaved samples
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    /// Number of frames (samples per channel)
    pub fn frames(&self) -> usize {
        if self.num_channels == 0 {
            0
        } else {
            self.samples.len() / self.num_channels
        }
    }

    pub fn is_empty(&self) -> bool {
        self.frames() == 0
    }
}
