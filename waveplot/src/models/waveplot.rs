//! The WavePlot entity

use super::Version;
use crate::decode::{Library, SampleSource};
use crate::dsp::{dequantize, resample, to_bytes, PREVIEW, THUMBNAIL};
use crate::error::{Error, Result};
use crate::fingerprint;
use crate::generator::generate_from_source;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

/// Format metadata reported by the decoder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioInfo {
    /// Whole seconds, truncated
    pub duration_secs: u32,
    pub num_channels: u8,
    /// Bits per sample, 0 if the codec does not say
    pub bit_depth: u16,
    /// Bits per second, 0 if unknown
    pub bit_rate: u32,
    pub sample_rate: u32,
    /// Short source type tag, e.g. `flac`
    pub file_format: String,
}

/// Full-resolution waveform plus everything populated alongside it
///
/// Built in one step by generation or retrieval, never field by field, and
/// immutable afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveformData {
    info: AudioInfo,
    dr_level: f32,
    full: Vec<u8>,
    version: Version,
}

impl WaveformData {
    pub fn new(info: AudioInfo, dr_level: f32, full: Vec<u8>, version: Version) -> Self {
        Self {
            info,
            dr_level,
            full,
            version,
        }
    }

    pub fn info(&self) -> &AudioInfo {
        &self.info
    }

    pub fn dr_level(&self) -> f32 {
        self.dr_level
    }

    /// Quantized amplitude columns
    pub fn full(&self) -> &[u8] {
        &self.full
    }

    pub fn version(&self) -> Version {
        self.version
    }

    /// Columns converted back to amplitudes
    pub fn amplitudes(&self) -> Vec<f32> {
        self.full.iter().map(|&b| dequantize(b)).collect()
    }
}

/// Fingerprint of one audio source
///
/// Created empty, then populated exactly once by [`generate`](Self::generate)
/// or by retrieval from the registry. Preview, thumbnail and hashes are
/// derived on demand from the full waveform.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WavePlot {
    gid: Option<Uuid>,
    data: Option<WaveformData>,
    image_hash: Option<String>,
    preview: Option<Vec<u8>>,
    thumbnail: Option<Vec<u8>>,
    sonic_hash: Option<u16>,
    path: Option<PathBuf>,
}

impl WavePlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate from a local audio file
    ///
    /// On error the entity is left empty.
    ///
    /// # Errors
    /// - `Error::PreconditionViolation` if already populated
    /// - `Error::FileNotFound`, `Error::DecodeFailure`, `Error::ResourceExhausted`
    pub fn generate(&mut self, library: &'static Library, audio_path: impl AsRef<Path>) -> Result<()> {
        self.ensure_empty()?;

        let audio_path = audio_path.as_ref();
        let path = std::fs::canonicalize(audio_path).map_err(|e| path_error(audio_path, e))?;

        let version = library
            .version()
            .parse::<Version>()
            .map_err(|e| Error::DecodeFailure(e.to_string()))?;

        let session = library.open(&path)?;
        let data = generate_from_source(session, version)?;

        info!(
            path = %path.display(),
            columns = data.full().len(),
            duration_secs = data.info().duration_secs,
            dr_level = data.dr_level(),
            "Generated waveplot"
        );

        self.data = Some(data);
        self.path = Some(path);
        Ok(())
    }

    /// Generate from any sample source
    ///
    /// # Errors
    /// As [`generate`](Self::generate), minus the file lookup.
    pub fn generate_from<S: SampleSource>(&mut self, source: S, version: Version) -> Result<()> {
        self.ensure_empty()?;
        self.data = Some(generate_from_source(source, version)?);
        Ok(())
    }

    /// Wrap a waveform computed elsewhere (no identifier, no path)
    pub fn from_waveform(data: WaveformData) -> Self {
        Self {
            data: Some(data),
            ..Self::default()
        }
    }

    /// True once generation or retrieval has populated the waveform
    pub fn is_populated(&self) -> bool {
        self.data.is_some()
    }

    pub fn gid(&self) -> Option<Uuid> {
        self.gid
    }

    pub fn waveform(&self) -> Option<&WaveformData> {
        self.data.as_ref()
    }

    pub fn full(&self) -> Option<&[u8]> {
        self.data.as_ref().map(|d| d.full())
    }

    /// Server-confirmed image hash (hex SHA-1)
    pub fn image_hash(&self) -> Option<&str> {
        self.image_hash.as_deref()
    }

    pub fn preview(&self) -> Option<&[u8]> {
        self.preview.as_deref()
    }

    pub fn thumbnail(&self) -> Option<&[u8]> {
        self.thumbnail.as_deref()
    }

    pub fn sonic_hash(&self) -> Option<u16> {
        self.sonic_hash
    }

    /// Local file this waveplot was generated from (not sent to the registry)
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Waveform data, or a precondition violation if not populated
    pub fn require_waveform(&self) -> Result<&WaveformData> {
        self.data
            .as_ref()
            .ok_or(Error::PreconditionViolation("waveform has not been generated or retrieved"))
    }

    /// SHA-1 of the full waveform, computed locally
    pub fn content_hash(&self) -> Result<String> {
        Ok(fingerprint::content_hash(self.require_waveform()?.full()))
    }

    /// Compute and store the 400-column preview
    pub fn generate_preview(&mut self) -> Result<&[u8]> {
        let columns = resample(
            &self.require_waveform()?.amplitudes(),
            PREVIEW.width,
            PREVIEW.resample_height(),
        );
        Ok(self.preview.insert(to_bytes(&columns)).as_slice())
    }

    /// Compute and store the 50-column thumbnail
    pub fn generate_thumbnail(&mut self) -> Result<&[u8]> {
        let columns = resample(
            &self.require_waveform()?.amplitudes(),
            THUMBNAIL.width,
            THUMBNAIL.resample_height(),
        );
        Ok(self.thumbnail.insert(to_bytes(&columns)).as_slice())
    }

    /// Compute and store the sonic hash
    pub fn generate_sonic_hash(&mut self) -> Result<u16> {
        let hash = fingerprint::sonic_hash(self.require_waveform()?.full());
        self.sonic_hash = Some(hash);
        Ok(hash)
    }

    /// Serializable view for reporting
    pub fn summary(&self) -> WavePlotSummary {
        let data = self.data.as_ref();
        WavePlotSummary {
            gid: self.gid,
            version: data.map(|d| d.version()),
            info: data.map(|d| d.info().clone()),
            dr_level: data.map(|d| d.dr_level()),
            columns: data.map(|d| d.full().len()).unwrap_or(0),
            content_hash: data.map(|d| fingerprint::content_hash(d.full())),
            image_hash: self.image_hash.clone(),
            preview: self.preview.clone(),
            thumbnail: self.thumbnail.clone(),
            sonic_hash: self.sonic_hash,
            path: self.path.clone(),
        }
    }

    pub(crate) fn ensure_empty(&self) -> Result<()> {
        if self.data.is_some() || self.gid.is_some() {
            return Err(Error::PreconditionViolation("waveplot is already populated"));
        }
        Ok(())
    }

    pub(crate) fn from_registry(
        gid: Uuid,
        data: WaveformData,
        image_hash: String,
        thumbnail: Vec<u8>,
        sonic_hash: u16,
    ) -> Self {
        Self {
            gid: Some(gid),
            data: Some(data),
            image_hash: Some(image_hash),
            preview: None,
            thumbnail: Some(thumbnail),
            sonic_hash: Some(sonic_hash),
            path: None,
        }
    }

    pub(crate) fn ensure_unregistered(&self) -> Result<()> {
        if self.gid.is_some() {
            return Err(Error::PreconditionViolation("waveplot already has an identifier"));
        }
        Ok(())
    }

    /// Record a registration accepted as new
    pub(crate) fn adopt_registration(
        &mut self,
        gid: Uuid,
        image_hash: String,
        thumbnail: Vec<u8>,
        sonic_hash: u16,
    ) {
        self.gid = Some(gid);
        self.image_hash = Some(image_hash);
        self.thumbnail = Some(thumbnail);
        self.sonic_hash = Some(sonic_hash);
    }

    /// Record the identifier of an existing equivalent waveplot
    pub(crate) fn adopt_duplicate(&mut self, gid: Uuid) {
        self.gid = Some(gid);
    }
}

/// Only a missing path is `FileNotFound`; anything else is an unreadable source
fn path_error(path: &Path, err: std::io::Error) -> Error {
    match err.kind() {
        std::io::ErrorKind::NotFound => Error::FileNotFound(path.display().to_string()),
        _ => Error::DecodeFailure(format!("{}: {}", path.display(), err)),
    }
}

/// JSON-friendly snapshot of a [`WavePlot`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WavePlotSummary {
    pub gid: Option<Uuid>,
    pub version: Option<Version>,
    pub info: Option<AudioInfo>,
    pub dr_level: Option<f32>,
    pub columns: usize,
    pub content_hash: Option<String>,
    pub image_hash: Option<String>,
    pub preview: Option<Vec<u8>>,
    pub thumbnail: Option<Vec<u8>>,
    pub sonic_hash: Option<u16>,
    pub path: Option<PathBuf>,
}
