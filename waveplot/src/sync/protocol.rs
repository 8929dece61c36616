//! JSON records exchanged with the registry

use crate::error::{Error, Result};
use crate::models::{Version, WaveformData};
use base64::{engine::general_purpose, Engine as _};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io::Write;
use uuid::Uuid;

/// Metadata record from `GET /api/waveplot/{gid}`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WavePlotRecord {
    pub gid: Uuid,
    pub duration: u32,
    pub dr_level: f32,
    pub source_type: String,
    #[serde(default)]
    pub sample_rate: Option<u32>,
    #[serde(default)]
    pub bit_depth: Option<u16>,
    #[serde(default)]
    pub bit_rate: Option<u32>,
    pub num_channels: u8,
    /// Hex SHA-1 of the full waveform
    pub image_sha1: String,
    /// Base64 thumbnail bytes
    pub thumbnail: String,
    pub sonic_hash: u16,
    pub version: Version,
}

/// Full waveform record from `GET /api/waveplot/{gid}/full`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FullRecord {
    /// Base64 full-resolution waveform
    pub data: String,
}

/// Body of `POST /api/waveplot`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub editor: String,
    /// Base64 of the zlib-compressed full waveform
    pub image: String,
    pub dr_level: f32,
    pub duration: u32,
    pub source_type: String,
    pub sample_rate: u32,
    pub bit_depth: u16,
    pub bit_rate: u32,
    pub num_channels: u8,
    pub version: Version,
}

impl RegisterRequest {
    pub fn new(editor: &str, data: &WaveformData) -> Result<Self> {
        let info = data.info();
        Ok(Self {
            editor: editor.to_string(),
            image: encode_base64(&compress(data.full())?),
            dr_level: data.dr_level(),
            duration: info.duration_secs,
            source_type: info.file_format.clone(),
            sample_rate: info.sample_rate,
            bit_depth: info.bit_depth,
            bit_rate: info.bit_rate,
            num_channels: info.num_channels,
            version: data.version(),
        })
    }
}

/// Successful registration response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RegisterCreated {
    pub gid: Uuid,
    pub image_hash: String,
    /// Base64 thumbnail bytes
    pub thumbnail: String,
    pub sonic_hash: u16,
}

/// Body carrying only a message (duplicates and errors)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MessageBody {
    #[serde(default)]
    pub message: Option<String>,
}

/// Catalog context a waveplot is linked to
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LinkContext {
    pub release_gid: Uuid,
    pub recording_gid: Uuid,
    pub track_gid: Uuid,
    pub artist_credit_id: i32,
}

/// Body of `POST /api/waveplot_context`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LinkRequest {
    pub waveplot_uuid: Uuid,
    #[serde(flatten)]
    pub context: LinkContext,
}

/// Parse a JSON body, mapping failure to a protocol error
pub fn parse_body<T: DeserializeOwned>(operation: &'static str, body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(|e| Error::protocol(operation, e.to_string()))
}

/// zlib-compress a waveform
pub fn compress(full: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(full)
        .map_err(|e| Error::Common(waveplot_common::Error::Io(e)))?;
    encoder
        .finish()
        .map_err(|e| Error::Common(waveplot_common::Error::Io(e)))
}

pub fn encode_base64(bytes: &[u8]) -> String {
    general_purpose::STANDARD.encode(bytes)
}

pub fn decode_base64(operation: &'static str, field: &str, encoded: &str) -> Result<Vec<u8>> {
    general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| Error::protocol(operation, format!("{} is not valid base64: {}", field, e)))
}
