//! Symphonia-backed decode session

use super::{Library, Pull, SampleBlock, SampleSource};
use crate::error::{Error, Result};
use crate::models::AudioInfo;
use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CodecParameters, Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::debug;

/// Longest format tag the registry accepts
const MAX_FORMAT_TAG_LEN: usize = 20;

/// One open audio file
///
/// Owns the file handle (inside the format reader), the codec decoder and the
/// interleaving scratch buffer. All of them are released on drop.
pub struct DecodeSession {
    library: &'static Library,
    path: PathBuf,
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    scratch: Option<SampleBuffer<f32>>,
    info: AudioInfo,
    file_len: u64,
}

impl DecodeSession {
    pub(super) fn open(library: &'static Library, path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::FileNotFound(path.display().to_string()));
        }

        let file = File::open(path)
            .map_err(|e| Error::DecodeFailure(format!("{}: {}", path.display(), e)))?;
        let file_len = file.metadata().map(|m| m.len()).unwrap_or(0);

        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = library
            .probe
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .map_err(|e| Error::DecodeFailure(e.to_string()))?;

        let format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| Error::DecodeFailure("no audio tracks found in file".to_string()))?;

        let track_id = track.id;
        let codec_params = track.codec_params.clone();

        let decoder = library
            .codecs
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| Error::DecodeFailure(e.to_string()))?;

        let info = describe(library, path, &codec_params, file_len)?;

        debug!(
            path = %path.display(),
            format = %info.file_format,
            sample_rate = info.sample_rate,
            channels = info.num_channels,
            duration_secs = info.duration_secs,
            "Opened decode session"
        );

        library.session_opened();

        Ok(Self {
            library,
            path: path.to_path_buf(),
            format,
            decoder,
            track_id,
            scratch: None,
            info,
            file_len,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SampleSource for DecodeSession {
    fn info(&self) -> &AudioInfo {
        &self.info
    }

    fn byte_len(&self) -> Option<u64> {
        Some(self.file_len)
    }

    fn pull(&mut self, block: &mut SampleBlock) -> Result<Pull> {
        block.clear();

        let packet = match self.format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == ErrorKind::UnexpectedEof => {
                return Ok(Pull::EndOfStream);
            }
            Err(e) => return Err(Error::DecodeFailure(e.to_string())),
        };

        if packet.track_id() != self.track_id {
            return Ok(Pull::Pending);
        }

        let decoded = self
            .decoder
            .decode(&packet)
            .map_err(|e| Error::DecodeFailure(e.to_string()))?;

        if decoded.frames() == 0 {
            return Ok(Pull::Pending);
        }

        let spec = *decoded.spec();
        let num_channels = spec.channels.count();
        let needed = decoded.capacity() * num_channels;

        let scratch = match self.scratch.take() {
            Some(buf) if buf.capacity() >= needed => buf,
            _ => SampleBuffer::new(decoded.capacity() as u64, spec),
        };
        let scratch = self.scratch.insert(scratch);
        scratch.copy_interleaved_ref(decoded);

        block.fill_interleaved(scratch.samples(), num_channels)?;
        Ok(Pull::Samples(block.frames()))
    }
}

impl Drop for DecodeSession {
    fn drop(&mut self) {
        self.library.session_closed();
        debug!(path = %self.path.display(), "Closed decode session");
    }
}

/// Build format metadata from codec parameters
fn describe(
    library: &Library,
    path: &Path,
    params: &CodecParameters,
    file_len: u64,
) -> Result<AudioInfo> {
    let sample_rate = params
        .sample_rate
        .ok_or_else(|| Error::DecodeFailure("sample rate not specified in codec params".to_string()))?;

    let num_channels = params
        .channels
        .map(|c| c.count())
        .ok_or_else(|| Error::DecodeFailure("channel layout not specified in codec params".to_string()))?;

    let duration_secs = params
        .n_frames
        .map(|frames| frames / u64::from(sample_rate))
        .unwrap_or(0);

    let bit_rate = if duration_secs > 0 {
        (file_len * 8 / duration_secs) as u32
    } else {
        0
    };

    let bit_depth = params
        .bits_per_sample
        .or(params.bits_per_coded_sample)
        .unwrap_or(0);

    let file_format: String = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .or_else(|| {
            library
                .codecs
                .get_codec(params.codec)
                .map(|d| d.short_name.to_string())
        })
        .unwrap_or_else(|| "unknown".to_string())
        .chars()
        .take(MAX_FORMAT_TAG_LEN)
        .collect();

    Ok(AudioInfo {
        duration_secs: duration_secs as u32,
        num_channels: num_channels as u8,
        bit_depth: bit_depth as u16,
        bit_rate,
        sample_rate,
        file_format,
    })
}
