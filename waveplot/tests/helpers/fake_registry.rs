//! In-memory registry speaking the WavePlot HTTP protocol
//!
//! Implements `Transport` directly so sync tests run without a network.
//! Registrations are deduplicated by the SHA-1 of the full waveform; a
//! duplicate answers 303 with the existing identifier in `message`.

use flate2::read::ZlibDecoder;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::sync::Mutex;
use uuid::Uuid;
use waveplot::dsp::{dequantize, resample, to_bytes, THUMBNAIL};
use waveplot::fingerprint::{content_hash, sonic_hash};
use waveplot::sync::protocol::{decode_base64, encode_base64, LinkRequest, RegisterRequest};
use waveplot::sync::{Response, Transport, TransportFailure};

pub const BASE_URL: &str = "http://registry.test";

/// What the registry does with the next request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    /// 200 with an HTML body
    Garbage,
    /// Connection-level failure
    Unreachable,
}

#[derive(Debug, Clone)]
struct Stored {
    request: RegisterRequest,
    full: Vec<u8>,
    image_sha1: String,
    thumbnail: Vec<u8>,
    sonic_hash: u16,
}

#[derive(Default)]
struct State {
    by_gid: HashMap<Uuid, Stored>,
    by_hash: HashMap<String, Uuid>,
    links: Vec<LinkRequest>,
    requests: usize,
}

pub struct FakeRegistry {
    editors: HashSet<String>,
    mode: Mutex<Mode>,
    state: Mutex<State>,
}

impl FakeRegistry {
    pub fn new(editors: &[&str]) -> Self {
        Self {
            editors: editors.iter().map(|e| e.to_string()).collect(),
            mode: Mutex::new(Mode::Normal),
            state: Mutex::new(State::default()),
        }
    }

    pub fn set_mode(&self, mode: Mode) {
        *self.mode.lock().unwrap() = mode;
    }

    pub fn stored_count(&self) -> usize {
        self.state.lock().unwrap().by_gid.len()
    }

    pub fn request_count(&self) -> usize {
        self.state.lock().unwrap().requests
    }

    pub fn links(&self) -> Vec<LinkRequest> {
        self.state.lock().unwrap().links.clone()
    }

    fn route(&self, method: &str, url: &str, body: Option<&Value>) -> Result<Response, TransportFailure> {
        self.state.lock().unwrap().requests += 1;

        match *self.mode.lock().unwrap() {
            Mode::Normal => {}
            Mode::Garbage => return Ok(Response::new(200, "<html>502 Bad Gateway</html>")),
            Mode::Unreachable => return Err(TransportFailure("connection refused".to_string())),
        }

        let path = url
            .strip_prefix(BASE_URL)
            .ok_or_else(|| TransportFailure(format!("unknown host in {}", url)))?;
        let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();

        let response = match (method, segments.as_slice()) {
            ("GET", ["api", "waveplot", gid]) => self.get_record(gid),
            ("GET", ["api", "waveplot", gid, "full"]) => self.get_full(gid),
            ("POST", ["api", "waveplot"]) => self.register(body.cloned().unwrap_or(Value::Null)),
            ("POST", ["api", "waveplot_context"]) => self.link(body.cloned().unwrap_or(Value::Null)),
            _ => message(404, "No such endpoint"),
        };
        Ok(response)
    }

    fn lookup(&self, gid: &str) -> Option<(Uuid, Stored)> {
        let gid = gid.parse::<Uuid>().ok()?;
        let state = self.state.lock().unwrap();
        state.by_gid.get(&gid).map(|s| (gid, s.clone()))
    }

    fn get_record(&self, gid: &str) -> Response {
        let Some((gid, stored)) = self.lookup(gid) else {
            return message(404, "WavePlot not found");
        };
        let request = &stored.request;
        let body = json!({
            "gid": gid,
            "duration": request.duration,
            "dr_level": request.dr_level,
            "source_type": request.source_type,
            "sample_rate": request.sample_rate,
            "bit_depth": request.bit_depth,
            "bit_rate": request.bit_rate,
            "num_channels": request.num_channels,
            "image_sha1": stored.image_sha1,
            "thumbnail": encode_base64(&stored.thumbnail),
            "sonic_hash": stored.sonic_hash,
            "version": request.version,
        });
        Response::new(200, body.to_string())
    }

    fn get_full(&self, gid: &str) -> Response {
        match self.lookup(gid) {
            Some((_, stored)) => Response::new(200, json!({ "data": encode_base64(&stored.full) }).to_string()),
            None => message(404, "WavePlot not found"),
        }
    }

    fn register(&self, body: Value) -> Response {
        let request: RegisterRequest = match serde_json::from_value(body) {
            Ok(request) => request,
            Err(e) => return message(400, &e.to_string()),
        };

        if !self.editors.contains(&request.editor) {
            return message(401, "Editor key not recognised");
        }

        let full = match decode_base64("fake", "image", &request.image)
            .ok()
            .and_then(|compressed| inflate(&compressed))
        {
            Some(full) => full,
            None => return message(400, "Image data is not valid"),
        };

        let image_sha1 = content_hash(&full);
        let mut state = self.state.lock().unwrap();

        if let Some(existing) = state.by_hash.get(&image_sha1) {
            return message(303, &existing.to_string());
        }

        let amplitudes: Vec<f32> = full.iter().map(|&b| dequantize(b)).collect();
        let stored = Stored {
            thumbnail: to_bytes(&resample(&amplitudes, THUMBNAIL.width, THUMBNAIL.resample_height())),
            sonic_hash: sonic_hash(&full),
            image_sha1: image_sha1.clone(),
            full,
            request,
        };

        let gid = Uuid::new_v4();
        let body = json!({
            "gid": gid,
            "image_hash": stored.image_sha1,
            "thumbnail": encode_base64(&stored.thumbnail),
            "sonic_hash": stored.sonic_hash,
        });
        state.by_hash.insert(image_sha1, gid);
        state.by_gid.insert(gid, stored);

        Response::new(200, body.to_string())
    }

    fn link(&self, body: Value) -> Response {
        let request: LinkRequest = match serde_json::from_value(body) {
            Ok(request) => request,
            Err(e) => return message(400, &e.to_string()),
        };

        let mut state = self.state.lock().unwrap();
        if !state.by_gid.contains_key(&request.waveplot_uuid) {
            return message(404, "WavePlot not found");
        }
        state.links.push(request);
        Response::new(200, json!({ "message": "Linked" }).to_string())
    }
}

impl Transport for FakeRegistry {
    fn get(&self, url: &str) -> Result<Response, TransportFailure> {
        self.route("GET", url, None)
    }

    fn post_json(&self, url: &str, body: &Value) -> Result<Response, TransportFailure> {
        self.route("POST", url, Some(body))
    }
}

fn message(status: u16, text: &str) -> Response {
    Response::new(status, json!({ "message": text }).to_string())
}

fn inflate(compressed: &[u8]) -> Option<Vec<u8>> {
    let mut full = Vec::new();
    ZlibDecoder::new(compressed).read_to_end(&mut full).ok()?;
    Some(full)
}
