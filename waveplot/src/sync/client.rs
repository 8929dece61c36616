//! Registry client
//!
//! Retrieve, register and link waveplots against the remote registry.
//! Every response body is parsed before the entity is touched, so a
//! malformed response never leaves partial state behind.

use super::protocol::{
    decode_base64, parse_body, FullRecord, LinkContext, LinkRequest, MessageBody, RegisterCreated,
    RegisterRequest, WavePlotRecord,
};
use super::transport::{HttpTransport, Response, Transport};
use crate::error::{Error, Result};
use crate::models::{AudioInfo, WavePlot, WaveformData};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;
use waveplot_common::config::{is_valid_key, ClientSettings};

/// Status the registry uses for "equivalent content already registered"
pub const STATUS_DUPLICATE: u16 = 303;

/// Message used when a rejection carries none
const UNKNOWN_MESSAGE: &str = "Unknown";

/// Outcome of a registration attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Registration {
    /// Registry stored the waveplot under a new identifier
    Created(Uuid),
    /// Registry already holds equivalent content under this identifier
    Duplicate(Uuid),
    /// Registry declined; the entity keeps no identifier
    Rejected { status: u16, message: String },
}

impl Registration {
    /// Identifier adopted by the entity, if any
    pub fn gid(&self) -> Option<Uuid> {
        match self {
            Registration::Created(gid) | Registration::Duplicate(gid) => Some(*gid),
            Registration::Rejected { .. } => None,
        }
    }

    /// Treat a rejection as an error
    pub fn into_result(self) -> Result<Uuid> {
        match self {
            Registration::Created(gid) | Registration::Duplicate(gid) => Ok(gid),
            Registration::Rejected { status, message } => Err(Error::Rejected {
                operation: "register",
                status,
                message,
            }),
        }
    }
}

/// Client for the WavePlot registry
pub struct RegistryClient<T: Transport = HttpTransport> {
    transport: T,
    base_url: String,
}

impl RegistryClient<HttpTransport> {
    /// HTTP client configured from resolved settings
    pub fn from_settings(settings: &ClientSettings) -> Result<Self> {
        let transport = HttpTransport::new(settings.timeout)
            .map_err(|e| Error::transport("connect", e.to_string()))?;
        Ok(Self::with_transport(settings.server_url.clone(), transport))
    }
}

impl<T: Transport> RegistryClient<T> {
    pub fn with_transport(base_url: impl Into<String>, transport: T) -> Self {
        Self {
            transport,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetch a registered waveplot, including its full waveform
    ///
    /// # Errors
    /// - `Error::NotFound` if the registry answers 404
    /// - `Error::Rejected` for any other non-success status
    /// - `Error::ProtocolError` for malformed bodies
    /// - `Error::TransportError` for network failures
    pub fn retrieve(&self, gid: Uuid) -> Result<WavePlot> {
        const OP: &str = "retrieve";

        let url = format!("{}/api/waveplot/{}", self.base_url, gid);
        let response = self.get(OP, &url)?;
        check_retrieve_status(OP, gid, &response)?;
        let record: WavePlotRecord = parse_body(OP, &response.body)?;

        if record.gid != gid {
            return Err(Error::protocol(
                OP,
                format!("requested {} but registry returned {}", gid, record.gid),
            ));
        }

        let response = self.get(OP, &format!("{}/full", url))?;
        check_retrieve_status(OP, gid, &response)?;
        let full_record: FullRecord = parse_body(OP, &response.body)?;

        let full = decode_base64(OP, "data", &full_record.data)?;
        let thumbnail = decode_base64(OP, "thumbnail", &record.thumbnail)?;

        let info = AudioInfo {
            duration_secs: record.duration,
            num_channels: record.num_channels,
            bit_depth: record.bit_depth.unwrap_or(0),
            bit_rate: record.bit_rate.unwrap_or(0),
            sample_rate: record.sample_rate.unwrap_or(0),
            file_format: record.source_type,
        };

        info!(gid = %gid, columns = full.len(), "Retrieved waveplot");

        Ok(WavePlot::from_registry(
            gid,
            WaveformData::new(info, record.dr_level, full, record.version),
            record.image_sha1,
            thumbnail,
            record.sonic_hash,
        ))
    }

    /// Submit a generated waveplot under an editor credential
    ///
    /// Created and duplicate outcomes write the identifier (and, for created,
    /// the server-derived fields) back into `waveplot`. A rejection leaves it
    /// untouched and is returned as `Ok(Registration::Rejected { .. })`.
    ///
    /// # Errors
    /// - `Error::PreconditionViolation` if `waveplot` has no waveform or
    ///   already has an identifier
    /// - `Error::Common` if `editor_key` is blank
    /// - `Error::ProtocolError`, `Error::TransportError`
    pub fn register(&self, waveplot: &mut WavePlot, editor_key: &str) -> Result<Registration> {
        const OP: &str = "register";

        waveplot.ensure_unregistered()?;
        let data = waveplot.require_waveform()?;

        if !is_valid_key(editor_key) {
            return Err(waveplot_common::Error::InvalidInput("editor key is empty".to_string()).into());
        }

        let request = RegisterRequest::new(editor_key, data)?;
        let url = format!("{}/api/waveplot", self.base_url);
        let response = self.post(OP, &url, &request)?;

        match response.status {
            status if status < 300 => {
                let created: RegisterCreated = parse_body(OP, &response.body)?;
                let thumbnail = decode_base64(OP, "thumbnail", &created.thumbnail)?;

                info!(gid = %created.gid, "Registered waveplot");
                waveplot.adopt_registration(
                    created.gid,
                    created.image_hash,
                    thumbnail,
                    created.sonic_hash,
                );
                Ok(Registration::Created(created.gid))
            }
            STATUS_DUPLICATE => {
                let body: MessageBody = parse_body(OP, &response.body)?;
                let gid = body
                    .message
                    .as_deref()
                    .map(str::trim)
                    .ok_or_else(|| Error::protocol(OP, "duplicate response carries no identifier"))?
                    .parse::<Uuid>()
                    .map_err(|e| Error::protocol(OP, format!("duplicate identifier: {}", e)))?;

                info!(gid = %gid, "Waveplot already registered, adopting existing identifier");
                waveplot.adopt_duplicate(gid);
                Ok(Registration::Duplicate(gid))
            }
            status => {
                let body: MessageBody = parse_body(OP, &response.body)?;
                let message = body.message.unwrap_or_else(|| UNKNOWN_MESSAGE.to_string());

                warn!(status = status, message = %message, "Registration rejected");
                Ok(Registration::Rejected { status, message })
            }
        }
    }

    /// Attach a registered waveplot to catalog context
    ///
    /// # Errors
    /// - `Error::PreconditionViolation` if `waveplot` has no identifier
    /// - `Error::Rejected` for status ≥ 300
    /// - `Error::ProtocolError`, `Error::TransportError`
    pub fn link(&self, waveplot: &WavePlot, context: &LinkContext) -> Result<()> {
        const OP: &str = "link";

        let gid = waveplot.gid().ok_or(Error::PreconditionViolation(
            "waveplot must be registered or retrieved before linking",
        ))?;

        let request = LinkRequest {
            waveplot_uuid: gid,
            context: context.clone(),
        };
        let url = format!("{}/api/waveplot_context", self.base_url);
        let response = self.post(OP, &url, &request)?;
        let body: MessageBody = parse_body(OP, &response.body)?;

        if response.status >= 300 {
            let message = body.message.unwrap_or_else(|| UNKNOWN_MESSAGE.to_string());
            warn!(gid = %gid, status = response.status, message = %message, "Link rejected");
            return Err(Error::Rejected {
                operation: OP,
                status: response.status,
                message,
            });
        }

        info!(gid = %gid, track = %context.track_gid, "Linked waveplot");
        Ok(())
    }

    fn get(&self, operation: &'static str, url: &str) -> Result<Response> {
        let response = self
            .transport
            .get(url)
            .map_err(|e| Error::transport(operation, e.to_string()))?;
        debug!(operation = operation, status = response.status, "Registry response");
        Ok(response)
    }

    fn post<B: Serialize>(&self, operation: &'static str, url: &str, body: &B) -> Result<Response> {
        let body = serde_json::to_value(body).map_err(|e| Error::protocol(operation, e.to_string()))?;
        let response = self
            .transport
            .post_json(url, &body)
            .map_err(|e| Error::transport(operation, e.to_string()))?;
        debug!(operation = operation, status = response.status, "Registry response");
        Ok(response)
    }
}

fn check_retrieve_status(operation: &'static str, gid: Uuid, response: &Response) -> Result<()> {
    match response.status {
        status if status < 300 => Ok(()),
        404 => Err(Error::NotFound(gid.to_string())),
        status => {
            let body: MessageBody = parse_body(operation, &response.body)?;
            Err(Error::Rejected {
                operation,
                status,
                message: body.message.unwrap_or_else(|| UNKNOWN_MESSAGE.to_string()),
            })
        }
    }
}

impl WavePlot {
    /// Populate this empty entity from the registry
    ///
    /// # Errors
    /// `Error::PreconditionViolation` if already populated, otherwise as
    /// [`RegistryClient::retrieve`]. On error the entity is unchanged.
    pub fn get<T: Transport>(&mut self, client: &RegistryClient<T>, gid: Uuid) -> Result<()> {
        self.ensure_empty()?;
        *self = client.retrieve(gid)?;
        Ok(())
    }

    /// Register this waveplot; see [`RegistryClient::register`]
    pub fn upload<T: Transport>(&mut self, client: &RegistryClient<T>, editor_key: &str) -> Result<Registration> {
        client.register(self, editor_key)
    }

    /// Link this waveplot; see [`RegistryClient::link`]
    pub fn link<T: Transport>(&self, client: &RegistryClient<T>, context: &LinkContext) -> Result<()> {
        client.link(self, context)
    }
}
