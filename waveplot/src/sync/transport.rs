//! Request/response transport for the registry protocol

use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// User agent sent with every registry request
pub const USER_AGENT: &str = concat!("waveplot/", env!("CARGO_PKG_VERSION"));

/// Network-level failure (connect, timeout, I/O)
#[derive(Debug, Error)]
#[error("{0}")]
pub struct TransportFailure(pub String);

/// Raw response: status code and body bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Blocking request/response exchange with the registry
///
/// Implementations must not follow redirects: a 303 is a protocol outcome
/// the client needs to see.
pub trait Transport {
    fn get(&self, url: &str) -> Result<Response, TransportFailure>;

    fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<Response, TransportFailure>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get(&self, url: &str) -> Result<Response, TransportFailure> {
        (**self).get(url)
    }

    fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<Response, TransportFailure> {
        (**self).post_json(url, body)
    }
}

/// HTTP transport over `reqwest::blocking`
pub struct HttpTransport {
    http_client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportFailure> {
        let http_client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| TransportFailure(e.to_string()))?;

        Ok(Self { http_client })
    }

    fn read(response: reqwest::blocking::Response) -> Result<Response, TransportFailure> {
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .map_err(|e| TransportFailure(e.to_string()))?;
        Ok(Response::new(status, body.to_vec()))
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> Result<Response, TransportFailure> {
        debug!(url = url, "GET");
        let response = self
            .http_client
            .get(url)
            .send()
            .map_err(|e| TransportFailure(e.to_string()))?;
        Self::read(response)
    }

    fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<Response, TransportFailure> {
        debug!(url = url, "POST");
        let response = self
            .http_client
            .post(url)
            .json(body)
            .send()
            .map_err(|e| TransportFailure(e.to_string()))?;
        Self::read(response)
    }
}
