//! Registry synchronization
//!
//! Blocking client for the remote WavePlot registry. The [`Transport`] seam
//! carries raw request/response pairs; [`RegistryClient`] owns the protocol
//! (URLs, JSON records, status interpretation).

pub mod client;
pub mod protocol;
pub mod transport;

pub use client::{Registration, RegistryClient, STATUS_DUPLICATE};
pub use protocol::{LinkContext, WavePlotRecord};
pub use transport::{HttpTransport, Response, Transport, TransportFailure};
