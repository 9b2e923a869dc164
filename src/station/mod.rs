//! Client for the test station's HTTP control surface.
//!
//! The station is the only piece of the system that touches hardware: it
//! switches chain power, enumerates ports and boards, and forwards memory
//! commands down the daisy chain. This module knows the request/response
//! contract and nothing else — no retries, no caching. Recovery policy is
//! the controller's job.

mod client;
mod types;

pub use client::StationClient;
pub use types::{Ack, Board, DeviceMap, MemoryCommand, PortList};

use thiserror::Error;

/// Failure modes of a single station request.
#[derive(Debug, Error)]
pub enum StationError {
    /// The station could not be reached or the connection broke mid-request.
    #[error("transport failure on {path}: {source}")]
    Transport {
        path: &'static str,
        #[source]
        source: Box<ureq::Error>,
    },
    /// The station answered with a non-success HTTP status.
    #[error("station reported HTTP {status} on {path}")]
    Status { path: &'static str, status: u16 },
    /// The response body did not match the documented shape.
    #[error("malformed response on {path}: {source}")]
    Decode {
        path: &'static str,
        #[source]
        source: Box<ureq::Error>,
    },
}

pub type Result<T> = std::result::Result<T, StationError>;

/// Station operations the controller depends on.
///
/// [`StationClient`] is the production implementation; tests drive the
/// controller against scripted fakes instead of a live station.
pub trait StationApi {
    /// Energize the whole chain.
    fn power_on(&self) -> Result<Ack>;

    /// De-energize the whole chain.
    fn power_off(&self) -> Result<Ack>;

    /// Ask the station to (re)detect its physical connectors.
    fn register_ports(&self) -> Result<Ack>;

    /// List the connector names known to the station.
    fn available_ports(&self) -> Result<PortList>;

    /// Ask the station to walk each chain and enumerate boards.
    fn register_devices(&self) -> Result<Ack>;

    /// Fetch the full port → boards snapshot.
    fn available_devices(&self) -> Result<DeviceMap>;

    /// Submit a memory read for one address on one board.
    fn submit_read(&self, board_id: &str, address: u32, port_name: &str) -> Result<()>;

    /// Submit a write of the inverted memory contents at one address.
    fn submit_write_invert(&self, board_id: &str, address: u32, port_name: &str) -> Result<()>;
}
