//! Transport trait definition

use trait_variant::make;

use crate::{core::error::TransportResult, protocol::AdvertisementData};

/// Endpoints exposed by the Improv service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Current state (1 byte, read/notify)
    Status,
    /// Current error (1 byte, read/notify)
    Error,
    /// Capability bitmask (1 byte, read)
    Capabilities,
    /// Last result frame (read/notify)
    RpcResult,
}

/// Initial values the endpoint set is created with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointValues {
    pub status: u8,
    pub error: u8,
    pub capabilities: u8,
}

/// Inbound events raised by the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A client finished writing the command endpoint
    CommandWritten(Vec<u8>),
    /// A connected client went away
    ClientDisconnected,
}

/// Abstraction over the short-range server (typically a BLE GATT server)
///
/// Inbound writes and disconnects are not delivered through this trait;
/// implementations forward them as [`TransportEvent`]s to whoever drives the
/// service.
#[make(Send)]
pub trait Transport: Sync + 'static {
    /// Create the Improv service and its endpoints
    async fn create_endpoints(&self, initial: EndpointValues) -> TransportResult<()>;

    /// Store a new endpoint value and notify subscribed clients
    async fn set_value_and_notify(
        &self,
        endpoint: Endpoint,
        value: Vec<u8>,
    ) -> TransportResult<()>;

    /// Replace the advertisement payload
    ///
    /// Takes effect immediately when advertising, otherwise on the next start.
    async fn set_advertisement(&self, data: AdvertisementData) -> TransportResult<()>;

    /// Start advertising unless already advertising
    async fn start_advertising(&self) -> TransportResult<()>;

    /// Stop advertising if currently advertising
    async fn stop_advertising(&self) -> TransportResult<()>;
}
