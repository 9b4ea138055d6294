//! Transport layer: the device-facing endpoint set and advertising

pub mod ble;
pub mod improv_transport;

#[cfg(test)]
pub mod mock_transport;

pub use improv_transport::{Endpoint, EndpointValues, Transport, TransportEvent};

#[cfg(test)]
pub use mock_transport::MockTransport;
