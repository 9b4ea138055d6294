//! WiFi backend trait definition

use tokio::sync::broadcast;
use trait_variant::make;

use crate::core::error::WifiResult;

/// Asynchronous network stack events the provisioning engine reacts to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkEvent {
    /// The station interface is up and accepts connect requests
    StationStarted,
    /// The station obtained an address; `None` when the event carried none
    AddressAcquired { address: Option<String> },
}

/// Abstraction over the device's network stack (typically wpa_supplicant)
///
/// Connect requests only report whether they were accepted; the outcome
/// arrives later as a [`NetworkEvent`] on the [`WifiBackend::subscribe`]
/// channel.
#[make(Send)]
pub trait WifiBackend: Sync + 'static {
    /// Put the interface into station (client) mode
    async fn set_station_mode(&self) -> WifiResult<()>;

    /// Apply credentials transiently and start connecting
    ///
    /// An error means the configuration or the connect request was rejected
    /// outright.
    async fn apply_and_connect(&self, ssid: &str, password: &str) -> WifiResult<()>;

    /// Store credentials durably so they survive a reboot
    async fn persist_config(&self, ssid: &str, password: &str) -> WifiResult<()>;

    /// Reissue a connect request for the applied configuration
    async fn connect(&self) -> WifiResult<()>;

    /// Current station address as text, if any
    async fn current_address(&self) -> Option<String>;

    /// Subscribe to network events
    fn subscribe(&self) -> broadcast::Receiver<NetworkEvent>;
}
