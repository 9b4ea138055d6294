//! wifi-ctrl backend implementation
//!
//! Talks to wpa_supplicant over its control socket. Connect outcomes are
//! translated from wpa_supplicant broadcasts into [`NetworkEvent`]s.

use std::time::Duration;
use tokio::process::Command;
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, error, info, warn};
use wifi_ctrl::sta::{Broadcast, BroadcastReceiver, RequestClient, WifiSetup};

use crate::{
    backend::{NetworkEvent, WifiBackend},
    core::error::{WifiError, WifiResult},
};

const EVENT_CHANNEL_CAPACITY: usize = 16;
const IP_POLL_INTERVAL: Duration = Duration::from_millis(200);
const IP_POLL_RETRIES: usize = 30; // 30 * 200ms = 6 seconds

pub struct WifiCtrlBackend {
    interface: String,
    client: RequestClient,
    events: broadcast::Sender<NetworkEvent>,
    network: Mutex<UnsavedNetwork>,
}

/// Network block added for an attempt whose configuration is not saved yet
///
/// Only an unsaved block is handed back for removal; once saved it belongs
/// to the persistent configuration.
#[derive(Debug, Default)]
struct UnsavedNetwork(Option<usize>);

impl UnsavedNetwork {
    /// Stale block to remove before a new attempt
    fn take_stale(&mut self) -> Option<usize> {
        self.0.take()
    }

    fn track(&mut self, id: usize) {
        self.0 = Some(id);
    }

    fn saved(&mut self) {
        self.0 = None;
    }
}

/// What a wpa_supplicant broadcast turns into
#[derive(Debug, PartialEq, Eq)]
enum Reaction {
    /// Poll the interface address, then report it
    AwaitAddress,
    Emit(NetworkEvent),
}

fn reaction(event: &Broadcast) -> Option<Reaction> {
    match event {
        Broadcast::Connected => Some(Reaction::AwaitAddress),
        // Idle station, ready for another connect request
        Broadcast::Disconnected => Some(Reaction::Emit(NetworkEvent::StationStarted)),
        _ => None,
    }
}

impl WifiCtrlBackend {
    pub async fn new(interface: String) -> WifiResult<Self> {
        let path = format!("/var/run/wpa_supplicant/{}", interface);
        let mut setup =
            WifiSetup::new().map_err(|e| WifiError::WpaSupplicantError(e.to_string()))?;
        setup.set_socket_path(path);

        let client = setup.get_request_client();
        let broadcast_receiver = setup.get_broadcast_receiver();
        let station = setup.complete();

        // Spawn the station runtime
        tokio::spawn(async move {
            if let Err(e) = station.run().await {
                error!("WifiStation runtime error: {}", e);
            }
        });

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        tokio::spawn(forward_broadcasts(
            broadcast_receiver,
            interface.clone(),
            events.clone(),
        ));

        Ok(Self {
            interface,
            client,
            events,
            network: Mutex::new(UnsavedNetwork::default()),
        })
    }

    /// Whether wpa_supplicant already knows at least one network
    pub async fn has_configured_network(&self) -> WifiResult<bool> {
        let reply = self.custom("LIST_NETWORKS").await?;
        Ok(count_networks(&reply) > 0)
    }

    async fn custom(&self, request: &str) -> WifiResult<String> {
        let reply = self
            .client
            .send_custom(request.to_string())
            .await
            .map_err(|e| WifiError::WpaSupplicantError(format!("{} failed: {}", request, e)))?;
        check_reply(request, reply)
    }
}

impl WifiBackend for WifiCtrlBackend {
    async fn set_station_mode(&self) -> WifiResult<()> {
        // wpa_supplicant only drives station interfaces; make sure it answers
        let status =
            self.client.get_status().await.map_err(|e| {
                WifiError::BackendUnavailable(format!("Failed to get status: {}", e))
            })?;

        match status.get("wpa_state").map(String::as_str) {
            Some("INTERFACE_DISABLED") => Err(WifiError::InterfaceError(format!(
                "{} is disabled",
                self.interface
            ))),
            state => {
                debug!(?state, "Station interface ready");
                Ok(())
            }
        }
    }

    async fn apply_and_connect(&self, ssid: &str, password: &str) -> WifiResult<()> {
        let mut network = self.network.lock().await;

        if let Some(id) = network.take_stale() {
            debug!(id, "Removing previous network block");
            if let Err(e) = self.custom(&format!("REMOVE_NETWORK {}", id)).await {
                warn!("Failed to remove network {}: {}", id, e);
            }
        }

        let network_id =
            self.client.add_network().await.map_err(|e| {
                WifiError::WpaSupplicantError(format!("Failed to add network: {}", e))
            })?;
        network.track(network_id);

        // Set SSID (wifi-ctrl handles quoting internally via conf_escape)
        self.client
            .set_network_ssid(network_id, ssid.to_string())
            .await
            .map_err(|e| WifiError::InvalidConfig(format!("Failed to set SSID: {}", e)))?;

        if password.is_empty() {
            self.custom(&format!("SET_NETWORK {} key_mgmt NONE", network_id))
                .await
                .map_err(|e| WifiError::InvalidConfig(e.to_string()))?;
        } else {
            self.client
                .set_network_psk(network_id, password.to_string())
                .await
                .map_err(|e| WifiError::InvalidConfig(format!("Failed to set PSK: {}", e)))?;
        }

        // Select network (enables it and selects it)
        self.client.select_network(network_id).await.map_err(|e| {
            WifiError::ConnectionFailed(format!("Failed to select network: {}", e))
        })?;

        info!(ssid, network_id, "Connection initiated");
        Ok(())
    }

    async fn persist_config(&self, ssid: &str, _password: &str) -> WifiResult<()> {
        // The selected network block already holds the credentials
        self.client
            .save_config()
            .await
            .map_err(|e| WifiError::WpaSupplicantError(format!("Failed to save config: {}", e)))?;
        self.network.lock().await.saved();
        debug!(ssid, "wpa_supplicant configuration saved successfully");
        Ok(())
    }

    async fn connect(&self) -> WifiResult<()> {
        self.custom("RECONNECT").await.map(|_| ())
    }

    async fn current_address(&self) -> Option<String> {
        interface_address(&self.interface).await
    }

    fn subscribe(&self) -> broadcast::Receiver<NetworkEvent> {
        self.events.subscribe()
    }
}

/// Translate wpa_supplicant broadcasts into network events
async fn forward_broadcasts(
    mut receiver: BroadcastReceiver,
    interface: String,
    events: broadcast::Sender<NetworkEvent>,
) {
    loop {
        match receiver.recv().await {
            Ok(event) => {
                debug!("Received broadcast event: {:?}", event);
                let event = match reaction(&event) {
                    Some(Reaction::AwaitAddress) => {
                        let address = wait_for_address(&interface).await;
                        if address.is_none() {
                            warn!("Connected but no address on {}", interface);
                        }
                        NetworkEvent::AddressAcquired { address }
                    }
                    Some(Reaction::Emit(event)) => event,
                    None => continue,
                };
                let _ = events.send(event);
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("Broadcast receiver lagged, {} events skipped", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => {
                error!("wpa_supplicant broadcast channel closed");
                break;
            }
        }
    }
}

async fn wait_for_address(interface: &str) -> Option<String> {
    for _ in 0..IP_POLL_RETRIES {
        if let Some(ip) = interface_address(interface).await {
            return Some(ip);
        }
        tokio::time::sleep(IP_POLL_INTERVAL).await;
    }
    None
}

/// Get IP address using ip command
async fn interface_address(interface: &str) -> Option<String> {
    let output = Command::new("ip")
        .args(["-4", "addr", "show", interface])
        .output()
        .await
        .ok()?;

    parse_inet_address(&String::from_utf8_lossy(&output.stdout))
}

fn parse_inet_address(output: &str) -> Option<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with("inet "))
        .find_map(|line| line.split_whitespace().nth(1))
        .and_then(|cidr| cidr.split('/').next())
        .map(str::to_string)
}

/// Number of network blocks in a LIST_NETWORKS reply
fn count_networks(reply: &str) -> usize {
    reply
        .lines()
        .skip(1) // header
        .filter(|line| !line.trim().is_empty())
        .count()
}

fn check_reply(request: &str, reply: String) -> WifiResult<String> {
    if reply.trim() == "FAIL" {
        Err(WifiError::WpaSupplicantError(format!("{} rejected", request)))
    } else {
        Ok(reply)
    }
}
