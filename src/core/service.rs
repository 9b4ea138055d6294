//! Main Improv service facade

use std::sync::Arc;
use tokio::sync::{Mutex, broadcast, mpsc};
use tracing::{debug, info, warn};

use crate::{
    backend::{NetworkEvent, WifiBackend},
    core::{
        engine::Engine,
        error::ServiceResult,
        types::{DeviceInfo, StatusSnapshot},
    },
    transport::{Transport, TransportEvent},
};

const STATUS_CHANNEL_CAPACITY: usize = 32;

/// Main Improv service facade
///
/// Serializes transport writes, network events and lifecycle calls behind one
/// lock; each call runs to completion before the next one starts.
pub struct ImprovService<T: Transport, B: WifiBackend> {
    engine: Mutex<Engine<T, B>>,
    updates: broadcast::Sender<StatusSnapshot>,
}

impl<T: Transport, B: WifiBackend> ImprovService<T, B> {
    /// Create a new Improv service
    pub fn new(transport: Arc<T>, backend: Arc<B>, device_info: DeviceInfo) -> Self {
        let (updates, _) = broadcast::channel(STATUS_CHANNEL_CAPACITY);
        let engine = Engine::new(transport, backend, device_info, updates.clone());

        Self {
            engine: Mutex::new(engine),
            updates,
        }
    }

    /// Create the endpoint set if needed, enter `Authorized` and advertise
    pub async fn start(&self) -> ServiceResult<()> {
        self.engine.lock().await.start().await
    }

    /// Stop advertising and enter `Stopped`
    pub async fn stop(&self) {
        self.engine.lock().await.stop().await
    }

    /// Handle a completed write to the RPC command endpoint
    pub async fn handle_command(&self, data: &[u8]) {
        self.engine.lock().await.handle_command(data).await
    }

    /// Handle an event raised by the network stack
    pub async fn handle_network_event(&self, event: NetworkEvent) {
        self.engine.lock().await.handle_network_event(event).await
    }

    pub async fn on_station_started(&self) {
        self.engine.lock().await.on_station_started().await
    }

    pub async fn on_address_acquired(&self, address: Option<String>) {
        self.engine.lock().await.on_address_acquired(address).await
    }

    pub async fn on_client_disconnected(&self) {
        self.engine.lock().await.on_client_disconnected().await
    }

    /// Current state and error
    pub async fn snapshot(&self) -> StatusSnapshot {
        self.engine.lock().await.snapshot()
    }

    /// Subscribe to status snapshots
    ///
    /// One snapshot is delivered per state/error update, including updates
    /// that leave the value unchanged. Nothing is sent on attach; use
    /// [`Self::subscribe_with_snapshot`] to also get the current status.
    pub fn subscribe(&self) -> broadcast::Receiver<StatusSnapshot> {
        self.updates.subscribe()
    }

    /// Current status plus a receiver for every update after it
    pub async fn subscribe_with_snapshot(
        &self,
    ) -> (StatusSnapshot, broadcast::Receiver<StatusSnapshot>) {
        let engine = self.engine.lock().await;
        (engine.snapshot(), self.updates.subscribe())
    }

    /// Feed network events into the service until the channel closes
    pub async fn run_network_events(&self, mut events: broadcast::Receiver<NetworkEvent>) {
        loop {
            match events.recv().await {
                Ok(event) => {
                    debug!(?event, "Network event");
                    self.handle_network_event(event).await;
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Network event receiver lagged, {} events skipped", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        info!("Network event stream ended");
    }

    /// Feed transport events into the service until the channel closes
    pub async fn run_transport_events(&self, mut events: mpsc::Receiver<TransportEvent>) {
        while let Some(event) = events.recv().await {
            match event {
                TransportEvent::CommandWritten(data) => self.handle_command(&data).await,
                TransportEvent::ClientDisconnected => self.on_client_disconnected().await,
            }
        }
        info!("Transport event stream ended");
    }

    #[cfg(test)]
    pub(crate) async fn pending_ssid(&self) -> Option<String> {
        self.engine
            .lock()
            .await
            .pending()
            .map(|credentials| credentials.ssid.clone())
    }
}
