//! Provisioning engine state shared by the dispatcher and the connection coordinator

use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::{
    backend::WifiBackend,
    core::{
        status::StatusModel,
        types::{Capabilities, DeviceInfo, ErrorCode, PendingCredentials, State, StatusSnapshot},
    },
    protocol::AdvertisementData,
    transport::{Endpoint, Transport},
};

/// All mutable protocol state
///
/// Never shared directly: the service facade keeps it behind a single lock so
/// command and network event handlers run one at a time.
pub struct Engine<T: Transport, B: WifiBackend> {
    pub(super) transport: Arc<T>,
    pub(super) backend: Arc<B>,
    pub(super) device_info: DeviceInfo,
    pub(super) status: StatusModel<T>,
    pub(super) capabilities: Capabilities,
    pub(super) pending: Option<PendingCredentials>,
    pub(super) advertising_enabled: bool,
    pub(super) endpoints_created: bool,
}

impl<T: Transport, B: WifiBackend> Engine<T, B> {
    pub fn new(
        transport: Arc<T>,
        backend: Arc<B>,
        device_info: DeviceInfo,
        updates: broadcast::Sender<StatusSnapshot>,
    ) -> Self {
        Self {
            status: StatusModel::new(transport.clone(), updates),
            transport,
            backend,
            device_info,
            capabilities: Capabilities::NONE,
            pending: None,
            advertising_enabled: false,
            endpoints_created: false,
        }
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        self.status.snapshot()
    }

    pub fn pending(&self) -> Option<&PendingCredentials> {
        self.pending.as_ref()
    }

    pub fn is_advertising_enabled(&self) -> bool {
        self.advertising_enabled
    }

    /// Set the state, refreshing the discovery payload when it changed
    pub(super) async fn set_state(&mut self, state: State) {
        if self.status.set_state(state).await {
            self.refresh_advertisement().await;
        }
    }

    pub(super) async fn set_error(&mut self, error: ErrorCode) {
        self.status.set_error(error).await;
    }

    /// Publish a result frame on the RPC result endpoint
    pub(super) async fn send_result(&self, frame: Vec<u8>) {
        debug!(frame = %hex::encode(&frame), "Sending RPC result");
        if let Err(e) = self
            .transport
            .set_value_and_notify(Endpoint::RpcResult, frame)
            .await
        {
            warn!("Failed to send RPC result: {}", e);
        }
    }

    /// Rebuild the advertisement from the current status
    ///
    /// Does nothing while advertising is disabled.
    pub(super) async fn refresh_advertisement(&self) {
        if !self.advertising_enabled {
            return;
        }

        let data = AdvertisementData::new(
            self.status.snapshot().state.into(),
            self.capabilities.bits(),
            &self.device_info.device_name,
        );
        if let Err(e) = self.transport.set_advertisement(data).await {
            warn!("Failed to update advertisement: {}", e);
        }
    }

    /// Start advertising if enabled and not already advertising
    pub(super) async fn ensure_advertising(&self) {
        if !self.advertising_enabled {
            return;
        }
        if let Err(e) = self.transport.start_advertising().await {
            warn!("Failed to start advertising: {}", e);
        }
    }

    pub(super) async fn disable_advertising(&mut self) {
        self.advertising_enabled = false;
        match self.transport.stop_advertising().await {
            Ok(()) => info!("Advertising stopped"),
            Err(e) => warn!("Failed to stop advertising: {}", e),
        }
    }

    /// Resume advertising after a client went away
    pub async fn on_client_disconnected(&self) {
        info!("Client disconnected");
        self.ensure_advertising().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{backend::MockWifiBackend, transport::MockTransport};

    fn create_test_engine() -> (Engine<MockTransport, MockWifiBackend>, Arc<MockTransport>) {
        let transport = Arc::new(MockTransport::new());
        let backend = Arc::new(MockWifiBackend::new());
        let (tx, _) = broadcast::channel(16);
        let info = DeviceInfo {
            device_name: "Test Device".to_string(),
            ..Default::default()
        };
        (Engine::new(transport.clone(), backend, info, tx), transport)
    }

    #[tokio::test]
    async fn test_state_change_refreshes_advertisement_when_enabled() {
        let (mut engine, transport) = create_test_engine();
        engine.advertising_enabled = true;

        engine.set_state(State::Provisioning).await;

        let data = transport.advertisement().await.unwrap();
        assert_eq!(data.service_data, [0x03, 0, 0, 0, 0, 0]);
        assert_eq!(data.local_name, "Test Device");
    }

    #[tokio::test]
    async fn test_no_advertisement_work_while_disabled() {
        let (mut engine, transport) = create_test_engine();

        engine.set_state(State::Provisioning).await;
        engine.on_client_disconnected().await;

        assert!(transport.advertisement().await.is_none());
        assert!(!transport.is_advertising().await);
    }

    #[tokio::test]
    async fn test_disconnect_resumes_advertising() {
        let (mut engine, transport) = create_test_engine();
        engine.advertising_enabled = true;
        engine.ensure_advertising().await;
        transport.client_connected().await;

        engine.on_client_disconnected().await;

        assert!(transport.is_advertising().await);
        assert_eq!(transport.advertising_starts().await, 2);
    }

    #[tokio::test]
    async fn test_disable_advertising() {
        let (mut engine, transport) = create_test_engine();
        engine.advertising_enabled = true;
        engine.ensure_advertising().await;

        engine.disable_advertising().await;

        assert!(!engine.is_advertising_enabled());
        assert!(!transport.is_advertising().await);
    }
}
