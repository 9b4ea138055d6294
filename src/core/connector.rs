//! Wi-Fi connection coordinator
//!
//! Reconciles the synchronous "apply and connect" request with outcomes that
//! only arrive later as network events.

use tracing::{debug, info, warn};

use crate::{
    backend::{NetworkEvent, WifiBackend},
    core::{
        engine::Engine,
        types::{ErrorCode, PendingCredentials, State},
    },
    protocol::{RpcCommand, encode_response},
    transport::Transport,
};

impl<T: Transport, B: WifiBackend> Engine<T, B> {
    /// Accept credentials and start connecting
    ///
    /// Leaves the engine in `Provisioning` unless the backend rejects the
    /// request outright, in which case it falls back to `Authorized` with
    /// `UnableToConnect`.
    pub async fn begin_connection(&mut self, ssid: String, password: String) {
        let credentials = PendingCredentials { ssid, password };
        if self.pending.replace(credentials.clone()).is_some() {
            debug!("Replacing unconfirmed credentials");
        }

        self.set_state(State::Provisioning).await;
        self.set_error(ErrorCode::None).await;

        if let Err(e) = self.backend.set_station_mode().await {
            warn!("Failed to set station mode: {}", e);
        }

        if let Err(e) = self
            .backend
            .apply_and_connect(&credentials.ssid, &credentials.password)
            .await
        {
            warn!(ssid = %credentials.ssid, "Unable to connect: {}", e);
            self.pending = None;
            self.set_error(ErrorCode::UnableToConnect).await;
            self.set_state(State::Authorized).await;
        }
    }

    /// Retry a connect that was requested before the station was ready
    pub async fn on_station_started(&self) {
        if self.status.snapshot().state != State::Provisioning {
            debug!("Station started, not provisioning");
            return;
        }

        info!("Station started while provisioning, reissuing connect");
        if let Err(e) = self.backend.connect().await {
            warn!("Connect request failed: {}", e);
        }
    }

    /// Complete provisioning once the station has an address
    pub async fn on_address_acquired(&mut self, address: Option<String>) {
        let address = match address.filter(|a| !a.is_empty()) {
            Some(address) => Some(address),
            None => self
                .backend
                .current_address()
                .await
                .filter(|a| !a.is_empty()),
        };
        info!(?address, "Station address acquired");

        self.set_error(ErrorCode::None).await;
        self.set_state(State::Provisioned).await;

        let urls: Vec<String> = address
            .into_iter()
            .map(|address| format!("http://{}", address))
            .collect();
        self.send_result(encode_response(RpcCommand::WifiSettings, urls.as_slice()))
            .await;

        if let Some(credentials) = self.pending.take() {
            info!(ssid = %credentials.ssid, "Saving Wi-Fi configuration");
            if let Err(e) = self
                .backend
                .persist_config(&credentials.ssid, &credentials.password)
                .await
            {
                warn!("Failed to persist Wi-Fi configuration: {}", e);
            }
        }

        self.disable_advertising().await;
    }

    /// Single entry point for network stack events
    pub async fn handle_network_event(&mut self, event: NetworkEvent) {
        match event {
            NetworkEvent::StationStarted => self.on_station_started().await,
            NetworkEvent::AddressAcquired { address } => self.on_address_acquired(address).await,
        }
    }
}
