//! Command dispatcher and service lifecycle
//!
//! Nothing here fails outward: every protocol fault ends up in the Improv
//! error indicator where the client can observe it.

use tracing::{debug, info, warn};

use crate::{
    backend::WifiBackend,
    core::{
        engine::Engine,
        error::{ServiceError, ServiceResult},
        types::{ErrorCode, State},
    },
    protocol::{
        Command, FrameError, RpcCommand,
        frame::{self, MIN_FRAME_LEN},
    },
    transport::{EndpointValues, Transport},
};

impl<T: Transport, B: WifiBackend> Engine<T, B> {
    /// Arm the engine and start advertising
    ///
    /// The endpoint set is created on the first call; a failure there is the
    /// only error reported to the caller.
    pub async fn start(&mut self) -> ServiceResult<()> {
        if !self.endpoints_created {
            let snapshot = self.status.snapshot();
            self.transport
                .create_endpoints(EndpointValues {
                    status: snapshot.state.into(),
                    error: snapshot.error.into(),
                    capabilities: self.capabilities.bits(),
                })
                .await
                .map_err(ServiceError::EndpointCreation)?;
            self.endpoints_created = true;
            info!("Improv endpoints created");
        }

        self.set_error(ErrorCode::None).await;
        // Authorization is not implemented, so AwaitingAuthorization is skipped
        self.set_state(State::Authorized).await;

        self.advertising_enabled = true;
        self.refresh_advertisement().await;
        self.ensure_advertising().await;
        info!("Improv service started");
        Ok(())
    }

    /// Disable advertising and reset to `Stopped`
    ///
    /// An in-flight connect attempt in the backend is not aborted.
    pub async fn stop(&mut self) {
        self.disable_advertising().await;
        self.set_state(State::Stopped).await;
        self.set_error(ErrorCode::None).await;
        info!("Improv service stopped");
    }

    /// Handle bytes written to the RPC command endpoint
    pub async fn handle_command(&mut self, data: &[u8]) {
        debug!(len = data.len(), "Improv command received");
        if data.len() < MIN_FRAME_LEN {
            warn!(len = data.len(), "Improv command too short");
            self.set_error(ErrorCode::InvalidRpc).await;
            return;
        }

        let command = match frame::decode(data) {
            Ok(command) => command,
            Err(FrameError::BadChecksum) => {
                warn!("Improv checksum failure");
                self.set_error(ErrorCode::InvalidRpc).await;
                return;
            }
            Err(FrameError::Malformed) => {
                warn!(len = data.len(), "Malformed Improv command");
                self.set_error(ErrorCode::InvalidRpc).await;
                return;
            }
        };

        match command {
            Command::WifiSettings { ssid, password } => {
                info!(%ssid, "Wi-Fi credentials received");
                self.begin_connection(ssid, password).await;
            }
            Command::Identify => {
                info!("Identify request received, not implemented");
            }
            Command::GetDeviceInfo => {
                self.set_error(ErrorCode::None).await;
                let frame = frame::encode_response(
                    RpcCommand::GetDeviceInfo,
                    &self.device_info.fields(),
                );
                self.send_result(frame).await;
            }
            Command::Unknown(code) => {
                warn!("Unknown Improv command: 0x{:02X}", code);
                self.set_error(ErrorCode::UnknownRpc).await;
            }
        }
    }
}
