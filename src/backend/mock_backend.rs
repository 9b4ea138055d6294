//! Mock WiFi backend for testing

use std::sync::Arc;
use tokio::sync::{Mutex, broadcast};

use crate::backend::{NetworkEvent, WifiBackend};
use crate::core::error::{WifiError, WifiResult};

/// A request the engine issued to the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    SetStationMode,
    ApplyAndConnect { ssid: String, password: String },
    PersistConfig { ssid: String, password: String },
    Connect,
}

/// Internal state for the mock backend
#[derive(Debug, Clone, Default)]
struct MockState {
    calls: Vec<BackendCall>,
    should_fail_station_mode: bool,
    should_fail_apply: bool,
    should_fail_persist: bool,
    address: Option<String>,
}

/// Mock WiFi backend for testing
///
/// Allows configuring behavior for tests without requiring actual hardware.
#[derive(Debug, Clone)]
pub struct MockWifiBackend {
    inner: Arc<Mutex<MockState>>,
    events: broadcast::Sender<NetworkEvent>,
}

impl MockWifiBackend {
    /// Create a new mock backend with default state
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            inner: Arc::new(Mutex::new(MockState::default())),
            events,
        }
    }

    /// Configure mock to fail station mode switches
    pub async fn set_station_mode_failure(&self, should_fail: bool) {
        self.inner.lock().await.should_fail_station_mode = should_fail;
    }

    /// Configure mock to reject apply-and-connect requests
    pub async fn set_apply_failure(&self, should_fail: bool) {
        self.inner.lock().await.should_fail_apply = should_fail;
    }

    /// Configure mock to fail persisting credentials
    pub async fn set_persist_failure(&self, should_fail: bool) {
        self.inner.lock().await.should_fail_persist = should_fail;
    }

    /// Address reported by `current_address`
    pub async fn set_address(&self, address: Option<&str>) {
        self.inner.lock().await.address = address.map(str::to_string);
    }

    /// Every request issued so far, oldest first
    pub async fn calls(&self) -> Vec<BackendCall> {
        self.inner.lock().await.calls.clone()
    }

    /// Simulate the platform raising a network event
    pub fn emit(&self, event: NetworkEvent) {
        let _ = self.events.send(event);
    }
}

impl Default for MockWifiBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl WifiBackend for MockWifiBackend {
    async fn set_station_mode(&self) -> WifiResult<()> {
        let mut state = self.inner.lock().await;
        state.calls.push(BackendCall::SetStationMode);
        if state.should_fail_station_mode {
            Err(WifiError::InterfaceError("Mock station mode failure".into()))
        } else {
            Ok(())
        }
    }

    async fn apply_and_connect(&self, ssid: &str, password: &str) -> WifiResult<()> {
        let mut state = self.inner.lock().await;
        state.calls.push(BackendCall::ApplyAndConnect {
            ssid: ssid.to_string(),
            password: password.to_string(),
        });
        if state.should_fail_apply {
            Err(WifiError::ConnectionFailed("Mock connect failure".into()))
        } else {
            Ok(())
        }
    }

    async fn persist_config(&self, ssid: &str, password: &str) -> WifiResult<()> {
        let mut state = self.inner.lock().await;
        state.calls.push(BackendCall::PersistConfig {
            ssid: ssid.to_string(),
            password: password.to_string(),
        });
        if state.should_fail_persist {
            Err(WifiError::WpaSupplicantError("Mock persist failure".into()))
        } else {
            Ok(())
        }
    }

    async fn connect(&self) -> WifiResult<()> {
        self.inner.lock().await.calls.push(BackendCall::Connect);
        Ok(())
    }

    async fn current_address(&self) -> Option<String> {
        self.inner.lock().await.address.clone()
    }

    fn subscribe(&self) -> broadcast::Receiver<NetworkEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_backend_records_calls() {
        let backend = MockWifiBackend::new();

        backend.set_station_mode().await.unwrap();
        backend.apply_and_connect("MyNetwork", "pass").await.unwrap();
        backend.connect().await.unwrap();

        assert_eq!(
            backend.calls().await,
            vec![
                BackendCall::SetStationMode,
                BackendCall::ApplyAndConnect {
                    ssid: "MyNetwork".into(),
                    password: "pass".into(),
                },
                BackendCall::Connect,
            ]
        );
    }

    #[tokio::test]
    async fn test_mock_backend_apply_failure() {
        let backend = MockWifiBackend::new();
        backend.set_apply_failure(true).await;

        assert!(backend.apply_and_connect("MyNetwork", "pass").await.is_err());
    }

    #[tokio::test]
    async fn test_mock_backend_events() {
        let backend = MockWifiBackend::new();
        let mut events = backend.subscribe();

        backend.emit(NetworkEvent::StationStarted);
        assert_eq!(events.recv().await.unwrap(), NetworkEvent::StationStarted);
    }

    #[tokio::test]
    async fn test_mock_backend_address() {
        let backend = MockWifiBackend::new();
        assert_eq!(backend.current_address().await, None);

        backend.set_address(Some("192.0.2.5")).await;
        assert_eq!(backend.current_address().await, Some("192.0.2.5".into()));
    }
}
