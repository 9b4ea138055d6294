//! Mock transport for testing

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::{
    core::error::{TransportError, TransportResult},
    protocol::AdvertisementData,
    transport::{Endpoint, EndpointValues, Transport},
};

/// Internal state for the mock transport
#[derive(Debug, Clone, Default)]
struct MockState {
    should_fail_create: bool,
    created: Vec<EndpointValues>,
    writes: Vec<(Endpoint, Vec<u8>)>,
    advertisement: Option<AdvertisementData>,
    advertising: bool,
    advertising_starts: usize,
}

/// Mock transport for testing
///
/// Records every call so tests can assert on what a client would observe.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure mock to fail endpoint set creation
    pub async fn set_create_failure(&self, should_fail: bool) {
        self.inner.lock().await.should_fail_create = should_fail;
    }

    /// Initial values of every successful endpoint set creation
    pub async fn created(&self) -> Vec<EndpointValues> {
        self.inner.lock().await.created.clone()
    }

    /// All values written to the given endpoint, oldest first
    pub async fn writes_to(&self, endpoint: Endpoint) -> Vec<Vec<u8>> {
        self.inner
            .lock()
            .await
            .writes
            .iter()
            .filter(|(e, _)| *e == endpoint)
            .map(|(_, value)| value.clone())
            .collect()
    }

    pub async fn last_value(&self, endpoint: Endpoint) -> Option<Vec<u8>> {
        self.writes_to(endpoint).await.pop()
    }

    pub async fn advertisement(&self) -> Option<AdvertisementData> {
        self.inner.lock().await.advertisement.clone()
    }

    pub async fn is_advertising(&self) -> bool {
        self.inner.lock().await.advertising
    }

    /// Number of times advertising actually went from stopped to started
    pub async fn advertising_starts(&self) -> usize {
        self.inner.lock().await.advertising_starts
    }

    /// Simulate the stack dropping the advertisement when a client connects
    pub async fn client_connected(&self) {
        self.inner.lock().await.advertising = false;
    }
}

impl Transport for MockTransport {
    async fn create_endpoints(&self, initial: EndpointValues) -> TransportResult<()> {
        let mut state = self.inner.lock().await;
        if state.should_fail_create {
            return Err(TransportError::Ble("Mock endpoint creation failure".into()));
        }
        state.created.push(initial);
        Ok(())
    }

    async fn set_value_and_notify(
        &self,
        endpoint: Endpoint,
        value: Vec<u8>,
    ) -> TransportResult<()> {
        self.inner.lock().await.writes.push((endpoint, value));
        Ok(())
    }

    async fn set_advertisement(&self, data: AdvertisementData) -> TransportResult<()> {
        self.inner.lock().await.advertisement = Some(data);
        Ok(())
    }

    async fn start_advertising(&self) -> TransportResult<()> {
        let mut state = self.inner.lock().await;
        if !state.advertising {
            state.advertising = true;
            state.advertising_starts += 1;
        }
        Ok(())
    }

    async fn stop_advertising(&self) -> TransportResult<()> {
        self.inner.lock().await.advertising = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_transport_records_writes() {
        let transport = MockTransport::new();

        transport
            .set_value_and_notify(Endpoint::Status, vec![0x02])
            .await
            .unwrap();
        transport
            .set_value_and_notify(Endpoint::Error, vec![0x01])
            .await
            .unwrap();
        transport
            .set_value_and_notify(Endpoint::Status, vec![0x03])
            .await
            .unwrap();

        assert_eq!(
            transport.writes_to(Endpoint::Status).await,
            vec![vec![0x02], vec![0x03]]
        );
        assert_eq!(transport.last_value(Endpoint::Error).await, Some(vec![0x01]));
        assert_eq!(transport.last_value(Endpoint::RpcResult).await, None);
    }

    #[tokio::test]
    async fn test_mock_transport_advertising() {
        let transport = MockTransport::new();

        transport.start_advertising().await.unwrap();
        transport.start_advertising().await.unwrap();
        assert!(transport.is_advertising().await);
        assert_eq!(transport.advertising_starts().await, 1);

        transport.stop_advertising().await.unwrap();
        assert!(!transport.is_advertising().await);
    }

    #[tokio::test]
    async fn test_mock_transport_create_failure() {
        let transport = MockTransport::new();
        transport.set_create_failure(true).await;

        let initial = EndpointValues {
            status: 0,
            error: 0,
            capabilities: 0,
        };
        assert!(transport.create_endpoints(initial).await.is_err());
        assert!(transport.created().await.is_empty());
    }
}
