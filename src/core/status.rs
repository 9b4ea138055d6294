//! Status/Error model
//!
//! Holds the two independent indicators a client observes. Every setter call
//! publishes exactly one snapshot to subscribers, even when the value does not
//! change; the wire endpoint is only rewritten on an actual change.

use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::{
    core::types::{ErrorCode, State, StatusSnapshot},
    transport::{Endpoint, Transport},
};

/// Current (state, error) pair and its publication
pub struct StatusModel<T: Transport> {
    transport: Arc<T>,
    state: State,
    error: ErrorCode,
    updates: broadcast::Sender<StatusSnapshot>,
}

impl<T: Transport> StatusModel<T> {
    /// Create a model in `Stopped` / `None`
    pub fn new(transport: Arc<T>, updates: broadcast::Sender<StatusSnapshot>) -> Self {
        Self {
            transport,
            state: State::Stopped,
            error: ErrorCode::None,
            updates,
        }
    }

    /// Set the state and notify subscribers
    ///
    /// Returns `true` when the value changed.
    pub async fn set_state(&mut self, state: State) -> bool {
        let changed = self.state != state;
        if changed {
            info!(from = ?self.state, to = ?state, "Improv state changed");
            self.state = state;
            self.write(Endpoint::Status, state.into()).await;
        }
        self.publish();
        changed
    }

    /// Set the error and notify subscribers
    ///
    /// Returns `true` when the value changed.
    pub async fn set_error(&mut self, error: ErrorCode) -> bool {
        let changed = self.error != error;
        if changed {
            info!(from = ?self.error, to = ?error, "Improv error changed");
            self.error = error;
            self.write(Endpoint::Error, error.into()).await;
        }
        self.publish();
        changed
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            state: self.state,
            error: self.error,
        }
    }

    async fn write(&self, endpoint: Endpoint, value: u8) {
        if let Err(e) = self
            .transport
            .set_value_and_notify(endpoint, vec![value])
            .await
        {
            warn!("Failed to update {:?} endpoint: {}", endpoint, e);
        }
    }

    fn publish(&self) {
        // No subscribers is not an error
        let _ = self.updates.send(self.snapshot());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;
    use pretty_assertions::assert_eq;

    fn create_test_model() -> (
        StatusModel<MockTransport>,
        Arc<MockTransport>,
        broadcast::Receiver<StatusSnapshot>,
    ) {
        let transport = Arc::new(MockTransport::new());
        let (tx, rx) = broadcast::channel(16);
        (StatusModel::new(transport.clone(), tx), transport, rx)
    }

    #[tokio::test]
    async fn test_initial_snapshot() {
        let (model, transport, _rx) = create_test_model();

        assert_eq!(
            model.snapshot(),
            StatusSnapshot {
                state: State::Stopped,
                error: ErrorCode::None,
            }
        );
        assert!(transport.writes_to(Endpoint::Status).await.is_empty());
    }

    #[tokio::test]
    async fn test_set_state_twice_notifies_twice_writes_once() {
        let (mut model, transport, mut rx) = create_test_model();

        assert!(model.set_state(State::Authorized).await);
        assert!(!model.set_state(State::Authorized).await);

        let expected = StatusSnapshot {
            state: State::Authorized,
            error: ErrorCode::None,
        };
        assert_eq!(rx.try_recv().unwrap(), expected);
        assert_eq!(rx.try_recv().unwrap(), expected);
        assert!(rx.try_recv().is_err());

        assert_eq!(transport.writes_to(Endpoint::Status).await, vec![vec![0x02]]);
    }

    #[tokio::test]
    async fn test_set_error_twice_notifies_twice_writes_once() {
        let (mut model, transport, mut rx) = create_test_model();

        model.set_error(ErrorCode::InvalidRpc).await;
        model.set_error(ErrorCode::InvalidRpc).await;

        assert_eq!(rx.try_recv().unwrap().error, ErrorCode::InvalidRpc);
        assert_eq!(rx.try_recv().unwrap().error, ErrorCode::InvalidRpc);
        assert_eq!(transport.writes_to(Endpoint::Error).await, vec![vec![0x01]]);
        assert!(transport.writes_to(Endpoint::Status).await.is_empty());
    }

    #[tokio::test]
    async fn test_axes_are_independent() {
        let (mut model, _transport, mut rx) = create_test_model();

        model.set_state(State::Provisioning).await;
        model.set_error(ErrorCode::UnableToConnect).await;

        assert_eq!(
            rx.try_recv().unwrap(),
            StatusSnapshot {
                state: State::Provisioning,
                error: ErrorCode::None,
            }
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            StatusSnapshot {
                state: State::Provisioning,
                error: ErrorCode::UnableToConnect,
            }
        );
    }

    #[tokio::test]
    async fn test_publish_without_subscribers() {
        let transport = Arc::new(MockTransport::new());
        let (tx, rx) = broadcast::channel(16);
        drop(rx);

        let mut model = StatusModel::new(transport.clone(), tx);
        assert!(model.set_state(State::Authorized).await);
        assert_eq!(model.snapshot().state, State::Authorized);
    }
}
