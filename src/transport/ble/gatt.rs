//! GATT server implementation

use bluer::gatt::local::{
    Application, Characteristic, CharacteristicNotifier, CharacteristicNotify,
    CharacteristicNotifyMethod, CharacteristicRead, CharacteristicWrite,
    CharacteristicWriteMethod, ReqError, Service,
};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    core::error::{TransportError, TransportResult},
    transport::{Endpoint, EndpointValues, TransportEvent},
};

use super::uuids::*;

#[derive(Default)]
struct Slot {
    value: Vec<u8>,
    notifier: Option<CharacteristicNotifier>,
}

/// Current values of the readable endpoints and their notification sessions
pub struct EndpointStore {
    slots: Mutex<HashMap<Endpoint, Slot>>,
}

impl EndpointStore {
    pub fn new(initial: EndpointValues) -> Self {
        let slots = [
            (Endpoint::Status, vec![initial.status]),
            (Endpoint::Error, vec![initial.error]),
            (Endpoint::Capabilities, vec![initial.capabilities]),
            (Endpoint::RpcResult, Vec::new()),
        ]
        .into_iter()
        .map(|(endpoint, value)| {
            (
                endpoint,
                Slot {
                    value,
                    notifier: None,
                },
            )
        })
        .collect();

        Self {
            slots: Mutex::new(slots),
        }
    }

    /// Value as seen by a read starting at `offset`
    pub async fn read(&self, endpoint: Endpoint, offset: usize) -> Vec<u8> {
        let slots = self.slots.lock().await;
        slots
            .get(&endpoint)
            .and_then(|slot| slot.value.get(offset..))
            .map(<[u8]>::to_vec)
            .unwrap_or_default()
    }

    /// Store a value and push it to the subscribed client, if any
    pub async fn set(&self, endpoint: Endpoint, value: Vec<u8>) {
        let mut slots = self.slots.lock().await;
        let slot = slots.entry(endpoint).or_default();
        slot.value = value;

        if let Some(notifier) = slot.notifier.as_mut() {
            if notifier.is_stopped() {
                slot.notifier = None;
                return;
            }
            if let Err(e) = notifier.notify(slot.value.clone()).await {
                debug!("Dropping {:?} notification session: {}", endpoint, e);
                slot.notifier = None;
            }
        }
    }

    async fn subscribe(&self, endpoint: Endpoint, notifier: CharacteristicNotifier) {
        debug!("Client subscribed to {:?}", endpoint);
        self.slots.lock().await.entry(endpoint).or_default().notifier = Some(notifier);
    }
}

/// Build the Improv GATT application
///
/// Reads are served from `store`; command writes are forwarded on `events`.
pub fn application(store: Arc<EndpointStore>, events: mpsc::Sender<TransportEvent>) -> Application {
    Application {
        services: vec![Service {
            uuid: IMPROV_SERVICE_UUID,
            primary: true,
            characteristics: vec![
                readable(STATUS_CHAR_UUID, Endpoint::Status, store.clone(), true),
                readable(ERROR_CHAR_UUID, Endpoint::Error, store.clone(), true),
                command(events),
                readable(RPC_RESULT_CHAR_UUID, Endpoint::RpcResult, store.clone(), true),
                readable(CAPABILITIES_CHAR_UUID, Endpoint::Capabilities, store, false),
            ],
            ..Default::default()
        }],
        ..Default::default()
    }
}

fn readable(
    uuid: Uuid,
    endpoint: Endpoint,
    store: Arc<EndpointStore>,
    notify: bool,
) -> Characteristic {
    let notify = notify.then(|| CharacteristicNotify {
        notify: true,
        method: CharacteristicNotifyMethod::Fun({
            let store = store.clone();
            Box::new(move |notifier| {
                let store = store.clone();
                Box::pin(async move { store.subscribe(endpoint, notifier).await })
            })
        }),
        ..Default::default()
    });

    Characteristic {
        uuid,
        read: Some(CharacteristicRead {
            read: true,
            fun: Box::new(move |req| {
                let store = store.clone();
                Box::pin(async move { Ok(store.read(endpoint, req.offset.into()).await) })
            }),
            ..Default::default()
        }),
        notify,
        ..Default::default()
    }
}

fn command(events: mpsc::Sender<TransportEvent>) -> Characteristic {
    Characteristic {
        uuid: RPC_COMMAND_CHAR_UUID,
        write: Some(CharacteristicWrite {
            write: true,
            write_without_response: true,
            method: CharacteristicWriteMethod::Fun(Box::new(move |new_value, _req| {
                let events = events.clone();
                Box::pin(async move {
                    debug!("RPC command write received ({} bytes)", new_value.len());
                    forward_command(&events, new_value).await.map_err(|e| {
                        warn!("Command dropped: {}", e);
                        ReqError::Failed
                    })
                })
            })),
            ..Default::default()
        }),
        ..Default::default()
    }
}

async fn forward_command(
    events: &mpsc::Sender<TransportEvent>,
    value: Vec<u8>,
) -> TransportResult<()> {
    events
        .send(TransportEvent::CommandWritten(value))
        .await
        .map_err(|_| TransportError::ChannelClosed)
}
