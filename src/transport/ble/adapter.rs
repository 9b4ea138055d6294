//! BLE adapter management

use bluer::{
    Adapter, AdapterEvent, Address, DeviceEvent, DeviceProperty,
    adv::{Advertisement, AdvertisementHandle, Type},
    gatt::local::ApplicationHandle,
};
use futures::StreamExt;
use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, warn};

use crate::{
    core::error::{TransportError, TransportResult},
    protocol::AdvertisementData,
    transport::{
        Endpoint, EndpointValues, Transport, TransportEvent,
        ble::{
            gatt::{self, EndpointStore},
            uuids::{IMPROV_SERVICE_UUID, SERVICE_DATA_UUID},
        },
    },
};

#[derive(Default)]
struct Advertising {
    data: Option<AdvertisementData>,
    handle: Option<AdvertisementHandle>,
}

/// BlueZ implementation of the Improv transport
pub struct BleTransport {
    adapter: Adapter,
    events: mpsc::Sender<TransportEvent>,
    store: Mutex<Option<Arc<EndpointStore>>>,
    app_handle: Mutex<Option<ApplicationHandle>>,
    advertising: Arc<Mutex<Advertising>>,
}

impl BleTransport {
    /// Open the default adapter and power it on
    ///
    /// Command writes and client disconnects are delivered on `events`.
    pub async fn new(events: mpsc::Sender<TransportEvent>) -> TransportResult<Self> {
        let session = bluer::Session::new().await?;
        let adapter = session.default_adapter().await?;

        info!("Using BLE adapter: {}", adapter.name());
        adapter.set_powered(true).await?;

        Ok(Self {
            adapter,
            events,
            store: Mutex::new(None),
            app_handle: Mutex::new(None),
            advertising: Arc::new(Mutex::new(Advertising::default())),
        })
    }

    /// Run event loop (process BLE events)
    ///
    /// Watches every known device for connection changes. The controller
    /// stops advertising when a client connects; a disconnect is reported so
    /// the service can decide whether to advertise again.
    pub async fn run_event_loop(&self) -> TransportResult<()> {
        let mut events = self.adapter.events().await?;

        info!("BLE event loop started");

        while let Some(event) = events.next().await {
            match event {
                AdapterEvent::DeviceAdded(addr) => {
                    debug!("Device added: {}", addr);
                    match self.adapter.device(addr) {
                        Ok(device) => {
                            tokio::spawn(watch_device(
                                addr,
                                device,
                                self.advertising.clone(),
                                self.events.clone(),
                            ));
                        }
                        Err(e) => warn!("Cannot watch device {}: {}", addr, e),
                    }
                }
                AdapterEvent::DeviceRemoved(addr) => {
                    debug!("Device removed: {}", addr);
                }
                AdapterEvent::PropertyChanged(_prop) => {}
            }
        }

        warn!("BLE event loop ended");
        Ok(())
    }

    async fn advertise(&self, data: &AdvertisementData) -> TransportResult<AdvertisementHandle> {
        let handle = self.adapter.advertise(advertisement(data)).await?;
        debug!(service_data = %hex::encode(data.service_data), "Advertisement registered");
        Ok(handle)
    }
}

impl Transport for BleTransport {
    async fn create_endpoints(&self, initial: EndpointValues) -> TransportResult<()> {
        let mut app_handle = self.app_handle.lock().await;
        if app_handle.is_some() {
            return Ok(());
        }

        info!("Registering GATT application");
        let store = Arc::new(EndpointStore::new(initial));
        let app = gatt::application(store.clone(), self.events.clone());
        *app_handle = Some(self.adapter.serve_gatt_application(app).await?);
        *self.store.lock().await = Some(store);
        info!("GATT application registered");
        Ok(())
    }

    async fn set_value_and_notify(
        &self,
        endpoint: Endpoint,
        value: Vec<u8>,
    ) -> TransportResult<()> {
        let store = self
            .store
            .lock()
            .await
            .clone()
            .ok_or(TransportError::EndpointsMissing)?;
        store.set(endpoint, value).await;
        Ok(())
    }

    async fn set_advertisement(&self, data: AdvertisementData) -> TransportResult<()> {
        let mut advertising = self.advertising.lock().await;
        if advertising.handle.is_some() {
            // Dropping the old handle unregisters it
            advertising.handle = None;
            advertising.handle = Some(self.advertise(&data).await?);
        }
        advertising.data = Some(data);
        Ok(())
    }

    async fn start_advertising(&self) -> TransportResult<()> {
        let mut advertising = self.advertising.lock().await;
        if advertising.handle.is_some() {
            return Ok(());
        }

        let data = advertising
            .data
            .clone()
            .ok_or_else(|| TransportError::Ble("No advertisement data".to_string()))?;
        advertising.handle = Some(self.advertise(&data).await?);
        info!(local_name = %data.local_name, "Advertising started");
        Ok(())
    }

    async fn stop_advertising(&self) -> TransportResult<()> {
        if self.advertising.lock().await.handle.take().is_some() {
            debug!("Advertisement unregistered");
        }
        Ok(())
    }
}

/// Connectable advertisement carrying the Improv service data
fn advertisement(data: &AdvertisementData) -> Advertisement {
    Advertisement {
        advertisement_type: Type::Peripheral,
        service_uuids: BTreeSet::from([IMPROV_SERVICE_UUID]),
        service_data: BTreeMap::from([(SERVICE_DATA_UUID, data.service_data.to_vec())]),
        discoverable: Some(true),
        local_name: Some(data.local_name.clone()),
        ..Default::default()
    }
}

async fn watch_device(
    addr: Address,
    device: bluer::Device,
    advertising: Arc<Mutex<Advertising>>,
    events: mpsc::Sender<TransportEvent>,
) {
    let device_events = match device.events().await {
        Ok(stream) => stream,
        Err(e) => {
            warn!("Cannot subscribe to device {} events: {}", addr, e);
            return;
        }
    };
    futures::pin_mut!(device_events);

    while let Some(event) = device_events.next().await {
        if let DeviceEvent::PropertyChanged(DeviceProperty::Connected(connected)) = event {
            if connected {
                info!("Client connected: {}", addr);
                advertising.lock().await.handle = None;
            } else {
                info!("Client disconnected: {}", addr);
                if events.send(TransportEvent::ClientDisconnected).await.is_err() {
                    break;
                }
            }
        }
    }
}
