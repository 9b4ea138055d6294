//! Improv BLE Service - Main Entry Point

use std::sync::Arc;

use clap::Parser;
use improv_ble_service::{
    ImprovService, StatusSnapshot,
    backend::{WifiBackend, WifiCtrlBackend},
    config::{CliArgs, Settings},
    transport::ble::BleTransport,
};
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const TRANSPORT_EVENT_CAPACITY: usize = 32;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,improv_ble_service=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse CLI arguments
    let args = CliArgs::parse();
    info!(?args, "Starting Improv BLE service");
    let settings = Settings::try_from(args)?;

    // Create WiFi backend
    let backend = Arc::new(WifiCtrlBackend::new(settings.interface.clone()).await?);
    info!("WiFi backend initialized for interface: {}", settings.interface);

    if !settings.force {
        match backend.has_configured_network().await {
            Ok(true) => {
                info!("Network already configured, connecting instead of provisioning");
                backend.connect().await?;
                return Ok(());
            }
            Ok(false) => {}
            Err(e) => warn!("Cannot list configured networks: {}", e),
        }
    }

    // Create BLE transport and the Improv service
    let (transport_tx, transport_rx) = mpsc::channel(TRANSPORT_EVENT_CAPACITY);
    let transport = match BleTransport::new(transport_tx).await {
        Ok(transport) => Arc::new(transport),
        Err(e) => {
            error!("Failed to start BLE transport: {}", e);
            return Err(e.into());
        }
    };
    let service = Arc::new(ImprovService::new(
        transport.clone(),
        backend.clone(),
        settings.device_info,
    ));

    let mut tasks = Vec::new();

    let (current, updates) = service.subscribe_with_snapshot().await;
    info!(state = ?current.state, error = ?current.error, "Improv status");
    tasks.push(tokio::spawn(log_status(updates)));

    tasks.push(tokio::spawn({
        let transport = transport.clone();
        async move {
            if let Err(e) = transport.run_event_loop().await {
                error!("BLE adapter error: {}", e);
            }
        }
    }));

    tasks.push(tokio::spawn({
        let service = service.clone();
        async move { service.run_transport_events(transport_rx).await }
    }));

    tasks.push(tokio::spawn({
        let service = service.clone();
        let events = backend.subscribe();
        async move { service.run_network_events(events).await }
    }));

    if let Err(e) = service.start().await {
        error!("Failed to start Improv service: {}", e);
        return Err(e.into());
    }

    #[cfg(feature = "systemd")]
    if let Err(e) = sd_notify::notify(false, &[sd_notify::NotifyState::Ready]) {
        warn!("Failed to notify systemd: {}", e);
    }

    info!("Service started successfully");

    // Wait for shutdown signal
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received SIGINT (Ctrl+C), shutting down gracefully");
        }
        result = shutdown_signal() => {
            match result {
                Ok(()) => info!("Received SIGTERM, shutting down gracefully"),
                Err(e) => error!("Failed to wait for SIGTERM: {}", e),
            }
        }
    }

    info!("Shutting down...");
    service.stop().await;
    for task in tasks {
        task.abort();
    }
    Ok(())
}

async fn log_status(mut updates: broadcast::Receiver<StatusSnapshot>) {
    loop {
        match updates.recv().await {
            Ok(snapshot) => {
                info!(state = ?snapshot.state, error = ?snapshot.error, "Improv status");
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("Status receiver lagged, {} updates skipped", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

#[cfg(unix)]
async fn shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())?;
    sigterm.recv().await;
    Ok(())
}

#[cfg(not(unix))]
async fn shutdown_signal() -> std::io::Result<()> {
    // On non-Unix platforms, just wait forever
    std::future::pending().await
}
