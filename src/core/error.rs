//! Error types for the Improv BLE service

use thiserror::Error;

/// Result type for network backend operations
pub type WifiResult<T> = Result<T, WifiError>;

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// Errors related to the network stack collaborator
#[derive(Error, Debug, Clone)]
pub enum WifiError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Network interface error: {0}")]
    InterfaceError(String),

    #[error("wpa_supplicant error: {0}")]
    WpaSupplicantError(String),
}

/// Errors reported synchronously by the service
///
/// Everything after a successful `start()` is absorbed into the Improv
/// error indicator instead.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Failed to create endpoint set: {0}")]
    EndpointCreation(#[source] TransportError),
}

/// Errors related to the transport layer
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("BLE error: {0}")]
    Ble(String),

    #[error("Endpoint set not created")]
    EndpointsMissing,

    #[error("Event channel closed")]
    ChannelClosed,
}

impl From<bluer::Error> for TransportError {
    fn from(e: bluer::Error) -> Self {
        TransportError::Ble(e.to_string())
    }
}

/// Errors related to loading runtime settings
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid device info file: {0}")]
    Json(#[from] serde_json::Error),
}
