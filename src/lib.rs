//! Improv BLE Service
//!
//! Hands Wi-Fi credentials to a headless device following the Improv
//! provisioning protocol:
//! - Frame codec and discovery payload (`protocol`)
//! - Provisioning state machine, command dispatcher and connection
//!   coordinator (`core`)
//! - Bluetooth Low Energy transport (`transport`)
//! - wpa_supplicant network backend (`backend`)

pub mod backend;
pub mod config;
pub mod core;
pub mod protocol;
pub mod transport;

pub use core::{
    error::{ServiceError, TransportError, WifiError},
    service::ImprovService,
    types::{Capabilities, DeviceInfo, ErrorCode, State, StatusSnapshot},
};
