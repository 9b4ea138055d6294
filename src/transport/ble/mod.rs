//! Bluetooth Low Energy transport layer

pub mod adapter;
pub mod gatt;
pub mod uuids;

pub use {adapter::BleTransport, gatt::EndpointStore, uuids::*};
