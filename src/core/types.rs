//! Domain types for Improv provisioning

use serde::{Deserialize, Serialize};

/// Improv provisioning state
///
/// The numeric values are part of the wire contract (Status endpoint and
/// discovery payload).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum State {
    Stopped = 0x00,
    /// Reserved: authorization is not implemented, so this state is never entered.
    AwaitingAuthorization = 0x01,
    Authorized = 0x02,
    Provisioning = 0x03,
    Provisioned = 0x04,
}

impl TryFrom<u8> for State {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, <Self as TryFrom<u8>>::Error> {
        match value {
            0x00 => Ok(State::Stopped),
            0x01 => Ok(State::AwaitingAuthorization),
            0x02 => Ok(State::Authorized),
            0x03 => Ok(State::Provisioning),
            0x04 => Ok(State::Provisioned),
            _ => Err(()),
        }
    }
}

impl From<State> for u8 {
    fn from(state: State) -> Self {
        state as u8
    }
}

/// Improv error indicator, published alongside [`State`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ErrorCode {
    None = 0x00,
    InvalidRpc = 0x01,
    UnknownRpc = 0x02,
    UnableToConnect = 0x03,
    /// Reserved: never raised while authorization is unimplemented.
    NotAuthorized = 0x04,
    Unknown = 0xFF,
}

impl TryFrom<u8> for ErrorCode {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, <Self as TryFrom<u8>>::Error> {
        match value {
            0x00 => Ok(ErrorCode::None),
            0x01 => Ok(ErrorCode::InvalidRpc),
            0x02 => Ok(ErrorCode::UnknownRpc),
            0x03 => Ok(ErrorCode::UnableToConnect),
            0x04 => Ok(ErrorCode::NotAuthorized),
            0xFF => Ok(ErrorCode::Unknown),
            _ => Err(()),
        }
    }
}

impl From<ErrorCode> for u8 {
    fn from(error: ErrorCode) -> Self {
        error as u8
    }
}

/// Combined (state, error) value delivered to status subscribers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub state: State,
    pub error: ErrorCode,
}

/// Optional capability bitmask advertised by the device
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities(u8);

impl Capabilities {
    /// No optional capability
    pub const NONE: Capabilities = Capabilities(0x00);
    /// Device can identify itself (blink, beep, ...) on request
    pub const IDENTIFY: Capabilities = Capabilities(0x01);

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, other: Capabilities) -> bool {
        self.0 & other.0 == other.0
    }
}

/// Static device description returned by the "get device info" command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceInfo {
    pub firmware_name: String,
    pub firmware_version: String,
    pub hardware_variant: String,
    pub device_name: String,
}

impl DeviceInfo {
    /// Fields in the order they appear in the device info response
    pub fn fields(&self) -> [&str; 4] {
        [
            self.firmware_name.as_str(),
            self.firmware_version.as_str(),
            self.hardware_variant.as_str(),
            self.device_name.as_str(),
        ]
    }
}

/// Wi-Fi credentials accepted from a client but not yet confirmed connected
#[derive(Clone, PartialEq, Eq)]
pub struct PendingCredentials {
    pub ssid: String,
    pub password: String,
}

impl std::fmt::Debug for PendingCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingCredentials")
            .field("ssid", &self.ssid)
            .field("password", &"<redacted>")
            .finish()
    }
}
