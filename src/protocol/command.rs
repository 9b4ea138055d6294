//! Improv RPC command codes

/// RPC command codes published by the Improv BLE protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RpcCommand {
    WifiSettings = 0x01,
    Identify = 0x02,
    GetDeviceInfo = 0x03,
}

impl TryFrom<u8> for RpcCommand {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, <Self as TryFrom<u8>>::Error> {
        match value {
            0x01 => Ok(RpcCommand::WifiSettings),
            0x02 => Ok(RpcCommand::Identify),
            0x03 => Ok(RpcCommand::GetDeviceInfo),
            other => Err(other),
        }
    }
}

impl From<RpcCommand> for u8 {
    fn from(command: RpcCommand) -> Self {
        command as u8
    }
}

/// A command decoded from a device-bound frame
///
/// Frames that fail the checksum or length checks never become a `Command`;
/// [`frame::decode`](super::frame::decode) reports them as
/// [`FrameError`](super::frame::FrameError) instead.
#[derive(Clone, PartialEq, Eq)]
pub enum Command {
    WifiSettings { ssid: String, password: String },
    Identify,
    GetDeviceInfo,
    /// Well-formed frame carrying a code this device does not implement
    Unknown(u8),
}

impl Command {
    /// Wire code of this command
    pub fn code(&self) -> u8 {
        match self {
            Command::WifiSettings { .. } => RpcCommand::WifiSettings.into(),
            Command::Identify => RpcCommand::Identify.into(),
            Command::GetDeviceInfo => RpcCommand::GetDeviceInfo.into(),
            Command::Unknown(code) => *code,
        }
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::WifiSettings { ssid, .. } => f
                .debug_struct("WifiSettings")
                .field("ssid", ssid)
                .field("password", &"<redacted>")
                .finish(),
            Command::Identify => write!(f, "Identify"),
            Command::GetDeviceInfo => write!(f, "GetDeviceInfo"),
            Command::Unknown(code) => write!(f, "Unknown(0x{:02X})", code),
        }
    }
}
