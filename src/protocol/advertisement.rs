//! Discovery payload broadcast while the service is advertising

/// Length of the Improv service data payload
pub const SERVICE_DATA_LEN: usize = 6;

/// Advertised name used when the device info carries none
pub const DEFAULT_LOCAL_NAME: &str = "ImprovDevice";

/// Project the current status and capabilities into the service data payload
pub fn project(status: u8, capabilities: u8) -> [u8; SERVICE_DATA_LEN] {
    [status, capabilities, 0, 0, 0, 0]
}

/// Everything the transport needs to (re)build its advertisement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvertisementData {
    pub service_data: [u8; SERVICE_DATA_LEN],
    /// Sent in the scan response
    pub local_name: String,
}

impl AdvertisementData {
    pub fn new(status: u8, capabilities: u8, device_name: &str) -> Self {
        let local_name = if device_name.is_empty() {
            DEFAULT_LOCAL_NAME.to_string()
        } else {
            device_name.to_string()
        };

        Self {
            service_data: project(status, capabilities),
            local_name,
        }
    }
}
