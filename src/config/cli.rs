//! Command-line argument parsing

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[clap(name = "improv-ble-service", version, author)]
#[clap(about = "Improv Wi-Fi provisioning over Bluetooth Low Energy")]
pub struct CliArgs {
    /// Wireless network interface name
    #[clap(short, long, default_value = "wlan0")]
    pub interface: String,

    /// Name advertised to clients and reported in the device info
    #[clap(short = 'n', long, default_value = "")]
    pub device_name: String,

    /// Firmware name reported in the device info
    #[clap(long, default_value = env!("CARGO_PKG_NAME"))]
    pub firmware_name: String,

    /// Firmware version reported in the device info
    #[clap(long, default_value = env!("CARGO_PKG_VERSION"))]
    pub firmware_version: String,

    /// Hardware variant reported in the device info
    #[clap(long, default_value = "linux")]
    pub hardware_variant: String,

    /// JSON file with device info fields; overrides the flags above
    #[clap(long)]
    pub device_info: Option<PathBuf>,

    /// Start provisioning even if a network is already configured
    #[clap(short, long)]
    pub force: bool,
}
