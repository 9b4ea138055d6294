//! Runtime settings

use serde::Deserialize;
use std::path::Path;

use crate::{
    config::CliArgs,
    core::{error::ConfigError, types::DeviceInfo},
};

/// Runtime configuration settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub interface: String,
    pub device_info: DeviceInfo,
    pub force: bool,
}

/// Device info file contents; absent keys keep the command-line value
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct DeviceInfoFile {
    firmware_name: Option<String>,
    firmware_version: Option<String>,
    hardware_variant: Option<String>,
    device_name: Option<String>,
}

impl DeviceInfoFile {
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    fn apply(self, info: &mut DeviceInfo) {
        let overrides = [
            (self.firmware_name, &mut info.firmware_name),
            (self.firmware_version, &mut info.firmware_version),
            (self.hardware_variant, &mut info.hardware_variant),
            (self.device_name, &mut info.device_name),
        ];
        for (value, field) in overrides {
            if let Some(value) = value {
                *field = value;
            }
        }
    }
}

impl TryFrom<CliArgs> for Settings {
    type Error = ConfigError;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let mut device_info = DeviceInfo {
            firmware_name: args.firmware_name,
            firmware_version: args.firmware_version,
            hardware_variant: args.hardware_variant,
            device_name: args.device_name,
        };

        if let Some(path) = &args.device_info {
            DeviceInfoFile::load(path)?.apply(&mut device_info);
        }

        Ok(Settings {
            interface: args.interface,
            device_info,
            force: args.force,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use tokio_test::{assert_err, assert_ok};

    fn args_with_file(path: &Path) -> CliArgs {
        CliArgs::parse_from([
            "improv-ble-service",
            "--device-name",
            "From CLI",
            "--hardware-variant",
            "rpi4",
            "--device-info",
            path.to_str().unwrap(),
        ])
    }

    #[test]
    fn test_settings_from_cli_only() {
        let args = CliArgs::parse_from(["improv-ble-service", "-n", "Garage Door", "--force"]);

        let settings = assert_ok!(Settings::try_from(args));

        assert_eq!(settings.interface, "wlan0");
        assert!(settings.force);
        assert_eq!(settings.device_info.device_name, "Garage Door");
        assert_eq!(settings.device_info.firmware_name, env!("CARGO_PKG_NAME"));
    }

    #[test]
    fn test_device_info_file_overrides_cli() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"device_name": "From File", "firmware_version": "2.0.0"}}"#
        )
        .unwrap();

        let settings = assert_ok!(Settings::try_from(args_with_file(file.path())));

        assert_eq!(
            settings.device_info,
            DeviceInfo {
                firmware_name: env!("CARGO_PKG_NAME").to_string(),
                firmware_version: "2.0.0".to_string(),
                hardware_variant: "rpi4".to_string(),
                device_name: "From File".to_string(),
            }
        );
    }

    #[test]
    fn test_invalid_device_info_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"device_name": 42}}"#).unwrap();

        let err = assert_err!(Settings::try_from(args_with_file(file.path())));
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn test_unknown_device_info_key() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"device_name": "From File", "serial": "1234"}}"#).unwrap();

        let err = assert_err!(Settings::try_from(args_with_file(file.path())));
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn test_missing_device_info_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");

        let err = assert_err!(Settings::try_from(args_with_file(&path)));
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
