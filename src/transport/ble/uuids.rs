//! BLE GATT UUIDs of the Improv service

use uuid::Uuid;

/// Improv service UUID
pub const IMPROV_SERVICE_UUID: Uuid = Uuid::from_u128(0x00467768_6228_2272_4663_277478268000);

/// Current state characteristic (read/notify)
pub const STATUS_CHAR_UUID: Uuid = Uuid::from_u128(0x00467768_6228_2272_4663_277478268001);

/// Current error characteristic (read/notify)
pub const ERROR_CHAR_UUID: Uuid = Uuid::from_u128(0x00467768_6228_2272_4663_277478268002);

/// RPC command characteristic (write)
pub const RPC_COMMAND_CHAR_UUID: Uuid = Uuid::from_u128(0x00467768_6228_2272_4663_277478268003);

/// RPC result characteristic (read/notify)
pub const RPC_RESULT_CHAR_UUID: Uuid = Uuid::from_u128(0x00467768_6228_2272_4663_277478268004);

/// Capabilities characteristic (read)
pub const CAPABILITIES_CHAR_UUID: Uuid = Uuid::from_u128(0x00467768_6228_2272_4663_277478268005);

/// Short 0x4677 UUID the service data is advertised under
pub const SERVICE_DATA_UUID: Uuid = Uuid::from_u128(0x00004677_0000_1000_8000_00805f9b34fb);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid_format() {
        assert_eq!(
            IMPROV_SERVICE_UUID.to_string(),
            "00467768-6228-2272-4663-277478268000"
        );
        assert_eq!(
            RPC_RESULT_CHAR_UUID.to_string(),
            "00467768-6228-2272-4663-277478268004"
        );
        assert_eq!(
            SERVICE_DATA_UUID.to_string(),
            "00004677-0000-1000-8000-00805f9b34fb"
        );
    }

    #[test]
    fn test_characteristic_uuids_unique() {
        // Ensure all characteristic UUIDs are unique
        let uuids = [
            STATUS_CHAR_UUID,
            ERROR_CHAR_UUID,
            RPC_COMMAND_CHAR_UUID,
            RPC_RESULT_CHAR_UUID,
            CAPABILITIES_CHAR_UUID,
        ];

        for (i, uuid1) in uuids.iter().enumerate() {
            for (j, uuid2) in uuids.iter().enumerate() {
                if i != j {
                    assert_ne!(
                        uuid1, uuid2,
                        "UUIDs at positions {} and {} are not unique",
                        i, j
                    );
                }
            }
        }
    }
}
