//! BLE characteristic UUIDs.
//!
//! Contains all UUID constants used for Hexiwear communication. These values
//! are a fixed contract with the device firmware and must be reproduced
//! exactly.

use uuid::Uuid;

// Motion service
/// Accelerometer characteristic UUID.
pub const ACCELERATION_UUID: Uuid = Uuid::from_u128(0x0000_2001_0000_1000_8000_00805f9b34fb);
/// Gyroscope characteristic UUID.
pub const GYRO_UUID: Uuid = Uuid::from_u128(0x0000_2002_0000_1000_8000_00805f9b34fb);
/// Magnetometer characteristic UUID.
pub const MAGNET_UUID: Uuid = Uuid::from_u128(0x0000_2003_0000_1000_8000_00805f9b34fb);

// Weather service
/// Ambient light characteristic UUID.
pub const LIGHT_UUID: Uuid = Uuid::from_u128(0x0000_2011_0000_1000_8000_00805f9b34fb);
/// Temperature characteristic UUID.
pub const TEMPERATURE_UUID: Uuid = Uuid::from_u128(0x0000_2012_0000_1000_8000_00805f9b34fb);
/// Humidity characteristic UUID.
pub const HUMIDITY_UUID: Uuid = Uuid::from_u128(0x0000_2013_0000_1000_8000_00805f9b34fb);
/// Air pressure characteristic UUID.
pub const PRESSURE_UUID: Uuid = Uuid::from_u128(0x0000_2014_0000_1000_8000_00805f9b34fb);

// Health service
/// Heart rate characteristic UUID.
pub const HEART_RATE_UUID: Uuid = Uuid::from_u128(0x0000_2021_0000_1000_8000_00805f9b34fb);
/// Step count characteristic UUID.
pub const STEPS_UUID: Uuid = Uuid::from_u128(0x0000_2022_0000_1000_8000_00805f9b34fb);
/// Calorie count characteristic UUID.
pub const CALORIES_UUID: Uuid = Uuid::from_u128(0x0000_2023_0000_1000_8000_00805f9b34fb);

// Battery Service (Standard BLE)
/// Standard Battery Level characteristic UUID (Read, Notify).
pub const BATTERY_UUID: Uuid = Uuid::from_u128(0x0000_2a19_0000_1000_8000_00805f9b34fb);

// Alert service
/// Inbound alert characteristic UUID (phone writes commands to the device).
pub const ALERT_IN_UUID: Uuid = Uuid::from_u128(0x0000_2031_0000_1000_8000_00805f9b34fb);
/// Outbound alert characteristic UUID (device-originated alerts).
pub const ALERT_OUT_UUID: Uuid = Uuid::from_u128(0x0000_2032_0000_1000_8000_00805f9b34fb);

// Mode service
/// Active application mode characteristic UUID.
pub const MODE_UUID: Uuid = Uuid::from_u128(0x0000_2041_0000_1000_8000_00805f9b34fb);

// Device Information Service (Standard BLE)
/// Serial Number characteristic UUID.
pub const SERIAL_NUMBER_UUID: Uuid = Uuid::from_u128(0x0000_2a25_0000_1000_8000_00805f9b34fb);
/// Firmware Revision characteristic UUID.
pub const FIRMWARE_REVISION_UUID: Uuid = Uuid::from_u128(0x0000_2a26_0000_1000_8000_00805f9b34fb);
/// Hardware Revision characteristic UUID.
pub const HARDWARE_REVISION_UUID: Uuid = Uuid::from_u128(0x0000_2a27_0000_1000_8000_00805f9b34fb);
/// Manufacturer Name characteristic UUID.
pub const MANUFACTURER_NAME_UUID: Uuid = Uuid::from_u128(0x0000_2a29_0000_1000_8000_00805f9b34fb);

// OTAP service (firmware update; characteristic identity only)
/// OTAP control point characteristic UUID.
pub const OTAP_CONTROL_POINT_UUID: Uuid = Uuid::from_u128(0x01ff_5551_ba5e_f4ee_5ca1_eb1e5e4b1ce0);
/// OTAP data characteristic UUID.
pub const OTAP_DATA_UUID: Uuid = Uuid::from_u128(0x01ff_5552_ba5e_f4ee_5ca1_eb1e5e4b1ce0);
/// OTAP state characteristic UUID.
pub const OTAP_STATE_UUID: Uuid = Uuid::from_u128(0x01ff_5553_ba5e_f4ee_5ca1_eb1e5e4b1ce0);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid_format() {
        assert_eq!(
            ACCELERATION_UUID.to_string(),
            "00002001-0000-1000-8000-00805f9b34fb"
        );
        assert_eq!(
            BATTERY_UUID.to_string(),
            "00002a19-0000-1000-8000-00805f9b34fb"
        );
        assert_eq!(
            OTAP_CONTROL_POINT_UUID.to_string(),
            "01ff5551-ba5e-f4ee-5ca1-eb1e5e4b1ce0"
        );
    }

    #[test]
    fn test_uuids_are_distinct() {
        let all = [
            ACCELERATION_UUID,
            GYRO_UUID,
            MAGNET_UUID,
            LIGHT_UUID,
            TEMPERATURE_UUID,
            HUMIDITY_UUID,
            PRESSURE_UUID,
            HEART_RATE_UUID,
            STEPS_UUID,
            CALORIES_UUID,
            BATTERY_UUID,
            ALERT_IN_UUID,
            ALERT_OUT_UUID,
            MODE_UUID,
            SERIAL_NUMBER_UUID,
            FIRMWARE_REVISION_UUID,
            HARDWARE_REVISION_UUID,
            MANUFACTURER_NAME_UUID,
            OTAP_CONTROL_POINT_UUID,
            OTAP_DATA_UUID,
            OTAP_STATE_UUID,
        ];
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
