//! Characteristic registry.
//!
//! Static catalog of every GATT characteristic the device exposes, classified
//! by semantic category. The catalog is pure data: lookups never fail with an
//! error, unknown identifiers simply yield `None` and callers log and skip.

use uuid::Uuid;

use crate::ble::uuids::*;

/// Semantic category of a characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Category {
    /// Sensor value polled in the steady-state rotation.
    Reading,
    /// Alert channel (inbound commands, outbound device alerts).
    Alert,
    /// Active application mode byte.
    Mode,
    /// Static device information string.
    DeviceInfo,
    /// Firmware update channel. Only the identity is modeled; the transfer
    /// protocol is out of scope.
    FirmwareTransfer,
}

/// A characteristic exposed by the device.
///
/// The variants, their UUIDs and their display units are a fixed contract
/// with the device firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Characteristic {
    /// Accelerometer, three axes in g.
    Acceleration,
    /// Gyroscope, three axes in °/s.
    Gyro,
    /// Magnetometer, three axes in µT.
    Magnet,
    /// Ambient light level in percent.
    Light,
    /// Ambient temperature in ℃.
    Temperature,
    /// Relative humidity in percent.
    Humidity,
    /// Air pressure in kPa.
    Pressure,
    /// Battery charge in percent.
    Battery,
    /// Heart rate in bpm.
    HeartRate,
    /// Step count.
    Steps,
    /// Calorie count.
    Calories,
    /// Inbound alert channel (commands written to the device).
    AlertIn,
    /// Outbound alert channel (device-originated alerts).
    AlertOut,
    /// Active application mode.
    Mode,
    /// Serial number string.
    SerialNumber,
    /// Firmware revision string.
    FirmwareRevision,
    /// Hardware revision string.
    HardwareRevision,
    /// Manufacturer name string.
    Manufacturer,
    /// OTAP control point.
    OtapControlPoint,
    /// OTAP data channel.
    OtapData,
    /// OTAP state.
    OtapState,
}

impl Characteristic {
    /// Every characteristic in the registry.
    pub const ALL: [Characteristic; 21] = [
        Self::Acceleration,
        Self::Gyro,
        Self::Magnet,
        Self::Light,
        Self::Temperature,
        Self::Humidity,
        Self::Pressure,
        Self::Battery,
        Self::HeartRate,
        Self::Steps,
        Self::Calories,
        Self::AlertIn,
        Self::AlertOut,
        Self::Mode,
        Self::SerialNumber,
        Self::FirmwareRevision,
        Self::HardwareRevision,
        Self::Manufacturer,
        Self::OtapControlPoint,
        Self::OtapData,
        Self::OtapState,
    ];

    /// Reading characteristics in canonical order.
    ///
    /// This order is stable and deterministic; it seeds the polling queue.
    pub const READINGS: [Characteristic; 11] = [
        Self::Acceleration,
        Self::Gyro,
        Self::Magnet,
        Self::Light,
        Self::Temperature,
        Self::Humidity,
        Self::Pressure,
        Self::Battery,
        Self::HeartRate,
        Self::Steps,
        Self::Calories,
    ];

    /// The semantic category of this characteristic.
    pub fn category(&self) -> Category {
        match self {
            Self::Acceleration
            | Self::Gyro
            | Self::Magnet
            | Self::Light
            | Self::Temperature
            | Self::Humidity
            | Self::Pressure
            | Self::Battery
            | Self::HeartRate
            | Self::Steps
            | Self::Calories => Category::Reading,
            Self::AlertIn | Self::AlertOut => Category::Alert,
            Self::Mode => Category::Mode,
            Self::SerialNumber
            | Self::FirmwareRevision
            | Self::HardwareRevision
            | Self::Manufacturer => Category::DeviceInfo,
            Self::OtapControlPoint | Self::OtapData | Self::OtapState => {
                Category::FirmwareTransfer
            }
        }
    }

    /// The GATT UUID identifying this characteristic on the device.
    pub fn uuid(&self) -> Uuid {
        match self {
            Self::Acceleration => ACCELERATION_UUID,
            Self::Gyro => GYRO_UUID,
            Self::Magnet => MAGNET_UUID,
            Self::Light => LIGHT_UUID,
            Self::Temperature => TEMPERATURE_UUID,
            Self::Humidity => HUMIDITY_UUID,
            Self::Pressure => PRESSURE_UUID,
            Self::Battery => BATTERY_UUID,
            Self::HeartRate => HEART_RATE_UUID,
            Self::Steps => STEPS_UUID,
            Self::Calories => CALORIES_UUID,
            Self::AlertIn => ALERT_IN_UUID,
            Self::AlertOut => ALERT_OUT_UUID,
            Self::Mode => MODE_UUID,
            Self::SerialNumber => SERIAL_NUMBER_UUID,
            Self::FirmwareRevision => FIRMWARE_REVISION_UUID,
            Self::HardwareRevision => HARDWARE_REVISION_UUID,
            Self::Manufacturer => MANUFACTURER_NAME_UUID,
            Self::OtapControlPoint => OTAP_CONTROL_POINT_UUID,
            Self::OtapData => OTAP_DATA_UUID,
            Self::OtapState => OTAP_STATE_UUID,
        }
    }

    /// Display unit for decoded values, empty when the reading is unitless.
    pub fn unit(&self) -> &'static str {
        match self {
            Self::Acceleration => "g",
            Self::Gyro => "\u{00B0}/s",
            Self::Magnet => "\u{00B5}T",
            Self::Light | Self::Humidity | Self::Battery => "%",
            Self::Temperature => "\u{2103}",
            Self::Pressure => "kPa",
            Self::HeartRate => "bpm",
            _ => "",
        }
    }

    /// Look up a characteristic by its GATT UUID.
    pub fn by_uuid(uuid: &Uuid) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.uuid() == *uuid)
    }
}
