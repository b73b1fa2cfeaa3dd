//! Device operating modes.
//!
//! The device reports its active application as a single mode byte. Each
//! mode carries the set of readings that are meaningful to display while it
//! is active; the session itself keeps polling and emitting every reading
//! regardless of mode, visibility is a presentation concern.

use crate::ble::characteristic::Characteristic;

/// Operating mode reported by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OperatingMode {
    /// No active application.
    #[default]
    Idle,
    /// Watch face.
    Watch,
    /// Full environmental and motion sensing.
    SensorTag,
    /// Heart rate monitoring.
    HeartRate,
    /// Step and calorie counting.
    Pedometer,
}

impl OperatingMode {
    /// Map a device-reported mode byte onto the closed mode set.
    ///
    /// Unrecognized bytes yield `None`; callers keep the current mode.
    pub fn from_symbol(symbol: u8) -> Option<Self> {
        match symbol {
            0 => Some(Self::Idle),
            1 => Some(Self::Watch),
            2 => Some(Self::SensorTag),
            5 => Some(Self::HeartRate),
            6 => Some(Self::Pedometer),
            _ => None,
        }
    }

    /// The raw mode byte the device reports for this mode.
    pub fn symbol(&self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Watch => 1,
            Self::SensorTag => 2,
            Self::HeartRate => 5,
            Self::Pedometer => 6,
        }
    }

    /// Reading characteristics meaningful while this mode is active.
    ///
    /// Used by presentation collaborators to decide what to show.
    pub fn visible_characteristics(&self) -> &'static [Characteristic] {
        match self {
            Self::Idle => &[],
            Self::Watch => &[Characteristic::Battery],
            Self::SensorTag => &[
                Characteristic::Battery,
                Characteristic::Acceleration,
                Characteristic::Gyro,
                Characteristic::Magnet,
                Characteristic::Light,
                Characteristic::Temperature,
                Characteristic::Humidity,
                Characteristic::Pressure,
            ],
            Self::HeartRate => &[Characteristic::Battery, Characteristic::HeartRate],
            Self::Pedometer => &[
                Characteristic::Battery,
                Characteristic::Steps,
                Characteristic::Calories,
            ],
        }
    }

    /// Check whether a characteristic is visible in this mode.
    pub fn shows(&self, characteristic: Characteristic) -> bool {
        self.visible_characteristics().contains(&characteristic)
    }
}

impl std::fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Watch => write!(f, "Watch"),
            Self::SensorTag => write!(f, "Sensor tag"),
            Self::HeartRate => write!(f, "Heart rate"),
            Self::Pedometer => write!(f, "Pedometer"),
        }
    }
}
