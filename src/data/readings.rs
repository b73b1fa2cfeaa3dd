//! Decoded sensor values.
//!
//! Typed results produced by the payload decoder, either a single scalar or
//! a three-axis sample.

/// A three-axis sample.
///
/// The (x, y, z) order is an external contract with the UI and mirrors the
/// field order on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vector3 {
    /// X axis component.
    pub x: f64,
    /// Y axis component.
    pub y: f64,
    /// Z axis component.
    pub z: f64,
}

impl Vector3 {
    /// Create a new sample from components.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// A decoded sensor value.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SensorValue {
    /// Single numeric reading (battery %, temperature ℃, steps, ...).
    Scalar(f64),
    /// Three-axis reading (acceleration, gyroscope, magnetometer).
    Triple(Vector3),
}

impl SensorValue {
    /// The scalar value, if this is a single-valued reading.
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Self::Scalar(value) => Some(*value),
            Self::Triple(_) => None,
        }
    }

    /// The three-axis sample, if this is a triple-valued reading.
    pub fn as_triple(&self) -> Option<Vector3> {
        match self {
            Self::Scalar(_) => None,
            Self::Triple(vector) => Some(*vector),
        }
    }
}
