//! Data structures for device data.
//!
//! This module contains the core data types used to represent decoded
//! sensor values, the device operating mode and device information.

pub mod device_info;
pub mod mode;
pub mod readings;

pub use device_info::ManufacturerInfo;
pub use mode::OperatingMode;
pub use readings::{SensorValue, Vector3};
