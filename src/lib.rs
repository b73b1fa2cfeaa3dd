// Allow holding locks across await points - we use parking_lot which is designed for this
#![allow(clippy::await_holding_lock)]
// Allow unusual byte groupings for UUIDs which have standard format
#![allow(clippy::unusual_byte_groupings)]

//! # hexiwear-ble
//!
//! A cross-platform Rust library for communicating with Hexiwear wearable
//! devices via Bluetooth Low Energy.
//!
//! The library owns the device communication state machine: connection
//! lifecycle, characteristic discovery, the time synchronization handshake,
//! the round-robin sensor polling rotation with pre-empting alert commands,
//! and decoding of the raw sensor payloads into typed values.
//!
//! ## Features
//!
//! - **Session lifecycle**: connect → discover → (bond) → ready, with
//!   automatic reconnect on link loss
//! - **Sensor rotation**: continuous round-robin polling of all eleven
//!   sensor characteristics
//! - **Alert commands**: queued command buffers that pre-empt the rotation
//! - **Time synchronization**: the device clock is set on every handshake
//! - **Typed readings**: battery, temperature, humidity, pressure, light,
//!   heart rate, steps, calories, and three-axis motion samples
//! - **Mode tracking**: the active watch application and its visible
//!   readings
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hexiwear_ble::{Device, DeviceEvent};
//!
//! # async fn run(peripheral: btleplug::platform::Peripheral) {
//! // `peripheral` is the already-paired btleplug peripheral for the device.
//! let (device, _transport) = Device::from_peripheral(peripheral);
//! let mut events = device.subscribe_events();
//!
//! device.connect();
//!
//! while let Ok(event) = events.recv().await {
//!     match event {
//!         DeviceEvent::ReadingAvailable {
//!             characteristic,
//!             value,
//!         } => {
//!             println!("{:?}: {:?} {}", characteristic, value, characteristic.unit());
//!         }
//!         DeviceEvent::ModeChanged(mode) => println!("mode: {}", mode),
//!         _ => {}
//!     }
//! }
//! # }
//! ```
//!
//! ## Platform Notes
//!
//! ### macOS
//! Requires Bluetooth permission. Add `NSBluetoothAlwaysUsageDescription`
//! to your Info.plist for bundled apps.
//!
//! ### Linux
//! Requires BlueZ. User may need to be in the `bluetooth` group.
//!
//! ### Windows
//! Requires Windows 10 or later with Bluetooth LE support.
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization for data types

// Public modules
pub mod ble;
pub mod data;
pub mod device;
pub mod error;
pub mod protocol;
pub mod scheduler;
pub mod session;

// Re-exports for convenience
pub use device::{CallbackHandle, Device};
pub use error::{DecodeError, Error, Result};
pub use session::{ConnectionState, DeviceEvent, Session, SessionConfig, TimeSyncPhase};

// Re-export commonly used types from submodules
pub use ble::characteristic::{Category, Characteristic};
pub use ble::peripheral::{BlePeripheralTransport, BleTransportEvent};
pub use ble::transport::{GattStatus, GattTransport, TransportEvent};
pub use data::{ManufacturerInfo, OperatingMode, SensorValue, Vector3};
pub use scheduler::{ScheduledOp, Scheduler};
