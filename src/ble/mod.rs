//! BLE communication module.
//!
//! This module provides the characteristic registry, the transport seam the
//! session state machine drives, and the btleplug-backed production
//! transport.

pub mod characteristic;
pub mod peripheral;
pub mod transport;
pub mod uuids;

pub use characteristic::{Category, Characteristic};
pub use peripheral::{BlePeripheralTransport, BleTransportEvent};
pub use transport::{GattStatus, GattTransport, TransportEvent};
pub use uuids::*;
