//! Error types for the hexiwear-ble crate.

use thiserror::Error;

use crate::ble::characteristic::Characteristic;

/// The main error type for this crate.
#[derive(Error, Debug)]
pub enum Error {
    /// Bluetooth-related error from the underlying BLE library.
    #[error("Bluetooth error: {0}")]
    Bluetooth(#[from] btleplug::Error),

    /// Operation requires a connection but the device session is not connected.
    #[error("Device not connected")]
    NotConnected,

    /// A sensor payload could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The requested operation is not supported by the transport backend.
    #[error("Operation not supported: {operation}")]
    NotSupported {
        /// Description of the unsupported operation.
        operation: String,
    },

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failure to decode a raw characteristic payload into a sensor value.
///
/// Decode failures are always recoverable: callers skip the update and log.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// The buffer is shorter than the fixed layout for this characteristic.
    #[error("short buffer for {characteristic:?}: {actual} bytes (need {expected})")]
    ShortBuffer {
        /// The characteristic whose payload was being decoded.
        characteristic: Characteristic,
        /// Bytes required by the characteristic's layout.
        expected: usize,
        /// Bytes actually received.
        actual: usize,
    },

    /// The characteristic does not carry a decodable sensor reading.
    #[error("{characteristic:?} carries no decodable sensor reading")]
    UnknownCategory {
        /// The characteristic that was passed to the decoder.
        characteristic: Characteristic,
    },
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
