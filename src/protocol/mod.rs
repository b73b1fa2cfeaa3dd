//! Protocol module for decoding payloads and constructing commands.
//!
//! This module contains the implementations for:
//! - Sensor payload decoding
//! - Alert command construction

pub mod commands;
pub mod decode;

pub use commands::{notification_command, set_time_command};
pub use decode::decode_reading;
