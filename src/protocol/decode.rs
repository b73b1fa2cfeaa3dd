//! Sensor payload decoding.
//!
//! Raw characteristic buffers use device-firmware-defined little-endian
//! layouts. Field widths and scales here mirror the firmware exactly:
//! single-byte percentages and rates, u16 counters, and i16 fixed-point
//! values scaled by 1/100.

use tracing::trace;

use crate::ble::characteristic::Characteristic;
use crate::data::readings::{SensorValue, Vector3};
use crate::error::DecodeError;

/// Decode a raw characteristic payload into a typed sensor value.
///
/// Only `Reading`-category characteristics carry decodable payloads; any
/// other characteristic yields [`DecodeError::UnknownCategory`]. Undersized
/// buffers yield [`DecodeError::ShortBuffer`]. Callers skip the update on
/// error, they never treat it as fatal.
pub fn decode_reading(
    characteristic: Characteristic,
    data: &[u8],
) -> Result<SensorValue, DecodeError> {
    trace!("Decoding {} bytes for {:?}", data.len(), characteristic);

    match characteristic {
        // Single unsigned byte: battery %, ambient light %, heart rate bpm.
        Characteristic::Battery | Characteristic::Light | Characteristic::HeartRate => {
            require(characteristic, data, 1)?;
            Ok(SensorValue::Scalar(f64::from(data[0])))
        }

        // u16 little-endian counters.
        Characteristic::Steps | Characteristic::Calories => {
            require(characteristic, data, 2)?;
            let count = u16::from_le_bytes([data[0], data[1]]);
            Ok(SensorValue::Scalar(f64::from(count)))
        }

        // i16 little-endian, fixed-point scale 1/100.
        Characteristic::Temperature | Characteristic::Humidity | Characteristic::Pressure => {
            require(characteristic, data, 2)?;
            Ok(SensorValue::Scalar(fixed_point(data, 0)))
        }

        // Three i16 little-endian fields, each scale 1/100, in (x, y, z) order.
        Characteristic::Acceleration | Characteristic::Gyro | Characteristic::Magnet => {
            require(characteristic, data, 6)?;
            Ok(SensorValue::Triple(Vector3::new(
                fixed_point(data, 0),
                fixed_point(data, 2),
                fixed_point(data, 4),
            )))
        }

        _ => Err(DecodeError::UnknownCategory { characteristic }),
    }
}

fn require(
    characteristic: Characteristic,
    data: &[u8],
    expected: usize,
) -> Result<(), DecodeError> {
    if data.len() < expected {
        return Err(DecodeError::ShortBuffer {
            characteristic,
            expected,
            actual: data.len(),
        });
    }
    Ok(())
}

fn fixed_point(data: &[u8], offset: usize) -> f64 {
    f64::from(i16::from_le_bytes([data[offset], data[offset + 1]])) / 100.0
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_decode_battery() {
        let value = decode_reading(Characteristic::Battery, &[66]).unwrap();
        assert_eq!(value, SensorValue::Scalar(66.0));
    }

    #[test]
    fn test_decode_light() {
        let value = decode_reading(Characteristic::Light, &[55]).unwrap();
        assert_eq!(value, SensorValue::Scalar(55.0));
    }

    #[test]
    fn test_decode_heart_rate() {
        let value = decode_reading(Characteristic::HeartRate, &[73]).unwrap();
        assert_eq!(value, SensorValue::Scalar(73.0));
    }

    #[test]
    fn test_decode_temperature() {
        // 0x0929 = 2345 centi-degrees.
        let value = decode_reading(Characteristic::Temperature, &[0x29, 0x09]).unwrap();
        assert_eq!(value, SensorValue::Scalar(23.45));
    }

    #[test]
    fn test_decode_temperature_negative() {
        // -1250 = 0xFB1E little-endian.
        let raw = (-1250i16).to_le_bytes();
        let value = decode_reading(Characteristic::Temperature, &raw).unwrap();
        assert_eq!(value, SensorValue::Scalar(-12.5));
    }

    #[test]
    fn test_decode_humidity() {
        let raw = 5852i16.to_le_bytes();
        let value = decode_reading(Characteristic::Humidity, &raw).unwrap();
        assert_eq!(value, SensorValue::Scalar(58.52));
    }

    #[test]
    fn test_decode_pressure() {
        let raw = 10132i16.to_le_bytes();
        let value = decode_reading(Characteristic::Pressure, &raw).unwrap();
        assert_eq!(value, SensorValue::Scalar(101.32));
    }

    #[test]
    fn test_decode_steps() {
        let value = decode_reading(Characteristic::Steps, &[0x10, 0x27]).unwrap();
        assert_eq!(value, SensorValue::Scalar(10000.0));
    }

    #[test]
    fn test_decode_calories() {
        let value = decode_reading(Characteristic::Calories, &[0xC8, 0x00]).unwrap();
        assert_eq!(value, SensorValue::Scalar(200.0));
    }

    #[test]
    fn test_decode_acceleration_axis_order() {
        let mut data = Vec::new();
        data.extend_from_slice(&100i16.to_le_bytes()); // x = 1.00 g
        data.extend_from_slice(&(-50i16).to_le_bytes()); // y = -0.50 g
        data.extend_from_slice(&981i16.to_le_bytes()); // z = 9.81 g
        let value = decode_reading(Characteristic::Acceleration, &data).unwrap();
        assert_eq!(
            value,
            SensorValue::Triple(Vector3::new(1.0, -0.5, 9.81))
        );
    }

    #[test]
    fn test_decode_gyro() {
        let mut data = Vec::new();
        data.extend_from_slice(&(-12345i16).to_le_bytes());
        data.extend_from_slice(&0i16.to_le_bytes());
        data.extend_from_slice(&30000i16.to_le_bytes());
        let value = decode_reading(Characteristic::Gyro, &data).unwrap();
        assert_eq!(
            value,
            SensorValue::Triple(Vector3::new(-123.45, 0.0, 300.0))
        );
    }

    #[test]
    fn test_decode_magnet_ignores_trailing_bytes() {
        let mut data = Vec::new();
        data.extend_from_slice(&1i16.to_le_bytes());
        data.extend_from_slice(&2i16.to_le_bytes());
        data.extend_from_slice(&3i16.to_le_bytes());
        data.push(0xAA);
        let value = decode_reading(Characteristic::Magnet, &data).unwrap();
        assert_eq!(
            value,
            SensorValue::Triple(Vector3::new(0.01, 0.02, 0.03))
        );
    }

    #[test]
    fn test_short_buffer() {
        let err = decode_reading(Characteristic::Battery, &[]).unwrap_err();
        assert_eq!(
            err,
            DecodeError::ShortBuffer {
                characteristic: Characteristic::Battery,
                expected: 1,
                actual: 0,
            }
        );

        let err = decode_reading(Characteristic::Acceleration, &[1, 2, 3, 4]).unwrap_err();
        assert_eq!(
            err,
            DecodeError::ShortBuffer {
                characteristic: Characteristic::Acceleration,
                expected: 6,
                actual: 4,
            }
        );
    }

    #[test]
    fn test_non_reading_characteristics_are_rejected() {
        for characteristic in [
            Characteristic::Mode,
            Characteristic::AlertIn,
            Characteristic::Manufacturer,
            Characteristic::OtapData,
        ] {
            let err = decode_reading(characteristic, &[0, 0, 0, 0, 0, 0]).unwrap_err();
            assert_eq!(err, DecodeError::UnknownCategory { characteristic });
        }
    }
}
