//! Alert command construction.
//!
//! Commands are written to the inbound alert characteristic as fixed-size
//! 20-byte buffers: a command byte, a payload length byte, then the payload,
//! zero-padded to the full width.

use bytes::{BufMut, BytesMut};
use chrono::{DateTime, Offset, TimeZone};

/// Command byte relaying a phone notification to the device.
pub const COMMAND_NOTIFICATION: u8 = 1;
/// Command byte setting the device clock.
pub const COMMAND_TIME: u8 = 3;
/// Fixed width of every alert command buffer.
pub const COMMAND_LENGTH: usize = 20;

/// Build the set-time command for the given moment.
///
/// The payload is the low four bytes of the local-epoch second count (UTC
/// seconds shifted by the local UTC offset), little-endian. The device has
/// no timezone concept, it displays the seconds as wall-clock time.
pub fn set_time_command<Tz: TimeZone>(at: &DateTime<Tz>) -> Vec<u8> {
    let local_epoch = at.timestamp() + i64::from(at.offset().fix().local_minus_utc());
    command(COMMAND_TIME, &(local_epoch as u32).to_le_bytes())
}

/// Build a notification relay command carrying the given payload.
pub fn notification_command(payload: &[u8]) -> Vec<u8> {
    command(COMMAND_NOTIFICATION, payload)
}

fn command(command: u8, payload: &[u8]) -> Vec<u8> {
    debug_assert!(payload.len() <= COMMAND_LENGTH - 2);

    let mut buffer = BytesMut::with_capacity(COMMAND_LENGTH);
    buffer.put_u8(command);
    buffer.put_u8(payload.len() as u8);
    buffer.put_slice(payload);
    buffer.resize(COMMAND_LENGTH, 0);
    buffer.to_vec()
}

#[cfg(test)]
mod tests {
    use chrono::FixedOffset;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_set_time_command_layout() {
        // 2016-05-12 12:00:00 UTC in a UTC+2 zone.
        let zone = FixedOffset::east_opt(7200).unwrap();
        let at = zone.with_ymd_and_hms(2016, 5, 12, 14, 0, 0).unwrap();

        let buffer = set_time_command(&at);
        assert_eq!(buffer.len(), COMMAND_LENGTH);
        assert_eq!(buffer[0], COMMAND_TIME);
        assert_eq!(buffer[1], 4);

        // UTC epoch 1463054400, shifted by +7200.
        let expected = (1_463_054_400u32 + 7200).to_le_bytes();
        assert_eq!(&buffer[2..6], &expected);
        assert!(buffer[6..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_set_time_command_utc() {
        let zone = FixedOffset::east_opt(0).unwrap();
        let at = zone.with_ymd_and_hms(1970, 1, 1, 0, 0, 42).unwrap();

        let buffer = set_time_command(&at);
        assert_eq!(&buffer[2..6], &[42, 0, 0, 0]);
    }

    #[test]
    fn test_notification_command_layout() {
        let buffer = notification_command(&[0x02, 0x01]);
        assert_eq!(buffer.len(), COMMAND_LENGTH);
        assert_eq!(buffer[0], COMMAND_NOTIFICATION);
        assert_eq!(buffer[1], 2);
        assert_eq!(&buffer[2..4], &[0x02, 0x01]);
        assert!(buffer[4..].iter().all(|&b| b == 0));
    }
}
