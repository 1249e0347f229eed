//! Outbound CIP packet encoding: fixed control packets and the three join
//! encoders (digital, analog, serial).

use crate::{DigitalFlavor, SERIAL_MAX_LEN};
use std::fmt;

/// The registration response sent in reply to a `0x0F` registration
/// request, carrying the configured IP-ID.
pub fn registration_response(ipid: u8) -> Vec<u8> {
    vec![
        0x01, 0x00, 0x0B, 0x00, 0x00, 0x00, 0x00, 0x00, ipid, 0x40, 0xFF, 0xFF, 0xF1, 0x01,
    ]
}

/// Sent once after a successful registration result, before end-of-query.
pub fn update_request() -> Vec<u8> {
    vec![0x05, 0x00, 0x05, 0x00, 0x00, 0x02, 0x03, 0x00]
}

/// Sent in reply to the processor's end-of-query (`0x1C`).
pub fn end_of_query_ack() -> Vec<u8> {
    vec![0x05, 0x00, 0x05, 0x00, 0x00, 0x02, 0x03, 0x1D]
}

/// Idle-keepalive packet, sent by the Sender after 15s without outbound
/// traffic, and immediately after the end-of-query ack.
pub fn heartbeat() -> Vec<u8> {
    vec![0x0D, 0x00, 0x02, 0x00, 0x00]
}

/// Encode an outbound digital join. `join` is the 1-based public join id;
/// `flavor` only changes the template's final byte (the control processor
/// distinguishes a momentary/button press from a plain digital set there).
pub fn digital(join: u32, value: bool, flavor: DigitalFlavor) -> Vec<u8> {
    let mut packet = match flavor {
        DigitalFlavor::Standard => vec![0x05, 0x00, 0x06, 0x00, 0x00, 0x03, 0x00],
        DigitalFlavor::Button | DigitalFlavor::Pulse => {
            vec![0x05, 0x00, 0x06, 0x00, 0x00, 0x03, 0x27]
        }
    };
    let cip_join = join - 1;
    // Wire order is [join mod 256, (join div 256) | release-bit] — the low
    // byte goes out first, matching the big-endian read-back in
    // `decode::decode_data`.
    let mut packed = [(cip_join % 256) as u8, (cip_join / 256) as u8];
    if !value {
        packed[1] |= 0x80;
    }
    packet.extend_from_slice(&packed);
    packet
}

/// Encode an outbound analog join.
pub fn analog(join: u32, value: u16) -> Vec<u8> {
    let mut packet = vec![0x05, 0x00, 0x08, 0x00, 0x00, 0x05, 0x14];
    let cip_join = join - 1;
    packet.extend_from_slice(&(cip_join as u16).to_be_bytes());
    packet.extend_from_slice(&value.to_be_bytes());
    packet
}

/// Encode an outbound serial join. Fails if `value` exceeds
/// [`SERIAL_MAX_LEN`] bytes, since the template's length fields are single
/// bytes.
///
/// Only the template's outer length byte (index 2) is edited in place; the
/// inner `4 + len` length field, the join, the `0x03` separator, and the
/// value are all appended past the 8-byte template — this is the layout
/// the literal reference packet for `set("s", 2, "Hi")` requires (see the
/// crate-level contract tests). The encoder does not round-trip through
/// the inbound serial decoder: the wire format the processor sends back
/// for a serial join is not the same layout it expects outbound.
pub fn serial(join: u32, value: &str) -> Result<Vec<u8>, EncodeError> {
    let bytes = value.as_bytes();
    if bytes.len() > SERIAL_MAX_LEN {
        return Err(EncodeError::SerialTooLong { len: bytes.len() });
    }
    let mut packet = vec![0x12, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x34];
    packet[2] = (8 + bytes.len()) as u8;
    let cip_join = join - 1;
    // The "4 + len" length field and everything after it is appended past
    // the 8-byte template, not overwritten in place on it — see the module
    // doc comment and the literal contract test below.
    packet.extend_from_slice(&((4 + bytes.len()) as u16).to_be_bytes());
    packet.extend_from_slice(&(cip_join as u16).to_be_bytes());
    packet.push(0x03);
    packet.extend_from_slice(bytes);
    Ok(packet)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    SerialTooLong { len: usize },
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeError::SerialTooLong { len } => {
                write!(f, "serial value is {len} bytes, maximum is {SERIAL_MAX_LEN}")
            }
        }
    }
}

impl std::error::Error for EncodeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_response_carries_ipid() {
        assert_eq!(
            registration_response(0x03),
            vec![0x01, 0x00, 0x0B, 0x00, 0x00, 0x00, 0x00, 0x00, 0x03, 0x40, 0xFF, 0xFF, 0xF1, 0x01]
        );
    }

    #[test]
    fn digital_join_one_value_on() {
        assert_eq!(
            digital(1, true, DigitalFlavor::Standard),
            vec![0x05, 0x00, 0x06, 0x00, 0x00, 0x03, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn digital_release_sets_high_bit() {
        let packet = digital(1, false, DigitalFlavor::Standard);
        assert_eq!(packet[8], 0x80);
    }

    #[test]
    fn button_flavor_uses_different_template_byte() {
        let packet = digital(1, true, DigitalFlavor::Button);
        assert_eq!(packet[6], 0x27);
    }

    #[test]
    fn analog_join_five_value_1234() {
        assert_eq!(
            analog(5, 1234),
            vec![0x05, 0x00, 0x08, 0x00, 0x00, 0x05, 0x14, 0x00, 0x04, 0x04, 0xD2]
        );
    }

    #[test]
    fn serial_join_two_value_hi() {
        assert_eq!(
            serial(2, "Hi").unwrap(),
            vec![
                0x12, 0x00, 0x0A, 0x00, 0x00, 0x00, 0x00, 0x34, 0x00, 0x06, 0x00, 0x01, 0x03,
                0x48, 0x69
            ]
        );
    }

    #[test]
    fn serial_rejects_values_over_the_length_cap() {
        let too_long = "x".repeat(SERIAL_MAX_LEN + 1);
        assert!(matches!(
            serial(1, &too_long),
            Err(EncodeError::SerialTooLong { .. })
        ));
    }

    #[test]
    fn heartbeat_bytes() {
        assert_eq!(heartbeat(), vec![0x0D, 0x00, 0x02, 0x00, 0x00]);
    }

    #[test]
    fn update_request_bytes() {
        assert_eq!(update_request(), vec![0x05, 0x00, 0x05, 0x00, 0x00, 0x02, 0x03, 0x00]);
    }

    #[test]
    fn end_of_query_ack_bytes() {
        assert_eq!(end_of_query_ack(), vec![0x05, 0x00, 0x05, 0x00, 0x00, 0x02, 0x03, 0x1D]);
    }
}
