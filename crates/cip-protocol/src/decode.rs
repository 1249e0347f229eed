//! Per-opcode payload parsing, used internally by [`crate::decode_packet`].
//!
//! Each function here mirrors one row of the opcode/sub-opcode dispatch
//! table: join/value extraction is a handful of shifts and masks on fixed
//! byte offsets, matching the layouts the control processor actually puts
//! on the wire.

use crate::DecodedPacket;
use crate::opcodes::*;

/// Dispatch a `0x05` data packet on `payload[3]`.
pub fn decode_data(payload: &[u8]) -> DecodedPacket {
    let Some(&sub) = payload.get(3) else {
        return DecodedPacket::Unknown;
    };
    match sub {
        DATA_DIGITAL => decode_digital(payload),
        DATA_ANALOG => decode_analog(payload),
        DATA_UPDATE_REQUEST => decode_update_request(payload),
        DATA_DATETIME => DecodedPacket::DateTime,
        _ => DecodedPacket::Unknown,
    }
}

fn decode_digital(payload: &[u8]) -> DecodedPacket {
    let (Some(&b4), Some(&b5)) = (payload.get(4), payload.get(5)) else {
        return DecodedPacket::Unknown;
    };
    let join = ((u32::from(b5 & 0x7F) << 8) | u32::from(b4)) + 1;
    let value = ((b5 & 0x80) >> 7) ^ 1;
    DecodedPacket::InboundDigital {
        join,
        value: value != 0,
    }
}

fn decode_analog(payload: &[u8]) -> DecodedPacket {
    let (Some(&b4), Some(&b5), Some(&b6), Some(&b7)) =
        (payload.get(4), payload.get(5), payload.get(6), payload.get(7))
    else {
        return DecodedPacket::Unknown;
    };
    let join = (u32::from(b4) << 8 | u32::from(b5)) + 1;
    let value = (u16::from(b6) << 8) + u16::from(b7);
    DecodedPacket::InboundAnalog { join, value }
}

fn decode_update_request(payload: &[u8]) -> DecodedPacket {
    match payload.get(4) {
        Some(&UPDATE_STANDARD | &UPDATE_PENULTIMATE) => DecodedPacket::UpdateRequestInfo,
        Some(&UPDATE_END_OF_QUERY) => DecodedPacket::EndOfQuery,
        Some(&UPDATE_END_OF_QUERY_ACK) => DecodedPacket::EndOfQueryAck,
        _ => DecodedPacket::Unknown,
    }
}

/// Decode an incoming `0x12` serial join.
pub fn decode_serial(payload: &[u8]) -> DecodedPacket {
    let (Some(&b5), Some(&b6)) = (payload.get(5), payload.get(6)) else {
        return DecodedPacket::Unknown;
    };
    let join = (u32::from(b5) << 8 | u32::from(b6)) + 1;
    let value = match payload.get(8..) {
        Some(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        None => String::new(),
    };
    DecodedPacket::InboundSerial { join, value }
}
