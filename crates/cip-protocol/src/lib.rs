//! Pure CIP (Cresnet-over-IP) wire protocol: framing, encoding, and
//! decoding. No I/O, no threading — this crate only turns bytes into typed
//! packets and typed join events back into bytes.

pub mod decode;
pub mod encode;
pub mod frame;
pub mod opcodes;

use std::fmt;

/// The three closed join signal types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SigType {
    Digital,
    Analog,
    Serial,
}

/// Join direction relative to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    In,
    Out,
}

/// Outbound digital flavor. Standard `set()`, held-button `press`/`release`,
/// and momentary `pulse` share the same wire encoding except for one
/// template byte and whether the sender schedules auto-repeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigitalFlavor {
    Standard,
    Button,
    Pulse,
}

/// A join's current value, typed by sigtype.
#[derive(Debug, Clone, PartialEq)]
pub enum JoinValue {
    Digital(bool),
    Analog(u16),
    Serial(String),
}

impl JoinValue {
    pub fn sig_type(&self) -> SigType {
        match self {
            JoinValue::Digital(_) => SigType::Digital,
            JoinValue::Analog(_) => SigType::Analog,
            JoinValue::Serial(_) => SigType::Serial,
        }
    }

    /// The type-appropriate zero value (`0`, `0`, or `""`).
    pub fn zero(sig_type: SigType) -> Self {
        match sig_type {
            SigType::Digital => JoinValue::Digital(false),
            SigType::Analog => JoinValue::Analog(0),
            SigType::Serial => JoinValue::Serial(String::new()),
        }
    }
}

/// Maximum serial payload length, constrained by the one-byte length
/// fields in the serial packet template.
pub const SERIAL_MAX_LEN: usize = 247;

/// A single decoded CIP packet, as handed from the Receiver's framer to
/// its dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedPacket {
    /// `0x0F`: processor wants us to register.
    RegistrationRequest,
    /// `0x02` with the success payload.
    RegistrationSuccess,
    /// `0x02` with the `FF FF 02` failure payload: IP-ID does not exist.
    RegistrationFailure,
    /// `0x02` with any other payload.
    RegistrationError,
    InboundDigital { join: u32, value: bool },
    InboundAnalog { join: u32, value: u16 },
    InboundSerial { join: u32, value: String },
    /// `0x05 .. 03 00` / `.. 03 16`: informational, no response required.
    UpdateRequestInfo,
    /// `0x05 .. 03 1C`: end-of-query. Receiver must ack, heartbeat, mark
    /// `connected`, and replay outbound state.
    EndOfQuery,
    /// `0x05 .. 03 1D`: end-of-query ack, no response required.
    EndOfQueryAck,
    /// `0x05 .. 08 ..`: date/time, informational only.
    DateTime,
    Heartbeat,
    Disconnect,
    /// Recognized opcode, unrecognized sub-dispatch, or vice versa.
    Unknown,
}

/// Decode a single framed packet's opcode + payload into a `DecodedPacket`.
///
/// This is the logical "Protocol Decoder": a pure function with no side
/// effects. Byte-layout errors within a recognized opcode (e.g. a digital
/// payload too short to hold a join) degrade to `Unknown` rather than
/// panicking — a malformed frame is logged and ignored by the caller, not
/// a crash.
pub fn decode_packet(opcode: u8, payload: &[u8]) -> DecodedPacket {
    use opcodes::*;

    match opcode {
        REGISTRATION_REQUEST => DecodedPacket::RegistrationRequest,
        REGISTRATION_RESULT => match payload {
            p if p == REGISTRATION_FAILURE_PAYLOAD => DecodedPacket::RegistrationFailure,
            p if p == REGISTRATION_SUCCESS_PAYLOAD => DecodedPacket::RegistrationSuccess,
            _ => DecodedPacket::RegistrationError,
        },
        DATA => decode::decode_data(payload),
        SERIAL_JOIN => decode::decode_serial(payload),
        HEARTBEAT | HEARTBEAT_ALT => DecodedPacket::Heartbeat,
        DISCONNECT => DecodedPacket::Disconnect,
        _ => DecodedPacket::Unknown,
    }
}

impl fmt::Display for SigType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SigType::Digital => "d",
            SigType::Analog => "a",
            SigType::Serial => "s",
        };
        f.write_str(s)
    }
}
