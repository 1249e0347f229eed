//! CIP wire opcode and sub-opcode constants.
//!
//! See the top-level opcode table in the client crate's design notes for
//! the full dispatch semantics; this module only names the byte values.

/// Registration request from the control processor.
pub const REGISTRATION_REQUEST: u8 = 0x0F;
/// Registration result (success/failure) from the control processor.
pub const REGISTRATION_RESULT: u8 = 0x02;
/// Data packet, further dispatched on `payload[3]`.
pub const DATA: u8 = 0x05;
/// Incoming serial join.
pub const SERIAL_JOIN: u8 = 0x12;
pub const HEARTBEAT: u8 = 0x0D;
pub const HEARTBEAT_ALT: u8 = 0x0E;
/// Control-system disconnect.
pub const DISCONNECT: u8 = 0x03;

// Sub-dispatch of `DATA` on payload[3].
pub const DATA_DIGITAL: u8 = 0x00;
pub const DATA_ANALOG: u8 = 0x14;
pub const DATA_UPDATE_REQUEST: u8 = 0x03;
pub const DATA_DATETIME: u8 = 0x08;

// Sub-dispatch of `DATA_UPDATE_REQUEST` on payload[4].
pub const UPDATE_STANDARD: u8 = 0x00;
pub const UPDATE_PENULTIMATE: u8 = 0x16;
pub const UPDATE_END_OF_QUERY: u8 = 0x1C;
pub const UPDATE_END_OF_QUERY_ACK: u8 = 0x1D;

/// Successful registration-result payload (length 4).
pub const REGISTRATION_SUCCESS_PAYLOAD: [u8; 4] = [0x00, 0x00, 0x00, 0x1F];
/// Failed registration-result payload: the IP-ID does not exist (length 3).
pub const REGISTRATION_FAILURE_PAYLOAD: [u8; 3] = [0xFF, 0xFF, 0x02];
