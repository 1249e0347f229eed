//! Public error type for the client crate.

use crate::SigType;

/// Errors returned by [`crate::CresnetClient`]'s public API.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("client is already running")]
    AlreadyRunning,
    #[error("client is not running")]
    NotRunning,
    #[error("host must not be empty")]
    InvalidHost,
    #[error("join {join} is out of range for {sig_type} joins")]
    InvalidJoin { sig_type: SigType, join: u32 },
    #[error("serial value is {len} bytes, maximum is {max}")]
    SerialTooLong { len: usize, max: usize },
}
