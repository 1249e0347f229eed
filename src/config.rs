//! Client configuration.

use crate::error::ClientError;
use std::time::Duration;

/// Default CIP TCP port.
pub const DEFAULT_PORT: u16 = 41_794;
/// Default socket read timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Constructor parameters for [`crate::CresnetClient`]: host, IP-ID, port,
/// and socket read timeout.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub host: String,
    pub ipid: u8,
    pub port: u16,
    pub timeout: Duration,
}

impl ClientConfig {
    /// Build a config with the default port and timeout.
    pub fn new(host: impl Into<String>, ipid: u8) -> Result<Self, ClientError> {
        Self::with_port_and_timeout(host, ipid, DEFAULT_PORT, DEFAULT_TIMEOUT)
    }

    pub fn with_port_and_timeout(
        host: impl Into<String>,
        ipid: u8,
        port: u16,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let host = host.into();
        if host.trim().is_empty() {
            return Err(ClientError::InvalidHost);
        }
        Ok(Self {
            host,
            ipid,
            port,
            timeout,
        })
    }
}
