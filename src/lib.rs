//! A client for the Cresnet-over-IP (CIP) protocol used to talk to
//! Crestron control processors over TCP.
//!
//! The client maintains a persistent session identified by host, port
//! (default 41794), and a single-byte IP-ID, exchanging digital, analog,
//! and serial *joins* in both directions. See [`CresnetClient`] for the
//! public surface; the wire protocol itself lives in the sibling
//! `cip-protocol` crate.
//!
//! Out of scope, by design: a diagnostic/trace sink (this crate emits
//! `tracing` events but installs no subscriber), process hosting/CLI, and
//! application-level interpretation of join values.

pub mod buttons;
pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod events;
pub mod receiver;
pub mod sender;
pub mod session;
pub mod socket;
pub mod store;

pub use cip_protocol::{DigitalFlavor, Direction, JoinValue, SERIAL_MAX_LEN, SigType};
pub use client::CresnetClient;
pub use config::ClientConfig;
pub use error::ClientError;
pub use events::EventFlavor;
pub use store::Callback;
