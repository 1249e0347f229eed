//! A cell holding the one live TCP connection, shared by the Connection
//! Manager (writer), Receiver, and Sender (readers).
//!
//! `tokio::net::TcpStream` implements `AsyncRead`/`AsyncWrite` for `&TcpStream`
//! as well as `TcpStream`, so a shared `Arc<TcpStream>` lets the Receiver
//! and Sender read and write concurrently through the same socket without
//! either holding a lock across the I/O call — the cell's mutex is only
//! taken to clone or replace the `Arc`.

use std::sync::{Arc, Mutex};
use tokio::net::TcpStream;

#[derive(Clone, Default)]
pub struct SocketCell {
    inner: Arc<Mutex<Option<Arc<TcpStream>>>>,
}

impl SocketCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, stream: TcpStream) {
        *self.inner.lock().unwrap() = Some(Arc::new(stream));
    }

    pub fn clear(&self) {
        *self.inner.lock().unwrap() = None;
    }

    /// A clone of the current socket handle, or `None` while disconnected.
    pub fn get(&self) -> Option<Arc<TcpStream>> {
        self.inner.lock().unwrap().clone()
    }
}
