//! The Connection Manager: owns the TCP endpoint, performs blocking
//! connect-with-retry, and starts/stops the Event Processor, Sender, and
//! Receiver around each connection's lifetime.

use crate::buttons::ButtonTable;
use crate::events::{self, JoinEvent};
use crate::receiver;
use crate::sender;
use crate::session::Session;
use crate::socket::SocketCell;
use crate::store::JoinStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

const RETRY_BACKOFF: Duration = Duration::from_secs(1);
const POLL_INTERVAL: Duration = Duration::from_secs(1);

pub struct ConnectionManager {
    pub host: String,
    pub port: u16,
    pub ipid: u8,
    pub read_timeout: Duration,
    pub session: Arc<Session>,
    pub store: JoinStore,
    pub buttons: ButtonTable,
    pub event_tx: mpsc::UnboundedSender<JoinEvent>,
    pub event_rx: Option<mpsc::UnboundedReceiver<JoinEvent>>,
    pub tx_tx: mpsc::UnboundedSender<Vec<u8>>,
    pub tx_rx: Option<mpsc::UnboundedReceiver<Vec<u8>>>,
    pub stop: watch::Receiver<bool>,
}

impl ConnectionManager {
    /// Run until `stop` fires. Spawns the Event Processor, Sender, and
    /// Receiver on the first successful connect; they survive every
    /// subsequent reconnect within this one call, per `spec.md` §4.1.
    pub async fn run(self) {
        let ConnectionManager {
            host,
            port,
            ipid,
            read_timeout,
            session,
            store,
            buttons,
            event_tx,
            mut event_rx,
            tx_tx,
            mut tx_rx,
            mut stop,
        } = self;

        let socket = SocketCell::new();
        let mut workers: Vec<tokio::task::JoinHandle<()>> = Vec::new();

        'outer: loop {
            if *stop.borrow() {
                break;
            }

            let Some(stream) =
                connect_with_retry(&host, port, &mut stop).await
            else {
                break;
            };
            socket.set(stream);
            session.clear_restart();
            info!(host = %host, port, "connected");

            // Order matters per spec.md §4.1: Event Processor, Sender,
            // Receiver. `event_rx`/`tx_rx` are each taken exactly once, on
            // the first successful connect; the workers survive every
            // reconnect after that.
            if let (Some(event_rx), Some(tx_rx)) = (event_rx.take(), tx_rx.take()) {
                workers.push(tokio::spawn(events::run(
                    store.clone(),
                    buttons.clone(),
                    session.clone(),
                    event_rx,
                    tx_tx.clone(),
                    stop.clone(),
                )));
                workers.push(tokio::spawn(sender::run(
                    socket.clone(),
                    session.clone(),
                    store.clone(),
                    buttons.clone(),
                    tx_rx,
                    tx_tx.clone(),
                    stop.clone(),
                )));
                workers.push(tokio::spawn(receiver::run(
                    socket.clone(),
                    session.clone(),
                    store.clone(),
                    ipid,
                    read_timeout,
                    event_tx.clone(),
                    tx_tx.clone(),
                    stop.clone(),
                )));
            }

            loop {
                if *stop.borrow() {
                    break 'outer;
                }
                if session.restart_requested() {
                    break;
                }
                tokio::select! {
                    biased;
                    changed = stop.changed() => {
                        if changed.is_err() || *stop.borrow() {
                            break 'outer;
                        }
                    }
                    () = tokio::time::sleep(POLL_INTERVAL) => {}
                }
            }

            socket.clear();
            session.set_connected(false);
            info!(host = %host, port, "disconnected, will reconnect");
        }

        socket.clear();
        for handle in workers {
            let _ = handle.await;
        }
    }
}

async fn connect_with_retry(
    host: &str,
    port: u16,
    stop: &mut watch::Receiver<bool>,
) -> Option<TcpStream> {
    let mut warned = false;
    loop {
        if *stop.borrow() {
            return None;
        }
        match TcpStream::connect((host, port)).await {
            Ok(stream) => return Some(stream),
            Err(e) => {
                if !warned {
                    warn!(host, port, error = %e, "attempting to connect");
                    warned = true;
                }
                tokio::select! {
                    biased;
                    changed = stop.changed() => {
                        if changed.is_err() || *stop.borrow() {
                            return None;
                        }
                    }
                    () = tokio::time::sleep(RETRY_BACKOFF) => {}
                }
            }
        }
    }
}
