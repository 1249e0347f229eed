//! `CresnetClient`: the public surface described in `spec.md` §6 — start,
//! stop, set, get, subscribe, press/release/pulse, and update_request.

use crate::buttons::ButtonTable;
use crate::config::ClientConfig;
use crate::connection::ConnectionManager;
use crate::error::ClientError;
use crate::events::{EventFlavor, JoinEvent};
use crate::session::Session;
use crate::store::{Callback, JoinStore};
use cip_protocol::{Direction, DigitalFlavor, JoinValue, SERIAL_MAX_LEN, SigType, encode};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, watch};
use tracing::{error, warn};

struct RunningHandles {
    stop_tx: watch::Sender<bool>,
    task: tokio::task::JoinHandle<()>,
}

/// A client session against one Crestron control processor, identified by
/// host, TCP port, and IP-ID.
///
/// Cheaply [`Clone`]-able: the public methods only touch shared handles
/// (the join store, the button table, the event queue sender), so a
/// cloned `CresnetClient` is the same session, not a new one.
#[derive(Clone)]
pub struct CresnetClient {
    config: ClientConfig,
    session: Arc<Session>,
    store: JoinStore,
    buttons: ButtonTable,
    event_tx: Arc<Mutex<Option<mpsc::UnboundedSender<JoinEvent>>>>,
    tx_tx: Arc<Mutex<Option<mpsc::UnboundedSender<Vec<u8>>>>>,
    running: Arc<Mutex<Option<RunningHandles>>>,
}

impl CresnetClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            session: Arc::new(Session::new()),
            store: JoinStore::new(),
            buttons: ButtonTable::new(),
            event_tx: Arc::new(Mutex::new(None)),
            tx_tx: Arc::new(Mutex::new(None)),
            running: Arc::new(Mutex::new(None)),
        }
    }

    /// Start the Connection Manager (and, once connected, the Event
    /// Processor, Sender, and Receiver). Idempotent-safe: calling `start`
    /// while already running is a reported error, not a crash.
    pub fn start(&self) -> Result<(), ClientError> {
        let mut running = self.running.lock().unwrap();
        if running.is_some() {
            return Err(ClientError::AlreadyRunning);
        }

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (tx_tx, tx_rx) = mpsc::unbounded_channel();
        *self.event_tx.lock().unwrap() = Some(event_tx.clone());
        *self.tx_tx.lock().unwrap() = Some(tx_tx.clone());

        let (stop_tx, stop_rx) = watch::channel(false);
        let manager = ConnectionManager {
            host: self.config.host.clone(),
            port: self.config.port,
            ipid: self.config.ipid,
            read_timeout: self.config.timeout,
            session: self.session.clone(),
            store: self.store.clone(),
            buttons: self.buttons.clone(),
            event_tx,
            event_rx: Some(event_rx),
            tx_tx,
            tx_rx: Some(tx_rx),
            stop: stop_rx,
        };
        let task = tokio::spawn(manager.run());
        *running = Some(RunningHandles { stop_tx, task });
        Ok(())
    }

    /// Stop the client: closes the socket and joins every worker activity.
    /// Idempotent-safe: calling `stop` while not running is a reported
    /// error, not a crash.
    pub async fn stop(&self) -> Result<(), ClientError> {
        let handles = self.running.lock().unwrap().take();
        let Some(handles) = handles else {
            return Err(ClientError::NotRunning);
        };
        let _ = handles.stop_tx.send(true);
        let _ = handles.task.await;
        *self.event_tx.lock().unwrap() = None;
        *self.tx_tx.lock().unwrap() = None;
        self.session.set_connected(false);
        Ok(())
    }

    /// Set an outbound join. Validates the join id against its sigtype's
    /// range and, for serial, the [`SERIAL_MAX_LEN`] cap; on validation
    /// failure, logs and no-ops rather than returning an error — matching
    /// `spec.md` §6/§7's "`set` logs and no-ops" on bad input.
    pub fn set(&self, join: u32, value: JoinValue) {
        let sig_type = value.sig_type();
        if let Err(e) = validate_join(sig_type, join) {
            error!(join, %sig_type, error = %e, "set: dropping invalid join");
            return;
        }
        if let JoinValue::Serial(s) = &value {
            if s.len() > SERIAL_MAX_LEN {
                let e = ClientError::SerialTooLong { len: s.len(), max: SERIAL_MAX_LEN };
                error!(join, error = %e, "set: dropping invalid join");
                return;
            }
        }
        self.send_event(Direction::Out, EventFlavor::standard(sig_type), join, value);
    }

    /// Current value for a join. Returns the type-appropriate zero if the
    /// join has never been observed.
    pub fn get(&self, direction: Direction, sig_type: SigType, join: u32) -> Result<JoinValue, ClientError> {
        validate_join(sig_type, join)?;
        Ok(self.store.get(direction, sig_type, join))
    }

    /// Register a change callback for a join, creating a default-valued
    /// entry if the join has never been observed.
    pub fn subscribe(
        &self,
        direction: Direction,
        sig_type: SigType,
        join: u32,
        callback: Callback,
    ) -> Result<(), ClientError> {
        validate_join(sig_type, join)?;
        self.store.subscribe(direction, sig_type, join, callback);
        Ok(())
    }

    /// Hold a button-style digital join pressed; the Sender re-transmits
    /// the press packet every 500ms until `release` or the held value
    /// changes underneath it.
    pub fn press(&self, join: u32) {
        self.send_button(join, true);
    }

    pub fn release(&self, join: u32) {
        self.send_button(join, false);
    }

    /// A momentary press-then-release: two pulse-flavor events, in order.
    pub fn pulse(&self, join: u32) {
        if let Err(e) = validate_join(SigType::Digital, join) {
            error!(join, error = %e, "pulse: dropping invalid join");
            return;
        }
        self.send_event(
            Direction::Out,
            EventFlavor::Digital(DigitalFlavor::Pulse),
            join,
            JoinValue::Digital(true),
        );
        self.send_event(
            Direction::Out,
            EventFlavor::Digital(DigitalFlavor::Pulse),
            join,
            JoinValue::Digital(false),
        );
    }

    /// Re-request the processor's full state. A no-op (logged) unless
    /// `connected`.
    pub fn update_request(&self) {
        if !self.session.is_connected() {
            warn!("update_request: not connected, dropping");
            return;
        }
        let guard = self.tx_tx.lock().unwrap();
        if let Some(tx) = guard.as_ref() {
            let _ = tx.send(encode::update_request());
        }
    }

    fn send_button(&self, join: u32, pressed: bool) {
        if let Err(e) = validate_join(SigType::Digital, join) {
            error!(join, error = %e, "press/release: dropping invalid join");
            return;
        }
        self.send_event(
            Direction::Out,
            EventFlavor::Digital(DigitalFlavor::Button),
            join,
            JoinValue::Digital(pressed),
        );
    }

    fn send_event(&self, direction: Direction, flavor: EventFlavor, join: u32, value: JoinValue) {
        let guard = self.event_tx.lock().unwrap();
        match guard.as_ref() {
            Some(tx) => {
                let _ = tx.send(JoinEvent { direction, flavor, join, value });
            }
            None => warn!(join, "client is not running, dropping event"),
        }
    }
}

fn validate_join(sig_type: SigType, join: u32) -> Result<(), ClientError> {
    let max = match sig_type {
        SigType::Digital => 65_536,
        SigType::Analog | SigType::Serial => 65_535,
    };
    if join >= 1 && join <= max {
        Ok(())
    } else {
        Err(ClientError::InvalidJoin { sig_type, join })
    }
}
