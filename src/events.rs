//! The Event Processor: consumes `(direction, flavor, join, value)` tuples
//! from the event queue, upserts the join store, fires subscriber
//! callbacks, and — for outbound events — encodes and enqueues the
//! corresponding CIP packet.
//!
//! Grounded on `services/receiver/src/session.rs`'s `run_session_loop`: a
//! single `tokio::select!` consumer loop racing a cooperative shutdown
//! signal against the next item from a channel.

use crate::buttons::ButtonTable;
use crate::session::Session;
use crate::store::JoinStore;
use cip_protocol::{Direction, DigitalFlavor, JoinValue, SigType, encode};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, warn};

/// The outbound digital/analog/serial distinction carried by an event.
/// Orthogonal to [`SigType`] (`spec.md` §9's "tagged outbound event" note):
/// a digital event additionally carries which of the three wire templates
/// (`d`/`db`/`dp`) produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventFlavor {
    Digital(DigitalFlavor),
    Analog,
    Serial,
}

impl EventFlavor {
    pub fn sig_type(self) -> SigType {
        match self {
            EventFlavor::Digital(_) => SigType::Digital,
            EventFlavor::Analog => SigType::Analog,
            EventFlavor::Serial => SigType::Serial,
        }
    }

    /// The plain (non-button, non-pulse) flavor for a given sigtype, used
    /// by `set()` and by outbound-state replay after end-of-query.
    pub fn standard(sig_type: SigType) -> Self {
        match sig_type {
            SigType::Digital => EventFlavor::Digital(DigitalFlavor::Standard),
            SigType::Analog => EventFlavor::Analog,
            SigType::Serial => EventFlavor::Serial,
        }
    }
}

/// One item on the event queue.
#[derive(Debug, Clone)]
pub struct JoinEvent {
    pub direction: Direction,
    pub flavor: EventFlavor,
    pub join: u32,
    pub value: JoinValue,
}

/// Run the Event Processor until `stop` fires or the event queue closes.
pub async fn run(
    store: JoinStore,
    buttons: ButtonTable,
    session: std::sync::Arc<Session>,
    mut event_rx: mpsc::UnboundedReceiver<JoinEvent>,
    tx_tx: mpsc::UnboundedSender<Vec<u8>>,
    mut stop: watch::Receiver<bool>,
) {
    loop {
        let event = tokio::select! {
            biased;
            changed = stop.changed() => {
                if changed.is_err() || *stop.borrow() {
                    break;
                }
                continue;
            }
            event = event_rx.recv() => match event {
                Some(event) => event,
                None => break,
            },
        };
        process_event(&store, &buttons, &session, &tx_tx, event);
    }
    debug!("event processor stopped");
}

fn process_event(
    store: &JoinStore,
    buttons: &ButtonTable,
    session: &Session,
    tx_tx: &mpsc::UnboundedSender<Vec<u8>>,
    event: JoinEvent,
) {
    let sig_type = event.flavor.sig_type();
    let callbacks =
        store.set_and_snapshot_callbacks(event.direction, sig_type, event.join, event.value.clone());

    for callback in callbacks {
        let join = event.join;
        let value = event.value.clone();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            callback(sig_type, join, value);
        }));
        if result.is_err() {
            error!(join, %sig_type, "join subscriber callback panicked, ignoring");
        }
    }

    if event.direction != Direction::Out {
        return;
    }

    let packet = encode_outbound(&event);

    if let (EventFlavor::Digital(DigitalFlavor::Button), JoinValue::Digital(pressed)) =
        (event.flavor, &event.value)
    {
        if *pressed {
            if let Some(packet) = &packet {
                buttons.press(event.join, packet.clone());
            }
        } else {
            buttons.release(event.join);
        }
    }

    if !session.is_connected() || session.restart_requested() {
        // The end-of-query handler replays outbound state on reconnect;
        // dropping this emission now is intentional, not a bug.
        return;
    }

    if let Some(packet) = packet {
        let _ = tx_tx.send(packet);
    }
}

fn encode_outbound(event: &JoinEvent) -> Option<Vec<u8>> {
    match (event.flavor, &event.value) {
        (EventFlavor::Digital(flavor), JoinValue::Digital(value)) => {
            Some(encode::digital(event.join, *value, flavor))
        }
        (EventFlavor::Analog, JoinValue::Analog(value)) => Some(encode::analog(event.join, *value)),
        (EventFlavor::Serial, JoinValue::Serial(value)) => match encode::serial(event.join, value) {
            Ok(packet) => Some(packet),
            Err(e) => {
                warn!(join = event.join, error = %e, "dropping outbound serial event");
                None
            }
        },
        _ => {
            error!(join = event.join, "outbound event flavor/value mismatch, dropping");
            None
        }
    }
}
