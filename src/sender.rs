//! The Sender: drains the outbound packet queue to the socket, generates
//! periodic heartbeats, and services the button auto-repeat tick.
//!
//! A cooperative loop on a 10ms quantum (`spec.md` §4.4), alternating the
//! three duties rather than running each on its own task — this matches
//! the spec's framing of the Sender as a single activity, and avoids a
//! second mutex acquisition pattern for a duty this cheap. The repeat tick
//! consults the join store, not just the button table: a held join stops
//! repeating as soon as its outbound digital value goes to 0, by any path
//! (`spec.md` §4.4(3)/§8 invariant 6).

use crate::buttons::ButtonTable;
use crate::session::Session;
use crate::socket::SocketCell;
use crate::store::JoinStore;
use cip_protocol::{Direction, JoinValue, SigType};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

const QUANTUM: Duration = Duration::from_millis(10);
const HEARTBEAT_IDLE: Duration = Duration::from_secs(15);
const BUTTON_REPEAT: Duration = Duration::from_millis(500);

pub async fn run(
    socket: SocketCell,
    session: Arc<Session>,
    store: JoinStore,
    buttons: ButtonTable,
    mut tx_rx: mpsc::UnboundedReceiver<Vec<u8>>,
    tx_tx: mpsc::UnboundedSender<Vec<u8>>,
    mut stop: watch::Receiver<bool>,
) {
    let mut since_last_send = Instant::now();
    let mut since_last_repeat = Instant::now();

    loop {
        if *stop.borrow() {
            break;
        }

        drain_queue(&socket, &session, &mut tx_rx, &mut since_last_send).await;

        if session.is_connected()
            && !session.restart_requested()
            && since_last_send.elapsed() >= HEARTBEAT_IDLE
        {
            let _ = tx_tx.send(cip_protocol::encode::heartbeat());
            since_last_send = Instant::now();
        }

        if since_last_repeat.elapsed() >= BUTTON_REPEAT {
            repeat_held_buttons(&store, &buttons, &tx_tx);
            since_last_repeat = Instant::now();
        }

        tokio::select! {
            biased;
            changed = stop.changed() => {
                if changed.is_err() || *stop.borrow() {
                    break;
                }
            }
            () = tokio::time::sleep(QUANTUM) => {}
        }
    }
    debug!("sender stopped");
}

/// Re-send every held button's packet, but only while its outbound digital
/// join is still 1 — `spec.md` §4.4(3)/§8 invariant 6 stop the repeat as
/// soon as outbound digital `j` becomes 0, not only on an explicit
/// `release()`. A join whose store value has gone to 0 (via `release()` or
/// a plain `set(j, false)`) is dropped from the table here instead of
/// repeating forever.
fn repeat_held_buttons(store: &JoinStore, buttons: &ButtonTable, tx_tx: &mpsc::UnboundedSender<Vec<u8>>) {
    for (join, packet) in buttons.held() {
        if store.get(Direction::Out, SigType::Digital, join) == JoinValue::Digital(true) {
            let _ = tx_tx.send(packet);
        } else {
            buttons.release(join);
        }
    }
}

/// Drain `tx_rx` to the socket while it has buffers queued and the session
/// isn't mid-restart. A send error latches `restart_requested` and stops
/// the drain for this tick (the freshly-dequeued buffer is dropped, not
/// requeued — `spec.md` makes no reliability promise across a reconnect).
async fn drain_queue(
    socket: &SocketCell,
    session: &Session,
    tx_rx: &mut mpsc::UnboundedReceiver<Vec<u8>>,
    since_last_send: &mut Instant,
) {
    while !session.restart_requested() {
        // Check the socket before popping: if there's nothing to send on,
        // leave the buffer queued rather than discarding it.
        let Some(stream) = socket.get() else {
            break;
        };
        let Ok(packet) = tx_rx.try_recv() else {
            break;
        };
        match (&*stream).write_all(&packet).await {
            Ok(()) => *since_last_send = Instant::now(),
            Err(e) => {
                warn!(error = %e, "sender: socket write error");
                session.request_restart();
                break;
            }
        }
    }
}
