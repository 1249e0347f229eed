//! The Receiver: reads bytes off the live socket, frames them into CIP
//! packets via [`cip_protocol::frame::FrameDecoder`], and dispatches each
//! to the protocol decoder.

use crate::events::{EventFlavor, JoinEvent};
use crate::session::Session;
use crate::socket::SocketCell;
use crate::store::JoinStore;
use cip_protocol::frame::FrameDecoder;
use cip_protocol::{Direction, DecodedPacket, JoinValue, decode_packet, encode};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, warn};

/// Per-read buffer size; `spec.md` §4.2 requires at least 4096 bytes.
const READ_BUFFER: usize = 8192;
/// How long the Receiver sleeps before retrying while `restart_requested`
/// or the socket is not yet live.
const IDLE_RETRY: Duration = Duration::from_millis(100);

pub async fn run(
    socket: SocketCell,
    session: Arc<Session>,
    store: JoinStore,
    ipid: u8,
    read_timeout: Duration,
    event_tx: mpsc::UnboundedSender<JoinEvent>,
    tx_tx: mpsc::UnboundedSender<Vec<u8>>,
    mut stop: watch::Receiver<bool>,
) {
    let mut decoder = FrameDecoder::new();
    let mut buf = vec![0u8; READ_BUFFER];

    loop {
        if *stop.borrow() {
            break;
        }

        if session.restart_requested() {
            if !sleep_or_stop(IDLE_RETRY, &mut stop).await {
                break;
            }
            continue;
        }

        let Some(stream) = socket.get() else {
            if !sleep_or_stop(IDLE_RETRY, &mut stop).await {
                break;
            }
            continue;
        };

        let read = tokio::select! {
            biased;
            changed = stop.changed() => {
                if changed.is_err() || *stop.borrow() {
                    break;
                }
                continue;
            }
            result = tokio::time::timeout(read_timeout, (&*stream).read(&mut buf)) => result,
        };

        match read {
            Ok(Ok(0)) => {
                warn!("receiver: connection closed by peer");
                session.request_restart();
            }
            Ok(Ok(n)) => {
                for frame in decoder.feed(&buf[..n]) {
                    let decoded = decode_packet(frame.opcode, &frame.payload);
                    dispatch(decoded, frame.opcode, &session, &store, &event_tx, &tx_tx, ipid).await;
                }
            }
            Ok(Err(e)) => {
                warn!(error = %e, "receiver: socket read error");
                session.request_restart();
            }
            Err(_elapsed) => {
                // Read timeout: not an error, keep looping.
            }
        }
    }
    debug!("receiver stopped");
}

/// Sleep for `dur`, or return `false` immediately if stop fires first.
async fn sleep_or_stop(dur: Duration, stop: &mut watch::Receiver<bool>) -> bool {
    tokio::select! {
        biased;
        changed = stop.changed() => !(changed.is_err() || *stop.borrow()),
        () = tokio::time::sleep(dur) => true,
    }
}

async fn dispatch(
    decoded: DecodedPacket,
    opcode: u8,
    session: &Session,
    store: &JoinStore,
    event_tx: &mpsc::UnboundedSender<JoinEvent>,
    tx_tx: &mpsc::UnboundedSender<Vec<u8>>,
    ipid: u8,
) {
    match decoded {
        DecodedPacket::RegistrationRequest => {
            debug!(ipid, "registration request, replying");
            let _ = tx_tx.send(encode::registration_response(ipid));
        }
        DecodedPacket::RegistrationSuccess => {
            debug!("registration succeeded, requesting initial update");
            let _ = tx_tx.send(encode::update_request());
        }
        DecodedPacket::RegistrationFailure => {
            // Open question in spec.md §9: the distilled source takes no
            // further action on a rejected IP-ID, and spec.md frames this
            // as expecting human intervention rather than an automatic
            // restart loop. We match that: log and keep running.
            error!(ipid, "registration rejected: IP-ID does not exist");
        }
        DecodedPacket::RegistrationError => {
            error!(ipid, "registration result: unexpected payload");
        }
        DecodedPacket::InboundDigital { join, value } => {
            let _ = event_tx.send(JoinEvent {
                direction: Direction::In,
                flavor: EventFlavor::standard(cip_protocol::SigType::Digital),
                join,
                value: JoinValue::Digital(value),
            });
        }
        DecodedPacket::InboundAnalog { join, value } => {
            let _ = event_tx.send(JoinEvent {
                direction: Direction::In,
                flavor: EventFlavor::standard(cip_protocol::SigType::Analog),
                join,
                value: JoinValue::Analog(value),
            });
        }
        DecodedPacket::InboundSerial { join, value } => {
            let _ = event_tx.send(JoinEvent {
                direction: Direction::In,
                flavor: EventFlavor::standard(cip_protocol::SigType::Serial),
                join,
                value: JoinValue::Serial(value),
            });
        }
        DecodedPacket::UpdateRequestInfo | DecodedPacket::DateTime => {
            debug!(opcode, "informational packet, no response required");
        }
        DecodedPacket::EndOfQuery => {
            debug!("end-of-query: acking, heartbeating, marking connected");
            let _ = tx_tx.send(encode::end_of_query_ack());
            let _ = tx_tx.send(encode::heartbeat());
            session.set_connected(true);
            for (sig_type, join, value) in store.snapshot_outbound() {
                let _ = event_tx.send(JoinEvent {
                    direction: Direction::Out,
                    flavor: EventFlavor::standard(sig_type),
                    join,
                    value,
                });
            }
        }
        DecodedPacket::EndOfQueryAck => {}
        DecodedPacket::Heartbeat => {}
        DecodedPacket::Disconnect => {
            error!("control-system disconnect received");
            session.request_restart();
        }
        DecodedPacket::Unknown => {
            debug!(opcode, "unknown opcode or sub-dispatch, ignoring");
        }
    }
}
