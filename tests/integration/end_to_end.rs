//! End-to-end scenarios against a mock CIP "processor": a bare
//! `tokio::net::TcpListener` that scripts the literal byte exchanges from
//! `spec.md` §8, grounded on `rt-test-utils`'s mock-server pattern and
//! `local_proxy.rs`'s `free_port()` helper.

use cip_protocol::{Direction, JoinValue, SigType};
use cresnet_client::{ClientConfig, CresnetClient};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

async fn free_listener() -> TcpListener {
    TcpListener::bind("127.0.0.1:0").await.unwrap()
}

async fn read_exact_timeout(stream: &mut TcpStream, n: usize) -> Vec<u8> {
    let mut buf = vec![0u8; n];
    tokio::time::timeout(Duration::from_secs(5), stream.read_exact(&mut buf))
        .await
        .expect("timed out waiting for client bytes")
        .unwrap();
    buf
}

/// Drive the registration + end-of-query handshake on `server_stream` and
/// leave the connection in the steady "connected" state.
async fn complete_handshake(server_stream: &mut TcpStream, ipid: u8) {
    server_stream.write_all(&[0x0F, 0x00, 0x00]).await.unwrap();
    let reply = read_exact_timeout(server_stream, 14).await;
    assert_eq!(
        reply,
        vec![0x01, 0x00, 0x0B, 0x00, 0x00, 0x00, 0x00, 0x00, ipid, 0x40, 0xFF, 0xFF, 0xF1, 0x01]
    );

    server_stream
        .write_all(&[0x02, 0x00, 0x04, 0x00, 0x00, 0x00, 0x1F])
        .await
        .unwrap();
    let reply = read_exact_timeout(server_stream, 8).await;
    assert_eq!(reply, vec![0x05, 0x00, 0x05, 0x00, 0x00, 0x02, 0x03, 0x00]);

    server_stream
        .write_all(&[0x05, 0x00, 0x05, 0x00, 0x00, 0x02, 0x03, 0x1C])
        .await
        .unwrap();
    let ack = read_exact_timeout(server_stream, 8).await;
    assert_eq!(ack, vec![0x05, 0x00, 0x05, 0x00, 0x00, 0x02, 0x03, 0x1D]);
    let heartbeat = read_exact_timeout(server_stream, 5).await;
    assert_eq!(heartbeat, vec![0x0D, 0x00, 0x02, 0x00, 0x00]);
}

#[tokio::test]
async fn registration_and_end_of_query_handshake() {
    let listener = free_listener().await;
    let port = listener.local_addr().unwrap().port();
    let accept = tokio::spawn(async move { listener.accept().await.unwrap().0 });

    let config = ClientConfig::with_port_and_timeout(
        "127.0.0.1",
        0x03,
        port,
        Duration::from_secs(2),
    )
    .unwrap();
    let client = CresnetClient::new(config);
    client.start().unwrap();

    let mut server_stream = accept.await.unwrap();
    complete_handshake(&mut server_stream, 0x03).await;

    client.stop().await.unwrap();
}

#[tokio::test]
async fn inbound_digital_reaches_subscriber_and_store() {
    let listener = free_listener().await;
    let port = listener.local_addr().unwrap().port();
    let accept = tokio::spawn(async move { listener.accept().await.unwrap().0 });

    let config = ClientConfig::with_port_and_timeout("127.0.0.1", 0x03, port, Duration::from_secs(2)).unwrap();
    let client = CresnetClient::new(config);

    let calls = Arc::new(AtomicUsize::new(0));
    let calls2 = calls.clone();
    client
        .subscribe(
            Direction::In,
            SigType::Digital,
            1,
            Arc::new(move |_sig, join, value| {
                assert_eq!(join, 1);
                assert_eq!(value, JoinValue::Digital(true));
                calls2.fetch_add(1, Ordering::SeqCst);
            }),
        )
        .unwrap();

    client.start().unwrap();
    let mut server_stream = accept.await.unwrap();
    complete_handshake(&mut server_stream, 0x03).await;

    // join 1, state on (release bit clear -> XOR 1 -> true).
    server_stream
        .write_all(&[0x05, 0x00, 0x06, 0x00, 0x00, 0x03, 0x00, 0x00, 0x00])
        .await
        .unwrap();

    tokio::time::timeout(Duration::from_secs(5), async {
        while calls.load(Ordering::SeqCst) == 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("subscriber callback never fired");

    assert_eq!(
        client.get(Direction::In, SigType::Digital, 1).unwrap(),
        JoinValue::Digital(true)
    );

    client.stop().await.unwrap();
}

#[tokio::test]
async fn outbound_analog_and_serial_produce_literal_wire_bytes() {
    let listener = free_listener().await;
    let port = listener.local_addr().unwrap().port();
    let accept = tokio::spawn(async move { listener.accept().await.unwrap().0 });

    let config = ClientConfig::with_port_and_timeout("127.0.0.1", 0x03, port, Duration::from_secs(2)).unwrap();
    let client = CresnetClient::new(config);
    client.start().unwrap();

    let mut server_stream = accept.await.unwrap();
    complete_handshake(&mut server_stream, 0x03).await;

    client.set(5, JoinValue::Analog(1234));
    let analog_packet = read_exact_timeout(&mut server_stream, 11).await;
    assert_eq!(
        analog_packet,
        vec![0x05, 0x00, 0x08, 0x00, 0x00, 0x05, 0x14, 0x00, 0x04, 0x04, 0xD2]
    );

    client.set(2, JoinValue::Serial("Hi".to_owned()));
    let serial_packet = read_exact_timeout(&mut server_stream, 15).await;
    assert_eq!(
        serial_packet,
        vec![
            0x12, 0x00, 0x0A, 0x00, 0x00, 0x00, 0x00, 0x34, 0x00, 0x06, 0x00, 0x01, 0x03, 0x48,
            0x69
        ]
    );

    client.stop().await.unwrap();
}

#[tokio::test]
async fn press_without_release_repeats_at_half_second_cadence() {
    let listener = free_listener().await;
    let port = listener.local_addr().unwrap().port();
    let accept = tokio::spawn(async move { listener.accept().await.unwrap().0 });

    let config = ClientConfig::with_port_and_timeout("127.0.0.1", 0x03, port, Duration::from_secs(2)).unwrap();
    let client = CresnetClient::new(config);
    client.start().unwrap();

    let mut server_stream = accept.await.unwrap();
    complete_handshake(&mut server_stream, 0x03).await;

    client.press(1);
    let first = read_exact_timeout(&mut server_stream, 9).await;
    assert_eq!(first, vec![0x05, 0x00, 0x06, 0x00, 0x00, 0x03, 0x27, 0x00, 0x00]);

    // Auto-repeat cadence is 500ms; the same press packet should show up
    // again without another call to press().
    let second = read_exact_timeout(&mut server_stream, 9).await;
    assert_eq!(second, first);

    client.release(1);
    let release = read_exact_timeout(&mut server_stream, 9).await;
    assert_eq!(release, vec![0x05, 0x00, 0x06, 0x00, 0x00, 0x03, 0x27, 0x00, 0x80]);

    client.stop().await.unwrap();
}

#[tokio::test]
async fn disconnect_opcode_triggers_reconnect_and_replays_outbound_state() {
    let listener = free_listener().await;
    let port = listener.local_addr().unwrap().port();

    let config = ClientConfig::with_port_and_timeout("127.0.0.1", 0x03, port, Duration::from_secs(2)).unwrap();
    let client = CresnetClient::new(config);
    client.start().unwrap();

    // First connection: handshake, then set an outbound analog join before
    // the processor disconnects.
    let (mut first_stream, _) = listener.accept().await.unwrap();
    complete_handshake(&mut first_stream, 0x03).await;
    client.set(5, JoinValue::Analog(1234));
    let _ = read_exact_timeout(&mut first_stream, 11).await;

    // Control-system disconnect opcode.
    first_stream.write_all(&[0x03, 0x00, 0x00]).await.unwrap();
    drop(first_stream);

    // Client should reconnect and replay the outbound analog join's
    // current value once end-of-query completes again.
    let (mut second_stream, _) = tokio::time::timeout(Duration::from_secs(10), listener.accept())
        .await
        .expect("client did not reconnect in time")
        .unwrap();
    complete_handshake(&mut second_stream, 0x03).await;

    let replayed = read_exact_timeout(&mut second_stream, 11).await;
    assert_eq!(
        replayed,
        vec![0x05, 0x00, 0x08, 0x00, 0x00, 0x05, 0x14, 0x00, 0x04, 0x04, 0xD2]
    );

    client.stop().await.unwrap();
}
