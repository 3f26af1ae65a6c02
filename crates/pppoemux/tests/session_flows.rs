//! End-to-end session lifecycle flows through the public surface.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use pppoemux::link::{LinkDevice, LoopbackLink};
use pppoemux::session::{SessionError, SessionId, SessionKey, SessionMux, SessionState};
use pppoemux::wire::{codes, decode_frame, encode_frame, MacAddr, ETHERTYPE_SESSION};

fn peer() -> MacAddr {
    "aa:bb:cc:dd:ee:ff".parse().expect("valid mac literal")
}

fn device(name: &str) -> (Arc<LoopbackLink>, Arc<dyn LinkDevice>) {
    let lo = Arc::new(LoopbackLink::new(
        name,
        MacAddr::new([0x02, 0, 0, 0, 0, 0x01]),
    ));
    let dev: Arc<dyn LinkDevice> = lo.clone();
    (lo, dev)
}

fn frame(code: u8, sid: u16, payload: &[u8]) -> Bytes {
    let mut buf = BytesMut::new();
    encode_frame(code, sid, payload, &mut buf).expect("encode should fit");
    buf.freeze()
}

#[test]
fn full_lifecycle_send_and_receive() {
    let mux = SessionMux::new();
    let (lo, dev) = device("oam0");
    let handle = mux.open();

    handle
        .connect(SessionId(0x1234), &dev, peer())
        .expect("connect should succeed");
    assert_eq!(handle.state(), SessionState::Connected);
    assert_eq!(
        handle.peer_address(),
        Some(SessionKey::new(SessionId(0x1234), peer()))
    );

    // Outbound: payload gets the six-byte header and the session binding.
    let sent = handle.send(Bytes::from_static(b"lcp-conf-req")).expect("send");
    assert_eq!(sent, 12);
    let log = lo.take_transmitted();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].dst, peer());
    assert_eq!(log[0].ethertype, ETHERTYPE_SESSION);
    let (header, echoed) = decode_frame(&log[0].frame).expect("well-formed frame");
    assert_eq!(header.code, codes::SESSION_DATA);
    assert_eq!(header.session_id, 0x1234);
    assert_eq!(echoed, b"lcp-conf-req");

    // Inbound: the header is stripped before delivery.
    mux.ingress(peer(), ETHERTYPE_SESSION, frame(codes::SESSION_DATA, 0x1234, b"lcp-conf-ack"));
    let got = handle.recv().expect("payload queued");
    assert_eq!(got.as_ref(), b"lcp-conf-ack");

    let stats = handle.stats();
    assert_eq!(stats.tx_packets, 1);
    assert_eq!(stats.rx_packets, 1);

    handle.close();
    assert_eq!(mux.session_count(), 0);
    assert_eq!(Arc::weak_count(&dev), 0);
}

#[test]
fn duplicate_binding_rejected_without_disturbing_owner() {
    let mux = SessionMux::new();
    let (_lo, dev) = device("oam0");
    let owner = mux.open();
    owner.connect(SessionId(0x1234), &dev, peer()).expect("connect");

    let intruder = mux.open();
    assert!(matches!(
        intruder.connect(SessionId(0x1234), &dev, peer()),
        Err(SessionError::AlreadyInUse)
    ));
    assert_eq!(intruder.state(), SessionState::Unconnected);

    // The owner still receives.
    mux.ingress_session(peer(), frame(codes::SESSION_DATA, 0x1234, b"still mine"));
    assert_eq!(owner.recv().expect("delivered").as_ref(), b"still mine");
}

#[test]
fn oversized_payload_reports_frame_limits() {
    let mux = SessionMux::new();
    let lo = Arc::new(LoopbackLink::new("oam0", MacAddr::zero()).with_mtu(1492));
    let dev: Arc<dyn LinkDevice> = lo.clone();
    let handle = mux.open();
    handle.connect(SessionId(1), &dev, peer()).expect("connect");

    handle.send(vec![0u8; 1486]).expect("fits exactly");
    match handle.send(vec![0u8; 1487]) {
        Err(SessionError::MessageTooLong { size, max }) => {
            assert_eq!(size, 1507);
            assert_eq!(max, 1506);
        }
        other => panic!("expected MessageTooLong, got {other:?}"),
    }
    assert_eq!(lo.take_transmitted().len(), 1);
}

#[test]
fn peer_termination_leaves_queue_readable_until_close() {
    let mux = SessionMux::new();
    let (_lo, dev) = device("oam0");
    let handle = mux.open();
    handle.connect(SessionId(0x1234), &dev, peer()).expect("connect");

    mux.ingress_session(peer(), frame(codes::SESSION_DATA, 0x1234, b"last data"));
    mux.ingress(
        peer(),
        pppoemux::wire::ETHERTYPE_DISCOVERY,
        frame(codes::PADT, 0x1234, b""),
    );

    assert_eq!(handle.state(), SessionState::Zombie);
    // Registration survives until close, so a retransmitted PADT still matches.
    assert_eq!(mux.session_count(), 1);
    assert!(matches!(handle.send(Bytes::from_static(b"x")), Err(SessionError::NotConnected)));

    assert_eq!(handle.recv().expect("queued before PADT").as_ref(), b"last data");
    assert!(matches!(handle.recv(), Err(SessionError::Disconnected)));

    handle.close();
    assert_eq!(mux.session_count(), 0);
}

#[test]
fn frames_after_close_miss_the_registry() {
    let mux = SessionMux::new();
    let (_lo, dev) = device("oam0");
    let handle = mux.open();
    handle.connect(SessionId(0x1234), &dev, peer()).expect("connect");
    handle.close();

    mux.ingress_session(peer(), frame(codes::SESSION_DATA, 0x1234, b"late"));
    assert_eq!(mux.stats().lookup_miss, 1);
}

#[test]
fn reconnect_moves_session_to_new_binding() {
    let mux = SessionMux::new();
    let (_lo_a, dev_a) = device("oam0");
    let (lo_b, dev_b) = device("oam1");
    let handle = mux.open();
    handle.connect(SessionId(1), &dev_a, peer()).expect("connect");

    handle.disconnect().expect("disconnect");
    handle.connect(SessionId(2), &dev_b, peer()).expect("reconnect");

    handle.send(Bytes::from_static(b"via b")).expect("send");
    let log = lo_b.take_transmitted();
    assert_eq!(log.len(), 1);
    let (header, _) = decode_frame(&log[0].frame).expect("well-formed frame");
    assert_eq!(header.session_id, 2);
}

#[test]
fn blocked_reader_gets_payload_from_another_thread() {
    let mux = Arc::new(SessionMux::new());
    let (_lo, dev) = device("oam0");
    let handle = mux.open();
    handle.connect(SessionId(0x0042), &dev, peer()).expect("connect");

    let feeder = {
        let mux = Arc::clone(&mux);
        thread::spawn(move || {
            mux.ingress_session(peer(), frame(codes::SESSION_DATA, 0x0042, b"from afar"));
        })
    };

    let payload = handle.recv().expect("woken with payload");
    assert_eq!(payload.as_ref(), b"from afar");
    feeder.join().expect("feeder should not panic");
}

#[test]
fn recv_timeout_returns_none_when_idle() {
    let mux = SessionMux::new();
    let (_lo, dev) = device("oam0");
    let handle = mux.open();
    handle.connect(SessionId(1), &dev, peer()).expect("connect");

    let got = handle
        .recv_timeout(Duration::from_millis(20))
        .expect("timeout is not an error");
    assert!(got.is_none());
}

#[test]
fn session_listing_serializes_for_diagnostics() {
    let mux = SessionMux::new();
    let (_lo, dev) = device("oam0");
    let handle = mux.open();
    handle.connect(SessionId(0x1234), &dev, peer()).expect("connect");

    let rows = mux.sessions();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].to_string(), "00001234 aa:bb:cc:dd:ee:ff oam0");

    let json = serde_json::to_string(&rows).expect("rows should serialize");
    assert!(json.contains("\"session_id\":4660"));
    assert!(json.contains("\"device\":\"oam0\""));

    let stats_json =
        serde_json::to_string(&handle.stats()).expect("stats snapshot should serialize");
    assert!(stats_json.contains("\"rx_packets\""));
}
