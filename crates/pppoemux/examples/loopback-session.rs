//! Minimal session walkthrough — connect, exchange payloads, peer teardown.
//!
//! Run with:
//!   cargo run --example loopback-session

use std::sync::Arc;

use pppoemux::link::{LinkDevice, LoopbackLink};
use pppoemux::session::{SessionId, SessionMux};
use pppoemux::wire::{codes, encode_frame, MacAddr, ETHERTYPE_DISCOVERY};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mux = SessionMux::new();
    let lo = Arc::new(LoopbackLink::new("oam0", MacAddr::new([0x02, 0, 0, 0, 0, 0x01])));
    let dev: Arc<dyn LinkDevice> = lo.clone();
    let peer: MacAddr = "aa:bb:cc:dd:ee:ff".parse()?;

    // Session 0x1234 was negotiated out of band (PADI..PADS); bind it.
    let handle = mux.open();
    handle.connect(SessionId(0x1234), &dev, peer)?;
    eprintln!("connected: {:?}", mux.sessions());

    // Send one PPP payload; the device sees it framed.
    let sent = handle.send(bytes::Bytes::from_static(b"lcp-conf-req"))?;
    for record in lo.take_transmitted() {
        eprintln!("transmitted {sent} payload bytes as {} frame bytes", record.frame.len());
    }

    // The peer answers; feed the raw frame in as a link driver would.
    let mut buf = bytes::BytesMut::new();
    encode_frame(codes::SESSION_DATA, 0x1234, b"lcp-conf-ack", &mut buf)?;
    mux.ingress_session(peer, buf.freeze());
    let payload = handle.recv()?;
    eprintln!("received {} payload bytes", payload.len());

    // The peer hangs up with a PADT on the discovery ethertype.
    let mut padt = bytes::BytesMut::new();
    encode_frame(codes::PADT, 0x1234, b"", &mut padt)?;
    mux.ingress(peer, ETHERTYPE_DISCOVERY, padt.freeze());
    eprintln!("after padt: state = {}", handle.state());

    handle.close();
    eprintln!("closed: {} sessions registered", mux.session_count());
    Ok(())
}
