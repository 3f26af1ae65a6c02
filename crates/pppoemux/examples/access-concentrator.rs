//! Relay demo — bridge a subscriber-facing session to an upstream one, the
//! way an access concentrator forwards PPP traffic it does not terminate.
//!
//! Run with:
//!   cargo run --example access-concentrator

use std::sync::Arc;

use pppoemux::link::{LinkDevice, LoopbackLink};
use pppoemux::session::{SessionId, SessionKey, SessionMux};
use pppoemux::wire::{codes, decode_frame, encode_frame, MacAddr};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mux = SessionMux::new();

    let sub_lo = Arc::new(LoopbackLink::new("sub0", MacAddr::new([0x02, 0, 0, 0, 0, 0x01])));
    let sub_dev: Arc<dyn LinkDevice> = sub_lo.clone();
    let up_lo = Arc::new(LoopbackLink::new("up0", MacAddr::new([0x02, 0, 0, 0, 0, 0x02])));
    let up_dev: Arc<dyn LinkDevice> = up_lo.clone();

    let subscriber: MacAddr = "aa:bb:cc:dd:ee:ff".parse()?;
    let gateway: MacAddr = "11:22:33:44:55:66".parse()?;

    // One leg per side, each with its own negotiated session ID.
    let downlink = mux.open();
    downlink.connect(SessionId(0x0001), &sub_dev, subscriber)?;
    let uplink = mux.open();
    uplink.connect(SessionId(0x0002), &up_dev, gateway)?;

    // Everything the subscriber sends is re-encapsulated onto the uplink.
    downlink.set_relay(SessionKey::new(SessionId(0x0002), gateway))?;

    let mut frame = bytes::BytesMut::new();
    encode_frame(codes::SESSION_DATA, 0x0001, b"ip-packet", &mut frame)?;
    mux.ingress_session(subscriber, frame.freeze());

    for record in up_lo.take_transmitted() {
        let (header, payload) = decode_frame(&record.frame)?;
        eprintln!(
            "relayed {} bytes to {} under session {:#06x}",
            payload.len(),
            record.dst,
            header.session_id
        );
    }

    eprintln!("downlink stats: {:?}", downlink.stats());
    eprintln!("uplink stats:   {:?}", uplink.stats());
    Ok(())
}
