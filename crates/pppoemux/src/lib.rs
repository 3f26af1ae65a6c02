//! PPPoE session-stage multiplexing over pluggable link devices.
//!
//! pppoemux implements the session half of PPPoE (RFC 2516): frame
//! encapsulation, a concurrent session registry keyed by
//! `(session ID, peer MAC)`, per-session delivery modes (queue, channel,
//! relay) and device lifecycle handling. Discovery negotiation is out of
//! scope; sessions are connected with identifiers negotiated elsewhere.
//!
//! # Crate Structure
//!
//! - [`wire`] — PPPoE framing: the six-byte header, code points, MAC
//!   addresses
//! - [`link`] — The link-device abstraction frames are transmitted through
//! - [`session`] — Session lifecycle, registry, demultiplexing and relay

/// Re-export wire types.
pub mod wire {
    pub use pppoemux_wire::*;
}

/// Re-export link types.
pub mod link {
    pub use pppoemux_link::*;
}

/// Re-export session types.
pub mod session {
    pub use pppoemux_session::*;
}
