//! Link-layer boundary for the PPPoE session multiplexer.
//!
//! The session core never touches raw sockets or interface APIs. It talks to
//! a [`LinkDevice`]: something that reports its capabilities (MTU, hardware
//! header length, up/down) and accepts fully encoded PPPoE frames for
//! transmission. The device prepends its own link-layer header.
//!
//! [`loopback::LoopbackLink`] is the in-memory implementation used by tests
//! and examples; real deployments supply their own (raw socket, DPDK, tap).

pub mod device;
pub mod error;
pub mod loopback;

pub use device::{LinkDevice, LinkEvent, ETHERNET_HEADER_LEN};
pub use error::{LinkError, Result};
pub use loopback::LoopbackLink;
