use bytes::Bytes;
use pppoemux_wire::MacAddr;

use crate::error::Result;

/// Hardware header length of an Ethernet device.
pub const ETHERNET_HEADER_LEN: usize = 14;

/// A link-layer network device, as seen by the session core.
///
/// Implementations own their I/O completely. `transmit` receives the PPPoE
/// frame (header + payload) plus addressing and is responsible for the
/// link-layer header. The core keeps only weak references to devices, so a
/// device disappearing out from under a session is an expected condition,
/// not a protocol violation.
pub trait LinkDevice: Send + Sync {
    /// Interface name, e.g. `eth0`.
    fn name(&self) -> &str;

    /// The device's own hardware address.
    fn hw_addr(&self) -> MacAddr;

    /// Current MTU in bytes (link payload, excluding the hardware header).
    fn mtu(&self) -> usize;

    /// Length of the link-layer header this device prepends.
    fn hard_header_len(&self) -> usize;

    /// Whether the device is up and willing to transmit.
    fn is_up(&self) -> bool;

    /// Hand a fully encoded frame to the device for transmission.
    fn transmit(&self, dst: MacAddr, ethertype: u16, frame: Bytes) -> Result<()>;
}

/// Device lifecycle notifications relevant to bound sessions.
///
/// The device owner forwards these to the session layer, which reacts by
/// flushing every session bound to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    /// The link went down.
    Down,
    /// The MTU changed to the given value.
    MtuChanged(usize),
}
