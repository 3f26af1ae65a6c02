use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use bytes::Bytes;
use parking_lot::Mutex;
use pppoemux_wire::MacAddr;
use tracing::debug;

use crate::device::{LinkDevice, ETHERNET_HEADER_LEN};
use crate::error::{LinkError, Result};

/// An in-memory link device.
///
/// Captures everything handed to [`LinkDevice::transmit`] for later
/// inspection instead of putting it on a wire. MTU and up/down state are
/// mutable at runtime so callers can stage device-lifecycle scenarios.
pub struct LoopbackLink {
    name: String,
    hw_addr: MacAddr,
    mtu: AtomicUsize,
    up: AtomicBool,
    tx_log: Mutex<Vec<TxRecord>>,
}

/// One captured transmission.
#[derive(Debug, Clone)]
pub struct TxRecord {
    /// Destination hardware address.
    pub dst: MacAddr,
    /// EtherType the frame was submitted under.
    pub ethertype: u16,
    /// The frame as handed to the device (PPPoE header + payload).
    pub frame: Bytes,
}

impl LoopbackLink {
    /// Create an up device with the default Ethernet MTU of 1500.
    pub fn new(name: impl Into<String>, hw_addr: MacAddr) -> Self {
        Self {
            name: name.into(),
            hw_addr,
            mtu: AtomicUsize::new(1500),
            up: AtomicBool::new(true),
            tx_log: Mutex::new(Vec::new()),
        }
    }

    /// Set the MTU at construction time.
    pub fn with_mtu(self, mtu: usize) -> Self {
        self.mtu.store(mtu, Ordering::SeqCst);
        self
    }

    /// Change the MTU of a running device.
    pub fn set_mtu(&self, mtu: usize) {
        self.mtu.store(mtu, Ordering::SeqCst);
    }

    /// Bring the device up or down.
    pub fn set_up(&self, up: bool) {
        debug!(device = %self.name, up, "loopback state change");
        self.up.store(up, Ordering::SeqCst);
    }

    /// Copy of every frame transmitted so far.
    pub fn transmitted(&self) -> Vec<TxRecord> {
        self.tx_log.lock().clone()
    }

    /// Drain the captured frames.
    pub fn take_transmitted(&self) -> Vec<TxRecord> {
        std::mem::take(&mut *self.tx_log.lock())
    }
}

impl LinkDevice for LoopbackLink {
    fn name(&self) -> &str {
        &self.name
    }

    fn hw_addr(&self) -> MacAddr {
        self.hw_addr
    }

    fn mtu(&self) -> usize {
        self.mtu.load(Ordering::SeqCst)
    }

    fn hard_header_len(&self) -> usize {
        ETHERNET_HEADER_LEN
    }

    fn is_up(&self) -> bool {
        self.up.load(Ordering::SeqCst)
    }

    fn transmit(&self, dst: MacAddr, ethertype: u16, frame: Bytes) -> Result<()> {
        if !self.is_up() {
            return Err(LinkError::DeviceDown {
                name: self.name.clone(),
            });
        }
        debug!(device = %self.name, %dst, ethertype, len = frame.len(), "loopback transmit");
        self.tx_log.lock().push(TxRecord {
            dst,
            ethertype,
            frame,
        });
        Ok(())
    }
}
