//! Per-session and demultiplexer counters.
//!
//! All counters are relaxed atomics: they are observability, not
//! synchronization, and the paths that bump them already hold whatever lock
//! correctness needs.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Live per-session counters.
#[derive(Debug, Default)]
pub struct SessionStats {
    pub(crate) rx_packets: AtomicU64,
    pub(crate) rx_bytes: AtomicU64,
    pub(crate) tx_packets: AtomicU64,
    pub(crate) tx_bytes: AtomicU64,
    pub(crate) rx_dropped: AtomicU64,
    pub(crate) backlog_dropped: AtomicU64,
    pub(crate) relay_dropped: AtomicU64,
}

impl SessionStats {
    pub(crate) fn count_rx(&self, bytes: usize) {
        self.rx_packets.fetch_add(1, Ordering::Relaxed);
        self.rx_bytes.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub(crate) fn count_tx(&self, bytes: usize) {
        self.tx_packets.fetch_add(1, Ordering::Relaxed);
        self.tx_bytes.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub(crate) fn count_rx_dropped(&self) {
        self.rx_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn count_backlog_dropped(&self) {
        self.backlog_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn count_relay_dropped(&self) {
        self.relay_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of the counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            rx_packets: self.rx_packets.load(Ordering::Relaxed),
            rx_bytes: self.rx_bytes.load(Ordering::Relaxed),
            tx_packets: self.tx_packets.load(Ordering::Relaxed),
            tx_bytes: self.tx_bytes.load(Ordering::Relaxed),
            rx_dropped: self.rx_dropped.load(Ordering::Relaxed),
            backlog_dropped: self.backlog_dropped.load(Ordering::Relaxed),
            relay_dropped: self.relay_dropped.load(Ordering::Relaxed),
        }
    }
}

/// Serializable copy of [`SessionStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Payloads delivered to the channel or receive queue.
    pub rx_packets: u64,
    /// Payload bytes delivered.
    pub rx_bytes: u64,
    /// Frames handed to the link device.
    pub tx_packets: u64,
    /// Payload bytes transmitted.
    pub tx_bytes: u64,
    /// Payloads dropped because the receive queue was full.
    pub rx_dropped: u64,
    /// Raw frames dropped because the backlog was full.
    pub backlog_dropped: u64,
    /// Payloads dropped by the relay forwarder.
    pub relay_dropped: u64,
}

/// Live demultiplexer counters, covering frames dropped before any session
/// was identified.
#[derive(Debug, Default)]
pub struct MuxStats {
    pub(crate) malformed: AtomicU64,
    pub(crate) lookup_miss: AtomicU64,
    pub(crate) non_data: AtomicU64,
    pub(crate) disc_ignored: AtomicU64,
}

impl MuxStats {
    /// Point-in-time copy of the counters.
    pub fn snapshot(&self) -> MuxStatsSnapshot {
        MuxStatsSnapshot {
            malformed: self.malformed.load(Ordering::Relaxed),
            lookup_miss: self.lookup_miss.load(Ordering::Relaxed),
            non_data: self.non_data.load(Ordering::Relaxed),
            disc_ignored: self.disc_ignored.load(Ordering::Relaxed),
        }
    }
}

/// Serializable copy of [`MuxStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MuxStatsSnapshot {
    /// Frames that failed structural validation.
    pub malformed: u64,
    /// Frames whose (session ID, peer) matched no registered session.
    pub lookup_miss: u64,
    /// Session-stage frames with a non-data code.
    pub non_data: u64,
    /// Discovery frames other than a matching PADT.
    pub disc_ignored: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_counters_accumulate() {
        let stats = SessionStats::default();
        stats.count_rx(10);
        stats.count_rx(20);
        stats.count_tx(5);
        stats.count_rx_dropped();
        stats.count_backlog_dropped();
        stats.count_relay_dropped();

        let snap = stats.snapshot();
        assert_eq!(snap.rx_packets, 2);
        assert_eq!(snap.rx_bytes, 30);
        assert_eq!(snap.tx_packets, 1);
        assert_eq!(snap.tx_bytes, 5);
        assert_eq!(snap.rx_dropped, 1);
        assert_eq!(snap.backlog_dropped, 1);
        assert_eq!(snap.relay_dropped, 1);
    }

    #[test]
    fn test_snapshot_serializes() {
        let stats = SessionStats::default();
        stats.count_rx(42);

        let json = serde_json::to_string(&stats.snapshot()).expect("snapshot should serialize");
        let back: StatsSnapshot = serde_json::from_str(&json).expect("snapshot should deserialize");
        assert_eq!(back.rx_packets, 1);
        assert_eq!(back.rx_bytes, 42);
    }
}
