//! Per-session state and the exclusive-hold protocol.
//!
//! A [`Session`] splits its mutable state across three locks with a fixed
//! order: the core (state machine, bindings) is outermost; the receive queue
//! and the backlog are leaf locks taken while holding the core or on their
//! own, never the other way around. Registry buckets are only ever taken
//! under the core.
//!
//! Foreground operations hold the core for their whole duration. The receive
//! path never blocks on it: a busy session gets the raw frame appended to
//! its backlog instead, and whoever holds the core drains that backlog when
//! releasing. [`CoreGuard`] enforces the drain so no call site can forget.

use std::collections::VecDeque;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Weak};

use bytes::{Bytes, BytesMut};
use parking_lot::{Condvar, Mutex, MutexGuard};
use pppoemux_link::LinkDevice;
use pppoemux_wire::{codes, encode_frame, split_frame, ETHERTYPE_SESSION, HEADER_LEN};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, SessionError};
use crate::key::SessionKey;
use crate::relay;
use crate::stats::{SessionStats, StatsSnapshot};
use crate::table::SessionTable;

/// Default bound of the decoded-payload receive queue.
pub const DEFAULT_RX_QUEUE_CAPACITY: usize = 128;

/// Default bound of the deferred raw-frame backlog.
pub const DEFAULT_BACKLOG_CAPACITY: usize = 32;

/// Primary lifecycle state of a session.
///
/// Delivery capabilities (an attached channel, a relay target) are not
/// states: they are optional attributes that only exist while `Connected`.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// Open but not bound to any session ID or device.
    Unconnected = 0,
    /// Bound to a (session ID, peer, device) triple and registered.
    Connected = 1,
    /// The peer or device went away; queued payloads remain readable until
    /// the session is closed locally.
    Zombie = 2,
    /// Closed. Terminal.
    Dead = 3,
}

impl SessionState {
    fn from_u8(value: u8) -> SessionState {
        match value {
            1 => SessionState::Connected,
            2 => SessionState::Zombie,
            3 => SessionState::Dead,
            _ => SessionState::Unconnected,
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionState::Unconnected => "unconnected",
            SessionState::Connected => "connected",
            SessionState::Zombie => "zombie",
            SessionState::Dead => "dead",
        };
        f.write_str(name)
    }
}

/// Upper-layer delivery target for a session with an attached channel.
///
/// `deliver` runs while the session is exclusively held, so implementations
/// must hand the payload off and return without calling back into session
/// operations.
pub trait PppChannel: Send + Sync {
    fn deliver(&self, payload: Bytes);
}

/// Queue bounds for a session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Maximum decoded payloads held for `recv`. Default: 128.
    pub rx_queue_capacity: usize,
    /// Maximum raw frames deferred while the session is busy. Default: 32.
    pub backlog_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            rx_queue_capacity: DEFAULT_RX_QUEUE_CAPACITY,
            backlog_capacity: DEFAULT_BACKLOG_CAPACITY,
        }
    }
}

impl SessionConfig {
    /// Set the receive queue bound.
    pub fn with_rx_queue_capacity(mut self, capacity: usize) -> Self {
        self.rx_queue_capacity = capacity;
        self
    }

    /// Set the backlog bound.
    pub fn with_backlog_capacity(mut self, capacity: usize) -> Self {
        self.backlog_capacity = capacity;
        self
    }
}

/// State guarded by the session's exclusive hold.
pub(crate) struct SessionCore {
    pub(crate) state: SessionState,
    pub(crate) key: Option<SessionKey>,
    pub(crate) device: Option<Weak<dyn LinkDevice>>,
    pub(crate) channel: Option<Arc<dyn PppChannel>>,
    pub(crate) relay_to: Option<SessionKey>,
}

/// One PPPoE session.
///
/// Shared between the owning handle, the registry and in-flight receive
/// lookups via `Arc`; it is freed when the last of those drops it, which by
/// construction is after close removed it from the registry.
pub struct Session {
    pub(crate) core: Mutex<SessionCore>,
    pub(crate) backlog: Mutex<VecDeque<Bytes>>,
    pub(crate) rx: Mutex<VecDeque<Bytes>>,
    pub(crate) rx_cv: Condvar,
    state_cell: AtomicU8,
    pub(crate) stats: SessionStats,
    pub(crate) config: SessionConfig,
}

impl Session {
    pub(crate) fn new(config: SessionConfig) -> Self {
        Self {
            core: Mutex::new(SessionCore {
                state: SessionState::Unconnected,
                key: None,
                device: None,
                channel: None,
                relay_to: None,
            }),
            backlog: Mutex::new(VecDeque::new()),
            rx: Mutex::new(VecDeque::new()),
            rx_cv: Condvar::new(),
            state_cell: AtomicU8::new(SessionState::Unconnected as u8),
            stats: SessionStats::default(),
            config,
        }
    }

    /// Current lifecycle state, readable without the exclusive hold.
    pub fn state(&self) -> SessionState {
        SessionState::from_u8(self.state_cell.load(Ordering::SeqCst))
    }

    /// Point-in-time copy of the session counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Acquire the exclusive hold, blocking. Foreground operations only.
    pub(crate) fn lock_core<'a>(&'a self, table: &'a SessionTable) -> CoreGuard<'a> {
        CoreGuard {
            session: self,
            table,
            inner: Some(self.core.lock()),
        }
    }

    /// Attempt the exclusive hold without blocking. Receive-path contexts
    /// fall back to the backlog when this fails.
    pub(crate) fn try_lock_core<'a>(&'a self, table: &'a SessionTable) -> Option<CoreGuard<'a>> {
        self.core.try_lock().map(|inner| CoreGuard {
            session: self,
            table,
            inner: Some(inner),
        })
    }

    /// Record a state change in both the canonical field and the lock-free
    /// mirror. Callers must hold the core.
    pub(crate) fn set_state(&self, core: &mut SessionCore, next: SessionState) {
        if core.state != next {
            debug!(from = %core.state, to = %next, "session state change");
        }
        core.state = next;
        self.state_cell.store(next as u8, Ordering::SeqCst);
    }

    /// Drop any registry binding and return to `Unconnected`.
    pub(crate) fn unbind(&self, core: &mut SessionCore, table: &SessionTable) {
        if let Some(old) = core.key.take() {
            table.remove(old);
            core.device = None;
            core.channel = None;
            core.relay_to = None;
            self.set_state(core, SessionState::Unconnected);
            self.wake_readers();
            debug!(session_id = old.id.0, peer = %old.peer, "session unbound");
        }
    }

    /// Append a decoded payload to the receive queue, waking one reader.
    /// A full queue drops the arriving payload, not queued ones.
    pub(crate) fn enqueue_rx(&self, payload: Bytes) {
        let mut rx = self.rx.lock();
        if rx.len() >= self.config.rx_queue_capacity {
            self.stats.count_rx_dropped();
            debug!(capacity = self.config.rx_queue_capacity, "receive queue full, dropping payload");
            return;
        }
        self.stats.count_rx(payload.len());
        rx.push_back(payload);
        self.rx_cv.notify_one();
    }

    /// Defer a raw frame for the current holder. Same overflow policy as
    /// the receive queue: a full backlog drops the arriving frame.
    pub(crate) fn push_backlog(&self, frame: Bytes) {
        let mut backlog = self.backlog.lock();
        if backlog.len() >= self.config.backlog_capacity {
            self.stats.count_backlog_dropped();
            warn!(capacity = self.config.backlog_capacity, "backlog full, dropping frame");
            return;
        }
        backlog.push_back(frame);
    }

    /// Wake every reader blocked in `recv`; used on state transitions.
    pub(crate) fn wake_readers(&self) {
        let _rx = self.rx.lock();
        self.rx_cv.notify_all();
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

/// Whether `core` is bound to exactly this device instance.
pub(crate) fn is_bound_to(core: &SessionCore, device: &Arc<dyn LinkDevice>) -> bool {
    core.device
        .as_ref()
        .and_then(Weak::upgrade)
        .is_some_and(|held| std::ptr::addr_eq(Arc::as_ptr(&held), Arc::as_ptr(device)))
}

/// Exclusive hold on a session core.
///
/// Releasing the hold drains the backlog: first while still holding (so the
/// frames dispatch in arrival order ahead of anything newer), then once more
/// after unlocking, because a receive context may have pushed a frame in the
/// gap between the drain and the unlock.
pub(crate) struct CoreGuard<'a> {
    session: &'a Session,
    table: &'a SessionTable,
    inner: Option<MutexGuard<'a, SessionCore>>,
}

impl CoreGuard<'_> {
    /// Dispatch every deferred frame now, in FIFO order.
    pub(crate) fn drain_backlog(&self) {
        if let Some(core) = self.inner.as_deref() {
            drain_backlog_locked(core, self.session, self.table);
        }
    }
}

impl Deref for CoreGuard<'_> {
    type Target = SessionCore;

    fn deref(&self) -> &SessionCore {
        match self.inner.as_deref() {
            Some(core) => core,
            // inner is only vacated inside drop
            None => unreachable!("core guard used after release"),
        }
    }
}

impl DerefMut for CoreGuard<'_> {
    fn deref_mut(&mut self) -> &mut SessionCore {
        match self.inner.as_deref_mut() {
            Some(core) => core,
            None => unreachable!("core guard used after release"),
        }
    }
}

impl Drop for CoreGuard<'_> {
    fn drop(&mut self) {
        let Some(core) = self.inner.take() else { return };
        drain_backlog_locked(&core, self.session, self.table);
        drop(core);
        // A frame pushed between the drain above and the unlock would sit
        // until the next acquisition; re-check now that the lock is free.
        loop {
            if self.session.backlog.lock().is_empty() {
                break;
            }
            match self.session.core.try_lock() {
                Some(core) => {
                    drain_backlog_locked(&core, self.session, self.table);
                    drop(core);
                }
                None => break, // the new holder drains on its release
            }
        }
    }
}

fn drain_backlog_locked(core: &SessionCore, session: &Session, table: &SessionTable) {
    loop {
        let frame = session.backlog.lock().pop_front();
        let Some(frame) = frame else { break };
        match split_frame(&frame) {
            Ok((_, payload)) => dispatch_payload(core, session, table, payload),
            Err(error) => {
                // Frames are validated before they are backlogged.
                debug!(%error, "discarding undecodable backlog frame");
            }
        }
    }
}

/// Route a decoded payload for a session whose core is held: an attached
/// channel wins, then a relay target, otherwise the local receive queue.
pub(crate) fn dispatch_payload(
    core: &SessionCore,
    session: &Session,
    table: &SessionTable,
    payload: Bytes,
) {
    match core.state {
        SessionState::Connected => {
            if let Some(channel) = &core.channel {
                session.stats.count_rx(payload.len());
                channel.deliver(payload);
            } else if let Some(target) = core.relay_to {
                relay::forward(table, session, target, payload);
            } else {
                session.enqueue_rx(payload);
            }
        }
        SessionState::Unconnected | SessionState::Zombie => session.enqueue_rx(payload),
        SessionState::Dead => {
            debug!("dropping payload for dead session");
        }
    }
}

/// Transmit path: encode `payload` as a session-stage data frame and hand
/// it to the bound device. Requires the core to be held.
pub(crate) fn transmit_locked(
    core: &SessionCore,
    session: &Session,
    payload: Bytes,
) -> Result<usize> {
    match core.state {
        SessionState::Connected => {}
        SessionState::Dead => return Err(SessionError::Disconnected),
        _ => return Err(SessionError::NotConnected),
    }
    let key = core.key.ok_or(SessionError::NotConnected)?;
    let device = core
        .device
        .as_ref()
        .and_then(Weak::upgrade)
        .ok_or(SessionError::DeviceUnavailable)?;

    let hard_header_len = device.hard_header_len();
    let max = device.mtu() + hard_header_len;
    let required = payload.len() + HEADER_LEN + hard_header_len;
    if required > max {
        return Err(SessionError::MessageTooLong {
            size: required,
            max,
        });
    }

    let mut buf = BytesMut::with_capacity(HEADER_LEN + payload.len());
    encode_frame(codes::SESSION_DATA, key.id.0, &payload, &mut buf)?;
    device.transmit(key.peer, ETHERTYPE_SESSION, buf.freeze())?;
    session.stats.count_tx(payload.len());
    Ok(payload.len())
}
