//! The caller-facing session surface.
//!
//! A [`SessionHandle`] is the owner of one session: connecting, sending,
//! receiving, relay control and teardown all go through it. Dropping the
//! handle closes the session. The receive path holds `Arc`s to the same
//! session, so the memory outlives the handle for as long as frames are in
//! flight, but no new frames match once close unregistered the key.

use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use bytes::Bytes;
use pppoemux_link::LinkDevice;
use pppoemux_wire::MacAddr;
use tracing::{debug, info};

use crate::error::{Result, SessionError};
use crate::key::{SessionId, SessionKey};
use crate::session::{transmit_locked, PppChannel, Session, SessionState};
use crate::stats::StatsSnapshot;
use crate::table::SessionTable;

/// Owning handle to one session.
pub struct SessionHandle {
    pub(crate) session: Arc<Session>,
    pub(crate) table: Arc<SessionTable>,
}

impl SessionHandle {
    pub(crate) fn new(session: Arc<Session>, table: Arc<SessionTable>) -> Self {
        Self { session, table }
    }

    /// Bind this session to `(session_id, peer)` on `device`.
    ///
    /// A zero `session_id` is the disconnect request (see [`disconnect`]).
    /// Reconnecting a zombie session sheds the stale binding first, exactly
    /// as an explicit disconnect would.
    ///
    /// [`disconnect`]: SessionHandle::disconnect
    pub fn connect(
        &self,
        session_id: SessionId,
        device: &Arc<dyn LinkDevice>,
        peer: MacAddr,
    ) -> Result<()> {
        let mut core = self.session.lock_core(&self.table);
        match core.state {
            SessionState::Dead => return Err(SessionError::Disconnected),
            SessionState::Connected if !session_id.is_unset() => {
                return Err(SessionError::AlreadyConnected)
            }
            _ => {}
        }

        self.session.unbind(&mut core, &self.table);
        if session_id.is_unset() {
            return Ok(());
        }

        if !device.is_up() {
            return Err(SessionError::DeviceUnavailable);
        }

        let key = SessionKey::new(session_id, peer);
        self.table.insert(key, Arc::clone(&self.session))?;
        core.key = Some(key);
        core.device = Some(Arc::downgrade(device));
        self.session.set_state(&mut core, SessionState::Connected);
        info!(session_id = session_id.0, peer = %peer, device = device.name(), "session connected");
        Ok(())
    }

    /// Unbind from the registry and return to `Unconnected`. A no-op on a
    /// session that was never bound.
    pub fn disconnect(&self) -> Result<()> {
        let mut core = self.session.lock_core(&self.table);
        if core.state == SessionState::Dead {
            return Err(SessionError::Disconnected);
        }
        self.session.unbind(&mut core, &self.table);
        Ok(())
    }

    /// Encapsulate `payload` and hand it to the bound device. Returns the
    /// number of payload bytes accepted; nothing is sent on error.
    pub fn send(&self, payload: impl Into<Bytes>) -> Result<usize> {
        let payload = payload.into();
        let core = self.session.lock_core(&self.table);
        transmit_locked(&core, &self.session, payload)
    }

    /// Pull the next decapsulated payload, blocking until one arrives or
    /// the session leaves `Connected`.
    pub fn recv(&self) -> Result<Bytes> {
        let mut rx = self.session.rx.lock();
        loop {
            if let Some(payload) = rx.pop_front() {
                return Ok(payload);
            }
            match self.session.state() {
                SessionState::Connected => {}
                SessionState::Unconnected => return Err(SessionError::NotConnected),
                SessionState::Zombie | SessionState::Dead => {
                    return Err(SessionError::Disconnected)
                }
            }
            self.session.rx_cv.wait(&mut rx);
        }
    }

    /// Like [`recv`](SessionHandle::recv) with an upper bound on the wait.
    /// `Ok(None)` means the timeout elapsed.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<Bytes>> {
        let deadline = Instant::now() + timeout;
        let mut rx = self.session.rx.lock();
        loop {
            if let Some(payload) = rx.pop_front() {
                return Ok(Some(payload));
            }
            match self.session.state() {
                SessionState::Connected => {}
                SessionState::Unconnected => return Err(SessionError::NotConnected),
                SessionState::Zombie | SessionState::Dead => {
                    return Err(SessionError::Disconnected)
                }
            }
            if self.session.rx_cv.wait_until(&mut rx, deadline).timed_out() {
                return Ok(rx.pop_front());
            }
        }
    }

    /// Pull the next payload if one is already queued.
    pub fn try_recv(&self) -> Result<Option<Bytes>> {
        let mut rx = self.session.rx.lock();
        if let Some(payload) = rx.pop_front() {
            return Ok(Some(payload));
        }
        match self.session.state() {
            SessionState::Connected => Ok(None),
            SessionState::Unconnected => Err(SessionError::NotConnected),
            SessionState::Zombie | SessionState::Dead => Err(SessionError::Disconnected),
        }
    }

    /// Attach an upper-layer channel; incoming payloads are delivered to it
    /// instead of the local receive queue. Re-attaching replaces the
    /// previous channel.
    pub fn attach_channel(&self, channel: Arc<dyn PppChannel>) -> Result<()> {
        let mut core = self.session.lock_core(&self.table);
        if core.state != SessionState::Connected {
            return Err(SessionError::NotConnected);
        }
        core.channel = Some(channel);
        debug!("channel attached");
        Ok(())
    }

    /// Detach the delivery channel, returning payloads to the local queue.
    pub fn detach_channel(&self) -> Result<()> {
        let mut core = self.session.lock_core(&self.table);
        if core.channel.take().is_none() {
            return Err(SessionError::NotEnabled);
        }
        debug!("channel detached");
        Ok(())
    }

    /// Forward incoming payloads to the session registered under `target`.
    /// Both ends must be `Connected`, and a session cannot relay to itself.
    pub fn set_relay(&self, target: SessionKey) -> Result<()> {
        let mut core = self.session.lock_core(&self.table);
        if core.state != SessionState::Connected {
            return Err(SessionError::NotConnected);
        }
        if core.key == Some(target) {
            return Err(SessionError::NotConnected);
        }
        let resolved = self.table.lookup(target).ok_or(SessionError::NotConnected)?;
        if resolved.state() != SessionState::Connected {
            return Err(SessionError::NotConnected);
        }
        core.relay_to = Some(target);
        info!(session_id = target.id.0, peer = %target.peer, "relay enabled");
        Ok(())
    }

    /// Stop relaying.
    pub fn clear_relay(&self) -> Result<()> {
        let mut core = self.session.lock_core(&self.table);
        if core.relay_to.take().is_none() {
            return Err(SessionError::NotEnabled);
        }
        debug!("relay disabled");
        Ok(())
    }

    /// The (session ID, peer) pair this session is bound to, if any.
    pub fn peer_address(&self) -> Option<SessionKey> {
        let core = self.session.lock_core(&self.table);
        core.key
    }

    /// Name of the bound device, if one is bound and still alive.
    pub fn device_name(&self) -> Option<String> {
        let core = self.session.lock_core(&self.table);
        core.device
            .as_ref()
            .and_then(Weak::upgrade)
            .map(|device| device.name().to_string())
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    /// Point-in-time copy of the session counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.session.stats()
    }

    /// Tear the session down: purge both queues, unregister, release the
    /// device and wake blocked readers. Idempotent; also runs on drop.
    pub fn close(&self) {
        let mut core = self.session.lock_core(&self.table);
        if core.state == SessionState::Dead {
            return;
        }
        if let Some(key) = core.key.take() {
            self.table.remove(key);
        }
        core.device = None;
        core.channel = None;
        core.relay_to = None;
        self.session.set_state(&mut core, SessionState::Dead);
        self.session.rx.lock().clear();
        self.session.backlog.lock().clear();
        self.session.wake_readers();
        debug!("session closed");
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Lock-free on purpose; formatting must never contend with the core.
        f.debug_struct("SessionHandle")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
