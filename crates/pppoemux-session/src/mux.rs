//! The session-stage demultiplexer and device lifecycle bridge.
//!
//! [`SessionMux`] is the top of the crate: it owns the registry, mints
//! session handles, and is the entry point the link layer feeds raw frames
//! into. Ingress runs in the caller's receive context and never blocks on a
//! session: contended sessions get the frame deferred to their backlog.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use bytes::Bytes;
use pppoemux_link::{LinkDevice, LinkEvent};
use pppoemux_wire::{codes, split_frame, MacAddr, ETHERTYPE_DISCOVERY, ETHERTYPE_SESSION};
use tracing::{debug, info};

use crate::handle::SessionHandle;
use crate::key::{SessionId, SessionKey};
use crate::session::{dispatch_payload, is_bound_to, Session, SessionConfig, SessionState};
use crate::stats::{MuxStats, MuxStatsSnapshot};
use crate::table::{SessionInfo, SessionTable};

/// The PPPoE session multiplexer.
pub struct SessionMux {
    pub(crate) table: Arc<SessionTable>,
    config: SessionConfig,
    stats: MuxStats,
}

impl SessionMux {
    /// Multiplexer with default queue bounds.
    pub fn new() -> Self {
        Self::with_config(SessionConfig::default())
    }

    /// Multiplexer whose sessions use the given queue bounds.
    pub fn with_config(config: SessionConfig) -> Self {
        Self {
            table: Arc::new(SessionTable::new()),
            config,
            stats: MuxStats::default(),
        }
    }

    /// Open a new, unconnected session.
    pub fn open(&self) -> SessionHandle {
        SessionHandle::new(
            Arc::new(Session::new(self.config.clone())),
            Arc::clone(&self.table),
        )
    }

    /// The session registry.
    pub fn table(&self) -> &SessionTable {
        &self.table
    }

    /// Feed one received frame, routing on its EtherType. Frames that are
    /// neither session- nor discovery-stage are ignored.
    pub fn ingress(&self, src: MacAddr, ethertype: u16, frame: Bytes) {
        match ethertype {
            ETHERTYPE_SESSION => self.ingress_session(src, frame),
            ETHERTYPE_DISCOVERY => self.ingress_discovery(src, frame),
            _ => debug!(ethertype, "ignoring frame with foreign ethertype"),
        }
    }

    /// Feed one session-stage (0x8864) frame from `src`.
    ///
    /// Never fails: malformed frames, unknown sessions and non-data codes
    /// are counted and dropped. A session that is exclusively held gets the
    /// raw frame deferred to its backlog instead of blocking here.
    pub fn ingress_session(&self, src: MacAddr, frame: Bytes) {
        let (header, payload) = match split_frame(&frame) {
            Ok(decoded) => decoded,
            Err(error) => {
                self.stats.malformed.fetch_add(1, Ordering::Relaxed);
                debug!(%error, "dropping malformed session frame");
                return;
            }
        };
        if header.code != codes::SESSION_DATA {
            self.stats.non_data.fetch_add(1, Ordering::Relaxed);
            debug!(code = codes::code_name(header.code), "dropping non-data session frame");
            return;
        }

        let key = SessionKey::new(SessionId(header.session_id), src);
        let Some(session) = self.table.lookup(key) else {
            self.stats.lookup_miss.fetch_add(1, Ordering::Relaxed);
            debug!(session_id = header.session_id, peer = %src, "no session for frame, dropping");
            return;
        };

        match session.try_lock_core(&self.table) {
            Some(guard) => {
                // Deferred frames first, so arrival order survives
                // contention windows.
                guard.drain_backlog();
                dispatch_payload(&guard, &session, &self.table, payload);
            }
            None => {
                session.push_backlog(frame);
                // The holder may have released between our failed
                // acquisition and the push; re-check so the frame cannot
                // strand in the backlog.
                if let Some(guard) = session.try_lock_core(&self.table) {
                    drop(guard);
                }
            }
        };
    }

    /// Feed one discovery-stage (0x8863) frame from `src`.
    ///
    /// Only PADT for a registered session has any effect: it turns the
    /// session into a zombie, unless the session is exclusively held right
    /// now, in which case the signal is dropped and the holder observes the
    /// staleness later. Discovery negotiation itself happens elsewhere.
    pub fn ingress_discovery(&self, src: MacAddr, frame: Bytes) {
        let (header, _) = match split_frame(&frame) {
            Ok(decoded) => decoded,
            Err(error) => {
                self.stats.malformed.fetch_add(1, Ordering::Relaxed);
                debug!(%error, "dropping malformed discovery frame");
                return;
            }
        };
        if header.code != codes::PADT {
            self.stats.disc_ignored.fetch_add(1, Ordering::Relaxed);
            debug!(code = codes::code_name(header.code), "ignoring discovery frame");
            return;
        }

        let key = SessionKey::new(SessionId(header.session_id), src);
        let Some(session) = self.table.lookup(key) else {
            self.stats.lookup_miss.fetch_add(1, Ordering::Relaxed);
            return;
        };

        match session.try_lock_core(&self.table) {
            Some(mut guard) => {
                guard.channel = None;
                guard.relay_to = None;
                session.set_state(&mut guard, SessionState::Zombie);
                drop(guard);
                session.wake_readers();
                info!(session_id = header.session_id, peer = %src, "peer terminated session");
            }
            None => {
                debug!(session_id = header.session_id, "session busy, teardown signal dropped");
            }
        };
    }

    /// React to a device lifecycle change: every session bound to `device`
    /// is flushed to `Zombie`, its channel, relay target and device
    /// reference dropped. A session its peer already terminated still holds
    /// the device reference; the flush releases that one too. Returns the
    /// number of sessions flushed. Queued payloads stay readable until the
    /// sessions are closed.
    pub fn device_event(&self, device: &Arc<dyn LinkDevice>, event: LinkEvent) -> usize {
        match event {
            LinkEvent::Down => {
                info!(device = device.name(), "link down, flushing bound sessions")
            }
            LinkEvent::MtuChanged(mtu) => {
                info!(device = device.name(), mtu, "mtu changed, flushing bound sessions")
            }
        }

        let mut flushed = 0;
        for session in self.table.sessions() {
            let mut core = session.lock_core(&self.table);
            if !is_bound_to(&core, device) {
                continue;
            }
            match core.state {
                SessionState::Connected => {
                    core.channel = None;
                    core.relay_to = None;
                    core.device = None;
                    session.set_state(&mut core, SessionState::Zombie);
                    drop(core);
                    session.wake_readers();
                    flushed += 1;
                }
                SessionState::Zombie => {
                    // Peer-terminated sessions keep their device reference
                    // until close; a dying device reclaims it now.
                    core.device = None;
                    flushed += 1;
                }
                _ => {}
            }
        }
        debug!(flushed, "device flush complete");
        flushed
    }

    /// One listing row per registered session.
    pub fn sessions(&self) -> Vec<SessionInfo> {
        self.table.snapshot()
    }

    /// Number of registered sessions.
    pub fn session_count(&self) -> usize {
        self.table.len()
    }

    /// Point-in-time copy of the demultiplexer counters.
    pub fn stats(&self) -> MuxStatsSnapshot {
        self.stats.snapshot()
    }
}

impl Default for SessionMux {
    fn default() -> Self {
        Self::new()
    }
}
