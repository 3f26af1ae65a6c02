//! The session registry: a fixed-width, lock-striped map from
//! (session ID, peer address) to live sessions.
//!
//! Sixteen buckets, each behind its own reader/writer lock, so lookups on
//! the hot receive path only contend with mutations of their own bucket.
//! A lookup clones the `Arc` before the bucket lock is released; the caller
//! can keep using the session while inserts and removals proceed.

use std::fmt;
use std::sync::{Arc, Weak};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SessionError};
use crate::key::{bucket_of, SessionKey, BUCKET_COUNT};
use crate::session::{Session, SessionState};

type Bucket = parking_lot::RwLock<Vec<(SessionKey, Arc<Session>)>>;

/// Registry of live sessions.
pub struct SessionTable {
    buckets: [Bucket; BUCKET_COUNT],
}

impl SessionTable {
    pub(crate) fn new() -> Self {
        Self {
            buckets: std::array::from_fn(|_| parking_lot::RwLock::new(Vec::new())),
        }
    }

    /// Register a session under `key`. A colliding key fails without
    /// disturbing the existing entry.
    pub(crate) fn insert(&self, key: SessionKey, session: Arc<Session>) -> Result<()> {
        let mut bucket = self.buckets[bucket_of(&key)].write();
        if bucket.iter().any(|(existing, _)| *existing == key) {
            return Err(SessionError::AlreadyInUse);
        }
        debug!(session_id = key.id.0, peer = %key.peer, "registering session");
        bucket.push((key, session));
        Ok(())
    }

    /// Find the session registered under `key`, if any. The returned `Arc`
    /// keeps the session alive independently of the registry.
    pub fn lookup(&self, key: SessionKey) -> Option<Arc<Session>> {
        let bucket = self.buckets[bucket_of(&key)].read();
        bucket
            .iter()
            .find(|(existing, _)| *existing == key)
            .map(|(_, session)| Arc::clone(session))
    }

    /// Unlink the entry under `key`, returning it if present.
    pub(crate) fn remove(&self, key: SessionKey) -> Option<Arc<Session>> {
        let mut bucket = self.buckets[bucket_of(&key)].write();
        let index = bucket.iter().position(|(existing, _)| *existing == key)?;
        debug!(session_id = key.id.0, peer = %key.peer, "removing session");
        Some(bucket.swap_remove(index).1)
    }

    /// Stable snapshot of every registered session. Taken bucket by bucket;
    /// callers re-confirm anything they care about under the session's own
    /// lock, so entries removed concurrently are harmless.
    pub fn sessions(&self) -> Vec<Arc<Session>> {
        let mut out = Vec::new();
        for bucket in &self.buckets {
            out.extend(bucket.read().iter().map(|(_, session)| Arc::clone(session)));
        }
        out
    }

    pub(crate) fn entries(&self) -> Vec<(SessionKey, Arc<Session>)> {
        let mut out = Vec::new();
        for bucket in &self.buckets {
            out.extend(bucket.read().iter().cloned());
        }
        out
    }

    /// Number of registered sessions.
    pub fn len(&self) -> usize {
        self.buckets.iter().map(|bucket| bucket.read().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// One listing row per registered session.
    pub fn snapshot(&self) -> Vec<SessionInfo> {
        self.entries()
            .into_iter()
            .map(|(key, session)| {
                let core = session.lock_core(self);
                let device = core
                    .device
                    .as_ref()
                    .and_then(Weak::upgrade)
                    .map(|device| device.name().to_string());
                SessionInfo {
                    session_id: key.id.0,
                    peer: key.peer.to_string(),
                    device,
                    state: core.state,
                }
            })
            .collect()
    }
}

/// One row of the session listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    /// Session ID of the entry.
    pub session_id: u16,
    /// Peer hardware address, formatted.
    pub peer: String,
    /// Bound device name, if the device is still alive.
    pub device: Option<String>,
    /// Lifecycle state at snapshot time.
    pub state: SessionState,
}

impl fmt::Display for SessionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:08X} {} {}",
            self.session_id,
            self.peer,
            self.device.as_deref().unwrap_or("-")
        )
    }
}
