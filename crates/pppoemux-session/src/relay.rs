//! Cross-session forwarding.
//!
//! A session with a relay target hands every decapsulated payload straight
//! to the target's transmit path. This runs in the receive context, so it
//! never blocks and never mutates the source session; any failure costs the
//! frame and bumps the source's `relay_dropped` counter.

use std::sync::Arc;

use bytes::Bytes;
use tracing::debug;

use crate::key::SessionKey;
use crate::session::{transmit_locked, Session};
use crate::table::SessionTable;

pub(crate) fn forward(
    table: &SessionTable,
    source: &Session,
    target_key: SessionKey,
    payload: Bytes,
) {
    let Some(target) = table.lookup(target_key) else {
        source.stats.count_relay_dropped();
        debug!(session_id = target_key.id.0, peer = %target_key.peer, "relay target not registered, dropping");
        return;
    };
    if std::ptr::eq(Arc::as_ptr(&target), source as *const Session) {
        source.stats.count_relay_dropped();
        debug!("relay target is the source session, dropping");
        return;
    }
    let Some(guard) = target.try_lock_core(table) else {
        source.stats.count_relay_dropped();
        debug!("relay target busy, dropping");
        return;
    };
    if let Err(error) = transmit_locked(&guard, &target, payload) {
        source.stats.count_relay_dropped();
        debug!(%error, "relay transmit failed, dropping");
    }
}
