//! PPPoE session-stage multiplexing: session lifecycle, frame
//! demultiplexing, and the transmit path.
//!
//! A [`SessionMux`] owns the registry of active sessions, keyed by
//! `(session ID, peer MAC)`. Callers open a [`SessionHandle`], connect it to
//! a link device and peer, and then exchange PPP payloads over it; received
//! frames are fed into [`SessionMux::ingress`] by whatever owns the link.
//!
//! Three delivery modes exist per session, decided frame by frame: an
//! attached [`PppChannel`] (payloads pushed upward synchronously), a relay
//! target (payloads re-encapsulated and transmitted out another session),
//! or the default bounded receive queue drained by [`SessionHandle::recv`].
//!
//! The receive path never blocks on a busy session. Frames arriving while a
//! session is exclusively held are deferred to a bounded backlog and
//! dispatched, in arrival order, when the holder releases.

pub mod error;
pub mod handle;
pub mod key;
pub mod mux;
mod relay;
pub mod session;
pub mod stats;
pub mod table;

pub use error::{Result, SessionError};
pub use handle::SessionHandle;
pub use key::{bucket_of, SessionId, SessionKey, BUCKET_COUNT};
pub use mux::SessionMux;
pub use session::{
    PppChannel, Session, SessionConfig, SessionState, DEFAULT_BACKLOG_CAPACITY,
    DEFAULT_RX_QUEUE_CAPACITY,
};
pub use stats::{MuxStats, MuxStatsSnapshot, SessionStats, StatsSnapshot};
pub use table::{SessionInfo, SessionTable};
