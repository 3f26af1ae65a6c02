use pppoemux_link::LinkError;
use pppoemux_wire::WireError;

/// Errors surfaced to callers of session operations.
///
/// Receive-side conditions (malformed frames, lookups that miss) are counted
/// and dropped rather than surfaced; there is no reverse channel to report
/// them to an unknown peer.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Another live session already owns this (session ID, peer) key.
    #[error("session key already in use")]
    AlreadyInUse,

    /// The session is already connected; disconnect before reconnecting.
    #[error("session already connected")]
    AlreadyConnected,

    /// The operation requires a connected session.
    #[error("session not connected")]
    NotConnected,

    /// The capability being cleared was never set.
    #[error("not enabled")]
    NotEnabled,

    /// The payload exceeds what the bound device can carry.
    #[error("message too long ({size} bytes, max {max})")]
    MessageTooLong { size: usize, max: usize },

    /// The session was torn down (peer terminate, device flush, or close).
    #[error("session disconnected")]
    Disconnected,

    /// The device is down or has disappeared.
    #[error("device unavailable")]
    DeviceUnavailable,

    /// A frame-level encoding failure.
    #[error(transparent)]
    Wire(#[from] WireError),

    /// The link device refused a transmission.
    #[error(transparent)]
    Link(#[from] LinkError),
}

pub type Result<T> = std::result::Result<T, SessionError>;
