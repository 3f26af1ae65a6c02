use pppoemux_wire::MacAddr;

/// Number of registry buckets. Must stay a power of two for the mask below.
pub const BUCKET_COUNT: usize = 16;

const BUCKET_BITS: u32 = 4;
const BUCKET_MASK: u8 = (BUCKET_COUNT - 1) as u8;

/// A 16-bit PPPoE session ID. Zero means "no session" and never appears in
/// the registry; connecting with zero is the disconnect request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub u16);

impl SessionId {
    /// The unassigned sentinel.
    pub const UNSET: SessionId = SessionId(0);

    /// Whether this is the unassigned sentinel.
    pub fn is_unset(&self) -> bool {
        self.0 == 0
    }
}

impl From<u16> for SessionId {
    fn from(id: u16) -> Self {
        SessionId(id)
    }
}

/// Registry key: a session ID qualified by the peer's hardware address.
/// Session IDs are only unique per peer, so both parts participate in
/// identity and hashing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub id: SessionId,
    pub peer: MacAddr,
}

impl SessionKey {
    pub fn new(id: SessionId, peer: MacAddr) -> Self {
        Self { id, peer }
    }
}

/// Bucket index for a key: XOR-fold of the high and low nibbles of every
/// peer byte, folded together with the four nibbles of the session ID.
pub fn bucket_of(key: &SessionKey) -> usize {
    let mut hash: u8 = 0;
    for byte in key.peer.octets() {
        hash ^= byte;
        hash ^= byte >> BUCKET_BITS;
    }
    let sid = key.id.0;
    for shift in (0..u16::BITS).step_by(BUCKET_BITS as usize) {
        hash ^= (sid >> shift) as u8;
    }
    (hash & BUCKET_MASK) as usize
}
