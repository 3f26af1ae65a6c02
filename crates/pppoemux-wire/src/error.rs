/// Errors that can occur while encoding or decoding PPPoE frames.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// The buffer is shorter than the fixed 6-byte header.
    #[error("frame truncated ({len} bytes, header needs 6)")]
    Truncated { len: usize },

    /// The header declares more payload than the buffer holds.
    #[error("declared length {declared} exceeds available payload ({available} bytes)")]
    LengthOverrun { declared: u16, available: usize },

    /// The payload does not fit the 16-bit length field.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// A hardware address string failed to parse.
    #[error("invalid MAC address {input:?}")]
    InvalidMac { input: String },
}

pub type Result<T> = std::result::Result<T, WireError>;
