//! RFC 2516 (PPPoE) session-stage wire format.
//!
//! Every PPPoE frame starts with the same fixed 6-byte header:
//! - A version/type byte, `0x11` for RFC 2516
//! - A 1-byte code (`0x00` for session data, discovery codes otherwise)
//! - A 2-byte big-endian session ID
//! - A 2-byte big-endian payload length
//!
//! Encoding and decoding never allocate beyond the caller's output buffer,
//! and decoding hands back the payload as a slice of the input.

pub mod codec;
pub mod codes;
pub mod error;
pub mod mac;

pub use codec::{
    decode_frame, encode_frame, split_frame, PppoeHeader, HEADER_LEN, VER_TYPE,
};
pub use codes::{ETHERTYPE_DISCOVERY, ETHERTYPE_SESSION};
pub use error::{Result, WireError};
pub use mac::MacAddr;
