use bytes::{BufMut, Bytes, BytesMut};

use crate::codes;
use crate::error::{Result, WireError};

/// PPPoE header: version/type (1) + code (1) + session ID (2) + length (2) = 6 bytes.
pub const HEADER_LEN: usize = 6;

/// Version 1, Type 1 packed into the first header byte.
pub const VER_TYPE: u8 = 0x11;

/// A decoded PPPoE header.
///
/// `code` is kept raw: decoding extracts it without judging it, so callers
/// decide which codes they act on (the session layer only handles the data
/// code and PADT).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PppoeHeader {
    /// Version (high nibble) and type (low nibble), `0x11` on the wire.
    pub ver_type: u8,
    /// PPPoE code byte (see [`codes`]).
    pub code: u8,
    /// Session ID, 0 = unassigned.
    pub session_id: u16,
    /// Payload length in bytes.
    pub length: u16,
}

impl PppoeHeader {
    /// The version nibble.
    pub fn version(&self) -> u8 {
        self.ver_type >> 4
    }

    /// The type nibble.
    pub fn ptype(&self) -> u8 {
        self.ver_type & 0x0f
    }

    /// Total wire size of the frame this header describes.
    pub fn frame_len(&self) -> usize {
        HEADER_LEN + self.length as usize
    }
}

/// Encode a PPPoE frame into `dst`.
///
/// Wire format (RFC 2516):
/// ```text
/// ┌────────────┬──────────┬─────────────┬─────────────┬──────────────────┐
/// │ Ver │ Type │ Code     │ Session ID  │ Length      │ Payload          │
/// │ (4b)│ (4b) │ (1B)     │ (2B BE)     │ (2B BE)     │ (Length bytes)   │
/// │  1  │  1   │          │             │             │                  │
/// └────────────┴──────────┴─────────────┴─────────────┴──────────────────┘
/// ```
pub fn encode_frame(code: u8, session_id: u16, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.len() > u16::MAX as usize {
        return Err(WireError::PayloadTooLarge {
            size: payload.len(),
            max: u16::MAX as usize,
        });
    }
    dst.reserve(HEADER_LEN + payload.len());
    dst.put_u8(VER_TYPE);
    dst.put_u8(code);
    dst.put_u16(session_id);
    dst.put_u16(payload.len() as u16);
    dst.put_slice(payload);
    Ok(())
}

/// Decode a PPPoE frame, borrowing the payload from `src`.
///
/// Fails if the buffer is shorter than the header or the declared length
/// exceeds what is actually present. Bytes past the declared length are
/// ignored (Ethernet pads short frames). Version/type are extracted but not
/// validated; policy belongs to the caller.
pub fn decode_frame(src: &[u8]) -> Result<(PppoeHeader, &[u8])> {
    if src.len() < HEADER_LEN {
        return Err(WireError::Truncated { len: src.len() });
    }

    let header = PppoeHeader {
        ver_type: src[0],
        code: src[1],
        session_id: u16::from_be_bytes([src[2], src[3]]),
        length: u16::from_be_bytes([src[4], src[5]]),
    };

    let available = src.len() - HEADER_LEN;
    if header.length as usize > available {
        return Err(WireError::LengthOverrun {
            declared: header.length,
            available,
        });
    }

    Ok((header, &src[HEADER_LEN..HEADER_LEN + header.length as usize]))
}

/// Like [`decode_frame`], but returns the payload as a zero-copy slice of
/// the owning [`Bytes`] buffer.
pub fn split_frame(frame: &Bytes) -> Result<(PppoeHeader, Bytes)> {
    let (header, _) = decode_frame(frame)?;
    let payload = frame.slice(HEADER_LEN..HEADER_LEN + header.length as usize);
    Ok((header, payload))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode_roundtrip() {
        let mut buf = BytesMut::new();
        let payload = b"hello, pppoe!";

        encode_frame(codes::SESSION_DATA, 0x1234, payload, &mut buf).unwrap();
        assert_eq!(buf.len(), HEADER_LEN + payload.len());

        let (header, decoded) = decode_frame(&buf).unwrap();
        assert_eq!(header.version(), 1);
        assert_eq!(header.ptype(), 1);
        assert_eq!(header.code, codes::SESSION_DATA);
        assert_eq!(header.session_id, 0x1234);
        assert_eq!(header.length as usize, payload.len());
        assert_eq!(decoded, payload);
    }

    #[test]
    fn test_roundtrip_across_field_ranges() {
        // Sampled sweep over code, session ID and payload length.
        let code_points = [
            codes::SESSION_DATA,
            codes::PADO,
            codes::PADI,
            codes::PADR,
            codes::PADS,
            codes::PADT,
            0xff,
        ];
        let sids = [0u16, 1, 0x1234, 0xffff];
        let lens = [0usize, 1, 64, 1500];

        for &code in &code_points {
            for &sid in &sids {
                for &len in &lens {
                    let payload = vec![0xabu8; len];
                    let mut buf = BytesMut::new();
                    encode_frame(code, sid, &payload, &mut buf).unwrap();

                    let (header, decoded) = decode_frame(&buf).unwrap();
                    assert_eq!(header.code, code);
                    assert_eq!(header.session_id, sid);
                    assert_eq!(header.length as usize, len);
                    assert_eq!(decoded, &payload[..]);
                }
            }
        }
    }

    #[test]
    fn test_exact_byte_layout() {
        let mut buf = BytesMut::new();
        encode_frame(codes::PADT, 0x0011, b"", &mut buf).unwrap();
        assert_eq!(&buf[..], &[0x11, 0xa7, 0x00, 0x11, 0x00, 0x00]);
    }

    #[test]
    fn test_decode_truncated() {
        let result = decode_frame(&[0x11, 0x00, 0x12]);
        assert!(matches!(result, Err(WireError::Truncated { len: 3 })));

        let result = decode_frame(&[]);
        assert!(matches!(result, Err(WireError::Truncated { len: 0 })));
    }

    #[test]
    fn test_decode_length_overrun() {
        // Header declares 10 payload bytes but only 4 follow.
        let mut buf = BytesMut::new();
        buf.put_u8(VER_TYPE);
        buf.put_u8(codes::SESSION_DATA);
        buf.put_u16(0x1234);
        buf.put_u16(10);
        buf.put_slice(&[1, 2, 3, 4]);

        let result = decode_frame(&buf);
        assert!(matches!(
            result,
            Err(WireError::LengthOverrun {
                declared: 10,
                available: 4
            })
        ));
    }

    #[test]
    fn test_decode_ignores_trailing_padding() {
        // Ethernet pads short frames; declared length wins.
        let mut buf = BytesMut::new();
        encode_frame(codes::SESSION_DATA, 7, b"abcd", &mut buf).unwrap();
        buf.put_slice(&[0u8; 10]);

        let (header, payload) = decode_frame(&buf).unwrap();
        assert_eq!(header.length, 4);
        assert_eq!(payload, b"abcd");
    }

    #[test]
    fn test_encode_payload_too_large() {
        let payload = vec![0u8; u16::MAX as usize + 1];
        let mut buf = BytesMut::new();
        let result = encode_frame(codes::SESSION_DATA, 1, &payload, &mut buf);
        assert!(matches!(result, Err(WireError::PayloadTooLarge { .. })));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_does_not_judge_code_or_version() {
        // Unknown codes and nonstandard version nibbles still decode.
        let buf = [0x21, 0x42, 0x00, 0x01, 0x00, 0x00];
        let (header, _) = decode_frame(&buf).unwrap();
        assert_eq!(header.version(), 2);
        assert_eq!(header.ptype(), 1);
        assert_eq!(header.code, 0x42);
    }

    #[test]
    fn test_split_frame_zero_copy() {
        let mut buf = BytesMut::new();
        encode_frame(codes::SESSION_DATA, 0xbeef, b"payload", &mut buf).unwrap();
        let frame = buf.freeze();

        let (header, payload) = split_frame(&frame).unwrap();
        assert_eq!(header.session_id, 0xbeef);
        assert_eq!(payload.as_ref(), b"payload");
        assert_eq!(header.frame_len(), frame.len());
    }

    #[test]
    fn test_empty_payload() {
        let mut buf = BytesMut::new();
        encode_frame(codes::SESSION_DATA, 0, b"", &mut buf).unwrap();

        let (header, payload) = decode_frame(&buf).unwrap();
        assert_eq!(header.session_id, 0);
        assert_eq!(header.length, 0);
        assert!(payload.is_empty());
    }
}
