//! PPPoE code and EtherType constants (RFC 2516).
//!
//! Session-stage frames carry the data code; everything else belongs to the
//! discovery stage, of which only PADT matters to an established session.

/// Session-stage data.
pub const SESSION_DATA: u8 = 0x00;

/// Active Discovery Offer.
pub const PADO: u8 = 0x07;

/// Active Discovery Initiation.
pub const PADI: u8 = 0x09;

/// Active Discovery Request.
pub const PADR: u8 = 0x19;

/// Active Discovery Session-confirmation.
pub const PADS: u8 = 0x65;

/// Active Discovery Terminate.
pub const PADT: u8 = 0xA7;

/// EtherType carrying discovery-stage frames.
pub const ETHERTYPE_DISCOVERY: u16 = 0x8863;

/// EtherType carrying session-stage frames.
pub const ETHERTYPE_SESSION: u16 = 0x8864;

/// Returns a human-readable name for a PPPoE code.
pub fn code_name(code: u8) -> &'static str {
    match code {
        SESSION_DATA => "DATA",
        PADO => "PADO",
        PADI => "PADI",
        PADR => "PADR",
        PADS => "PADS",
        PADT => "PADT",
        _ => "UNKNOWN",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_names() {
        assert_eq!(code_name(SESSION_DATA), "DATA");
        assert_eq!(code_name(PADT), "PADT");
        assert_eq!(code_name(PADI), "PADI");
        assert_eq!(code_name(0x42), "UNKNOWN");
    }

    #[test]
    fn test_rfc_values() {
        // RFC 2516 appendix A code points.
        assert_eq!(PADI, 0x09);
        assert_eq!(PADO, 0x07);
        assert_eq!(PADR, 0x19);
        assert_eq!(PADS, 0x65);
        assert_eq!(PADT, 0xA7);
        assert_eq!(ETHERTYPE_DISCOVERY, 0x8863);
        assert_eq!(ETHERTYPE_SESSION, 0x8864);
    }
}
