//! Zero-configuration protocol constants.

/// Major code carried by every zero-configuration frame.
pub const ZC_CODE: u8 = 0x32;

// ============================================================================
// Sub-codes
// ============================================================================

pub const ZC_SUBCODE_OK: u8 = 0;
pub const ZC_SUBCODE_NOK: u8 = 1;
pub const ZC_SUBCODE_UNKNOWN: u8 = 2;

/// Enter provisioning mode.
pub const ZC_SUBCODE_INIT: u8 = 10;
/// Leave provisioning mode.
pub const ZC_SUBCODE_DEINIT: u8 = 11;

pub const ZC_SUBCODE_DEVREQ: u8 = 12;
pub const ZC_SUBCODE_DEVRES: u8 = 13;
pub const ZC_SUBCODE_DEVCFG: u8 = 14;

pub const ZC_SUBCODE_NWKREQ: u8 = 15;
pub const ZC_SUBCODE_NWKRES: u8 = 16;
pub const ZC_SUBCODE_NWKCFG: u8 = 17;

pub const ZC_SUBCODE_REPREQ: u8 = 18;
pub const ZC_SUBCODE_REPRES: u8 = 19;
pub const ZC_SUBCODE_REPCFG: u8 = 20;

pub const ZC_SUBCODE_SERIALREQ: u8 = 21;
pub const ZC_SUBCODE_SERIALRES: u8 = 22;
pub const ZC_SUBCODE_SERIALCFG: u8 = 23;

// ============================================================================
// Sizes
// ============================================================================

/// Smallest valid length byte: seq, code and sub-code.
pub const MIN_MESSAGE_LEN: usize = 3;
pub const MAX_NETWORK_KEY_LEN: usize = 16;
pub const MAX_SERIAL_LEN: usize = 16;

/// Largest extension reply body that still fits behind the one-byte length
/// prefix together with seq, code and sub-code.
pub const MAX_CUSTOM_DATA_LEN: usize = u8::MAX as usize - 3;
