//! Protocol constants
//!
//! Message codes, error codes and buffer capacities of the operational
//! serial protocol. The byte values are fixed by the host controller.

// ============================================================================
// Message Codes
// ============================================================================

/// Request succeeded.
pub const MSGCODE_OK: u8 = 0;
/// Request failed; followed by an error code.
pub const MSGCODE_NOK: u8 = 1;
/// Request code not recognised.
pub const MSGCODE_UNKNOWN: u8 = 2;
/// A network-internal message was handled instead of an application one.
pub const MSGCODE_INTERNAL: u8 = 3;
/// Basic configuration: capabilities, delivery and retry bytes.
pub const MSGCODE_CFGBASIC: u8 = 10;
/// Network configuration: network id and node id.
pub const MSGCODE_CFGNWK: u8 = 11;
/// Start the radio.
pub const MSGCODE_RFINIT: u8 = 20;
/// Stop the radio.
pub const MSGCODE_RFDEINIT: u8 = 21;
/// Received-message notification (device → host).
pub const MSGCODE_RFRECV: u8 = 22;
/// Acknowledgement for a received message (host → device, no header).
pub const MSGCODE_RFRECVACK: u8 = 23;
/// Block in receive for a host-supplied timeout.
pub const MSGCODE_RFSTARTRECV: u8 = 24;
/// Unicast send.
pub const MSGCODE_RFSEND: u8 = 25;
/// Send acknowledgement with the peer's ACK payload (device → host).
pub const MSGCODE_RFSENDACK: u8 = 26;
/// Broadcast send.
pub const MSGCODE_RFBCAST: u8 = 27;

// ============================================================================
// Error Codes
// ============================================================================

pub const ERROR_GENERAL: u8 = 0;
pub const ERROR_INSUFFICIENT_DATA: u8 = 1;
pub const ERROR_TOO_LONG_DATA: u8 = 2;
pub const ERROR_ILLEGAL_STATE: u8 = 3;
pub const ERROR_RECV: u8 = 4;
pub const ERROR_SEND: u8 = 5;
pub const ERROR_BCAST: u8 = 6;
pub const ERROR_KEY_TOO_LONG: u8 = 7;
pub const ERROR_SERIAL_TOO_LONG: u8 = 8;

// ============================================================================
// Sizes
// ============================================================================

/// Bytes in an operational request header: seq, len, code.
pub const HEADER_LEN: usize = 3;
/// Largest application payload carried over the radio.
pub const PAYLOAD_MAX: usize = 64;
/// Largest acknowledgement payload carried over the radio.
pub const ACK_PAYLOAD_MAX: usize = 16;
/// Delay between availability checks while waiting for input.
pub const POLL_INTERVAL_MS: u64 = 16;
/// Default for the bounded waits of both protocols.
pub const DEFAULT_TIMEOUT_MS: u64 = 1000;
