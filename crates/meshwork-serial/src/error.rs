//! Error types.

use thiserror::Error;

use crate::constants::*;

/// Wire-level failure reported to the host in a NOK frame.
///
/// Protocol handlers return `Result<_, ErrorCode>`; the dispatcher turns each
/// `Err` into a single NOK response.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorCode {
    #[error("general failure")]
    General = ERROR_GENERAL,

    #[error("insufficient data")]
    InsufficientData = ERROR_INSUFFICIENT_DATA,

    #[error("data too long")]
    TooLongData = ERROR_TOO_LONG_DATA,

    #[error("illegal state")]
    IllegalState = ERROR_ILLEGAL_STATE,

    #[error("receive failed")]
    Recv = ERROR_RECV,

    #[error("send failed")]
    Send = ERROR_SEND,

    #[error("broadcast failed")]
    Bcast = ERROR_BCAST,

    #[error("network key too long")]
    KeyTooLong = ERROR_KEY_TOO_LONG,

    #[error("serial number too long")]
    SerialTooLong = ERROR_SERIAL_TOO_LONG,
}

impl ErrorCode {
    /// The byte sent on the wire.
    pub const fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            ERROR_GENERAL => ErrorCode::General,
            ERROR_INSUFFICIENT_DATA => ErrorCode::InsufficientData,
            ERROR_TOO_LONG_DATA => ErrorCode::TooLongData,
            ERROR_ILLEGAL_STATE => ErrorCode::IllegalState,
            ERROR_RECV => ErrorCode::Recv,
            ERROR_SEND => ErrorCode::Send,
            ERROR_BCAST => ErrorCode::Bcast,
            ERROR_KEY_TOO_LONG => ErrorCode::KeyTooLong,
            ERROR_SERIAL_TOO_LONG => ErrorCode::SerialTooLong,
            _ => return None,
        })
    }
}

impl From<ErrorCode> for u8 {
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Errors loading protocol configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid configuration value for {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}
