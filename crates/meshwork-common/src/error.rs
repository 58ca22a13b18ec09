//! Errors reported by the Network collaborator.

use thiserror::Error;

/// Failures of a radio network operation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NetworkError {
    /// The network has not been started with `begin`.
    #[error("network not started")]
    NotStarted,

    /// No message arrived before the receive deadline.
    #[error("timed out after {0} ms")]
    Timeout(u32),

    /// The destination did not acknowledge delivery.
    #[error("no acknowledgement from node {0}")]
    NoAck(u8),

    /// Payload does not fit the radio frame.
    #[error("payload too large: {size} bytes (max {max})")]
    PayloadTooLarge {
        /// Actual size.
        size: usize,
        /// Maximum allowed size.
        max: usize,
    },

    /// Driver-specific failure code.
    #[error("driver error code {0}")]
    Driver(i8),
}
