//! Framing primitives shared by both serial protocols.
//!
//! Reading is polled: a protocol checks how many bytes the transport holds,
//! and when a message is incomplete it waits with [`await_bytes`]. That wait
//! is the only place either protocol suspends.

use log::trace;
use meshwork_common::{Clock, PowerMode, Transport};

use crate::{ErrorCode, POLL_INTERVAL_MS};

/// Header fields of one request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SerialMessage {
    /// Host-assigned correlation id, echoed in every response.
    pub seq: u8,
    /// Declared payload length.
    pub len: u8,
    /// Major command code.
    pub code: u8,
    /// Secondary code (zero-configuration protocol only).
    pub subcode: u8,
}

/// What one dispatch cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// No complete header was available; nothing was read or written.
    Idle,
    /// The handler ran and answered.
    Completed {
        seq: u8,
        code: u8,
    },
    /// Answered with a NOK frame.
    Rejected {
        seq: u8,
        error: ErrorCode,
    },
    /// Answered with the unknown code.
    Unknown {
        seq: u8,
        code: u8,
    },
}

impl Outcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Outcome::Completed { .. })
    }
}

/// Wait until `transport` holds at least `count` bytes.
///
/// Polls every [`POLL_INTERVAL_MS`]. Returns `false` once `deadline_ms` has
/// elapsed without enough input.
pub fn await_bytes<T, C>(transport: &T, clock: &C, count: usize, deadline_ms: u64) -> bool
where
    T: Transport + ?Sized,
    C: Clock + ?Sized,
{
    let start = clock.now_ms();
    loop {
        if transport.available() >= count {
            return true;
        }
        if clock.since(start) >= deadline_ms {
            trace!(
                "Timed out after {} ms waiting for {} bytes ({} available)",
                deadline_ms,
                count,
                transport.available()
            );
            return false;
        }
        clock.sleep_ms(POLL_INTERVAL_MS);
    }
}

/// Write a complete response frame and flush it.
pub fn write_frame<T: Transport + ?Sized>(transport: &mut T, frame: &[u8]) {
    transport.write_all(frame);
    transport.flush(PowerMode::Idle);
}
