//! Meshwork Serial Protocols
//!
//! This crate holds what the two host-facing serial protocols share, plus the
//! operational command protocol itself. The zero-configuration protocol lives
//! in `meshwork-zeroconf` and builds on the primitives here.
//!
//! # Protocol Overview
//!
//! The host controller sends framed requests over a byte stream. Every
//! request carries a host-assigned sequence number that is echoed verbatim in
//! each response, so the host can correlate answers with requests.
//!
//! Operational requests look like:
//!
//! ```text
//! +-----+-----+------+----------------+
//! | seq | len | code | payload ...    |
//! +-----+-----+------+----------------+
//! ```
//!
//! and are answered with one of:
//!
//! ```text
//! OK / INTERNAL / UNKNOWN   [seq][1][code]
//! NOK                       [seq][2][NOK][error]
//! send acknowledgement      [seq][2+n][RFSENDACK][n][ack ...]
//! receive notification      [seq][4+n][RFRECV][src][port][n][data ...]
//! ```
//!
//! Failures are never propagated to the caller: each one becomes exactly one
//! NOK frame carrying an [`ErrorCode`].
//!
//! # Example
//!
//! ```rust,ignore
//! use meshwork_common::{BufferedTransport, SystemClock};
//! use meshwork_serial::{OperationalConfig, OperationalSerial};
//!
//! let mut serial = OperationalSerial::new(uart, radio, SystemClock::new(), OperationalConfig::default());
//! loop {
//!     serial.process_one_message();
//! }
//! ```

mod config;
mod constants;
mod error;
mod frame;
mod operational;
mod responses;
mod types;

pub use config::*;
pub use constants::*;
pub use error::*;
pub use frame::*;
pub use operational::*;
pub use responses::*;
pub use types::*;
