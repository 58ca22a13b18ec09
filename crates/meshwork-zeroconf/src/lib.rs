//! Meshwork Zero-Configuration Protocol
//!
//! Lets a provisioning host read and write a node's device, network,
//! reporting and serial-number settings over the serial link.
//!
//! # Frame Format
//!
//! Unlike the operational protocol, the length byte comes first and counts
//! every byte after it:
//!
//! ```text
//! +-----+-----+---------+---------+----------------------+
//! | len | seq | ZC_CODE | subcode | payload (len - 3) ...|
//! +-----+-----+---------+---------+----------------------+
//! ```
//!
//! Responses use the same layout. A node must be put into provisioning mode
//! with [`ZC_SUBCODE_INIT`] before any other request is accepted; init stops
//! the radio for the duration and [`ZC_SUBCODE_DEINIT`] restarts it.
//!
//! The stream is always left at a message boundary: payload bytes a handler
//! does not read are discarded before the response is written.

mod config;
mod constants;
mod hooks;
mod protocol;
mod responses;
mod types;

pub use config::*;
pub use constants::*;
pub use hooks::*;
pub use protocol::*;
pub use responses::*;
pub use types::*;
