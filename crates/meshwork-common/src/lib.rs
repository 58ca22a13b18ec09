//! # meshwork-common
//!
//! Narrow interfaces to the collaborators the Meshwork control plane drives
//! but does not implement: the serial byte stream, the monotonic clock, and
//! the mesh radio network.
//!
//! Everything here is consumed from a single thread of control. Nothing is
//! `Sync`-bound and nothing locks; an embedding that runs on a multi-threaded
//! executor confines a node's transport, cache and protocol handlers to one
//! task.
//!
//! In-memory implementations ([`BufferedTransport`], [`ManualClock`]) are
//! provided for host-side simulation and tests.

mod clock;
mod error;
mod network;
mod transport;

pub use clock::*;
pub use error::*;
pub use network::*;
pub use transport::*;

/// Mesh node address. Node ids start at 1; 0 marks an empty slot.
pub type NodeId = u8;

/// Reserved "no node" address.
pub const NODE_ID_NONE: NodeId = 0;
