//! Request records of the operational protocol.
//!
//! Each record is filled from the request payload and lives for the duration
//! of one message, except the configuration records which the protocol keeps
//! as the last values the host supplied.

use meshwork_common::NodeId;

use crate::PAYLOAD_MAX;

/// Payload of a basic-configuration request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BasicConfig {
    /// Network capability flags.
    pub nwkcaps: u8,
    /// Delivery mode flags.
    pub delivery: u8,
    /// Retry count for radio sends.
    pub retry: u8,
}

/// Payload of a network-configuration request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetworkParams {
    pub network_id: u16,
    pub node_id: NodeId,
}

/// Fixed-capacity application payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadBuf {
    data: [u8; PAYLOAD_MAX],
    len: usize,
}

impl PayloadBuf {
    pub fn new() -> Self {
        PayloadBuf {
            data: [0; PAYLOAD_MAX],
            len: 0,
        }
    }

    /// Append a byte; returns `false` when full.
    pub fn push(&mut self, byte: u8) -> bool {
        if self.len == PAYLOAD_MAX {
            return false;
        }
        self.data[self.len] = byte;
        self.len += 1;
        true
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for PayloadBuf {
    fn default() -> Self {
        Self::new()
    }
}

/// Payload of a unicast send request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SendRequest {
    pub dst: NodeId,
    pub port: u8,
    pub data: PayloadBuf,
}

/// Payload of a broadcast request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastRequest {
    pub port: u8,
    pub data: PayloadBuf,
}
