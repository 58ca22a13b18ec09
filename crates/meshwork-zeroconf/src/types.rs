//! Provisioned configuration records.
//!
//! The protocol owns one of each. Hosts read them with the request
//! sub-codes and replace them with the configure sub-codes.

use std::fmt;

use meshwork_common::NodeId;
use meshwork_serial::ErrorCode;

use crate::{MAX_NETWORK_KEY_LEN, MAX_SERIAL_LEN};

/// Device capabilities and delivery mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceConfig {
    pub nwkcaps: u8,
    pub delivery: u8,
}

/// Radio network membership.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct NetworkConfig {
    pub channel: u8,
    pub network_id: u16,
    pub node_id: NodeId,
    key: [u8; MAX_NETWORK_KEY_LEN],
    key_len: usize,
}

impl NetworkConfig {
    pub fn key(&self) -> &[u8] {
        &self.key[..self.key_len]
    }

    /// Replace the key; fails with `KeyTooLong` leaving the old key in place.
    pub fn set_key(&mut self, key: &[u8]) -> Result<(), ErrorCode> {
        if key.len() > MAX_NETWORK_KEY_LEN {
            return Err(ErrorCode::KeyTooLong);
        }
        self.key = [0; MAX_NETWORK_KEY_LEN];
        self.key[..key.len()].copy_from_slice(key);
        self.key_len = key.len();
        Ok(())
    }
}

// The key never appears in logs.
impl fmt::Debug for NetworkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkConfig")
            .field("channel", &self.channel)
            .field("network_id", &self.network_id)
            .field("node_id", &self.node_id)
            .field("key_len", &self.key_len)
            .finish()
    }
}

/// Device serial number, at most [`MAX_SERIAL_LEN`] bytes.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct SerialNumber {
    data: [u8; MAX_SERIAL_LEN],
    len: usize,
}

impl SerialNumber {
    pub fn new(serial: &[u8]) -> Result<Self, ErrorCode> {
        let mut number = SerialNumber::default();
        number.set(serial)?;
        Ok(number)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn set(&mut self, serial: &[u8]) -> Result<(), ErrorCode> {
        if serial.len() > MAX_SERIAL_LEN {
            return Err(ErrorCode::SerialTooLong);
        }
        self.data = [0; MAX_SERIAL_LEN];
        self.data[..serial.len()].copy_from_slice(serial);
        self.len = serial.len();
        Ok(())
    }
}

impl fmt::Debug for SerialNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SerialNumber({:?})", String::from_utf8_lossy(self.as_bytes()))
    }
}

/// Where and what the node reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportingConfig {
    pub target: NodeId,
    pub flags: u8,
}
