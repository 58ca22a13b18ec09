//! Collaborators injected into [`crate::ZeroConfSerial`].

use bytes::Bytes;
use meshwork_common::Transport;
use meshwork_serial::{ErrorCode, SerialMessage};

use crate::{DeviceConfig, NetworkConfig, ReportingConfig, SerialNumber};

/// Told about every configuration the host changes.
///
/// Called after the record is updated and before the host is answered.
pub trait ZeroConfListener {
    fn devconfig_updated(&mut self, _config: &DeviceConfig) {}
    fn network_updated(&mut self, _config: &NetworkConfig) {}
    fn serial_updated(&mut self, _serial: &SerialNumber) {}
    fn reporting_updated(&mut self, _config: &ReportingConfig) {}
}

/// Answer from an extension that claimed a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtensionReply {
    /// Respond with `subcode` followed by `data`.
    Code { subcode: u8, data: Bytes },
    Nok(ErrorCode),
}

/// Handles sub-codes the protocol does not know.
pub trait ZeroConfExtension {
    /// Return `None` to leave the message unclaimed; the host then gets the
    /// unknown sub-code. Payload bytes left unread are discarded either way.
    fn process_message(&mut self, msg: &SerialMessage, payload: &mut PayloadReader<'_>) -> Option<ExtensionReply>;
}

/// Reads the declared payload of the current message and nothing past it.
pub struct PayloadReader<'a> {
    transport: &'a mut dyn Transport,
    remaining: &'a mut usize,
}

impl<'a> PayloadReader<'a> {
    pub fn new(transport: &'a mut dyn Transport, remaining: &'a mut usize) -> Self {
        PayloadReader { transport, remaining }
    }

    /// Declared bytes not yet read.
    pub fn remaining(&self) -> usize {
        *self.remaining
    }

    pub fn read_u8(&mut self) -> Result<u8, ErrorCode> {
        if *self.remaining == 0 {
            return Err(ErrorCode::InsufficientData);
        }
        let byte = self.transport.read_byte().ok_or(ErrorCode::InsufficientData)?;
        *self.remaining -= 1;
        Ok(byte)
    }

    pub fn read_u16(&mut self) -> Result<u16, ErrorCode> {
        let hi = self.read_u8()?;
        let lo = self.read_u8()?;
        Ok(u16::from_be_bytes([hi, lo]))
    }

    /// Fill `buf` entirely.
    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), ErrorCode> {
        if *self.remaining < buf.len() {
            return Err(ErrorCode::InsufficientData);
        }
        for slot in buf.iter_mut() {
            *slot = self.read_u8()?;
        }
        Ok(())
    }
}
