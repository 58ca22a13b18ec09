//! Byte-stream transport (UART) interface.

use bytes::{Buf, BytesMut};

/// Power-mode hint passed along with an explicit flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PowerMode {
    /// Keep peripherals running while the output drains.
    #[default]
    Idle,
    /// Allow the MCU to enter standby while the output drains.
    Standby,
}

/// Byte-oriented duplex stream to the host controller.
pub trait Transport {
    /// Number of bytes that can be read without blocking.
    fn available(&self) -> usize;

    /// Read one byte, or `None` if the receive buffer is empty.
    fn read_byte(&mut self) -> Option<u8>;

    /// Queue one byte for transmission.
    fn write_byte(&mut self, byte: u8);

    /// Push any queued output to the wire.
    fn flush(&mut self, mode: PowerMode);

    /// Queue a slice for transmission.
    fn write_all(&mut self, data: &[u8]) {
        for &byte in data {
            self.write_byte(byte);
        }
    }
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn available(&self) -> usize {
        (**self).available()
    }

    fn read_byte(&mut self) -> Option<u8> {
        (**self).read_byte()
    }

    fn write_byte(&mut self, byte: u8) {
        (**self).write_byte(byte)
    }

    fn flush(&mut self, mode: PowerMode) {
        (**self).flush(mode)
    }
}

/// An in-memory transport.
///
/// Bytes pushed with [`BufferedTransport::push_rx`] become readable by the
/// protocol; everything the protocol writes accumulates until taken with
/// [`BufferedTransport::take_tx`]. Unflushed output is kept apart from
/// flushed output so tests can check that responses are flushed.
#[derive(Debug, Default)]
pub struct BufferedTransport {
    rx: BytesMut,
    pending: Vec<u8>,
    tx: Vec<u8>,
    flushes: usize,
}

impl BufferedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `data` readable by the device side.
    pub fn push_rx(&mut self, data: &[u8]) {
        self.rx.extend_from_slice(data);
    }

    /// Take everything flushed so far.
    pub fn take_tx(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.tx)
    }

    /// Flushed output that has not been taken yet.
    pub fn tx(&self) -> &[u8] {
        &self.tx
    }

    /// Bytes written but not yet flushed.
    pub fn pending(&self) -> &[u8] {
        &self.pending
    }

    /// Number of flushes performed.
    pub fn flush_count(&self) -> usize {
        self.flushes
    }

    /// Drop unread input.
    pub fn clear_rx(&mut self) {
        self.rx.clear();
    }
}

impl Transport for BufferedTransport {
    fn available(&self) -> usize {
        self.rx.len()
    }

    fn read_byte(&mut self) -> Option<u8> {
        if self.rx.has_remaining() {
            Some(self.rx.get_u8())
        } else {
            None
        }
    }

    fn write_byte(&mut self, byte: u8) {
        self.pending.push(byte);
    }

    fn flush(&mut self, _mode: PowerMode) {
        self.tx.append(&mut self.pending);
        self.flushes += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffered_transport_reads_in_order() {
        let mut transport = BufferedTransport::new();
        transport.push_rx(&[1, 2, 3]);

        assert_eq!(transport.available(), 3);
        assert_eq!(transport.read_byte(), Some(1));
        assert_eq!(transport.read_byte(), Some(2));
        assert_eq!(transport.available(), 1);
        assert_eq!(transport.read_byte(), Some(3));
        assert_eq!(transport.read_byte(), None);
    }

    #[test]
    fn test_buffered_transport_only_exposes_flushed_output() {
        let mut transport = BufferedTransport::new();
        transport.write_all(&[7, 8]);
        assert!(transport.tx().is_empty());
        assert_eq!(transport.pending(), &[7, 8]);

        transport.flush(PowerMode::Idle);
        assert_eq!(transport.flush_count(), 1);
        assert_eq!(transport.take_tx(), vec![7, 8]);
        assert!(transport.tx().is_empty());
    }

    #[test]
    fn test_transport_through_mut_ref() {
        let mut transport = BufferedTransport::new();
        transport.push_rx(&[42]);
        {
            let mut borrowed: &mut BufferedTransport = &mut transport;
            assert_eq!(Transport::read_byte(&mut borrowed), Some(42));
            Transport::write_byte(&mut borrowed, 9);
            Transport::flush(&mut borrowed, PowerMode::Standby);
        }
        assert_eq!(transport.take_tx(), vec![9]);
    }
}
