//! Mesh radio network collaborator.
//!
//! The control plane never touches the radio directly. It configures and
//! drives it through [`Network`], and the network hands received application
//! messages back through an [`AckBridge`] while a blocking receive is still in
//! progress.

use crate::{NetworkError, NodeId};

/// How a blocking receive completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveStatus {
    /// An application message was received and handed to the bridge.
    Delivered {
        /// Originating node.
        src: NodeId,
        /// Application port.
        port: u8,
        /// Payload length copied into the receive buffer.
        len: usize,
    },
    /// A network-internal message (routing, discovery) was consumed.
    Internal,
    /// A message was received but not addressed to the application.
    Ignored,
}

/// Re-entry point used by the network while inside [`Network::receive`].
///
/// The implementation relays `data` to whoever is waiting for it and fills
/// `ack` with the application-level acknowledgement to send back over the
/// air. The return value is the number of acknowledgement bytes written.
pub trait AckBridge {
    fn return_ack_payload(&mut self, src: NodeId, port: u8, data: &[u8], ack: &mut [u8]) -> usize;
}

/// Radio control surface.
pub trait Network {
    /// Start the radio and join the network.
    fn begin(&mut self) -> bool;

    /// Leave the network and stop the radio.
    fn end(&mut self) -> bool;

    /// Unicast `data` to `dst`; the acknowledgement payload is written into
    /// `ack` and its length returned.
    fn send(&mut self, dst: NodeId, port: u8, data: &[u8], ack: &mut [u8]) -> Result<usize, NetworkError>;

    /// Broadcast `data` to every reachable node.
    fn broadcast(&mut self, port: u8, data: &[u8]) -> Result<(), NetworkError>;

    /// Block for up to `timeout_ms` waiting for a message.
    ///
    /// Application messages are passed to `bridge` before this returns.
    fn receive(
        &mut self,
        buf: &mut [u8],
        timeout_ms: u32,
        bridge: &mut dyn AckBridge,
    ) -> Result<ReceiveStatus, NetworkError>;

    fn network_caps(&self) -> u8;
    fn set_network_caps(&mut self, caps: u8);

    fn delivery(&self) -> u8;
    fn set_delivery(&mut self, delivery: u8);

    fn channel(&self) -> u8;
    fn set_channel(&mut self, channel: u8);

    fn network_id(&self) -> u16;
    fn set_network_id(&mut self, id: u16);

    fn network_key(&self) -> &[u8];
    fn set_network_key(&mut self, key: &[u8]);

    fn node_id(&self) -> NodeId;
    fn set_node_id(&mut self, id: NodeId);
}
