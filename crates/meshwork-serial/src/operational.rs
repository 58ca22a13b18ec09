//! Operational command protocol.
//!
//! Drives the radio on behalf of the host: configuration, start/stop, send,
//! broadcast and receive. One call to [`OperationalSerial::process_one_message`]
//! handles at most one request.
//!
//! Handlers check how many bytes the transport holds before consuming their
//! payload and answer `NOK(INSUFFICIENT_DATA)` on a shortfall. A request that
//! fails part-way may leave its unread payload in the stream; realigning is
//! left to the host, which resends after a NOK.

use log::{debug, error, info, warn};
use meshwork_common::{AckBridge, Clock, Network, NodeId, ReceiveStatus, Transport};
use meshwork_metrics::{metric_defs, metrics};

use crate::constants::*;
use crate::{
    await_bytes, write_frame, BasicConfig, BroadcastRequest, ErrorCode, NetworkParams, OperationalConfig,
    Outcome, PayloadBuf, Response, SendRequest, SerialMessage,
};

const PROTOCOL: &str = "operational";

/// Why a handler did not complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Failure {
    /// The dispatcher still owes the host a NOK frame.
    Nok(ErrorCode),
    /// The receive bridge already answered with a NOK frame.
    Relayed(ErrorCode),
}

impl From<ErrorCode> for Failure {
    fn from(code: ErrorCode) -> Self {
        Failure::Nok(code)
    }
}

/// Operational protocol handler bound to one transport and one network.
pub struct OperationalSerial<T, N, C> {
    transport: T,
    network: N,
    clock: C,
    config: OperationalConfig,
    basic: BasicConfig,
    params: NetworkParams,
}

impl<T, N, C> OperationalSerial<T, N, C>
where
    T: Transport,
    N: Network,
    C: Clock,
{
    pub fn new(transport: T, network: N, clock: C, config: OperationalConfig) -> Self {
        OperationalSerial {
            transport,
            network,
            clock,
            config,
            basic: BasicConfig::default(),
            params: NetworkParams::default(),
        }
    }

    pub fn config(&self) -> &OperationalConfig {
        &self.config
    }

    /// Last basic configuration received from the host.
    pub fn basic_config(&self) -> &BasicConfig {
        &self.basic
    }

    /// Last network configuration received from the host.
    pub fn network_params(&self) -> &NetworkParams {
        &self.params
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn network(&self) -> &N {
        &self.network
    }

    pub fn network_mut(&mut self) -> &mut N {
        &mut self.network
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn into_parts(self) -> (T, N, C) {
        (self.transport, self.network, self.clock)
    }

    /// Read and handle one request.
    ///
    /// Returns [`Outcome::Idle`] without touching the stream when a full
    /// header is not yet available.
    pub fn process_one_message(&mut self) -> Outcome {
        if self.transport.available() < HEADER_LEN {
            return Outcome::Idle;
        }
        let msg = match self.read_header() {
            Ok(msg) => msg,
            Err(_) => return Outcome::Idle,
        };

        info!("[{}] Operational request code {} len {}", msg.seq, msg.code, msg.len);
        metrics::counter!(metric_defs::SERIAL_MESSAGES.name, "protocol" => PROTOCOL).increment(1);

        let result = match msg.code {
            MSGCODE_CFGBASIC => self.cfg_basic(&msg),
            MSGCODE_CFGNWK => self.cfg_network(&msg),
            MSGCODE_RFINIT => self.rf_init(&msg),
            MSGCODE_RFDEINIT => self.rf_deinit(&msg),
            MSGCODE_RFSTARTRECV => self.start_receive(&msg),
            MSGCODE_RFSEND => self.send(&msg),
            MSGCODE_RFBCAST => self.broadcast(&msg),
            code => {
                warn!("[{}] Unknown operational code {}", msg.seq, code);
                metrics::counter!(metric_defs::SERIAL_UNKNOWN.name, "protocol" => PROTOCOL).increment(1);
                self.respond(msg.seq, Response::Unknown);
                return Outcome::Unknown { seq: msg.seq, code };
            }
        };

        match result {
            Ok(()) => Outcome::Completed {
                seq: msg.seq,
                code: msg.code,
            },
            Err(Failure::Nok(error)) => {
                self.respond_nok(msg.seq, error);
                Outcome::Rejected { seq: msg.seq, error }
            }
            Err(Failure::Relayed(error)) => Outcome::Rejected { seq: msg.seq, error },
        }
    }

    fn read_header(&mut self) -> Result<SerialMessage, ErrorCode> {
        let seq = self.read_u8()?;
        let len = self.read_u8()?;
        let code = self.read_u8()?;
        Ok(SerialMessage {
            seq,
            len,
            code,
            subcode: 0,
        })
    }

    fn read_u8(&mut self) -> Result<u8, ErrorCode> {
        self.transport.read_byte().ok_or(ErrorCode::InsufficientData)
    }

    fn require(&self, count: usize) -> Result<(), ErrorCode> {
        if self.transport.available() < count {
            return Err(ErrorCode::InsufficientData);
        }
        Ok(())
    }

    /// Read a length byte and that many payload bytes.
    fn read_payload(&mut self) -> Result<PayloadBuf, ErrorCode> {
        let len = self.read_u8()? as usize;
        if len > PAYLOAD_MAX {
            return Err(ErrorCode::TooLongData);
        }
        self.require(len)?;
        let mut data = PayloadBuf::new();
        for _ in 0..len {
            data.push(self.read_u8()?);
        }
        Ok(data)
    }

    fn respond(&mut self, seq: u8, response: Response<'_>) {
        write_frame(&mut self.transport, &response.encode(seq));
    }

    fn respond_nok(&mut self, seq: u8, error: ErrorCode) {
        warn!("[{}] NOK: {}", seq, error);
        metrics::counter!(metric_defs::SERIAL_NOK.name, "protocol" => PROTOCOL).increment(1);
        self.respond(seq, Response::Nok(error));
    }

    fn respond_ok(&mut self, seq: u8) -> Result<(), Failure> {
        self.respond(seq, Response::Ok);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Handlers
    // ------------------------------------------------------------------------

    fn cfg_basic(&mut self, msg: &SerialMessage) -> Result<(), Failure> {
        self.require(3)?;
        let basic = BasicConfig {
            nwkcaps: self.read_u8()?,
            delivery: self.read_u8()?,
            retry: self.read_u8()?,
        };
        self.network.set_network_caps(basic.nwkcaps);
        self.network.set_delivery(basic.delivery);
        debug!("Basic config applied: {:?}", basic);
        self.basic = basic;
        self.respond_ok(msg.seq)
    }

    fn cfg_network(&mut self, msg: &SerialMessage) -> Result<(), Failure> {
        self.require(3)?;
        let hi = self.read_u8()?;
        let lo = self.read_u8()?;
        let params = NetworkParams {
            network_id: u16::from_be_bytes([hi, lo]),
            node_id: self.read_u8()?,
        };
        self.network.set_network_id(params.network_id);
        self.network.set_node_id(params.node_id);
        debug!("Network config applied: {:?}", params);
        self.params = params;
        self.respond_ok(msg.seq)
    }

    fn rf_init(&mut self, msg: &SerialMessage) -> Result<(), Failure> {
        if !self.network.begin() {
            return Err(ErrorCode::General.into());
        }
        self.respond_ok(msg.seq)
    }

    fn rf_deinit(&mut self, msg: &SerialMessage) -> Result<(), Failure> {
        if !self.network.end() {
            return Err(ErrorCode::General.into());
        }
        self.respond_ok(msg.seq)
    }

    fn start_receive(&mut self, msg: &SerialMessage) -> Result<(), Failure> {
        self.require(4)?;
        let mut timeout = [0u8; 4];
        for byte in timeout.iter_mut() {
            *byte = self.read_u8()?;
        }
        let timeout_ms = u32::from_be_bytes(timeout);
        debug!("[{}] Receiving for up to {} ms", msg.seq, timeout_ms);

        let mut buf = [0u8; PAYLOAD_MAX];
        let mut bridge = ReceiveBridge::new(
            &mut self.transport,
            &self.clock,
            msg.seq,
            self.config.response_timeout_ms,
        );
        let status = self.network.receive(&mut buf, timeout_ms, &mut bridge);
        bridge.release();
        let relayed = bridge.reply();

        // The host has its answer once a message was relayed.
        if let Some(reply) = relayed {
            match status {
                Ok(ReceiveStatus::Delivered { src, port, len }) => {
                    debug!("[{}] Delivered {} bytes from {} port {}", msg.seq, len, src, port);
                }
                other => warn!("[{}] Receive ended with {:?} after relaying a message", msg.seq, other),
            }
            return reply.map(|_| ()).map_err(Failure::Relayed);
        }

        match status {
            Ok(ReceiveStatus::Delivered { .. }) => {
                error!("[{}] Network delivered a message without relaying it", msg.seq);
                Err(ErrorCode::Recv.into())
            }
            Ok(ReceiveStatus::Internal) | Ok(ReceiveStatus::Ignored) => {
                self.respond(msg.seq, Response::Internal);
                Ok(())
            }
            Err(e) => {
                debug!("[{}] Receive failed: {}", msg.seq, e);
                Err(ErrorCode::Recv.into())
            }
        }
    }

    fn send(&mut self, msg: &SerialMessage) -> Result<(), Failure> {
        self.require(3)?;
        let dst: NodeId = self.read_u8()?;
        let port = self.read_u8()?;
        let request = SendRequest {
            dst,
            port,
            data: self.read_payload()?,
        };

        let mut ack = [0u8; ACK_PAYLOAD_MAX];
        match self
            .network
            .send(request.dst, request.port, request.data.as_slice(), &mut ack)
        {
            Ok(n) => {
                let n = n.min(ACK_PAYLOAD_MAX);
                debug!("[{}] Sent {} bytes to {}, ack {} bytes", msg.seq, request.data.len(), dst, n);
                self.respond(msg.seq, Response::SendAck(&ack[..n]));
                Ok(())
            }
            Err(e) => {
                debug!("[{}] Send to {} failed: {}", msg.seq, dst, e);
                Err(ErrorCode::Send.into())
            }
        }
    }

    fn broadcast(&mut self, msg: &SerialMessage) -> Result<(), Failure> {
        self.require(2)?;
        let port = self.read_u8()?;
        let request = BroadcastRequest {
            port,
            data: self.read_payload()?,
        };
        self.network
            .broadcast(request.port, request.data.as_slice())
            .map_err(|e| {
                debug!("Broadcast on port {} failed: {}", request.port, e);
                ErrorCode::Bcast
            })?;
        self.respond_ok(msg.seq)
    }
}

/// Relays a message received during start-receive to the host and collects
/// the host's acknowledgement payload.
///
/// Borrowed from the protocol for the duration of one
/// [`Network::receive`] call. Once released it refuses to relay.
pub struct ReceiveBridge<'a, T: ?Sized, C: ?Sized> {
    transport: &'a mut T,
    clock: &'a C,
    seq: Option<u8>,
    timeout_ms: u64,
    reply: Option<Result<usize, ErrorCode>>,
}

impl<'a, T, C> ReceiveBridge<'a, T, C>
where
    T: Transport + ?Sized,
    C: Clock + ?Sized,
{
    /// A bridge answering on behalf of request `seq`.
    pub fn new(transport: &'a mut T, clock: &'a C, seq: u8, timeout_ms: u64) -> Self {
        ReceiveBridge {
            transport,
            clock,
            seq: Some(seq),
            timeout_ms,
            reply: None,
        }
    }

    /// A bridge with no request to answer for.
    pub fn inactive(transport: &'a mut T, clock: &'a C, timeout_ms: u64) -> Self {
        ReceiveBridge {
            transport,
            clock,
            seq: None,
            timeout_ms,
            reply: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.seq.is_some()
    }

    /// Drop the request this bridge answers for.
    pub fn release(&mut self) {
        self.seq = None;
    }

    /// What the last relay answered, if one ran.
    pub fn reply(&self) -> Option<Result<usize, ErrorCode>> {
        self.reply
    }

    /// Forward `data` to the host and wait for the acknowledgement.
    ///
    /// Writes the receive notification, then the OK or NOK that closes the
    /// request. Returns the acknowledgement length copied into `ack`.
    pub fn relay(&mut self, src: NodeId, port: u8, data: &[u8], ack: &mut [u8]) -> Result<usize, ErrorCode> {
        let seq = self.seq.ok_or(ErrorCode::IllegalState)?;
        let data = &data[..data.len().min(PAYLOAD_MAX)];
        write_frame(&mut *self.transport, &Response::Received { src, port, data }.encode(seq));

        let start = self.clock.now_ms();
        let result = self.collect_ack(start, ack);
        metrics::histogram!(metric_defs::SERIAL_ACK_WAIT.name).record(self.clock.since(start) as f64);

        let response = match result {
            Ok(_) => Response::Ok,
            Err(error) => {
                warn!("[{}] NOK: {}", seq, error);
                metrics::counter!(metric_defs::SERIAL_NOK.name, "protocol" => PROTOCOL).increment(1);
                Response::Nok(error)
            }
        };
        write_frame(&mut *self.transport, &response.encode(seq));
        self.reply = Some(result);
        result
    }

    fn collect_ack(&mut self, start: u64, ack: &mut [u8]) -> Result<usize, ErrorCode> {
        if !await_bytes(&*self.transport, self.clock, 1, self.timeout_ms) {
            error!("Timed out waiting for receive acknowledgement");
            return Err(ErrorCode::InsufficientData);
        }
        let len = self.transport.read_byte().ok_or(ErrorCode::InsufficientData)? as usize;
        if len > ack.len() {
            return Err(ErrorCode::TooLongData);
        }
        let remaining = self.timeout_ms.saturating_sub(self.clock.since(start));
        if !await_bytes(&*self.transport, self.clock, len, remaining) {
            error!("Timed out waiting for {} acknowledgement bytes", len);
            return Err(ErrorCode::InsufficientData);
        }
        for slot in ack.iter_mut().take(len) {
            *slot = self.transport.read_byte().ok_or(ErrorCode::InsufficientData)?;
        }
        Ok(len)
    }
}

impl<T, C> AckBridge for ReceiveBridge<'_, T, C>
where
    T: Transport + ?Sized,
    C: Clock + ?Sized,
{
    fn return_ack_payload(&mut self, src: NodeId, port: u8, data: &[u8], ack: &mut [u8]) -> usize {
        match self.relay(src, port, data, ack) {
            Ok(n) => n,
            Err(ErrorCode::IllegalState) if !self.is_active() => {
                warn!("Acknowledgement requested from {} with no receive in progress", src);
                0
            }
            Err(_) => 0,
        }
    }
}
