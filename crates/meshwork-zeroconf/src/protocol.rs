//! Zero-configuration protocol handler.

use bytes::BytesMut;
use log::{debug, error, info, warn};
use meshwork_common::{Clock, Network, Transport};
use meshwork_metrics::{metric_defs, metrics};
use meshwork_serial::{await_bytes, write_frame, ErrorCode, Outcome, SerialMessage};

use crate::constants::*;
use crate::{
    DeviceConfig, ExtensionReply, NetworkConfig, PayloadReader, ReportingConfig, SerialNumber, ZcResponse,
    ZeroConfConfig, ZeroConfExtension, ZeroConfListener,
};

const PROTOCOL: &str = "zeroconf";

/// Zero-configuration protocol handler.
///
/// Reads one length-prefixed request per [`ZeroConfSerial::process_one_message`]
/// call. Whatever a handler leaves unread of the declared payload is discarded
/// before the response goes out, so a malformed request never shifts the
/// framing of the next one.
///
/// Only init and deinit are accepted outside provisioning mode.
pub struct ZeroConfSerial<T, N, C> {
    transport: T,
    network: N,
    clock: C,
    config: ZeroConfConfig,
    /// Declared bytes of the current message not yet consumed.
    remaining: usize,
    init_mode: bool,
    device: DeviceConfig,
    nwk: NetworkConfig,
    serial: SerialNumber,
    reporting: ReportingConfig,
    listener: Option<Box<dyn ZeroConfListener>>,
    extension: Option<Box<dyn ZeroConfExtension>>,
}

impl<T, N, C> ZeroConfSerial<T, N, C>
where
    T: Transport,
    N: Network,
    C: Clock,
{
    pub fn new(transport: T, network: N, clock: C, config: ZeroConfConfig) -> Self {
        ZeroConfSerial {
            transport,
            network,
            clock,
            config,
            remaining: 0,
            init_mode: false,
            device: DeviceConfig::default(),
            nwk: NetworkConfig::default(),
            serial: SerialNumber::default(),
            reporting: ReportingConfig::default(),
            listener: None,
            extension: None,
        }
    }

    pub fn with_listener(mut self, listener: Box<dyn ZeroConfListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn with_extension(mut self, extension: Box<dyn ZeroConfExtension>) -> Self {
        self.extension = Some(extension);
        self
    }

    pub fn set_listener(&mut self, listener: Option<Box<dyn ZeroConfListener>>) {
        self.listener = listener;
    }

    pub fn set_extension(&mut self, extension: Option<Box<dyn ZeroConfExtension>>) {
        self.extension = extension;
    }

    pub fn config(&self) -> &ZeroConfConfig {
        &self.config
    }

    /// Whether provisioning mode is active.
    pub fn is_init_mode(&self) -> bool {
        self.init_mode
    }

    pub fn device_config(&self) -> &DeviceConfig {
        &self.device
    }

    pub fn network_config(&self) -> &NetworkConfig {
        &self.nwk
    }

    pub fn serial_number(&self) -> &SerialNumber {
        &self.serial
    }

    pub fn reporting_config(&self) -> &ReportingConfig {
        &self.reporting
    }

    /// Seed the stored records, e.g. from persistent storage at boot.
    pub fn load(
        &mut self,
        device: DeviceConfig,
        nwk: NetworkConfig,
        serial: SerialNumber,
        reporting: ReportingConfig,
    ) {
        self.device = device;
        self.nwk = nwk;
        self.serial = serial;
        self.reporting = reporting;
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

    /// Read and handle one request.
    pub fn process_one_message(&mut self) -> Outcome {
        if self.transport.available() < MIN_MESSAGE_LEN {
            return Outcome::Idle;
        }
        let len = match self.transport.read_byte() {
            Some(len) => len,
            None => return Outcome::Idle,
        };
        self.remaining = len as usize;

        if self.remaining < MIN_MESSAGE_LEN {
            error!("Invalid message: len={}", len);
            return self.reject(0, ErrorCode::General);
        }
        if !self.wait_for(MIN_MESSAGE_LEN) {
            error!("Timed out waiting for header: len={}", len);
            self.drop_available();
            return self.reject(0, ErrorCode::General);
        }

        let header = {
            let mut payload = self.payload();
            (payload.read_u8(), payload.read_u8(), payload.read_u8())
        };
        let msg = match header {
            (Ok(seq), Ok(code), Ok(subcode)) => SerialMessage { seq, len, code, subcode },
            _ => return self.reject(0, ErrorCode::General),
        };

        info!("[{}] Zero-config request len {} code {} subcode {}", msg.seq, len, msg.code, msg.subcode);
        metrics::counter!(metric_defs::SERIAL_MESSAGES.name, "protocol" => PROTOCOL).increment(1);

        if !self.wait_for(self.remaining) {
            error!("[{}] Timed out waiting for {} payload bytes", msg.seq, self.remaining);
            self.drop_available();
            return self.reject(msg.seq, ErrorCode::InsufficientData);
        }

        let result = match msg.subcode {
            ZC_SUBCODE_INIT => self.init(&msg),
            ZC_SUBCODE_DEINIT => self.deinit(&msg),
            ZC_SUBCODE_DEVREQ => self.device_request(&msg),
            ZC_SUBCODE_DEVCFG => self.device_configure(&msg),
            ZC_SUBCODE_NWKREQ => self.network_request(&msg),
            ZC_SUBCODE_NWKCFG => self.network_configure(&msg),
            ZC_SUBCODE_REPREQ => self.reporting_request(&msg),
            ZC_SUBCODE_REPCFG => self.reporting_configure(&msg),
            ZC_SUBCODE_SERIALREQ => self.serial_request(&msg),
            ZC_SUBCODE_SERIALCFG => self.serial_configure(&msg),
            _ => match self.extend(&msg) {
                Some(result) => result,
                None => {
                    warn!("[{}] Unknown zero-config subcode {}", msg.seq, msg.subcode);
                    metrics::counter!(metric_defs::SERIAL_UNKNOWN.name, "protocol" => PROTOCOL).increment(1);
                    self.respond(&ZcResponse::Code(ZC_SUBCODE_UNKNOWN).encode(msg.seq));
                    return Outcome::Unknown {
                        seq: msg.seq,
                        code: msg.subcode,
                    };
                }
            },
        };

        match result {
            Ok(frame) => {
                self.respond(&frame);
                Outcome::Completed {
                    seq: msg.seq,
                    code: msg.subcode,
                }
            }
            Err(error) => self.reject(msg.seq, error),
        }
    }

    // ------------------------------------------------------------------------
    // Stream handling
    // ------------------------------------------------------------------------

    fn payload(&mut self) -> PayloadReader<'_> {
        PayloadReader::new(&mut self.transport, &mut self.remaining)
    }

    fn wait_for(&self, count: usize) -> bool {
        await_bytes(&self.transport, &self.clock, count, self.config.timeout_ms)
    }

    /// Drop the unread part of the declared payload.
    ///
    /// If the bytes never arrive, whatever did arrive is dropped so the next
    /// read starts past this message.
    fn discard_remaining(&mut self) {
        if self.remaining == 0 {
            return;
        }
        warn!("Discarding {} unread message bytes", self.remaining);
        if !self.wait_for(self.remaining) {
            error!(
                "Timed out waiting for {} bytes to discard, {} available",
                self.remaining,
                self.transport.available()
            );
        }
        self.drop_available();
    }

    /// Drop what has arrived of the declared payload without waiting for more.
    fn drop_available(&mut self) {
        let count = self.remaining.min(self.transport.available());
        for _ in 0..count {
            if self.transport.read_byte().is_none() {
                break;
            }
        }
        metrics::counter!(metric_defs::SERIAL_DISCARDED_BYTES.name).increment(count as u64);
        self.remaining = 0;
    }

    fn respond(&mut self, frame: &[u8]) {
        self.discard_remaining();
        write_frame(&mut self.transport, frame);
    }

    fn reject(&mut self, seq: u8, error: ErrorCode) -> Outcome {
        warn!("[{}] NOK: {}", seq, error);
        metrics::counter!(metric_defs::SERIAL_NOK.name, "protocol" => PROTOCOL).increment(1);
        self.respond(&ZcResponse::Nok(error).encode(seq));
        Outcome::Rejected { seq, error }
    }

    fn require_init_mode(&self) -> Result<(), ErrorCode> {
        if !self.init_mode {
            error!("Not in provisioning mode");
            return Err(ErrorCode::IllegalState);
        }
        Ok(())
    }

    fn record_update(aspect: &'static str) {
        metrics::counter!(metric_defs::ZEROCONF_CONFIG_UPDATES.name, "aspect" => aspect).increment(1);
    }

    // ------------------------------------------------------------------------
    // Handlers
    // ------------------------------------------------------------------------

    fn init(&mut self, msg: &SerialMessage) -> Result<BytesMut, ErrorCode> {
        if !self.network.end() {
            return Err(ErrorCode::IllegalState);
        }
        self.init_mode = true;
        info!("[{}] Entered provisioning mode", msg.seq);
        Ok(ZcResponse::Code(ZC_SUBCODE_OK).encode(msg.seq))
    }

    fn deinit(&mut self, msg: &SerialMessage) -> Result<BytesMut, ErrorCode> {
        self.init_mode = false;
        info!("[{}] Left provisioning mode", msg.seq);
        if !self.network.begin() {
            return Err(ErrorCode::IllegalState);
        }
        Ok(ZcResponse::Code(ZC_SUBCODE_OK).encode(msg.seq))
    }

    fn device_request(&mut self, msg: &SerialMessage) -> Result<BytesMut, ErrorCode> {
        self.require_init_mode()?;
        let response = ZcResponse::Device {
            nwkcaps: self.network.network_caps(),
            delivery: self.network.delivery(),
        };
        debug!("[{}] Reporting {:?}", msg.seq, response);
        Ok(response.encode(msg.seq))
    }

    fn device_configure(&mut self, msg: &SerialMessage) -> Result<BytesMut, ErrorCode> {
        self.require_init_mode()?;
        let device = {
            let mut payload = self.payload();
            DeviceConfig {
                nwkcaps: payload.read_u8()?,
                delivery: payload.read_u8()?,
            }
        };
        self.network.set_network_caps(device.nwkcaps);
        self.network.set_delivery(device.delivery);
        self.device = device;
        info!("[{}] Device config updated: {:?}", msg.seq, device);

        if let Some(listener) = self.listener.as_mut() {
            listener.devconfig_updated(&self.device);
        }
        Self::record_update("device");
        Ok(ZcResponse::Code(ZC_SUBCODE_OK).encode(msg.seq))
    }

    fn network_request(&mut self, msg: &SerialMessage) -> Result<BytesMut, ErrorCode> {
        self.require_init_mode()?;
        let key: &[u8] = if self.config.withhold_network_key {
            &[]
        } else {
            self.nwk.key()
        };
        debug!("[{}] Reporting {:?}, key withheld: {}", msg.seq, self.nwk, self.config.withhold_network_key);
        Ok(ZcResponse::Network {
            channel: self.nwk.channel,
            network_id: self.nwk.network_id,
            node_id: self.nwk.node_id,
            key,
        }
        .encode(msg.seq))
    }

    fn network_configure(&mut self, msg: &SerialMessage) -> Result<BytesMut, ErrorCode> {
        self.require_init_mode()?;
        let mut nwk = self.nwk;
        {
            let mut payload = self.payload();
            if payload.remaining() < 5 {
                return Err(ErrorCode::InsufficientData);
            }
            nwk.channel = payload.read_u8()?;
            nwk.network_id = payload.read_u16()?;
            nwk.node_id = payload.read_u8()?;
            let key_len = payload.read_u8()? as usize;
            if key_len > MAX_NETWORK_KEY_LEN {
                return Err(ErrorCode::KeyTooLong);
            }
            let mut key = [0u8; MAX_NETWORK_KEY_LEN];
            payload.read_exact(&mut key[..key_len])?;
            nwk.set_key(&key[..key_len])?;
        }

        self.network.set_channel(nwk.channel);
        self.network.set_network_id(nwk.network_id);
        self.network.set_node_id(nwk.node_id);
        self.network.set_network_key(nwk.key());
        self.nwk = nwk;
        info!("[{}] Network config updated: {:?}", msg.seq, nwk);

        if let Some(listener) = self.listener.as_mut() {
            listener.network_updated(&self.nwk);
        }
        Self::record_update("network");
        Ok(ZcResponse::Code(ZC_SUBCODE_OK).encode(msg.seq))
    }

    fn reporting_request(&mut self, msg: &SerialMessage) -> Result<BytesMut, ErrorCode> {
        self.require_init_mode()?;
        debug!("[{}] Reporting {:?}", msg.seq, self.reporting);
        Ok(ZcResponse::Reporting {
            target: self.reporting.target,
            flags: self.reporting.flags,
        }
        .encode(msg.seq))
    }

    fn reporting_configure(&mut self, msg: &SerialMessage) -> Result<BytesMut, ErrorCode> {
        self.require_init_mode()?;
        let reporting = {
            let mut payload = self.payload();
            if payload.remaining() < 2 {
                return Err(ErrorCode::InsufficientData);
            }
            ReportingConfig {
                target: payload.read_u8()?,
                flags: payload.read_u8()?,
            }
        };
        self.reporting = reporting;
        info!("[{}] Reporting config updated: {:?}", msg.seq, reporting);

        if let Some(listener) = self.listener.as_mut() {
            listener.reporting_updated(&self.reporting);
        }
        Self::record_update("reporting");
        Ok(ZcResponse::Code(ZC_SUBCODE_OK).encode(msg.seq))
    }

    fn serial_request(&mut self, msg: &SerialMessage) -> Result<BytesMut, ErrorCode> {
        self.require_init_mode()?;
        debug!("[{}] Reporting {:?}", msg.seq, self.serial);
        Ok(ZcResponse::Serial(self.serial.as_bytes()).encode(msg.seq))
    }

    fn serial_configure(&mut self, msg: &SerialMessage) -> Result<BytesMut, ErrorCode> {
        self.require_init_mode()?;
        if !self.config.allow_serial_change && !self.serial.is_empty() {
            error!("[{}] Serial number already set and changes are disabled", msg.seq);
            return Err(ErrorCode::IllegalState);
        }
        let serial = {
            let mut payload = self.payload();
            let len = payload.read_u8()? as usize;
            if len > MAX_SERIAL_LEN {
                return Err(ErrorCode::SerialTooLong);
            }
            let mut buf = [0u8; MAX_SERIAL_LEN];
            payload.read_exact(&mut buf[..len])?;
            SerialNumber::new(&buf[..len])?
        };
        self.serial = serial;
        info!("[{}] Serial number updated: {:?}", msg.seq, serial);

        if let Some(listener) = self.listener.as_mut() {
            listener.serial_updated(&self.serial);
        }
        Self::record_update("serial");
        Ok(ZcResponse::Code(ZC_SUBCODE_OK).encode(msg.seq))
    }

    /// Offer an unknown sub-code to the extension.
    fn extend(&mut self, msg: &SerialMessage) -> Option<Result<BytesMut, ErrorCode>> {
        let extension = self.extension.as_deref_mut()?;
        let mut payload = PayloadReader::new(&mut self.transport, &mut self.remaining);
        let reply = extension.process_message(msg, &mut payload)?;
        debug!("[{}] Extension claimed subcode {}", msg.seq, msg.subcode);
        Some(match reply {
            ExtensionReply::Code { data, .. } if data.len() > MAX_CUSTOM_DATA_LEN => {
                error!("[{}] Extension reply of {} bytes does not fit a frame", msg.seq, data.len());
                Err(ErrorCode::TooLongData)
            }
            ExtensionReply::Code { subcode, data } => Ok(ZcResponse::Custom { subcode, data: &data[..] }.encode(msg.seq)),
            ExtensionReply::Nok(error) => Err(error),
        })
    }
}
