//! End-to-end byte exchanges against the zero-configuration protocol.

use std::cell::RefCell;
use std::rc::Rc;

use bytes::Bytes;
use meshwork_common::{
    AckBridge, BufferedTransport, ManualClock, Network, NetworkError, NodeId, ReceiveStatus, Transport,
};
use meshwork_serial::{
    ErrorCode, Outcome, SerialMessage, ERROR_GENERAL, ERROR_ILLEGAL_STATE, ERROR_INSUFFICIENT_DATA, ERROR_TOO_LONG_DATA,
};
use meshwork_zeroconf::*;

#[derive(Debug)]
struct MockNetwork {
    running: bool,
    begin_ok: bool,
    end_ok: bool,
    caps: u8,
    delivery: u8,
    channel: u8,
    network_id: u16,
    node_id: NodeId,
    key: Vec<u8>,
}

impl MockNetwork {
    fn new() -> Self {
        MockNetwork {
            running: true,
            begin_ok: true,
            end_ok: true,
            caps: 0,
            delivery: 0,
            channel: 0,
            network_id: 0,
            node_id: 0,
            key: Vec::new(),
        }
    }
}

impl Network for MockNetwork {
    fn begin(&mut self) -> bool {
        self.running = self.begin_ok;
        self.begin_ok
    }
    fn end(&mut self) -> bool {
        if self.end_ok {
            self.running = false;
        }
        self.end_ok
    }
    fn send(&mut self, _: NodeId, _: u8, _: &[u8], _: &mut [u8]) -> Result<usize, NetworkError> {
        Err(NetworkError::NotStarted)
    }
    fn broadcast(&mut self, _: u8, _: &[u8]) -> Result<(), NetworkError> {
        Err(NetworkError::NotStarted)
    }
    fn receive(&mut self, _: &mut [u8], _: u32, _: &mut dyn AckBridge) -> Result<ReceiveStatus, NetworkError> {
        Err(NetworkError::NotStarted)
    }
    fn network_caps(&self) -> u8 {
        self.caps
    }
    fn set_network_caps(&mut self, caps: u8) {
        self.caps = caps;
    }
    fn delivery(&self) -> u8 {
        self.delivery
    }
    fn set_delivery(&mut self, delivery: u8) {
        self.delivery = delivery;
    }
    fn channel(&self) -> u8 {
        self.channel
    }
    fn set_channel(&mut self, channel: u8) {
        self.channel = channel;
    }
    fn network_id(&self) -> u16 {
        self.network_id
    }
    fn set_network_id(&mut self, id: u16) {
        self.network_id = id;
    }
    fn network_key(&self) -> &[u8] {
        &self.key
    }
    fn set_network_key(&mut self, key: &[u8]) {
        self.key = key.to_vec();
    }
    fn node_id(&self) -> NodeId {
        self.node_id
    }
    fn set_node_id(&mut self, id: NodeId) {
        self.node_id = id;
    }
}

#[derive(Clone, Default)]
struct Recorder(Rc<RefCell<Vec<String>>>);

impl Recorder {
    fn events(&self) -> Vec<String> {
        self.0.borrow().clone()
    }
}

impl ZeroConfListener for Recorder {
    fn devconfig_updated(&mut self, config: &DeviceConfig) {
        self.0
            .borrow_mut()
            .push(format!("device {} {}", config.nwkcaps, config.delivery));
    }
    fn network_updated(&mut self, config: &NetworkConfig) {
        self.0
            .borrow_mut()
            .push(format!("network {} {} {} {}", config.channel, config.network_id, config.node_id, config.key().len()));
    }
    fn serial_updated(&mut self, serial: &SerialNumber) {
        self.0
            .borrow_mut()
            .push(format!("serial {}", String::from_utf8_lossy(serial.as_bytes())));
    }
    fn reporting_updated(&mut self, config: &ReportingConfig) {
        self.0
            .borrow_mut()
            .push(format!("reporting {} {}", config.target, config.flags));
    }
}

type Harness<'a> = ZeroConfSerial<BufferedTransport, MockNetwork, &'a ManualClock>;

fn harness_with(clock: &ManualClock, config: ZeroConfConfig) -> (Harness<'_>, Recorder) {
    let recorder = Recorder::default();
    let zc = ZeroConfSerial::new(BufferedTransport::new(), MockNetwork::new(), clock, config)
        .with_listener(Box::new(recorder.clone()));
    (zc, recorder)
}

fn harness(clock: &ManualClock) -> (Harness<'_>, Recorder) {
    harness_with(clock, ZeroConfConfig::default())
}

fn exchange(zc: &mut Harness<'_>, request: &[u8]) -> (Outcome, Vec<u8>) {
    zc.transport_mut().push_rx(request);
    let outcome = zc.process_one_message();
    (outcome, zc.transport_mut().take_tx())
}

fn enter_init(zc: &mut Harness<'_>) {
    let (outcome, tx) = exchange(zc, &[3, 0, ZC_CODE, ZC_SUBCODE_INIT]);
    assert!(outcome.is_completed());
    assert_eq!(tx, vec![3, 0, ZC_CODE, ZC_SUBCODE_OK]);
}

#[test]
fn test_init_stops_network_and_deinit_restarts_it() {
    let clock = ManualClock::new();
    let (mut zc, _) = harness(&clock);
    enter_init(&mut zc);
    assert!(zc.is_init_mode());
    assert!(!zc.network().running);

    let (_, tx) = exchange(&mut zc, &[3, 1, ZC_CODE, ZC_SUBCODE_DEINIT]);
    assert_eq!(tx, vec![3, 1, ZC_CODE, ZC_SUBCODE_OK]);
    assert!(!zc.is_init_mode());
    assert!(zc.network().running);
}

#[test]
fn test_init_fails_when_network_cannot_stop() {
    let clock = ManualClock::new();
    let (mut zc, _) = harness(&clock);
    zc.network_mut().end_ok = false;
    let (outcome, tx) = exchange(&mut zc, &[3, 4, ZC_CODE, ZC_SUBCODE_INIT]);
    assert_eq!(
        outcome,
        Outcome::Rejected {
            seq: 4,
            error: ErrorCode::IllegalState
        }
    );
    assert_eq!(tx, vec![4, 4, ZC_CODE, ZC_SUBCODE_NOK, ERROR_ILLEGAL_STATE]);
    assert!(!zc.is_init_mode());
}

#[test]
fn test_deinit_leaves_provisioning_even_on_failure() {
    let clock = ManualClock::new();
    let (mut zc, _) = harness(&clock);
    enter_init(&mut zc);
    zc.network_mut().begin_ok = false;
    let (_, tx) = exchange(&mut zc, &[3, 5, ZC_CODE, ZC_SUBCODE_DEINIT]);
    assert_eq!(tx, vec![4, 5, ZC_CODE, ZC_SUBCODE_NOK, ERROR_ILLEGAL_STATE]);
    assert!(!zc.is_init_mode());
}

#[test]
fn test_configure_outside_provisioning_is_rejected_without_mutation() {
    let clock = ManualClock::new();
    let (mut zc, recorder) = harness(&clock);
    let (outcome, tx) = exchange(&mut zc, &[5, 9, ZC_CODE, ZC_SUBCODE_DEVCFG, 7, 8]);
    assert_eq!(
        outcome,
        Outcome::Rejected {
            seq: 9,
            error: ErrorCode::IllegalState
        }
    );
    assert_eq!(tx, vec![4, 9, ZC_CODE, ZC_SUBCODE_NOK, ERROR_ILLEGAL_STATE]);
    assert_eq!(zc.network().caps, 0);
    assert_eq!(*zc.device_config(), DeviceConfig::default());
    assert!(recorder.events().is_empty());
    assert_eq!(zc.transport().available(), 0);
}

#[test]
fn test_partial_payload_times_out_and_realigns() {
    let clock = ManualClock::new();
    let (mut zc, recorder) = harness(&clock);
    enter_init(&mut zc);

    // Declares seven payload bytes, delivers two.
    let (outcome, tx) = exchange(&mut zc, &[10, 5, ZC_CODE, ZC_SUBCODE_DEVCFG, 1, 2]);
    assert_eq!(
        outcome,
        Outcome::Rejected {
            seq: 5,
            error: ErrorCode::InsufficientData
        }
    );
    assert_eq!(tx, vec![4, 5, ZC_CODE, ZC_SUBCODE_NOK, ERROR_INSUFFICIENT_DATA]);
    assert_eq!(zc.transport().available(), 0);
    assert!(recorder.events().is_empty());
    // One bounded wait, not a second one while discarding.
    assert!(clock.total_slept() < 2 * zc.config().timeout_ms);

    zc.network_mut().caps = 0x0C;
    zc.network_mut().delivery = 0x01;
    let (outcome, tx) = exchange(&mut zc, &[3, 6, ZC_CODE, ZC_SUBCODE_DEVREQ]);
    assert!(outcome.is_completed());
    assert_eq!(tx, vec![5, 6, ZC_CODE, ZC_SUBCODE_DEVRES, 0x0C, 0x01]);
}

#[test]
fn test_truncated_header_times_out_once() {
    let clock = ManualClock::new();
    let (mut zc, _) = harness(&clock);

    // Length byte plus two of the three header bytes.
    let (outcome, tx) = exchange(&mut zc, &[10, 5, ZC_CODE]);
    assert_eq!(
        outcome,
        Outcome::Rejected {
            seq: 0,
            error: ErrorCode::General
        }
    );
    assert_eq!(tx, vec![4, 0, ZC_CODE, ZC_SUBCODE_NOK, ERROR_GENERAL]);
    assert_eq!(zc.transport().available(), 0);
    assert!(clock.total_slept() < 2 * zc.config().timeout_ms);
}

#[test]
fn test_unknown_subcode_echoes_seq() {
    let clock = ManualClock::new();
    let (mut zc, _) = harness(&clock);
    let (outcome, tx) = exchange(&mut zc, &[4, 0x77, ZC_CODE, 99, 0xFF]);
    assert_eq!(outcome, Outcome::Unknown { seq: 0x77, code: 99 });
    assert_eq!(tx, vec![3, 0x77, ZC_CODE, ZC_SUBCODE_UNKNOWN]);
    assert_eq!(zc.transport().available(), 0);
}

#[test]
fn test_device_configure() {
    let clock = ManualClock::new();
    let (mut zc, recorder) = harness(&clock);
    enter_init(&mut zc);
    let (_, tx) = exchange(&mut zc, &[5, 2, ZC_CODE, ZC_SUBCODE_DEVCFG, 0x21, 0x03]);
    assert_eq!(tx, vec![3, 2, ZC_CODE, ZC_SUBCODE_OK]);
    assert_eq!(zc.network().caps, 0x21);
    assert_eq!(zc.network().delivery, 0x03);
    assert_eq!(recorder.events(), vec!["device 33 3".to_string()]);
}

#[test]
fn test_device_configure_without_payload() {
    let clock = ManualClock::new();
    let (mut zc, recorder) = harness(&clock);
    enter_init(&mut zc);
    let (_, tx) = exchange(&mut zc, &[4, 2, ZC_CODE, ZC_SUBCODE_DEVCFG, 0x21]);
    assert_eq!(tx, vec![4, 2, ZC_CODE, ZC_SUBCODE_NOK, ERROR_INSUFFICIENT_DATA]);
    assert!(recorder.events().is_empty());
    assert_eq!(zc.transport().available(), 0);
}

fn network_configure_request(seq: u8, key: &[u8]) -> Vec<u8> {
    let mut request = vec![(8 + key.len()) as u8, seq, ZC_CODE, ZC_SUBCODE_NWKCFG, 15, 0x12, 0x34, 9];
    request.push(key.len() as u8);
    request.extend_from_slice(key);
    request
}

#[test]
fn test_network_configure_and_withheld_key() {
    let clock = ManualClock::new();
    let (mut zc, recorder) = harness(&clock);
    enter_init(&mut zc);

    let (_, tx) = exchange(&mut zc, &network_configure_request(3, b"topsecret"));
    assert_eq!(tx, vec![3, 3, ZC_CODE, ZC_SUBCODE_OK]);
    assert_eq!(zc.network().channel, 15);
    assert_eq!(zc.network().network_id, 0x1234);
    assert_eq!(zc.network().node_id, 9);
    assert_eq!(zc.network().network_key(), b"topsecret");
    assert_eq!(zc.network_config().key(), b"topsecret");
    assert_eq!(recorder.events(), vec!["network 15 4660 9 9".to_string()]);

    let (_, tx) = exchange(&mut zc, &[3, 4, ZC_CODE, ZC_SUBCODE_NWKREQ]);
    assert_eq!(tx, vec![8, 4, ZC_CODE, ZC_SUBCODE_NWKRES, 15, 0x12, 0x34, 9, 0]);
}

#[test]
fn test_network_request_reports_key_when_allowed() {
    let clock = ManualClock::new();
    let config = ZeroConfConfig {
        withhold_network_key: false,
        ..ZeroConfConfig::default()
    };
    let (mut zc, _) = harness_with(&clock, config);
    enter_init(&mut zc);
    exchange(&mut zc, &network_configure_request(3, b"ab"));

    let (_, tx) = exchange(&mut zc, &[3, 4, ZC_CODE, ZC_SUBCODE_NWKREQ]);
    assert_eq!(
        tx,
        vec![10, 4, ZC_CODE, ZC_SUBCODE_NWKRES, 15, 0x12, 0x34, 9, 2, b'a', b'b']
    );
}

#[test]
fn test_network_key_too_long() {
    let clock = ManualClock::new();
    let (mut zc, recorder) = harness(&clock);
    enter_init(&mut zc);

    let key = [0x5A; MAX_NETWORK_KEY_LEN + 1];
    let (outcome, tx) = exchange(&mut zc, &network_configure_request(7, &key));
    assert_eq!(
        outcome,
        Outcome::Rejected {
            seq: 7,
            error: ErrorCode::KeyTooLong
        }
    );
    assert_eq!(tx, vec![4, 7, ZC_CODE, ZC_SUBCODE_NOK, meshwork_serial::ERROR_KEY_TOO_LONG]);
    assert_eq!(zc.network().channel, 0);
    assert_eq!(*zc.network_config(), NetworkConfig::default());
    assert!(recorder.events().is_empty());
    assert_eq!(zc.transport().available(), 0);
}

#[test]
fn test_serial_number_set_once() {
    let clock = ManualClock::new();
    let (mut zc, recorder) = harness(&clock);
    enter_init(&mut zc);

    let (_, tx) = exchange(&mut zc, &[7, 1, ZC_CODE, ZC_SUBCODE_SERIALCFG, 3, b'A', b'B', b'C']);
    assert_eq!(tx, vec![3, 1, ZC_CODE, ZC_SUBCODE_OK]);
    assert_eq!(zc.serial_number().as_bytes(), b"ABC");

    let (_, tx) = exchange(&mut zc, &[7, 2, ZC_CODE, ZC_SUBCODE_SERIALCFG, 3, b'X', b'Y', b'Z']);
    assert_eq!(tx, vec![4, 2, ZC_CODE, ZC_SUBCODE_NOK, ERROR_ILLEGAL_STATE]);
    assert_eq!(zc.serial_number().as_bytes(), b"ABC");
    assert_eq!(zc.transport().available(), 0);

    let (_, tx) = exchange(&mut zc, &[3, 3, ZC_CODE, ZC_SUBCODE_SERIALREQ]);
    assert_eq!(tx, vec![7, 3, ZC_CODE, ZC_SUBCODE_SERIALRES, 3, b'A', b'B', b'C']);
    assert_eq!(recorder.events(), vec!["serial ABC".to_string()]);
}

#[test]
fn test_serial_number_change_allowed() {
    let clock = ManualClock::new();
    let config = ZeroConfConfig {
        allow_serial_change: true,
        ..ZeroConfConfig::default()
    };
    let (mut zc, _) = harness_with(&clock, config);
    enter_init(&mut zc);
    exchange(&mut zc, &[5, 1, ZC_CODE, ZC_SUBCODE_SERIALCFG, 1, b'A']);
    let (_, tx) = exchange(&mut zc, &[5, 2, ZC_CODE, ZC_SUBCODE_SERIALCFG, 1, b'B']);
    assert_eq!(tx, vec![3, 2, ZC_CODE, ZC_SUBCODE_OK]);
    assert_eq!(zc.serial_number().as_bytes(), b"B");
}

#[test]
fn test_serial_number_too_long() {
    let clock = ManualClock::new();
    let (mut zc, _) = harness(&clock);
    enter_init(&mut zc);

    let mut request = vec![(4 + MAX_SERIAL_LEN + 1) as u8, 8, ZC_CODE, ZC_SUBCODE_SERIALCFG];
    request.push((MAX_SERIAL_LEN + 1) as u8);
    request.extend(std::iter::repeat(b'9').take(MAX_SERIAL_LEN + 1));
    let (_, tx) = exchange(&mut zc, &request);
    assert_eq!(tx, vec![4, 8, ZC_CODE, ZC_SUBCODE_NOK, meshwork_serial::ERROR_SERIAL_TOO_LONG]);
    assert!(zc.serial_number().is_empty());
    assert_eq!(zc.transport().available(), 0);
}

#[test]
fn test_reporting_roundtrip() {
    let clock = ManualClock::new();
    let (mut zc, recorder) = harness(&clock);
    enter_init(&mut zc);

    let (_, tx) = exchange(&mut zc, &[5, 1, ZC_CODE, ZC_SUBCODE_REPCFG, 1, 0x81]);
    assert_eq!(tx, vec![3, 1, ZC_CODE, ZC_SUBCODE_OK]);
    let (_, tx) = exchange(&mut zc, &[3, 2, ZC_CODE, ZC_SUBCODE_REPREQ]);
    assert_eq!(tx, vec![5, 2, ZC_CODE, ZC_SUBCODE_REPRES, 1, 0x81]);
    assert_eq!(recorder.events(), vec!["reporting 1 129".to_string()]);
}

#[test]
fn test_loaded_records_are_reported() {
    let clock = ManualClock::new();
    let (mut zc, _) = harness(&clock);
    let mut nwk = NetworkConfig::default();
    nwk.channel = 3;
    zc.load(
        DeviceConfig::default(),
        nwk,
        SerialNumber::new(b"S").unwrap(),
        ReportingConfig { target: 2, flags: 1 },
    );
    enter_init(&mut zc);
    let (_, tx) = exchange(&mut zc, &[3, 1, ZC_CODE, ZC_SUBCODE_SERIALREQ]);
    assert_eq!(tx, vec![5, 1, ZC_CODE, ZC_SUBCODE_SERIALRES, 1, b'S']);
}

/// Echoes its payload back under sub-code 41; rejects sub-code 42; answers
/// sub-code 44 with more data than a frame holds.
struct Echo;

impl ZeroConfExtension for Echo {
    fn process_message(&mut self, msg: &SerialMessage, payload: &mut PayloadReader<'_>) -> Option<ExtensionReply> {
        match msg.subcode {
            40 => {
                let mut data = vec![0u8; payload.remaining()];
                if let Err(error) = payload.read_exact(&mut data) {
                    return Some(ExtensionReply::Nok(error));
                }
                Some(ExtensionReply::Code {
                    subcode: 41,
                    data: Bytes::from(data),
                })
            }
            42 => Some(ExtensionReply::Nok(ErrorCode::General)),
            44 => Some(ExtensionReply::Code {
                subcode: 45,
                data: Bytes::from(vec![0x5A; 300]),
            }),
            _ => None,
        }
    }
}

#[test]
fn test_extension_claims_unknown_subcodes() {
    let clock = ManualClock::new();
    let (zc, _) = harness(&clock);
    let mut zc = zc.with_extension(Box::new(Echo));

    let (outcome, tx) = exchange(&mut zc, &[5, 1, ZC_CODE, 40, 0xAB, 0xCD]);
    assert_eq!(outcome, Outcome::Completed { seq: 1, code: 40 });
    assert_eq!(tx, vec![5, 1, ZC_CODE, 41, 0xAB, 0xCD]);

    let (outcome, tx) = exchange(&mut zc, &[4, 2, ZC_CODE, 42, 0xEE]);
    assert_eq!(
        outcome,
        Outcome::Rejected {
            seq: 2,
            error: ErrorCode::General
        }
    );
    assert_eq!(tx, vec![4, 2, ZC_CODE, ZC_SUBCODE_NOK, 0]);
    assert_eq!(zc.transport().available(), 0);

    let (outcome, _) = exchange(&mut zc, &[3, 3, ZC_CODE, 43]);
    assert_eq!(outcome, Outcome::Unknown { seq: 3, code: 43 });
}

#[test]
fn test_oversized_extension_reply_rejected() {
    let clock = ManualClock::new();
    let (zc, _) = harness(&clock);
    let mut zc = zc.with_extension(Box::new(Echo));

    let (outcome, tx) = exchange(&mut zc, &[3, 7, ZC_CODE, 44]);
    assert_eq!(
        outcome,
        Outcome::Rejected {
            seq: 7,
            error: ErrorCode::TooLongData
        }
    );
    assert_eq!(tx, vec![4, 7, ZC_CODE, ZC_SUBCODE_NOK, ERROR_TOO_LONG_DATA]);

    // The largest reply that fits still goes out whole.
    let mut request = vec![255, 8, ZC_CODE, 40];
    request.extend(std::iter::repeat(0x11).take(MAX_CUSTOM_DATA_LEN));
    let (outcome, tx) = exchange(&mut zc, &request);
    assert_eq!(outcome, Outcome::Completed { seq: 8, code: 40 });
    assert_eq!(tx[..4], [255, 8, ZC_CODE, 41]);
    assert_eq!(tx.len(), 256);
}
