//! Responses written to the host by the operational protocol.

use bytes::{BufMut, BytesMut};

use crate::constants::*;
use crate::ErrorCode;

/// A device → host frame of the operational protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response<'a> {
    /// Request succeeded.
    Ok,
    /// A network-internal message was consumed during receive.
    Internal,
    /// Request code not recognised.
    Unknown,
    /// Request failed.
    Nok(ErrorCode),
    /// Unicast delivered; carries the peer's acknowledgement payload.
    SendAck(&'a [u8]),
    /// An application message arrived during receive.
    Received {
        src: u8,
        port: u8,
        data: &'a [u8],
    },
}

impl Response<'_> {
    /// Response code byte.
    pub fn code(&self) -> u8 {
        match self {
            Response::Ok => MSGCODE_OK,
            Response::Internal => MSGCODE_INTERNAL,
            Response::Unknown => MSGCODE_UNKNOWN,
            Response::Nok(_) => MSGCODE_NOK,
            Response::SendAck(_) => MSGCODE_RFSENDACK,
            Response::Received { .. } => MSGCODE_RFRECV,
        }
    }

    /// Encode as a complete frame echoing `seq`.
    ///
    /// The length byte counts everything after itself. Payloads are expected
    /// to fit [`PAYLOAD_MAX`].
    pub fn encode(&self, seq: u8) -> BytesMut {
        let mut buf = BytesMut::with_capacity(HEADER_LEN + 3 + PAYLOAD_MAX);
        buf.put_u8(seq);
        match self {
            Response::Ok | Response::Internal | Response::Unknown => {
                buf.put_u8(1);
                buf.put_u8(self.code());
            }
            Response::Nok(error) => {
                buf.put_u8(2);
                buf.put_u8(MSGCODE_NOK);
                buf.put_u8(error.code());
            }
            Response::SendAck(ack) => {
                buf.put_u8(2 + ack.len() as u8);
                buf.put_u8(MSGCODE_RFSENDACK);
                buf.put_u8(ack.len() as u8);
                buf.put_slice(ack);
            }
            Response::Received { src, port, data } => {
                buf.put_u8(4 + data.len() as u8);
                buf.put_u8(MSGCODE_RFRECV);
                buf.put_u8(*src);
                buf.put_u8(*port);
                buf.put_u8(data.len() as u8);
                buf.put_slice(data);
            }
        }
        buf
    }
}
