//! Device → host frames of the zero-configuration protocol.
//!
//! Every frame starts with a length byte counting the bytes that follow it.

use bytes::{BufMut, BytesMut};
use meshwork_common::NodeId;
use meshwork_serial::ErrorCode;

use crate::constants::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZcResponse<'a> {
    /// `[3][seq][ZC][subcode]`
    Code(u8),
    /// `[4][seq][ZC][NOK][error]`
    Nok(ErrorCode),
    /// `[5][seq][ZC][DEVRES][caps][delivery]`
    Device { nwkcaps: u8, delivery: u8 },
    /// `[8+k][seq][ZC][NWKRES][channel][id_hi][id_lo][node][k][key ...]`
    Network {
        channel: u8,
        network_id: u16,
        node_id: NodeId,
        key: &'a [u8],
    },
    /// `[5][seq][ZC][REPRES][target][flags]`
    Reporting { target: NodeId, flags: u8 },
    /// `[4+n][seq][ZC][SERIALRES][n][serial ...]`
    Serial(&'a [u8]),
    /// `[3+n][seq][ZC][subcode][data ...]`
    Custom { subcode: u8, data: &'a [u8] },
}

impl ZcResponse<'_> {
    pub fn subcode(&self) -> u8 {
        match self {
            ZcResponse::Code(subcode) | ZcResponse::Custom { subcode, .. } => *subcode,
            ZcResponse::Nok(_) => ZC_SUBCODE_NOK,
            ZcResponse::Device { .. } => ZC_SUBCODE_DEVRES,
            ZcResponse::Network { .. } => ZC_SUBCODE_NWKRES,
            ZcResponse::Reporting { .. } => ZC_SUBCODE_REPRES,
            ZcResponse::Serial(_) => ZC_SUBCODE_SERIALRES,
        }
    }

    pub fn encode(&self, seq: u8) -> BytesMut {
        let mut body = BytesMut::with_capacity(32);
        body.put_u8(seq);
        body.put_u8(ZC_CODE);
        body.put_u8(self.subcode());
        match self {
            ZcResponse::Code(_) => {}
            ZcResponse::Nok(error) => body.put_u8(error.code()),
            ZcResponse::Device { nwkcaps, delivery } => {
                body.put_u8(*nwkcaps);
                body.put_u8(*delivery);
            }
            ZcResponse::Network {
                channel,
                network_id,
                node_id,
                key,
            } => {
                body.put_u8(*channel);
                body.put_u16(*network_id);
                body.put_u8(*node_id);
                body.put_u8(key.len() as u8);
                body.put_slice(key);
            }
            ZcResponse::Reporting { target, flags } => {
                body.put_u8(*target);
                body.put_u8(*flags);
            }
            ZcResponse::Serial(serial) => {
                body.put_u8(serial.len() as u8);
                body.put_slice(serial);
            }
            ZcResponse::Custom { data, .. } => body.put_slice(data),
        }

        let mut frame = BytesMut::with_capacity(body.len() + 1);
        frame.put_u8(body.len() as u8);
        frame.put(body);
        frame
    }
}
