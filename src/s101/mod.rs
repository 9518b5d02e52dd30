//! S101 module - framing for Ember+ messages over a byte stream.
//!
//! This module implements the S101 wire protocol:
//! - Escape-based framing (BOF/EOF markers, 0xFD escape)
//! - CRC-16 integrity checking
//! - Multi-packet reassembly for large ember payloads

mod codec;
mod crc;
mod frame;

pub use codec::{S101Codec, S101Event};
pub use crc::crc16;
pub use frame::{
    encode_ember, encode_keepalive_request, encode_keepalive_response, flags, BOF,
    CMD_EMBER, CMD_KEEPALIVE_REQUEST, CMD_KEEPALIVE_RESPONSE, DTD_GLOW, EOF, ESCAPE,
    ESCAPE_XOR, MAX_FRAME_PAYLOAD, MSG_TYPE_S101, SLOT, VERSION,
};
