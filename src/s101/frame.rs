//! S101 frame layout and encoders.
//!
//! An S101 frame on the wire:
//!
//! ```text
//! ┌─────┬──────────────────────────────────────────────┬─────────┬─────┐
//! │ BOF │ slot, msg-type, command, version, [payload]  │ CRC-16  │ EOF │
//! │ 0xFE│              (escaped)                       │ LE, esc │ 0xFF│
//! └─────┴──────────────────────────────────────────────┴─────────┴─────┘
//! ```
//!
//! Ember-payload frames extend the header with flags, a DTD byte and
//! application bytes before the BER payload. The bytes 0xFD, 0xFE and 0xFF
//! never appear raw between BOF and EOF: each is transmitted as 0xFD
//! followed by the byte XOR 0x20.

use bytes::Bytes;

use super::crc::crc16;

/// Start-of-frame marker.
pub const BOF: u8 = 0xFE;

/// End-of-frame marker.
pub const EOF: u8 = 0xFF;

/// Escape byte.
pub const ESCAPE: u8 = 0xFD;

/// XOR applied to an escaped byte.
pub const ESCAPE_XOR: u8 = 0x20;

/// Slot byte (single-provider transport).
pub const SLOT: u8 = 0x00;

/// Message type identifying S101.
pub const MSG_TYPE_S101: u8 = 0x0E;

/// Command: ember payload (possibly fragmented).
pub const CMD_EMBER: u8 = 0x01;

/// Command: keepalive request.
pub const CMD_KEEPALIVE_REQUEST: u8 = 0x02;

/// Command: keepalive response.
pub const CMD_KEEPALIVE_RESPONSE: u8 = 0x03;

/// Protocol version byte.
pub const VERSION: u8 = 0x01;

/// DTD byte for Glow payloads.
pub const DTD_GLOW: u8 = 0x01;

/// Application bytes carried by ember frames (Glow DTD version, minor/major).
pub const APP_BYTES: [u8; 2] = [0x02, 0x1F];

/// Default maximum BER payload per frame; larger messages are split.
pub const MAX_FRAME_PAYLOAD: usize = 1024;

/// Flag bits of the ember frame header.
pub mod flags {
    /// First packet of a multi-packet message.
    pub const FIRST_PACKET: u8 = 0x02;
    /// Last packet of a multi-packet message.
    pub const LAST_PACKET: u8 = 0x04;
    /// Frame carries no payload.
    pub const EMPTY_PACKET: u8 = 0x08;

    /// Single-frame message: first and last at once.
    pub const SINGLE_PACKET: u8 = FIRST_PACKET | LAST_PACKET;

    /// Check if a specific flag is set.
    #[inline]
    pub fn has_flag(flags: u8, flag: u8) -> bool {
        flags & flag != 0
    }
}

/// Append `byte` to `out`, escaping it if it collides with a marker.
#[inline]
fn push_escaped(out: &mut Vec<u8>, byte: u8) {
    if byte >= ESCAPE {
        out.push(ESCAPE);
        out.push(byte ^ ESCAPE_XOR);
    } else {
        out.push(byte);
    }
}

/// Wrap an unescaped frame body in BOF/CRC/EOF and escape it for the wire.
fn finish_frame(body: &[u8]) -> Bytes {
    let crc = crc16(body);
    let mut out = Vec::with_capacity(body.len() + 6);
    out.push(BOF);
    for &byte in body {
        push_escaped(&mut out, byte);
    }
    push_escaped(&mut out, (crc & 0xFF) as u8);
    push_escaped(&mut out, (crc >> 8) as u8);
    out.push(EOF);
    Bytes::from(out)
}

/// Encode a keepalive-request frame.
pub fn encode_keepalive_request() -> Bytes {
    finish_frame(&[SLOT, MSG_TYPE_S101, CMD_KEEPALIVE_REQUEST, VERSION])
}

/// Encode a keepalive-response frame.
pub fn encode_keepalive_response() -> Bytes {
    finish_frame(&[SLOT, MSG_TYPE_S101, CMD_KEEPALIVE_RESPONSE, VERSION])
}

/// Encode one ember-payload frame with the given flags and payload chunk.
fn encode_ember_frame(frame_flags: u8, chunk: &[u8]) -> Bytes {
    let mut body = Vec::with_capacity(7 + APP_BYTES.len() + chunk.len());
    body.push(SLOT);
    body.push(MSG_TYPE_S101);
    body.push(CMD_EMBER);
    body.push(VERSION);
    body.push(frame_flags);
    body.push(DTD_GLOW);
    body.push(APP_BYTES.len() as u8);
    body.extend_from_slice(&APP_BYTES);
    body.extend_from_slice(chunk);
    finish_frame(&body)
}

/// Encode a BER payload as one or more ember frames.
///
/// Payloads above `max_payload` bytes are split across frames; the first
/// frame carries the first-packet flag, the last carries the last-packet
/// flag. An empty payload produces a single empty-packet frame.
pub fn encode_ember(payload: &[u8], max_payload: usize) -> Vec<Bytes> {
    if payload.is_empty() {
        return vec![encode_ember_frame(
            flags::SINGLE_PACKET | flags::EMPTY_PACKET,
            &[],
        )];
    }

    let chunks: Vec<&[u8]> = payload.chunks(max_payload.max(1)).collect();
    let last = chunks.len() - 1;

    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            let mut frame_flags = 0;
            if i == 0 {
                frame_flags |= flags::FIRST_PACKET;
            }
            if i == last {
                frame_flags |= flags::LAST_PACKET;
            }
            encode_ember_frame(frame_flags, chunk)
        })
        .collect()
}
