//! Stateful S101 codec for one connection.
//!
//! Implements a receive state machine over arbitrary byte chunks:
//! - `SearchBof`: discard until a start-of-frame marker
//! - `InFrame`: accumulate unescaped frame bytes until end-of-frame
//! - `Escaped`: the next byte is XOR-folded back to its raw value
//!
//! Complete frames are CRC-checked and dispatched; ember payloads are
//! reassembled across first/last-packet frames. Corrupt or unknown frames
//! are dropped silently and the codec returns to `SearchBof` - no error
//! ever crosses the `feed` boundary.

use bytes::{Bytes, BytesMut};
use tracing::warn;

use super::crc::crc16;
use super::frame::{
    self, flags, BOF, CMD_EMBER, CMD_KEEPALIVE_REQUEST, CMD_KEEPALIVE_RESPONSE, EOF,
    ESCAPE, ESCAPE_XOR, MAX_FRAME_PAYLOAD, MSG_TYPE_S101,
};

/// Minimum unescaped frame length: four header bytes plus the CRC.
const MIN_FRAME_LEN: usize = 6;

/// Offset of the flags byte in an ember frame.
const EMBER_FLAGS_OFFSET: usize = 4;

/// Offset of the application-bytes count in an ember frame.
const EMBER_APP_COUNT_OFFSET: usize = 6;

/// State machine for frame parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RxState {
    /// Discarding bytes until a BOF marker.
    SearchBof,
    /// Inside a frame, accumulating unescaped bytes.
    InFrame,
    /// Saw the escape byte; the next byte is folded.
    Escaped,
}

/// Event produced by the codec for a complete, valid frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum S101Event {
    /// Peer asks for proof of liveness.
    KeepaliveRequest,
    /// Peer answered a keepalive request.
    KeepaliveResponse,
    /// A fully reassembled BER-encoded Ember+ message.
    EmberPacket(Bytes),
}

/// Stateful, single-connection S101 codec.
pub struct S101Codec {
    state: RxState,
    /// Unescaped bytes of the frame currently being received.
    frame: BytesMut,
    /// Payload bytes accumulated across a multi-packet message.
    reassembly: BytesMut,
    /// Per-frame payload cap applied when encoding.
    max_payload: usize,
}

impl S101Codec {
    /// Create a codec with the default per-frame payload cap.
    pub fn new() -> Self {
        Self::with_max_payload(MAX_FRAME_PAYLOAD)
    }

    /// Create a codec with a custom per-frame payload cap.
    pub fn with_max_payload(max_payload: usize) -> Self {
        Self {
            state: RxState::SearchBof,
            frame: BytesMut::with_capacity(MAX_FRAME_PAYLOAD + 16),
            reassembly: BytesMut::new(),
            max_payload,
        }
    }

    /// Feed raw bytes from the socket and collect the events they complete.
    ///
    /// Never fails: corrupt frames are dropped and parsing resumes at the
    /// next BOF.
    pub fn feed(&mut self, data: &[u8]) -> Vec<S101Event> {
        let mut events = Vec::new();

        for &byte in data {
            match self.state {
                RxState::SearchBof => {
                    if byte == BOF {
                        self.frame.clear();
                        self.state = RxState::InFrame;
                    }
                }
                RxState::InFrame => match byte {
                    EOF => {
                        if let Some(event) = self.finish_frame() {
                            events.push(event);
                        }
                        self.state = RxState::SearchBof;
                    }
                    ESCAPE => {
                        self.state = RxState::Escaped;
                    }
                    BOF => {
                        // A new BOF inside a frame restarts it.
                        self.frame.clear();
                    }
                    _ => {
                        self.frame.extend_from_slice(&[byte]);
                    }
                },
                RxState::Escaped => {
                    self.frame.extend_from_slice(&[byte ^ ESCAPE_XOR]);
                    self.state = RxState::InFrame;
                }
            }
        }

        events
    }

    /// Validate and dispatch the frame accumulated in `self.frame`.
    fn finish_frame(&mut self) -> Option<S101Event> {
        let frame = &self.frame[..];

        if frame.len() < MIN_FRAME_LEN {
            warn!(len = frame.len(), "dropping short S101 frame");
            return None;
        }

        let body = frame[..frame.len() - 2].to_vec();
        let received = u16::from_le_bytes([frame[frame.len() - 2], frame[frame.len() - 1]]);
        if crc16(&body) != received {
            warn!("dropping S101 frame with CRC mismatch");
            return None;
        }

        if body[1] != MSG_TYPE_S101 {
            warn!(msg_type = body[1], "dropping frame with unknown message type");
            return None;
        }

        match body[2] {
            CMD_KEEPALIVE_REQUEST => Some(S101Event::KeepaliveRequest),
            CMD_KEEPALIVE_RESPONSE => Some(S101Event::KeepaliveResponse),
            CMD_EMBER => self.finish_ember(&body),
            other => {
                warn!(command = other, "dropping frame with unknown command");
                None
            }
        }
    }

    /// Handle an ember-payload frame body, reassembling across packets.
    fn finish_ember(&mut self, body: &[u8]) -> Option<S101Event> {
        if body.len() <= EMBER_APP_COUNT_OFFSET {
            warn!(len = body.len(), "dropping truncated ember frame");
            return None;
        }

        let frame_flags = body[EMBER_FLAGS_OFFSET];
        let app_count = body[EMBER_APP_COUNT_OFFSET] as usize;
        let payload_start = EMBER_APP_COUNT_OFFSET + 1 + app_count;
        if payload_start > body.len() {
            warn!("dropping ember frame with truncated application bytes");
            return None;
        }
        let payload = &body[payload_start..];

        if flags::has_flag(frame_flags, flags::FIRST_PACKET) {
            self.reassembly.clear();
        }
        if !flags::has_flag(frame_flags, flags::EMPTY_PACKET) {
            self.reassembly.extend_from_slice(payload);
        }
        if flags::has_flag(frame_flags, flags::LAST_PACKET) {
            let message = self.reassembly.split().freeze();
            return Some(S101Event::EmberPacket(message));
        }

        None
    }

    /// Encode a keepalive-request frame.
    pub fn encode_keepalive_request(&self) -> Bytes {
        frame::encode_keepalive_request()
    }

    /// Encode a keepalive-response frame.
    pub fn encode_keepalive_response(&self) -> Bytes {
        frame::encode_keepalive_response()
    }

    /// Encode a BER payload into one or more wire frames.
    pub fn encode_ember(&self, payload: &[u8]) -> Vec<Bytes> {
        frame::encode_ember(payload, self.max_payload)
    }
}

impl Default for S101Codec {
    fn default() -> Self {
        Self::new()
    }
}
