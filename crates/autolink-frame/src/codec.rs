//! Streaming decoder for stuffed frames.
//!
//! The decoder is a single-pass state machine fed one byte at a time:
//!
//! ```text
//! AwaitStart -> ReadLength -> ReadBody(n) -> ReadChecksum -> AwaitStart
//! ```
//!
//! A start sentinel seen outside an escape sequence always restarts the frame,
//! so a corrupt or truncated frame costs at most that frame.

use bytes::{Bytes, BytesMut};
use log::{trace, warn};

use crate::{FrameError, FrameFormat, MAX_BODY_LEN};

/// Where the decoder is within the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeState {
    /// Discarding bytes until a start sentinel.
    AwaitStart,
    /// Next logical byte is the body length.
    ReadLength,
    /// Reading body bytes.
    ReadBody {
        /// Body bytes still expected.
        remaining: usize,
    },
    /// Next logical byte is the checksum.
    ReadChecksum,
}

/// Running counters kept by a decoder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderStats {
    /// Frames that passed the checksum and were emitted.
    pub frames: u64,
    /// Frames dropped because of a checksum mismatch.
    pub checksum_errors: u64,
    /// Frames dropped because a new start sentinel cut them short.
    pub truncated: u64,
}

/// Incremental decoder for one [`FrameFormat`].
#[derive(Debug)]
pub struct StuffedFrameDecoder {
    format: FrameFormat,
    state: DecodeState,
    escaping: bool,
    expected_len: usize,
    checksum: u8,
    body: BytesMut,
    stats: DecoderStats,
}

impl StuffedFrameDecoder {
    /// Create a decoder waiting for its first start sentinel.
    pub fn new(format: FrameFormat) -> Self {
        StuffedFrameDecoder {
            format,
            state: DecodeState::AwaitStart,
            escaping: false,
            expected_len: 0,
            checksum: 0,
            body: BytesMut::with_capacity(MAX_BODY_LEN),
            stats: DecoderStats::default(),
        }
    }

    /// The format this decoder understands.
    pub fn format(&self) -> &FrameFormat {
        &self.format
    }

    /// Current state of the frame state machine.
    pub fn state(&self) -> DecodeState {
        self.state
    }

    /// Counters accumulated since construction.
    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    /// Drop any partial frame and wait for the next start sentinel.
    pub fn reset(&mut self) {
        self.state = DecodeState::AwaitStart;
        self.escaping = false;
        self.expected_len = 0;
        self.body.clear();
    }

    /// Feed a chunk of received bytes, returning every frame body completed by it.
    ///
    /// Corrupt frames are logged, counted and skipped.
    pub fn feed(&mut self, data: &[u8]) -> Vec<Bytes> {
        let mut frames = Vec::new();
        for &byte in data {
            match self.decode_byte(byte) {
                Ok(Some(body)) => frames.push(body),
                Ok(None) => {}
                Err(err) => warn!("{}", err),
            }
        }
        frames
    }

    /// Feed a single raw byte.
    ///
    /// Returns `Ok(Some(body))` when the byte completes a valid frame. An error
    /// means a frame was dropped; the decoder is already able to continue.
    pub fn decode_byte(&mut self, byte: u8) -> Result<Option<Bytes>, FrameError> {
        if self.escaping {
            self.escaping = false;
            let value = self.format.unescape(byte);
            return self.advance(value);
        }

        if byte == self.format.start {
            let previous = self.state;
            let expected = self.expected_len;
            let received = self.body.len();
            self.begin_frame();
            if previous != DecodeState::AwaitStart {
                self.stats.truncated += 1;
                return Err(FrameError::Truncated {
                    format: self.format.name,
                    expected,
                    received,
                });
            }
            return Ok(None);
        }

        if self.state == DecodeState::AwaitStart {
            trace!("{}: skipping 0x{:02X} outside a frame", self.format.name, byte);
            return Ok(None);
        }

        if byte == self.format.escape {
            self.escaping = true;
            return Ok(None);
        }

        self.advance(byte)
    }

    fn begin_frame(&mut self) {
        self.state = DecodeState::ReadLength;
        self.escaping = false;
        self.expected_len = 0;
        self.body.clear();
    }

    /// Apply one logical (already unescaped) byte to the state machine.
    fn advance(&mut self, value: u8) -> Result<Option<Bytes>, FrameError> {
        match self.state {
            DecodeState::AwaitStart => Ok(None),
            DecodeState::ReadLength => {
                self.expected_len = value as usize;
                self.checksum = self.format.checksum_seed.wrapping_add(value);
                self.state = if self.expected_len == 0 {
                    DecodeState::ReadChecksum
                } else {
                    DecodeState::ReadBody {
                        remaining: self.expected_len,
                    }
                };
                Ok(None)
            }
            DecodeState::ReadBody { remaining } => {
                self.body.extend_from_slice(&[value]);
                self.checksum = self.checksum.wrapping_add(value);
                self.state = if remaining <= 1 {
                    DecodeState::ReadChecksum
                } else {
                    DecodeState::ReadBody {
                        remaining: remaining - 1,
                    }
                };
                Ok(None)
            }
            DecodeState::ReadChecksum => {
                self.state = DecodeState::AwaitStart;
                let body = self.body.split().freeze();
                if value != self.checksum {
                    self.stats.checksum_errors += 1;
                    return Err(FrameError::ChecksumMismatch {
                        format: self.format.name,
                        expected: self.checksum,
                        actual: value,
                    });
                }
                self.stats.frames += 1;
                trace!("{}: frame of {} bytes", self.format.name, body.len());
                Ok(Some(body))
            }
        }
    }
}
