//! Frame format descriptions for the two links.

use bytes::BufMut;

use crate::FrameError;

/// Largest body a frame can carry; the length field is a single byte.
pub const MAX_BODY_LEN: usize = u8::MAX as usize;

/// Describes one stuffed framing scheme.
///
/// The MCU link and the radio link share the decoder and encoder and differ
/// only in the values held here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameFormat {
    /// Short name used in log messages and errors.
    pub name: &'static str,
    /// Start-of-frame sentinel.
    pub start: u8,
    /// Escape byte.
    pub escape: u8,
    /// `(literal, follower)` pairs: `literal` is sent as `escape, follower`.
    pub escapes: [(u8, u8); 2],
    /// Initial value of the running checksum.
    pub checksum_seed: u8,
}

impl FrameFormat {
    /// Outer framing used on the serial link to the MCU.
    pub const MCU: FrameFormat = FrameFormat {
        name: "mcu",
        start: 0xF1,
        escape: 0x1A,
        escapes: [(0xF1, 0x20), (0x1A, 0x1A)],
        checksum_seed: 0x00,
    };

    /// Inner framing used by the radio module, carried inside MCU frames.
    ///
    /// The radio module counts its start byte into the checksum.
    pub const RADIO: FrameFormat = FrameFormat {
        name: "radio",
        start: 0xA4,
        escape: 0x1B,
        escapes: [(0x1B, 0x1B), (0xA4, 0x48)],
        checksum_seed: 0xA4,
    };

    /// Same framing with a different checksum seed.
    ///
    /// Some MCU firmware builds count the start byte into the checksum the way
    /// the radio module does; `FrameFormat::MCU.with_checksum_seed(0xF1)` talks
    /// to those.
    pub const fn with_checksum_seed(self, seed: u8) -> FrameFormat {
        FrameFormat {
            checksum_seed: seed,
            ..self
        }
    }

    /// Map the byte following an escape back to its literal value.
    ///
    /// Followers that are not part of the table pass through unchanged.
    pub fn unescape(&self, follower: u8) -> u8 {
        self.escapes
            .iter()
            .find(|(_, f)| *f == follower)
            .map(|(literal, _)| *literal)
            .unwrap_or(follower)
    }

    /// Write `value` to `out`, escaping it if it is reserved.
    pub fn put_escaped<B: BufMut>(&self, out: &mut B, value: u8) {
        match self.escapes.iter().find(|(literal, _)| *literal == value) {
            Some((_, follower)) => {
                out.put_u8(self.escape);
                out.put_u8(*follower);
            }
            None => out.put_u8(value),
        }
    }

    /// Encode `body` as one complete frame.
    ///
    /// Fails only when the body is longer than [`MAX_BODY_LEN`].
    pub fn encode(&self, body: &[u8]) -> Result<Vec<u8>, FrameError> {
        if body.len() > MAX_BODY_LEN {
            return Err(FrameError::TooLong {
                format: self.name,
                len: body.len(),
                max: MAX_BODY_LEN,
            });
        }

        // Worst case every byte is escaped.
        let mut out = Vec::with_capacity(3 + 2 * (body.len() + 2));
        out.put_u8(self.start);

        let len = body.len() as u8;
        let mut checksum = self.checksum_seed.wrapping_add(len);
        self.put_escaped(&mut out, len);
        for &byte in body {
            checksum = checksum.wrapping_add(byte);
            self.put_escaped(&mut out, byte);
        }
        self.put_escaped(&mut out, checksum);

        Ok(out)
    }
}
