//! Frame-level error types.

use thiserror::Error;

/// Errors produced while encoding or decoding a stuffed frame.
///
/// None of these are fatal to a decoder: after reporting one, the decoder has
/// already returned to a state where it can accept the next frame.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// The trailing checksum did not match the frame contents.
    #[error("{format} frame checksum mismatch: computed 0x{expected:02X}, received 0x{actual:02X}")]
    ChecksumMismatch {
        /// Name of the frame format.
        format: &'static str,
        /// Checksum computed over the received bytes.
        expected: u8,
        /// Checksum byte carried by the frame.
        actual: u8,
    },

    /// A new start sentinel arrived before the current frame was complete.
    #[error("{format} frame truncated: expected {expected} body bytes, received {received}")]
    Truncated {
        /// Name of the frame format.
        format: &'static str,
        /// Body length announced by the length byte.
        expected: usize,
        /// Body bytes received before the interruption.
        received: usize,
    },

    /// The body does not fit in a single frame.
    #[error("{format} frame body too long: maximum {max} bytes, got {len}")]
    TooLong {
        /// Name of the frame format.
        format: &'static str,
        /// Length of the rejected body.
        len: usize,
        /// Largest body a frame can carry.
        max: usize,
    },
}
