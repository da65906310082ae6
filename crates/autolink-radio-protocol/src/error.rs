//! Radio protocol error types.

use autolink_frame::FrameError;
use thiserror::Error;

use crate::{RadioCommand, RadioKind};

/// Errors that can occur when working with the radio protocol.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RadioError {
    /// The enclosing frame was bad.
    #[error(transparent)]
    Frame(#[from] FrameError),

    /// Frame body shorter than the command + operation header.
    #[error("radio packet too short: expected at least {expected} bytes, got {actual}")]
    PacketTooShort {
        /// Minimum length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },

    /// Command code outside the catalog.
    #[error("unknown radio command code: 0x{0:04X}")]
    UnknownCommandCode(u16),

    /// Operation code other than get, set or reply.
    #[error("unknown radio operation code: 0x{0:04X}")]
    UnknownOperation(u16),

    /// Value does not fit the command's kind.
    #[error("{command} expects {kind}, got {detail}")]
    ValueKindMismatch {
        /// Command involved.
        command: RadioCommand,
        /// Declared kind of the command.
        kind: RadioKind,
        /// What was found instead.
        detail: String,
    },

    /// Band selector other than AM (0) or FM (1).
    #[error("invalid band selector: {0}")]
    InvalidBand(i32),

    /// Boolean word other than 0 or 1.
    #[error("invalid boolean word: {0}")]
    InvalidBoolean(i32),

    /// The radio does not accept this request.
    #[error("unsupported radio request: {0}")]
    UnsupportedRequest(String),
}
