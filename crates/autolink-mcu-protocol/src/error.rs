//! Protocol error types.

use autolink_frame::FrameError;
use thiserror::Error;

use crate::{McuCommand, ValueKind};

/// Errors that can occur when working with the MCU protocol.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The frame itself was bad.
    #[error(transparent)]
    Frame(#[from] FrameError),

    /// A frame body with no command byte.
    #[error("empty frame: missing command byte")]
    EmptyFrame,

    /// Command byte outside the catalog.
    #[error("unknown command code: 0x{0:02X}")]
    UnknownCommandCode(u8),

    /// The bytes after the command do not fit its declared kind.
    #[error("{command} expects {kind}, got {len} payload bytes")]
    ValueKindMismatch {
        /// Command being decoded.
        command: McuCommand,
        /// Declared kind of the command.
        kind: ValueKind,
        /// Number of payload bytes available.
        len: usize,
    },

    /// A request could not be built.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}
