//! Protocol constants

// ============================================================================
// Operation Codes
// ============================================================================

/// Read a value.
pub const OP_GET: u16 = 0x0000;
/// Write a value.
pub const OP_SET: u16 = 0x0001;
/// The radio reporting a value.
pub const OP_REPLY: u16 = 0x0002;

// ============================================================================
// Payload Words
// ============================================================================

/// Length of the command + operation header.
pub const HEADER_LEN: usize = 4;
/// Unused word in front of every string reply.
pub const STRING_PREFIX_LEN: usize = 4;

pub const WORD_ZERO: [u8; 4] = [0x00, 0x00, 0x00, 0x00];
pub const WORD_ONE: [u8; 4] = [0x01, 0x00, 0x00, 0x00];
/// Step direction: up.
pub const WORD_UP: [u8; 4] = [0x01, 0x00, 0x00, 0x00];
/// Step direction: down (-1).
pub const WORD_DOWN: [u8; 4] = [0xFF, 0xFF, 0xFF, 0xFF];
/// Leading word of a seek request.
pub const WORD_SEEK_ID: [u8; 4] = [0xA5, 0x00, 0x00, 0x00];
/// Seek stops on any station.
pub const WORD_SEEK_ALL: [u8; 4] = [0x00, 0x00, 0x3D, 0x00];
/// Seek stops only on HD stations.
pub const WORD_SEEK_HD_ONLY: [u8; 4] = [0x00, 0x00, 0x3D, 0x01];

// ============================================================================
// Levels
// ============================================================================

/// Lowest volume/bass/treble/compression level.
pub const LEVEL_MIN: i32 = 0;
/// Highest volume/bass/treble/compression level.
pub const LEVEL_MAX: i32 = 90;
