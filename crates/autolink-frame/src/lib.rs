//! Byte-stuffed frame codec
//!
//! Both the MCU link and the radio link tunnelled through it use the same
//! framing scheme, differing only in their sentinel bytes, their escape table
//! and the value the checksum starts from:
//!
//! ```text
//! +-------+-----+-----------------+-----+
//! | start | len | body[0..len]    | chk |
//! +-------+-----+-----------------+-----+
//! ```
//!
//! - `start` is never escaped; seeing it outside an escape sequence always
//!   begins a new frame.
//! - `len`, every body byte and `chk` are escaped individually.
//! - `chk` is the sum of the seed, `len` and the body bytes, modulo 256,
//!   computed over the logical (unescaped) values.
//!
//! # Example
//!
//! ```rust
//! use autolink_frame::{FrameFormat, StuffedFrameDecoder};
//!
//! let wire = FrameFormat::MCU.encode(&[0x03, 0x2C, 0x01]).unwrap();
//! let mut decoder = StuffedFrameDecoder::new(FrameFormat::MCU);
//! let frames = decoder.feed(&wire);
//! assert_eq!(frames.len(), 1);
//! assert_eq!(&frames[0][..], &[0x03, 0x2C, 0x01]);
//! ```

mod codec;
mod error;
mod format;

pub use codec::*;
pub use error::*;
pub use format::*;
