//! Head-unit MCU serial protocol
//!
//! This crate provides the command catalog and typed message codec for the
//! link between the head unit and its microcontroller. Every message travels
//! in an MCU frame (see [`autolink_frame::FrameFormat::MCU`]) whose body is a
//! command byte followed by that command's value.
//!
//! # Protocol Overview
//!
//! - **Events** (MCU → host): button clicks and holds, dimmer and reverse
//!   signals, radio tunnel data, log lines. Decoded into [`McuMessage`].
//! - **Requests** (host → MCU): handshake, dimmer mode, audio source, radio
//!   tunnel control. Encoded from [`McuRequest`].
//!
//! Integers are little-endian. The width of an integer is not tagged on the
//! wire; it is taken from the number of bytes that follow the command.
//!
//! # Example
//!
//! ```rust
//! use autolink_mcu_protocol::{McuCommand, McuDecoder, McuValue};
//!
//! let mut decoder = McuDecoder::new();
//! let messages = decoder.feed(&[0xF1, 0x03, 0x03, 0x2C, 0x01, 0x33]);
//! assert_eq!(messages[0].command, McuCommand::Click);
//! assert_eq!(messages[0].value, McuValue::Short(300));
//! ```

mod commands;
mod constants;
mod error;
mod message;
mod requests;
mod value;

pub use commands::*;
pub use constants::*;
pub use error::*;
pub use message::*;
pub use requests::*;
pub use value::*;
