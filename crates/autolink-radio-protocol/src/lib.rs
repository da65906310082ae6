//! HD radio module protocol
//!
//! The radio module speaks its own framed protocol (see
//! [`autolink_frame::FrameFormat::RADIO`]), carried as opaque bytes inside
//! MCU frames. Every radio frame body starts with a 4-byte header:
//!
//! ```text
//! +--------+--------+--------+--------+------------------+
//! | cmd_lo | cmd_hi | op_lo  | op_hi  | operation data   |
//! +--------+--------+--------+--------+------------------+
//! ```
//!
//! Only `reply` frames carry state the host cares about; `get`/`set` echoes
//! are dropped. Decoded replies are applied to a [`RadioKeyStore`], which
//! holds the latest value of every key.

mod codec;
mod commands;
mod constants;
mod error;
mod request;
mod store;
mod value;

pub use codec::*;
pub use commands::*;
pub use constants::*;
pub use error::*;
pub use request::*;
pub use store::*;
pub use value::*;
