//! Link session and command dispatch for a head-unit MCU.
//!
//! A [`LinkSession`] owns one [`Transport`] to the MCU. It runs the
//! START/STARTED handshake, decodes inbound frames on a dedicated worker,
//! and hands button, dimmer, reverse and custom events to the
//! [`CommandDispatcher`], which runs [`Action`]s against an [`ActionHost`].
//! The optional radio module behind the MCU is reached through
//! [`RadioControl`].
//!
//! ```no_run
//! use std::sync::Arc;
//! use autolink_session::{LinkSession, LoggingHost, SessionConfig, TcpTransport};
//!
//! # fn main() -> Result<(), autolink_session::SessionError> {
//! let transport = Arc::new(TcpTransport::new("127.0.0.1:5760")?);
//! let session = LinkSession::new(SessionConfig::default(), transport, Arc::new(LoggingHost::default()));
//! session.connect()?;
//! println!("{:?}", session.status());
//! session.disconnect();
//! # Ok(())
//! # }
//! ```

pub mod actions;
pub mod buttons;
pub mod config;
pub mod dimmer;
pub mod dispatcher;
pub mod error;
pub mod host;
pub mod outbox;
pub mod radio_link;
pub mod session;
pub mod tcp;
pub mod transport;

pub use actions::{Action, ActionContext, ActionHost, AudioSource, CameraApp, HoldFlag, MediaKey};
pub use buttons::{find_mapping, ActionType, ButtonMapping, Gesture};
pub use config::{RepeatConfig, SessionConfig, TimeoutConfig};
pub use dimmer::{Dimmer, DimmerConfig, DimmerMode};
pub use dispatcher::{CommandDispatcher, LearnEvent};
pub use error::SessionError;
pub use host::{HostCall, LoggingHost, RecordingHost};
pub use outbox::Outbox;
pub use radio_link::{RadioControl, RadioLink, RadioLinkState, STREAM_LOCK_RETRY, STREAM_LOCK_TIMEOUT};
pub use session::{ConnectionStatus, LinkSession, LinkState};
pub use tcp::TcpTransport;
pub use transport::{Transport, TransportEvent};
