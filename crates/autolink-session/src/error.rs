//! Session error types.

use std::time::Duration;

use autolink_mcu_protocol::ProtocolError;
use autolink_radio_protocol::RadioError;
use thiserror::Error;

/// Errors surfaced by the link session and its collaborators.
#[derive(Error, Debug)]
pub enum SessionError {
    /// A handshake step did not complete in time.
    #[error("timed out after {timeout:?} waiting for {stage}")]
    HandshakeTimeout {
        /// The step that timed out.
        stage: &'static str,
        /// How long we waited.
        timeout: Duration,
    },

    /// The transport reported the device as unusable.
    #[error("device not ready")]
    DeviceNotReady,

    /// The transport failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// The handshake was cancelled by a disconnect request.
    #[error("connection attempt aborted")]
    Aborted,

    /// The operation needs a connected session.
    #[error("not connected")]
    NotConnected,

    /// A connection attempt is already running or established.
    #[error("session already {0}")]
    AlreadyConnecting(&'static str),

    /// The radio module is not enabled.
    #[error("radio unavailable")]
    RadioUnavailable,

    /// An action could not be carried out by the host.
    #[error("host action failed: {0}")]
    Host(String),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Radio(#[from] RadioError),

    /// Configuration could not be loaded.
    #[error("config error: {0}")]
    Config(String),
}

impl SessionError {
    /// Helper to create a transport error.
    pub fn transport(msg: impl Into<String>) -> Self {
        SessionError::Transport(msg.into())
    }

    /// Helper to create a host error.
    pub fn host(msg: impl Into<String>) -> Self {
        SessionError::Host(msg.into())
    }
}

impl From<serde_yaml::Error> for SessionError {
    fn from(err: serde_yaml::Error) -> Self {
        SessionError::Config(err.to_string())
    }
}

impl From<std::io::Error> for SessionError {
    fn from(err: std::io::Error) -> Self {
        SessionError::Config(err.to_string())
    }
}
