//! The byte pipe between a session and its MCU.

use crossbeam_channel::Sender;

use crate::error::SessionError;

/// Something the transport reports back to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The device finished opening (`true`) or could not be opened (`false`).
    DeviceReady(bool),
    /// Raw bytes received from the device, in arrival order.
    Data(Vec<u8>),
    /// The device failed or went away.
    DeviceError(String),
}

/// A serial-like link to the MCU.
///
/// `connect` must return promptly; readiness and incoming bytes are reported
/// asynchronously through the supplied channel.
pub trait Transport: Send + Sync {
    /// Start opening the device.
    fn connect(&self, events: Sender<TransportEvent>) -> Result<(), SessionError>;

    /// Write already-framed bytes.
    fn write(&self, data: &[u8]) -> Result<(), SessionError>;

    /// Close the device. Must be safe to call more than once.
    fn close(&self);
}
