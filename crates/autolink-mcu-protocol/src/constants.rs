//! Protocol constants
//!
//! Wire codes for both directions of the MCU link. The two directions use
//! separate code spaces, so the same number means different things depending
//! on who sent it.

// ============================================================================
// Event Codes (MCU → host)
// ============================================================================

/// Placeholder event carrying nothing.
pub const EVT_NONE: u8 = 0x00;
/// Reply to [`CMD_START`], carrying the MCU identifier string.
pub const EVT_STARTED: u8 = 0x01;
/// Reply to [`CMD_REQUEST_ID`], carrying the MCU identifier string.
pub const EVT_IDENT: u8 = 0x02;
/// A resistive button was tapped; carries the ADC reading.
pub const EVT_CLICK: u8 = 0x03;
/// A resistive button is being held; carries the ADC reading.
pub const EVT_HOLD: u8 = 0x04;
/// A held button was released.
pub const EVT_RELEASE: u8 = 0x05;
/// Headlight dimmer line changed.
pub const EVT_DIMMER: u8 = 0x06;
/// Analog dimmer level reading.
pub const EVT_DIMMER_LEVEL: u8 = 0x07;
/// Reverse gear engaged or released.
pub const EVT_REVERSE: u8 = 0x08;
/// Whether the radio module answered a status request.
pub const EVT_RADIO_STATUS: u8 = 0x09;
/// Raw bytes received from the radio module.
pub const EVT_RADIO_DATA: u8 = 0x0A;
/// A log line from the MCU firmware.
pub const EVT_LOG: u8 = 0x0B;
/// Vendor-defined event; first byte is the sub-command.
pub const EVT_CUSTOM: u8 = 0x0C;

// ============================================================================
// Command Codes (host → MCU)
// ============================================================================

/// Begin a session; the MCU answers with [`EVT_STARTED`].
pub const CMD_START: u8 = 0x01;
/// End the session.
pub const CMD_STOP: u8 = 0x02;
/// Ask the MCU for its identifier.
pub const CMD_REQUEST_ID: u8 = 0x03;
/// Report dimmer changes as analog level readings.
pub const CMD_SET_DIMMER_ANALOG: u8 = 0x04;
/// Report dimmer changes as on/off.
pub const CMD_SET_DIMMER_DIGITAL: u8 = 0x05;
/// Route the head unit's audio input to the HD radio.
pub const CMD_AUDIO_SOURCE_HD: u8 = 0x06;
/// Route the head unit's audio input to the aux jack.
pub const CMD_AUDIO_SOURCE_AUX: u8 = 0x07;
/// Ask whether a radio module is attached.
pub const CMD_RADIO_REQUEST_STATUS: u8 = 0x08;
/// Forward a complete radio frame to the radio module.
pub const CMD_RADIO_SEND_PACKET: u8 = 0x09;
/// Drive the radio module's DTR line.
pub const CMD_RADIO_SET_DTR: u8 = 0x0A;
/// Drive the radio module's RTS line.
pub const CMD_RADIO_SET_RTS: u8 = 0x0B;
/// Vendor-defined command; first byte is the sub-command.
pub const CMD_CUSTOM: u8 = 0x0C;
