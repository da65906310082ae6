//! Inbound MCU messages and the streaming decoder that produces them.

use autolink_frame::{DecoderStats, FrameFormat, StuffedFrameDecoder};
use log::{debug, warn};

use crate::{McuCommand, McuValue, ProtocolError};

/// One decoded MCU event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct McuMessage {
    /// The event.
    pub command: McuCommand,
    /// Its value, typed according to the command's declared kind.
    pub value: McuValue,
}

impl McuMessage {
    pub fn new(command: McuCommand, value: McuValue) -> Self {
        McuMessage { command, value }
    }

    /// Decode a message from a frame body (command byte followed by value).
    pub fn decode(body: &[u8]) -> Result<Self, ProtocolError> {
        let (&code, data) = body.split_first().ok_or(ProtocolError::EmptyFrame)?;
        let command = McuCommand::from_code(code);
        if !command.is_known() {
            return Err(ProtocolError::UnknownCommandCode(code));
        }
        let value = McuValue::decode(command, data)?;
        Ok(McuMessage { command, value })
    }

    /// Frame body for this message.
    pub fn encode_body(&self) -> Vec<u8> {
        let mut body = vec![self.command.code()];
        self.value.encode_into(&mut body);
        body
    }

    /// Complete MCU frame for this message, as the MCU would send it.
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        self.encode_with(&FrameFormat::MCU)
    }

    /// Complete frame in the given format.
    pub fn encode_with(&self, format: &FrameFormat) -> Result<Vec<u8>, ProtocolError> {
        Ok(format.encode(&self.encode_body())?)
    }
}

/// Streaming decoder turning raw MCU link bytes into [`McuMessage`]s.
///
/// Every error is local to one frame: it is logged and decoding continues.
#[derive(Debug)]
pub struct McuDecoder {
    frames: StuffedFrameDecoder,
    rejected: u64,
}

impl Default for McuDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl McuDecoder {
    /// Create a decoder for the standard MCU framing.
    pub fn new() -> Self {
        Self::with_format(FrameFormat::MCU)
    }

    /// Create a decoder for a variant framing (e.g. a different checksum seed).
    pub fn with_format(format: FrameFormat) -> Self {
        McuDecoder {
            frames: StuffedFrameDecoder::new(format),
            rejected: 0,
        }
    }

    /// Feed received bytes, returning the messages they complete, in order.
    pub fn feed(&mut self, data: &[u8]) -> Vec<McuMessage> {
        let mut messages = Vec::new();
        for body in self.frames.feed(data) {
            match McuMessage::decode(&body) {
                Ok(message) => {
                    debug!("mcu rx {} {}", message.command, message.value);
                    messages.push(message);
                }
                Err(err) => {
                    self.rejected += 1;
                    warn!("mcu: dropping frame: {}", err);
                }
            }
        }
        messages
    }

    /// Frame-level counters.
    pub fn frame_stats(&self) -> DecoderStats {
        self.frames.stats()
    }

    /// Frames that passed the checksum but could not be decoded.
    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    /// Drop any partial frame.
    pub fn reset(&mut self) {
        self.frames.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_click_scenario() {
        let mut decoder = McuDecoder::new();
        let messages = decoder.feed(&[0xF1, 0x03, 0x03, 0x2C, 0x01, 0x33]);
        assert_eq!(
            messages,
            vec![McuMessage::new(McuCommand::Click, McuValue::Short(300))]
        );
    }

    #[test]
    fn test_unknown_command_dropped_and_parsing_continues() {
        let mut decoder = McuDecoder::new();
        let mut wire = FrameFormat::MCU.encode(&[0x42, 0x01]).unwrap();
        wire.extend(
            McuMessage::new(McuCommand::Log, McuValue::Str("hi".into()))
                .encode()
                .unwrap(),
        );
        let messages = decoder.feed(&wire);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].command, McuCommand::Log);
        assert_eq!(decoder.rejected(), 1);
        assert_eq!(decoder.frame_stats().frames, 2);
    }

    #[test]
    fn test_kind_mismatch_only_costs_one_frame() {
        let mut decoder = McuDecoder::new();
        let mut wire = FrameFormat::MCU.encode(&[0x03, 0x01]).unwrap();
        wire.extend(FrameFormat::MCU.encode(&[0x06, 0x01]).unwrap());
        let messages = decoder.feed(&wire);
        assert_eq!(
            messages,
            vec![McuMessage::new(McuCommand::Dimmer, McuValue::Bool(true))]
        );
    }

    #[test]
    fn test_empty_body_rejected() {
        assert_eq!(McuMessage::decode(&[]), Err(ProtocolError::EmptyFrame));
        let mut decoder = McuDecoder::new();
        assert!(decoder.feed(&[0xF1, 0x00, 0x00]).is_empty());
        assert_eq!(decoder.rejected(), 1);
    }

    #[test]
    fn test_seeded_variant() {
        let format = FrameFormat::MCU.with_checksum_seed(0xF1);
        let message = McuMessage::new(McuCommand::Started, McuValue::Str("v2".into()));
        let wire = message.encode_with(&format).unwrap();

        assert!(McuDecoder::new().feed(&wire).is_empty());
        assert_eq!(McuDecoder::with_format(format).feed(&wire), vec![message]);
    }
}
