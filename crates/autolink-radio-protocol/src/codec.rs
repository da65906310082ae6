//! Radio packet parsing and the streaming reply decoder.

use autolink_frame::{DecoderStats, FrameFormat, StuffedFrameDecoder};
use bytes::Bytes;
use log::{debug, trace, warn};

use crate::constants::*;
use crate::{RadioCommand, RadioError, RadioOperation, RadioValue};

/// A radio frame body split into its header fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RadioPacket {
    pub command: RadioCommand,
    pub operation: RadioOperation,
    pub data: Bytes,
}

impl RadioPacket {
    /// Split a frame body into command, operation and data.
    pub fn parse(body: Bytes) -> Result<Self, RadioError> {
        if body.len() < HEADER_LEN {
            return Err(RadioError::PacketTooShort {
                expected: HEADER_LEN,
                actual: body.len(),
            });
        }
        let command = RadioCommand::from_code(u16::from_le_bytes([body[0], body[1]]));
        let op_code = u16::from_le_bytes([body[2], body[3]]);
        let operation =
            RadioOperation::from_code(op_code).ok_or(RadioError::UnknownOperation(op_code))?;
        Ok(RadioPacket {
            command,
            operation,
            data: body.slice(HEADER_LEN..),
        })
    }
}

/// A value reported by the radio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RadioUpdate {
    pub command: RadioCommand,
    pub value: RadioValue,
}

impl RadioUpdate {
    pub fn new(command: RadioCommand, value: RadioValue) -> Self {
        RadioUpdate { command, value }
    }

    /// Decode a frame body.
    ///
    /// `Ok(None)` means the packet was valid but carries nothing to apply:
    /// a get/set echo, or a reply flagged as empty.
    pub fn decode(body: Bytes) -> Result<Option<Self>, RadioError> {
        let packet = RadioPacket::parse(body)?;
        if packet.operation != RadioOperation::Reply {
            trace!("radio: ignoring {:?} echo for {}", packet.operation, packet.command);
            return Ok(None);
        }
        if !packet.command.is_known() {
            return Err(RadioError::UnknownCommandCode(packet.command.code()));
        }
        let value = RadioValue::decode(packet.command, &packet.data)?;
        Ok(value.map(|value| RadioUpdate::new(packet.command, value)))
    }

    /// Reply frame body for this update, as the radio would send it.
    pub fn encode_reply_body(&self) -> Vec<u8> {
        let mut body = Vec::with_capacity(HEADER_LEN + 8);
        body.extend_from_slice(&self.command.code().to_le_bytes());
        body.extend_from_slice(&OP_REPLY.to_le_bytes());
        self.value.encode_into(&mut body);
        body
    }

    /// Complete reply frame.
    pub fn encode_reply(&self) -> Result<Vec<u8>, RadioError> {
        Ok(FrameFormat::RADIO.encode(&self.encode_reply_body())?)
    }
}

/// Streaming decoder turning radio link bytes into [`RadioUpdate`]s.
#[derive(Debug)]
pub struct RadioDecoder {
    frames: StuffedFrameDecoder,
    rejected: u64,
}

impl Default for RadioDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl RadioDecoder {
    pub fn new() -> Self {
        RadioDecoder {
            frames: StuffedFrameDecoder::new(FrameFormat::RADIO),
            rejected: 0,
        }
    }

    /// Feed bytes received from the radio, returning the updates they complete.
    pub fn feed(&mut self, data: &[u8]) -> Vec<RadioUpdate> {
        let mut updates = Vec::new();
        for body in self.frames.feed(data) {
            match RadioUpdate::decode(body) {
                Ok(Some(update)) => {
                    debug!("radio rx {} = {}", update.command, update.value);
                    updates.push(update);
                }
                Ok(None) => {}
                Err(err) => {
                    self.rejected += 1;
                    warn!("radio: dropping packet: {}", err);
                }
            }
        }
        updates
    }

    pub fn frame_stats(&self) -> DecoderStats {
        self.frames.stats()
    }

    /// Packets that passed the checksum but could not be decoded.
    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    pub fn reset(&mut self) {
        self.frames.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RadioRequest, SongInfo};

    #[test]
    fn test_reply_decoded() {
        let update = RadioUpdate::new(RadioCommand::Volume, RadioValue::Int(33));
        let wire = update.encode_reply().unwrap();
        let mut decoder = RadioDecoder::new();
        assert_eq!(decoder.feed(&wire), vec![update]);
    }

    #[test]
    fn test_echo_discarded() {
        let wire = RadioRequest::Set(RadioCommand::Mute, RadioValue::Bool(true))
            .encode()
            .unwrap();
        let mut decoder = RadioDecoder::new();
        assert!(decoder.feed(&wire).is_empty());
        assert_eq!(decoder.rejected(), 0);
        assert_eq!(decoder.frame_stats().frames, 1);
    }

    #[test]
    fn test_short_and_unknown_packets_rejected() {
        assert_eq!(
            RadioPacket::parse(Bytes::from_static(&[0x01, 0x00])),
            Err(RadioError::PacketTooShort {
                expected: 4,
                actual: 2
            })
        );
        assert_eq!(
            RadioUpdate::decode(Bytes::from_static(&[0x01, 0x00, 0x07, 0x00])),
            Err(RadioError::UnknownOperation(7))
        );
        assert_eq!(
            RadioUpdate::decode(Bytes::from_static(&[0xEE, 0xEE, 0x02, 0x00])),
            Err(RadioError::UnknownCommandCode(0xEEEE))
        );
    }

    #[test]
    fn test_bad_packet_does_not_stop_decoder() {
        let mut wire = FrameFormat::RADIO.encode(&[0x01, 0x00, 0x02, 0x00, 0x09, 0, 0, 0]).unwrap();
        let good = RadioUpdate::new(
            RadioCommand::HdArtist,
            RadioValue::Song(SongInfo {
                subchannel: 1,
                description: "Artist".into(),
            }),
        );
        wire.extend(good.encode_reply().unwrap());

        let mut decoder = RadioDecoder::new();
        assert_eq!(decoder.feed(&wire), vec![good]);
        assert_eq!(decoder.rejected(), 1);
    }

    #[test]
    fn test_reply_with_escaped_bytes() {
        // 0xA4 and 0x1B inside a reply must survive stuffing
        let update = RadioUpdate::new(RadioCommand::SignalStrength, RadioValue::Int(0x1BA4));
        let wire = update.encode_reply().unwrap();
        assert_eq!(RadioDecoder::new().feed(&wire), vec![update]);
    }
}
