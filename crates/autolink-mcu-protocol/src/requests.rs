//! Requests the host can send to the MCU.

use autolink_frame::{FrameFormat, MAX_BODY_LEN};

use crate::constants::*;
use crate::ProtocolError;

/// Requests that can be sent to the MCU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum McuRequest {
    /// Open the session; answered by `STARTED`.
    Start,
    /// Close the session.
    Stop,
    /// Ask for the MCU identifier; answered by `IDENT`.
    RequestId,
    /// Report the dimmer as analog level readings.
    SetDimmerAnalog,
    /// Report the dimmer as on/off.
    SetDimmerDigital,
    /// Switch audio input to the HD radio.
    AudioSourceHd,
    /// Switch audio input to the aux jack.
    AudioSourceAux,
    /// Ask whether a radio module is present; answered by `RADIO_STATUS`.
    RadioRequestStatus,
    /// Forward a complete, already framed radio packet.
    RadioSendPacket(Vec<u8>),
    /// Set the radio module's DTR line.
    RadioSetDtr(bool),
    /// Set the radio module's RTS line.
    RadioSetRts(bool),
    /// Vendor-defined command.
    Custom {
        /// Sub-command byte.
        code: u8,
        /// Optional data.
        data: Vec<u8>,
    },
}

impl McuRequest {
    /// Wire code of this request.
    pub fn code(&self) -> u8 {
        match self {
            McuRequest::Start => CMD_START,
            McuRequest::Stop => CMD_STOP,
            McuRequest::RequestId => CMD_REQUEST_ID,
            McuRequest::SetDimmerAnalog => CMD_SET_DIMMER_ANALOG,
            McuRequest::SetDimmerDigital => CMD_SET_DIMMER_DIGITAL,
            McuRequest::AudioSourceHd => CMD_AUDIO_SOURCE_HD,
            McuRequest::AudioSourceAux => CMD_AUDIO_SOURCE_AUX,
            McuRequest::RadioRequestStatus => CMD_RADIO_REQUEST_STATUS,
            McuRequest::RadioSendPacket(_) => CMD_RADIO_SEND_PACKET,
            McuRequest::RadioSetDtr(_) => CMD_RADIO_SET_DTR,
            McuRequest::RadioSetRts(_) => CMD_RADIO_SET_RTS,
            McuRequest::Custom { .. } => CMD_CUSTOM,
        }
    }

    /// Upper-case catalog name, used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            McuRequest::Start => "START",
            McuRequest::Stop => "STOP",
            McuRequest::RequestId => "REQUEST_ID",
            McuRequest::SetDimmerAnalog => "SET_DIMMER_ANALOG",
            McuRequest::SetDimmerDigital => "SET_DIMMER_DIGITAL",
            McuRequest::AudioSourceHd => "AUDIO_SOURCE_HD",
            McuRequest::AudioSourceAux => "AUDIO_SOURCE_AUX",
            McuRequest::RadioRequestStatus => "RADIO_REQUEST_STATUS",
            McuRequest::RadioSendPacket(_) => "RADIO_SEND_PACKET",
            McuRequest::RadioSetDtr(_) => "RADIO_SET_DTR",
            McuRequest::RadioSetRts(_) => "RADIO_SET_RTS",
            McuRequest::Custom { .. } => "CUSTOM",
        }
    }

    /// Frame body: the command byte followed by the request's data.
    pub fn encode_body(&self) -> Vec<u8> {
        let mut body = vec![self.code()];
        match self {
            McuRequest::RadioSendPacket(packet) => body.extend_from_slice(packet),
            McuRequest::RadioSetDtr(on) | McuRequest::RadioSetRts(on) => body.push(u8::from(*on)),
            McuRequest::Custom { code, data } => {
                body.push(*code);
                body.extend_from_slice(data);
            }
            _ => {}
        }
        body
    }

    /// Complete MCU frame for this request.
    ///
    /// Fails only when the data does not fit in one frame.
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        self.encode_with(&FrameFormat::MCU)
    }

    /// Complete frame in the given format.
    pub fn encode_with(&self, format: &FrameFormat) -> Result<Vec<u8>, ProtocolError> {
        Ok(format.encode(&self.encode_body())?)
    }

    /// Decode a request from a frame body, as the MCU would.
    pub fn decode(body: &[u8]) -> Result<Self, ProtocolError> {
        let (&code, data) = body.split_first().ok_or(ProtocolError::EmptyFrame)?;
        let flag = || {
            data.first()
                .map(|b| *b != 0)
                .ok_or_else(|| ProtocolError::InvalidRequest(format!("0x{:02X} needs a flag byte", code)))
        };

        let request = match code {
            CMD_START => McuRequest::Start,
            CMD_STOP => McuRequest::Stop,
            CMD_REQUEST_ID => McuRequest::RequestId,
            CMD_SET_DIMMER_ANALOG => McuRequest::SetDimmerAnalog,
            CMD_SET_DIMMER_DIGITAL => McuRequest::SetDimmerDigital,
            CMD_AUDIO_SOURCE_HD => McuRequest::AudioSourceHd,
            CMD_AUDIO_SOURCE_AUX => McuRequest::AudioSourceAux,
            CMD_RADIO_REQUEST_STATUS => McuRequest::RadioRequestStatus,
            CMD_RADIO_SEND_PACKET => McuRequest::RadioSendPacket(data.to_vec()),
            CMD_RADIO_SET_DTR => McuRequest::RadioSetDtr(flag()?),
            CMD_RADIO_SET_RTS => McuRequest::RadioSetRts(flag()?),
            CMD_CUSTOM => {
                let (&sub, rest) = data.split_first().ok_or_else(|| {
                    ProtocolError::InvalidRequest("custom request without sub-command".to_string())
                })?;
                McuRequest::Custom {
                    code: sub,
                    data: rest.to_vec(),
                }
            }
            other => return Err(ProtocolError::UnknownCommandCode(other)),
        };
        Ok(request)
    }

    /// Largest radio packet that fits in a single `RADIO_SEND_PACKET` frame.
    pub const MAX_RADIO_PACKET: usize = MAX_BODY_LEN - 1;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_requests_have_no_payload() {
        assert_eq!(McuRequest::Start.encode().unwrap(), vec![0xF1, 0x01, 0x01, 0x02]);
        assert_eq!(McuRequest::Stop.encode().unwrap(), vec![0xF1, 0x01, 0x02, 0x03]);
        assert_eq!(
            McuRequest::RadioRequestStatus.encode_body(),
            vec![CMD_RADIO_REQUEST_STATUS]
        );
    }

    #[test]
    fn test_line_control_carries_one_byte() {
        assert_eq!(McuRequest::RadioSetDtr(true).encode_body(), vec![0x0A, 0x01]);
        assert_eq!(McuRequest::RadioSetRts(false).encode_body(), vec![0x0B, 0x00]);
    }

    #[test]
    fn test_custom_carries_sub_code() {
        let request = McuRequest::Custom {
            code: 0x7E,
            data: vec![0xF1, 0x02],
        };
        assert_eq!(request.encode_body(), vec![0x0C, 0x7E, 0xF1, 0x02]);
        let wire = request.encode().unwrap();
        // F1 in the data is escaped on the wire
        assert_eq!(&wire[..5], &[0xF1, 0x04, 0x0C, 0x7E, 0x1A]);
    }

    #[test]
    fn test_radio_packet_is_opaque() {
        let packet = vec![0xA4, 0x04, 0x01, 0x00, 0x00, 0x00, 0xA9];
        let body = McuRequest::RadioSendPacket(packet.clone()).encode_body();
        assert_eq!(body[0], CMD_RADIO_SEND_PACKET);
        assert_eq!(&body[1..], &packet[..]);
    }

    #[test]
    fn test_oversized_packet_rejected() {
        let packet = vec![0u8; McuRequest::MAX_RADIO_PACKET + 1];
        assert!(McuRequest::RadioSendPacket(packet).encode().is_err());
        let packet = vec![0u8; McuRequest::MAX_RADIO_PACKET];
        assert!(McuRequest::RadioSendPacket(packet).encode().is_ok());
    }

    #[test]
    fn test_decode_matches_encode() {
        let requests = [
            McuRequest::Start,
            McuRequest::SetDimmerDigital,
            McuRequest::AudioSourceAux,
            McuRequest::RadioSetDtr(true),
            McuRequest::RadioSendPacket(vec![1, 2, 3]),
            McuRequest::Custom {
                code: 1,
                data: vec![],
            },
        ];
        for request in requests {
            assert_eq!(McuRequest::decode(&request.encode_body()), Ok(request));
        }
        assert_eq!(
            McuRequest::decode(&[0x55]),
            Err(ProtocolError::UnknownCommandCode(0x55))
        );
    }
}
