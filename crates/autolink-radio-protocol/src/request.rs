//! Requests sent to the radio module.

use autolink_frame::FrameFormat;
use log::trace;

use crate::constants::*;
use crate::{RadioCommand, RadioError, RadioKind, RadioOperation, RadioValue};

/// Step direction for tune and seek.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    fn word(&self) -> [u8; 4] {
        match self {
            Direction::Up => WORD_UP,
            Direction::Down => WORD_DOWN,
        }
    }
}

/// Which stations a seek may stop on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekMode {
    All,
    HdOnly,
}

impl SeekMode {
    pub fn from_seek_all(seek_all: bool) -> Self {
        if seek_all {
            SeekMode::All
        } else {
            SeekMode::HdOnly
        }
    }

    fn word(&self) -> [u8; 4] {
        match self {
            SeekMode::All => WORD_SEEK_ALL,
            SeekMode::HdOnly => WORD_SEEK_HD_ONLY,
        }
    }
}

/// A request for the radio module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RadioRequest {
    /// Ask the radio to report a key.
    Get(RadioCommand),
    /// Write a key. Only power, mute, levels, subchannel and tune are writable.
    Set(RadioCommand, RadioValue),
    /// Step the tuner one channel.
    TuneStep(Direction),
    /// Seek to the next station.
    Seek {
        direction: Direction,
        mode: SeekMode,
    },
}

impl RadioRequest {
    /// Build the frame body: command and operation header plus data.
    ///
    /// Values of the wrong kind are rejected, never coerced. Integer levels
    /// are clamped to `[LEVEL_MIN, LEVEL_MAX]`.
    pub fn encode_body(&self) -> Result<Vec<u8>, RadioError> {
        let mut body = Vec::with_capacity(HEADER_LEN + 16);
        match self {
            RadioRequest::Get(command) => {
                if !command.is_known() {
                    return Err(RadioError::UnknownCommandCode(command.code()));
                }
                put_header(&mut body, *command, RadioOperation::Get);
            }
            RadioRequest::Set(command, value) => {
                put_header(&mut body, *command, RadioOperation::Set);
                encode_set_value(&mut body, *command, value)?;
            }
            RadioRequest::TuneStep(direction) => {
                put_header(&mut body, RadioCommand::Tune, RadioOperation::Set);
                body.extend_from_slice(&WORD_ZERO);
                body.extend_from_slice(&WORD_ZERO);
                body.extend_from_slice(&direction.word());
            }
            RadioRequest::Seek { direction, mode } => {
                put_header(&mut body, RadioCommand::Seek, RadioOperation::Set);
                body.extend_from_slice(&WORD_SEEK_ID);
                body.extend_from_slice(&WORD_ZERO);
                body.extend_from_slice(&direction.word());
                body.extend_from_slice(&mode.word());
            }
        }
        Ok(body)
    }

    /// Build the complete radio frame.
    pub fn encode(&self) -> Result<Vec<u8>, RadioError> {
        let body = self.encode_body()?;
        trace!("radio tx {:?}", self);
        Ok(FrameFormat::RADIO.encode(&body)?)
    }
}

fn put_header(body: &mut Vec<u8>, command: RadioCommand, operation: RadioOperation) {
    body.extend_from_slice(&command.code().to_le_bytes());
    body.extend_from_slice(&operation.code().to_le_bytes());
}

fn encode_set_value(
    body: &mut Vec<u8>,
    command: RadioCommand,
    value: &RadioValue,
) -> Result<(), RadioError> {
    let writable = matches!(
        command,
        RadioCommand::Power
            | RadioCommand::Mute
            | RadioCommand::Volume
            | RadioCommand::Bass
            | RadioCommand::Treble
            | RadioCommand::Compression
            | RadioCommand::HdSubchannel
            | RadioCommand::Tune
    );
    if !writable {
        return Err(RadioError::UnsupportedRequest(format!("set {}", command)));
    }

    let kind = command.kind();
    match (kind, value) {
        (RadioKind::Boolean, RadioValue::Bool(on)) => {
            body.extend_from_slice(if *on { &WORD_ONE } else { &WORD_ZERO });
        }
        (RadioKind::Int, RadioValue::Int(level)) => {
            let level = (*level).clamp(LEVEL_MIN, LEVEL_MAX);
            body.extend_from_slice(&level.to_le_bytes());
        }
        (RadioKind::TuneInfo, RadioValue::Tune(tune)) => {
            body.extend_from_slice(&tune.band.word().to_le_bytes());
            body.extend_from_slice(&tune.frequency.to_le_bytes());
        }
        (kind, other) => {
            return Err(RadioError::ValueKindMismatch {
                command,
                kind,
                detail: format!("{} value", other.kind()),
            })
        }
    }
    Ok(())
}
