//! Typed radio values.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::{RadioCommand, RadioError, RadioKind};

/// Broadcast band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Band {
    Am,
    Fm,
}

impl Band {
    pub fn from_word(word: i32) -> Result<Self, RadioError> {
        match word {
            0 => Ok(Band::Am),
            1 => Ok(Band::Fm),
            other => Err(RadioError::InvalidBand(other)),
        }
    }

    pub fn word(&self) -> i32 {
        match self {
            Band::Am => 0,
            Band::Fm => 1,
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Band::Am => f.write_str("AM"),
            Band::Fm => f.write_str("FM"),
        }
    }
}

/// A tuned station.
///
/// FM frequencies are in tenths of a MHz (`879` is 87.9 MHz), AM in kHz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TuneInfo {
    pub band: Band,
    pub frequency: i32,
}

impl Default for TuneInfo {
    fn default() -> Self {
        TuneInfo {
            band: Band::Fm,
            frequency: 879,
        }
    }
}

impl fmt::Display for TuneInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.band {
            Band::Fm => write!(f, "FM {}.{}", self.frequency / 10, self.frequency % 10),
            Band::Am => write!(f, "AM {}", self.frequency),
        }
    }
}

/// Title or artist text for one HD subchannel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongInfo {
    pub subchannel: i32,
    pub description: String,
}

/// A value held by the radio for one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RadioValue {
    None,
    Int(i32),
    Bool(bool),
    Str(String),
    Tune(TuneInfo),
    Song(SongInfo),
}

fn word(data: &[u8], offset: usize) -> Option<i32> {
    data.get(offset..offset + 4)
        .map(|w| i32::from_le_bytes([w[0], w[1], w[2], w[3]]))
}

impl RadioValue {
    /// Decode the data of a reply to `command`.
    ///
    /// Returns `Ok(None)` for replies that carry no usable data, such as song
    /// info for subchannel `-1`.
    pub fn decode(command: RadioCommand, data: &[u8]) -> Result<Option<RadioValue>, RadioError> {
        let kind = command.kind();
        let short = |needed: usize| RadioError::ValueKindMismatch {
            command,
            kind,
            detail: format!("{} bytes, need {}", data.len(), needed),
        };

        let value = match kind {
            RadioKind::None => RadioValue::None,
            RadioKind::Int => RadioValue::Int(word(data, 0).ok_or_else(|| short(4))?),
            RadioKind::Boolean => match word(data, 0).ok_or_else(|| short(4))? {
                0 => RadioValue::Bool(false),
                1 => RadioValue::Bool(true),
                other => return Err(RadioError::InvalidBoolean(other)),
            },
            RadioKind::String => {
                let text = data.get(STRING_PREFIX_LEN..).ok_or_else(|| short(STRING_PREFIX_LEN))?;
                RadioValue::Str(String::from_utf8_lossy(text).into_owned())
            }
            RadioKind::TuneInfo => {
                let band = word(data, 0).ok_or_else(|| short(8))?;
                let frequency = word(data, 4).ok_or_else(|| short(8))?;
                RadioValue::Tune(TuneInfo {
                    band: Band::from_word(band)?,
                    frequency,
                })
            }
            RadioKind::SongInfo => {
                let subchannel = word(data, 0).ok_or_else(|| short(4))?;
                if subchannel == -1 {
                    return Ok(None);
                }
                RadioValue::Song(SongInfo {
                    subchannel,
                    description: String::from_utf8_lossy(&data[4..]).into_owned(),
                })
            }
        };
        Ok(Some(value))
    }

    /// Append the reply-data form of this value, as the radio sends it.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        match self {
            RadioValue::None => {}
            RadioValue::Int(v) => out.extend_from_slice(&v.to_le_bytes()),
            RadioValue::Bool(b) => out.extend_from_slice(if *b { &WORD_ONE } else { &WORD_ZERO }),
            RadioValue::Str(s) => {
                out.extend_from_slice(&WORD_ZERO);
                out.extend_from_slice(s.as_bytes());
            }
            RadioValue::Tune(tune) => {
                out.extend_from_slice(&tune.band.word().to_le_bytes());
                out.extend_from_slice(&tune.frequency.to_le_bytes());
            }
            RadioValue::Song(song) => {
                out.extend_from_slice(&song.subchannel.to_le_bytes());
                out.extend_from_slice(song.description.as_bytes());
            }
        }
    }

    /// Kind this value belongs to.
    pub fn kind(&self) -> RadioKind {
        match self {
            RadioValue::None => RadioKind::None,
            RadioValue::Int(_) => RadioKind::Int,
            RadioValue::Bool(_) => RadioKind::Boolean,
            RadioValue::Str(_) => RadioKind::String,
            RadioValue::Tune(_) => RadioKind::TuneInfo,
            RadioValue::Song(_) => RadioKind::SongInfo,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            RadioValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            RadioValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            RadioValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_tune(&self) -> Option<TuneInfo> {
        match self {
            RadioValue::Tune(t) => Some(*t),
            _ => None,
        }
    }
}

impl fmt::Display for RadioValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RadioValue::None => f.write_str("-"),
            RadioValue::Int(v) => write!(f, "{}", v),
            RadioValue::Bool(b) => write!(f, "{}", b),
            RadioValue::Str(s) => write!(f, "{:?}", s),
            RadioValue::Tune(t) => write!(f, "{}", t),
            RadioValue::Song(s) => write!(f, "[{}] {:?}", s.subchannel, s.description),
        }
    }
}
