//! Typed values carried after the command byte.

use std::fmt;

use crate::{McuCommand, ProtocolError, ValueKind};

/// A decoded MCU value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum McuValue {
    /// No value.
    None,
    /// 16-bit integer (exactly two payload bytes).
    Short(i16),
    /// 32-bit integer (four or more payload bytes).
    Int(i32),
    /// Text.
    Str(String),
    /// On/off flag.
    Bool(bool),
    /// Opaque bytes.
    Bytes(Vec<u8>),
}

impl McuValue {
    /// Decode `data` as the value of `command`.
    ///
    /// Integer width is decided by how many bytes are available: exactly two
    /// give a [`McuValue::Short`], four or more give a [`McuValue::Int`] from
    /// the first four, anything else is rejected.
    pub fn decode(command: McuCommand, data: &[u8]) -> Result<McuValue, ProtocolError> {
        let kind = command.kind();
        let mismatch = || ProtocolError::ValueKindMismatch {
            command,
            kind,
            len: data.len(),
        };

        match kind {
            ValueKind::None => Ok(McuValue::None),
            ValueKind::ShortInt | ValueKind::Int => match data.len() {
                2 => Ok(McuValue::Short(i16::from_le_bytes([data[0], data[1]]))),
                n if n >= 4 => Ok(McuValue::Int(i32::from_le_bytes([
                    data[0], data[1], data[2], data[3],
                ]))),
                _ => Err(mismatch()),
            },
            ValueKind::String => Ok(McuValue::Str(String::from_utf8_lossy(data).into_owned())),
            ValueKind::Boolean => match data.first() {
                Some(byte) => Ok(McuValue::Bool(*byte != 0)),
                None => Err(mismatch()),
            },
            ValueKind::ByteArray => Ok(McuValue::Bytes(data.to_vec())),
        }
    }

    /// Append the wire form of this value to `out`.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        match self {
            McuValue::None => {}
            McuValue::Short(v) => out.extend_from_slice(&v.to_le_bytes()),
            McuValue::Int(v) => out.extend_from_slice(&v.to_le_bytes()),
            McuValue::Str(s) => out.extend_from_slice(s.as_bytes()),
            McuValue::Bool(b) => out.push(u8::from(*b)),
            McuValue::Bytes(bytes) => out.extend_from_slice(bytes),
        }
    }

    /// Integer value, widened to 32 bits.
    pub fn as_int(&self) -> Option<i32> {
        match self {
            McuValue::Short(v) => Some(i32::from(*v)),
            McuValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            McuValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            McuValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            McuValue::Bytes(b) => Some(b),
            _ => None,
        }
    }
}

impl fmt::Display for McuValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            McuValue::None => f.write_str("-"),
            McuValue::Short(v) => write!(f, "{}", v),
            McuValue::Int(v) => write!(f, "{}", v),
            McuValue::Str(s) => write!(f, "{:?}", s),
            McuValue::Bool(b) => write!(f, "{}", b),
            McuValue::Bytes(bytes) => {
                for byte in bytes {
                    write!(f, "{:02X}", byte)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_width_from_length() {
        assert_eq!(
            McuValue::decode(McuCommand::Click, &[0x2C, 0x01]),
            Ok(McuValue::Short(300))
        );
        assert_eq!(
            McuValue::decode(McuCommand::Click, &[0xA0, 0x86, 0x01, 0x00]),
            Ok(McuValue::Int(100_000))
        );
        // extra bytes after the first four are ignored
        assert_eq!(
            McuValue::decode(McuCommand::Click, &[0x01, 0x00, 0x00, 0x00, 0xFF]),
            Ok(McuValue::Int(1))
        );
    }

    #[test]
    fn test_integer_odd_lengths_rejected() {
        for len in [0usize, 1, 3] {
            let data = vec![0u8; len];
            assert_eq!(
                McuValue::decode(McuCommand::Hold, &data),
                Err(ProtocolError::ValueKindMismatch {
                    command: McuCommand::Hold,
                    kind: ValueKind::ShortInt,
                    len,
                })
            );
        }
    }

    #[test]
    fn test_negative_short() {
        assert_eq!(
            McuValue::decode(McuCommand::DimmerLevel, &[0xFF, 0xFF]),
            Ok(McuValue::Short(-1))
        );
    }

    #[test]
    fn test_empty_string_is_valid() {
        assert_eq!(
            McuValue::decode(McuCommand::Log, &[]),
            Ok(McuValue::Str(String::new()))
        );
    }

    #[test]
    fn test_empty_boolean_is_error() {
        assert!(McuValue::decode(McuCommand::Dimmer, &[]).is_err());
        assert_eq!(
            McuValue::decode(McuCommand::Dimmer, &[0x02]),
            Ok(McuValue::Bool(true))
        );
        assert_eq!(
            McuValue::decode(McuCommand::Reverse, &[0x00]),
            Ok(McuValue::Bool(false))
        );
    }

    #[test]
    fn test_string_takes_all_bytes() {
        assert_eq!(
            McuValue::decode(McuCommand::Started, b"mcu-1.2\0x"),
            Ok(McuValue::Str("mcu-1.2\0x".to_string()))
        );
    }

    #[test]
    fn test_accessors() {
        assert_eq!(McuValue::Short(-3).as_int(), Some(-3));
        assert_eq!(McuValue::Int(70_000).as_int(), Some(70_000));
        assert_eq!(McuValue::Bool(true).as_int(), None);
        assert_eq!(McuValue::Str("x".into()).as_str(), Some("x"));
        assert_eq!(McuValue::Bytes(vec![1]).as_bytes(), Some(&[1u8][..]));
    }
}
