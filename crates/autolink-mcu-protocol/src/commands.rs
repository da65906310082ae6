//! The closed catalog of MCU events.

use std::fmt;

use crate::constants::*;

/// Shape of the value that follows a command byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// No value.
    None,
    /// 16-bit integer, or 32-bit when four or more bytes follow.
    ShortInt,
    /// 32-bit integer, or 16-bit when exactly two bytes follow.
    Int,
    /// All remaining bytes as text, no terminator.
    String,
    /// A single byte, non-zero meaning true.
    Boolean,
    /// All remaining bytes, uninterpreted.
    ByteArray,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::None => "none",
            ValueKind::ShortInt => "short-int",
            ValueKind::Int => "int",
            ValueKind::String => "string",
            ValueKind::Boolean => "boolean",
            ValueKind::ByteArray => "byte-array",
        };
        f.write_str(name)
    }
}

/// Events the MCU can send.
///
/// Codes outside the catalog map to [`McuCommand::Unknown`] so a newer
/// firmware never stalls an older host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum McuCommand {
    None,
    Started,
    Ident,
    Click,
    Hold,
    Release,
    Dimmer,
    DimmerLevel,
    Reverse,
    RadioStatus,
    RadioData,
    Log,
    Custom,
    /// A code this host does not know.
    Unknown(u8),
}

impl McuCommand {
    /// Every known event, in wire-code order.
    pub const ALL: [McuCommand; 13] = [
        McuCommand::None,
        McuCommand::Started,
        McuCommand::Ident,
        McuCommand::Click,
        McuCommand::Hold,
        McuCommand::Release,
        McuCommand::Dimmer,
        McuCommand::DimmerLevel,
        McuCommand::Reverse,
        McuCommand::RadioStatus,
        McuCommand::RadioData,
        McuCommand::Log,
        McuCommand::Custom,
    ];

    /// Look up an event by wire code.
    pub fn from_code(code: u8) -> Self {
        match code {
            EVT_NONE => McuCommand::None,
            EVT_STARTED => McuCommand::Started,
            EVT_IDENT => McuCommand::Ident,
            EVT_CLICK => McuCommand::Click,
            EVT_HOLD => McuCommand::Hold,
            EVT_RELEASE => McuCommand::Release,
            EVT_DIMMER => McuCommand::Dimmer,
            EVT_DIMMER_LEVEL => McuCommand::DimmerLevel,
            EVT_REVERSE => McuCommand::Reverse,
            EVT_RADIO_STATUS => McuCommand::RadioStatus,
            EVT_RADIO_DATA => McuCommand::RadioData,
            EVT_LOG => McuCommand::Log,
            EVT_CUSTOM => McuCommand::Custom,
            other => McuCommand::Unknown(other),
        }
    }

    /// Wire code of this event.
    pub fn code(&self) -> u8 {
        match self {
            McuCommand::None => EVT_NONE,
            McuCommand::Started => EVT_STARTED,
            McuCommand::Ident => EVT_IDENT,
            McuCommand::Click => EVT_CLICK,
            McuCommand::Hold => EVT_HOLD,
            McuCommand::Release => EVT_RELEASE,
            McuCommand::Dimmer => EVT_DIMMER,
            McuCommand::DimmerLevel => EVT_DIMMER_LEVEL,
            McuCommand::Reverse => EVT_REVERSE,
            McuCommand::RadioStatus => EVT_RADIO_STATUS,
            McuCommand::RadioData => EVT_RADIO_DATA,
            McuCommand::Log => EVT_LOG,
            McuCommand::Custom => EVT_CUSTOM,
            McuCommand::Unknown(code) => *code,
        }
    }

    /// Declared value kind of this event.
    pub fn kind(&self) -> ValueKind {
        match self {
            McuCommand::None | McuCommand::Unknown(_) => ValueKind::None,
            McuCommand::Started | McuCommand::Ident | McuCommand::Log => ValueKind::String,
            McuCommand::Click
            | McuCommand::Hold
            | McuCommand::Release
            | McuCommand::DimmerLevel => ValueKind::ShortInt,
            McuCommand::Dimmer | McuCommand::Reverse | McuCommand::RadioStatus => {
                ValueKind::Boolean
            }
            McuCommand::RadioData | McuCommand::Custom => ValueKind::ByteArray,
        }
    }

    /// Whether this code is part of the catalog.
    pub fn is_known(&self) -> bool {
        !matches!(self, McuCommand::Unknown(_))
    }

    /// Upper-case catalog name, used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            McuCommand::None => "NONE",
            McuCommand::Started => "STARTED",
            McuCommand::Ident => "IDENT",
            McuCommand::Click => "CLICK",
            McuCommand::Hold => "HOLD",
            McuCommand::Release => "RELEASE",
            McuCommand::Dimmer => "DIMMER",
            McuCommand::DimmerLevel => "DIMMER_LEVEL",
            McuCommand::Reverse => "REVERSE",
            McuCommand::RadioStatus => "RADIO_STATUS",
            McuCommand::RadioData => "RADIO_DATA",
            McuCommand::Log => "LOG",
            McuCommand::Custom => "CUSTOM",
            McuCommand::Unknown(_) => "UNKNOWN",
        }
    }
}

impl fmt::Display for McuCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            McuCommand::Unknown(code) => write!(f, "UNKNOWN(0x{:02X})", code),
            other => f.write_str(other.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_lookup_is_total() {
        for code in 0..=u8::MAX {
            assert_eq!(McuCommand::from_code(code).code(), code);
        }
    }

    #[test]
    fn test_catalog_codes_are_sequential() {
        for (index, command) in McuCommand::ALL.iter().enumerate() {
            assert_eq!(command.code() as usize, index);
            assert!(command.is_known());
        }
        assert!(!McuCommand::from_code(0x0D).is_known());
    }

    #[test]
    fn test_declared_kinds() {
        assert_eq!(McuCommand::Started.kind(), ValueKind::String);
        assert_eq!(McuCommand::Click.kind(), ValueKind::ShortInt);
        assert_eq!(McuCommand::DimmerLevel.kind(), ValueKind::ShortInt);
        assert_eq!(McuCommand::Reverse.kind(), ValueKind::Boolean);
        assert_eq!(McuCommand::RadioData.kind(), ValueKind::ByteArray);
        assert_eq!(McuCommand::Custom.kind(), ValueKind::ByteArray);
        assert_eq!(McuCommand::None.kind(), ValueKind::None);
    }

    #[test]
    fn test_display() {
        assert_eq!(McuCommand::DimmerLevel.to_string(), "DIMMER_LEVEL");
        assert_eq!(McuCommand::Unknown(0x7F).to_string(), "UNKNOWN(0x7F)");
    }
}
