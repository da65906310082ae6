//! The radio command catalog.

use std::fmt;

use crate::constants::*;

/// Shape of the data a radio command carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RadioKind {
    None,
    Int,
    Boolean,
    String,
    /// Band word followed by a frequency word.
    TuneInfo,
    /// Subchannel word followed by description text.
    SongInfo,
}

impl fmt::Display for RadioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RadioKind::None => "none",
            RadioKind::Int => "int",
            RadioKind::Boolean => "boolean",
            RadioKind::String => "string",
            RadioKind::TuneInfo => "tune-info",
            RadioKind::SongInfo => "song-info",
        };
        f.write_str(name)
    }
}

/// Keys understood by the radio module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RadioCommand {
    Power,
    Mute,
    SignalStrength,
    Tune,
    Seek,
    HdActive,
    HdStreamLock,
    HdSignalStrength,
    HdSubchannel,
    HdSubchannelCount,
    HdTunerEnabled,
    HdTitle,
    HdArtist,
    HdCallsign,
    HdStationName,
    HdUniqueId,
    HdApiVersion,
    HdHwVersion,
    RdsEnabled,
    RdsGenre,
    RdsProgramService,
    RdsRadioText,
    Volume,
    Bass,
    Treble,
    Compression,
    /// A code this host does not know.
    Unknown(u16),
}

impl RadioCommand {
    /// Every known command.
    pub const ALL: [RadioCommand; 26] = [
        RadioCommand::Power,
        RadioCommand::Mute,
        RadioCommand::SignalStrength,
        RadioCommand::Tune,
        RadioCommand::Seek,
        RadioCommand::HdActive,
        RadioCommand::HdStreamLock,
        RadioCommand::HdSignalStrength,
        RadioCommand::HdSubchannel,
        RadioCommand::HdSubchannelCount,
        RadioCommand::HdTunerEnabled,
        RadioCommand::HdTitle,
        RadioCommand::HdArtist,
        RadioCommand::HdCallsign,
        RadioCommand::HdStationName,
        RadioCommand::HdUniqueId,
        RadioCommand::HdApiVersion,
        RadioCommand::HdHwVersion,
        RadioCommand::RdsEnabled,
        RadioCommand::RdsGenre,
        RadioCommand::RdsProgramService,
        RadioCommand::RdsRadioText,
        RadioCommand::Volume,
        RadioCommand::Bass,
        RadioCommand::Treble,
        RadioCommand::Compression,
    ];

    /// Look up a command by its wire code.
    pub fn from_code(code: u16) -> Self {
        Self::ALL
            .iter()
            .copied()
            .find(|command| command.code() == code)
            .unwrap_or(RadioCommand::Unknown(code))
    }

    /// Wire code, sent little-endian as `[lo, hi]`.
    pub fn code(&self) -> u16 {
        let [lo, hi] = match self {
            RadioCommand::Power => [0x01, 0x00],
            RadioCommand::Mute => [0x02, 0x00],
            RadioCommand::SignalStrength => [0x01, 0x01],
            RadioCommand::Tune => [0x02, 0x01],
            RadioCommand::Seek => [0x03, 0x01],
            RadioCommand::HdActive => [0x01, 0x02],
            RadioCommand::HdStreamLock => [0x02, 0x02],
            RadioCommand::HdSignalStrength => [0x03, 0x02],
            RadioCommand::HdSubchannel => [0x04, 0x02],
            RadioCommand::HdSubchannelCount => [0x05, 0x02],
            RadioCommand::HdTunerEnabled => [0x06, 0x02],
            RadioCommand::HdTitle => [0x07, 0x02],
            RadioCommand::HdArtist => [0x08, 0x02],
            RadioCommand::HdCallsign => [0x09, 0x02],
            RadioCommand::HdStationName => [0x10, 0x02],
            RadioCommand::HdUniqueId => [0x11, 0x02],
            RadioCommand::HdApiVersion => [0x12, 0x02],
            RadioCommand::HdHwVersion => [0x13, 0x02],
            RadioCommand::RdsEnabled => [0x01, 0x03],
            RadioCommand::RdsGenre => [0x07, 0x03],
            RadioCommand::RdsProgramService => [0x08, 0x03],
            RadioCommand::RdsRadioText => [0x09, 0x03],
            RadioCommand::Volume => [0x03, 0x04],
            RadioCommand::Bass => [0x04, 0x04],
            RadioCommand::Treble => [0x05, 0x04],
            RadioCommand::Compression => [0x06, 0x04],
            RadioCommand::Unknown(code) => return *code,
        };
        u16::from_le_bytes([lo, hi])
    }

    /// Declared data kind.
    pub fn kind(&self) -> RadioKind {
        match self {
            RadioCommand::Power
            | RadioCommand::Mute
            | RadioCommand::HdActive
            | RadioCommand::HdStreamLock
            | RadioCommand::HdTunerEnabled
            | RadioCommand::RdsEnabled => RadioKind::Boolean,
            RadioCommand::SignalStrength
            | RadioCommand::HdSignalStrength
            | RadioCommand::HdSubchannel
            | RadioCommand::HdSubchannelCount
            | RadioCommand::Volume
            | RadioCommand::Bass
            | RadioCommand::Treble
            | RadioCommand::Compression => RadioKind::Int,
            RadioCommand::HdCallsign
            | RadioCommand::HdStationName
            | RadioCommand::HdUniqueId
            | RadioCommand::HdApiVersion
            | RadioCommand::HdHwVersion
            | RadioCommand::RdsGenre
            | RadioCommand::RdsProgramService
            | RadioCommand::RdsRadioText => RadioKind::String,
            RadioCommand::Tune => RadioKind::TuneInfo,
            RadioCommand::HdTitle | RadioCommand::HdArtist => RadioKind::SongInfo,
            RadioCommand::Seek | RadioCommand::Unknown(_) => RadioKind::None,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, RadioCommand::Unknown(_))
    }

    /// Snake-case key name, used in logs and configuration.
    pub fn name(&self) -> &'static str {
        match self {
            RadioCommand::Power => "power",
            RadioCommand::Mute => "mute",
            RadioCommand::SignalStrength => "signal_strength",
            RadioCommand::Tune => "tune",
            RadioCommand::Seek => "seek",
            RadioCommand::HdActive => "hd_active",
            RadioCommand::HdStreamLock => "hd_stream_lock",
            RadioCommand::HdSignalStrength => "hd_signal_strength",
            RadioCommand::HdSubchannel => "hd_subchannel",
            RadioCommand::HdSubchannelCount => "hd_subchannel_count",
            RadioCommand::HdTunerEnabled => "hd_enable_hd_tuner",
            RadioCommand::HdTitle => "hd_title",
            RadioCommand::HdArtist => "hd_artist",
            RadioCommand::HdCallsign => "hd_callsign",
            RadioCommand::HdStationName => "hd_station_name",
            RadioCommand::HdUniqueId => "hd_unique_id",
            RadioCommand::HdApiVersion => "hd_api_version",
            RadioCommand::HdHwVersion => "hd_hw_version",
            RadioCommand::RdsEnabled => "rds_enabled",
            RadioCommand::RdsGenre => "rds_genre",
            RadioCommand::RdsProgramService => "rds_program_service",
            RadioCommand::RdsRadioText => "rds_radio_text",
            RadioCommand::Volume => "volume",
            RadioCommand::Bass => "bass",
            RadioCommand::Treble => "treble",
            RadioCommand::Compression => "compression",
            RadioCommand::Unknown(_) => "unknown",
        }
    }

    /// Look up a command by its key name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|command| command.name() == name)
    }
}

impl fmt::Display for RadioCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RadioCommand::Unknown(code) => write!(f, "unknown(0x{:04X})", code),
            other => f.write_str(other.name()),
        }
    }
}

/// What a radio packet asks for or reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RadioOperation {
    Get,
    Set,
    Reply,
}

impl RadioOperation {
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            OP_GET => Some(RadioOperation::Get),
            OP_SET => Some(RadioOperation::Set),
            OP_REPLY => Some(RadioOperation::Reply),
            _ => None,
        }
    }

    pub fn code(&self) -> u16 {
        match self {
            RadioOperation::Get => OP_GET,
            RadioOperation::Set => OP_SET,
            RadioOperation::Reply => OP_REPLY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_codes_are_unique() {
        let codes: HashSet<u16> = RadioCommand::ALL.iter().map(|c| c.code()).collect();
        assert_eq!(codes.len(), RadioCommand::ALL.len());
    }

    #[test]
    fn test_code_is_little_endian() {
        assert_eq!(RadioCommand::Tune.code(), 0x0102);
        assert_eq!(RadioCommand::HdStationName.code(), 0x0210);
        assert_eq!(RadioCommand::Volume.code().to_le_bytes(), [0x03, 0x04]);
    }

    #[test]
    fn test_lookup_is_total() {
        for command in RadioCommand::ALL {
            assert_eq!(RadioCommand::from_code(command.code()), command);
            assert_eq!(RadioCommand::from_name(command.name()), Some(command));
        }
        assert_eq!(RadioCommand::from_code(0xBEEF), RadioCommand::Unknown(0xBEEF));
        assert_eq!(RadioCommand::Unknown(0xBEEF).code(), 0xBEEF);
    }

    #[test]
    fn test_kinds() {
        assert_eq!(RadioCommand::Power.kind(), RadioKind::Boolean);
        assert_eq!(RadioCommand::Tune.kind(), RadioKind::TuneInfo);
        assert_eq!(RadioCommand::HdArtist.kind(), RadioKind::SongInfo);
        assert_eq!(RadioCommand::RdsRadioText.kind(), RadioKind::String);
        assert_eq!(RadioCommand::Treble.kind(), RadioKind::Int);
        assert_eq!(RadioCommand::Seek.kind(), RadioKind::None);
    }

    #[test]
    fn test_operations() {
        assert_eq!(RadioOperation::from_code(0x0002), Some(RadioOperation::Reply));
        assert_eq!(RadioOperation::from_code(0x0003), None);
        assert_eq!(RadioOperation::Set.code(), 0x0001);
    }
}
