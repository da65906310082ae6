//! Latest known value of every radio key.

use std::collections::HashMap;

use log::{debug, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::{RadioCommand, RadioError, RadioKind, RadioUpdate, RadioValue, TuneInfo};

/// The user-durable subset of the store, persisted between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadioSnapshot {
    pub tune: TuneInfo,
    pub subchannel: i32,
    pub volume: i32,
    pub bass: i32,
    pub treble: i32,
    pub seek_all: bool,
}

impl Default for RadioSnapshot {
    fn default() -> Self {
        RadioSnapshot {
            tune: TuneInfo::default(),
            subchannel: 0,
            volume: 50,
            bass: 15,
            treble: 15,
            seek_all: true,
        }
    }
}

#[derive(Debug, Default)]
struct StoreInner {
    values: HashMap<RadioCommand, RadioValue>,
    titles: HashMap<i32, String>,
    artists: HashMap<i32, String>,
    seek_all: bool,
}

impl StoreInner {
    fn from_snapshot(snapshot: &RadioSnapshot) -> Self {
        let mut values = HashMap::with_capacity(RadioCommand::ALL.len());
        for command in RadioCommand::ALL {
            values.insert(command, default_value(command));
        }
        values.insert(RadioCommand::Tune, RadioValue::Tune(snapshot.tune));
        values.insert(RadioCommand::HdSubchannel, RadioValue::Int(snapshot.subchannel));
        values.insert(RadioCommand::Volume, RadioValue::Int(snapshot.volume));
        values.insert(RadioCommand::Bass, RadioValue::Int(snapshot.bass));
        values.insert(RadioCommand::Treble, RadioValue::Int(snapshot.treble));

        StoreInner {
            values,
            titles: HashMap::new(),
            artists: HashMap::new(),
            seek_all: snapshot.seek_all,
        }
    }

    fn history_entry(&self, command: RadioCommand, subchannel: i32) -> String {
        let history = match command {
            RadioCommand::HdTitle => &self.titles,
            _ => &self.artists,
        };
        history.get(&subchannel).cloned().unwrap_or_default()
    }
}

/// Value a key holds before the radio has reported it.
fn default_value(command: RadioCommand) -> RadioValue {
    match command {
        RadioCommand::Tune => RadioValue::Tune(TuneInfo::default()),
        RadioCommand::HdTunerEnabled => RadioValue::Bool(true),
        RadioCommand::Volume => RadioValue::Int(50),
        RadioCommand::Bass | RadioCommand::Treble => RadioValue::Int(15),
        RadioCommand::Seek | RadioCommand::Unknown(_) => RadioValue::None,
        other => match other.kind() {
            RadioKind::Boolean => RadioValue::Bool(false),
            RadioKind::Int => RadioValue::Int(0),
            _ => RadioValue::Str(String::new()),
        },
    }
}

/// Thread-safe table of radio key values.
///
/// All reads and writes go through one lock, so a write and its side effects
/// are observed together.
#[derive(Debug)]
pub struct RadioKeyStore {
    inner: Mutex<StoreInner>,
}

impl Default for RadioKeyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RadioKeyStore {
    /// Create a store holding the documented defaults.
    pub fn new() -> Self {
        Self::with_snapshot(&RadioSnapshot::default())
    }

    /// Create a store from a persisted snapshot.
    pub fn with_snapshot(snapshot: &RadioSnapshot) -> Self {
        RadioKeyStore {
            inner: Mutex::new(StoreInner::from_snapshot(snapshot)),
        }
    }

    /// Last value written for `command`, or its default.
    pub fn get(&self, command: RadioCommand) -> RadioValue {
        self.inner
            .lock()
            .values
            .get(&command)
            .cloned()
            .unwrap_or(RadioValue::None)
    }

    pub fn get_int(&self, command: RadioCommand) -> Option<i32> {
        self.get(command).as_int()
    }

    pub fn get_bool(&self, command: RadioCommand) -> Option<bool> {
        self.get(command).as_bool()
    }

    pub fn get_string(&self, command: RadioCommand) -> Option<String> {
        match self.get(command) {
            RadioValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Currently tuned station.
    pub fn tune(&self) -> TuneInfo {
        self.get(RadioCommand::Tune).as_tune().unwrap_or_default()
    }

    /// Store a value, applying the key's side effects first.
    ///
    /// - `tune` clears every subchannel-scoped key and the title/artist history.
    /// - `hd_subchannel` reloads title and artist for that subchannel.
    /// - `hd_title`/`hd_artist` take song info, record it in the history and
    ///   store the description.
    /// - `seek` is never stored.
    pub fn set(&self, command: RadioCommand, value: RadioValue) -> Result<(), RadioError> {
        let kind = command.kind();
        let accepted = match (kind, &value) {
            (_, _) if !command.is_known() => false,
            (RadioKind::None, _) => true,
            (RadioKind::SongInfo, RadioValue::Str(_)) => true,
            (kind, value) => value.kind() == kind,
        };
        if !accepted {
            return Err(RadioError::ValueKindMismatch {
                command,
                kind,
                detail: format!("{} value", value.kind()),
            });
        }

        let mut inner = self.inner.lock();
        let value = match (command, value) {
            (RadioCommand::Seek, _) => return Ok(()),
            (RadioCommand::Tune, value) => {
                for (key, reset) in [
                    (RadioCommand::HdSubchannel, RadioValue::Int(0)),
                    (RadioCommand::HdSubchannelCount, RadioValue::Int(0)),
                    (RadioCommand::HdActive, RadioValue::Bool(false)),
                    (RadioCommand::HdStreamLock, RadioValue::Bool(false)),
                    (RadioCommand::RdsEnabled, RadioValue::Bool(false)),
                    (RadioCommand::RdsGenre, RadioValue::Str(String::new())),
                    (RadioCommand::RdsProgramService, RadioValue::Str(String::new())),
                    (RadioCommand::RdsRadioText, RadioValue::Str(String::new())),
                    (RadioCommand::HdCallsign, RadioValue::Str(String::new())),
                    (RadioCommand::HdStationName, RadioValue::Str(String::new())),
                    (RadioCommand::HdTitle, RadioValue::Str(String::new())),
                    (RadioCommand::HdArtist, RadioValue::Str(String::new())),
                ] {
                    inner.values.insert(key, reset);
                }
                inner.titles.clear();
                inner.artists.clear();
                value
            }
            (RadioCommand::HdSubchannel, RadioValue::Int(index)) => {
                let title = inner.history_entry(RadioCommand::HdTitle, index);
                let artist = inner.history_entry(RadioCommand::HdArtist, index);
                inner.values.insert(RadioCommand::HdTitle, RadioValue::Str(title));
                inner.values.insert(RadioCommand::HdArtist, RadioValue::Str(artist));
                RadioValue::Int(index)
            }
            (RadioCommand::HdTitle, RadioValue::Song(song)) => {
                inner.titles.insert(song.subchannel, song.description.clone());
                RadioValue::Str(song.description)
            }
            (RadioCommand::HdArtist, RadioValue::Song(song)) => {
                inner.artists.insert(song.subchannel, song.description.clone());
                RadioValue::Str(song.description)
            }
            (_, value) => value,
        };

        debug!("radio store {} = {}", command, value);
        inner.values.insert(command, value);
        Ok(())
    }

    /// Apply a decoded reply, logging and dropping values that do not fit.
    pub fn apply(&self, update: RadioUpdate) {
        let command = update.command;
        if let Err(err) = self.set(command, update.value) {
            warn!("radio store: dropping update for {}: {}", command, err);
        }
    }

    pub fn seek_all(&self) -> bool {
        self.inner.lock().seek_all
    }

    pub fn set_seek_all(&self, seek_all: bool) {
        self.inner.lock().seek_all = seek_all;
    }

    /// Capture the user-durable fields.
    ///
    /// The subchannel is only kept while an HD station is active.
    pub fn snapshot(&self) -> RadioSnapshot {
        let inner = self.inner.lock();
        let int = |command: RadioCommand| {
            inner
                .values
                .get(&command)
                .and_then(RadioValue::as_int)
                .unwrap_or(0)
        };
        let hd_active = inner
            .values
            .get(&RadioCommand::HdActive)
            .and_then(RadioValue::as_bool)
            .unwrap_or(false);

        RadioSnapshot {
            tune: inner
                .values
                .get(&RadioCommand::Tune)
                .and_then(RadioValue::as_tune)
                .unwrap_or_default(),
            subchannel: if hd_active { int(RadioCommand::HdSubchannel) } else { 0 },
            volume: int(RadioCommand::Volume),
            bass: int(RadioCommand::Bass),
            treble: int(RadioCommand::Treble),
            seek_all: inner.seek_all,
        }
    }

    /// Reset every key to its default, then apply `snapshot`.
    pub fn restore(&self, snapshot: &RadioSnapshot) {
        *self.inner.lock() = StoreInner::from_snapshot(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Band, SongInfo};

    fn song(subchannel: i32, description: &str) -> RadioValue {
        RadioValue::Song(SongInfo {
            subchannel,
            description: description.to_string(),
        })
    }

    #[test]
    fn test_defaults() {
        let store = RadioKeyStore::new();
        assert_eq!(store.get_bool(RadioCommand::Power), Some(false));
        assert_eq!(store.get_bool(RadioCommand::HdTunerEnabled), Some(true));
        assert_eq!(store.get_int(RadioCommand::Volume), Some(50));
        assert_eq!(store.get_int(RadioCommand::Bass), Some(15));
        assert_eq!(store.get_int(RadioCommand::Treble), Some(15));
        assert_eq!(store.get_int(RadioCommand::Compression), Some(0));
        assert_eq!(store.get_string(RadioCommand::HdHwVersion), Some(String::new()));
        assert_eq!(store.tune(), TuneInfo::default());
        assert!(store.seek_all());
    }

    #[test]
    fn test_tune_resets_subchannel_scope() {
        let store = RadioKeyStore::new();
        store.set(RadioCommand::HdSubchannel, RadioValue::Int(2)).unwrap();
        store.set(RadioCommand::HdSubchannelCount, RadioValue::Int(3)).unwrap();
        store.set(RadioCommand::HdActive, RadioValue::Bool(true)).unwrap();
        store.set(RadioCommand::HdStreamLock, RadioValue::Bool(true)).unwrap();
        store.set(RadioCommand::RdsEnabled, RadioValue::Bool(true)).unwrap();
        store.set(RadioCommand::RdsRadioText, RadioValue::Str("text".into())).unwrap();
        store.set(RadioCommand::HdCallsign, RadioValue::Str("KABC".into())).unwrap();
        store.set(RadioCommand::HdTitle, song(2, "Title")).unwrap();
        store.set(RadioCommand::HdArtist, song(2, "Artist")).unwrap();
        store.set(RadioCommand::Volume, RadioValue::Int(30)).unwrap();

        let tune = TuneInfo {
            band: Band::Fm,
            frequency: 1011,
        };
        store.set(RadioCommand::Tune, RadioValue::Tune(tune)).unwrap();

        assert_eq!(store.tune(), tune);
        assert_eq!(store.get_int(RadioCommand::HdSubchannel), Some(0));
        assert_eq!(store.get_int(RadioCommand::HdSubchannelCount), Some(0));
        assert_eq!(store.get_bool(RadioCommand::HdActive), Some(false));
        assert_eq!(store.get_bool(RadioCommand::HdStreamLock), Some(false));
        assert_eq!(store.get_bool(RadioCommand::RdsEnabled), Some(false));
        assert_eq!(store.get_string(RadioCommand::RdsRadioText), Some(String::new()));
        assert_eq!(store.get_string(RadioCommand::HdCallsign), Some(String::new()));
        assert_eq!(store.get_string(RadioCommand::HdTitle), Some(String::new()));
        assert_eq!(store.get_string(RadioCommand::HdArtist), Some(String::new()));
        // untouched by tuning
        assert_eq!(store.get_int(RadioCommand::Volume), Some(30));

        // history was cleared too
        store.set(RadioCommand::HdSubchannel, RadioValue::Int(2)).unwrap();
        assert_eq!(store.get_string(RadioCommand::HdTitle), Some(String::new()));
    }

    #[test]
    fn test_subchannel_restores_history() {
        let store = RadioKeyStore::new();
        store.set(RadioCommand::HdTitle, song(1, "One")).unwrap();
        store.set(RadioCommand::HdArtist, song(1, "Band A")).unwrap();
        store.set(RadioCommand::HdTitle, song(2, "Two")).unwrap();
        store.set(RadioCommand::HdTitle, song(1, "One again")).unwrap();
        assert_eq!(store.get_string(RadioCommand::HdTitle), Some("One again".into()));

        store.set(RadioCommand::HdSubchannel, RadioValue::Int(2)).unwrap();
        assert_eq!(store.get_string(RadioCommand::HdTitle), Some("Two".into()));
        assert_eq!(store.get_string(RadioCommand::HdArtist), Some(String::new()));

        store.set(RadioCommand::HdSubchannel, RadioValue::Int(1)).unwrap();
        assert_eq!(store.get_string(RadioCommand::HdTitle), Some("One again".into()));
        assert_eq!(store.get_string(RadioCommand::HdArtist), Some("Band A".into()));
    }

    #[test]
    fn test_seek_not_stored() {
        let store = RadioKeyStore::new();
        store.set(RadioCommand::Seek, RadioValue::None).unwrap();
        assert_eq!(store.get(RadioCommand::Seek), RadioValue::None);
    }

    #[test]
    fn test_kind_mismatch_rejected() {
        let store = RadioKeyStore::new();
        assert!(store.set(RadioCommand::Volume, RadioValue::Bool(true)).is_err());
        assert!(store.set(RadioCommand::Unknown(1), RadioValue::Int(1)).is_err());
        store.apply(RadioUpdate::new(RadioCommand::Mute, RadioValue::Int(1)));
        assert_eq!(store.get_bool(RadioCommand::Mute), Some(false));
    }

    #[test]
    fn test_snapshot_and_restore() {
        let store = RadioKeyStore::new();
        let tune = TuneInfo {
            band: Band::Am,
            frequency: 1010,
        };
        store.set(RadioCommand::Tune, RadioValue::Tune(tune)).unwrap();
        store.set(RadioCommand::HdSubchannel, RadioValue::Int(3)).unwrap();
        store.set(RadioCommand::Volume, RadioValue::Int(70)).unwrap();
        store.set(RadioCommand::Power, RadioValue::Bool(true)).unwrap();
        store.set_seek_all(false);

        // subchannel only survives while HD is active
        assert_eq!(store.snapshot().subchannel, 0);
        store.set(RadioCommand::HdActive, RadioValue::Bool(true)).unwrap();
        let snapshot = store.snapshot();
        assert_eq!(
            snapshot,
            RadioSnapshot {
                tune,
                subchannel: 3,
                volume: 70,
                bass: 15,
                treble: 15,
                seek_all: false,
            }
        );

        let restored = RadioKeyStore::new();
        restored.set(RadioCommand::RdsGenre, RadioValue::Str("Jazz".into())).unwrap();
        restored.restore(&snapshot);
        assert_eq!(restored.tune(), tune);
        assert_eq!(restored.get_int(RadioCommand::HdSubchannel), Some(3));
        assert_eq!(restored.get_int(RadioCommand::Volume), Some(70));
        assert!(!restored.seek_all());
        // everything else is back to its default
        assert_eq!(restored.get_string(RadioCommand::RdsGenre), Some(String::new()));
        assert_eq!(restored.get_bool(RadioCommand::Power), Some(false));
        assert_eq!(restored.get_bool(RadioCommand::HdActive), Some(false));
    }

    #[test]
    fn test_snapshot_yaml() {
        let yaml = "tune:\n  band: AM\n  frequency: 1010\nvolume: 20\n";
        let snapshot: RadioSnapshot = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(snapshot.tune.band, Band::Am);
        assert_eq!(snapshot.volume, 20);
        assert_eq!(snapshot.bass, 15);
        assert!(snapshot.seek_all);
    }
}
