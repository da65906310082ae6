//! Actions triggered by MCU events, and the host they act on.
//!
//! Every action runs on its own short-lived thread. Actions that repeat
//! while a button is held poll a [`HoldFlag`] once per configured interval,
//! so they stop at most one interval after the release arrives.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use autolink_mcu_protocol::McuRequest;
use autolink_radio_protocol::Direction;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{RepeatConfig, SessionConfig};
use crate::dimmer::Dimmer;
use crate::error::SessionError;
use crate::outbox::Outbox;
use crate::radio_link::RadioControl;

// ============================================================================
// Host Collaborator
// ============================================================================

/// Media keys the host can press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKey {
    PlayPause,
    Next,
    Previous,
    FastForward,
    Rewind,
}

/// Which camera to show while reversing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraApp {
    #[default]
    None,
    /// The head unit's own camera view.
    Companion,
    /// A separate application, by package name.
    App(String),
}

impl CameraApp {
    pub fn is_configured(&self) -> bool {
        !matches!(self, CameraApp::None)
    }
}

/// The head-unit platform that actions operate on.
///
/// Implementations must be callable from several action threads at once.
pub trait ActionHost: Send + Sync {
    /// Step the media volume one notch.
    fn adjust_volume(&self, direction: Direction);

    /// Current media volume.
    fn volume(&self) -> i32;

    fn set_volume(&self, level: i32);

    /// Press (`true`) or release (`false`) a media key.
    fn media_key(&self, key: MediaKey, pressed: bool);

    fn launch_application(&self, package: &str) -> Result<(), SessionError>;

    /// Run a named automation task.
    fn run_task(&self, task: &str) -> Result<(), SessionError>;

    /// Current screen brightness, if the host can report it.
    fn brightness(&self) -> Option<i32>;

    fn set_brightness(&self, level: i32);

    fn auto_brightness(&self) -> bool;

    fn set_auto_brightness(&self, enabled: bool);

    fn open_camera(&self, camera: &CameraApp) -> Result<(), SessionError>;

    fn close_camera(&self);

    /// Hand a CUSTOM event from the MCU to whoever listens for it.
    fn broadcast_custom(&self, command: u8, data: &[u8]);
}

// ============================================================================
// Audio Source
// ============================================================================

/// Audio input routed to the head unit by the MCU.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioSource {
    #[default]
    HdRadio,
    Aux,
}

impl AudioSource {
    /// Parse the names used by button mappings (`HD_RADIO`, `AUX`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "HD_RADIO" | "HD" => Some(AudioSource::HdRadio),
            "AUX" => Some(AudioSource::Aux),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            AudioSource::HdRadio => AudioSource::Aux,
            AudioSource::Aux => AudioSource::HdRadio,
        }
    }

    /// Request that selects this source on the MCU.
    pub fn request(self) -> McuRequest {
        match self {
            AudioSource::HdRadio => McuRequest::AudioSourceHd,
            AudioSource::Aux => McuRequest::AudioSourceAux,
        }
    }
}

// ============================================================================
// Actions
// ============================================================================

/// Something the dispatcher can ask the head unit to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    VolumeUp,
    VolumeDown,
    Mute,
    PlayPause,
    Next,
    Previous,
    FastForward,
    Rewind,
    ToggleCamera,
    ToggleAutoBrightness,
    ToggleAudioSource,
    RadioVolumeUp,
    RadioVolumeDown,
    RadioTuneUp,
    RadioTuneDown,
    RadioSeekUp,
    RadioSeekDown,
    RadioMute,
    Application(String),
    Tasker(String),
    SetAudioSource(String),
    /// Reverse gear engaged or released.
    Reverse(bool),
    /// Headlight switch on or off.
    Dimmer(bool),
    /// Dimmer rheostat reading.
    DimmerLevel(i32),
    /// CUSTOM event forwarded to the host.
    Custom { command: u8, data: Vec<u8> },
}

static BUILT_INS: [(&str, Action); 18] = [
    ("Volume Up", Action::VolumeUp),
    ("Volume Down", Action::VolumeDown),
    ("Mute", Action::Mute),
    ("Play/Pause", Action::PlayPause),
    ("Next", Action::Next),
    ("Previous", Action::Previous),
    ("Fast Forward", Action::FastForward),
    ("Rewind", Action::Rewind),
    ("Toggle Camera", Action::ToggleCamera),
    ("Toggle Auto-Brightness", Action::ToggleAutoBrightness),
    ("Toggle Audio Source", Action::ToggleAudioSource),
    ("Radio Volume Up", Action::RadioVolumeUp),
    ("Radio Volume Down", Action::RadioVolumeDown),
    ("Radio Tune Up", Action::RadioTuneUp),
    ("Radio Tune Down", Action::RadioTuneDown),
    ("Radio Seek Up", Action::RadioSeekUp),
    ("Radio Seek Down", Action::RadioSeekDown),
    ("Radio Mute", Action::RadioMute),
];

impl Action {
    /// Look up a built-in action by its display name.
    pub fn from_name(name: &str) -> Option<Action> {
        BUILT_INS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, action)| action.clone())
    }

    /// Names of every built-in action.
    pub fn built_in_names() -> impl Iterator<Item = &'static str> {
        BUILT_INS.iter().map(|(n, _)| *n)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Action::Application(_) => "Application",
            Action::Tasker(_) => "Tasker",
            Action::SetAudioSource(_) => "Set Audio Source",
            Action::Reverse(_) => "Reverse",
            Action::Dimmer(_) => "Dimmer",
            Action::DimmerLevel(_) => "Dimmer Level",
            Action::Custom { .. } => "Custom",
            built_in => BUILT_INS
                .iter()
                .find(|(_, a)| a == built_in)
                .map(|(n, _)| *n)
                .unwrap_or("Unknown"),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Application(arg) | Action::Tasker(arg) | Action::SetAudioSource(arg) => {
                write!(f, "{}({})", self.name(), arg)
            }
            Action::Reverse(on) | Action::Dimmer(on) => write!(f, "{}({})", self.name(), on),
            Action::DimmerLevel(level) => write!(f, "{}({})", self.name(), level),
            Action::Custom { command, data } => {
                write!(f, "Custom(0x{:02X}, {} bytes)", command, data.len())
            }
            _ => f.write_str(self.name()),
        }
    }
}

// ============================================================================
// Hold Flag
// ============================================================================

/// "Still holding" flag. Written by the dispatcher, read by repeating actions.
#[derive(Debug, Default)]
pub struct HoldFlag(AtomicBool);

impl HoldFlag {
    pub fn set(&self, held: bool) {
        self.0.store(held, Ordering::SeqCst);
    }

    pub fn is_held(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ============================================================================
// Action Context
// ============================================================================

/// State shared by all action threads of one session.
pub struct ActionContext {
    name: String,
    host: Arc<dyn ActionHost>,
    hold: HoldFlag,
    repeat: RepeatConfig,
    dimmer: Dimmer,
    camera: CameraApp,
    camera_on: Mutex<bool>,
    audio_source: Mutex<AudioSource>,
    saved_volume: Mutex<Option<i32>>,
    outbox: Arc<Outbox>,
    radio: RadioControl,
}

impl ActionContext {
    pub fn new(
        config: &SessionConfig,
        host: Arc<dyn ActionHost>,
        outbox: Arc<Outbox>,
        radio: RadioControl,
    ) -> Self {
        ActionContext {
            name: config.name.clone(),
            host,
            hold: HoldFlag::default(),
            repeat: config.repeat.clone(),
            dimmer: Dimmer::new(config.dimmer.clone()),
            camera: config.reverse_camera.clone(),
            camera_on: Mutex::new(false),
            audio_source: Mutex::new(config.audio_source),
            saved_volume: Mutex::new(None),
            outbox,
            radio,
        }
    }

    pub fn hold(&self) -> &HoldFlag {
        &self.hold
    }

    pub fn dimmer(&self) -> &Dimmer {
        &self.dimmer
    }

    pub fn audio_source(&self) -> AudioSource {
        *self.audio_source.lock()
    }

    pub fn camera_on(&self) -> bool {
        *self.camera_on.lock()
    }

    /// Run `action` on a new named thread and return immediately.
    pub fn spawn(self: &Arc<Self>, action: Action) {
        let context = Arc::clone(self);
        let thread_name = format!("{}-action", self.name);
        metrics::counter!("autolink_actions_total", "action" => action.name()).increment(1);
        let spawned = thread::Builder::new()
            .name(thread_name)
            .spawn(move || context.run(&action));
        if let Err(e) = spawned {
            warn!("Session[{}]: failed to start action thread: {}", self.name, e);
        }
    }

    /// Run `action` on the calling thread.
    pub fn run(&self, action: &Action) {
        debug!("Session[{}]: running {}", self.name, action);
        let host = self.host.as_ref();
        match action {
            Action::VolumeUp => self.repeat_while_held(self.repeat.volume_interval(), || {
                host.adjust_volume(Direction::Up);
                true
            }),
            Action::VolumeDown => self.repeat_while_held(self.repeat.volume_interval(), || {
                host.adjust_volume(Direction::Down);
                true
            }),
            Action::Mute => self.toggle_mute(),
            Action::PlayPause => self.tap(MediaKey::PlayPause),
            Action::Next => self.skip(MediaKey::Next),
            Action::Previous => self.skip(MediaKey::Previous),
            Action::FastForward => self.seek(MediaKey::FastForward),
            Action::Rewind => self.seek(MediaKey::Rewind),
            Action::ToggleCamera => {
                let on = self.camera_on();
                self.set_camera(!on);
            }
            Action::ToggleAutoBrightness => {
                let enabled = host.auto_brightness();
                host.set_auto_brightness(!enabled);
            }
            Action::ToggleAudioSource => {
                let next = self.audio_source().toggled();
                self.select_audio_source(next);
            }
            Action::SetAudioSource(name) => match AudioSource::from_name(name) {
                Some(source) => self.select_audio_source(source),
                None => warn!("Session[{}]: unknown audio source {:?}", self.name, name),
            },
            Action::Application(package) => {
                if let Err(e) = host.launch_application(package) {
                    warn!("Session[{}]: {}", self.name, e);
                }
            }
            Action::Tasker(task) => {
                if let Err(e) = host.run_task(task) {
                    warn!("Session[{}]: {}", self.name, e);
                }
            }
            Action::RadioVolumeUp => {
                self.repeat_while_held(self.repeat.radio_step_interval(), || {
                    self.radio_step(self.radio.volume_up())
                })
            }
            Action::RadioVolumeDown => {
                self.repeat_while_held(self.repeat.radio_step_interval(), || {
                    self.radio_step(self.radio.volume_down())
                })
            }
            Action::RadioTuneUp => self.radio_once(self.radio.tune_step(Direction::Up)),
            Action::RadioTuneDown => self.radio_once(self.radio.tune_step(Direction::Down)),
            Action::RadioSeekUp => self.radio_once(self.radio.seek(Direction::Up)),
            Action::RadioSeekDown => self.radio_once(self.radio.seek(Direction::Down)),
            Action::RadioMute => self.radio_once(self.radio.toggle_mute()),
            Action::Reverse(on) => self.set_camera(*on),
            Action::Dimmer(true) => self.dimmer.turn_on(host),
            Action::Dimmer(false) => self.dimmer.turn_off(host),
            Action::DimmerLevel(reading) => self.dimmer.apply_level(host, *reading),
            Action::Custom { command, data } => host.broadcast_custom(*command, data),
        }
    }

    /// Run `step` once, then again every `interval` while the button stays held.
    /// `step` returns `false` to stop early.
    fn repeat_while_held(&self, interval: Duration, mut step: impl FnMut() -> bool) {
        loop {
            if !step() {
                return;
            }
            thread::sleep(interval);
            if !self.hold.is_held() {
                return;
            }
        }
    }

    fn tap(&self, key: MediaKey) {
        self.host.media_key(key, true);
        self.host.media_key(key, false);
    }

    fn skip(&self, key: MediaKey) {
        self.repeat_while_held(self.repeat.media_skip_interval(), || {
            self.tap(key);
            true
        });
    }

    /// Hold the key down until the button is released.
    fn seek(&self, key: MediaKey) {
        self.host.media_key(key, true);
        let interval = self.repeat.media_seek_interval();
        loop {
            thread::sleep(interval);
            if !self.hold.is_held() {
                break;
            }
        }
        self.host.media_key(key, false);
    }

    fn toggle_mute(&self) {
        let mut saved = self.saved_volume.lock();
        let volume = self.host.volume();
        if volume > 0 {
            *saved = Some(volume);
            self.host.set_volume(0);
        } else if let Some(previous) = saved.take() {
            self.host.set_volume(previous);
        } else {
            debug!("Session[{}]: nothing to unmute", self.name);
        }
    }

    fn set_camera(&self, on: bool) {
        let mut camera_on = self.camera_on.lock();
        if on {
            if !self.camera.is_configured() {
                info!("Session[{}]: camera app not set", self.name);
                return;
            }
            match self.host.open_camera(&self.camera) {
                Ok(()) => *camera_on = true,
                Err(e) => warn!("Session[{}]: {}", self.name, e),
            }
        } else {
            if *camera_on {
                self.host.close_camera();
            }
            *camera_on = false;
        }
    }

    fn select_audio_source(&self, source: AudioSource) {
        let mut current = self.audio_source.lock();
        if *current == source {
            debug!("Session[{}]: audio source already {:?}", self.name, source);
            return;
        }
        match self.outbox.submit(source.request()) {
            Ok(()) => {
                info!("Session[{}]: audio source {:?}", self.name, source);
                *current = source;
            }
            Err(e) => warn!("Session[{}]: unable to switch audio source: {}", self.name, e),
        }
    }

    fn radio_step(&self, result: Result<bool, SessionError>) -> bool {
        match result {
            Ok(_) => true,
            Err(e) => {
                warn!("Session[{}]: radio: {}", self.name, e);
                false
            }
        }
    }

    fn radio_once(&self, result: Result<(), SessionError>) {
        if let Err(e) = result {
            warn!("Session[{}]: radio: {}", self.name, e);
        }
    }
}
