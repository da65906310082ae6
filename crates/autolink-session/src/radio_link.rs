//! The radio module tunnelled through the MCU link.
//!
//! [`RadioLink`] tracks whether the radio is present and feeds RADIO_DATA
//! payloads into the key store. [`RadioControl`] turns user intents into
//! radio requests wrapped in RADIO_SEND_PACKET.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use autolink_mcu_protocol::McuRequest;
use autolink_radio_protocol::{
    Band, Direction, RadioCommand, RadioDecoder, RadioKeyStore, RadioRequest, RadioSnapshot,
    RadioValue, SeekMode, TuneInfo, LEVEL_MAX, LEVEL_MIN,
};
use parking_lot::{Condvar, Mutex};
use tracing::{debug, info, warn};

use crate::error::SessionError;
use crate::outbox::Outbox;

/// Interval between subchannel re-sends while waiting for HD stream lock.
pub const STREAM_LOCK_RETRY: Duration = Duration::from_millis(100);
/// Give up on stream lock after this long.
pub const STREAM_LOCK_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioLinkState {
    /// Never requested, or reset by a disconnect.
    Idle,
    /// RADIO_REQUEST_STATUS sent, waiting for RADIO_STATUS.
    RequestingStatus,
    Enabled,
    /// The MCU reported no radio, or did not answer in time.
    Disabled,
    /// The transport failed while the radio was enabled.
    Error,
}

// ============================================================================
// Radio Link
// ============================================================================

/// Presence tracking and inbound decoding for the radio.
#[derive(Debug)]
pub struct RadioLink {
    name: String,
    store: Arc<RadioKeyStore>,
    decoder: Mutex<RadioDecoder>,
    state: Mutex<RadioLinkState>,
    changed: Condvar,
}

impl RadioLink {
    pub fn new(name: &str, snapshot: &RadioSnapshot) -> Self {
        RadioLink {
            name: name.to_string(),
            store: Arc::new(RadioKeyStore::with_snapshot(snapshot)),
            decoder: Mutex::new(RadioDecoder::new()),
            state: Mutex::new(RadioLinkState::Idle),
            changed: Condvar::new(),
        }
    }

    pub fn store(&self) -> &Arc<RadioKeyStore> {
        &self.store
    }

    pub fn state(&self) -> RadioLinkState {
        *self.state.lock()
    }

    pub fn is_enabled(&self) -> bool {
        self.state() == RadioLinkState::Enabled
    }

    /// Mark a status request as outstanding.
    pub(crate) fn begin_status_request(&self) {
        *self.state.lock() = RadioLinkState::RequestingStatus;
        self.decoder.lock().reset();
    }

    /// Block until RADIO_STATUS arrives or `timeout` passes.
    ///
    /// A timeout leaves the radio disabled.
    pub(crate) fn wait_for_status(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        while *state == RadioLinkState::RequestingStatus {
            if self.changed.wait_until(&mut state, deadline).timed_out()
                && *state == RadioLinkState::RequestingStatus
            {
                warn!("Radio[{}]: no RADIO_STATUS after {:?}", self.name, timeout);
                *state = RadioLinkState::Disabled;
            }
        }
        *state == RadioLinkState::Enabled
    }

    /// RADIO_STATUS from the MCU.
    pub(crate) fn handle_status(&self, present: bool) {
        let mut state = self.state.lock();
        let next = if present {
            RadioLinkState::Enabled
        } else {
            RadioLinkState::Disabled
        };
        if *state != RadioLinkState::RequestingStatus {
            debug!("Radio[{}]: unsolicited RADIO_STATUS({})", self.name, present);
        }
        info!("Radio[{}]: {:?}", self.name, next);
        *state = next;
        self.changed.notify_all();
    }

    /// RADIO_DATA from the MCU.
    pub(crate) fn handle_data(&self, data: &[u8]) {
        if !self.is_enabled() {
            debug!("Radio[{}]: ignoring {} bytes, radio not enabled", self.name, data.len());
            return;
        }
        let updates = self.decoder.lock().feed(data);
        for update in updates {
            self.store.apply(update);
        }
    }

    /// Transport failure while connected.
    pub(crate) fn flag_error(&self) {
        let mut state = self.state.lock();
        if *state == RadioLinkState::Enabled || *state == RadioLinkState::RequestingStatus {
            warn!("Radio[{}]: connection error", self.name);
            *state = RadioLinkState::Error;
            self.changed.notify_all();
        }
    }

    pub(crate) fn disable(&self) {
        let mut state = self.state.lock();
        *state = RadioLinkState::Disabled;
        self.changed.notify_all();
    }

    /// Back to idle after the session closes.
    pub(crate) fn reset(&self) {
        let mut state = self.state.lock();
        if *state != RadioLinkState::Error {
            *state = RadioLinkState::Idle;
        }
        self.changed.notify_all();
    }
}

// ============================================================================
// Radio Control
// ============================================================================

/// User-level radio commands.
///
/// Levels are read from the key store and only sent when the result stays
/// within `[LEVEL_MIN, LEVEL_MAX]`.
#[derive(Debug, Clone)]
pub struct RadioControl {
    link: Arc<RadioLink>,
    outbox: Arc<Outbox>,
}

impl RadioControl {
    pub fn new(link: Arc<RadioLink>, outbox: Arc<Outbox>) -> Self {
        RadioControl { link, outbox }
    }

    pub fn store(&self) -> &Arc<RadioKeyStore> {
        self.link.store()
    }

    /// Encode `request` and queue it as RADIO_SEND_PACKET.
    pub fn send(&self, request: RadioRequest) -> Result<(), SessionError> {
        if !self.link.is_enabled() {
            return Err(SessionError::RadioUnavailable);
        }
        let packet = request.encode()?;
        self.outbox.submit(McuRequest::RadioSendPacket(packet))
    }

    pub fn power(&self, on: bool) -> Result<(), SessionError> {
        self.send(RadioRequest::Set(RadioCommand::Power, RadioValue::Bool(on)))
    }

    pub fn mute(&self, on: bool) -> Result<(), SessionError> {
        self.send(RadioRequest::Set(RadioCommand::Mute, RadioValue::Bool(on)))
    }

    pub fn toggle_mute(&self) -> Result<(), SessionError> {
        let muted = self.store().get_bool(RadioCommand::Mute).unwrap_or(false);
        self.mute(!muted)
    }

    pub fn set_volume(&self, level: i32) -> Result<(), SessionError> {
        self.set_level(RadioCommand::Volume, level)
    }

    pub fn set_bass(&self, level: i32) -> Result<(), SessionError> {
        self.set_level(RadioCommand::Bass, level)
    }

    pub fn set_treble(&self, level: i32) -> Result<(), SessionError> {
        self.set_level(RadioCommand::Treble, level)
    }

    pub fn volume_up(&self) -> Result<bool, SessionError> {
        self.step_level(RadioCommand::Volume, 1)
    }

    pub fn volume_down(&self) -> Result<bool, SessionError> {
        self.step_level(RadioCommand::Volume, -1)
    }

    pub fn bass_up(&self) -> Result<bool, SessionError> {
        self.step_level(RadioCommand::Bass, 1)
    }

    pub fn bass_down(&self) -> Result<bool, SessionError> {
        self.step_level(RadioCommand::Bass, -1)
    }

    pub fn treble_up(&self) -> Result<bool, SessionError> {
        self.step_level(RadioCommand::Treble, 1)
    }

    pub fn treble_down(&self) -> Result<bool, SessionError> {
        self.step_level(RadioCommand::Treble, -1)
    }

    fn set_level(&self, command: RadioCommand, level: i32) -> Result<(), SessionError> {
        self.send(RadioRequest::Set(command, RadioValue::Int(level)))
    }

    /// Returns whether a request was sent.
    fn step_level(&self, command: RadioCommand, delta: i32) -> Result<bool, SessionError> {
        let current = self.store().get_int(command).unwrap_or(LEVEL_MIN);
        let next = current.saturating_add(delta);
        if !(LEVEL_MIN..=LEVEL_MAX).contains(&next) {
            debug!("Radio: {} already at {}", command, current);
            return Ok(false);
        }
        self.set_level(command, next)?;
        Ok(true)
    }

    /// Tune to a station. A positive `subchannel` also selects that HD
    /// subchannel, retried until the radio reports it or the stream-lock
    /// timeout expires.
    pub fn tune(&self, band: Band, frequency: i32, subchannel: i32) -> Result<(), SessionError> {
        let tune = TuneInfo { band, frequency };
        self.send(RadioRequest::Set(RadioCommand::Tune, RadioValue::Tune(tune)))?;
        if subchannel <= 0 {
            return Ok(());
        }
        self.select_subchannel(subchannel)?;

        let control = self.clone();
        thread::Builder::new()
            .name("radio-stream-lock".to_string())
            .spawn(move || control.await_subchannel(subchannel))
            .map_err(|e| SessionError::host(e.to_string()))?;
        Ok(())
    }

    fn select_subchannel(&self, subchannel: i32) -> Result<(), SessionError> {
        self.send(RadioRequest::Set(
            RadioCommand::HdSubchannel,
            RadioValue::Int(subchannel),
        ))
    }

    fn await_subchannel(&self, subchannel: i32) {
        let deadline = Instant::now() + STREAM_LOCK_TIMEOUT;
        loop {
            thread::sleep(STREAM_LOCK_RETRY);
            if self.store().get_int(RadioCommand::HdSubchannel) == Some(subchannel) {
                debug!("Radio: locked subchannel {}", subchannel);
                return;
            }
            if Instant::now() >= deadline {
                warn!("Radio: subchannel {} not confirmed", subchannel);
                return;
            }
            if let Err(e) = self.select_subchannel(subchannel) {
                debug!("Radio: stop retrying subchannel: {}", e);
                return;
            }
        }
    }

    pub fn tune_step(&self, direction: Direction) -> Result<(), SessionError> {
        self.send(RadioRequest::TuneStep(direction))
    }

    /// Seek, honouring the stored seek-all preference.
    pub fn seek(&self, direction: Direction) -> Result<(), SessionError> {
        let mode = SeekMode::from_seek_all(self.store().seek_all());
        self.send(RadioRequest::Seek { direction, mode })
    }

    pub fn set_seek_all(&self, seek_all: bool) {
        self.store().set_seek_all(seek_all);
    }

    /// Ask the radio to report `command`.
    pub fn request_update(&self, command: RadioCommand) -> Result<(), SessionError> {
        self.send(RadioRequest::Get(command))
    }

    /// Drive the radio's DTR line.
    pub fn set_dtr(&self, raised: bool) -> Result<(), SessionError> {
        self.outbox.submit(McuRequest::RadioSetDtr(raised))
    }

    /// Drive the radio's RTS line.
    pub fn set_rts(&self, raised: bool) -> Result<(), SessionError> {
        self.outbox.submit(McuRequest::RadioSetRts(raised))
    }
}
