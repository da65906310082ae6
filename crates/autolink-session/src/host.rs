//! [`ActionHost`] implementations that do not drive a real head unit.

use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

use autolink_radio_protocol::Direction;
use parking_lot::Mutex;
use tracing::info;

use crate::actions::{ActionHost, CameraApp, MediaKey};
use crate::error::SessionError;

// ============================================================================
// Logging Host
// ============================================================================

/// Logs every action and keeps volume and brightness in memory.
#[derive(Debug)]
pub struct LoggingHost {
    volume: AtomicI32,
    brightness: AtomicI32,
    auto_brightness: AtomicBool,
}

impl Default for LoggingHost {
    fn default() -> Self {
        LoggingHost {
            volume: AtomicI32::new(10),
            brightness: AtomicI32::new(200),
            auto_brightness: AtomicBool::new(false),
        }
    }
}

impl ActionHost for LoggingHost {
    fn adjust_volume(&self, direction: Direction) {
        let delta = match direction {
            Direction::Up => 1,
            Direction::Down => -1,
        };
        let volume = (self.volume.load(Ordering::SeqCst) + delta).max(0);
        self.volume.store(volume, Ordering::SeqCst);
        info!(target: "host", "volume {:?} -> {}", direction, volume);
    }

    fn volume(&self) -> i32 {
        self.volume.load(Ordering::SeqCst)
    }

    fn set_volume(&self, level: i32) {
        self.volume.store(level, Ordering::SeqCst);
        info!(target: "host", "volume = {}", level);
    }

    fn media_key(&self, key: MediaKey, pressed: bool) {
        info!(target: "host", "media key {:?} {}", key, if pressed { "down" } else { "up" });
    }

    fn launch_application(&self, package: &str) -> Result<(), SessionError> {
        info!(target: "host", "launch {}", package);
        Ok(())
    }

    fn run_task(&self, task: &str) -> Result<(), SessionError> {
        info!(target: "host", "run task {}", task);
        Ok(())
    }

    fn brightness(&self) -> Option<i32> {
        Some(self.brightness.load(Ordering::SeqCst))
    }

    fn set_brightness(&self, level: i32) {
        self.brightness.store(level, Ordering::SeqCst);
        info!(target: "host", "brightness = {}", level);
    }

    fn auto_brightness(&self) -> bool {
        self.auto_brightness.load(Ordering::SeqCst)
    }

    fn set_auto_brightness(&self, enabled: bool) {
        self.auto_brightness.store(enabled, Ordering::SeqCst);
        info!(target: "host", "auto brightness = {}", enabled);
    }

    fn open_camera(&self, camera: &CameraApp) -> Result<(), SessionError> {
        info!(target: "host", "open camera {:?}", camera);
        Ok(())
    }

    fn close_camera(&self) {
        info!(target: "host", "close camera");
    }

    fn broadcast_custom(&self, command: u8, data: &[u8]) {
        info!(target: "host", "custom 0x{:02X} {:02X?}", command, data);
    }
}

// ============================================================================
// Recording Host
// ============================================================================

/// A call made on a [`RecordingHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    AdjustVolume(Direction),
    SetVolume(i32),
    MediaKey(MediaKey, bool),
    LaunchApplication(String),
    RunTask(String),
    SetBrightness(i32),
    SetAutoBrightness(bool),
    OpenCamera(CameraApp),
    CloseCamera,
    Custom(u8, Vec<u8>),
}

#[derive(Debug)]
struct Recorded {
    calls: Vec<HostCall>,
    volume: i32,
    brightness: i32,
    auto_brightness: bool,
}

/// Records every call, for tests and dry runs.
#[derive(Debug)]
pub struct RecordingHost {
    inner: Mutex<Recorded>,
}

impl Default for RecordingHost {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingHost {
    /// Volume starts at 10, brightness at 200.
    pub fn new() -> Self {
        RecordingHost {
            inner: Mutex::new(Recorded {
                calls: Vec::new(),
                volume: 10,
                brightness: 200,
                auto_brightness: false,
            }),
        }
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.inner.lock().calls.clone()
    }

    /// Number of recorded calls equal to `call`.
    pub fn count(&self, call: &HostCall) -> usize {
        self.inner.lock().calls.iter().filter(|c| *c == call).count()
    }

    pub fn clear(&self) {
        self.inner.lock().calls.clear();
    }

    fn record(&self, call: HostCall) {
        self.inner.lock().calls.push(call);
    }
}

impl ActionHost for RecordingHost {
    fn adjust_volume(&self, direction: Direction) {
        let mut inner = self.inner.lock();
        inner.volume += match direction {
            Direction::Up => 1,
            Direction::Down => -1,
        };
        inner.calls.push(HostCall::AdjustVolume(direction));
    }

    fn volume(&self) -> i32 {
        self.inner.lock().volume
    }

    fn set_volume(&self, level: i32) {
        let mut inner = self.inner.lock();
        inner.volume = level;
        inner.calls.push(HostCall::SetVolume(level));
    }

    fn media_key(&self, key: MediaKey, pressed: bool) {
        self.record(HostCall::MediaKey(key, pressed));
    }

    fn launch_application(&self, package: &str) -> Result<(), SessionError> {
        self.record(HostCall::LaunchApplication(package.to_string()));
        Ok(())
    }

    fn run_task(&self, task: &str) -> Result<(), SessionError> {
        self.record(HostCall::RunTask(task.to_string()));
        Ok(())
    }

    fn brightness(&self) -> Option<i32> {
        Some(self.inner.lock().brightness)
    }

    fn set_brightness(&self, level: i32) {
        let mut inner = self.inner.lock();
        inner.brightness = level;
        inner.calls.push(HostCall::SetBrightness(level));
    }

    fn auto_brightness(&self) -> bool {
        self.inner.lock().auto_brightness
    }

    fn set_auto_brightness(&self, enabled: bool) {
        let mut inner = self.inner.lock();
        inner.auto_brightness = enabled;
        inner.calls.push(HostCall::SetAutoBrightness(enabled));
    }

    fn open_camera(&self, camera: &CameraApp) -> Result<(), SessionError> {
        self.record(HostCall::OpenCamera(camera.clone()));
        Ok(())
    }

    fn close_camera(&self) {
        self.record(HostCall::CloseCamera);
    }

    fn broadcast_custom(&self, command: u8, data: &[u8]) {
        self.record(HostCall::Custom(command, data.to_vec()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_host_tracks_state() {
        let host = RecordingHost::new();
        host.adjust_volume(Direction::Up);
        host.adjust_volume(Direction::Up);
        assert_eq!(host.volume(), 12);
        host.set_auto_brightness(true);
        assert!(host.auto_brightness());
        assert_eq!(host.count(&HostCall::AdjustVolume(Direction::Up)), 2);
        host.clear();
        assert!(host.calls().is_empty());
    }

    #[test]
    fn test_logging_host_volume_floor() {
        let host = LoggingHost::default();
        host.set_volume(0);
        host.adjust_volume(Direction::Down);
        assert_eq!(host.volume(), 0);
    }
}
