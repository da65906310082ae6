//! Session configuration.
//!
//! Loaded from YAML. Every field has a default, so an empty document is a
//! valid configuration:
//!
//! ```yaml
//! name: dash
//! timeouts:
//!   connect_ms: 60000
//!   start_ack_ms: 5000
//! dimmer:
//!   mode: analog
//!   high_reading: 1000
//!   low_reading: 100
//! buttons:
//!   - id: 300
//!     tolerance: 5
//!     click-action: Volume Up
//!     click-action-type: Built-In
//! ```

use std::path::Path;
use std::time::Duration;

use autolink_radio_protocol::RadioSnapshot;
use serde::{Deserialize, Serialize};

use crate::actions::{AudioSource, CameraApp};
use crate::buttons::ButtonMapping;
use crate::dimmer::DimmerConfig;
use crate::error::SessionError;

// ============================================================================
// Sections
// ============================================================================

/// Handshake and request timeouts, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Wait for the transport to report the device ready.
    pub connect_ms: u64,
    /// Wait for STARTED after sending START.
    pub start_ack_ms: u64,
    /// Wait for RADIO_STATUS after requesting it.
    pub radio_status_ms: u64,
    /// Pause between sending STOP and closing the transport.
    pub stop_settle_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        TimeoutConfig {
            connect_ms: 60_000,
            start_ack_ms: 5_000,
            radio_status_ms: 5_000,
            stop_settle_ms: 500,
        }
    }
}

impl TimeoutConfig {
    pub fn connect(&self) -> Duration {
        Duration::from_millis(self.connect_ms)
    }

    pub fn start_ack(&self) -> Duration {
        Duration::from_millis(self.start_ack_ms)
    }

    pub fn radio_status(&self) -> Duration {
        Duration::from_millis(self.radio_status_ms)
    }

    pub fn stop_settle(&self) -> Duration {
        Duration::from_millis(self.stop_settle_ms)
    }
}

/// Polling intervals used by actions that repeat while a button is held.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepeatConfig {
    /// Between volume steps.
    pub volume_interval_ms: u64,
    /// Between track skips.
    pub media_skip_interval_ms: u64,
    /// Between hold checks while fast-forwarding or rewinding.
    pub media_seek_interval_ms: u64,
    /// Between radio level steps.
    pub radio_step_interval_ms: u64,
}

impl Default for RepeatConfig {
    fn default() -> Self {
        RepeatConfig {
            volume_interval_ms: 200,
            media_skip_interval_ms: 2_000,
            media_seek_interval_ms: 200,
            radio_step_interval_ms: 200,
        }
    }
}

impl RepeatConfig {
    pub fn volume_interval(&self) -> Duration {
        Duration::from_millis(self.volume_interval_ms)
    }

    pub fn media_skip_interval(&self) -> Duration {
        Duration::from_millis(self.media_skip_interval_ms)
    }

    pub fn media_seek_interval(&self) -> Duration {
        Duration::from_millis(self.media_seek_interval_ms)
    }

    pub fn radio_step_interval(&self) -> Duration {
        Duration::from_millis(self.radio_step_interval_ms)
    }
}

// ============================================================================
// Session Configuration
// ============================================================================

/// Everything a [`LinkSession`](crate::LinkSession) needs besides its transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Name used in log lines and worker thread names.
    pub name: String,
    pub timeouts: TimeoutConfig,
    pub repeat: RepeatConfig,
    pub dimmer: DimmerConfig,
    /// Steering-wheel button mappings, checked in order.
    pub buttons: Vec<ButtonMapping>,
    pub reverse_camera: CameraApp,
    /// Audio source selected when the session starts.
    pub audio_source: AudioSource,
    /// Forward CUSTOM events to the host.
    pub broadcast_custom_commands: bool,
    /// Outer checksum seed. Firmware that counts the start byte uses 0xF1.
    pub checksum_seed: u8,
    /// Radio settings restored when the radio is enabled.
    pub radio: RadioSnapshot,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            name: "mcu".to_string(),
            timeouts: TimeoutConfig::default(),
            repeat: RepeatConfig::default(),
            dimmer: DimmerConfig::default(),
            buttons: Vec::new(),
            reverse_camera: CameraApp::default(),
            audio_source: AudioSource::default(),
            broadcast_custom_commands: false,
            checksum_seed: 0,
            radio: RadioSnapshot::default(),
        }
    }
}

impl SessionConfig {
    /// Parse a configuration from a YAML string.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, SessionError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SessionError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| SessionError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml_str(&text)
    }

    /// Render the configuration as YAML.
    pub fn to_yaml(&self) -> Result<String, SessionError> {
        Ok(serde_yaml::to_string(self)?)
    }
}
