//! Headlight dimmer handling.
//!
//! In digital mode the MCU only reports the dimmer switch, and the screen
//! jumps to a fixed brightness. In analog mode it also reports the dimmer
//! rheostat reading, which is mapped linearly onto a brightness range.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::actions::ActionHost;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DimmerMode {
    #[default]
    None,
    Digital,
    Analog,
}

/// Dimmer calibration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DimmerConfig {
    pub mode: DimmerMode,
    /// Rheostat reading at full brightness.
    pub high_reading: i32,
    /// Rheostat reading at minimum brightness.
    pub low_reading: i32,
    /// Brightness applied at `high_reading`, and in digital mode.
    pub high_brightness: i32,
    /// Brightness applied at `low_reading`.
    pub low_brightness: i32,
    /// Brightness restored when the dimmer turns off, if the host cannot report one.
    pub initial_brightness: i32,
}

impl Default for DimmerConfig {
    fn default() -> Self {
        DimmerConfig {
            mode: DimmerMode::None,
            high_reading: 1000,
            low_reading: 100,
            high_brightness: 200,
            low_brightness: 100,
            initial_brightness: 200,
        }
    }
}

impl DimmerConfig {
    /// Whether the values needed by `mode` are usable.
    pub fn is_calibrated(&self) -> bool {
        match self.mode {
            DimmerMode::None => true,
            DimmerMode::Digital => self.high_brightness > 0,
            DimmerMode::Analog => {
                self.high_reading > 0
                    && self.low_reading > 0
                    && self.high_brightness > 0
                    && self.low_brightness > 0
                    && self.high_reading > self.low_reading
            }
        }
    }
}

#[derive(Debug)]
struct DimmerState {
    on: bool,
    saved_brightness: i32,
}

/// Dimmer state shared by the action threads.
#[derive(Debug)]
pub struct Dimmer {
    config: DimmerConfig,
    mode: DimmerMode,
    state: Mutex<DimmerState>,
}

impl Dimmer {
    /// An uncalibrated configuration behaves as [`DimmerMode::None`].
    pub fn new(config: DimmerConfig) -> Self {
        let mode = if config.is_calibrated() {
            config.mode
        } else {
            info!("Dimmer {:?} mode is not calibrated, ignoring dimmer events", config.mode);
            DimmerMode::None
        };
        let saved_brightness = config.initial_brightness;
        Dimmer {
            config,
            mode,
            state: Mutex::new(DimmerState {
                on: false,
                saved_brightness,
            }),
        }
    }

    /// Mode in effect after the calibration check.
    pub fn mode(&self) -> DimmerMode {
        self.mode
    }

    pub fn is_on(&self) -> bool {
        self.state.lock().on
    }

    /// Brightness the host should return to when the dimmer turns off.
    pub fn saved_brightness(&self) -> i32 {
        self.state.lock().saved_brightness
    }

    /// Headlights on.
    pub fn turn_on(&self, host: &dyn ActionHost) {
        if self.mode == DimmerMode::None {
            return;
        }
        let mut state = self.state.lock();
        if state.on {
            return;
        }
        state.on = true;
        state.saved_brightness = host.brightness().unwrap_or(self.config.initial_brightness);
        if self.mode == DimmerMode::Digital {
            debug!("Dimmer on, brightness {}", self.config.high_brightness);
            host.set_brightness(self.config.high_brightness);
        }
    }

    /// Headlights off; restores the brightness saved by [`turn_on`](Self::turn_on).
    pub fn turn_off(&self, host: &dyn ActionHost) {
        if self.mode == DimmerMode::None {
            return;
        }
        let mut state = self.state.lock();
        if !state.on {
            return;
        }
        state.on = false;
        debug!("Dimmer off, restoring brightness {}", state.saved_brightness);
        host.set_brightness(state.saved_brightness);
    }

    /// Apply a rheostat reading. Only meaningful in analog mode.
    pub fn apply_level(&self, host: &dyn ActionHost, reading: i32) {
        match self.brightness_for(reading) {
            Some(brightness) => host.set_brightness(brightness),
            None => warn!("Dimmer level {} received outside analog mode", reading),
        }
    }

    /// Brightness for an analog reading, clamped to the calibrated range.
    pub fn brightness_for(&self, reading: i32) -> Option<i32> {
        if self.mode != DimmerMode::Analog {
            return None;
        }
        let c = &self.config;
        let reading_span = (c.high_reading - c.low_reading) as f64;
        let brightness_span = (c.high_brightness - c.low_brightness) as f64;
        let offset = (reading.clamp(c.low_reading, c.high_reading) - c.low_reading) as f64;
        Some((offset / reading_span * brightness_span).round() as i32 + c.low_brightness)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{HostCall, RecordingHost};

    fn analog() -> DimmerConfig {
        DimmerConfig {
            mode: DimmerMode::Analog,
            high_reading: 1000,
            low_reading: 100,
            high_brightness: 200,
            low_brightness: 100,
            initial_brightness: 180,
        }
    }

    #[test]
    fn test_analog_interpolation() {
        let dimmer = Dimmer::new(analog());
        assert_eq!(dimmer.brightness_for(100), Some(100));
        assert_eq!(dimmer.brightness_for(1000), Some(200));
        assert_eq!(dimmer.brightness_for(550), Some(150));
        assert_eq!(dimmer.brightness_for(109), Some(101));
    }

    #[test]
    fn test_analog_clamps_out_of_range() {
        let dimmer = Dimmer::new(analog());
        assert_eq!(dimmer.brightness_for(0), Some(100));
        assert_eq!(dimmer.brightness_for(-40), Some(100));
        assert_eq!(dimmer.brightness_for(5000), Some(200));
    }

    #[test]
    fn test_uncalibrated_is_ignored() {
        let mut config = analog();
        config.low_brightness = 0;
        let dimmer = Dimmer::new(config);
        assert_eq!(dimmer.mode(), DimmerMode::None);
        assert_eq!(dimmer.brightness_for(500), None);

        let host = RecordingHost::new();
        dimmer.turn_on(&host);
        assert!(!dimmer.is_on());
        assert!(host.calls().is_empty());
    }

    #[test]
    fn test_digital_on_off_restores_brightness() {
        let dimmer = Dimmer::new(DimmerConfig {
            mode: DimmerMode::Digital,
            high_brightness: 60,
            ..Default::default()
        });
        let host = RecordingHost::new();
        host.set_brightness(210);

        dimmer.turn_on(&host);
        dimmer.turn_on(&host);
        assert!(dimmer.is_on());
        assert_eq!(dimmer.saved_brightness(), 210);
        dimmer.turn_off(&host);
        dimmer.turn_off(&host);

        assert_eq!(
            host.calls(),
            vec![
                HostCall::SetBrightness(210),
                HostCall::SetBrightness(60),
                HostCall::SetBrightness(210)
            ]
        );
    }

    #[test]
    fn test_analog_on_only_saves() {
        let dimmer = Dimmer::new(analog());
        let host = RecordingHost::new();
        dimmer.turn_on(&host);
        assert!(host.calls().is_empty());
        dimmer.apply_level(&host, 550);
        assert_eq!(host.calls(), vec![HostCall::SetBrightness(150)]);
    }
}
